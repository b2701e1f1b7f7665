use crate::protocol::parts::option_part::{OptionId, OptionPart};
use crate::protocol::parts::option_value::OptionValue;

// Sent by the server to signal changes of the transaction status (committed,
// rolled back, write transaction started) and of the general session state
// (isolation level changed, session must be terminated).
pub(crate) type TransactionFlags = OptionPart<TaFlagId>;

impl TransactionFlags {
    pub fn is_committed(&self) -> bool {
        matches!(
            self.get(&TaFlagId::Committed),
            Ok(&OptionValue::BOOLEAN(true))
        )
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) enum TaFlagId {
    RolledBack,            // 0 // BOOL // the transaction is rolled back
    Committed,             // 1 // BOOL // the transaction is committed
    NewIsolationlevel,     // 2 // INT  // the isolation level has changed
    DdlCommitmodeChanged,  // 3 // BOOL // the DDL auto-commit mode has changed
    WriteTaStarted,        // 4 // BOOL // a write transaction has been started
    NoWriteTaStarted,      // 5 // BOOL // no write transaction has been started
    SessionclosingTaError, // 6 // BOOL // the session must be terminated
    ReadOnlyMode,          // 7 // BOOL
    __Unexpected__(u8),
}
impl OptionId<TaFlagId> for TaFlagId {
    fn to_u8(&self) -> u8 {
        match *self {
            Self::RolledBack => 0,
            Self::Committed => 1,
            Self::NewIsolationlevel => 2,
            Self::DdlCommitmodeChanged => 3,
            Self::WriteTaStarted => 4,
            Self::NoWriteTaStarted => 5,
            Self::SessionclosingTaError => 6,
            Self::ReadOnlyMode => 7,
            Self::__Unexpected__(val) => val,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            0 => Self::RolledBack,
            1 => Self::Committed,
            2 => Self::NewIsolationlevel,
            3 => Self::DdlCommitmodeChanged,
            4 => Self::WriteTaStarted,
            5 => Self::NoWriteTaStarted,
            6 => Self::SessionclosingTaError,
            7 => Self::ReadOnlyMode,
            val => {
                warn!("unsupported value for TaFlagId received: {val}");
                Self::__Unexpected__(val)
            }
        }
    }

    fn part_type(&self) -> &'static str {
        "TransactionFlags"
    }
}
