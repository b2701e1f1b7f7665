use crate::protocol::parts::option_part::{OptionId, OptionPart};
use crate::protocol::parts::option_value::OptionValue;
use crate::{impl_err, HdbResult};

/// Reply of the server to a DBCONNECTINFO request: where the requested
/// database is reachable, and whether this connection already points to it.
///
/// Also part of the redirect response to an authentication request.
pub type DbConnectInfo = OptionPart<DbConnectInfoId>;

/// Keys of the DBCONNECTINFO option map.
#[derive(Debug, Eq, PartialEq, Hash)]
pub enum DbConnectInfoId {
    /// Name of the database.
    DatabaseName, // 1 // STRING
    /// Host where the database is reachable.
    Host, // 2 // STRING
    /// Port where the database is reachable.
    Port, // 3 // INT
    /// True if the connection is already connected to the wanted database.
    OnCorrectDatabase, // 4 // BOOL
    /// Network group.
    NetworkGroup, // 5 // STRING
    /// Catch-all for unknown keys.
    #[doc(hidden)]
    __Unexpected__(u8),
}
impl DbConnectInfo {
    pub(crate) fn new(db_name: String, network_group: String) -> Self {
        let mut db_connect_info = Self::default();
        db_connect_info.insert(DbConnectInfoId::DatabaseName, OptionValue::STRING(db_name));
        db_connect_info.insert(
            DbConnectInfoId::NetworkGroup,
            OptionValue::STRING(network_group),
        );
        db_connect_info
    }

    /// Host where the wanted database is reachable.
    pub fn host(&self) -> HdbResult<&String> {
        self.get(&DbConnectInfoId::Host)?.get_string()
    }

    /// Port where the wanted database is reachable.
    pub fn port(&self) -> HdbResult<u16> {
        self.get(&DbConnectInfoId::Port)?
            .get_int()?
            .try_into()
            .map_err(|e| impl_err!("invalid port number received: {e}"))
    }

    /// True if the connection already points to the wanted database.
    pub fn on_correct_database(&self) -> HdbResult<bool> {
        self.get(&DbConnectInfoId::OnCorrectDatabase)?.get_bool()
    }
}

impl OptionId<DbConnectInfoId> for DbConnectInfoId {
    fn to_u8(&self) -> u8 {
        match *self {
            Self::DatabaseName => 1,
            Self::Host => 2,
            Self::Port => 3,
            Self::OnCorrectDatabase => 4,
            Self::NetworkGroup => 5,
            Self::__Unexpected__(val) => val,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => Self::DatabaseName,
            2 => Self::Host,
            3 => Self::Port,
            4 => Self::OnCorrectDatabase,
            5 => Self::NetworkGroup,
            val => {
                warn!("unsupported value for DbConnectInfoId received: {val}");
                Self::__Unexpected__(val)
            }
        }
    }

    fn part_type(&self) -> &'static str {
        "DbConnectInfo"
    }
}
