use crate::protocol::parts::option_part::{OptionId, OptionPart};
use crate::protocol::parts::option_value::OptionValue;

use std::env;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// An option map that the client sends with the first authentication request
// to identify itself: client version, client type, and application name.
pub(crate) type ClientContext = OptionPart<ClientContextId>;

impl ClientContext {
    pub fn new(o_application: Option<&str>) -> Self {
        let mut cc: Self = Self::default();

        cc.insert(
            ClientContextId::ClientVersion,
            OptionValue::STRING(VERSION.to_string()),
        );
        cc.insert(
            ClientContextId::ClientType,
            OptionValue::STRING("hdbclient (rust native)".to_string()),
        );
        // default: the name of the running executable
        let application = o_application
            .map(ToString::to_string)
            .or_else(|| {
                env::args_os().next().and_then(|os_str| {
                    std::path::Path::new(&os_str)
                        .file_name()
                        .map(|s| s.to_string_lossy().to_string())
                })
            })
            .unwrap_or_else(|| "<unknown>".to_string());
        cc.insert(
            ClientContextId::ClientApplicationProgram,
            OptionValue::STRING(application),
        );
        cc
    }
}

#[derive(Debug, Eq, PartialEq, Hash)]
pub(crate) enum ClientContextId {
    ClientVersion,            // 1 // STRING
    ClientType,               // 2 // STRING
    ClientApplicationProgram, // 3 // STRING
    __Unexpected__(u8),
}

impl OptionId<ClientContextId> for ClientContextId {
    fn to_u8(&self) -> u8 {
        match *self {
            Self::ClientVersion => 1,
            Self::ClientType => 2,
            Self::ClientApplicationProgram => 3,
            Self::__Unexpected__(val) => val,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => Self::ClientVersion,
            2 => Self::ClientType,
            3 => Self::ClientApplicationProgram,
            val => {
                warn!("unsupported value for ClientContextId received: {val}");
                Self::__Unexpected__(val)
            }
        }
    }

    fn part_type(&self) -> &'static str {
        "ClientContext"
    }
}
