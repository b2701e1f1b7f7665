use crate::{
    impl_err,
    protocol::parts::{
        option_part::{OptionId, OptionPart},
        option_value::OptionValue,
    },
    HdbResult,
};

// The server does not allow a larger value.
const CLIENT_RECONNECT_WAIT_TIMEOUT_IN_SECONDS: i32 = 600;

// The connect-options handshake: the client announces its capabilities with
// the CONNECT request, the server answers with its own choices, which are
// digested here and then drive the field codecs (data format version) and
// the session identity (connection id, database name, full version string).
#[derive(Clone, Debug)]
pub(crate) struct ConnectOptions {
    os_user: String,
    o_client_locale: Option<String>,
    requested_dataformat_version: u8,

    // set when the server reply is digested
    dataformat_version: u8,
    connection_id: Option<u32>,
    system_id: Option<String>,
    database_name: Option<String>,
    full_version_string: Option<String>,
    implicit_lob_streaming: bool,
}

impl ConnectOptions {
    pub(crate) fn new(
        o_client_locale: Option<&str>,
        os_user: &str,
        requested_dataformat_version: u8,
    ) -> Self {
        Self {
            o_client_locale: o_client_locale.map(ToString::to_string),
            os_user: os_user.to_string(),
            requested_dataformat_version,
            dataformat_version: requested_dataformat_version,
            connection_id: None,
            system_id: None,
            database_name: None,
            full_version_string: None,
            implicit_lob_streaming: false,
        }
    }

    pub(crate) fn for_server(&self) -> ConnectOptionsPart {
        let mut part = ConnectOptionsPart::default();
        let mut set_opt = |id: ConnOptId, value: OptionValue| {
            debug!("sending connect option to server: {id:?} = {value:?}");
            part.insert(id, value);
        };

        if let Some(connection_id) = self.connection_id {
            set_opt(
                ConnOptId::ConnectionID,
                OptionValue::INT(i32::try_from(connection_id).unwrap(/*OK*/)),
            );
        }
        set_opt(
            ConnOptId::ClientReconnectWaitTimeout,
            OptionValue::INT(CLIENT_RECONNECT_WAIT_TIMEOUT_IN_SECONDS),
        );
        set_opt(
            ConnOptId::DataFormatVersion2,
            OptionValue::INT(i32::from(self.requested_dataformat_version)),
        );
        set_opt(ConnOptId::CompleteArrayExecution, OptionValue::BOOLEAN(true));
        set_opt(ConnOptId::OSUser, OptionValue::STRING(self.os_user.clone()));
        if let Some(ref locale) = self.o_client_locale {
            set_opt(ConnOptId::ClientLocale, OptionValue::STRING(locale.clone()));
        }
        part
    }

    pub(crate) fn digest_server_connect_options(
        &mut self,
        incoming: ConnectOptionsPart,
    ) -> HdbResult<()> {
        for (k, v) in incoming {
            match k {
                ConnOptId::DataFormatVersion2 => {
                    let dfv = u8::try_from(v.get_int()?)
                        .map_err(|_| impl_err!("invalid DataFormatVersion2 received"))?;
                    if matches!(dfv, 2 | 3) {
                        return Err(impl_err!("server chose reserved data format version {dfv}"));
                    }
                    self.dataformat_version = dfv;
                }
                ConnOptId::ConnectionID => {
                    self.connection_id = Some(u32::try_from(v.get_int()?).unwrap_or(0));
                }
                ConnOptId::SystemID => {
                    self.system_id = Some(v.into_string()?);
                }
                ConnOptId::DatabaseName => {
                    self.database_name = Some(v.into_string()?);
                }
                ConnOptId::FullVersionString => {
                    self.full_version_string = Some(v.into_string()?);
                }
                ConnOptId::ImplicitLobStreaming => {
                    self.implicit_lob_streaming = v.get_bool()?;
                }
                ConnOptId::BuildPlatform
                | ConnOptId::Endianness
                | ConnOptId::EngineDataFormatVersion
                | ConnOptId::DataFormatVersion
                | ConnOptId::NonTransactionalPrepare
                | ConnOptId::SupportsLargeBulkOperations
                | ConnOptId::ActiveActiveProtocolVersion
                | ConnOptId::CompleteArrayExecution
                | ConnOptId::QueryTimeoutOK
                | ConnOptId::UseTransactionFlagsOnly
                | ConnOptId::IgnoreUnknownParts
                | ConnOptId::SplitBatchCommands
                | ConnOptId::FdaEnabled
                | ConnOptId::ItabParameter
                | ConnOptId::ClientDistributionMode
                | ConnOptId::ClientInfoNullValueOK
                | ConnOptId::ClientReconnectWaitTimeout
                | ConnOptId::FlagSet1 => {
                    debug!("got connect option from server: {k:?} = {v:?}");
                }
                k => {
                    warn!("unexpected connect option coming from server ({k:?})");
                }
            }
        }
        Ok(())
    }

    // The connection ID is filled by the server when the connection is
    // established; it can be used in DISCONNECT/KILL commands.
    pub(crate) fn connection_id(&self) -> u32 {
        self.connection_id.unwrap_or(0)
    }

    // SAPSYSTEMNAME of the connected instance.
    pub(crate) fn system_id(&self) -> &str {
        self.system_id.as_deref().unwrap_or("")
    }

    // (MDC) database name.
    pub(crate) fn database_name(&self) -> &str {
        self.database_name.as_deref().unwrap_or("")
    }

    pub(crate) fn full_version_string(&self) -> &str {
        self.full_version_string.as_deref().unwrap_or("")
    }

    // The data format version that the server selected; drives the wire
    // encoding of date/time, decimal, boolean, and alphanum fields.
    pub(crate) fn dataformat_version(&self) -> u8 {
        self.dataformat_version
    }

    // Set by the server to indicate that it supports implicit LOB streaming
    // even though auto-commit is on, instead of raising an error.
    pub(crate) fn implicit_lob_streaming(&self) -> bool {
        self.implicit_lob_streaming
    }
}

// The wire representation of the connect options.
pub(crate) type ConnectOptionsPart = OptionPart<ConnOptId>;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[rustfmt::skip]
pub(crate) enum ConnOptId {
    ConnectionID,                 //  1
    CompleteArrayExecution,       //  2 // @deprecated array execution semantics, always true
    ClientLocale,                 //  3 // used within the calculation engine
    SupportsLargeBulkOperations,  //  4 // bulk operations >32K are supported
    DistributionEnabled,          //  5 // @deprecated
    PrimaryConnectionId,          //  6 // @deprecated
    PrimaryConnectionHost,        //  7 // @deprecated
    PrimaryConnectionPort,        //  8 // @deprecated
    CompleteDatatypeSupport,      //  9 // @deprecated
    LargeNumberOfParametersOK,    // 10 // number of parameters >32K is supported
    SystemID,                     // 11 // SID of the database system (output only)
    DataFormatVersion,            // 12 // superseded by DataFormatVersion2 (23)
    AbapVarcharMode,              // 13 // trim trailing blanks in character values
    SelectForUpdateOK,            // 14 // SELECT FOR UPDATE function code understood
    ClientDistributionMode,       // 15
    EngineDataFormatVersion,      // 16
    DistributionProtocolVersion,  // 17
    SplitBatchCommands,           // 18 // permit splitting of batch commands
    UseTransactionFlagsOnly,      // 19 // take transaction state only from ta flags
    RowSlotImageParameter,        // 20
    IgnoreUnknownParts,           // 21 // server does not abort on unknown parts
    TableOutputParMetadataOK,     // 22 // table type output parameter metadata supported
    DataFormatVersion2,           // 23 // the decisive data format version
    ItabParameter,                // 24
    DescribeTableOutputParameter, // 25
    ColumnarResultSet,            // 26
    ScrollableResultSet,          // 27
    ClientInfoNullValueOK,        // 28
    AssociatedConnectionID,       // 29
    NonTransactionalPrepare,      // 30
    FdaEnabled,                   // 31
    OSUser,                       // 32 // client OS user name
    RowSlotImageResultSet,        // 33
    Endianness,                   // 34
    UpdateTopologyAnwhere,        // 35
    EnableArrayType,              // 36
    ImplicitLobStreaming,         // 37
    CachedViewProperty,           // 38
    XOpenXAProtocolOK,            // 39
    MasterCommitRedirectionOK,    // 40
    ActiveActiveProtocolVersion,  // 41
    ActiveActiveConnOriginSite,   // 42
    QueryTimeoutOK,               // 43
    FullVersionString,            // 44
    DatabaseName,                 // 45
    BuildPlatform,                // 46
    ImplicitXASessionOK,          // 47
    ClientSideColumnEncryptionVersion, // 48
    CompressionLevelAndFlags,     // 49
    ClientSideReExecutionSupported, // 50
    ClientReconnectWaitTimeout,   // 51
    OriginalAnchorConnectionID,   // 52 // to notify the client's reconnect
    FlagSet1,                     // 53 // flags aggregating several options
    __Unexpected__(u8),
}

impl OptionId<ConnOptId> for ConnOptId {
    fn to_u8(&self) -> u8 {
        match *self {
            Self::ConnectionID => 1,
            Self::CompleteArrayExecution => 2,
            Self::ClientLocale => 3,
            Self::SupportsLargeBulkOperations => 4,
            Self::DistributionEnabled => 5,
            Self::PrimaryConnectionId => 6,
            Self::PrimaryConnectionHost => 7,
            Self::PrimaryConnectionPort => 8,
            Self::CompleteDatatypeSupport => 9,
            Self::LargeNumberOfParametersOK => 10,
            Self::SystemID => 11,
            Self::DataFormatVersion => 12,
            Self::AbapVarcharMode => 13,
            Self::SelectForUpdateOK => 14,
            Self::ClientDistributionMode => 15,
            Self::EngineDataFormatVersion => 16,
            Self::DistributionProtocolVersion => 17,
            Self::SplitBatchCommands => 18,
            Self::UseTransactionFlagsOnly => 19,
            Self::RowSlotImageParameter => 20,
            Self::IgnoreUnknownParts => 21,
            Self::TableOutputParMetadataOK => 22,
            Self::DataFormatVersion2 => 23,
            Self::ItabParameter => 24,
            Self::DescribeTableOutputParameter => 25,
            Self::ColumnarResultSet => 26,
            Self::ScrollableResultSet => 27,
            Self::ClientInfoNullValueOK => 28,
            Self::AssociatedConnectionID => 29,
            Self::NonTransactionalPrepare => 30,
            Self::FdaEnabled => 31,
            Self::OSUser => 32,
            Self::RowSlotImageResultSet => 33,
            Self::Endianness => 34,
            Self::UpdateTopologyAnwhere => 35,
            Self::EnableArrayType => 36,
            Self::ImplicitLobStreaming => 37,
            Self::CachedViewProperty => 38,
            Self::XOpenXAProtocolOK => 39,
            Self::MasterCommitRedirectionOK => 40,
            Self::ActiveActiveProtocolVersion => 41,
            Self::ActiveActiveConnOriginSite => 42,
            Self::QueryTimeoutOK => 43,
            Self::FullVersionString => 44,
            Self::DatabaseName => 45,
            Self::BuildPlatform => 46,
            Self::ImplicitXASessionOK => 47,
            Self::ClientSideColumnEncryptionVersion => 48,
            Self::CompressionLevelAndFlags => 49,
            Self::ClientSideReExecutionSupported => 50,
            Self::ClientReconnectWaitTimeout => 51,
            Self::OriginalAnchorConnectionID => 52,
            Self::FlagSet1 => 53,
            Self::__Unexpected__(n) => n,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => Self::ConnectionID,
            2 => Self::CompleteArrayExecution,
            3 => Self::ClientLocale,
            4 => Self::SupportsLargeBulkOperations,
            5 => Self::DistributionEnabled,
            6 => Self::PrimaryConnectionId,
            7 => Self::PrimaryConnectionHost,
            8 => Self::PrimaryConnectionPort,
            9 => Self::CompleteDatatypeSupport,
            10 => Self::LargeNumberOfParametersOK,
            11 => Self::SystemID,
            12 => Self::DataFormatVersion,
            13 => Self::AbapVarcharMode,
            14 => Self::SelectForUpdateOK,
            15 => Self::ClientDistributionMode,
            16 => Self::EngineDataFormatVersion,
            17 => Self::DistributionProtocolVersion,
            18 => Self::SplitBatchCommands,
            19 => Self::UseTransactionFlagsOnly,
            20 => Self::RowSlotImageParameter,
            21 => Self::IgnoreUnknownParts,
            22 => Self::TableOutputParMetadataOK,
            23 => Self::DataFormatVersion2,
            24 => Self::ItabParameter,
            25 => Self::DescribeTableOutputParameter,
            26 => Self::ColumnarResultSet,
            27 => Self::ScrollableResultSet,
            28 => Self::ClientInfoNullValueOK,
            29 => Self::AssociatedConnectionID,
            30 => Self::NonTransactionalPrepare,
            31 => Self::FdaEnabled,
            32 => Self::OSUser,
            33 => Self::RowSlotImageResultSet,
            34 => Self::Endianness,
            35 => Self::UpdateTopologyAnwhere,
            36 => Self::EnableArrayType,
            37 => Self::ImplicitLobStreaming,
            38 => Self::CachedViewProperty,
            39 => Self::XOpenXAProtocolOK,
            40 => Self::MasterCommitRedirectionOK,
            41 => Self::ActiveActiveProtocolVersion,
            42 => Self::ActiveActiveConnOriginSite,
            43 => Self::QueryTimeoutOK,
            44 => Self::FullVersionString,
            45 => Self::DatabaseName,
            46 => Self::BuildPlatform,
            47 => Self::ImplicitXASessionOK,
            48 => Self::ClientSideColumnEncryptionVersion,
            49 => Self::CompressionLevelAndFlags,
            50 => Self::ClientSideReExecutionSupported,
            51 => Self::ClientReconnectWaitTimeout,
            52 => Self::OriginalAnchorConnectionID,
            53 => Self::FlagSet1,
            val => {
                warn!("unsupported value for ConnOptId received: {val}");
                Self::__Unexpected__(val)
            }
        }
    }

    fn part_type(&self) -> &'static str {
        "ConnectOptions"
    }
}

#[cfg(test)]
mod test {
    use super::ConnOptId;
    use crate::protocol::parts::option_part::OptionId;

    #[test]
    fn test_id_mapping() {
        for i in 1..=53 {
            let conn_opt_id = ConnOptId::from_u8(i);
            assert_eq!(i, conn_opt_id.to_u8());
        }
    }

    #[test]
    fn test_digestion() {
        use super::{ConnectOptions, ConnectOptionsPart};
        use crate::protocol::parts::option_value::OptionValue;

        let mut connect_options = ConnectOptions::new(Some("en_US"), "tester", 8);
        let mut incoming = ConnectOptionsPart::default();
        incoming.insert(ConnOptId::DataFormatVersion2, OptionValue::INT(4));
        incoming.insert(ConnOptId::ConnectionID, OptionValue::INT(4711));
        incoming.insert(
            ConnOptId::FullVersionString,
            OptionValue::STRING("2.00.048.00.1234567890".to_string()),
        );
        incoming.insert(
            ConnOptId::DatabaseName,
            OptionValue::STRING("H2O".to_string()),
        );
        connect_options
            .digest_server_connect_options(incoming)
            .unwrap();

        assert_eq!(connect_options.dataformat_version(), 4);
        assert_eq!(connect_options.connection_id(), 4711);
        assert_eq!(connect_options.database_name(), "H2O");
        assert_eq!(
            connect_options.full_version_string(),
            "2.00.048.00.1234567890"
        );

        let mut reserved = ConnectOptionsPart::default();
        reserved.insert(ConnOptId::DataFormatVersion2, OptionValue::INT(3));
        assert!(connect_options
            .digest_server_connect_options(reserved)
            .is_err());
    }
}
