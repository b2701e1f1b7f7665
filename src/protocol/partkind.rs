// The payload type of a part.
// Kinds that are never exchanged with a SQL client (ABAP streams, item tables,
// fast data access metadata) are omitted; unknown kinds are tolerated on read
// and skipped by their declared length.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum PartKind {
    Command = 3,              // SQL command text
    ResultSet = 5,            // Tabular result data
    Error = 6,                // Error information
    StatementId = 10,         // Prepared statement id
    TransactionId = 11,       // Transaction id
    ExecutionResults = 12,    // Number of affected rows per statement
    ResultSetId = 13,         // Result set id
    TopologyInformation = 15, // Topology information
    TableLocation = 16,       // Location of a table
    ReadLobRequest = 17,      // Request to read LOB data
    ReadLobReply = 18,        // Reply with LOB data
    CommandInfo = 27,         // Source module and line
    WriteLobRequest = 28,     // Request to write LOB data
    ClientContext = 29,       // Client version, type, application name
    WriteLobReply = 30,       // Reply with LOB locator ids
    Parameters = 32,           // Input parameter rows
    Authentication = 33,       // Authentication fields
    SessionContext = 34,       // Session context information
    StatementContext = 39,     // Statement visibility context
    PartitionInformation = 40, // Table partitioning information
    OutputParameters = 41,     // Output parameter values
    ConnectOptions = 42,       // Connect options
    FetchSize = 45,            // Number of rows to fetch
    ParameterMetadata = 47,    // Parameter metadata of a prepared statement
    ResultSetMetadata = 48,    // Result set metadata
    ClientInfo = 57,           // Client info key/value pairs
    TransactionFlags = 64,     // Transaction handling flags
    DbConnectInfo = 67,        // Host and port of the wanted database
    LobFlags = 68,             // LOB streaming flags
    Unknown = -1,              // Placeholder for all kinds this client does not evaluate
}

impl PartKind {
    pub(crate) fn from_i8(val: i8) -> Self {
        match val {
            3 => Self::Command,
            5 => Self::ResultSet,
            6 => Self::Error,
            10 => Self::StatementId,
            11 => Self::TransactionId,
            12 => Self::ExecutionResults,
            13 => Self::ResultSetId,
            15 => Self::TopologyInformation,
            16 => Self::TableLocation,
            17 => Self::ReadLobRequest,
            18 => Self::ReadLobReply,
            27 => Self::CommandInfo,
            28 => Self::WriteLobRequest,
            29 => Self::ClientContext,
            30 => Self::WriteLobReply,
            32 => Self::Parameters,
            33 => Self::Authentication,
            34 => Self::SessionContext,
            39 => Self::StatementContext,
            40 => Self::PartitionInformation,
            41 => Self::OutputParameters,
            42 => Self::ConnectOptions,
            45 => Self::FetchSize,
            47 => Self::ParameterMetadata,
            48 => Self::ResultSetMetadata,
            57 => Self::ClientInfo,
            64 => Self::TransactionFlags,
            67 => Self::DbConnectInfo,
            68 => Self::LobFlags,
            val => {
                warn!("unknown part kind {val} received");
                Self::Unknown
            }
        }
    }
}
