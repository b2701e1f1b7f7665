// The action requested from the database server; goes into the segment header
// field that is documented as "message type".
// Request types that no client ever sends (ABAP streams, "reserved" entries)
// are omitted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum MessageType {
    ExecuteDirect = 2,    // Directly execute SQL statement
    Prepare = 3,          // Prepare an SQL statement
    Execute = 13,         // Execute a previously prepared SQL statement
    ReadLob = 16,         // Reads large object data
    WriteLob = 17,        // Writes large object data
    Authenticate = 65,    // Sends authentication data
    Connect = 66,         // Connects to the database
    Commit = 67,          // Commits current transaction
    Rollback = 68,        // Rolls back current transaction
    CloseResultSet = 69,  // Closes result set
    DropStatementId = 70, // Drops prepared statement identifier
    FetchNext = 71,       // Fetches next data from result set
    Disconnect = 77,      // Disconnects session
    DbConnectInfo = 82,   // Request/receive database connect information
}

impl MessageType {
    // Requests that depend on a result set id, connection id, or prepared
    // statement id must not be repeated on a fresh connection; the remaining
    // ones can safely be re-sent after a reconnect.
    pub(crate) fn is_repeatable(self) -> bool {
        matches!(
            self,
            Self::ExecuteDirect | Self::Prepare | Self::DbConnectInfo
        )
    }
}
