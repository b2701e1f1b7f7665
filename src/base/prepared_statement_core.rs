use crate::{
    conn::{AmConnCore, CommandOptions},
    protocol::{MessageType, Part, Request},
};

// Keeps the connection handle and the server-side statement id together.
// The server-side statement is dropped when this is dropped.
#[derive(Debug)]
pub(crate) struct PreparedStatementCore {
    pub(crate) am_conn_core: AmConnCore,
    pub(crate) statement_id: u64,
}

impl Drop for PreparedStatementCore {
    // Send a DropStatementId request to the database, ignore all errors.
    fn drop(&mut self) {
        debug!("PreparedStatementCore::drop(), removing statement");
        let mut request = Request::new(MessageType::DropStatementId, CommandOptions::EMPTY);
        request.push(Part::StatementId(self.statement_id));
        if let Ok(mut reply) = self.am_conn_core.best_effort_send(request) {
            reply.parts.drop_parts_of_kind(crate::protocol::PartKind::StatementContext);
        }
    }
}
