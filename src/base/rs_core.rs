use crate::{
    base::{PreparedStatementCore, AM, OAM},
    conn::{AmConnCore, CommandOptions},
    protocol::{MessageType, Part, PartAttributes, PartKind, Request},
};

// Represents the server-side cursor of a result set.
//
// Keeps the connection core and eventually a prepared statement core alive,
// since dropping either of them would drop the respective server-side
// representation and break a result set that is not yet fully fetched.
#[derive(Debug)]
pub(crate) struct RsCore {
    am_conn_core: AmConnCore,
    o_am_pscore: OAM<PreparedStatementCore>,
    attributes: PartAttributes,
    result_set_id: u64,
}

impl RsCore {
    pub(super) fn new(
        am_conn_core: &AmConnCore,
        attributes: PartAttributes,
        result_set_id: u64,
    ) -> Self {
        Self {
            am_conn_core: am_conn_core.clone(),
            o_am_pscore: None,
            attributes,
            result_set_id,
        }
    }

    pub(super) fn am_conn_core(&self) -> &AmConnCore {
        &self.am_conn_core
    }
    pub(super) fn result_set_id(&self) -> u64 {
        self.result_set_id
    }
    pub(crate) fn inject_ps_core(&mut self, am_ps_core: AM<PreparedStatementCore>) {
        self.o_am_pscore = Some(am_ps_core);
    }
    pub(super) fn set_attributes(&mut self, attributes: PartAttributes) {
        self.attributes = attributes;
    }
    pub(super) fn attributes(&self) -> &PartAttributes {
        &self.attributes
    }
}

impl Drop for RsCore {
    // Inform the server if the result set is not yet closed, ignore all errors.
    fn drop(&mut self) {
        let rs_id = self.result_set_id;
        trace!("RsCore::drop(), result_set_id {rs_id}");
        if !self.attributes.result_set_is_closed() {
            let mut request = Request::new(MessageType::CloseResultSet, CommandOptions::EMPTY);
            request.push(Part::ResultSetId(rs_id));
            if let Ok(mut reply) = self.am_conn_core.best_effort_send(request) {
                reply.parts.drop_parts_of_kind(PartKind::StatementContext);
            }
        }
    }
}
