mod authfields;
mod client_context;
mod client_info;
mod command_info;
mod connect_options;
mod db_connect_info;
mod execution_results;
pub(crate) mod field_metadata;
pub(crate) mod hdb_value;
pub(crate) mod length_indicator;
pub(crate) mod multiline_option_part;
pub(crate) mod option_part;
pub(crate) mod option_value;
mod output_parameters;
mod parameter_descriptor;
mod parameter_rows;
mod read_lob_reply;
mod read_lob_request;
mod resultset_metadata;
mod server_error;
mod session_context;
mod statement_context;
mod topology;
pub(crate) mod transaction_flags;
mod type_id;
mod write_lob_reply;
mod write_lob_request;

pub(crate) use self::{
    authfields::AuthFields,
    client_context::ClientContext,
    client_info::ClientInfo,
    command_info::CommandInfo,
    connect_options::{ConnOptId, ConnectOptions, ConnectOptionsPart},
    lob_flags::LobFlags,
    option_value::OptionValue,
    parameter_rows::{ParameterRow, ParameterRows, RowBatch},
    read_lob_reply::ReadLobReply,
    read_lob_request::ReadLobRequest,
    session_context::SessionContext,
    statement_context::StatementContext,
    topology::Topology,
    transaction_flags::TransactionFlags,
    write_lob_reply::WriteLobReply,
    write_lob_request::WriteLobRequest,
};
pub use self::{
    db_connect_info::DbConnectInfo,
    execution_results::{ExecutionResult, ExecutionResults},
    field_metadata::FieldMetadata,
    hdb_value::HdbValue,
    output_parameters::OutputParameters,
    parameter_descriptor::{
        ParameterBinding, ParameterDescriptor, ParameterDescriptors, ParameterDirection,
    },
    resultset_metadata::ResultSetMetadata,
    server_error::{ServerError, Severity},
    type_id::TypeId,
};

mod lob_flags;

use crate::{
    base::InternalReturnValue,
    conn::AmConnCore,
    protocol::{Part, PartKind, ServerUsage},
    HdbError, HdbResult,
};
use std::{iter::IntoIterator, sync::Arc};

// The ordered list of parts of a message.
#[derive(Debug, Default)]
pub(crate) struct Parts<'a>(Vec<Part<'a>>);

impl<'a> Parts<'a> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn reverse(&mut self) {
        self.0.reverse();
    }

    pub fn push(&mut self, part: Part<'a>) {
        self.0.push(part);
    }
    pub fn pop(&mut self) -> Option<Part<'a>> {
        self.0.pop()
    }
    pub fn pop_if_kind(&mut self, kind: PartKind) -> Option<Part<'a>> {
        match self.0.last() {
            Some(part) if (part.kind() as i8) == (kind as i8) => self.0.pop(),
            _ => None,
        }
    }

    pub fn remove_first_of_kind(&mut self, kind: PartKind) -> Option<Part<'a>> {
        self.0
            .iter()
            .position(|p| p.kind() == kind)
            .map(|i| self.0.remove(i))
    }

    pub fn drop_parts_of_kind(&mut self, kind: PartKind) {
        self.0.retain(|part| (part.kind() as i8) != (kind as i8));
    }

    pub fn ref_inner(&self) -> &Vec<Part<'a>> {
        &self.0
    }
}

impl IntoIterator for Parts<'static> {
    type Item = Part<'static>;
    type IntoIter = std::vec::IntoIter<Part<'static>>;
    fn into_iter(self) -> std::vec::IntoIter<Part<'static>> {
        self.0.into_iter()
    }
}

impl Parts<'static> {
    // Digest the parts and collect InternalReturnValues; side effects on the
    // connection (statement context, transaction flags) are applied here.
    pub(crate) fn into_internal_return_values(
        self,
        am_conn_core: &AmConnCore,
        mut o_additional_server_usage: Option<&mut ServerUsage>,
    ) -> HdbResult<Vec<InternalReturnValue>> {
        let mut int_return_values = Vec::<InternalReturnValue>::new();
        let mut parts = self.into_iter();
        while let Some(part) = parts.next() {
            match part {
                Part::StatementContext(ref stmt_ctx) => {
                    am_conn_core.lock()?.evaluate_statement_context(stmt_ctx);
                    if let Some(ref mut server_usage) = o_additional_server_usage {
                        server_usage.update(
                            stmt_ctx.server_processing_time(),
                            stmt_ctx.server_cpu_time(),
                            stmt_ctx.server_memory_usage(),
                        );
                    }
                }
                Part::TransactionFlags(ta_flags) => {
                    am_conn_core.lock()?.evaluate_ta_flags(&ta_flags)?;
                }

                Part::OutputParameters(op) => {
                    int_return_values.push(InternalReturnValue::OutputParameters(op));
                }
                Part::ParameterMetadata(pm) => {
                    int_return_values.push(InternalReturnValue::ParameterMetadata(Arc::new(pm)));
                }
                Part::ResultSet(Some(rs_and_md)) => {
                    int_return_values.push(InternalReturnValue::RsState(rs_and_md));
                }
                Part::ResultSetMetadata(rsmd) => {
                    // a cursor that came without row data (e.g. from a
                    // procedure); build an empty result set around it
                    if let Some(Part::ResultSetId(rs_id)) = parts.next() {
                        let rs_state = crate::base::RsState::new_for_row_free_cursor(
                            am_conn_core,
                            rs_id,
                        );
                        int_return_values
                            .push(InternalReturnValue::RsState((rs_state, Arc::new(rsmd))));
                    } else {
                        return Err(HdbError::Impl("missing required part ResultSetId"));
                    }
                }
                Part::ExecutionResults(execution_results) => {
                    int_return_values
                        .push(InternalReturnValue::ExecutionResults(execution_results));
                }
                Part::WriteLobReply(wlr) => {
                    int_return_values.push(InternalReturnValue::WriteLobReply(wlr));
                }
                _ => warn!(
                    "into_internal_return_values(): ignoring unexpected part = {:?}",
                    part.kind()
                ),
            }
        }
        Ok(int_return_values)
    }
}
