use crate::{
    base::RsState,
    protocol::parts::WriteLobReply,
    ExecutionResults, OutputParameters, ParameterDescriptors, ResultSetMetadata,
};
use std::sync::Arc;

// What a reply can be digested into, before it is shaped into the public
// `HdbResponse`.
#[derive(Debug)]
pub(crate) enum InternalReturnValue {
    RsState((RsState, Arc<ResultSetMetadata>)),
    ExecutionResults(ExecutionResults),
    OutputParameters(OutputParameters),
    ParameterMetadata(Arc<ParameterDescriptors>),
    WriteLobReply(WriteLobReply),
}
