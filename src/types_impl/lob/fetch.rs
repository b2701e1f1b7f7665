use crate::{
    conn::{AmConnCore, CommandOptions},
    impl_err,
    protocol::{
        parts::{ReadLobReply, ReadLobRequest},
        MessageType, Part, ReplyType, Request, ServerUsage,
    },
    HdbResult,
};

// Fetches one chunk of LOB data from the server.
// Requested length and offset count bytes for BLOB and CLOB, but
// 1-2-3-byte sequences for NCLOB; the server's offsets are 1-based.
pub(crate) fn fetch_a_lob_chunk(
    am_conn_core: &AmConnCore,
    locator_id: u64,
    offset: u64,
    length: u32,
    server_usage: &mut ServerUsage,
) -> HdbResult<(Vec<u8>, bool)> {
    let mut request = Request::new(MessageType::ReadLob, CommandOptions::EMPTY);
    let offset = offset + 1;
    request.push(Part::ReadLobRequest(ReadLobRequest::new(
        locator_id, offset, length,
    )));

    let reply = am_conn_core.send(request)?;
    reply.assert_expected_reply_type(ReplyType::ReadLob)?;

    let mut o_read_lob_reply = None;
    for part in reply.parts {
        match part {
            Part::ReadLobReply(read_lob_reply) => {
                if read_lob_reply.locator_id() != locator_id {
                    return Err(impl_err!("locator ids do not match"));
                }
                o_read_lob_reply = Some(read_lob_reply);
            }

            Part::StatementContext(stmt_ctx) => server_usage.update(
                stmt_ctx.server_processing_time(),
                stmt_ctx.server_cpu_time(),
                stmt_ctx.server_memory_usage(),
            ),
            x => warn!("unexpected part of kind {:?} received and ignored", x.kind()),
        }
    }

    o_read_lob_reply
        .map(ReadLobReply::into_data_and_last)
        .ok_or_else(|| impl_err!("fetching a lob chunk failed"))
}
