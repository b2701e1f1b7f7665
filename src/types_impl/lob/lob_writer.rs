use crate::{
    base::InternalReturnValue,
    conn::{AmConnCore, CommandOptions},
    impl_err,
    protocol::{
        parts::{ParameterDescriptors, ResultSetMetadata, TypeId, WriteLobRequest},
        util, MessageType, Part, PartKind, Reply, ReplyType, Request, ServerUsage,
    },
    HdbResult,
};
use std::{io::Write, sync::Arc};

enum LobWriteMode {
    Append,
    Last,
}

// Drives the write-LOB loop for a single locator: data handed in via
// `std::io::Write` are buffered and pushed to the server in chunks of the
// configured size; `flush` sends the terminal chunk with the last-data flag.
//
// The last chunk of the last LOB completes the statement execution on the
// server; for procedure calls the reply to that roundtrip carries the real
// execution results, which are collected here.
pub(crate) struct LobWriter<'a> {
    locator_id: u64,
    type_id: TypeId,
    am_conn_core: AmConnCore,
    o_a_rsmd: Option<&'a Arc<ResultSetMetadata>>,
    o_a_descriptors: Option<&'a Arc<ParameterDescriptors>>,
    server_usage: ServerUsage,
    buffer: Vec<u8>,
    lob_write_length: usize,
    proc_result: Option<Vec<InternalReturnValue>>,
}
impl<'a> LobWriter<'a> {
    pub fn new(
        locator_id: u64,
        type_id: TypeId,
        am_conn_core: AmConnCore,
        o_a_rsmd: Option<&'a Arc<ResultSetMetadata>>,
        o_a_descriptors: Option<&'a Arc<ParameterDescriptors>>,
    ) -> HdbResult<LobWriter<'a>> {
        if let TypeId::BLOB | TypeId::CLOB | TypeId::NCLOB = type_id {
            let lob_write_length = am_conn_core.lock()?.configuration().lob_chunk_size() as usize;
            Ok(LobWriter {
                locator_id,
                type_id,
                am_conn_core,
                o_a_rsmd,
                o_a_descriptors,
                server_usage: ServerUsage::default(),
                buffer: Vec::<u8>::with_capacity(lob_write_length + 200),
                lob_write_length,
                proc_result: None,
            })
        } else {
            Err(impl_err!("LobWriter got unsupported type-id {type_id:?}"))
        }
    }

    pub fn into_internal_return_values(self) -> Option<Vec<InternalReturnValue>> {
        self.proc_result
    }

    fn write_a_lob_chunk(&mut self, buf: &[u8], lob_write_mode: &LobWriteMode) -> HdbResult<()> {
        let mut request = Request::new(MessageType::WriteLob, CommandOptions::EMPTY);
        let write_lob_request = WriteLobRequest::new(
            self.locator_id,
            -1_i64, // append to the data sent so far
            buf,
            matches!(lob_write_mode, LobWriteMode::Last),
        );
        request.push(Part::WriteLobRequest(write_lob_request));

        let reply =
            self.am_conn_core
                .full_send(request, self.o_a_rsmd, self.o_a_descriptors, &mut None)?;

        let locator_ids = match reply.replytype {
            // regular response
            ReplyType::WriteLob => self.evaluate_write_lob_reply(reply)?,

            // response of the last roundtrip of a procedure call
            ReplyType::DbProcedureCall => self.evaluate_dbprocedure_call_reply(reply)?,

            _ => {
                return Err(impl_err!(
                    "LobWriter::write_a_lob_chunk got a reply of type {:?}",
                    reply.replytype
                ))
            }
        };

        // the reply must name exactly the locator that is still incomplete
        match (lob_write_mode, locator_ids.as_slice()) {
            (LobWriteMode::Last, &[]) => Ok(()),
            (LobWriteMode::Append, &[id]) if id == self.locator_id => Ok(()),
            _ => Err(impl_err!(
                "write-lob reply does not match the written locator: {locator_ids:?}"
            )),
        }
    }

    fn evaluate_write_lob_reply(&mut self, reply: Reply) -> HdbResult<Vec<u64>> {
        let mut result = None;

        for part in reply.parts {
            match part {
                Part::StatementContext(stmt_ctx) => {
                    self.server_usage.update(
                        stmt_ctx.server_processing_time(),
                        stmt_ctx.server_cpu_time(),
                        stmt_ctx.server_memory_usage(),
                    );
                }
                Part::TransactionFlags(ta_flags) => {
                    trace!("committed: {}", ta_flags.is_committed());
                }
                Part::ExecutionResults(_) => {
                    // only the last roundtrip carries the decisive results
                }
                Part::WriteLobReply(write_lob_reply) => {
                    result = Some(write_lob_reply.into_locator_ids());
                }
                _ => warn!(
                    "evaluate_write_lob_reply: unexpected part {:?}",
                    part.kind()
                ),
            }
        }

        // after the terminal chunk the server has nothing left to report,
        // the part can then be missing
        Ok(result.unwrap_or_default())
    }

    fn evaluate_dbprocedure_call_reply(&mut self, mut reply: Reply) -> HdbResult<Vec<u64>> {
        if let Some(Part::StatementContext(stmt_ctx)) =
            reply.parts.pop_if_kind(PartKind::StatementContext)
        {
            self.server_usage.update(
                stmt_ctx.server_processing_time(),
                stmt_ctx.server_cpu_time(),
                stmt_ctx.server_memory_usage(),
            );
        }
        if let Some(Part::TransactionFlags(ta_flags)) =
            reply.parts.pop_if_kind(PartKind::TransactionFlags)
        {
            trace!("committed: {}", ta_flags.is_committed());
        }

        let locator_ids = match reply.parts.remove_first_of_kind(PartKind::WriteLobReply) {
            Some(Part::WriteLobReply(write_lob_reply)) => write_lob_reply.into_locator_ids(),
            _ => Vec::default(),
        };

        let internal_return_values = reply
            .parts
            .into_internal_return_values(&self.am_conn_core, Some(&mut self.server_usage))?;
        self.proc_result = Some(internal_return_values);
        Ok(locator_ids)
    }
}

impl std::fmt::Debug for LobWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "LobWriter {{locator_id: {}, type_id: {}}}",
            self.locator_id, self.type_id
        )
    }
}

impl Write for LobWriter<'_> {
    // Either buffers (in self.buffer) or writes buffer + input to the db.
    fn write(&mut self, input: &[u8]) -> std::io::Result<usize> {
        trace!("write() with input of len {}", input.len());
        if input.len() + self.buffer.len() < self.lob_write_length {
            self.buffer.extend_from_slice(input);
        } else {
            // concatenate buffer and input into payload_raw
            let payload_raw = if self.buffer.is_empty() {
                input.to_vec()
            } else {
                let mut payload_raw = Vec::<u8>::new();
                std::mem::swap(&mut payload_raw, &mut self.buffer);
                payload_raw.extend_from_slice(input);
                payload_raw
            };
            debug_assert!(self.buffer.is_empty());

            // if necessary, cut off an incomplete trailing character and
            // convert to cesu8
            let payload = if let TypeId::CLOB | TypeId::NCLOB = self.type_id {
                let (cesu8, utf8_tail) = utf8_to_cesu8_and_utf8_tail(payload_raw)?;
                self.buffer = utf8_tail;
                cesu8
            } else {
                payload_raw
            };

            self.write_a_lob_chunk(&payload, &LobWriteMode::Append)
                .map_err(|e| util::io_error(e.to_string()))?;
        }
        Ok(input.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        trace!("flush(), with buffer of {} bytes", self.buffer.len());
        let mut payload_raw = Vec::<u8>::new();
        std::mem::swap(&mut payload_raw, &mut self.buffer);
        let payload = if let TypeId::CLOB | TypeId::NCLOB = self.type_id {
            let (cesu8, utf8_tail) =
                utf8_to_cesu8_and_utf8_tail(payload_raw).map_err(|e| util::io_error(e.to_string()))?;
            if !utf8_tail.is_empty() {
                return Err(util::io_error("stream ending with invalid utf-8"));
            }
            cesu8
        } else {
            payload_raw
        };

        self.write_a_lob_chunk(&payload, &LobWriteMode::Last)
            .map_err(|e| util::io_error(e.to_string()))?;
        Ok(())
    }
}

// Splits off an incomplete utf-8 character from the end, and converts the
// valid rest to cesu-8. Invalid utf-8 within the data is a write error.
fn utf8_to_cesu8_and_utf8_tail(mut utf8: Vec<u8>) -> std::io::Result<(Vec<u8>, Vec<u8>)> {
    let tail_len = incomplete_utf8_tail_len(&utf8);
    let tail = utf8.split_off(utf8.len() - tail_len);
    let s = std::str::from_utf8(&utf8)
        .map_err(|e| util::io_error(format!("invalid utf-8 in LOB stream: {e}")))?;
    Ok((cesu8::to_cesu8(s).to_vec(), tail))
}

// Number of bytes at the end that form an incomplete (but so far valid)
// utf-8 character.
fn incomplete_utf8_tail_len(bytes: &[u8]) -> usize {
    for l in 1..=bytes.len().min(3) {
        let b = bytes[bytes.len() - l];
        if b & 0b_1100_0000 == 0b_1100_0000 {
            // start byte of a multi-byte character: incomplete if the
            // declared length exceeds the available bytes
            let char_len: usize = match b {
                0b_1100_0000..=0b_1101_1111 => 2,
                0b_1110_0000..=0b_1110_1111 => 3,
                _ => 4,
            };
            return if char_len > l { l } else { 0 };
        }
        if b & 0b_1100_0000 != 0b_1000_0000 {
            // ASCII byte, nothing dangling
            return 0;
        }
        // else: continuation byte, look further back
    }
    0
}

#[cfg(test)]
mod test {
    use super::{incomplete_utf8_tail_len, utf8_to_cesu8_and_utf8_tail};

    #[test]
    fn test_incomplete_tail_detection() {
        let bytes = "abc💩".as_bytes();
        assert_eq!(incomplete_utf8_tail_len(bytes), 0);
        assert_eq!(incomplete_utf8_tail_len(&bytes[..bytes.len() - 1]), 3);
        assert_eq!(incomplete_utf8_tail_len(&bytes[..bytes.len() - 2]), 2);
        assert_eq!(incomplete_utf8_tail_len(&bytes[..bytes.len() - 3]), 1);
        assert_eq!(incomplete_utf8_tail_len(b"abc"), 0);
    }

    #[test]
    fn test_tail_carry() {
        let mut bytes = "ä💩".as_bytes().to_vec();
        let last = bytes.pop().unwrap();
        let (cesu8, tail) = utf8_to_cesu8_and_utf8_tail(bytes).unwrap();
        assert_eq!(cesu8, cesu8::to_cesu8("ä").to_vec());
        assert_eq!(tail.len(), 3);

        let mut rest = tail;
        rest.push(last);
        let (cesu8, tail) = utf8_to_cesu8_and_utf8_tail(rest).unwrap();
        assert_eq!(cesu8, cesu8::to_cesu8("💩").to_vec());
        assert!(tail.is_empty());
    }
}
