use crate::{
    base::RsState,
    conn::{AmConnCore, ConnectionCore},
    impl_err,
    protocol::{
        parts::{ParameterDescriptors, Parts, ResultSetMetadata, ServerError, Severity},
        util_sync, FieldTypeContext, Part, PartKind, ReplyType,
    },
    HdbError, HdbResult,
};
use byteorder::{LittleEndian, ReadBytesExt};
use std::sync::Arc;

// A reply message with its single reply segment.
#[derive(Debug)]
pub(crate) struct Reply {
    session_id: i64,
    pub replytype: ReplyType,
    pub parts: Parts<'static>,
}
impl Reply {
    fn new(session_id: i64, replytype: ReplyType) -> Self {
        Self {
            session_id,
            replytype,
            parts: Parts::default(),
        }
    }

    pub fn session_id(&self) -> i64 {
        self.session_id
    }

    // Parse a reply from the stream, building a Reply object.
    //
    // * `ResultSetMetadata` needs to be injected for execute calls of
    //   prepared statements
    // * `RsState` needs to be injected (and is extended) for fetch requests
    pub(crate) fn parse(
        o_a_rsmd: Option<&Arc<ResultSetMetadata>>,
        o_a_descriptors: Option<&Arc<ParameterDescriptors>>,
        o_rs: &mut Option<&mut RsState>,
        o_am_conn_core: Option<&AmConnCore>,
        ctx: FieldTypeContext,
        rdr: &mut dyn std::io::Read,
    ) -> HdbResult<Self> {
        trace!("Reply::parse()");
        let (no_of_parts, mut reply) = parse_message_and_segment_header(rdr)?;

        for i in 0..no_of_parts {
            let part = Part::parse(
                &mut (reply.parts),
                o_am_conn_core,
                o_a_rsmd,
                o_a_descriptors,
                o_rs,
                ctx,
                i == no_of_parts - 1,
                rdr,
            )?;
            reply.push(part);
        }

        Ok(reply)
    }

    pub fn assert_expected_reply_type(&self, expected_reply_type: ReplyType) -> HdbResult<()> {
        if self.replytype == expected_reply_type {
            Ok(())
        } else {
            Err(impl_err!(
                "expected reply type {expected_reply_type:?}, got {:?}",
                self.replytype
            ))
        }
    }

    pub fn push(&mut self, part: Part<'static>) {
        self.parts.push(part);
    }

    // Classifies the reply's error vector: a vector that contains only
    // warnings counts as success (the warnings are retained on the
    // connection and logged); everything else becomes an error, with
    // execution results mixed in where the reply carries them.
    pub(crate) fn handle_db_error(&mut self, conn_core: &mut ConnectionCore) -> HdbResult<()> {
        conn_core.warnings.clear();

        // retrieve server errors from returned parts
        let mut server_errors = {
            match self.parts.remove_first_of_kind(PartKind::Error) {
                None => {
                    // no error part found, regular reply evaluation happens elsewhere
                    return Ok(());
                }
                Some(Part::Error(server_warnings_and_errors)) => {
                    let (warnings, server_errors): (Vec<ServerError>, Vec<ServerError>) =
                        server_warnings_and_errors
                            .into_iter()
                            .partition(|se| &Severity::Warning == se.severity());
                    for warning in &warnings {
                        warn!("server warning: {warning}");
                    }
                    conn_core.warnings = warnings;
                    if server_errors.is_empty() {
                        // only warnings, so return Ok(())
                        return Ok(());
                    }
                    server_errors
                }
                Some(_non_error_part) => {
                    return Err(HdbError::Impl("inconsistent error part found"));
                }
            }
        };

        // evaluate the other parts that can come with an error part
        let mut o_execution_results = None;
        self.parts.reverse(); // digest with pop
        while let Some(part) = self.parts.pop() {
            match part {
                Part::StatementContext(ref stmt_ctx) => {
                    conn_core.evaluate_statement_context(stmt_ctx);
                }
                Part::TransactionFlags(ta_flags) => {
                    conn_core.evaluate_ta_flags(&ta_flags)?;
                }
                Part::ExecutionResults(execution_results) => {
                    o_execution_results = Some(execution_results);
                }
                part => warn!(
                    "Reply::handle_db_error(): ignoring unexpected part of kind {:?}",
                    part.kind()
                ),
            }
        }

        match o_execution_results {
            // mix the server errors into the execution results
            Some(mut execution_results) => {
                execution_results.mix_in_server_errors(server_errors.into_iter());
                Err(HdbError::ExecutionResults(execution_results))
            }
            None => {
                if server_errors.len() == 1 {
                    Err(HdbError::from(server_errors.remove(0)))
                } else {
                    Err(impl_err!(
                        "got multiple server errors without execution results: {server_errors:?}"
                    ))
                }
            }
        }
    }
}

fn parse_message_and_segment_header(rdr: &mut dyn std::io::Read) -> HdbResult<(i16, Reply)> {
    // MESSAGE HEADER: 32 bytes
    let session_id: i64 = rdr.read_i64::<LittleEndian>()?; // I8
    let packet_seq_number: i32 = rdr.read_i32::<LittleEndian>()?; // I4
    let varpart_size: u32 = rdr.read_u32::<LittleEndian>()?; // UI4
    let remaining_bufsize: u32 = rdr.read_u32::<LittleEndian>()?; // UI4
    let no_of_segs = rdr.read_i16::<LittleEndian>()?; // I2
    if no_of_segs == 0 {
        return Err(HdbError::Impl("empty response (is ok for drop connection)"));
    }
    if no_of_segs > 1 {
        return Err(impl_err!("no_of_segs = {no_of_segs} > 1"));
    }

    util_sync::skip_bytes(10, rdr)?; // (I1 + B[9])

    // SEGMENT HEADER: 24 bytes
    rdr.read_i32::<LittleEndian>()?; // I4 seg_size
    rdr.read_i32::<LittleEndian>()?; // I4 seg_offset
    let no_of_parts: i16 = rdr.read_i16::<LittleEndian>()?; // I2
    rdr.read_i16::<LittleEndian>()?; // I2 seg_number
    let seg_kind = SegmentKind::from_i8(rdr.read_i8()?)?; // I1

    trace!(
        "message and segment header: {{ packet_seq_number = {packet_seq_number}, \
         varpart_size = {varpart_size}, remaining_bufsize = {remaining_bufsize}, \
         no_of_parts = {no_of_parts} }}"
    );

    match seg_kind {
        SegmentKind::Request => Err(HdbError::Impl("cannot _parse_ a request")),
        SegmentKind::Reply | SegmentKind::Error => {
            util_sync::skip_bytes(1, rdr)?; // I1 reserved2
            let reply_type = ReplyType::from_i16(rdr.read_i16::<LittleEndian>()?)?; // I2
            util_sync::skip_bytes(8, rdr)?; // B[8] reserved3
            debug!(
                "Reply::parse(): got reply of type {reply_type:?} and segment kind \
                 {seg_kind:?} for session_id {session_id}"
            );
            Ok((no_of_parts, Reply::new(session_id, reply_type)))
        }
    }
}

// Specifies the layout of the remaining segment header structure.
#[derive(Debug)]
enum SegmentKind {
    Request,
    Reply,
    Error,
}
impl SegmentKind {
    fn from_i8(val: i8) -> HdbResult<Self> {
        match val {
            1 => Ok(Self::Request),
            2 => Ok(Self::Reply),
            5 => Ok(Self::Error),
            _ => Err(impl_err!("SegmentKind {val} not implemented")),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Reply;
    use crate::protocol::{FieldTypeContext, Part, ReplyType};
    use byteorder::{LittleEndian, WriteBytesExt};
    use std::io::Write;

    // Builds the wire image of a reply with an ExecutionResults part and an
    // Error part, and feeds it through Reply::parse.
    #[test]
    fn test_parse_reply_with_error_part() {
        let mut buf = Vec::<u8>::new();

        // two parts: execution results (3 args), error (1 arg)
        let exec_results_body: Vec<u8> = {
            let mut b = Vec::new();
            b.write_i32::<LittleEndian>(1).unwrap();
            b.write_i32::<LittleEndian>(-3).unwrap();
            b.write_i32::<LittleEndian>(1).unwrap();
            b
        };
        let error_body: Vec<u8> = {
            let mut b = Vec::new();
            b.write_i32::<LittleEndian>(301).unwrap(); // code: unique constraint violated
            b.write_i32::<LittleEndian>(0).unwrap(); // position
            let text = cesu8::to_cesu8("unique constraint violated");
            b.write_i32::<LittleEndian>(i32::try_from(text.len()).unwrap())
                .unwrap();
            b.write_i8(1).unwrap(); // severity: error
            b.write_all(b"23000").unwrap(); // sqlstate
            b.write_all(&text).unwrap();
            let written = 4 + 4 + 4 + 1 + 5 + text.len();
            for _ in 0..(8 - written % 8) {
                b.write_u8(0).unwrap();
            }
            b
        };

        let parts: Vec<(i8, i32, &[u8])> = vec![
            (12, 3, &exec_results_body), // ExecutionResults
            (6, 1, &error_body),         // Error
        ];

        let varpart_size: usize = 24
            + parts
                .iter()
                .map(|(_, _, body)| 16 + body.len() + (8 - body.len() % 8) % 8)
                .sum::<usize>();

        // message header
        buf.write_i64::<LittleEndian>(4711).unwrap(); // session id
        buf.write_i32::<LittleEndian>(1).unwrap(); // packet count
        buf.write_u32::<LittleEndian>(u32::try_from(varpart_size).unwrap())
            .unwrap();
        buf.write_u32::<LittleEndian>(100_000).unwrap(); // varpart capacity
        buf.write_i16::<LittleEndian>(1).unwrap(); // number of segments
        buf.write_all(&[0_u8; 10]).unwrap();

        // segment header
        buf.write_i32::<LittleEndian>(i32::try_from(varpart_size).unwrap())
            .unwrap();
        buf.write_i32::<LittleEndian>(0).unwrap(); // offset
        buf.write_i16::<LittleEndian>(2).unwrap(); // number of parts
        buf.write_i16::<LittleEndian>(1).unwrap(); // segment number
        buf.write_i8(2).unwrap(); // segment kind: reply
        buf.write_i8(0).unwrap(); // reserved
        buf.write_i16::<LittleEndian>(3).unwrap(); // function code: update
        buf.write_all(&[0_u8; 8]).unwrap();

        for (kind, count, body) in parts {
            buf.write_i8(kind).unwrap();
            buf.write_u8(0).unwrap(); // attributes
            buf.write_i16::<LittleEndian>(i16::try_from(count).unwrap())
                .unwrap();
            buf.write_i32::<LittleEndian>(0).unwrap();
            buf.write_i32::<LittleEndian>(i32::try_from(body.len()).unwrap())
                .unwrap();
            buf.write_i32::<LittleEndian>(0).unwrap(); // remaining packet size
            buf.write_all(body).unwrap();
            for _ in 0..((8 - body.len() % 8) % 8) {
                buf.write_u8(0).unwrap();
            }
        }

        let mut rdr = std::io::Cursor::new(buf);
        let reply = Reply::parse(
            None,
            None,
            &mut None,
            None,
            FieldTypeContext::default(),
            &mut rdr,
        )
        .unwrap();

        assert_eq!(reply.session_id(), 4711);
        assert!(matches!(reply.replytype, ReplyType::Update));
        assert_eq!(reply.parts.len(), 2);

        let mut parts = reply.parts.into_iter();
        match parts.next() {
            Some(Part::ExecutionResults(execution_results)) => {
                assert_eq!(execution_results.error_count(), 1);
                let failed: Vec<usize> = execution_results.errors().map(|(i, _)| i).collect();
                assert_eq!(failed, vec![1]);
            }
            p => panic!("unexpected part {p:?}"),
        }
        match parts.next() {
            Some(Part::Error(server_errors)) => {
                assert_eq!(server_errors.len(), 1);
                assert_eq!(server_errors[0].code(), 301);
                assert_eq!(server_errors[0].text(), "unique constraint violated");
            }
            p => panic!("unexpected part {p:?}"),
        }
    }
}
