//! A request message with its single request segment.
//!
//! There is no use case for multiple segments in one request, so message and
//! segment are modelled together.
use crate::{
    conn::CommandOptions,
    protocol::{
        parts::{ParameterDescriptors, Parts, StatementContext},
        FieldTypeContext, MessageType, Part,
    },
    HdbResult,
};
use byteorder::{LittleEndian, WriteBytesExt};
use std::sync::Arc;

const MESSAGE_HEADER_SIZE: u32 = 32;
const SEGMENT_HEADER_SIZE: usize = 24;

// Packets having the same packet sequence number belong to one
// request/response pair.
#[derive(Debug)]
pub(crate) struct Request<'a> {
    message_type: MessageType,
    command_options: CommandOptions,
    parts: Parts<'a>,
}

impl<'a> Request<'a> {
    pub fn new(message_type: MessageType, command_options: CommandOptions) -> Request<'a> {
        Request {
            message_type,
            command_options,
            parts: Parts::default(),
        }
    }

    pub fn new_for_disconnect() -> Request<'a> {
        Request::new(MessageType::Disconnect, CommandOptions::EMPTY)
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn push(&mut self, part: Part<'a>) {
        self.parts.push(part);
    }

    pub fn add_statement_context(&mut self, ssi_value: i64) {
        let mut stmt_ctx = StatementContext::default();
        stmt_ctx.set_statement_sequence_info(ssi_value);
        trace!("sending StatementContext with sequence_info = {ssi_value:?}");
        self.push(Part::StatementContext(stmt_ctx));
    }

    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_possible_wrap)]
    pub fn emit(
        &self,
        session_id: i64,
        seq_number: i32,
        auto_commit: bool,
        o_a_descriptors: Option<&Arc<ParameterDescriptors>>,
        ctx: FieldTypeContext,
        w: &mut dyn std::io::Write,
    ) -> HdbResult<()> {
        let varpart_size = self.varpart_size(o_a_descriptors)?;
        let total_size = MESSAGE_HEADER_SIZE + varpart_size;
        trace!("writing request with total size {total_size}");
        let mut remaining_bufsize = total_size - MESSAGE_HEADER_SIZE;

        debug!(
            "Request::emit() of type {:?} for session_id = {session_id}, seq_number = {seq_number}",
            self.message_type
        );

        // MESSAGE HEADER: 32 bytes
        w.write_i64::<LittleEndian>(session_id)?; // I8
        w.write_i32::<LittleEndian>(seq_number)?; // I4 packet count
        w.write_u32::<LittleEndian>(varpart_size)?; // UI4
        w.write_u32::<LittleEndian>(remaining_bufsize)?; // UI4
        w.write_i16::<LittleEndian>(1)?; // I2 number of segments
        for _ in 0..10 {
            w.write_u8(0)?; // I1 + B[9] reserved
        }

        // SEGMENT HEADER: 24 bytes
        let parts_len = self.parts.len() as i16;
        let size = self.seg_size(o_a_descriptors)? as i32;
        w.write_i32::<LittleEndian>(size)?; // I4 length including the header
        w.write_i32::<LittleEndian>(0)?; // I4 offset within the message buffer
        w.write_i16::<LittleEndian>(parts_len)?; // I2 number of contained parts
        w.write_i16::<LittleEndian>(1)?; // I2 number of this segment, starting with 1
        w.write_i8(1)?; // I1 segment kind: always 1 = Request
        w.write_i8(self.message_type as i8)?; // I1 message type
        w.write_i8(auto_commit.into())?; // I1 auto-commit on/off
        w.write_u8(self.command_options.as_u8())?; // I1 bit set for options
        for _ in 0..8 {
            w.write_u8(0)?; // B[8] reserved
        }

        remaining_bufsize -= SEGMENT_HEADER_SIZE as u32;
        trace!("headers are written");

        // PARTS
        for part in self.parts.ref_inner() {
            remaining_bufsize = part.emit(remaining_bufsize, o_a_descriptors, ctx, w)?;
        }
        w.flush()?;
        trace!("parts are written");
        Ok(())
    }

    // Length in bytes of the variable part of the message, i.e. total message
    // without the message header.
    fn varpart_size(&self, o_a_descriptors: Option<&Arc<ParameterDescriptors>>) -> HdbResult<u32> {
        let len = u32::try_from(self.seg_size(o_a_descriptors)?).unwrap(/*OK*/);
        trace!("varpart_size = {len}");
        Ok(len)
    }

    fn seg_size(&self, o_a_descriptors: Option<&Arc<ParameterDescriptors>>) -> HdbResult<usize> {
        let mut len = SEGMENT_HEADER_SIZE;
        for part in self.parts.ref_inner() {
            len += part.size(true, o_a_descriptors)?;
        }
        Ok(len)
    }
}

#[cfg(test)]
mod test {
    use super::Request;
    use crate::conn::CommandOptions;
    use crate::protocol::{FieldTypeContext, MessageType, Part};
    use byteorder::{LittleEndian, ReadBytesExt};
    use std::io::Read;

    // For every message written, a reader that consumes exactly the declared
    // message length encounters exactly the declared number of parts, and
    // every part's declared length reconciles with the actually written bytes.
    #[test]
    fn test_framing_reconciles() {
        let mut request = Request::new(MessageType::ExecuteDirect, CommandOptions::EMPTY);
        request.push(Part::Command("select * from DUMMY where X = 'ähm 💩'"));
        request.push(Part::FetchSize(32));
        request.add_statement_context(4711);

        let mut buf = Vec::<u8>::new();
        request
            .emit(77, 3, true, None, FieldTypeContext::default(), &mut buf)
            .unwrap();

        let mut rdr = std::io::Cursor::new(&buf);
        // message header
        assert_eq!(rdr.read_i64::<LittleEndian>().unwrap(), 77); // session id
        assert_eq!(rdr.read_i32::<LittleEndian>().unwrap(), 3); // packet count
        let varpart_size = rdr.read_u32::<LittleEndian>().unwrap();
        assert_eq!(varpart_size as usize + 32, buf.len());
        let _varpart_capacity = rdr.read_u32::<LittleEndian>().unwrap();
        assert_eq!(rdr.read_i16::<LittleEndian>().unwrap(), 1); // segments
        let mut reserved = [0_u8; 10];
        rdr.read_exact(&mut reserved).unwrap();

        // segment header
        let seg_size = rdr.read_i32::<LittleEndian>().unwrap();
        assert_eq!(seg_size as u32, varpart_size);
        assert_eq!(rdr.read_i32::<LittleEndian>().unwrap(), 0); // offset
        let no_of_parts = rdr.read_i16::<LittleEndian>().unwrap();
        assert_eq!(no_of_parts, 3);
        assert_eq!(rdr.read_i16::<LittleEndian>().unwrap(), 1); // segment number
        assert_eq!(rdr.read_i8().unwrap(), 1); // segment kind: request
        assert_eq!(rdr.read_i8().unwrap(), MessageType::ExecuteDirect as i8);
        assert_eq!(rdr.read_i8().unwrap(), 1); // auto-commit
        let _command_options = rdr.read_u8().unwrap();
        let mut reserved = [0_u8; 8];
        rdr.read_exact(&mut reserved).unwrap();

        // parts: consume each declared length plus padding
        for _ in 0..no_of_parts {
            let _kind = rdr.read_i8().unwrap();
            let _attrs = rdr.read_u8().unwrap();
            let _count16 = rdr.read_i16::<LittleEndian>().unwrap();
            let _count32 = rdr.read_i32::<LittleEndian>().unwrap();
            let body_size = rdr.read_i32::<LittleEndian>().unwrap() as usize;
            let _remaining = rdr.read_i32::<LittleEndian>().unwrap();
            let padded = if body_size == 0 {
                0
            } else {
                body_size + (7 - (body_size - 1) % 8)
            };
            let mut payload = vec![0_u8; padded];
            rdr.read_exact(&mut payload).unwrap();
        }

        // nothing is left over
        let mut rest = Vec::new();
        rdr.read_to_end(&mut rest).unwrap();
        assert!(rest.is_empty());
    }
}
