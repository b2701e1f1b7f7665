use super::fetch::fetch_a_lob_chunk;
use super::{CharLobSlice, LobBuf, UTF_BUFFER_SIZE};
use crate::{
    base::{RsCore, OAM},
    conn::AmConnCore,
    protocol::util,
    usage_err, HdbError, HdbResult, ServerUsage,
};
use debug_ignore::DebugIgnore;
use std::io::{Cursor, Write};

/// LOB implementation for ASCII character strings that is used within
/// [`HdbValue::CLOB`](crate::HdbValue::CLOB) instances coming from the
/// database.
///
/// CLOB fields contain ASCII data, so offsets count plain bytes. The content
/// is nevertheless decoded defensively, since old databases are known to
/// carry non-ASCII content in CLOB columns.
#[derive(Clone, Debug)]
pub struct CLob(CLobHandle);

impl CLob {
    pub(crate) fn new(
        am_conn_core: &AmConnCore,
        o_am_rscore: &OAM<RsCore>,
        is_data_complete: bool,
        total_char_length: u64,
        total_byte_length: u64,
        locator_id: u64,
        data: Vec<u8>,
    ) -> Self {
        Self(CLobHandle::new(
            am_conn_core,
            o_am_rscore,
            is_data_complete,
            total_char_length,
            total_byte_length,
            locator_id,
            data,
        ))
    }

    /// Converts the `CLob` into a String, fetching not-yet-transferred data.
    pub fn into_string(mut self) -> HdbResult<String> {
        self.0.load_complete()?;
        self.0.into_string_if_complete()
    }

    /// Reads a slice of the `CLob`'s data from the server; offset and length
    /// count bytes.
    pub fn read_slice(&mut self, offset: u64, length: u32) -> HdbResult<CharLobSlice> {
        self.0.read_slice(offset, length)
    }

    /// Total byte length of the LOB, as declared by the server.
    pub fn total_byte_length(&self) -> u64 {
        self.0.total_byte_length
    }

    /// Returns true if the `CLob` does not contain data.
    pub fn is_empty(&self) -> bool {
        self.total_byte_length() == 0
    }

    /// Number of bytes that are already on the client side.
    pub fn cur_buf_len(&self) -> usize {
        self.0.cesu8.len()
    }

    /// Information about the server-side resource consumption that is
    /// related to this `CLob` object.
    pub fn server_usage(&self) -> ServerUsage {
        self.0.server_usage
    }
}

// Supports streaming. The content is handed out as UTF-8.
impl std::io::Read for CLob {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read(buf)
    }
}

#[derive(Clone, Debug)]
struct CLobHandle {
    am_conn_core: AmConnCore,
    o_am_rscore: OAM<RsCore>,
    is_data_complete: bool,
    total_char_length: u64,
    total_byte_length: u64,
    locator_id: u64,
    cesu8: DebugIgnore<LobBuf>,
    utf8: DebugIgnore<LobBuf>,
    acc_byte_length: usize,
    server_usage: ServerUsage,
}
impl CLobHandle {
    #[allow(clippy::ref_option)]
    fn new(
        am_conn_core: &AmConnCore,
        o_am_rscore: &OAM<RsCore>,
        is_data_complete: bool,
        total_char_length: u64,
        total_byte_length: u64,
        locator_id: u64,
        cesu8: Vec<u8>,
    ) -> Self {
        let acc_byte_length = cesu8.len();
        let clob_handle = Self {
            am_conn_core: am_conn_core.clone(),
            o_am_rscore: o_am_rscore.clone(),
            total_char_length,
            total_byte_length,
            is_data_complete,
            locator_id,
            cesu8: DebugIgnore::from(LobBuf::with_initial_content(cesu8)),
            utf8: DebugIgnore::from(LobBuf::with_capacity(UTF_BUFFER_SIZE)),
            acc_byte_length,
            server_usage: ServerUsage::default(),
        };
        trace!(
            "CLobHandle::new() with is_data_complete = {}, total_byte_length = {}, \
             locator_id = {}, cesu8.len() = {}",
            clob_handle.is_data_complete,
            clob_handle.total_byte_length,
            clob_handle.locator_id,
            clob_handle.cesu8.len()
        );
        clob_handle
    }

    fn read_slice(&mut self, offset: u64, length: u32) -> HdbResult<CharLobSlice> {
        let (reply_data, _reply_is_last_data) = fetch_a_lob_chunk(
            &self.am_conn_core,
            self.locator_id,
            offset,
            length,
            &mut self.server_usage,
        )?;
        debug!("read_slice(): got {} bytes", reply_data.len());
        Ok(CharLobSlice {
            prefix: None,
            data: util::string_from_cesu8(reply_data)?,
            postfix: None,
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn fetch_next_chunk(&mut self) -> HdbResult<()> {
        if self.is_data_complete {
            return Err(HdbError::Impl("fetch_next_chunk(): already complete"));
        }

        let read_length = std::cmp::min(
            self.am_conn_core.lock()?.configuration().lob_chunk_size(),
            (self.total_byte_length - self.acc_byte_length as u64) as u32,
        );

        let (reply_data, reply_is_last_data) = fetch_a_lob_chunk(
            &self.am_conn_core,
            self.locator_id,
            self.acc_byte_length as u64,
            read_length,
            &mut self.server_usage,
        )?;

        self.acc_byte_length += reply_data.len();
        self.cesu8.append(&reply_data);
        if reply_is_last_data {
            self.is_data_complete = true;
            self.o_am_rscore = None;
        }

        trace!(
            "fetch_next_chunk: is_data_complete = {}, cesu8.len() = {}",
            self.is_data_complete,
            self.cesu8.len()
        );
        Ok(())
    }

    fn load_complete(&mut self) -> HdbResult<()> {
        trace!("load_complete()");
        while !self.is_data_complete {
            self.fetch_next_chunk()?;
        }
        Ok(())
    }

    fn into_string_if_complete(self) -> HdbResult<String> {
        if self.is_data_complete {
            util::string_from_cesu8(self.cesu8.0.into_inner())
        } else {
            Err(usage_err!(
                "the CLob must be loaded completely before 'into_string' can be called"
            ))
        }
    }

    fn fill_utf8_buffer(&mut self) -> std::io::Result<()> {
        if self.cesu8.len() < UTF_BUFFER_SIZE && !self.is_data_complete {
            self.fetch_next_chunk()
                .map_err(|e| util::io_error(e.to_string()))?;
        }

        let mut chunk_size = std::cmp::min(UTF_BUFFER_SIZE, self.cesu8.len());
        chunk_size -= util::get_cesu8_tail_len(&*self.cesu8, chunk_size)?;
        self.utf8.append(
            cesu8::from_cesu8(self.cesu8.drain(chunk_size)?)
                .map_err(util::io_error)?
                .as_bytes(),
        );
        Ok(())
    }
}

impl std::io::Read for CLobHandle {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let buf_len = buf.len();
        trace!("CLobHandle::read() called with buffer of size {buf_len}");
        let mut cursor = Cursor::new(buf);
        let mut written = 0;

        while written < buf_len {
            if self.utf8.is_empty() {
                self.fill_utf8_buffer()?;
                if self.utf8.is_empty() {
                    break;
                }
            }

            let chunk_size = std::cmp::min(buf_len - written, self.utf8.len());
            cursor.write_all(self.utf8.drain(chunk_size)?)?;
            written += chunk_size;
        }
        Ok(written)
    }
}
