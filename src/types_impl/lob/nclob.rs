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

/// LOB implementation for unicode Strings that is used within
/// [`HdbValue::NCLOB`](crate::HdbValue::NCLOB) instances coming from the
/// database.
///
/// The server counts and addresses the content of an NCLOB in 1-2-3-byte
/// sequences: a plain BMP character is one unit, a surrogate pair (which
/// needs six CESU-8 bytes) is two. All offsets of the chunked transfer are
/// maintained in these units, next to the plain byte count.
#[derive(Clone, Debug)]
pub struct NCLob(NCLobHandle);

impl NCLob {
    pub(crate) fn new(
        am_conn_core: &AmConnCore,
        o_am_rscore: &OAM<RsCore>,
        is_data_complete: bool,
        total_char_length: u64,
        total_byte_length: u64,
        locator_id: u64,
        data: Vec<u8>,
    ) -> Self {
        Self(NCLobHandle::new(
            am_conn_core,
            o_am_rscore,
            is_data_complete,
            total_char_length,
            total_byte_length,
            locator_id,
            data,
        ))
    }

    /// Converts the `NCLob` into a String, fetching not-yet-transferred data.
    pub fn into_string(mut self) -> HdbResult<String> {
        self.0.load_complete()?;
        self.0.into_string_if_complete()
    }

    /// Reads a slice of the `NCLob`'s data from the server.
    ///
    /// Offset and length are counted in 1-2-3-byte sequences; the begin or
    /// end of the slice can thus cut a surrogate pair in halves, which are
    /// handed out as byte sequences in the prefix resp. postfix of the
    /// result.
    pub fn read_slice(&mut self, offset: u64, length: u32) -> HdbResult<CharLobSlice> {
        self.0.read_slice(offset, length)
    }

    /// Total byte length of the LOB in CESU-8 encoding, as declared by the
    /// server.
    pub fn total_byte_length(&self) -> u64 {
        self.0.total_byte_length
    }

    /// Total character length of the LOB, in the server's 1-2-3-byte
    /// counting (a surrogate pair counts as two).
    pub fn total_char_length(&self) -> u64 {
        self.0.total_char_length
    }

    /// Returns true if the `NCLob` does not contain data.
    pub fn is_empty(&self) -> bool {
        self.total_byte_length() == 0
    }

    /// Number of bytes that are already on the client side.
    pub fn cur_buf_len(&self) -> usize {
        self.0.cesu8.len()
    }

    /// Information about the server-side resource consumption that is
    /// related to this `NCLob` object.
    pub fn server_usage(&self) -> ServerUsage {
        self.0.server_usage
    }
}

// Supports streaming. The content is handed out as UTF-8.
impl std::io::Read for NCLob {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read(buf)
    }
}

// The data stream can be cut into chunks between valid 1-, 2-, or 3-byte
// sequences. Since surrogate pairs can be cut in two halves (two 3-byte
// sequences), an orphaned surrogate may need to be buffered between two
// fetches.
#[derive(Clone, Debug)]
struct NCLobHandle {
    am_conn_core: AmConnCore,
    o_am_rscore: OAM<RsCore>,
    is_data_complete: bool,
    total_char_length: u64,
    total_byte_length: u64,
    locator_id: u64,
    cesu8: DebugIgnore<LobBuf>,
    utf8: DebugIgnore<LobBuf>,
    acc_byte_length: usize,
    acc_char_length: usize,
    server_usage: ServerUsage,
}
impl NCLobHandle {
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
        let acc_char_length = util::count_1_2_3_sequence_starts(&cesu8);
        let acc_byte_length = cesu8.len();

        let nclob_handle = Self {
            am_conn_core: am_conn_core.clone(),
            o_am_rscore: o_am_rscore.clone(),
            total_char_length,
            total_byte_length,
            is_data_complete,
            locator_id,
            cesu8: DebugIgnore::from(LobBuf::with_initial_content(cesu8)),
            utf8: DebugIgnore::from(LobBuf::with_capacity(UTF_BUFFER_SIZE)),
            acc_byte_length,
            acc_char_length,
            server_usage: ServerUsage::default(),
        };

        trace!(
            "NCLobHandle::new() with is_data_complete = {}, total_char_length = {}, \
             total_byte_length = {}, locator_id = {}, cesu8.len() = {}",
            nclob_handle.is_data_complete,
            nclob_handle.total_char_length,
            nclob_handle.total_byte_length,
            nclob_handle.locator_id,
            nclob_handle.cesu8.len()
        );
        nclob_handle
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
        util::split_off_orphaned_surrogates(reply_data)
    }

    // The character offset for the next chunk is the accumulated character
    // count; after the chunk arrives, both the byte and the character count
    // are advanced by the chunk's contribution.
    #[allow(clippy::cast_possible_truncation)]
    fn fetch_next_chunk(&mut self) -> HdbResult<()> {
        if self.is_data_complete {
            return Err(HdbError::Impl("fetch_next_chunk(): already complete"));
        }

        let read_length = std::cmp::min(
            self.am_conn_core.lock()?.configuration().lob_chunk_size(),
            (self.total_char_length - self.acc_char_length as u64) as u32,
        );

        let (reply_data, reply_is_last_data) = fetch_a_lob_chunk(
            &self.am_conn_core,
            self.locator_id,
            self.acc_char_length as u64,
            read_length,
            &mut self.server_usage,
        )?;

        self.acc_byte_length += reply_data.len();
        self.acc_char_length += util::count_1_2_3_sequence_starts(&reply_data);
        self.cesu8.append(&reply_data);

        if reply_is_last_data {
            self.is_data_complete = true;
            self.o_am_rscore = None;
        }

        if self.is_data_complete != (self.total_byte_length == self.acc_byte_length as u64) {
            return Err(HdbError::Impl(
                "fetch_next_chunk(): byte count does not match the last-data flag",
            ));
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

    // Converts into a String containing its data, if it is fully loaded.
    fn into_string_if_complete(self) -> HdbResult<String> {
        if self.is_data_complete {
            util::string_from_cesu8(self.cesu8.0.into_inner())
        } else {
            Err(usage_err!(
                "the NCLob must be loaded completely before 'into_string' can be called"
            ))
        }
    }

    // Assumption: utf8 is empty. Fills the utf8 buffer from cesu8: drain a
    // chunk from cesu8 (shortened so that it does not end in the middle of a
    // character), convert, store as utf8.
    fn fill_utf8_buffer(&mut self) -> std::io::Result<()> {
        // refill cesu8 if necessary
        if self.cesu8.len() < UTF_BUFFER_SIZE && !self.is_data_complete {
            self.fetch_next_chunk()
                .map_err(|e| util::io_error(e.to_string()))?;
        }

        // now refill utf8
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

// Read from the DB chunks of lob_chunk_size into self.cesu8,
// then drain from there chunks (shortened if necessary to keep the chunk
// valid cesu8), convert each into utf8 and store it as self.utf8,
// and drain utf8 into the external buffer.
impl std::io::Read for NCLobHandle {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let buf_len = buf.len();
        trace!("NCLobHandle::read() called with buffer of size {buf_len}");
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
