use super::fetch::fetch_a_lob_chunk;
use super::LobBuf;
use crate::{
    base::{RsCore, OAM},
    conn::AmConnCore,
    usage_err, HdbError, HdbResult, ServerUsage,
};
use debug_ignore::DebugIgnore;
use std::io::{Cursor, Write};

/// LOB implementation for binary values that is used within
/// [`HdbValue::BLOB`](crate::HdbValue::BLOB) instances coming from the
/// database.
///
/// The data are often not transferred completely, so the instance carries
/// internally the connection and the controls to fetch the remainder on
/// demand. Reading can be done with [`BLob::into_bytes`], or streaming with
/// the `std::io::Read` implementation.
#[derive(Clone, Debug)]
pub struct BLob(BLobHandle);

impl BLob {
    pub(crate) fn new(
        am_conn_core: &AmConnCore,
        o_am_rscore: &OAM<RsCore>,
        is_data_complete: bool,
        total_byte_length: u64,
        locator_id: u64,
        data: Vec<u8>,
    ) -> Self {
        Self(BLobHandle::new(
            am_conn_core,
            o_am_rscore,
            is_data_complete,
            total_byte_length,
            locator_id,
            data,
        ))
    }

    /// Converts the `BLob` into a Vec<u8>, fetching not-yet-transferred data.
    pub fn into_bytes(mut self) -> HdbResult<Vec<u8>> {
        self.0.load_complete()?;
        self.0.into_bytes_if_complete()
    }

    /// Reads a slice of the `BLob`'s data from the server, without affecting
    /// the read position of the streaming interface.
    pub fn read_slice(&mut self, offset: u64, length: u32) -> HdbResult<Vec<u8>> {
        self.0.read_slice(offset, length)
    }

    /// Total byte length of the LOB, as declared by the server.
    pub fn total_byte_length(&self) -> u64 {
        self.0.total_byte_length
    }

    /// Returns true if the `BLob` does not contain data.
    pub fn is_empty(&self) -> bool {
        self.total_byte_length() == 0
    }

    /// Number of bytes that are already on the client side.
    pub fn cur_buf_len(&self) -> usize {
        self.0.data.len()
    }

    /// Information about the server-side resource consumption that is
    /// related to this `BLob` object.
    pub fn server_usage(&self) -> ServerUsage {
        self.0.server_usage
    }
}

// Supports streaming.
impl std::io::Read for BLob {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read(buf)
    }
}

#[derive(Clone, Debug)]
struct BLobHandle {
    am_conn_core: AmConnCore,
    o_am_rscore: OAM<RsCore>,
    is_data_complete: bool,
    total_byte_length: u64,
    locator_id: u64,
    data: DebugIgnore<LobBuf>,
    acc_byte_length: usize,
    server_usage: ServerUsage,
}
impl BLobHandle {
    #[allow(clippy::ref_option)]
    fn new(
        am_conn_core: &AmConnCore,
        o_am_rscore: &OAM<RsCore>,
        is_data_complete: bool,
        total_byte_length: u64,
        locator_id: u64,
        data: Vec<u8>,
    ) -> Self {
        trace!(
            "BLobHandle::new() with total_byte_length = {total_byte_length}, \
             locator_id = {locator_id}, is_data_complete = {is_data_complete}, \
             data.len() = {}",
            data.len()
        );
        Self {
            am_conn_core: am_conn_core.clone(),
            o_am_rscore: o_am_rscore.clone(),
            total_byte_length,
            is_data_complete,
            locator_id,
            acc_byte_length: data.len(),
            data: DebugIgnore::from(LobBuf::with_initial_content(data)),
            server_usage: ServerUsage::default(),
        }
    }

    fn read_slice(&mut self, offset: u64, length: u32) -> HdbResult<Vec<u8>> {
        let (reply_data, _reply_is_last_data) = fetch_a_lob_chunk(
            &self.am_conn_core,
            self.locator_id,
            offset,
            length,
            &mut self.server_usage,
        )?;
        debug!("read_slice(): got {} bytes", reply_data.len());
        Ok(reply_data)
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
        self.data.append(&reply_data);
        if reply_is_last_data {
            self.is_data_complete = true;
            self.o_am_rscore = None;
        }

        trace!(
            "fetch_next_chunk: is_data_complete = {}, data.len() = {}",
            self.is_data_complete,
            self.data.len()
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

    fn into_bytes_if_complete(self) -> HdbResult<Vec<u8>> {
        if self.is_data_complete {
            Ok(self.data.0.into_inner())
        } else {
            Err(usage_err!(
                "the BLob must be loaded completely before 'into_bytes' can be called"
            ))
        }
    }
}

// Support for streaming.
impl std::io::Read for BLobHandle {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let buf_len = buf.len();
        trace!("BLobHandle::read() called with buffer of size {buf_len}");
        let mut cursor = Cursor::new(buf);
        let mut written = 0;

        while written < buf_len {
            if self.data.is_empty() {
                if self.is_data_complete {
                    break;
                }
                self.fetch_next_chunk()
                    .map_err(|e| std::io::Error::other(e.to_string()))?;
            }
            let chunk_size = std::cmp::min(buf_len - written, self.data.len());
            cursor.write_all(self.data.drain(chunk_size)?)?;
            written += chunk_size;
        }
        Ok(written)
    }
}
