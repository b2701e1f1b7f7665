mod blob;
mod char_lob_slice;
mod clob;
mod fetch;
mod lob_buf;
mod lob_writer;
mod nclob;
mod wire;

pub use self::{blob::BLob, char_lob_slice::CharLobSlice, clob::CLob, nclob::NCLob};
pub(crate) use self::{
    lob_buf::LobBuf,
    lob_writer::LobWriter,
    wire::{emit_lob_header, parse_blob, parse_clob, parse_nclob},
};

// Number of bytes that are converted from cesu-8 to utf-8 in one go.
pub(crate) const UTF_BUFFER_SIZE: usize = 8 * 1024;
