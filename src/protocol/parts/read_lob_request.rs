use byteorder::{LittleEndian, WriteBytesExt};

// Requests a chunk of LOB data. Offset and length count bytes for BLOB and
// CLOB, but 1-2-3-byte sequences for NCLOB (a surrogate pair counts as two).
// The server expects 1-based offsets.
#[derive(Debug)]
pub(crate) struct ReadLobRequest {
    locator_id: u64,
    offset: u64,
    length: u32,
}
impl ReadLobRequest {
    pub fn new(locator_id: u64, offset: u64, length: u32) -> Self {
        trace!("ReadLobRequest: offset = {offset}, length = {length}");
        Self {
            locator_id,
            offset,
            length,
        }
    }

    pub fn emit(&self, w: &mut dyn std::io::Write) -> std::io::Result<()> {
        w.write_u64::<LittleEndian>(self.locator_id)?;
        w.write_u64::<LittleEndian>(self.offset)?;
        w.write_u32::<LittleEndian>(self.length)?;
        w.write_u32::<LittleEndian>(0_u32)?; // FILLER
        Ok(())
    }

    pub fn size() -> usize {
        24
    }
}
