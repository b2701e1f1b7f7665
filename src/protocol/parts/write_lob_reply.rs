use crate::HdbResult;
use byteorder::{LittleEndian, ReadBytesExt};

// Carries one locator id per LOB field whose data did not fit into the
// EXECUTE request; the ids arrive in the order of the fields.
#[derive(Debug)]
pub(crate) struct WriteLobReply {
    locator_ids: Vec<u64>,
}
impl WriteLobReply {
    pub fn into_locator_ids(self) -> Vec<u64> {
        self.locator_ids
    }

    pub fn parse(count: usize, rdr: &mut dyn std::io::Read) -> HdbResult<Self> {
        debug!("WriteLobReply::parse() with count = {count}");
        let mut locator_ids = Vec::<u64>::default();
        for _ in 0..count {
            let locator_id = rdr.read_u64::<LittleEndian>()?; // I8
            locator_ids.push(locator_id);
        }

        Ok(Self { locator_ids })
    }
}
