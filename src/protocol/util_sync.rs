use crate::HdbResult;

// Read n bytes, return as Vec<u8>.
pub(crate) fn parse_bytes(len: usize, rdr: &mut dyn std::io::Read) -> HdbResult<Vec<u8>> {
    let mut vec = vec![0_u8; len];
    rdr.read_exact(&mut vec)?;
    Ok(vec)
}

// Skip over n bytes of the stream.
pub(crate) fn skip_bytes(n: usize, rdr: &mut dyn std::io::Read) -> HdbResult<()> {
    const BUFLEN: usize = 32;
    let mut buffer = [0_u8; BUFLEN];
    let mut remaining = n;
    while remaining > 0 {
        let chunk = std::cmp::min(remaining, BUFLEN);
        rdr.read_exact(&mut buffer[0..chunk])?;
        remaining -= chunk;
    }
    Ok(())
}
