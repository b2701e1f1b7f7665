/// Return type of [`CLob::read_slice`](crate::types::CLob::read_slice) and
/// [`NCLob::read_slice`](crate::types::NCLob::read_slice).
///
/// Because the server counts NCLOB offsets in 1-2-3-byte sequences, a
/// requested slice can begin or end in the middle of a surrogate pair. Such
/// orphaned halves cannot be part of the decoded string and are handed out
/// as raw bytes instead.
#[derive(Clone, Debug)]
pub struct CharLobSlice {
    /// If relevant, contains the second half of a surrogate pair at the
    /// begin of the slice.
    pub prefix: Option<Vec<u8>>,
    /// The main part of the slice, decoded to utf-8.
    pub data: String,
    /// If relevant, contains the first half of a surrogate pair at the
    /// end of the slice.
    pub postfix: Option<Vec<u8>>,
}
