use crate::protocol::util::Cesu8DecodePolicy;

// Parameterizes every field codec invocation of a connection.
//
// The data format version is negotiated with the server at connect time and
// decides which wire encodings apply to date/time, decimal, boolean, and
// alphanum fields; the other two knobs come from the configuration.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FieldTypeContext {
    pub dataformat_version: u8,
    pub emptydate_as_null: bool,
    pub cesu8_policy: Cesu8DecodePolicy,
}

impl Default for FieldTypeContext {
    fn default() -> Self {
        Self {
            dataformat_version: 8,
            emptydate_as_null: false,
            cesu8_policy: Cesu8DecodePolicy::Fail,
        }
    }
}

impl FieldTypeContext {
    // Booleans are plain 0/1 with a leading null indicator below data format
    // version 8, and a single 0/1/2 byte (false/null/true) from 8 on.
    pub(crate) fn has_tristate_boolean(self) -> bool {
        self.dataformat_version >= 8
    }
}
