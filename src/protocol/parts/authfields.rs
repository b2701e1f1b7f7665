use crate::{
    protocol::{parts::length_indicator, util_sync},
    HdbResult,
};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

// The payload of an Authentication part: a counted list of variable-length
// byte fields. Authentication sub-messages (challenges, proofs) reuse the
// same encoding nested inside a single field.
#[derive(Debug, Default)]
pub(crate) struct AuthFields(Vec<AuthField>);
impl AuthFields {
    pub(crate) fn with_capacity(count: usize) -> Self {
        Self(Vec::<AuthField>::with_capacity(count))
    }

    pub(crate) fn parse(rdr: &mut dyn std::io::Read) -> HdbResult<Self> {
        let field_count = rdr.read_u16::<LittleEndian>()? as usize; // I2
        let mut auth_fields: Self = Self(Vec::<AuthField>::with_capacity(field_count));
        for _ in 0..field_count {
            auth_fields.0.push(AuthField::parse(rdr)?);
        }
        Ok(auth_fields)
    }

    pub(crate) fn pop(&mut self) -> Option<Vec<u8>> {
        self.0.pop().map(AuthField::data)
    }

    pub(crate) fn size(&self) -> usize {
        let mut size = 2;
        for af in &self.0 {
            size += af.size();
        }
        size
    }

    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_possible_wrap)]
    pub(crate) fn emit(&self, w: &mut dyn std::io::Write) -> HdbResult<()> {
        w.write_i16::<LittleEndian>(self.0.len() as i16)?;
        for field in &self.0 {
            field.emit(w)?;
        }
        Ok(())
    }

    pub(crate) fn push(&mut self, vec: Vec<u8>) {
        self.0.push(AuthField::new(vec));
    }
    pub(crate) fn push_string(&mut self, s: &str) {
        self.0.push(AuthField::new(s.as_bytes().to_vec()));
    }

    // Serializes into a standalone byte vector, for nesting sub-messages
    // within a single auth field.
    pub(crate) fn into_bytes(self) -> HdbResult<Vec<u8>> {
        let mut buf = Vec::<u8>::with_capacity(self.size());
        self.emit(&mut buf)?;
        Ok(buf)
    }
}

#[derive(Debug)]
struct AuthField(Vec<u8>);
impl AuthField {
    fn new(vec: Vec<u8>) -> Self {
        Self(vec)
    }

    fn data(self) -> Vec<u8> {
        self.0
    }

    fn emit(&self, w: &mut dyn std::io::Write) -> HdbResult<()> {
        length_indicator::emit(self.0.len(), w)?;
        w.write_all(&self.0)?; // B (varying) value
        Ok(())
    }

    fn size(&self) -> usize {
        1 + self.0.len()
    }

    fn parse(rdr: &mut dyn std::io::Read) -> HdbResult<Self> {
        let len = length_indicator::parse(rdr.read_u8()?, rdr)?;
        Ok(Self(util_sync::parse_bytes(len, rdr)?))
    }
}

#[cfg(test)]
mod test {
    use super::AuthFields;

    #[test]
    fn test_roundtrip() {
        let mut fields = AuthFields::with_capacity(3);
        fields.push_string("SCRAMSHA256");
        fields.push(vec![1_u8; 64]);
        fields.push(Vec::new());

        let bytes = fields.into_bytes().unwrap();
        let mut parsed = AuthFields::parse(&mut std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(parsed.pop().unwrap(), Vec::<u8>::new());
        assert_eq!(parsed.pop().unwrap(), vec![1_u8; 64]);
        assert_eq!(parsed.pop().unwrap(), b"SCRAMSHA256".to_vec());
        assert!(parsed.pop().is_none());
    }
}
