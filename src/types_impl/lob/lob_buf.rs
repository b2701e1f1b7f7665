// Vec is filled with append, and start denotes where "real" data starts.
// Draining moves start forward; the allocation is reused across refills.
#[derive(Clone)]
pub(crate) struct LobBuf {
    data: Vec<u8>,
    start: usize,
}

impl LobBuf {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            start: 0,
        }
    }
    pub(crate) fn with_initial_content(data: Vec<u8>) -> Self {
        Self { data, start: 0 }
    }

    pub(crate) fn into_inner(mut self) -> Vec<u8> {
        self.data.drain(0..self.start);
        self.data
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len() - self.start
    }
    pub(crate) fn is_empty(&self) -> bool {
        self.data.len() == self.start
    }

    pub(crate) fn append(&mut self, data: &[u8]) {
        self.data.extend_from_slice(data);
    }

    pub(crate) fn drain(&mut self, n: usize) -> Result<&[u8], std::io::Error> {
        let start = self.start;
        let end = self.data.len();
        if n > end - start {
            return Err(std::io::Error::other("not enough data"));
        }
        self.start = start + n;
        Ok(&self.data[start..start + n])
    }
}

impl std::ops::Index<usize> for LobBuf {
    type Output = u8;
    fn index(&self, index: usize) -> &Self::Output {
        &self.data[self.start + index]
    }
}

#[cfg(test)]
mod test {
    use super::LobBuf;

    #[test]
    fn test_lob_buf() {
        let mut lob_buf = LobBuf::with_capacity(100);
        lob_buf.append(b"hello dear world");
        assert_eq!(lob_buf.len(), 16);

        let data = lob_buf.drain(6).unwrap();
        assert_eq!(data, b"hello ");
        assert_eq!(lob_buf.len(), 10);
        assert_eq!(lob_buf[0], b'd');

        assert!(lob_buf.drain(11).is_err());
        let data = lob_buf.drain(10).unwrap();
        assert_eq!(data, b"dear world");
        assert!(lob_buf.is_empty());
    }
}
