// Last part in a sequence of parts (FETCH, array command EXECUTE)
const LAST_PACKET: u8 = 0b_0000_0001;

// Part in a sequence of parts
const NEXT_PACKET: u8 = 0b_0000_0010;

// First part in a sequence of parts
const FIRST_PACKET: u8 = 0b_0000_0100;

// Empty part, caused by "row not found" error
const ROW_NOT_FOUND: u8 = 0b_0000_1000;

// The result set that produced this part is closed
const RESULT_SET_IS_CLOSED: u8 = 0b_0001_0000;

// Bit pattern found on some reply parts.
#[derive(Clone)]
pub(crate) struct PartAttributes(u8);
impl PartAttributes {
    pub fn new(bits: u8) -> Self {
        Self(bits)
    }

    pub fn is_last_packet(&self) -> bool {
        (self.0 & LAST_PACKET) != 0
    }
    fn has_next_packet(&self) -> bool {
        (self.0 & NEXT_PACKET) != 0
    }
    fn is_first_packet(&self) -> bool {
        (self.0 & FIRST_PACKET) != 0
    }
    pub fn row_not_found(&self) -> bool {
        (self.0 & ROW_NOT_FOUND) != 0
    }
    pub fn result_set_is_closed(&self) -> bool {
        (self.0 & RESULT_SET_IS_CLOSED) != 0
    }
}

impl std::fmt::Debug for PartAttributes {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.0 == 0 {
            write!(f, "0")
        } else {
            let mut first = true;
            let mut w = |f: &mut std::fmt::Formatter, s: &str| -> std::fmt::Result {
                if first {
                    first = false;
                } else {
                    write!(f, " & ")?;
                }
                write!(f, "{s}")
            };
            write!(f, "(")?;
            if self.is_last_packet() {
                w(f, "IS_LAST_PACKET")?;
            }
            if self.has_next_packet() {
                w(f, "HAS_NEXT_PACKET")?;
            }
            if self.is_first_packet() {
                w(f, "IS_FIRST_PACKET")?;
            }
            if self.row_not_found() {
                w(f, "ROW_NOT_FOUND")?;
            }
            if self.result_set_is_closed() {
                w(f, "RESULT_SET_CLOSED")?;
            }
            write!(f, ")")
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_part_attributes() {
        let none = PartAttributes::new(0);
        assert!(!none.has_next_packet());
        assert!(!none.is_first_packet());
        assert!(!none.is_last_packet());
        assert!(!none.result_set_is_closed());
        assert!(!none.row_not_found());
        assert_eq!(format!("{none:?}"), "0");

        let all = PartAttributes::new(
            LAST_PACKET | NEXT_PACKET | FIRST_PACKET | ROW_NOT_FOUND | RESULT_SET_IS_CLOSED,
        );
        assert!(all.has_next_packet());
        assert!(all.is_first_packet());
        assert!(all.is_last_packet());
        assert!(all.result_set_is_closed());
        assert!(all.row_not_found());
    }
}
