use crate::types_impl::lob::CharLobSlice;
use crate::{impl_err, HdbError, HdbResult};

pub(crate) fn io_error<E>(error: E) -> std::io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    std::io::Error::other(error)
}

// --- CESU8 Stuff --- //

/// Controls what happens when bytes from the wire do not form valid CESU-8.
///
/// Character payloads are transcoded between the host string (UTF-8) and
/// CESU-8 on the wire; the server is normally strict, but a few system views
/// are known to contain broken byte sequences.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Cesu8DecodePolicy {
    /// Fail with an error (the default).
    #[default]
    Fail,
    /// Replace invalid sequences with U+FFFD.
    Replace,
}

// Consumes the cesu8 bytes, returns a String with minimal allocation.
pub(crate) fn string_from_cesu8(bytes: Vec<u8>) -> HdbResult<String> {
    String::from_utf8(bytes).or_else(|e| {
        Ok(cesu8::from_cesu8(e.as_bytes())
            .map_err(|_| HdbError::Cesu8)?
            .to_string())
    })
}

// Decodes as much as possible, replacing broken sequences with U+FFFD.
pub(crate) fn string_from_cesu8_lossy(bytes: &[u8]) -> String {
    match cesu8::from_cesu8(bytes) {
        Ok(cow) => cow.to_string(),
        Err(_) => {
            // decode in valid chunks, replacing the borders
            let mut result = String::with_capacity(bytes.len());
            let mut rest = bytes;
            while !rest.is_empty() {
                let valid_len = longest_valid_cesu8_prefix(rest);
                if valid_len == 0 {
                    result.push('\u{FFFD}');
                    rest = &rest[1..];
                } else {
                    result.push_str(&cesu8::from_cesu8(&rest[..valid_len]).unwrap(/*OK*/));
                    rest = &rest[valid_len..];
                }
            }
            result
        }
    }
}

fn longest_valid_cesu8_prefix(bytes: &[u8]) -> usize {
    let mut len = bytes.len();
    while len > 0 {
        if cesu8::from_cesu8(&bytes[..len]).is_ok() {
            return len;
        }
        len -= 1;
    }
    0
}

// Consumes the cesu8 bytes, returns a String or the original bytes.
pub(crate) fn try_string_from_cesu8(bytes: Vec<u8>) -> Result<String, Vec<u8>> {
    String::from_utf8(bytes).or_else(|e| {
        Ok(cesu8::from_cesu8(e.as_bytes())
            .map_err(|_| e.as_bytes())?
            .to_string())
    })
}

// cesu-8 is identical to utf-8, except for high code points which consume
// 4 bytes in utf-8 and 6 in cesu-8; the first byte of such a code point in
// utf-8 has the bit pattern 11110xxx (240 - 247).
pub(crate) fn cesu8_length(s: &str) -> usize {
    let mut len = s.len();
    for b in s.as_bytes() {
        if *b >= 240_u8 {
            // 240 = b11110000
            len += 2;
        }
    }
    len
}

// The server counts characters in 1-2-3-byte units: each cesu-8 sequence
// start is one unit, so a surrogate pair (two 3-byte sequences) counts as
// two. LOB offsets for NCLOBs are expressed in these units.
pub(crate) fn count_1_2_3_sequence_starts(cesu8: &[u8]) -> usize {
    cesu8.iter().filter(|b| is_utf8_char_start(**b)).count()
}
fn is_utf8_char_start(b: u8) -> bool {
    matches!(b, 0x00..=0x7F | 0xC0..=0xDF | 0xE0..=0xEF | 0xF0..=0xF7)
}

// Determine how many of the `len` bytes must be cut off to ensure the
// remaining bytes end with consistent cesu-8 that can be converted into utf-8.
pub(crate) fn get_cesu8_tail_len<T>(bytes: &T, len: usize) -> std::io::Result<usize>
where
    T: std::ops::Index<usize, Output = u8>,
{
    if len == 0 {
        return Ok(0);
    }
    match bytes[len - 1] {
        0..=127 => Ok(0),     // last byte is ASCII-7, no need to cut anything off
        0xC0..=0xDF => Ok(1), // last byte is start of a two-byte sequence, cut off here
        _ => {
            for index in (0..len).rev() {
                if let Some(char_len) = match cesu8_char_type(bytes, index, len) {
                    Cesu8CharType::One => Some(1),
                    Cesu8CharType::Two => Some(2),
                    Cesu8CharType::Three => Some(3),
                    Cesu8CharType::FirstHalfOfSurrogate => Some(6),
                    Cesu8CharType::SecondHalfOfSurrogate
                    | Cesu8CharType::NotAStart
                    | Cesu8CharType::TooShort => None,
                } {
                    return Ok(match (len - index).cmp(&char_len) {
                        std::cmp::Ordering::Greater => len - index - char_len,
                        std::cmp::Ordering::Equal => 0,
                        std::cmp::Ordering::Less => len - index,
                    });
                }
            }
            Err(io_error("no valid cesu8 cutoff point found"))
        }
    }
}

// Splits a server chunk into an optional orphaned second-half surrogate at
// the begin, the utf-8 core, and an optional orphaned first-half surrogate
// at the end.
pub(crate) fn split_off_orphaned_surrogates(cesu8: Vec<u8>) -> HdbResult<CharLobSlice> {
    let (prefix, cesu8) = match cesu8_char_type(&cesu8, 0, cesu8.len()) {
        Cesu8CharType::One
        | Cesu8CharType::Two
        | Cesu8CharType::Three
        | Cesu8CharType::FirstHalfOfSurrogate => (None, cesu8),
        Cesu8CharType::SecondHalfOfSurrogate => (
            Some(vec![cesu8[0], cesu8[1], cesu8[2]]),
            cesu8[3..].to_vec(),
        ),
        Cesu8CharType::NotAStart | Cesu8CharType::TooShort => {
            return Err(impl_err!("unexpected value for NCLob"));
        }
    };
    let (data, postfix) = cesu8_to_string_and_surrogate(cesu8)?;
    Ok(CharLobSlice {
        prefix,
        data,
        postfix,
    })
}

fn cesu8_to_string_and_surrogate(cesu8: Vec<u8>) -> HdbResult<(String, Option<Vec<u8>>)> {
    let (utf8, tail_cesu8) = cesu8_to_string_and_tail(cesu8)?;
    match tail_cesu8.len() {
        0 => Ok((utf8, None)),
        3 => {
            debug!("cesu8_to_string_and_surrogate() found a split surrogate pair");
            Ok((utf8, Some(vec![tail_cesu8[0], tail_cesu8[1], tail_cesu8[2]])))
        }
        _ => Err(impl_err!("unexpected cesu8 tail = {tail_cesu8:?}")),
    }
}

pub(crate) fn cesu8_to_string_and_tail(mut cesu8: Vec<u8>) -> HdbResult<(String, Vec<u8>)> {
    let tail_len = get_cesu8_tail_len(&cesu8, cesu8.len())?;
    let tail = cesu8.split_off(cesu8.len() - tail_len);
    Ok((string_from_cesu8(cesu8)?, tail))
}

// First half:
//  11101101 10100000 10000000  to  11101101 10101111 10111111
// Second half:
//  11101101 10110000 10000000  to  11101101 10111111 10111111
// Any three byte sequence:
//  11100000 10000000 10000000  to  11101111 10111111 10111111
fn cesu8_char_type<T>(cesu8: &T, first: usize, len: usize) -> Cesu8CharType
where
    T: std::ops::Index<usize, Output = u8>,
{
    if first == len - 1 {
        match cesu8[first] {
            0x00..=0x7F => Cesu8CharType::One,
            0xC0..=0xDF => Cesu8CharType::Two,
            _ => Cesu8CharType::TooShort,
        }
    } else {
        match (cesu8[first], cesu8[first + 1]) {
            (0x00..=0x7F, _) => Cesu8CharType::One,
            (0xC0..=0xDF, _) => Cesu8CharType::Two,
            (0xED, 0xA0..=0xAF) => Cesu8CharType::FirstHalfOfSurrogate,
            (0xED, 0xB0..=0xBF) => Cesu8CharType::SecondHalfOfSurrogate,
            (0xE0..=0xEF, 0x80..=0xBF) => Cesu8CharType::Three,
            (_, _) => Cesu8CharType::NotAStart,
        }
    }
}

#[derive(Debug)]
enum Cesu8CharType {
    TooShort,
    NotAStart,
    One,   // plain ascii
    Two,   // two-byte char
    Three, // non-surrogate three-byte char
    FirstHalfOfSurrogate,
    SecondHalfOfSurrogate,
}

#[cfg(test)]
mod tests {
    #[test]
    fn check_tail_detection() {
        let s_utf8 = "¡Este código es editable y ejecutable! Ce code est modifiable et exécutable ! \
			Quest💩o codice è modificabile ed eseguibile! このコードは編集して実行出来ます！ \
            여기에서 코드를 수정하고 실행할 수 있습니다! Ten kod można edytować ora💩z uruchomić! \
            Este código é editável e execu💩💩t💩ável! Этот код можно отредактировать и запустить! \
            Bạn có thể edit và run code trực tiếp! 这段💩💩💩💩代💩💩码是可以编辑并且能够运行的！";

        let v_cesu8 = cesu8::to_cesu8(s_utf8);
        assert_eq!(s_utf8, cesu8::from_cesu8(&v_cesu8).unwrap());

        for i in 0..v_cesu8.len() {
            // forcefully split in two parts that may be invalid unicode
            let (first_cesu8, second_cesu8) = v_cesu8.split_at(i);

            // split the first part in valid unicode plus the tail
            let (mut f_utf8, mut tail_cesu8) =
                super::cesu8_to_string_and_tail(first_cesu8.to_vec()).unwrap();

            // the tail must be shorter than a complete surrogate pair
            assert!(tail_cesu8.len() < 6);

            // tail plus second must be valid cesu8 again
            tail_cesu8.extend_from_slice(second_cesu8);
            let second_utf8 = String::from(cesu8::from_cesu8(&tail_cesu8).unwrap());

            // the concatenation must be equal to the original
            f_utf8.push_str(&second_utf8);
            assert_eq!(s_utf8, f_utf8);
        }
    }

    #[test]
    fn check_char_counting() {
        // the server counts a supplementary-plane rune (a surrogate pair,
        // six cesu8 bytes) as two characters
        assert_eq!(super::count_1_2_3_sequence_starts(&cesu8::to_cesu8("𝄞")), 2);
        assert_eq!(cesu8::to_cesu8("𝄞").len(), 6);
        assert_eq!(super::cesu8_length("𝄞"), 6);

        // plain BMP characters count once
        assert_eq!(
            super::count_1_2_3_sequence_starts(&cesu8::to_cesu8("abcä")),
            4
        );

        let s = "a𝄞b💩c";
        assert_eq!(cesu8::to_cesu8(s).len(), super::cesu8_length(s));
        assert_eq!(
            super::count_1_2_3_sequence_starts(&cesu8::to_cesu8(s)),
            3 + 2 * 2
        );
    }

    #[test]
    fn check_lossy_decoding() {
        let mut bytes = cesu8::to_cesu8("ab💩").to_vec();
        bytes.truncate(bytes.len() - 2); // cut into the surrogate pair
        let s = super::string_from_cesu8_lossy(&bytes);
        assert!(s.starts_with("ab"));
        assert!(s.contains('\u{FFFD}'));
    }
}
