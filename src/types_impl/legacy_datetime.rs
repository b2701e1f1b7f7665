//! The fixed date/time wire forms that the server uses with data format
//! version 1 (type codes DATE, TIME, TIMESTAMP).
//!
//! They are normalized into the same raw types as the newer forms, so the
//! rest of the crate never sees the difference: DATE becomes a `DayDate`,
//! TIME a `SecondTime`, and TIMESTAMP a `LongDate`.

use crate::types::{DayDate, LongDate, SecondTime};
use crate::{HdbError, HdbResult, HdbValue};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

pub(crate) const DATE_SIZE: usize = 4;
pub(crate) const TIME_SIZE: usize = 4;
pub(crate) const TIMESTAMP_SIZE: usize = 8;

// The high bit of the year word (DATE) resp. the hour byte (TIME) is set for
// non-null values; with it cleared the remaining bytes are meaningless.
const DATE_NOT_NULL: u16 = 0x8000;
const TIME_NOT_NULL: u8 = 0x80;

const ZEITENWENDE: i64 = 1_721_424;
const SECONDS_PER_DAY: i64 = 86_400;
const TICKS_PER_SECOND: i64 = 10_000_000;

pub(crate) fn parse_date(
    nullable: bool,
    rdr: &mut dyn std::io::Read,
) -> HdbResult<HdbValue<'static>> {
    match parse_date_inner(rdr)? {
        Some((year, month, day)) => {
            let raw = julian_day_number(year, month, day) - i32::try_from(ZEITENWENDE).unwrap(/*OK*/) + 1;
            Ok(HdbValue::DAYDATE(DayDate::new(raw)))
        }
        None => {
            if nullable {
                Ok(HdbValue::NULL)
            } else {
                Err(HdbError::Impl("found NULL value for NOT NULL DATE column"))
            }
        }
    }
}

pub(crate) fn parse_time(
    nullable: bool,
    rdr: &mut dyn std::io::Read,
) -> HdbResult<HdbValue<'static>> {
    match parse_time_inner(rdr)? {
        Some((hour, minute, second)) => {
            let raw = i32::try_from(hour * 3600 + minute * 60 + second + 1).unwrap(/*OK*/);
            Ok(HdbValue::SECONDTIME(SecondTime::new(raw)))
        }
        None => {
            if nullable {
                Ok(HdbValue::NULL)
            } else {
                Err(HdbError::Impl("found NULL value for NOT NULL TIME column"))
            }
        }
    }
}

pub(crate) fn parse_timestamp(
    nullable: bool,
    rdr: &mut dyn std::io::Read,
) -> HdbResult<HdbValue<'static>> {
    let o_date = parse_date_inner(rdr)?;
    let o_time = parse_time_with_millis(rdr)?;
    match (o_date, o_time) {
        (Some((year, month, day)), o_time) => {
            let (hour, minute, second, millis) = o_time.unwrap_or((0, 0, 0, 0));
            let days =
                i64::from(julian_day_number(year, month, day)) - ZEITENWENDE;
            let seconds = days * SECONDS_PER_DAY
                + i64::from(hour) * 3600
                + i64::from(minute) * 60
                + i64::from(second);
            let raw = seconds * TICKS_PER_SECOND + i64::from(millis) * 10_000 + 1;
            Ok(HdbValue::LONGDATE(LongDate::new(raw)))
        }
        (None, _) => {
            if nullable {
                Ok(HdbValue::NULL)
            } else {
                Err(HdbError::Impl(
                    "found NULL value for NOT NULL TIMESTAMP column",
                ))
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn emit_date(dd: &DayDate, w: &mut dyn std::io::Write) -> HdbResult<()> {
    let (year, month, day) = dd.as_ymd();
    w.write_u16::<LittleEndian>(u16::try_from(year).unwrap_or(0) | DATE_NOT_NULL)?;
    w.write_u8((month - 1) as u8)?;
    w.write_u8(day as u8)?;
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn emit_time(st: &SecondTime, w: &mut dyn std::io::Write) -> HdbResult<()> {
    let (hour, minute, second) = st.as_hms();
    w.write_u8(hour as u8 | TIME_NOT_NULL)?;
    w.write_u8(minute as u8)?;
    w.write_u16::<LittleEndian>((second * 1000) as u16)?;
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn emit_timestamp(ld: &LongDate, w: &mut dyn std::io::Write) -> HdbResult<()> {
    let (year, month, day, hour, minute, second, fraction) = ld.as_ymd_hms_f();
    w.write_u16::<LittleEndian>(u16::try_from(year).unwrap_or(0) | DATE_NOT_NULL)?;
    w.write_u8(month - 1)?;
    w.write_u8(day)?;
    w.write_u8(hour | TIME_NOT_NULL)?;
    w.write_u8(minute)?;
    let millis = u16::from(second) * 1000 + (fraction / 10_000) as u16;
    w.write_u16::<LittleEndian>(millis)?;
    Ok(())
}

fn parse_date_inner(rdr: &mut dyn std::io::Read) -> HdbResult<Option<(i32, u32, u32)>> {
    let year_word = rdr.read_u16::<LittleEndian>()?;
    let month = rdr.read_u8()?;
    let day = rdr.read_u8()?;
    if year_word & DATE_NOT_NULL == 0 {
        Ok(None)
    } else {
        Ok(Some((
            i32::from(year_word & !DATE_NOT_NULL),
            u32::from(month) + 1,
            u32::from(day),
        )))
    }
}

fn parse_time_inner(rdr: &mut dyn std::io::Read) -> HdbResult<Option<(u32, u32, u32)>> {
    Ok(parse_time_with_millis(rdr)?.map(|(h, m, s, _millis)| (h, m, s)))
}

fn parse_time_with_millis(rdr: &mut dyn std::io::Read) -> HdbResult<Option<(u32, u32, u32, u32)>> {
    let hour_byte = rdr.read_u8()?;
    let minute = rdr.read_u8()?;
    let millis_of_minute = rdr.read_u16::<LittleEndian>()?;
    if hour_byte & TIME_NOT_NULL == 0 {
        Ok(None)
    } else {
        Ok(Some((
            u32::from(hour_byte & !TIME_NOT_NULL),
            u32::from(minute),
            u32::from(millis_of_minute / 1000),
            u32::from(millis_of_minute % 1000),
        )))
    }
}

// Julian day number of the given calendar date; dates from 1582-10-15 on are
// interpreted in the Gregorian calendar, earlier ones in the Julian calendar.
// Inverse of the conversion used by DayDate::as_ymd.
#[allow(clippy::cast_possible_truncation)]
fn julian_day_number(year: i32, month: u32, day: u32) -> i32 {
    let year = if year < 0 { year + 1 } else { year };
    let (jy, jm) = if month > 2 {
        (year, month + 1)
    } else {
        (year - 1, month + 13)
    };
    let mut jdn = (f64::from(jy) * 365.25).floor() as i32
        + (f64::from(jm) * 30.6001) as i32
        + i32::try_from(day).unwrap(/*OK*/)
        + 1_720_995;
    if (year, month, day) >= (1582, 10, 15) {
        let ja = (0.01 * f64::from(jy)) as i32;
        jdn += 2 - ja + (0.25 * f64::from(ja)) as i32;
    }
    jdn
}

#[cfg(test)]
mod test {
    use crate::types::{DayDate, LongDate, SecondTime};
    use crate::HdbValue;

    #[test]
    fn test_date_roundtrip() {
        for raw in [1_i32, 2, 400_000, 735_237, 800_000] {
            let mut buf = Vec::<u8>::new();
            super::emit_date(&DayDate::new(raw), &mut buf).unwrap();
            assert_eq!(buf.len(), super::DATE_SIZE);
            match super::parse_date(false, &mut std::io::Cursor::new(buf)).unwrap() {
                HdbValue::DAYDATE(dd) => assert_eq!(*dd.ref_raw(), raw),
                v => panic!("unexpected value {v:?}"),
            }
        }
    }

    #[test]
    fn test_date_null() {
        let buf = vec![0_u8; 4];
        assert!(super::parse_date(true, &mut std::io::Cursor::new(buf))
            .unwrap()
            .is_null());
    }

    #[test]
    fn test_time_roundtrip() {
        for raw in [0_i32, 1, 2, 3_601, 86_399] {
            let mut buf = Vec::<u8>::new();
            super::emit_time(&SecondTime::new(raw), &mut buf).unwrap();
            assert_eq!(buf.len(), super::TIME_SIZE);
            match super::parse_time(false, &mut std::io::Cursor::new(buf)).unwrap() {
                // 0 (empty) and 1 both render as 00:00:00 and come back as 1
                HdbValue::SECONDTIME(st) => assert_eq!(*st.ref_raw(), raw.max(1) as u32),
                v => panic!("unexpected value {v:?}"),
            }
        }
    }

    #[test]
    fn test_timestamp_roundtrip() {
        // second-precision ticks round-trip; sub-millisecond ticks get cut
        for raw in [1_i64, 864_000_000_001, 63_524_435_696 * 10_000_000 + 1] {
            let mut buf = Vec::<u8>::new();
            super::emit_timestamp(&LongDate::new(raw), &mut buf).unwrap();
            assert_eq!(buf.len(), super::TIMESTAMP_SIZE);
            match super::parse_timestamp(false, &mut std::io::Cursor::new(buf)).unwrap() {
                HdbValue::LONGDATE(ld) => assert_eq!(*ld.ref_raw(), raw),
                v => panic!("unexpected value {v:?}"),
            }
        }
    }
}
