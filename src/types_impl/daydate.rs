use crate::{protocol::FieldTypeContext, HdbError, HdbResult, HdbValue};
use byteorder::{LittleEndian, ReadBytesExt};

const NULL_REPRESENTATION: i32 = 3_652_062;

const ZEITENWENDE: i32 = 1_721_424;
const JGREG: i32 = 2_299_161;

/// Implementation of HANA's `DayDate`.
///
/// The type is used internally to implement serialization to the wire.
/// It is agnostic of timezones.
///
/// The raw value is a day count since `0001-01-01` plus one; the special
/// value 0 represents HANA's "empty date" (`''`, `0000-00-00`), which sorts
/// one day before the begin of the calendar.
#[derive(Clone, Debug)]
pub struct DayDate(i32);

impl std::fmt::Display for DayDate {
    // The format chosen supports the conversion to chrono types.
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (year, month, day) = self.as_ymd();
        write!(fmt, "{year:04}-{month:02}-{day:02}")
    }
}

impl std::cmp::PartialEq<DayDate> for DayDate {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl DayDate {
    pub(crate) fn new(raw: i32) -> Self {
        assert!((0..NULL_REPRESENTATION).contains(&raw));
        Self(raw)
    }
    pub(crate) fn ref_raw(&self) -> &i32 {
        &self.0
    }

    /// True for HANA's "empty date" (`0000-00-00`).
    pub fn is_empty_date(&self) -> bool {
        self.0 == 0
    }

    // Convert into tuple of "elements".
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    pub(crate) fn as_ymd(&self) -> (i32, u32, u32) {
        let datevalue = match self.0 {
            0 => 0, // maps the special value '' == 0 to '0001-01-01' = 1
            v => v - 1,
        };

        let julian: i32 = datevalue + ZEITENWENDE;
        let ja: i32 = if julian >= JGREG {
            let jalpha: i32 = ((f64::from(julian - 1_867_216) - 0.25_f64) / 36_524.25_f64) as i32;
            julian + 1 + jalpha - ((0.25_f64 * f64::from(jalpha)) as i32)
        } else {
            julian
        };

        let jb: i32 = ja + 1524;
        let jc: i32 = (6680_f64 + (f64::from(jb - 2_439_870) - 122.1_f64) / 365.25_f64) as i32;
        let jd: i32 = (f64::from(365 * jc) + (0.25_f64 * f64::from(jc))) as i32;
        let je: i32 = (f64::from(jb - jd) / 30.6001) as i32;

        let day: u32 = (jb - jd - ((30.6001 * f64::from(je)) as i32)) as u32;
        let mut month: u32 = je as u32 - 1;
        let mut year: i32 = jc - 4715;

        if month > 12 {
            month -= 12;
        }
        if month > 2 {
            year -= 1;
        }
        if year <= 0 {
            year -= 1;
        }
        (year, month, day)
    }
}

pub(crate) fn parse_daydate(
    nullable: bool,
    ctx: FieldTypeContext,
    rdr: &mut dyn std::io::Read,
) -> HdbResult<HdbValue<'static>> {
    let i = rdr.read_i32::<LittleEndian>()?;
    if i == NULL_REPRESENTATION || (i == 0 && ctx.emptydate_as_null) {
        if nullable {
            Ok(HdbValue::NULL)
        } else if i == 0 {
            // the column cannot be null, so hand out the empty date as-is
            Ok(HdbValue::DAYDATE(DayDate::new(0)))
        } else {
            Err(HdbError::Impl(
                "found NULL value for NOT NULL DAYDATE column",
            ))
        }
    } else {
        Ok(HdbValue::DAYDATE(DayDate::new(i)))
    }
}

#[cfg(test)]
mod test {
    use super::{parse_daydate, DayDate};
    use crate::protocol::FieldTypeContext;
    use crate::HdbValue;
    use byteorder::{LittleEndian, WriteBytesExt};

    #[test]
    fn test_ymd() {
        assert_eq!(DayDate::new(1).as_ymd(), (1, 1, 1));
        assert_eq!(format!("{}", DayDate::new(735_237)), "2014-01-02");
    }

    #[test]
    fn test_empty_date_policy() {
        let mut buf = Vec::<u8>::new();
        buf.write_i32::<LittleEndian>(0).unwrap();

        let ctx = FieldTypeContext::default();
        let value = parse_daydate(true, ctx, &mut std::io::Cursor::new(&buf)).unwrap();
        assert!(matches!(value, HdbValue::DAYDATE(ref dd) if dd.is_empty_date()));

        let ctx = FieldTypeContext {
            emptydate_as_null: true,
            ..FieldTypeContext::default()
        };
        let value = parse_daydate(true, ctx, &mut std::io::Cursor::new(&buf)).unwrap();
        assert!(value.is_null());
    }
}
