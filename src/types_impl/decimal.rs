use crate::{
    types_impl::wire_decimal::{big_decimal_to_wire_decimal, wire_decimal_to_hdbvalue},
    HdbError, HdbResult, HdbValue, TypeId,
};
use bigdecimal::BigDecimal;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use num::{FromPrimitive, ToPrimitive};
use num_bigint::BigInt;

// Decimals travel in four wire forms, selected by the field's
// (precision, scale) and the data format version: the variable-length
// DECIMAL form, and three fixed-width forms with an implicit base-10 scale.
pub(crate) fn parse(
    nullable: bool,
    type_id: TypeId,
    scale: i16,
    rdr: &mut dyn std::io::Read,
) -> HdbResult<HdbValue<'static>> {
    match type_id {
        TypeId::DECIMAL => {
            trace!("parse DECIMAL");
            let mut raw = [0_u8; 16];
            rdr.read_exact(&mut raw[..])?;
            wire_decimal_to_hdbvalue(raw, nullable, scale)
        }

        TypeId::FIXED8 => Ok({
            trace!("parse FIXED8");
            if parse_null(nullable, rdr)? {
                HdbValue::NULL
            } else {
                let i = rdr.read_i64::<LittleEndian>()?;
                let bigint = BigInt::from_i64(i)
                    .ok_or_else(|| HdbError::Impl("invalid value of type FIXED8"))?;
                let bd = BigDecimal::new(bigint, i64::from(scale));
                HdbValue::DECIMAL(bd)
            }
        }),

        TypeId::FIXED12 => Ok({
            trace!("parse FIXED12");
            if parse_null(nullable, rdr)? {
                HdbValue::NULL
            } else {
                let bytes = crate::protocol::util_sync::parse_bytes(12, rdr)?;
                let bigint = BigInt::from_signed_bytes_le(&bytes);
                let bd = BigDecimal::new(bigint, i64::from(scale));
                HdbValue::DECIMAL(bd)
            }
        }),

        TypeId::FIXED16 => Ok({
            trace!("parse FIXED16");
            if parse_null(nullable, rdr)? {
                HdbValue::NULL
            } else {
                let i = rdr.read_i128::<LittleEndian>()?;
                let bi = BigInt::from_i128(i)
                    .ok_or_else(|| HdbError::Impl("invalid value of type FIXED16"))?;
                let bd = BigDecimal::new(bi, i64::from(scale));
                HdbValue::DECIMAL(bd)
            }
        }),
        _ => Err(HdbError::Impl("unexpected type id for decimal")),
    }
}

fn parse_null(nullable: bool, rdr: &mut dyn std::io::Read) -> HdbResult<bool> {
    let is_null = rdr.read_u8()? == 0;
    if is_null && !nullable {
        Err(HdbError::Impl("found null value for not-null column"))
    } else {
        Ok(is_null)
    }
}

// The value must fit into the wire form; range violations fail here,
// before anything is written.
pub(crate) fn emit(
    big_decimal: &BigDecimal,
    type_id: TypeId,
    scale: i16,
    w: &mut dyn std::io::Write,
) -> HdbResult<()> {
    match type_id {
        TypeId::DECIMAL => {
            trace!("emit DECIMAL");
            let raw = big_decimal_to_wire_decimal(big_decimal)?;
            w.write_all(&raw)?;
        }
        TypeId::FIXED8 => {
            trace!("emit FIXED8");
            let bd = big_decimal.with_scale(i64::from(scale));
            let (bigint, _exponent) = bd.as_bigint_and_exponent();
            w.write_i64::<LittleEndian>(bigint.to_i64().ok_or_else(|| {
                HdbError::UsageDetailed(format!("decimal {big_decimal} exceeds FIXED8 range"))
            })?)?;
        }
        TypeId::FIXED12 => {
            trace!("emit FIXED12");
            let bd = big_decimal.with_scale(i64::from(scale));
            let (bigint, _exponent) = bd.as_bigint_and_exponent();
            let mut bytes = bigint.to_signed_bytes_le();
            let l = bytes.len();
            if l > 12 {
                return Err(HdbError::UsageDetailed(format!(
                    "decimal {big_decimal} exceeds FIXED12 range"
                )));
            }
            // sign-extend to 12 bytes
            if l < 12 {
                let filler = if bytes[l - 1] & 0b_1000_0000_u8 == 0 {
                    0_u8
                } else {
                    255_u8
                };
                bytes.resize(12, filler);
            }
            w.write_all(&bytes)?;
        }
        TypeId::FIXED16 => {
            trace!("emit FIXED16");
            let bd = big_decimal.with_scale(i64::from(scale));
            let (bigint, _exponent) = bd.as_bigint_and_exponent();
            w.write_i128::<LittleEndian>(bigint.to_i128().ok_or_else(|| {
                HdbError::UsageDetailed(format!("decimal {big_decimal} exceeds FIXED16 range"))
            })?)?;
        }
        _ => return Err(HdbError::Impl("unexpected type id for decimal")),
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::{emit, parse};
    use crate::{HdbValue, TypeId};
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn roundtrip(input: &str, type_id: TypeId, scale: i16) {
        let bigdec = BigDecimal::from_str(input).unwrap();
        let mut buf = Vec::<u8>::new();
        emit(&bigdec, type_id, scale, &mut buf).unwrap();

        // fixed forms carry a null indicator on the wire that emit() does not
        // write (it is part of the type code handling); prepend it here
        let wire = if matches!(type_id, TypeId::DECIMAL) {
            buf
        } else {
            let mut wire = vec![1_u8];
            wire.extend_from_slice(&buf);
            wire
        };
        match parse(false, type_id, scale, &mut std::io::Cursor::new(wire)).unwrap() {
            HdbValue::DECIMAL(bigdec2) => {
                assert_eq!(bigdec.with_scale(i64::from(scale)), bigdec2);
            }
            v => panic!("unexpected value {v:?}"),
        }
    }

    #[test]
    fn test_fixed_roundtrips() {
        roundtrip("0", TypeId::FIXED8, 0);
        roundtrip("1234.5678", TypeId::FIXED8, 4);
        roundtrip("-1234.5678", TypeId::FIXED8, 4);
        roundtrip("123456789012345678901.5678", TypeId::FIXED12, 4);
        roundtrip("-1234567890123456789012345678.123456", TypeId::FIXED16, 6);
    }

    #[test]
    fn test_range_check_fails_before_write() {
        let too_big = BigDecimal::from_str("123456789012345678901234567890").unwrap();
        let mut buf = Vec::<u8>::new();
        assert!(emit(&too_big, TypeId::FIXED8, 0, &mut buf).is_err());
        assert!(buf.is_empty());
    }
}
