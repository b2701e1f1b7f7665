use crate::{impl_err, HdbError, HdbResult, HdbValue};
use bigdecimal::{BigDecimal, Zero};
use byteorder::{ByteOrder, LittleEndian};
use num_bigint::{BigInt, Sign};

// The variable "wire decimal" is the transport representation of HANA's
// DECIMAL type that is independent of the field's (precision, scale):
//
// MANTISSA     113-bit     Integer mantissa
//                          (byte 0; byte 14, lowest bit)
// EXPONENT      14-bit     Exponent, biased with 6176, range -6143 to +6144
//                          (byte 14, above lowest bit; byte 15, below highest bit)
// SIGN           1-bit     0 is positive, 1 is negative (byte 15, highest bit)
//
// The represented number is (10^EXPONENT)*MANTISSA.
// The MANTISSA is expected not to be a multiple of 10.

pub(crate) fn wire_decimal_to_hdbvalue(
    mut raw: [u8; 16],
    nullable: bool,
    scale: i16,
) -> HdbResult<HdbValue<'static>> {
    if raw[15] == 112 && raw[0..=14].iter().all(|el| *el == 0) {
        // it's a NULL
        if nullable {
            Ok(HdbValue::NULL)
        } else {
            Err(impl_err!("received null value for not-null column"))
        }
    } else {
        let is_negative = (raw[15] & 0b_1000_0000_u8) != 0;
        raw[15] &= 0b_0111_1111_u8;
        let exponent = i64::from(LittleEndian::read_u16(&raw[14..=15]) >> 1) - 6176;
        raw[14] &= 0b_0000_0001_u8;
        let mantissa = BigInt::from_bytes_le(Sign::Plus, &raw[0..=14]);

        let mut big_decimal = if is_negative {
            -BigDecimal::new(mantissa, -exponent)
        } else {
            BigDecimal::new(mantissa, -exponent)
        };

        if scale < i16::MAX {
            big_decimal = big_decimal.with_scale(i64::from(scale));
        }
        Ok(HdbValue::DECIMAL(big_decimal))
    }
}

// Creates the DECIMAL wire format from a BigDecimal.
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
pub(crate) fn big_decimal_to_wire_decimal(bigdecimal: &BigDecimal) -> HdbResult<[u8; 16]> {
    let ten = BigInt::from(10_u8);
    let (sign, mantissa, exponent) = {
        let (mut bigint, neg_exponent) = bigdecimal.as_bigint_and_exponent();
        let mut exponent = -neg_exponent;

        // HANA does not like mantissas that are multiples of 10
        while !bigint.is_zero() && (&bigint % &ten).is_zero() {
            bigint /= 10;
            exponent += 1;
        }

        // HANA accepts only mantissas up to 113 bits, so we round if necessary
        loop {
            let (_, mantissa) = bigint.to_bytes_le();
            let l = mantissa.len();
            if (l > 15) || ((l == 15) && (mantissa[14] & 0b1111_1110) != 0) {
                bigint /= 10;
                exponent += 1;
            } else {
                break;
            }
        }

        if !(-6143..=6144).contains(&exponent) {
            return Err(HdbError::UsageDetailed(format!(
                "exponent '{exponent}' out of range for DECIMAL"
            )));
        }
        let (sign, mantissa) = bigint.to_bytes_le();
        (sign, mantissa, exponent)
    };

    let mut raw = [0_u8; 16];
    mantissa.iter().enumerate().for_each(|(i, b)| raw[i] = *b);

    let biased_exponent: u16 = (exponent + 6176) as u16; // bounds are checked above
    LittleEndian::write_u16(&mut raw[14..=15], biased_exponent * 2);

    if let Sign::Minus = sign {
        raw[15] |= 0b_1000_0000_u8;
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::{big_decimal_to_wire_decimal, wire_decimal_to_hdbvalue};
    use crate::HdbValue;
    use bigdecimal::BigDecimal;
    use byteorder::{ByteOrder, LittleEndian};
    use num::bigint::BigInt;
    use std::str::FromStr;

    #[test]
    fn test_roundtrips() {
        flexi_logger::Logger::try_with_str("info")
            .unwrap()
            .start()
            .ok();

        for input in [
            "1234.56780000",
            "1234.5678",
            "-1234.5678",
            "123456789",
            "123456789.0000",
            "0.1234567890000",
            "0.000000000000000000000000000000000000000000000000000001234567890000",
            "-123456789",
            "-123456789.0000",
            "-0.1234567890000",
            "-0.000000000000000000000000000000000000000000000000000001234567890000",
            "123456789123456789",
            "1234567890012345678900000",
            "1234567890000000000000000123456789",
        ] {
            big_2_wire_2_big(&BigDecimal::from_str(input).unwrap());
        }

        for (mantissa, exponent) in [
            ("0", 0_i64),
            ("1234567890", -5),
            ("1234567890000", -8),
            ("123456789012345678901234567890", 0),
            ("1234567890123456789012345678901234", 3),
        ] {
            big_2_wire_2_big(&BigDecimal::new(
                BigInt::from_str(mantissa).unwrap(),
                -exponent,
            ));
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn big_2_wire_2_big(bigdec: &BigDecimal) {
        let raw = big_decimal_to_wire_decimal(bigdec).unwrap();
        let exponent = i64::from(LittleEndian::read_u16(&[raw[14], raw[15] & 0x7F]) >> 1) - 6176;
        match wire_decimal_to_hdbvalue(raw, false, -exponent as i16).unwrap() {
            HdbValue::DECIMAL(bigdec2) => assert_eq!(*bigdec, bigdec2, "start != end"),
            v => panic!("unexpected value {v:?}"),
        }
    }

    #[test]
    fn test_exponent_out_of_range() {
        let huge = BigDecimal::new(BigInt::from(1), -7000);
        assert!(big_decimal_to_wire_decimal(&huge).is_err());
    }

    #[test]
    fn test_null_representation() {
        let mut raw = [0_u8; 16];
        raw[15] = 112;
        assert!(wire_decimal_to_hdbvalue(raw, true, 0).unwrap().is_null());
        assert!(wire_decimal_to_hdbvalue(raw, false, 0).is_err());
    }
}
