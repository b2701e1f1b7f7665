use crate::{impl_err, HdbResult};

/// ID of the value type of a database column or a parameter.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeId {
    /// For database type TINYINT.
    TINYINT = 1,
    /// For database type SMALLINT.
    SMALLINT = 2,
    /// For database type INT.
    INT = 3,
    /// For database type BIGINT.
    BIGINT = 4,
    /// For database type DECIMAL and SMALLDECIMAL.
    DECIMAL = 5,
    /// For database type REAL.
    REAL = 6,
    /// For database type DOUBLE.
    DOUBLE = 7,
    /// For database type CHAR.
    CHAR = 8,
    /// For database type VARCHAR.
    VARCHAR = 9,
    /// For database type NCHAR.
    NCHAR = 10,
    /// For database type NVARCHAR.
    NVARCHAR = 11,
    /// For database type BINARY.
    BINARY = 12,
    /// For database type VARBINARY.
    VARBINARY = 13,
    /// Legacy wire format for DATE, only used with data format version 1.
    DATE = 14,
    /// Legacy wire format for TIME, only used with data format version 1.
    TIME = 15,
    /// Legacy wire format for TIMESTAMP, only used with data format version 1.
    TIMESTAMP = 16,
    /// For database type CLOB.
    CLOB = 25,
    /// For database type NCLOB.
    NCLOB = 26,
    /// For database type BLOB.
    BLOB = 27,
    /// For database type BOOLEAN.
    BOOLEAN = 28,
    /// For database type STRING.
    STRING = 29,
    /// For database type NSTRING.
    NSTRING = 30,
    /// A BLOB locator.
    BLOCATOR = 31,
    /// For binary strings.
    BSTRING = 33,
    /// For database type TEXT.
    TEXT = 51,
    /// For database type SHORTTEXT.
    SHORTTEXT = 52,
    /// For database type BINTEXT.
    BINTEXT = 53,
    /// For database type ALPHANUM.
    ALPHANUM = 55,
    /// For database type LONGDATE.
    LONGDATE = 61,
    /// For database type SECONDDATE.
    SECONDDATE = 62,
    /// For database type DAYDATE.
    DAYDATE = 63,
    /// For database type SECONDTIME.
    SECONDTIME = 64,
    /// For database type GEOMETRY.
    GEOMETRY = 74,
    /// For database type POINT.
    POINT = 75,
    /// Transport format for database type DECIMAL with 16 bytes.
    FIXED16 = 76,
    /// Transport format for database type DECIMAL with 8 bytes.
    FIXED8 = 81,
    /// Transport format for database type DECIMAL with 12 bytes.
    FIXED12 = 82,
}

impl TypeId {
    pub(crate) fn try_new(id: u8) -> HdbResult<Self> {
        Ok(match id {
            1 => Self::TINYINT,
            2 => Self::SMALLINT,
            3 => Self::INT,
            4 => Self::BIGINT,
            5 => Self::DECIMAL,
            6 => Self::REAL,
            7 => Self::DOUBLE,
            8 => Self::CHAR,
            9 => Self::VARCHAR,
            10 => Self::NCHAR,
            11 => Self::NVARCHAR,
            12 => Self::BINARY,
            13 => Self::VARBINARY,
            // DATE, TIME, TIMESTAMP (14-16) are deprecated with protocol
            // version 3 but still used with data format version 1
            14 => Self::DATE,
            15 => Self::TIME,
            16 => Self::TIMESTAMP,
            // 17 - 24: reserved, do not use
            25 => Self::CLOB,
            26 => Self::NCLOB,
            27 => Self::BLOB,
            28 => Self::BOOLEAN,
            29 => Self::STRING,
            30 => Self::NSTRING,
            31 => Self::BLOCATOR,
            // 32 (NLOCATOR) is not sent to clients
            33 => Self::BSTRING,
            // 34 - 46: not documented or unused
            // 47 (SMALLDECIMAL) is not used on the client side
            51 => Self::TEXT,
            52 => Self::SHORTTEXT,
            53 => Self::BINTEXT,
            55 => Self::ALPHANUM,
            61 => Self::LONGDATE,
            62 => Self::SECONDDATE,
            63 => Self::DAYDATE,
            64 => Self::SECONDTIME,
            // 65 - 73: reserved, do not use
            74 => Self::GEOMETRY,
            75 => Self::POINT,
            76 => Self::FIXED16,
            81 => Self::FIXED8,
            82 => Self::FIXED12,
            tc => return Err(impl_err!("illegal type code {tc}")),
        })
    }

    // The wire uses ids < 128 for non-nullable values and ids > 128 for
    // nullable values.
    pub(crate) fn type_code(self, nullable: bool) -> u8 {
        (if nullable { 128 } else { 0 }) + self as u8
    }

    pub(crate) fn matches_value_type(self, value_type: Self) -> HdbResult<()> {
        if value_type == self {
            return Ok(());
        }
        // from-to conversions the server accepts
        match (value_type, self) {
            (Self::BOOLEAN, Self::TINYINT | Self::SMALLINT | Self::INT | Self::BIGINT) => {
                return Ok(())
            }

            // no clear strategy for the GEO types yet, so be restrictive
            (Self::STRING, Self::GEOMETRY | Self::POINT) => {}
            // allow everything else for STRING
            (Self::STRING, _) => return Ok(()),

            (
                Self::BINARY,
                Self::BLOB | Self::BLOCATOR | Self::VARBINARY | Self::GEOMETRY | Self::POINT,
            )
            | (Self::DECIMAL, Self::FIXED8 | Self::FIXED12 | Self::FIXED16) => return Ok(()),

            _ => {}
        }

        Err(impl_err!(
            "value type id {value_type:?} does not match metadata {self:?}"
        ))
    }

    /// True for the LOB types (BLOB, CLOB, NCLOB, TEXT, BINTEXT).
    pub fn is_lob(self) -> bool {
        matches!(
            self,
            Self::BLOB | Self::CLOB | Self::NCLOB | Self::TEXT | Self::BINTEXT
        )
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{self:?}")
    }
}

#[cfg(test)]
mod test {
    use super::TypeId;

    #[test]
    fn test_type_code_nullability() {
        assert_eq!(TypeId::INT.type_code(false), 3);
        assert_eq!(TypeId::INT.type_code(true), 131);
        assert_eq!(TypeId::FIXED12.type_code(true), 210);
    }

    #[test]
    fn test_from_wire_roundtrip() {
        for id in [1_u8, 5, 14, 16, 26, 29, 55, 63, 74, 76, 81, 82] {
            assert_eq!(TypeId::try_new(id).unwrap() as u8, id);
        }
        assert!(TypeId::try_new(17).is_err());
        assert!(TypeId::try_new(90).is_err());
    }
}
