use crate::{
    base::{RsCore, OAM},
    conn::AmConnCore,
    impl_err,
    protocol::{
        parts::{length_indicator, ParameterDescriptor, TypeId},
        util, util_sync, FieldTypeContext,
    },
    types::{DayDate, LongDate, SecondDate, SecondTime},
    types_impl::{
        daydate::parse_daydate, decimal, legacy_datetime, lob, longdate::parse_longdate,
        seconddate::parse_seconddate, secondtime::parse_secondtime,
    },
    usage_err, HdbResult,
};
use bigdecimal::BigDecimal;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

const ALPHANUM_PURELY_NUMERIC: u8 = 0b_1000_0000_u8;
const ALPHANUM_LENGTH_MASK: u8 = 0b_0111_1111_u8;

/// Enum for all supported database value types.
#[allow(non_camel_case_types)]
pub enum HdbValue<'a> {
    /// Representation of a database NULL value.
    NULL,
    /// Stores an 8-bit unsigned integer.
    TINYINT(u8),
    /// Stores a 16-bit signed integer.
    SMALLINT(i16),
    /// Stores a 32-bit signed integer.
    INT(i32),
    /// Stores a 64-bit signed integer.
    BIGINT(i64),

    /// Representation for fixed-point decimal values.
    DECIMAL(BigDecimal),

    /// Stores a single-precision 32-bit floating-point number.
    REAL(f32),
    /// Stores a double-precision 64-bit floating-point number.
    DOUBLE(f64),
    /// Stores binary data.
    BINARY(Vec<u8>),

    /// Stores a large ASCII character string.
    CLOB(crate::types::CLob),
    /// Stores a large Unicode string.
    NCLOB(crate::types::NCLob),
    /// Stores a large binary string.
    BLOB(crate::types::BLob),

    /// Used for streaming LOBs to the database (see
    /// [`PreparedStatement::execute_row()`](crate::PreparedStatement::execute_row)).
    LOBSTREAM(Option<std::sync::Arc<std::sync::Mutex<dyn std::io::Read + Send>>>),

    /// BOOLEAN stores boolean values, which are TRUE or FALSE.
    BOOLEAN(bool),

    /// The database returns all valid character strings as type STRING,
    /// independent of the concrete column type.
    STRING(String),

    /// In rare cases, when the database sends invalid CESU-8, we fall back to
    /// this type (only if the connection is configured to fail on invalid
    /// CESU-8, which is the default).
    DBSTRING(Vec<u8>),

    /// Can be used to avoid cloning when sending large Strings to the database.
    STR(&'a str),

    /// Timestamp with 10^-7 seconds precision, uses eight bytes.
    LONGDATE(LongDate),
    /// TIMESTAMP with second precision.
    SECONDDATE(SecondDate),
    /// DATE with day precision.
    DAYDATE(DayDate),
    /// TIME with second precision.
    SECONDTIME(SecondTime),

    /// Spatial type GEOMETRY, transported as EWKB.
    GEOMETRY(Vec<u8>),
    /// Spatial type POINT, transported as EWKB.
    POINT(Vec<u8>),
}

impl<'a> HdbValue<'a> {
    pub(crate) fn type_id_for_emit(&self, requested_type_id: TypeId) -> HdbResult<TypeId> {
        Ok(match *self {
            HdbValue::NULL => match requested_type_id {
                // work around a bug in HANA: it doesn't accept NULL SECONDTIME values
                TypeId::SECONDTIME => TypeId::SECONDDATE,
                tid => tid,
            },

            HdbValue::TINYINT(_) => TypeId::TINYINT,
            HdbValue::SMALLINT(_) => TypeId::SMALLINT,
            HdbValue::INT(_) => TypeId::INT,
            HdbValue::BIGINT(_) => TypeId::BIGINT,
            HdbValue::DECIMAL(_) => match requested_type_id {
                TypeId::FIXED8 | TypeId::FIXED12 | TypeId::FIXED16 | TypeId::DECIMAL => {
                    requested_type_id
                }
                _ => {
                    return Err(impl_err!(
                        "can't send DECIMAL for requested type {requested_type_id:?}"
                    ));
                }
            },
            HdbValue::REAL(_) => TypeId::REAL,
            HdbValue::DOUBLE(_) => TypeId::DOUBLE,
            HdbValue::BOOLEAN(_) => TypeId::BOOLEAN,
            HdbValue::STR(_) | HdbValue::STRING(_) => TypeId::STRING,
            HdbValue::LONGDATE(_) => match requested_type_id {
                TypeId::TIMESTAMP => TypeId::TIMESTAMP,
                _ => TypeId::LONGDATE,
            },
            HdbValue::SECONDDATE(_) => TypeId::SECONDDATE,
            HdbValue::DAYDATE(_) => match requested_type_id {
                TypeId::DATE => TypeId::DATE,
                _ => TypeId::DAYDATE,
            },
            HdbValue::SECONDTIME(_) => match requested_type_id {
                TypeId::TIME => TypeId::TIME,
                _ => TypeId::SECONDTIME,
            },
            HdbValue::BLOB(_) | HdbValue::CLOB(_) | HdbValue::NCLOB(_) | HdbValue::LOBSTREAM(_) => {
                requested_type_id
            }
            HdbValue::GEOMETRY(_) | // TypeId::GEOMETRY,
            HdbValue::POINT(_) |    // TypeId::POINT,
            HdbValue::BINARY(_) => TypeId::BINARY,
            HdbValue::DBSTRING(_) => {
                return Err(usage_err!("DBSTRING values cannot be sent to the database"))
            }
        })
    }

    /// Returns true if the value is a NULL value.
    pub fn is_null(&self) -> bool {
        matches!(*self, HdbValue::NULL)
    }

    // True for LOB values that are sent to the database in chunks, after the
    // execute roundtrip.
    pub(crate) fn is_lob_stream(&self) -> bool {
        matches!(*self, HdbValue::LOBSTREAM(Some(_)))
    }

    pub(crate) fn emit(
        &self,
        data_pos: &mut i32,
        descriptor: &ParameterDescriptor,
        ctx: FieldTypeContext,
        w: &mut dyn std::io::Write,
    ) -> HdbResult<()> {
        if !self.emit_type_id(descriptor.type_id(), w)? {
            match *self {
                HdbValue::NULL => {}
                HdbValue::TINYINT(u) => w.write_u8(u)?,
                HdbValue::SMALLINT(i) => w.write_i16::<LittleEndian>(i)?,
                HdbValue::INT(i) => w.write_i32::<LittleEndian>(i)?,
                HdbValue::BIGINT(i) => w.write_i64::<LittleEndian>(i)?,
                HdbValue::DECIMAL(ref bigdec) => {
                    decimal::emit(bigdec, descriptor.type_id(), descriptor.scale(), w)?;
                }
                HdbValue::REAL(f) => w.write_f32::<LittleEndian>(f)?,
                HdbValue::DOUBLE(f) => w.write_f64::<LittleEndian>(f)?,
                HdbValue::BOOLEAN(b) => emit_bool(b, ctx, w)?,
                HdbValue::LONGDATE(ref ld) => match descriptor.type_id() {
                    TypeId::TIMESTAMP => legacy_datetime::emit_timestamp(ld, w)?,
                    _ => w.write_i64::<LittleEndian>(*ld.ref_raw())?,
                },
                HdbValue::SECONDDATE(ref sd) => w.write_i64::<LittleEndian>(*sd.ref_raw())?,
                HdbValue::DAYDATE(ref dd) => match descriptor.type_id() {
                    TypeId::DATE => legacy_datetime::emit_date(dd, w)?,
                    _ => w.write_i32::<LittleEndian>(*dd.ref_raw())?,
                },
                HdbValue::SECONDTIME(ref st) => match descriptor.type_id() {
                    TypeId::TIME => legacy_datetime::emit_time(st, w)?,
                    _ => w.write_u32::<LittleEndian>(*st.ref_raw())?,
                },

                HdbValue::LOBSTREAM(None) => lob::emit_lob_header(0, data_pos, w)?,

                HdbValue::STR(s) => emit_length_and_string(s, w)?,
                HdbValue::STRING(ref s) => emit_length_and_string(s, w)?,
                HdbValue::BINARY(ref v) | HdbValue::GEOMETRY(ref v) | HdbValue::POINT(ref v) => {
                    emit_length_and_bytes(v, w)?;
                }
                _ => {
                    return Err(impl_err!("HdbValue::{self} cannot be sent to the database"));
                }
            }
        }
        Ok(())
    }

    // Emits the type-id byte; returns true if the value is a null value.
    fn emit_type_id(
        &self,
        requested_type_id: TypeId,
        w: &mut dyn std::io::Write,
    ) -> HdbResult<bool> {
        let is_null = self.is_null();
        let type_code = self.type_id_for_emit(requested_type_id)?.type_code(is_null);
        w.write_u8(type_code)?;
        Ok(is_null)
    }

    // Used to calculate the part size (in emit()).
    pub(crate) fn size(&self, type_id: TypeId) -> HdbResult<usize> {
        Ok(1 + match self {
            HdbValue::NULL => 0,
            HdbValue::BOOLEAN(_) | HdbValue::TINYINT(_) => 1,
            HdbValue::SMALLINT(_) => 2,
            HdbValue::DECIMAL(_) => match type_id {
                TypeId::FIXED8 => 8,
                TypeId::FIXED12 => 12,
                TypeId::FIXED16 | TypeId::DECIMAL => 16,
                tid => {
                    return Err(impl_err!("invalid TypeId {tid:?} for DECIMAL"));
                }
            },

            HdbValue::INT(_) | HdbValue::REAL(_) => 4,
            HdbValue::DAYDATE(_) => match type_id {
                TypeId::DATE => legacy_datetime::DATE_SIZE,
                _ => 4,
            },
            HdbValue::SECONDTIME(_) => match type_id {
                TypeId::TIME => legacy_datetime::TIME_SIZE,
                _ => 4,
            },

            HdbValue::BIGINT(_) | HdbValue::DOUBLE(_) | HdbValue::SECONDDATE(_) => 8,
            HdbValue::LONGDATE(_) => match type_id {
                TypeId::TIMESTAMP => legacy_datetime::TIMESTAMP_SIZE,
                _ => 8,
            },

            HdbValue::LOBSTREAM(None) => 9,

            HdbValue::STR(s) => binary_length(util::cesu8_length(s)),
            HdbValue::STRING(ref s) => binary_length(util::cesu8_length(s)),

            HdbValue::BINARY(ref v) | HdbValue::GEOMETRY(ref v) | HdbValue::POINT(ref v) => {
                binary_length(v.len())
            }

            HdbValue::BLOB(_)
            | HdbValue::CLOB(_)
            | HdbValue::NCLOB(_)
            | HdbValue::LOBSTREAM(Some(_)) => {
                return Err(impl_err!("size(): can't send {self:?} directly to the database"));
            }

            HdbValue::DBSTRING(_) => {
                return Err(usage_err!("DBSTRING values cannot be sent to the database"));
            }
        })
    }
}

impl HdbValue<'static> {
    /// Convert into [`BLob`](crate::types::BLob).
    pub fn try_into_blob(self) -> HdbResult<crate::types::BLob> {
        match self {
            HdbValue::BLOB(blob) => Ok(blob),
            v => Err(usage_err!("the value {v:?} cannot be converted into a BLOB")),
        }
    }

    /// Convert into [`CLob`](crate::types::CLob).
    pub fn try_into_clob(self) -> HdbResult<crate::types::CLob> {
        match self {
            HdbValue::CLOB(clob) => Ok(clob),
            v => Err(usage_err!("the value {v:?} cannot be converted into a CLOB")),
        }
    }

    /// Convert into [`NCLob`](crate::types::NCLob).
    pub fn try_into_nclob(self) -> HdbResult<crate::types::NCLob> {
        match self {
            HdbValue::NCLOB(nclob) => Ok(nclob),
            v => Err(usage_err!(
                "the database value {v:?} cannot be converted into a NCLob"
            )),
        }
    }

    #[allow(clippy::ref_option)]
    pub(crate) fn parse(
        type_id: TypeId,
        scale: i16,
        nullable: bool,
        ctx: FieldTypeContext,
        am_conn_core: &AmConnCore,
        o_am_rscore: &OAM<RsCore>,
        rdr: &mut dyn std::io::Read,
    ) -> HdbResult<HdbValue<'static>> {
        let t = type_id;
        match t {
            TypeId::TINYINT => parse_tinyint(nullable, rdr),
            TypeId::SMALLINT => parse_smallint(nullable, rdr),
            TypeId::INT => parse_int(nullable, rdr),
            TypeId::BIGINT => parse_bigint(nullable, rdr),
            TypeId::REAL => parse_real(nullable, rdr),
            TypeId::DOUBLE => parse_double(nullable, rdr),

            TypeId::BOOLEAN => parse_bool(nullable, ctx, rdr),

            TypeId::DECIMAL | TypeId::FIXED8 | TypeId::FIXED12 | TypeId::FIXED16 => {
                decimal::parse(nullable, t, scale, rdr)
            }

            TypeId::CHAR
            | TypeId::VARCHAR
            | TypeId::NCHAR
            | TypeId::NVARCHAR
            | TypeId::STRING
            | TypeId::NSTRING
            | TypeId::SHORTTEXT => parse_string(nullable, t, ctx, rdr),

            TypeId::ALPHANUM => parse_alphanum(nullable, rdr),

            TypeId::BINARY
            | TypeId::VARBINARY
            | TypeId::BSTRING
            | TypeId::GEOMETRY
            | TypeId::POINT => parse_binary(nullable, t, rdr),

            TypeId::BLOCATOR => Err(crate::HdbError::Impl("parsing BLOCATOR not implemented")),
            TypeId::BLOB | TypeId::BINTEXT => {
                lob::parse_blob(am_conn_core, o_am_rscore, nullable, rdr)
            }
            TypeId::CLOB => lob::parse_clob(am_conn_core, o_am_rscore, nullable, rdr),
            TypeId::NCLOB | TypeId::TEXT => {
                lob::parse_nclob(am_conn_core, o_am_rscore, nullable, t, rdr)
            }

            TypeId::LONGDATE => parse_longdate(nullable, rdr),
            TypeId::SECONDDATE => parse_seconddate(nullable, rdr),
            TypeId::DAYDATE => parse_daydate(nullable, ctx, rdr),
            TypeId::SECONDTIME => parse_secondtime(nullable, rdr),

            // fixed legacy forms, only sent with data format version 1
            TypeId::DATE => legacy_datetime::parse_date(nullable, rdr),
            TypeId::TIME => legacy_datetime::parse_time(nullable, rdr),
            TypeId::TIMESTAMP => legacy_datetime::parse_timestamp(nullable, rdr),
        }
    }
}

fn emit_bool(b: bool, ctx: FieldTypeContext, w: &mut dyn std::io::Write) -> HdbResult<()> {
    if ctx.has_tristate_boolean() {
        // 0x00 = FALSE, 0x01 = NULL, 0x02 = TRUE
        w.write_u8(2 * u8::from(b))?;
    } else {
        w.write_u8(u8::from(b))?;
    }
    Ok(())
}

// Reads the NULL indicator and
// - returns Ok(true) if the value is NULL
// - returns Ok(false) if a normal value is to be expected
// - throws an error if NULL is found but nullable is false
fn parse_null(nullable: bool, rdr: &mut dyn std::io::Read) -> HdbResult<bool> {
    let is_null = rdr.read_u8()? == 0;
    if is_null && !nullable {
        Err(crate::HdbError::Impl("found null value for not-null column"))
    } else {
        Ok(is_null)
    }
}

fn parse_tinyint(nullable: bool, rdr: &mut dyn std::io::Read) -> HdbResult<HdbValue<'static>> {
    Ok(if parse_null(nullable, rdr)? {
        HdbValue::NULL
    } else {
        HdbValue::TINYINT(rdr.read_u8()?)
    })
}

fn parse_smallint(nullable: bool, rdr: &mut dyn std::io::Read) -> HdbResult<HdbValue<'static>> {
    Ok(if parse_null(nullable, rdr)? {
        HdbValue::NULL
    } else {
        HdbValue::SMALLINT(rdr.read_i16::<LittleEndian>()?)
    })
}

fn parse_int(nullable: bool, rdr: &mut dyn std::io::Read) -> HdbResult<HdbValue<'static>> {
    Ok(if parse_null(nullable, rdr)? {
        HdbValue::NULL
    } else {
        HdbValue::INT(rdr.read_i32::<LittleEndian>()?)
    })
}

fn parse_bigint(nullable: bool, rdr: &mut dyn std::io::Read) -> HdbResult<HdbValue<'static>> {
    Ok(if parse_null(nullable, rdr)? {
        HdbValue::NULL
    } else {
        HdbValue::BIGINT(rdr.read_i64::<LittleEndian>()?)
    })
}

// REAL and DOUBLE use an all-bits-set pattern as NULL sentinel.
fn parse_real(nullable: bool, rdr: &mut dyn std::io::Read) -> HdbResult<HdbValue<'static>> {
    let mut vec = vec![0_u8; 4];
    rdr.read_exact(&mut vec[..])?;
    let mut cursor = std::io::Cursor::new(&vec);
    let is_null = cursor.read_u32::<LittleEndian>()? == u32::MAX;

    if is_null {
        if nullable {
            Ok(HdbValue::NULL)
        } else {
            Err(crate::HdbError::Impl("found NULL value for NOT NULL column"))
        }
    } else {
        cursor.set_position(0);
        Ok(HdbValue::REAL(cursor.read_f32::<LittleEndian>()?))
    }
}

fn parse_double(nullable: bool, rdr: &mut dyn std::io::Read) -> HdbResult<HdbValue<'static>> {
    let mut vec = vec![0_u8; 8];
    rdr.read_exact(&mut vec[..])?;
    let mut cursor = std::io::Cursor::new(&vec);
    let is_null = cursor.read_u64::<LittleEndian>()? == u64::MAX;

    if is_null {
        if nullable {
            Ok(HdbValue::NULL)
        } else {
            Err(crate::HdbError::Impl("found NULL value for NOT NULL column"))
        }
    } else {
        cursor.set_position(0);
        Ok(HdbValue::DOUBLE(cursor.read_f64::<LittleEndian>()?))
    }
}

fn parse_bool(
    nullable: bool,
    ctx: FieldTypeContext,
    rdr: &mut dyn std::io::Read,
) -> HdbResult<HdbValue<'static>> {
    if ctx.has_tristate_boolean() {
        // 0x00 = FALSE, 0x01 = NULL, 0x02 = TRUE
        match rdr.read_u8()? {
            0 => Ok(HdbValue::BOOLEAN(false)),
            2 => Ok(HdbValue::BOOLEAN(true)),
            1 => {
                if nullable {
                    Ok(HdbValue::NULL)
                } else {
                    Err(crate::HdbError::Impl("parse_bool: got null value"))
                }
            }
            i => Err(impl_err!("parse_bool: got bad value {i}")),
        }
    } else {
        Ok(if parse_null(nullable, rdr)? {
            HdbValue::NULL
        } else {
            HdbValue::BOOLEAN(rdr.read_u8()? != 0)
        })
    }
}

fn parse_alphanum(nullable: bool, rdr: &mut dyn std::io::Read) -> HdbResult<HdbValue<'static>> {
    let indicator1 = rdr.read_u8()?;
    if indicator1 == length_indicator::LENGTH_INDICATOR_NULL {
        if nullable {
            Ok(HdbValue::NULL)
        } else {
            Err(crate::HdbError::Impl(
                "found NULL value for NOT NULL ALPHANUM column",
            ))
        }
    } else {
        let data_length = indicator1 - 1; // the first byte is part of the indicator

        let indicator2 = rdr.read_u8()?;
        let mut value = util_sync::parse_bytes(data_length as usize, rdr)?;

        let s = util::string_from_cesu8(if indicator2 & ALPHANUM_PURELY_NUMERIC == 0 {
            // no prefix
            value
        } else {
            // purely numeric -> prefix with leading zeros
            let field_length = indicator2 & ALPHANUM_LENGTH_MASK;
            let mut prefix: Vec<u8> = std::iter::repeat(b'0')
                .take((field_length - data_length) as usize)
                .collect();
            prefix.append(&mut value);
            prefix
        })?;
        Ok(HdbValue::STRING(s))
    }
}

fn parse_string(
    nullable: bool,
    type_id: TypeId,
    ctx: FieldTypeContext,
    rdr: &mut dyn std::io::Read,
) -> HdbResult<HdbValue<'static>> {
    let l8 = rdr.read_u8()?; // B1
    let is_null = l8 == length_indicator::LENGTH_INDICATOR_NULL;

    if is_null {
        if nullable {
            Ok(HdbValue::NULL)
        } else {
            Err(crate::HdbError::Impl(
                "found NULL value for NOT NULL string column",
            ))
        }
    } else {
        match type_id {
            TypeId::CHAR
            | TypeId::VARCHAR
            | TypeId::NCHAR
            | TypeId::NVARCHAR
            | TypeId::NSTRING
            | TypeId::SHORTTEXT
            | TypeId::STRING => {
                let bytes = parse_length_and_bytes(l8, rdr)?;
                match ctx.cesu8_policy {
                    util::Cesu8DecodePolicy::Replace => {
                        Ok(HdbValue::STRING(util::string_from_cesu8_lossy(&bytes)))
                    }
                    util::Cesu8DecodePolicy::Fail => {
                        // In the very most cases we get correct cesu-8.
                        // In few cases, e.g. in M_TRACEFILES, this is not
                        // guaranteed; if cesu8-decoding fails we try plain
                        // utf8, and if that fails too we surface the bytes.
                        Ok(match util::try_string_from_cesu8(bytes) {
                            Ok(s) => HdbValue::STRING(s),
                            Err(v) => match String::from_utf8(v) {
                                Ok(s) => HdbValue::STRING(s),
                                Err(e) => HdbValue::DBSTRING(e.into_bytes()),
                            },
                        })
                    }
                }
            }
            _ => Err(crate::HdbError::Impl("unexpected type id for string")),
        }
    }
}

fn parse_binary(
    nullable: bool,
    type_id: TypeId,
    rdr: &mut dyn std::io::Read,
) -> HdbResult<HdbValue<'static>> {
    let l8 = rdr.read_u8()?; // B1
    let is_null = l8 == length_indicator::LENGTH_INDICATOR_NULL;

    if is_null {
        if nullable {
            Ok(HdbValue::NULL)
        } else {
            Err(crate::HdbError::Impl(
                "found NULL value for NOT NULL binary column",
            ))
        }
    } else {
        let bytes = parse_length_and_bytes(l8, rdr)?;
        Ok(match type_id {
            TypeId::BSTRING | TypeId::VARBINARY | TypeId::BINARY => HdbValue::BINARY(bytes),
            TypeId::GEOMETRY => HdbValue::GEOMETRY(bytes),
            TypeId::POINT => HdbValue::POINT(bytes),
            _ => return Err(crate::HdbError::Impl("unexpected type id for binary")),
        })
    }
}

fn parse_length_and_bytes(l8: u8, rdr: &mut dyn std::io::Read) -> HdbResult<Vec<u8>> {
    let len = length_indicator::parse(l8, rdr)?;
    util_sync::parse_bytes(len, rdr)
}

pub(crate) fn string_length<S: AsRef<str>>(s: S) -> usize {
    binary_length(util::cesu8_length(s.as_ref()))
}

pub(crate) fn binary_length(l: usize) -> usize {
    match l {
        l if l <= length_indicator::MAX_1_BYTE_LENGTH as usize => 1 + l,
        l if l <= length_indicator::MAX_2_BYTE_LENGTH as usize => 3 + l,
        l => 5 + l,
    }
}

pub(crate) fn emit_length_and_string<S: AsRef<str>>(
    s: S,
    w: &mut dyn std::io::Write,
) -> HdbResult<()> {
    emit_length_and_bytes(&cesu8::to_cesu8(s.as_ref()), w)
}

fn emit_length_and_bytes(v: &[u8], w: &mut dyn std::io::Write) -> HdbResult<()> {
    length_indicator::emit(v.len(), w)?;
    w.write_all(v)?;
    Ok(())
}

impl std::fmt::Display for HdbValue<'_> {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            HdbValue::NULL => write!(fmt, "<NULL>"),
            HdbValue::TINYINT(value) => write!(fmt, "{value}"),
            HdbValue::SMALLINT(value) => write!(fmt, "{value}"),
            HdbValue::INT(value) => write!(fmt, "{value}"),
            HdbValue::BIGINT(value) => write!(fmt, "{value}"),

            HdbValue::DECIMAL(ref value) => write!(fmt, "{value}"),

            HdbValue::REAL(value) => write!(fmt, "{value}"),
            HdbValue::DOUBLE(value) => write!(fmt, "{value}"),
            HdbValue::STR(value) => {
                if value.len() < 10_000 {
                    write!(fmt, "{value}")
                } else {
                    write!(fmt, "<STRING length = {}>", value.len())
                }
            }
            HdbValue::STRING(ref value) => {
                if value.len() < 10_000 {
                    write!(fmt, "{value}")
                } else {
                    write!(fmt, "<STRING length = {}>", value.len())
                }
            }
            HdbValue::DBSTRING(ref bytes) => {
                if bytes.len() < 5_000 {
                    write!(fmt, "{bytes:?}")
                } else {
                    write!(fmt, "<STRING length = {}>", bytes.len())
                }
            }
            HdbValue::BINARY(ref vec) => write!(fmt, "<BINARY length = {}>", vec.len()),

            HdbValue::CLOB(ref clob) => {
                write!(fmt, "<CLOB length = {}>", clob.total_byte_length())
            }
            HdbValue::NCLOB(ref nclob) => {
                write!(fmt, "<NCLOB length = {}>", nclob.total_byte_length())
            }
            HdbValue::BLOB(ref blob) => {
                write!(fmt, "<BLOB length = {}>", blob.total_byte_length())
            }
            HdbValue::LOBSTREAM(_) => write!(fmt, "<LOBSTREAM>"),
            HdbValue::BOOLEAN(value) => write!(fmt, "{value}"),
            HdbValue::LONGDATE(ref value) => write!(fmt, "{value}"),
            HdbValue::SECONDDATE(ref value) => write!(fmt, "{value}"),
            HdbValue::DAYDATE(ref value) => write!(fmt, "{value}"),
            HdbValue::SECONDTIME(ref value) => write!(fmt, "{value}"),
            HdbValue::GEOMETRY(ref vec) => write!(fmt, "<GEOMETRY length = {}>", vec.len()),
            HdbValue::POINT(ref vec) => write!(fmt, "<POINT length = {}>", vec.len()),
        }
    }
}

impl std::fmt::Debug for HdbValue<'_> {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(&self, fmt)
    }
}

impl std::cmp::PartialEq<i32> for HdbValue<'_> {
    fn eq(&self, rhs: &i32) -> bool {
        match self {
            HdbValue::TINYINT(i) => i32::from(*i) == *rhs,
            HdbValue::SMALLINT(i) => i32::from(*i) == *rhs,
            HdbValue::INT(i) => *i == *rhs,
            HdbValue::BIGINT(i) => *i == i64::from(*rhs),
            _ => false,
        }
    }
}
impl std::cmp::PartialEq<&str> for HdbValue<'_> {
    fn eq(&self, rhs: &&str) -> bool {
        match self {
            HdbValue::STRING(ref s) => s == rhs,
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::HdbValue;
    use crate::types::{DayDate, LongDate, SecondDate, SecondTime};
    use bigdecimal::BigDecimal;
    use num::bigint::BigInt;
    use num::FromPrimitive;

    #[test]
    fn test_display() {
        for value in [
            HdbValue::STRING("foo".to_string()),
            HdbValue::NULL,
            HdbValue::TINYINT(42),
            HdbValue::SMALLINT(42),
            HdbValue::INT(42),
            HdbValue::BIGINT(42),
            HdbValue::DECIMAL(BigDecimal::new(BigInt::from_i64(42_i64).unwrap(), 42_i64)),
            HdbValue::REAL(42_f32),
            HdbValue::DOUBLE(42_f64),
            HdbValue::STR("foo bar"),
            HdbValue::BINARY(vec![42, 42, 42]),
            HdbValue::BOOLEAN(true),
            HdbValue::LONGDATE(LongDate::new(100_i64)),
            HdbValue::SECONDDATE(SecondDate::new(100_i64)),
            HdbValue::DAYDATE(DayDate::new(100_i32)),
            HdbValue::SECONDTIME(SecondTime::new(100_i32)),
        ] {
            let _s = value.to_string();
        }
    }

    #[test]
    fn test_comparison() {
        assert_eq!(HdbValue::INT(42), 42);
        assert_eq!(HdbValue::BIGINT(42), 42);
        assert_eq!(HdbValue::STRING("Hello 世界".to_string()), "Hello 世界");
        assert_ne!(HdbValue::NULL, 42);
    }
}
