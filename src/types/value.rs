//! # Runtime Values
//!
//! [`Value`] is what the record decoder produces per column. Byte-backed
//! variants borrow from the page mapping (`Cow` lets callers detach them);
//! UTF-16 text is transcoded into an owned `String` since the mapping stores
//! little-endian code units, not UTF-8.
//!
//! `datetime` values keep the on-disk pair: days since 1900-01-01 and ticks
//! of 1/300 second since midnight.

use std::borrow::Cow;
use std::fmt;

use crate::types::ScalarType;

/// On-disk `datetime`: days since the 1900 epoch plus 300ths of a second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime {
    pub days: i32,
    pub ticks: u32,
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.ticks / 300;
        write!(
            f,
            "{}d {:02}:{:02}:{:02}",
            self.days,
            secs / 3600,
            (secs / 60) % 60,
            secs % 60
        )
    }
}

/// Kind tag attached to byte ranges the decoder does not interpret inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoTag {
    /// A geography value stored in-row.
    Geography,
    /// A 16-byte in-row pointer to a text-mix page.
    LobPointer,
    /// A row-overflow pointer.
    Overflow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    TinyInt(u8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    DateTime(DateTime),
    Guid([u8; 16]),
    String(Cow<'a, str>),
    Bytes(Cow<'a, [u8]>),
    /// An uninterpreted typed payload: geography values and LOB pointers.
    GeoRef(GeoTag, Cow<'a, [u8]>),
}

impl<'a> Value<'a> {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(*b as i64),
            Value::TinyInt(v) => Some(*v as i64),
            Value::SmallInt(v) => Some(*v as i64),
            Value::Int(v) => Some(*v as i64),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            Value::GeoRef(_, b) => Some(b),
            _ => None,
        }
    }

    /// Decodes a fixed-width field of scalar type `ty` from `bytes`.
    /// `bytes` must be exactly the column's width; a short read surfaces as
    /// `None` so the caller can report the page.
    pub fn decode_fixed(ty: ScalarType, bytes: &'a [u8]) -> Option<Value<'a>> {
        let value = match ty {
            ScalarType::Bit => Value::Bool(*bytes.first()? != 0),
            ScalarType::TinyInt => Value::TinyInt(*bytes.first()?),
            ScalarType::SmallInt => Value::SmallInt(i16::from_le_bytes(take(bytes)?)),
            ScalarType::Int => Value::Int(i32::from_le_bytes(take(bytes)?)),
            ScalarType::BigInt | ScalarType::Money => {
                Value::BigInt(i64::from_le_bytes(take(bytes)?))
            }
            ScalarType::SmallMoney => Value::Int(i32::from_le_bytes(take(bytes)?)),
            ScalarType::Real => Value::Float(f32::from_le_bytes(take(bytes)?)),
            ScalarType::Float => Value::Double(f64::from_le_bytes(take(bytes)?)),
            ScalarType::DateTime => {
                if bytes.len() < 8 {
                    return None;
                }
                let ticks = u32::from_le_bytes(bytes[..4].try_into().ok()?);
                let days = i32::from_le_bytes(bytes[4..8].try_into().ok()?);
                Value::DateTime(DateTime { days, ticks })
            }
            ScalarType::SmallDateTime => {
                if bytes.len() < 4 {
                    return None;
                }
                let minutes = u16::from_le_bytes(bytes[..2].try_into().ok()?);
                let days = u16::from_le_bytes(bytes[2..4].try_into().ok()?);
                Value::DateTime(DateTime {
                    days: days as i32,
                    ticks: minutes as u32 * 60 * 300,
                })
            }
            ScalarType::UniqueIdentifier => Value::Guid(take(bytes)?),
            ScalarType::Char => Value::String(Cow::Owned(
                String::from_utf8_lossy(bytes).trim_end().to_string(),
            )),
            ScalarType::NChar => Value::String(Cow::Owned(
                decode_utf16le(bytes).trim_end().to_string(),
            )),
            ScalarType::Binary | ScalarType::Timestamp => Value::Bytes(Cow::Borrowed(bytes)),
            ScalarType::Decimal | ScalarType::Numeric => Value::Bytes(Cow::Borrowed(bytes)),
            _ => return None,
        };
        Some(value)
    }

    /// Decodes a variable-length field of scalar type `ty`. `complex` is the
    /// high bit of the column's end offset (payload is a pointer, not data).
    pub fn decode_variable(ty: ScalarType, bytes: &'a [u8], complex: bool) -> Value<'a> {
        if complex {
            return Value::GeoRef(GeoTag::LobPointer, Cow::Borrowed(bytes));
        }
        match ty {
            ScalarType::VarChar | ScalarType::Text | ScalarType::Xml => {
                Value::String(String::from_utf8_lossy(bytes))
            }
            ScalarType::NVarChar | ScalarType::NText => {
                Value::String(Cow::Owned(decode_utf16le(bytes)))
            }
            ScalarType::Geography => Value::GeoRef(GeoTag::Geography, Cow::Borrowed(bytes)),
            _ => Value::Bytes(Cow::Borrowed(bytes)),
        }
    }
}

#[inline]
fn take<const N: usize>(bytes: &[u8]) -> Option<[u8; N]> {
    bytes.get(..N)?.try_into().ok()
}

/// Decodes UTF-16LE bytes; an odd trailing byte and unpaired surrogates come
/// out as replacement characters.
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Decodes a NUL-padded fixed UTF-16LE buffer (catalog name fields).
pub fn decode_utf16le_nul(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16_lossy(&units)
}
