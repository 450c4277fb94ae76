use core::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zerocopy::{Immutable, IntoBytes, KnownLayout, TryFromBytes, Unaligned};

use crate::error::Error;

/// Column type. The discriminant is the one byte code stored in table headers; `0` is reserved.
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    TryFromBytes,
    IntoBytes,
    Immutable,
    KnownLayout,
    Unaligned,
)]
#[repr(u8)]
pub enum CellType {
    Int8 = 1,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float,
    Int64,
    Uint64,
    /// Seconds since the Unix epoch, stored as a `u32`.
    Unix,
    /// A single byte character.
    Char,
    Char8,
    Char16,
    Char32,
    Char64,
    Char128,
    Char256,
}

impl CellType {
    pub const ALL: [CellType; 17] = [
        CellType::Int8,
        CellType::Uint8,
        CellType::Int16,
        CellType::Uint16,
        CellType::Int32,
        CellType::Uint32,
        CellType::Float,
        CellType::Int64,
        CellType::Uint64,
        CellType::Unix,
        CellType::Char,
        CellType::Char8,
        CellType::Char16,
        CellType::Char32,
        CellType::Char64,
        CellType::Char128,
        CellType::Char256,
    ];

    /// Widest cell, in bytes.
    pub const MAX_SIZE: usize = 257;

    /// Width in bytes. Text types include their null terminator.
    pub const fn size(&self) -> usize {
        match self {
            CellType::Int8 | CellType::Uint8 | CellType::Char => 1,
            CellType::Int16 | CellType::Uint16 => 2,
            CellType::Int32 | CellType::Uint32 | CellType::Float | CellType::Unix => 4,
            CellType::Int64 | CellType::Uint64 => 8,
            CellType::Char8 => 9,
            CellType::Char16 => 17,
            CellType::Char32 => 33,
            CellType::Char64 => 65,
            CellType::Char128 => 129,
            CellType::Char256 => 257,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            CellType::Int8 => "Int8",
            CellType::Uint8 => "Uint8",
            CellType::Int16 => "Int16",
            CellType::Uint16 => "Uint16",
            CellType::Int32 => "Int32",
            CellType::Uint32 => "Uint32",
            CellType::Float => "Float",
            CellType::Int64 => "Int64",
            CellType::Uint64 => "Uint64",
            CellType::Unix => "Unix",
            CellType::Char => "Char",
            CellType::Char8 => "Char8",
            CellType::Char16 => "Char16",
            CellType::Char32 => "Char32",
            CellType::Char64 => "Char64",
            CellType::Char128 => "Char128",
            CellType::Char256 => "Char256",
        }
    }

    pub const fn code(&self) -> u8 {
        *self as u8
    }

    /// Null terminated text of `size() - 1` bytes.
    pub const fn is_text(&self) -> bool {
        matches!(
            self,
            CellType::Char8
                | CellType::Char16
                | CellType::Char32
                | CellType::Char64
                | CellType::Char128
                | CellType::Char256
        )
    }

    pub const fn is_signed(&self) -> bool {
        matches!(
            self,
            CellType::Int8 | CellType::Int16 | CellType::Int32 | CellType::Int64
        )
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, CellType::Float)
    }

    /// Validates a run of type codes in place.
    pub fn from_codes(codes: &[u8]) -> Result<&[CellType], Error> {
        <[CellType]>::try_ref_from_bytes(codes).map_err(|_| {
            let bad = codes
                .iter()
                .copied()
                .find(|&code| CellType::try_from(code).is_err())
                .unwrap_or_default();
            Error::InvalidCellType(bad)
        })
    }

    pub fn as_codes(types: &[CellType]) -> &[u8] {
        types.as_bytes()
    }

    /// Parses command line or config text into a value suitable for this column.
    ///
    /// A `Char` column takes a single character literally; longer input is read as the
    /// numeric byte value, so `"5"` stores `'5'` and `"65"` stores `'A'`.
    pub fn parse_value<'a>(&self, input: &'a str) -> Result<Value<'a>, Error> {
        let err = || Error::ParseValue {
            ty: *self,
            input: input.to_string(),
        };
        match self {
            ty if ty.is_text() => Ok(Value::Str(input)),
            CellType::Char => match input.as_bytes() {
                [byte] => Ok(Value::Uint(*byte as u64)),
                _ => input.parse().map(Value::Uint).map_err(|_| err()),
            },
            CellType::Float => input.parse().map(Value::Float).map_err(|_| err()),
            ty if ty.is_signed() => input.parse().map(Value::Int).map_err(|_| err()),
            _ => input.parse().map(Value::Uint).map_err(|_| err()),
        }
    }
}

impl TryFrom<u8> for CellType {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        CellType::try_read_from_bytes(&[code]).map_err(|_| Error::InvalidCellType(code))
    }
}

impl Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CellType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CellType::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownTypeName(s.to_string()))
    }
}

/// A value headed for, or read from, a cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value<'a> {
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(&'a str),
}

impl Value<'_> {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "a signed integer",
            Value::Uint(_) => "an unsigned integer",
            Value::Float(_) => "a float",
            Value::Str(_) => "a string",
        }
    }
}

impl Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => Display::fmt(v, f),
            Value::Uint(v) => Display::fmt(v, f),
            Value::Float(v) => Display::fmt(v, f),
            Value::Str(v) => Display::fmt(v, f),
        }
    }
}

macro_rules! impl_from_value {
    ($variant:ident, $target:ty, $($ty:ty),+) => {
        $(
            impl From<$ty> for Value<'_> {
                fn from(value: $ty) -> Self {
                    Value::$variant(value as $target)
                }
            }
        )+
    };
}

impl_from_value!(Int, i64, i8, i16, i32, i64, isize);
impl_from_value!(Uint, u64, u8, u16, u32, u64, usize);
impl_from_value!(Float, f64, f32, f64);

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Value::Str(value)
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(value: &'a String) -> Self {
        Value::Str(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        let sizes: Vec<usize> = CellType::ALL.iter().map(CellType::size).collect();
        assert_eq!(
            sizes,
            [1, 1, 2, 2, 4, 4, 4, 8, 8, 4, 1, 9, 17, 33, 65, 129, 257]
        );
        assert_eq!(
            CellType::ALL.iter().map(CellType::size).max(),
            Some(CellType::MAX_SIZE)
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(CellType::Int8.code(), 1);
        assert_eq!(CellType::Float.code(), 7);
        assert_eq!(CellType::Int64.code(), 8);
        assert_eq!(CellType::Char256.code(), 17);
        for ty in CellType::ALL {
            assert_eq!(CellType::try_from(ty.code()).unwrap(), ty);
        }
        assert!(matches!(
            CellType::try_from(0),
            Err(Error::InvalidCellType(0))
        ));
        assert!(matches!(
            CellType::try_from(18),
            Err(Error::InvalidCellType(18))
        ));
    }

    #[test]
    fn test_from_codes() {
        let types = CellType::from_codes(&[3, 12]).unwrap();
        assert_eq!(types, [CellType::Int16, CellType::Char8]);
        assert_eq!(CellType::as_codes(types), &[3, 12]);
        assert!(matches!(
            CellType::from_codes(&[3, 40, 1]),
            Err(Error::InvalidCellType(40))
        ));
    }

    #[test]
    fn test_names_round_trip() {
        for ty in CellType::ALL {
            assert_eq!(ty.to_string().parse::<CellType>().unwrap(), ty);
        }
        assert_eq!("char16".parse::<CellType>().unwrap(), CellType::Char16);
        assert!("int128".parse::<CellType>().is_err());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(CellType::Int8.parse_value("-4").unwrap(), Value::Int(-4));
        assert_eq!(CellType::Unix.parse_value("17").unwrap(), Value::Uint(17));
        assert_eq!(CellType::Char.parse_value("x").unwrap(), Value::Uint(120));
        assert_eq!(CellType::Char.parse_value("5").unwrap(), Value::Uint(b'5' as u64));
        assert_eq!(CellType::Char.parse_value("65").unwrap(), Value::Uint(65));
        assert!(CellType::Char.parse_value("256").is_ok());
        assert_eq!(CellType::Float.parse_value("1.5").unwrap(), Value::Float(1.5));
        assert_eq!(CellType::Char8.parse_value("12").unwrap(), Value::Str("12"));
        assert!(CellType::Uint16.parse_value("-1").is_err());
    }

    #[test]
    fn test_schema_serializes() {
        let schema = vec![CellType::Uint32, CellType::Char64];
        let bytes = postcard::to_allocvec(&schema).unwrap();
        let decoded: Vec<CellType> = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, schema);
    }
}
