use core::fmt::{self, Display};

use crate::{
    error::Error,
    table::Table,
    types::{CellType, Value},
};

/// Writes `value` into a cell-sized window, converting it to the column's width.
///
/// Numbers must fit the column; text is cut to `size - 1` bytes on a char boundary and
/// null padded.
pub(crate) fn encode(ty: CellType, value: Value<'_>, out: &mut [u8]) -> Result<(), Error> {
    debug_assert_eq!(out.len(), ty.size());
    macro_rules! put_int {
        ($int:ty) => {{
            let v = <$int>::try_from(integral(ty, value)?).map_err(|_| Error::OutOfRange(ty))?;
            out.copy_from_slice(&v.to_le_bytes());
        }};
    }

    match ty {
        CellType::Int8 => put_int!(i8),
        CellType::Uint8 | CellType::Char => put_int!(u8),
        CellType::Int16 => put_int!(i16),
        CellType::Uint16 => put_int!(u16),
        CellType::Int32 => put_int!(i32),
        CellType::Uint32 | CellType::Unix => put_int!(u32),
        CellType::Int64 => put_int!(i64),
        CellType::Uint64 => put_int!(u64),
        CellType::Float => {
            let v = match value {
                Value::Int(v) => v as f32,
                Value::Uint(v) => v as f32,
                Value::Float(v) => {
                    let narrowed = v as f32;
                    if v.is_finite() && !narrowed.is_finite() {
                        return Err(Error::OutOfRange(ty));
                    }
                    narrowed
                }
                Value::Str(_) => {
                    return Err(Error::TypeMismatch {
                        ty,
                        value: value.kind(),
                    });
                }
            };
            out.copy_from_slice(&v.to_le_bytes());
        }
        _ => encode_text(ty, value, out)?,
    }
    Ok(())
}

fn encode_text(ty: CellType, value: Value<'_>, out: &mut [u8]) -> Result<(), Error> {
    let Value::Str(text) = value else {
        return Err(Error::TypeMismatch {
            ty,
            value: value.kind(),
        });
    };
    let text = text.split('\0').next().unwrap_or_default();
    let mut len = text.len().min(out.len().saturating_sub(1));
    while !text.is_char_boundary(len) {
        len -= 1;
    }
    out[..len].copy_from_slice(&text.as_bytes()[..len]);
    out[len..].fill(0);
    Ok(())
}

fn integral(ty: CellType, value: Value<'_>) -> Result<i128, Error> {
    match value {
        Value::Int(v) => Ok(v as i128),
        Value::Uint(v) => Ok(v as i128),
        Value::Float(v) if v.is_finite() => Ok(v.trunc() as i128),
        Value::Float(_) => Err(Error::OutOfRange(ty)),
        Value::Str(_) => Err(Error::TypeMismatch {
            ty,
            value: value.kind(),
        }),
    }
}

/// Reads a cell window. Signed columns sign-extend, unsigned ones zero-extend.
pub(crate) fn decode(ty: CellType, bytes: &[u8]) -> Result<Value<'_>, Error> {
    macro_rules! le {
        ($int:ty) => {{
            let raw = bytes
                .try_into()
                .map_err(|_| Error::OutOfRange(ty))?;
            <$int>::from_le_bytes(raw)
        }};
    }

    Ok(match ty {
        CellType::Int8 => Value::Int(le!(i8) as i64),
        CellType::Uint8 | CellType::Char => Value::Uint(le!(u8) as u64),
        CellType::Int16 => Value::Int(le!(i16) as i64),
        CellType::Uint16 => Value::Uint(le!(u16) as u64),
        CellType::Int32 => Value::Int(le!(i32) as i64),
        CellType::Uint32 | CellType::Unix => Value::Uint(le!(u32) as u64),
        CellType::Int64 => Value::Int(le!(i64)),
        CellType::Uint64 => Value::Uint(le!(u64)),
        CellType::Float => Value::Float(le!(f32) as f64),
        _ => {
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            Value::Str(std::str::from_utf8(&bytes[..end])?)
        }
    })
}

fn to_int<T: TryFrom<i128>>(ty: CellType, value: Value<'_>, target: &'static str) -> Result<T, Error> {
    let wide = match value {
        Value::Str(_) => return Err(Error::TypeMismatch { ty, value: target }),
        value => integral(ty, value)?,
    };
    T::try_from(wide).map_err(|_| Error::OutOfRange(ty))
}

/// Read-only handle on one cell. Resolves its bytes through the table on every access.
#[derive(Clone, Copy)]
pub struct Cell<'a> {
    table: &'a Table,
    row: usize,
    col: usize,
}

impl<'a> Cell<'a> {
    pub(crate) fn new(table: &'a Table, row: usize, col: usize) -> Self {
        Self { table, row, col }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn cell_type(&self) -> CellType {
        self.table.types()[self.col]
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.table.cell_bytes(self.row, self.col)
    }

    pub fn value(&self) -> Result<Value<'a>, Error> {
        decode(self.cell_type(), self.as_bytes())
    }

    pub fn get_i64(&self) -> Result<i64, Error> {
        to_int(self.cell_type(), self.value()?, "i64")
    }

    pub fn get_u64(&self) -> Result<u64, Error> {
        to_int(self.cell_type(), self.value()?, "u64")
    }

    pub fn get_i32(&self) -> Result<i32, Error> {
        to_int(self.cell_type(), self.value()?, "i32")
    }

    pub fn get_f64(&self) -> Result<f64, Error> {
        match self.value()? {
            Value::Int(v) => Ok(v as f64),
            Value::Uint(v) => Ok(v as f64),
            Value::Float(v) => Ok(v),
            Value::Str(_) => Err(Error::TypeMismatch {
                ty: self.cell_type(),
                value: "f64",
            }),
        }
    }

    pub fn get_f32(&self) -> Result<f32, Error> {
        self.get_f64().map(|v| v as f32)
    }

    pub fn get_str(&self) -> Result<&'a str, Error> {
        match self.value()? {
            Value::Str(s) => Ok(s),
            _ => Err(Error::TypeMismatch {
                ty: self.cell_type(),
                value: "a string",
            }),
        }
    }

    pub fn get_char(&self) -> Result<char, Error> {
        match self.cell_type() {
            CellType::Char => Ok(char::from(self.as_bytes()[0])),
            ty => Err(Error::TypeMismatch { ty, value: "a char" }),
        }
    }

    /// Writes the cell as text: floats with `decimals` digits, `Char` as a character.
    pub(crate) fn write_text(&self, out: &mut impl fmt::Write, decimals: usize) -> fmt::Result {
        write_text(out, self.cell_type(), self.as_bytes(), decimals)
    }
}

pub(crate) fn write_text(
    out: &mut impl fmt::Write,
    ty: CellType,
    bytes: &[u8],
    decimals: usize,
) -> fmt::Result {
    if ty == CellType::Char {
        return out.write_char(char::from(bytes[0]));
    }
    if ty.is_text() {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        return out.write_str(&String::from_utf8_lossy(&bytes[..end]));
    }
    match decode(ty, bytes) {
        Ok(Value::Float(v)) => write!(out, "{v:.decimals$}"),
        Ok(value) => write!(out, "{value}"),
        Err(_) => Ok(()),
    }
}

impl Display for Cell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_text(f, 2)
    }
}

impl fmt::Debug for Cell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("row", &self.row)
            .field("col", &self.col)
            .field("type", &self.cell_type())
            .field("value", &self.value().ok())
            .finish()
    }
}

/// Mutable handle on one cell.
pub struct CellMut<'a> {
    table: &'a mut Table,
    row: usize,
    col: usize,
}

impl<'a> CellMut<'a> {
    pub(crate) fn new(table: &'a mut Table, row: usize, col: usize) -> Self {
        Self { table, row, col }
    }

    pub fn as_cell(&self) -> Cell<'_> {
        Cell::new(self.table, self.row, self.col)
    }

    pub fn cell_type(&self) -> CellType {
        self.as_cell().cell_type()
    }

    /// Stores `value`. Writing the bytes already present leaves the table clean.
    pub fn set<'v>(&mut self, value: impl Into<Value<'v>>) -> Result<(), Error> {
        let ty = self.cell_type();
        let mut scratch = [0u8; CellType::MAX_SIZE];
        let scratch = &mut scratch[..ty.size()];
        encode(ty, value.into(), scratch)?;
        self.table.write_cell(self.row, self.col, scratch);
        Ok(())
    }

    pub fn set_i64(&mut self, value: i64) -> Result<(), Error> {
        self.set(value)
    }

    pub fn set_u64(&mut self, value: u64) -> Result<(), Error> {
        self.set(value)
    }

    pub fn set_f32(&mut self, value: f32) -> Result<(), Error> {
        self.set(value)
    }

    pub fn set_f64(&mut self, value: f64) -> Result<(), Error> {
        self.set(value)
    }

    pub fn set_str(&mut self, value: &str) -> Result<(), Error> {
        self.set(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(ty: CellType) -> Table {
        let mut table = Table::new();
        table.create(1, &[ty]).unwrap();
        table.clear_changed();
        table
    }

    #[test]
    fn test_sign_extension() {
        let mut t = table(CellType::Int8);
        t.cell_mut(0, 0).unwrap().set(-3).unwrap();
        assert_eq!(t.cell(0, 0).unwrap().get_i64().unwrap(), -3);
        assert_eq!(t.cell(0, 0).unwrap().as_bytes(), &[0xfd]);
        assert!(matches!(
            t.cell(0, 0).unwrap().get_u64(),
            Err(Error::OutOfRange(CellType::Int8))
        ));

        let mut t = table(CellType::Uint8);
        t.cell_mut(0, 0).unwrap().set(253u8).unwrap();
        assert_eq!(t.cell(0, 0).unwrap().get_i64().unwrap(), 253);
    }

    #[test]
    fn test_range_checked_set() {
        let mut t = table(CellType::Int16);
        assert!(matches!(
            t.cell_mut(0, 0).unwrap().set(40_000),
            Err(Error::OutOfRange(CellType::Int16))
        ));
        assert!(matches!(
            t.cell_mut(0, 0).unwrap().set("x"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(!t.changed());

        t.cell_mut(0, 0).unwrap().set_f64(-12.9).unwrap();
        assert_eq!(t.cell(0, 0).unwrap().get_i32().unwrap(), -12);
    }

    #[test]
    fn test_float_cell() {
        let mut t = table(CellType::Float);
        t.cell_mut(0, 0).unwrap().set_f32(2.75).unwrap();
        let cell = t.cell(0, 0).unwrap();
        assert_eq!(cell.get_f64().unwrap(), 2.75);
        assert_eq!(cell.get_i64().unwrap(), 2);
        assert_eq!(cell.to_string(), "2.75");
        assert!(matches!(
            t.cell_mut(0, 0).unwrap().set_f64(1e300),
            Err(Error::OutOfRange(CellType::Float))
        ));
    }

    #[test]
    fn test_text_truncation() {
        let mut t = table(CellType::Char8);
        t.cell_mut(0, 0).unwrap().set_str("abcdefghijk").unwrap();
        assert_eq!(t.cell(0, 0).unwrap().get_str().unwrap(), "abcdefgh");
        assert_eq!(t.cell(0, 0).unwrap().as_bytes()[8], 0);

        t.cell_mut(0, 0).unwrap().set_str("abcdefgé").unwrap();
        assert_eq!(t.cell(0, 0).unwrap().get_str().unwrap(), "abcdefg");

        t.cell_mut(0, 0).unwrap().set_str("ab").unwrap();
        assert_eq!(t.cell(0, 0).unwrap().as_bytes(), b"ab\0\0\0\0\0\0\0");
        assert!(matches!(
            t.cell(0, 0).unwrap().get_i64(),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_identical_write_stays_clean() {
        let mut t = table(CellType::Uint32);
        t.cell_mut(0, 0).unwrap().set(7u32).unwrap();
        assert!(t.changed());
        t.clear_changed();
        t.cell_mut(0, 0).unwrap().set(7u64).unwrap();
        assert!(!t.changed());
        t.cell_mut(0, 0).unwrap().set(8).unwrap();
        assert!(t.changed());
    }

    #[test]
    fn test_char_cell() {
        let mut t = table(CellType::Char);
        t.cell_mut(0, 0).unwrap().set(b'z').unwrap();
        assert_eq!(t.cell(0, 0).unwrap().get_char().unwrap(), 'z');
        assert_eq!(t.cell(0, 0).unwrap().to_string(), "z");
    }
}
