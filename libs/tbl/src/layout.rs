use std::ops::Range;

use crate::{
    cell,
    error::Error,
    types::{CellType, Value},
};

/// Column types with their byte offsets inside a row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowLayout {
    types: Vec<CellType>,
    offsets: Vec<usize>,
    stride: usize,
}

impl RowLayout {
    pub const MAX_COLUMNS: usize = u8::MAX as usize;

    pub fn new(types: &[CellType]) -> Result<Self, Error> {
        if types.len() > Self::MAX_COLUMNS {
            return Err(Error::TooManyColumns(types.len()));
        }
        let mut owned = Vec::new();
        let mut offsets = Vec::new();
        owned.try_reserve_exact(types.len()).map_err(|_| Error::Alloc)?;
        offsets
            .try_reserve_exact(types.len())
            .map_err(|_| Error::Alloc)?;

        let mut stride = 0;
        for ty in types {
            owned.push(*ty);
            offsets.push(stride);
            stride += ty.size();
        }
        Ok(Self {
            types: owned,
            offsets,
            stride,
        })
    }

    pub fn types(&self) -> &[CellType] {
        &self.types
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn cols(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn cell_type(&self, col: usize) -> Option<CellType> {
        self.types.get(col).copied()
    }

    pub fn row_range(&self, row: usize) -> Range<usize> {
        let start = row * self.stride;
        start..start + self.stride
    }

    /// Byte range of a cell within the table buffer: `row × stride + offset[col]`.
    pub fn cell_range(&self, row: usize, col: usize) -> Option<Range<usize>> {
        let ty = self.cell_type(col)?;
        let start = row * self.stride + self.offsets[col];
        Some(start..start + ty.size())
    }

    /// Encodes `values` column by column over an existing row image.
    ///
    /// Values past the last column are ignored; columns without a value keep their bytes.
    pub fn encode_into(&self, values: &[Value<'_>], row: &mut [u8]) -> Result<(), Error> {
        for (col, value) in values.iter().enumerate().take(self.cols()) {
            let range = self.cell_range(0, col).ok_or(Error::ColumnOutOfBounds(col))?;
            cell::encode(self.types[col], *value, &mut row[range])?;
        }
        Ok(())
    }

    /// Encodes a fresh row; columns without a value are zero.
    pub fn encode_row(&self, values: &[Value<'_>]) -> Result<Vec<u8>, Error> {
        let mut row = Vec::new();
        row.try_reserve_exact(self.stride)
            .map_err(|_| Error::Alloc)?;
        row.resize(self.stride, 0);
        self.encode_into(values, &mut row)?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_and_stride() {
        let layout =
            RowLayout::new(&[CellType::Int16, CellType::Char8, CellType::Uint64]).unwrap();
        assert_eq!(layout.offsets(), &[0, 2, 11]);
        assert_eq!(layout.stride(), 19);
        assert_eq!(layout.cell_range(2, 1), Some(40..49));
        assert_eq!(layout.cell_range(0, 3), None);
        assert_eq!(layout.row_range(1), 19..38);
    }

    #[test]
    fn test_too_many_columns() {
        let types = vec![CellType::Uint8; 256];
        assert!(matches!(
            RowLayout::new(&types),
            Err(Error::TooManyColumns(256))
        ));
        assert_eq!(RowLayout::new(&types[..255]).unwrap().stride(), 255);
    }

    #[test]
    fn test_encode_row() {
        let layout = RowLayout::new(&[CellType::Int16, CellType::Char8]).unwrap();
        let row = layout.encode_row(&[Value::Int(-2)]).unwrap();
        assert_eq!(row, [0xfe, 0xff, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

        let row = layout
            .encode_row(&[Value::Int(1), Value::Str("hi"), Value::Int(9)])
            .unwrap();
        assert_eq!(&row[..5], &[1, 0, b'h', b'i', 0]);
    }
}
