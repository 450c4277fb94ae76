use std::io::{Read, Write};

use tracing::{debug, trace};
use zerocopy::{FromBytes, IntoBytes};

use crate::{
    cell::{Cell, CellMut},
    error::Error,
    header::{HEADER_SIZE, Header},
    layout::RowLayout,
    row::{Row, RowMut},
    types::{CellType, Value},
};

/// In-memory table: a schema plus `rows × stride` bytes of cell data.
///
/// Row indices taken as `isize` count from the end when negative, so `-1` is the last row.
#[derive(Clone, Debug, Default)]
pub struct Table {
    layout: RowLayout,
    data: Vec<u8>,
    rows: usize,
    limit: Option<u16>,
    changed: bool,
}

impl Table {
    pub const MAX_ROWS: usize = u16::MAX as usize;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(types: &[CellType]) -> Result<Self, Error> {
        let mut table = Self::new();
        table.init(types)?;
        Ok(table)
    }

    /// Sets the schema. An identical schema keeps the data; any other one drops every row.
    pub fn init(&mut self, types: &[CellType]) -> Result<(), Error> {
        if self.layout.types() == types {
            return Ok(());
        }
        let layout = RowLayout::new(types)?;
        if self.rows > 0 {
            debug!(rows = self.rows, cols = types.len(), "schema replaced, dropping rows");
        }
        self.layout = layout;
        self.data = Vec::new();
        self.rows = 0;
        self.changed = true;
        Ok(())
    }

    /// `init` followed by `resize`.
    pub fn create(&mut self, rows: usize, types: &[CellType]) -> Result<(), Error> {
        self.init(types)?;
        self.resize(rows)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.layout.cols()
    }

    pub fn stride(&self) -> usize {
        self.layout.stride()
    }

    pub fn types(&self) -> &[CellType] {
        self.layout.types()
    }

    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Set by every mutation, cleared only by [`Table::clear_changed`].
    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn clear_changed(&mut self) {
        self.changed = false;
    }

    pub fn limit(&self) -> Option<u16> {
        self.limit
    }

    /// Caps the row count for [`Table::add`]; `None` or `Some(0)` removes the cap.
    pub fn set_limit(&mut self, limit: Option<u16>) {
        self.limit = limit.filter(|&limit| limit > 0);
    }

    /// Ensures `rows` rows fit without reallocating.
    pub fn reserve(&mut self, rows: usize) -> Result<(), Error> {
        if rows > Self::MAX_ROWS {
            return Err(Error::TooManyRows(rows));
        }
        let needed = (rows * self.stride()).saturating_sub(self.data.len());
        self.data.try_reserve(needed).map_err(|_| Error::Alloc)
    }

    /// Grows with zeroed rows or truncates. The table is untouched if the buffer cannot grow.
    pub fn resize(&mut self, rows: usize) -> Result<(), Error> {
        if rows > Self::MAX_ROWS {
            return Err(Error::TooManyRows(rows));
        }
        if rows > 0 && self.layout.is_empty() {
            return Err(Error::NoColumns);
        }
        if rows == self.rows {
            return Ok(());
        }
        let len = rows * self.stride();
        if len > self.data.len() {
            self.data
                .try_reserve_exact(len - self.data.len())
                .map_err(|_| Error::Alloc)?;
        }
        self.data.resize(len, 0);
        self.rows = rows;
        self.changed = true;
        Ok(())
    }

    /// Adds a zeroed row and returns its index.
    ///
    /// Once the limit is reached the table scrolls up instead of growing and the last row is
    /// zeroed.
    pub fn add(&mut self) -> Result<usize, Error> {
        if self.layout.is_empty() {
            return Err(Error::NoColumns);
        }
        match self.limit {
            Some(limit) if self.rows >= limit as usize => {
                self.scroll_up();
                let last = self.layout.row_range(self.rows - 1);
                self.data[last].fill(0);
                self.changed = true;
            }
            _ => self.resize(self.rows + 1)?,
        }
        Ok(self.rows - 1)
    }

    /// Adds a row holding `values`. Nothing changes if a value does not fit its column.
    pub fn append(&mut self, values: &[Value<'_>]) -> Result<usize, Error> {
        let row = self.layout.encode_row(values)?;
        let index = self.add()?;
        self.write_row(index, &row);
        Ok(index)
    }

    /// Drops the first row and writes `values` into the last one, keeping the row count.
    pub fn shift(&mut self, values: &[Value<'_>]) -> Result<(), Error> {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let row = self.layout.encode_row(values)?;
        self.scroll_up();
        self.write_row(self.rows - 1, &row);
        Ok(())
    }

    /// Appends a copy of the last row.
    pub fn dup_last(&mut self) -> Result<usize, Error> {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let last = self.data[self.layout.row_range(self.rows - 1)].to_vec();
        let index = self.add()?;
        self.write_row(index, &last);
        Ok(index)
    }

    pub fn remove(&mut self, index: isize) -> Result<(), Error> {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let row = self.resolve(index)?;
        let range = self.layout.row_range(row);
        self.data.copy_within(range.end.., range.start);
        self.data.truncate(self.data.len() - self.stride());
        self.rows -= 1;
        self.changed = true;
        Ok(())
    }

    /// Drops every row and keeps the schema.
    pub fn remove_all(&mut self) {
        if self.rows > 0 {
            self.changed = true;
        }
        self.rows = 0;
        self.data.clear();
    }

    /// Zeroes every cell.
    pub fn clear(&mut self) {
        if self.rows > 0 {
            self.data.fill(0);
            self.changed = true;
        }
    }

    /// Drops schema and data.
    pub fn reset(&mut self) {
        self.layout = RowLayout::default();
        self.data = Vec::new();
        self.rows = 0;
        self.changed = true;
    }

    /// Moves every row one place towards the start. The last row keeps its old bytes.
    pub fn scroll_up(&mut self) {
        if self.rows < 2 {
            return;
        }
        let stride = self.stride();
        self.data.copy_within(stride.., 0);
        self.changed = true;
    }

    /// Moves every row one place towards the end. The first row keeps its old bytes.
    pub fn scroll_down(&mut self) {
        if self.rows < 2 {
            return;
        }
        let stride = self.stride();
        let len = self.data.len();
        self.data.copy_within(..len - stride, stride);
        self.changed = true;
    }

    pub fn row(&self, index: isize) -> Result<Row<'_>, Error> {
        let row = self.resolve(index)?;
        Ok(Row::new(self, row))
    }

    pub fn row_mut(&mut self, index: isize) -> Result<RowMut<'_>, Error> {
        let row = self.resolve(index)?;
        Ok(RowMut::new(self, row))
    }

    pub fn cell(&self, row: isize, col: usize) -> Result<Cell<'_>, Error> {
        self.row(row)?.cell(col)
    }

    pub fn cell_mut(&mut self, row: isize, col: usize) -> Result<CellMut<'_>, Error> {
        let row = self.resolve(row)?;
        if col >= self.cols() {
            return Err(Error::ColumnOutOfBounds(col));
        }
        Ok(CellMut::new(self, row, col))
    }

    /// Column type of a cell, or `None` when either index is out of range.
    pub fn cell_type(&self, row: usize, col: usize) -> Option<CellType> {
        if row >= self.rows {
            return None;
        }
        self.layout.cell_type(col)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Row<'_>> + '_ {
        (0..self.rows).map(move |row| Row::new(self, row))
    }

    /// Cell data without the header.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Length of the encoded form written by [`Table::write_to`].
    pub fn write_size(&self) -> usize {
        HEADER_SIZE + self.cols() + self.data.len()
    }

    fn header(&self) -> Header {
        // layout and resize cap both counts
        Header::new(self.cols() as u8, self.rows as u16)
    }

    /// Writes header, type codes and data in the table file layout.
    pub fn write_to(&self, mut writer: impl Write) -> Result<(), Error> {
        writer.write_all(self.header().as_bytes())?;
        writer.write_all(CellType::as_codes(self.types()))?;
        writer.write_all(&self.data)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(self.write_size())
            .map_err(|_| Error::Alloc)?;
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Replaces schema and data with a table read from at most `len` bytes of `reader`.
    ///
    /// On any failure the table is left empty.
    pub fn read_from(&mut self, reader: impl Read, len: usize) -> Result<(), Error> {
        let res = self.read_inner(reader.take(len as u64));
        if res.is_err() {
            self.reset();
        }
        res
    }

    fn read_inner(&mut self, mut reader: impl Read) -> Result<(), Error> {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;
        let header = Header::read_from_bytes(&header).map_err(|_| Error::InvalidHeader)?;
        if header.cols == 0 && header.rows() > 0 {
            return Err(Error::InvalidHeader);
        }

        let mut codes = vec![0u8; header.cols as usize];
        reader.read_exact(&mut codes)?;
        let types = CellType::from_codes(&codes)?;

        self.reset();
        self.init(types)?;
        let rows = header.rows() as usize;
        self.data
            .try_reserve_exact(rows * self.stride())
            .map_err(|_| Error::Alloc)?;
        self.data.resize(rows * self.stride(), 0);
        reader.read_exact(&mut self.data)?;
        self.rows = rows;
        trace!(rows, cols = self.cols(), "table read");
        Ok(())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut table = Self::new();
        table.read_from(bytes, bytes.len())?;
        Ok(table)
    }

    fn resolve(&self, index: isize) -> Result<usize, Error> {
        let row = if index < 0 {
            (self.rows as isize + index).max(0) as usize
        } else {
            index as usize
        };
        if row >= self.rows {
            return Err(Error::RowOutOfBounds(index));
        }
        Ok(row)
    }

    pub(crate) fn cell_bytes(&self, row: usize, col: usize) -> &[u8] {
        match self.layout.cell_range(row, col) {
            Some(range) => &self.data[range],
            None => &[],
        }
    }

    pub(crate) fn write_cell(&mut self, row: usize, col: usize, bytes: &[u8]) {
        let Some(range) = self.layout.cell_range(row, col) else {
            return;
        };
        let cell = &mut self.data[range];
        if cell != bytes {
            cell.copy_from_slice(bytes);
            self.changed = true;
        }
    }

    pub(crate) fn write_row(&mut self, row: usize, bytes: &[u8]) {
        let range = self.layout.row_range(row);
        let dst = &mut self.data[range];
        if dst != bytes {
            dst.copy_from_slice(bytes);
            self.changed = true;
        }
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = Row<'a>;
    type IntoIter = Box<dyn ExactSizeIterator<Item = Row<'a>> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::with_columns(&[CellType::Int16, CellType::Char8]).unwrap();
        table.append(&[10.into(), "ab".into()]).unwrap();
        table.append(&[20.into(), "cd".into()]).unwrap();
        table
    }

    fn first_column(table: &Table) -> Vec<i64> {
        table
            .iter()
            .map(|row| row.cell(0).unwrap().get_i64().unwrap())
            .collect()
    }

    #[test]
    fn test_init_identical_schema_keeps_data() {
        let mut table = sample();
        table.clear_changed();
        table.init(&[CellType::Int16, CellType::Char8]).unwrap();
        assert_eq!(table.rows(), 2);
        assert!(!table.changed());

        table.init(&[CellType::Int16]).unwrap();
        assert_eq!(table.rows(), 0);
        assert_eq!(table.stride(), 2);
        assert!(table.as_bytes().is_empty());
        assert!(table.changed());
    }

    #[test]
    fn test_resize_zero_fills() {
        let mut table = Table::with_columns(&[CellType::Uint32]).unwrap();
        table.resize(3).unwrap();
        assert_eq!(table.as_bytes(), &[0; 12]);
        table.cell_mut(2, 0).unwrap().set(9u32).unwrap();
        table.resize(2).unwrap();
        table.resize(3).unwrap();
        assert_eq!(table.cell(2, 0).unwrap().get_u64().unwrap(), 0);
        assert!(matches!(table.resize(70_000), Err(Error::TooManyRows(70_000))));
        assert!(matches!(Table::new().resize(1), Err(Error::NoColumns)));
    }

    #[test]
    fn test_limit_scrolls() {
        let mut table = Table::with_columns(&[CellType::Uint8]).unwrap();
        table.set_limit(Some(3));
        for i in 1..=5u8 {
            let row = table.add().unwrap();
            table.cell_mut(row as isize, 0).unwrap().set(i).unwrap();
        }
        assert_eq!(table.rows(), 3);
        assert_eq!(first_column(&table), [3, 4, 5]);

        table.set_limit(Some(0));
        assert_eq!(table.limit(), None);
        table.add().unwrap();
        assert_eq!(first_column(&table), [3, 4, 5, 0]);
    }

    #[test]
    fn test_remove() {
        let mut table = Table::with_columns(&[CellType::Int32]).unwrap();
        for i in 0..4 {
            table.append(&[Value::Int(i)]).unwrap();
        }
        table.remove(-1).unwrap();
        assert_eq!(first_column(&table), [0, 1, 2]);
        table.remove(0).unwrap();
        assert_eq!(first_column(&table), [1, 2]);
        assert!(matches!(table.remove(2), Err(Error::RowOutOfBounds(2))));
        table.remove(-1).unwrap();
        table.remove(-1).unwrap();
        assert!(matches!(table.remove(-1), Err(Error::Empty)));
        assert_eq!(table.rows(), 0);
    }

    #[test]
    fn test_negative_index_clamps() {
        let table = sample();
        assert_eq!(table.row(-1).unwrap().index(), 1);
        assert_eq!(table.row(-2).unwrap().index(), 0);
        assert_eq!(table.row(-10).unwrap().index(), 0);
        assert!(table.row(2).is_err());
        assert!(Table::new().row(-1).is_err());
    }

    #[test]
    fn test_dup_last_and_csv() {
        let mut table = sample();
        assert_eq!(table.to_csv(';', 2).unwrap(), "10;ab\r\n20;cd");
        assert_eq!(table.dup_last().unwrap(), 2);
        assert_eq!(table.rows(), 3);
        assert_eq!(table.row(2).unwrap().as_bytes(), table.row(1).unwrap().as_bytes());

        let mut single = Table::with_columns(&[CellType::Uint8]).unwrap();
        single.set_limit(Some(1));
        single.append(&[7u8.into()]).unwrap();
        single.dup_last().unwrap();
        assert_eq!(first_column(&single), [7]);
        assert!(matches!(Table::new().dup_last(), Err(Error::Empty)));
    }

    #[test]
    fn test_shift() {
        let mut table = sample();
        table.shift(&[30.into(), "ef".into()]).unwrap();
        assert_eq!(first_column(&table), [20, 30]);
        assert_eq!(table.cell(1, 1).unwrap().get_str().unwrap(), "ef");
        assert!(table.shift(&[Value::Int(1 << 20)]).is_err());
        assert_eq!(first_column(&table), [20, 30]);
    }

    #[test]
    fn test_scroll() {
        let mut table = Table::with_columns(&[CellType::Uint8]).unwrap();
        for i in 1..=3u8 {
            table.append(&[i.into()]).unwrap();
        }
        table.scroll_up();
        assert_eq!(first_column(&table), [2, 3, 3]);
        table.scroll_down();
        assert_eq!(first_column(&table), [2, 2, 3]);

        let mut empty = Table::with_columns(&[CellType::Uint8]).unwrap();
        empty.clear_changed();
        empty.scroll_up();
        empty.scroll_down();
        assert!(!empty.changed());
    }

    #[test]
    fn test_clear_and_reset() {
        let mut table = sample();
        table.clear();
        assert_eq!(table.rows(), 2);
        assert!(table.as_bytes().iter().all(|&b| b == 0));

        table.remove_all();
        assert_eq!(table.rows(), 0);
        assert_eq!(table.cols(), 2);

        table.reset();
        assert_eq!(table.cols(), 0);
        assert_eq!(table.cell_type(0, 0), None);
    }

    #[test]
    fn test_cell_type() {
        let table = sample();
        assert_eq!(table.cell_type(1, 1), Some(CellType::Char8));
        assert_eq!(table.cell_type(2, 0), None);
        assert_eq!(table.cell_type(0, 2), None);
    }

    #[test]
    fn test_binary_layout() {
        let table = sample();
        let bytes = table.to_bytes().unwrap();
        assert_eq!(bytes.len(), table.write_size());
        assert_eq!(&bytes[..5], &[2, 2, 0, 3, 12]);
        assert_eq!(&bytes[5..7], &10i16.to_le_bytes());
        assert_eq!(&bytes[7..16], b"ab\0\0\0\0\0\0\0");

        let read = Table::from_bytes(&bytes).unwrap();
        assert_eq!(read.types(), table.types());
        assert_eq!(read.as_bytes(), table.as_bytes());
    }

    #[test]
    fn test_short_read_leaves_table_empty() {
        let bytes = sample().to_bytes().unwrap();
        let mut table = sample();
        let err = table.read_from(&bytes[..], bytes.len() - 1).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(table.rows(), 0);
        assert_eq!(table.cols(), 0);

        assert!(matches!(
            Table::from_bytes(&[1, 0, 0, 0]),
            Err(Error::InvalidCellType(0))
        ));
        assert!(matches!(Table::from_bytes(&[0, 1, 0]), Err(Error::InvalidHeader)));
    }

    #[test]
    fn test_empty_schema_round_trips() {
        let bytes = Table::new().to_bytes().unwrap();
        assert_eq!(bytes, [0, 0, 0]);
        let table = Table::from_bytes(&bytes).unwrap();
        assert_eq!(table.cols(), 0);
        assert_eq!(table.rows(), 0);
    }
}
