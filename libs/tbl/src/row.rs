use crate::{
    cell::{Cell, CellMut},
    error::Error,
    table::Table,
    types::Value,
};

/// Read-only view of one row.
#[derive(Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    pub(crate) fn new(table: &'a Table, index: usize) -> Self {
        Self { table, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.table.cols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cell(&self, col: usize) -> Result<Cell<'a>, Error> {
        if col >= self.len() {
            return Err(Error::ColumnOutOfBounds(col));
        }
        Ok(Cell::new(self.table, self.index, col))
    }

    pub fn cells(&self) -> impl ExactSizeIterator<Item = Cell<'a>> + 'a {
        let (table, index) = (self.table, self.index);
        (0..table.cols()).map(move |col| Cell::new(table, index, col))
    }

    pub fn values(&self) -> Result<Vec<Value<'a>>, Error> {
        self.cells().map(|cell| cell.value()).collect()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        let range = self.table.layout().row_range(self.index);
        &self.table.as_bytes()[range]
    }
}

impl std::fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.cells()).finish()
    }
}

/// Mutable view of one row.
pub struct RowMut<'a> {
    table: &'a mut Table,
    index: usize,
}

impl<'a> RowMut<'a> {
    pub(crate) fn new(table: &'a mut Table, index: usize) -> Self {
        Self { table, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_row(&self) -> Row<'_> {
        Row::new(self.table, self.index)
    }

    pub fn cell_mut(&mut self, col: usize) -> Result<CellMut<'_>, Error> {
        if col >= self.table.cols() {
            return Err(Error::ColumnOutOfBounds(col));
        }
        Ok(CellMut::new(self.table, self.index, col))
    }

    /// Writes `values` left to right. Columns past the end of `values` keep their contents.
    ///
    /// Nothing is written if any value fails to convert.
    pub fn write(&mut self, values: &[Value<'_>]) -> Result<(), Error> {
        let mut row = self.as_row().as_bytes().to_vec();
        self.table.layout().encode_into(values, &mut row)?;
        self.table.write_row(self.index, &row);
        Ok(())
    }
}
