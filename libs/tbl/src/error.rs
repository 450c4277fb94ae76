use std::io;

use thiserror::Error;

use crate::types::CellType;

#[derive(Error, Debug, miette::Diagnostic)]
pub enum Error {
    #[error("io {0}")]
    #[diagnostic(code(tbl::io))]
    Io(#[from] io::Error),

    #[error("allocation failed")]
    #[diagnostic(
        code(tbl::alloc),
        help("the table buffer could not grow; free memory or lower the row count")
    )]
    Alloc,

    #[error("too many columns: {0}")]
    #[diagnostic(code(tbl::too_many_columns), help("a table holds at most 255 columns"))]
    TooManyColumns(usize),

    #[error("too many rows: {0}")]
    #[diagnostic(code(tbl::too_many_rows), help("a table holds at most 65535 rows"))]
    TooManyRows(usize),

    #[error("table has no columns")]
    #[diagnostic(code(tbl::no_columns), help("call init with a schema first"))]
    NoColumns,

    #[error("table is empty")]
    #[diagnostic(code(tbl::empty))]
    Empty,

    #[error("row {0} out of bounds")]
    #[diagnostic(code(tbl::row_out_of_bounds))]
    RowOutOfBounds(isize),

    #[error("column {0} out of bounds")]
    #[diagnostic(code(tbl::column_out_of_bounds))]
    ColumnOutOfBounds(usize),

    #[error("invalid cell type code {0}")]
    #[diagnostic(
        code(tbl::invalid_cell_type),
        help("type codes run from 1 (Int8) to 17 (Char256)")
    )]
    InvalidCellType(u8),

    #[error("unknown cell type {0:?}")]
    #[diagnostic(code(tbl::unknown_type_name))]
    UnknownTypeName(String),

    #[error("invalid table header")]
    #[diagnostic(
        code(tbl::invalid_header),
        help("the file is missing its header or declares zero columns")
    )]
    InvalidHeader,

    #[error("cannot convert between a {ty} cell and {value}")]
    #[diagnostic(code(tbl::type_mismatch))]
    TypeMismatch { ty: CellType, value: &'static str },

    #[error("value out of range for a {0} cell")]
    #[diagnostic(code(tbl::out_of_range))]
    OutOfRange(CellType),

    #[error("cannot parse {input:?} as {ty}")]
    #[diagnostic(code(tbl::parse_value))]
    ParseValue { ty: CellType, input: String },

    #[error("text cell is not utf-8")]
    #[diagnostic(code(tbl::utf8))]
    Utf8(#[from] std::str::Utf8Error),

    #[error("csv {0}")]
    #[diagnostic(code(tbl::csv))]
    Csv(#[from] csv::Error),

    #[error("invalid separator {0:?}")]
    #[diagnostic(code(tbl::invalid_separator), help("csv separators must be a single ascii character"))]
    InvalidSeparator(char),

    #[error("format {0}")]
    #[diagnostic(code(tbl::fmt))]
    Fmt(#[from] std::fmt::Error),
}
