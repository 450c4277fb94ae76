//! Typed tables with a fixed row stride.
//!
//! A [`Table`] is a column schema plus one contiguous byte buffer holding `rows × stride` bytes.
//! Every cell has a fixed width decided by its [`CellType`], so cell `(row, col)` always lives at
//! `row × stride + offset[col]`. The same layout is used on disk, prefixed by a small header:
//!
//! ```ignore
//! | cols: u8 | rows: u16 (le) | types: [u8; cols] | data: [u8; rows × stride] |
//! ```
//!
//! [`FileTable`] appends rows to such a file directly, evicting the oldest rows once a maximum is
//! reached.

mod cell;
mod error;
pub mod file;
mod header;
pub mod layout;
mod row;
pub mod table;
mod text;
pub mod types;

pub use cell::{Cell, CellMut};
pub use error::Error;
pub use file::{FileTable, TableInfo};
pub use header::{HEADER_SIZE, Header};
pub use layout::RowLayout;
pub use row::{Row, RowMut};
pub use table::Table;
pub use types::{CellType, Value};
