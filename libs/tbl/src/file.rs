//! Tables stored directly in a file, one row appended at a time.

use std::{
    ffi::OsString,
    fmt,
    fs::{self, File, OpenOptions},
    io::{self, BufReader, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use zerocopy::{FromBytes, IntoBytes, byteorder::little_endian::U16};

use crate::{
    error::Error,
    header::{HEADER_SIZE, Header},
    layout::RowLayout,
    table::Table,
    text,
    types::{CellType, Value},
};

/// Header of a table file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub cols: u8,
    pub rows: u16,
    pub types: Vec<CellType>,
}

impl TableInfo {
    pub fn layout(&self) -> Result<RowLayout, Error> {
        RowLayout::new(&self.types)
    }

    fn header(&self) -> Header {
        Header::new(self.cols, self.rows)
    }

    /// Offset of the first byte past the last stored row.
    fn data_end(&self, stride: usize) -> u64 {
        self.header().data_offset() + (self.rows as usize * stride) as u64
    }

    fn read(reader: &mut impl Read) -> Result<Self, Error> {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;
        let header = Header::read_from_bytes(&header).map_err(|_| Error::InvalidHeader)?;
        if header.cols == 0 {
            return Err(Error::InvalidHeader);
        }
        let mut codes = vec![0u8; header.cols as usize];
        reader.read_exact(&mut codes)?;
        let types = CellType::from_codes(&codes)?.to_vec();
        Ok(Self {
            cols: header.cols,
            rows: header.rows(),
            types,
        })
    }
}

/// A table kept on disk, optionally capped at a maximum row count.
///
/// Every call opens the file, so several handles may point at the same path as long as they
/// are not used concurrently.
#[derive(Clone, Debug)]
pub struct FileTable {
    path: PathBuf,
    max_rows: Option<u16>,
}

impl FileTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_rows: None,
        }
    }

    pub fn with_max_rows(mut self, max_rows: u16) -> Self {
        self.set_max_rows(Some(max_rows));
        self
    }

    /// `None` or `Some(0)` lets the file grow up to the row limit of the format.
    pub fn set_max_rows(&mut self, max_rows: Option<u16>) {
        self.max_rows = max_rows.filter(|&max| max > 0);
    }

    pub fn max_rows(&self) -> Option<u16> {
        self.max_rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut path = OsString::from(self.path.as_os_str());
        path.push(".tmp");
        PathBuf::from(path)
    }

    pub fn info(&self) -> Result<TableInfo, Error> {
        let mut file = BufReader::new(File::open(&self.path)?);
        TableInfo::read(&mut file)
    }

    /// Makes sure the file holds a table with exactly `types`.
    ///
    /// A file with the same schema is left alone. A missing, unreadable or mismatched file is
    /// recreated without rows.
    pub fn init(&self, types: &[CellType]) -> Result<(), Error> {
        if types.is_empty() {
            return Err(Error::NoColumns);
        }
        let layout = RowLayout::new(types)?;
        match self.info() {
            Ok(info) if info.types == layout.types() => {
                debug!(path = ?self.path, rows = info.rows, "reusing table file");
                return Ok(());
            }
            Ok(info) => {
                warn!(path = ?self.path, found = ?info.types, expected = ?types, "schema mismatch, recreating table file");
            }
            Err(Error::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = ?self.path, "creating table file");
            }
            Err(err @ (Error::InvalidHeader | Error::InvalidCellType(_))) => {
                warn!(path = ?self.path, ?err, "invalid table file, recreating");
            }
            Err(Error::Io(err)) if err.kind() == io::ErrorKind::UnexpectedEof => {
                warn!(path = ?self.path, "truncated table file, recreating");
            }
            Err(err) => return Err(err),
        }

        let mut file = File::create(&self.path)?;
        file.write_all(Header::new(types.len() as u8, 0).as_bytes())?;
        file.write_all(CellType::as_codes(types))?;
        file.flush()?;
        Ok(())
    }

    /// Writes one row after the last stored one and bumps the row count.
    ///
    /// Values convert to their column type before the file is touched, so a value that does
    /// not fit leaves the file as it was. When the row count passes the maximum the oldest
    /// rows are evicted.
    pub fn append(&self, values: &[Value<'_>]) -> Result<(), Error> {
        let mut file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        let mut info = TableInfo::read(&mut file)?;
        let layout = info.layout()?;
        let row = layout.encode_row(values)?;
        if info.rows == u16::MAX {
            return Err(Error::TooManyRows(Table::MAX_ROWS + 1));
        }

        file.seek(SeekFrom::Start(info.data_end(layout.stride())))?;
        file.write_all(&row)?;
        info.rows += 1;
        file.seek(SeekFrom::Start(Header::ROWS_OFFSET))?;
        file.write_all(U16::new(info.rows).as_bytes())?;
        file.flush()?;
        drop(file);

        match self.max_rows {
            Some(max) if info.rows > max => self.evict(&info, &layout, max),
            _ => Ok(()),
        }
    }

    /// Rewrites the file keeping only the newest `keep` rows.
    fn evict(&self, info: &TableInfo, layout: &RowLayout, keep: u16) -> Result<(), Error> {
        let dropped = info.rows - keep;
        let tmp = self.tmp_path();
        info!(path = ?self.path, dropped, kept = keep, "evicting oldest rows");

        if let Err(err) = self.write_kept(info, layout, keep, &tmp) {
            if let Err(cleanup_err) = fs::remove_file(&tmp) {
                debug!(?tmp, ?cleanup_err, "failed to remove temp file");
            }
            return Err(err);
        }
        fs::remove_file(&self.path)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn write_kept(
        &self,
        info: &TableInfo,
        layout: &RowLayout,
        keep: u16,
        tmp: &Path,
    ) -> Result<(), Error> {
        let stride = layout.stride() as u64;
        let first_kept = info.header().data_offset() + (info.rows - keep) as u64 * stride;
        let len = keep as u64 * stride;

        let mut src = File::open(&self.path)?;
        src.seek(SeekFrom::Start(first_kept))?;
        let mut dst = File::create(tmp)?;
        dst.write_all(Header::new(info.cols, keep).as_bytes())?;
        dst.write_all(CellType::as_codes(&info.types))?;
        let copied = io::copy(&mut src.take(len), &mut dst)?;
        if copied != len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        dst.sync_all()?;
        debug!(?tmp, bytes = copied, "wrote kept rows");
        Ok(())
    }

    /// Sets the stored row count to zero. Row bytes stay on disk until overwritten.
    pub fn remove_all(&self) -> Result<(), Error> {
        let mut file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        TableInfo::read(&mut file)?;
        file.seek(SeekFrom::Start(Header::ROWS_OFFSET))?;
        file.write_all(U16::new(0).as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Reads the whole file into memory.
    pub fn load(&self) -> Result<Table, Error> {
        let file = File::open(&self.path)?;
        let len = file.metadata()?.len() as usize;
        let mut table = Table::new();
        table.read_from(BufReader::new(file), len)?;
        Ok(table)
    }

    /// Reads one row into a single-row table. Negative indices count from the end.
    pub fn read_row(&self, index: isize) -> Result<Table, Error> {
        let mut file = BufReader::new(File::open(&self.path)?);
        let info = TableInfo::read(&mut file)?;
        let rows = info.rows as isize;
        let row = if index < 0 { (rows + index).max(0) } else { index };
        if row >= rows {
            return Err(Error::RowOutOfBounds(index));
        }

        let mut table = Table::with_columns(&info.types)?;
        table.resize(1)?;
        let offset = info.header().data_offset() + (row as usize * table.stride()) as u64;
        file.seek(SeekFrom::Start(offset))?;
        let mut bytes = vec![0u8; table.stride()];
        file.read_exact(&mut bytes)?;
        table.write_row(0, &bytes);
        table.clear_changed();
        Ok(table)
    }

    /// Streams the same listing as [`Table::dump`] without loading the file.
    pub fn dump(&self, out: &mut impl fmt::Write) -> Result<(), Error> {
        let mut file = BufReader::new(File::open(&self.path)?);
        let info = TableInfo::read(&mut file)?;
        let layout = info.layout()?;
        text::write_dump_header(out, &info.types)?;

        let mut row = vec![0u8; layout.stride()];
        for index in 0..info.rows as usize {
            file.read_exact(&mut row)?;
            text::write_dump_row(out, &layout, index, &row)?;
        }
        Ok(())
    }
}
