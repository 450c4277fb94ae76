use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned, byteorder::little_endian::U16,
};

/// Size of the fixed part of the header; the column type codes follow it.
pub const HEADER_SIZE: usize = 3;

/// Fixed prefix shared by exported tables and table files.
#[derive(FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct Header {
    pub cols: u8,
    pub rows: U16,
}

impl Header {
    /// Byte offset of the row count, rewritten in place on every append.
    pub const ROWS_OFFSET: u64 = 1;

    pub fn new(cols: u8, rows: u16) -> Self {
        Self {
            cols,
            rows: U16::new(rows),
        }
    }

    pub fn rows(&self) -> u16 {
        self.rows.get()
    }

    /// Offset of the first data byte: header, then one code per column.
    pub fn data_offset(&self) -> u64 {
        (HEADER_SIZE + self.cols as usize) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = Header::new(2, 0x0102);
        assert_eq!(header.as_bytes(), &[2, 0x02, 0x01]);
        assert_eq!(size_of::<Header>(), HEADER_SIZE);
        assert_eq!(Header::read_from_bytes(&[2, 0x02, 0x01]).unwrap(), header);
        assert_eq!(header.data_offset(), 5);
    }
}
