//! Tag byte layout and the bit twiddling shared by the encoder and the reader.

pub const STRING: u8 = 0 << 5;
pub const BOOLEAN: u8 = 1 << 5;
pub const INTEGER: u8 = 2 << 5;
pub const FLOAT: u8 = 3 << 5;
pub const CODE: u8 = 4 << 5;
pub const BINARY: u8 = 5 << 5;
pub const CONTAINER: u8 = 6 << 5;

pub const MAJOR_MASK: u8 = 0b1110_0000;
pub const META_MASK: u8 = 0b0001_1111;

pub const CONT_OBJ: u8 = 1 << 4;
pub const CONT_OPEN: u8 = 1 << 3;
pub const CONT_ARR: u8 = 1 << 2;
pub const CONT_CLOSE: u8 = 1 << 1;

pub const NEGATIVE: u8 = 1 << 4;
pub const INT_LEN_MASK: u8 = 0b1111;

/// Longest string or binary payload, and largest code, that fits the 13 bit length field.
pub const MAX_DATA_LEN: usize = 0x1fff;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Container {
    Object,
    Array,
}

impl Container {
    pub const fn open_char(self) -> char {
        match self {
            Container::Object => '{',
            Container::Array => '[',
        }
    }

    pub const fn close_char(self) -> char {
        match self {
            Container::Object => '}',
            Container::Array => ']',
        }
    }

    pub const fn open_tag(self) -> u8 {
        CONTAINER | self.flag() | CONT_OPEN
    }

    pub const fn close_tag(self) -> u8 {
        CONTAINER | self.flag() | CONT_CLOSE
    }

    const fn flag(self) -> u8 {
        match self {
            Container::Object => CONT_OBJ,
            Container::Array => CONT_ARR,
        }
    }
}

#[inline]
pub const fn major(tag: u8) -> u8 {
    tag & MAJOR_MASK
}

#[inline]
pub const fn meta(tag: u8) -> u8 {
    tag & META_MASK
}

/// Upper five bits of a 13 bit length or code.
#[inline]
pub const fn msb5(value: u16) -> u8 {
    ((value >> 8) as u8) & META_MASK
}

#[inline]
pub const fn lsb(value: u16) -> u8 {
    (value & 0xff) as u8
}

#[inline]
pub const fn unpack13(msb5: u8, lsb: u8) -> u16 {
    (((msb5 & META_MASK) as u16) << 8) | lsb as u16
}

#[inline]
pub const fn int_tag(negative: bool, len: u8) -> u8 {
    INTEGER | if negative { NEGATIVE } else { 0 } | (len & INT_LEN_MASK)
}

/// Number of little-endian bytes needed to hold `magnitude`; zero needs none.
#[inline]
pub const fn magnitude_len(magnitude: u64) -> u8 {
    ((u64::BITS - magnitude.leading_zeros()).div_ceil(8)) as u8
}

#[inline]
pub const fn is_close(tag: u8) -> bool {
    major(tag) == CONTAINER && tag & CONT_CLOSE != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude_len() {
        assert_eq!(magnitude_len(0), 0);
        assert_eq!(magnitude_len(1), 1);
        assert_eq!(magnitude_len(0xff), 1);
        assert_eq!(magnitude_len(0x100), 2);
        assert_eq!(magnitude_len(0xffff_ffff), 4);
        assert_eq!(magnitude_len(0x1_0000_0000), 5);
        assert_eq!(magnitude_len(u64::MAX), 8);
    }

    #[test]
    fn test_pack_13_bits() {
        let len = 0x1abc;
        assert_eq!(unpack13(msb5(len), lsb(len)), len);
        assert_eq!(msb5(0xffff), 0x1f);
    }

    #[test]
    fn test_container_tags() {
        assert_eq!(Container::Object.open_tag(), 0b1101_1000);
        assert_eq!(Container::Object.close_tag(), 0b1101_0010);
        assert_eq!(Container::Array.open_tag(), 0b1100_1100);
        assert_eq!(Container::Array.close_tag(), 0b1100_0110);
        assert!(is_close(Container::Array.close_tag()));
        assert!(!is_close(Container::Array.open_tag()));
        assert!(!is_close(INTEGER | 0b10));
    }
}
