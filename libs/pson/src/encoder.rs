//! Append-only builder for packed streams.
//!
//! ```
//! use pson::Encoder;
//!
//! let mut enc = Encoder::new();
//! enc.open_object().key("n").add(5).close_object();
//! assert_eq!(enc.to_json(), r#"{"n":5}"#);
//! ```

use alloc::{string::String, vec::Vec};
use tracing::debug;

use crate::{
    error::Error,
    render,
    tag::{self, Container, MAX_DATA_LEN},
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub const MAX_DATA_LEN: usize = MAX_DATA_LEN;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn reserve(&mut self, additional: usize) {
        self.buf.reserve(additional);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Appends another encoder's tokens verbatim.
    pub fn concat(&mut self, other: &Encoder) -> &mut Self {
        self.buf.extend_from_slice(&other.buf);
        self
    }

    /// Appends any value with a natural packed representation.
    pub fn add<T: Encode>(&mut self, value: T) -> &mut Self {
        value.encode(self);
        self
    }

    pub fn uint(&mut self, value: u64) -> &mut Self {
        self.magnitude(false, value)
    }

    /// Integers are stored sign-magnitude: the sign lives in the tag, the bytes hold `|value|`.
    pub fn int(&mut self, value: i64) -> &mut Self {
        self.magnitude(value < 0, value.unsigned_abs())
    }

    fn magnitude(&mut self, negative: bool, magnitude: u64) -> &mut Self {
        let len = tag::magnitude_len(magnitude);
        self.buf.push(tag::int_tag(negative, len));
        self.buf
            .extend_from_slice(&magnitude.to_le_bytes()[..len as usize]);
        self
    }

    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.buf.push(tag::BOOLEAN | value as u8);
        self
    }

    /// Floats always travel as 4 byte singles; `decimals` (0..=31) only affects rendering.
    pub fn float(&mut self, value: f32, decimals: u8) -> &mut Self {
        self.buf.push(tag::FLOAT | (decimals & tag::META_MASK));
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn double(&mut self, value: f64, decimals: u8) -> &mut Self {
        self.float(value as f32, decimals)
    }

    /// Strings longer than [`MAX_DATA_LEN`] bytes are cut at that length.
    pub fn str(&mut self, value: &str) -> &mut Self {
        self.str_bytes(value.as_bytes())
    }

    pub fn str_bytes(&mut self, value: &[u8]) -> &mut Self {
        let len = value.len().min(MAX_DATA_LEN);
        if len < value.len() {
            debug!(len = value.len(), "truncating string to {MAX_DATA_LEN} bytes");
        }
        self.begin_str(len);
        self.buf.extend_from_slice(&value[..len]);
        self
    }

    pub fn key(&mut self, key: &str) -> &mut Self {
        self.str(key)
    }

    /// Writes a string header; the caller follows it with exactly `len` bytes via [`Encoder::raw`].
    pub fn begin_str(&mut self, len: usize) -> &mut Self {
        self.length_header(tag::STRING, len.min(MAX_DATA_LEN) as u16);
        self
    }

    /// Small enumerated constant. Only the low 13 bits are kept.
    pub fn code(&mut self, code: u16) -> &mut Self {
        self.length_header(tag::CODE, code);
        self
    }

    pub fn binary(&mut self, data: &[u8]) -> Result<&mut Self, Error> {
        self.begin_binary(data.len())?;
        self.buf.extend_from_slice(data);
        Ok(self)
    }

    pub fn begin_binary(&mut self, len: usize) -> Result<&mut Self, Error> {
        if len > MAX_DATA_LEN {
            return Err(Error::DataTooLong { len });
        }
        self.length_header(tag::BINARY, len as u16);
        Ok(self)
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    fn length_header(&mut self, major: u8, len: u16) {
        self.buf.push(major | tag::msb5(len));
        self.buf.push(tag::lsb(len));
    }

    pub fn open(&mut self, container: Container) -> &mut Self {
        self.buf.push(container.open_tag());
        self
    }

    pub fn close(&mut self, container: Container) -> &mut Self {
        self.buf.push(container.close_tag());
        self
    }

    pub fn open_object(&mut self) -> &mut Self {
        self.open(Container::Object)
    }

    pub fn close_object(&mut self) -> &mut Self {
        self.close(Container::Object)
    }

    pub fn open_array(&mut self) -> &mut Self {
        self.open(Container::Array)
    }

    pub fn close_array(&mut self) -> &mut Self {
        self.close(Container::Array)
    }

    pub fn to_json(&self) -> String {
        render::to_json(&self.buf)
    }
}

impl AsRef<[u8]> for Encoder {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl From<Encoder> for Vec<u8> {
    fn from(enc: Encoder) -> Self {
        enc.buf
    }
}

pub trait Encode {
    fn encode(&self, enc: &mut Encoder);
}

macro_rules! impl_encode_uint {
    ($($ty:ty),+) => {
        $(
            impl Encode for $ty {
                fn encode(&self, enc: &mut Encoder) {
                    enc.uint(*self as u64);
                }
            }
        )+
    };
}

macro_rules! impl_encode_int {
    ($($ty:ty),+) => {
        $(
            impl Encode for $ty {
                fn encode(&self, enc: &mut Encoder) {
                    enc.int(*self as i64);
                }
            }
        )+
    };
}

impl_encode_uint!(u8, u16, u32, u64, usize);
impl_encode_int!(i8, i16, i32, i64, isize);

impl Encode for bool {
    fn encode(&self, enc: &mut Encoder) {
        enc.bool(*self);
    }
}

impl Encode for f32 {
    fn encode(&self, enc: &mut Encoder) {
        enc.float(*self, 4);
    }
}

impl Encode for f64 {
    fn encode(&self, enc: &mut Encoder) {
        enc.double(*self, 4);
    }
}

impl Encode for str {
    fn encode(&self, enc: &mut Encoder) {
        enc.str(self);
    }
}

impl Encode for String {
    fn encode(&self, enc: &mut Encoder) {
        enc.str(self);
    }
}

impl Encode for Encoder {
    fn encode(&self, enc: &mut Encoder) {
        enc.concat(self);
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, enc: &mut Encoder) {
        (**self).encode(enc);
    }
}
