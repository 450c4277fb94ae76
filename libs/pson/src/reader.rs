//! Forward-only token reader.

use crate::{error::Error, tag};

pub use crate::tag::Container;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Token<'a> {
    Open(Container),
    Close(Container),
    Str(&'a [u8]),
    Bool(bool),
    Int { negative: bool, magnitude: u64 },
    Float { value: f32, decimals: u8 },
    Code(u16),
    Binary(&'a [u8]),
}

impl Token<'_> {
    /// Integer value when it fits an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Token::Int {
                negative: false,
                magnitude,
            } => i64::try_from(magnitude).ok(),
            Token::Int {
                negative: true,
                magnitude,
            } => 0i64.checked_sub_unsigned(magnitude),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Token::Str(bytes) => core::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }
}

/// Iterates the tokens of a packed stream.
///
/// Running past the end of the buffer yields [`Error::UnexpectedEof`] once and then ends the
/// iteration. Unknown tags and over-wide integers yield an error but leave the reader positioned
/// after the offending token, so a lenient caller can keep going.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Byte offset of the next token.
    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn peek_tag(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn take(&mut self, len: usize, offset: usize) -> Result<&'a [u8], Error> {
        let end = self.pos.checked_add(len).filter(|&end| end <= self.buf.len());
        let Some(end) = end else {
            self.pos = self.buf.len();
            return Err(Error::UnexpectedEof { offset });
        };
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn take_byte(&mut self, offset: usize) -> Result<u8, Error> {
        self.take(1, offset).map(|b| b[0])
    }

    fn read_token(&mut self) -> Result<Token<'a>, Error> {
        let offset = self.pos;
        let tag_byte = self.take_byte(offset)?;
        let meta = tag::meta(tag_byte);
        match tag::major(tag_byte) {
            tag::CONTAINER => {
                let container = if meta & tag::CONT_OBJ != 0 {
                    Container::Object
                } else {
                    Container::Array
                };
                if meta & tag::CONT_OPEN != 0 {
                    Ok(Token::Open(container))
                } else {
                    Ok(Token::Close(container))
                }
            }
            tag::STRING => {
                let len = tag::unpack13(meta, self.take_byte(offset)?);
                self.take(len as usize, offset).map(Token::Str)
            }
            tag::BOOLEAN => Ok(Token::Bool(meta & 1 != 0)),
            tag::INTEGER => {
                let len = meta & tag::INT_LEN_MASK;
                let bytes = self.take(len as usize, offset)?;
                if len > 8 {
                    return Err(Error::IntTooWide { len, offset });
                }
                let mut le = [0u8; 8];
                le[..bytes.len()].copy_from_slice(bytes);
                Ok(Token::Int {
                    negative: meta & tag::NEGATIVE != 0,
                    magnitude: u64::from_le_bytes(le),
                })
            }
            tag::FLOAT => {
                let bytes = self.take(4, offset)?;
                let value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                Ok(Token::Float {
                    value,
                    decimals: meta,
                })
            }
            tag::CODE => {
                let lsb = self.take_byte(offset)?;
                Ok(Token::Code(tag::unpack13(meta, lsb)))
            }
            tag::BINARY => {
                let len = tag::unpack13(meta, self.take_byte(offset)?);
                self.take(len as usize, offset).map(Token::Binary)
            }
            _ => Err(Error::UnknownType {
                tag: tag_byte,
                offset,
            }),
        }
    }
}

impl<'a> Iterator for Reader<'a> {
    type Item = Result<Token<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.buf.len() {
            return None;
        }
        Some(self.read_token())
    }
}
