//! Single pass JSON rendering of packed streams.
//!
//! The renderer never builds a tree. It keeps a stack of open container kinds and a flag telling
//! whether the next token inside an object is a key or a value.

use alloc::string::String;
use core::fmt::Write;
use smallvec::SmallVec;
use tracing::trace;

use crate::{
    error::Error,
    reader::{Container, Reader, Token},
    tag,
};

const INDENT: &str = "   ";
const NEWLINE: &str = "\r\n";

/// Renders packed streams as JSON text.
///
/// By default the renderer trusts the producer: it stops quietly at a truncated token, skips
/// unknown tags and does not check that closes match opens. [`Renderer::checked`] turns those
/// conditions into errors.
#[derive(Clone, Copy, Debug, Default)]
pub struct Renderer {
    pretty: bool,
    checked: bool,
}

impl Renderer {
    pub const fn new() -> Self {
        Self {
            pretty: false,
            checked: false,
        }
    }

    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub const fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn render_to_string(&self, bytes: &[u8]) -> Result<String, Error> {
        let mut out = String::new();
        self.render(bytes, &mut out)?;
        Ok(out)
    }

    pub fn render(&self, bytes: &[u8], out: &mut impl Write) -> Result<(), Error> {
        let mut reader = Reader::new(bytes);
        let mut stack: SmallVec<[Container; 16]> = SmallVec::new();
        let mut expect_key = true;
        let mut just_opened = false;

        loop {
            let offset = reader.offset();
            let token = match reader.next() {
                None => break,
                Some(Ok(token)) => token,
                Some(Err(err @ Error::UnexpectedEof { .. })) => {
                    if self.checked {
                        return Err(err);
                    }
                    trace!(offset, "stream truncated, stopping");
                    break;
                }
                Some(Err(err)) => {
                    if self.checked {
                        return Err(err);
                    }
                    trace!(?err, "skipping token");
                    continue;
                }
            };
            let in_object = stack.last() == Some(&Container::Object);
            let after_open =
                core::mem::replace(&mut just_opened, matches!(token, Token::Open(_)));

            if self.checked && in_object {
                match token {
                    Token::Str(_) | Token::Code(_) if expect_key => {}
                    Token::Close(_) if expect_key => {}
                    Token::Close(_) => return Err(Error::DanglingKey { offset }),
                    _ if expect_key => return Err(Error::InvalidKey { offset }),
                    _ => {}
                }
            }

            if self.pretty && expect_key {
                let close = matches!(token, Token::Close(_));
                if close && !after_open {
                    out.write_str(NEWLINE)?;
                }
                for _ in 0..stack.len().saturating_sub(close as usize) {
                    out.write_str(INDENT)?;
                }
            }

            match token {
                Token::Open(container) => {
                    stack.push(container);
                    out.write_char(container.open_char())?;
                    if self.pretty {
                        out.write_str(NEWLINE)?;
                    }
                    expect_key = true;
                    continue;
                }
                Token::Close(container) => {
                    match stack.pop() {
                        Some(open) if open == container => {}
                        Some(_) if self.checked => return Err(Error::MismatchedClose { offset }),
                        None if self.checked => return Err(Error::UnbalancedClose { offset }),
                        _ => {}
                    }
                    out.write_char(container.close_char())?;
                    if reader.peek_tag().is_some_and(|t| !tag::is_close(t)) {
                        self.separator(out)?;
                    }
                    expect_key = true;
                    continue;
                }
                Token::Str(bytes) => write_quoted(out, bytes)?,
                Token::Bool(value) => out.write_str(if value { "true" } else { "false" })?,
                Token::Int {
                    negative,
                    magnitude,
                } => {
                    if negative {
                        out.write_char('-')?;
                    }
                    write!(out, "{magnitude}")?;
                }
                Token::Float { value, .. } if !value.is_finite() => out.write_str("null")?,
                Token::Float { value, decimals } => write!(out, "{:.*}", decimals as usize, value)?,
                Token::Code(code) => write!(out, "\"#{code}\"")?,
                Token::Binary(bytes) => write!(out, "\"<bin:{}>\"", bytes.len())?,
            }

            let more = reader.peek_tag().is_some_and(|t| !tag::is_close(t));
            if in_object {
                if expect_key {
                    out.write_char(':')?;
                } else if more {
                    self.separator(out)?;
                }
                expect_key = !expect_key;
            } else if more {
                self.separator(out)?;
            }
        }

        if self.checked && !stack.is_empty() {
            return Err(Error::Unclosed { depth: stack.len() });
        }
        if self.pretty {
            out.write_str(NEWLINE)?;
        }
        Ok(())
    }

    fn separator(&self, out: &mut impl Write) -> Result<(), Error> {
        out.write_char(',')?;
        if self.pretty {
            out.write_str(NEWLINE)?;
        }
        Ok(())
    }
}

/// Compact rendering in trusting mode.
pub fn to_json(bytes: &[u8]) -> String {
    Renderer::new().render_to_string(bytes).unwrap_or_default()
}

fn write_quoted(out: &mut impl Write, bytes: &[u8]) -> Result<(), Error> {
    out.write_char('"')?;
    for chunk in bytes.utf8_chunks() {
        for c in chunk.valid().chars() {
            match c {
                '"' => out.write_str("\\\"")?,
                '\\' => out.write_str("\\\\")?,
                '\n' => out.write_str("\\n")?,
                '\r' => out.write_str("\\r")?,
                '\t' => out.write_str("\\t")?,
                c if (c as u32) < 0x20 => write!(out, "\\u{:04x}", c as u32)?,
                c => out.write_char(c)?,
            }
        }
        if !chunk.invalid().is_empty() {
            out.write_char(char::REPLACEMENT_CHARACTER)?;
        }
    }
    out.write_char('"')?;
    Ok(())
}
