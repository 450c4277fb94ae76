//! Packed object notation.
//!
//! A stream is a flat sequence of tokens. Every token starts with a tag byte `TTTMMMMM`:
//! three bits of major type and five bits of metadata whose meaning depends on the type.
//!
//! | Major | Type      | Metadata                              | Extra bytes                   |
//! |-------|-----------|---------------------------------------|-------------------------------|
//! | 0     | string    | bits 12..8 of the length              | length low byte, payload      |
//! | 1     | boolean   | bit 0 is the value                    | -                             |
//! | 2     | integer   | bit 4 negative, bits 3..0 byte count  | little-endian magnitude bytes |
//! | 3     | float     | decimals to display                   | 4 bytes IEEE-754 single       |
//! | 4     | code      | bits 12..8 of the code                | code low byte                 |
//! | 5     | binary    | bits 12..8 of the length              | length low byte, payload      |
//! | 6     | container | object/open/array/close flags         | -                             |
//!
//! Containers carry no length. Nesting is recovered by the reader keeping its own stack,
//! which lets a [`Renderer`] turn a stream into JSON text in one forward pass.
#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

extern crate alloc;

pub mod encoder;
pub mod error;
pub mod reader;
pub mod render;
pub mod tag;

pub use encoder::{Encode, Encoder};
pub use error::Error;
pub use reader::{Container, Reader, Token};
pub use render::{Renderer, to_json};
