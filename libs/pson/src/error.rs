use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(miette::Diagnostic))]
pub enum Error {
    #[error("unexpected end of stream at offset {offset}")]
    #[cfg_attr(
        feature = "std",
        diagnostic(
            code(pson::unexpected_eof),
            help("a token claimed more bytes than the stream contains")
        )
    )]
    UnexpectedEof { offset: usize },

    #[error("unknown tag {tag:#04x} at offset {offset}")]
    #[cfg_attr(
        feature = "std",
        diagnostic(code(pson::unknown_type), help("major type 7 is not assigned"))
    )]
    UnknownType { tag: u8, offset: usize },

    #[error("container closed without being opened at offset {offset}")]
    #[cfg_attr(
        feature = "std",
        diagnostic(
            code(pson::unbalanced_close),
            help("every close token must match an earlier open token")
        )
    )]
    UnbalancedClose { offset: usize },

    #[error("container closed with the wrong kind at offset {offset}")]
    #[cfg_attr(
        feature = "std",
        diagnostic(
            code(pson::mismatched_close),
            help("an object must be closed by an object close, an array by an array close")
        )
    )]
    MismatchedClose { offset: usize },

    #[error("object key at offset {offset} is not a string or code")]
    #[cfg_attr(feature = "std", diagnostic(code(pson::invalid_key)))]
    InvalidKey { offset: usize },

    #[error("object key at offset {offset} has no value")]
    #[cfg_attr(feature = "std", diagnostic(code(pson::dangling_key)))]
    DanglingKey { offset: usize },

    #[error("integer at offset {offset} claims {len} bytes")]
    #[cfg_attr(
        feature = "std",
        diagnostic(code(pson::int_too_wide), help("integers carry at most 8 magnitude bytes"))
    )]
    IntTooWide { len: u8, offset: usize },

    #[error("{depth} container(s) left open at end of stream")]
    #[cfg_attr(
        feature = "std",
        diagnostic(code(pson::unclosed), help("the stream was cut before its closing tokens"))
    )]
    Unclosed { depth: usize },

    #[error("data length {len} exceeds the 13 bit limit")]
    #[cfg_attr(
        feature = "std",
        diagnostic(
            code(pson::data_too_long),
            help("binary payloads are limited to 8191 bytes")
        )
    )]
    DataTooLong { len: usize },

    #[error("formatter error")]
    #[cfg_attr(feature = "std", diagnostic(code(pson::fmt)))]
    Fmt,
}

impl From<core::fmt::Error> for Error {
    fn from(_: core::fmt::Error) -> Self {
        Error::Fmt
    }
}
