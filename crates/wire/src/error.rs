//! Wire codec errors.

use thiserror::Error;

/// Errors produced while decoding wire messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Input ended before the field was complete.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A field held a value the format does not allow.
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),

    /// A length prefix exceeds the representable range.
    #[error("length overflow")]
    LengthOverflow,

    /// Decoding finished with bytes left over.
    #[error("trailing bytes after message")]
    TrailingBytes,
}
