//! Error types for the codec and the error-isolating stage.

/// A byte stream that cannot be decoded as a message.
///
/// Every variant means the input is truncated or internally inconsistent;
/// decode never papers over one of these with default values. The caller
/// owns the decision of what to do with the bad bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The stream ended before a complete field could be read.
    #[error("unexpected end of input: needed {needed} more bytes, {remaining} available")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// A presence flag held something other than 0 or 1.
    #[error("invalid presence marker {value:#04x} at offset {offset}")]
    InvalidMarker { value: u8, offset: usize },

    /// A string field did not hold valid UTF-8.
    #[error("invalid utf-8 in string field at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// A dictionary key was encoded as absent; keys must always be present.
    #[error("absent dictionary key at offset {offset}")]
    AbsentKey { offset: usize },

    /// Bytes were left over after a whole-buffer decode.
    #[error("{remaining} trailing bytes after message")]
    TrailingBytes { remaining: usize },

    /// Encode-side: a field or collection exceeds the u32 wire length.
    #[error("field of {len} bytes exceeds u32 wire length")]
    FieldTooLong { len: usize },
}

/// A failure raised by a caller-supplied transformation.
///
/// The default stage policy suppresses only [`TransformError::Generic`];
/// any classified failure propagates and fails the enclosing pipeline unit.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// A failure with no more specific classification.
    #[error("{0}")]
    Generic(String),

    /// A failure belonging to a caller-defined domain kind.
    #[error("{kind}: {message}")]
    Classified { kind: String, message: String },

    /// A decode failure surfaced from inside a transformation.
    #[error("codec: {0}")]
    Codec(#[from] CodecError),
}

impl TransformError {
    pub fn generic(message: impl Into<String>) -> Self {
        TransformError::Generic(message.into())
    }

    pub fn classified(kind: impl Into<String>, message: impl Into<String>) -> Self {
        TransformError::Classified {
            kind: kind.into(),
            message: message.into(),
        }
    }
}
