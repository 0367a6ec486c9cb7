//! # Error Types

/// Errors from stanza operations.
#[derive(Debug, thiserror::Error)]
pub enum StanzaError {
    /// A token/id mapping is not a bijection onto ``0..N``,
    /// or the unknown token is missing or not at id 0.
    #[error("not a bijection: {0}")]
    NotBijection(String),

    /// The token is absent and no unknown-token fallback is configured.
    #[error("unknown token: {token:?}")]
    UnknownToken {
        /// The token that was not found.
        token: String,
    },

    /// An id is outside the vocabulary's id space.
    #[error("index {index} out of range for vocabulary of size {len}")]
    IndexOutOfRange {
        /// The offending id.
        index: usize,

        /// The vocabulary size.
        len: usize,
    },

    /// Mutation was attempted on a frozen vocabulary.
    #[error("vocabulary is frozen; cannot add {token:?}")]
    FrozenVocabulary {
        /// The first token which would have been added.
        token: String,
    },

    /// Matrix and vocabulary (or query) shapes disagree.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed file content, or a value that cannot be written.
    #[error("parse error: {0}")]
    Parse(String),

    /// Error from an external component.
    #[error("{0}")]
    External(String),
}

/// Result type for stanza operations.
pub type StanzaResult<T> = core::result::Result<T, StanzaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = StanzaError::IndexOutOfRange { index: 7, len: 3 };
        assert_eq!(
            err.to_string(),
            "index 7 out of range for vocabulary of size 3"
        );

        let err = StanzaError::UnknownToken {
            token: "zebra".to_string(),
        };
        assert_eq!(err.to_string(), "unknown token: \"zebra\"");
    }

    #[test]
    fn test_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: StanzaError = io.into();
        assert!(matches!(err, StanzaError::Io(_)));
    }
}
