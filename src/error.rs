//! Error types for the rustyqcml crate.

use thiserror::Error;

/// The error type for every fallible operation in this crate.
#[derive(Debug, Error)]
pub enum QcmlError {
    /// An error originating from reading the source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source is not in an ASCII-compatible encoding we can scan by byte offset.
    #[error("Unsupported source encoding: {0}")]
    UnsupportedEncoding(String),

    /// An indexed element has no `id` attribute in its opening tag.
    #[error("<{tag}> at byte {offset} has no identifier attribute")]
    MissingIdentifier { tag: String, offset: u64 },

    /// An indexed element was opened but never closed.
    #[error("<{tag}> at byte {offset} is never closed")]
    UnclosedElement { tag: String, offset: u64 },

    /// Markup (tag, comment, CDATA, PI) runs past the end of the source.
    #[error("Unterminated markup starting at byte {0}")]
    UnterminatedMarkup(u64),

    /// A byte range that does not fit the source it is read from.
    #[error("Invalid byte range {start}..{end}: {reason}")]
    InvalidRange {
        start: u64,
        end: u64,
        reason: &'static str,
    },

    /// A snippet could not be decoded into the requested value.
    #[error("Failed to decode <{tag}>: {message}")]
    Decode { tag: String, message: String },

    /// A decoded document does not satisfy the structural schema.
    #[error("Schema violation at <{tag}>: {message}")]
    Schema { tag: String, message: String },

    /// A mandatory reference was cleared.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// An entity references a term the owning document does not register.
    #[error("Term '{term}' referenced by '{owner}' is not registered in the document")]
    UnknownTerm { owner: String, term: String },

    /// An attachment carries both or neither of binary data and a table.
    #[error("Invalid attachment '{accession}': {reason}")]
    InvalidAttachment {
        accession: String,
        reason: &'static str,
    },

    /// A mutex lock was poisoned by a panic in another thread.
    #[error("A mutex lock was poisoned, indicating a panic in another thread holding the lock.")]
    LockPoisoned,
}

impl QcmlError {
    pub(crate) fn decode(tag: impl Into<String>, message: impl ToString) -> Self {
        QcmlError::Decode {
            tag: tag.into(),
            message: message.to_string(),
        }
    }
}

/// A convenience `Result` alias using [`QcmlError`].
pub type Result<T> = std::result::Result<T, QcmlError>;
