use super::Reader;
use crate::ParseError;
use thiserror::Error;

#[doc = r#"
A set of errors that can occur while reading bytes into the midi representation
"#]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Reading at Position {position}, {kind}")]
pub struct ReaderError {
    position: usize,
    pub(crate) kind: ReaderErrorKind,
}

/// A kind of error that a reader can produce
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReaderErrorKind {
    /// Parsing errors
    #[error("Parsing {0}")]
    ParseError(#[from] ParseError),
    /// The stream ended in the middle of a chunk or event.
    #[error("Read out of bounds!")]
    OutOfBounds,
}

impl ReaderError {
    /// Create a reader error from a position and kind
    pub const fn new(position: usize, kind: ReaderErrorKind) -> Self {
        Self { position, kind }
    }
    /// True if the stream was truncated
    pub const fn is_out_of_bounds(&self) -> bool {
        matches!(self.kind, ReaderErrorKind::OutOfBounds)
    }
    /// Returns the error kind of the reader.
    pub fn error_kind(&self) -> &ReaderErrorKind {
        &self.kind
    }
    /// Returns the parse error, if this wasn't a truncation.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match &self.kind {
            ReaderErrorKind::ParseError(e) => Some(e),
            ReaderErrorKind::OutOfBounds => None,
        }
    }
    /// Returns the position where the read error occurred.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Create a new out of bounds error
    pub const fn oob(position: usize) -> Self {
        Self {
            position,
            kind: ReaderErrorKind::OutOfBounds,
        }
    }
}

/// The Read Result type (see [`ReaderError`])
pub type ReadResult<T> = Result<T, ReaderError>;

pub(crate) fn inv_data(reader: &Reader<'_>, v: impl Into<ParseError>) -> ReaderError {
    ReaderError::new(
        reader.buffer_position(),
        ReaderErrorKind::ParseError(v.into()),
    )
}
