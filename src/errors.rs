use crate::token::FieldType;
use std::fmt;

/// An error that can occur when decoding a bzn file
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    /// Return the specific type of error
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Returns the byte offset that the error occurs (if available)
    pub fn offset(&self) -> Option<usize> {
        self.0.offset()
    }
}

/// Specific type of error
#[derive(Debug)]
pub enum ErrorKind {
    /// Unexpected end of input
    Eof {
        /// Position where the stream ran dry
        offset: usize,
    },

    /// The leading bytes did not identify any known bzn family
    UnknownFormat,

    /// The leading bytes identified a format this decoder does not handle
    UnsupportedFormat {
        /// Name of the recognized-but-unsupported format
        name: &'static str,
    },

    /// A field failed name or type validation at a non-speculative point
    UnexpectedField {
        /// The field the decoder was trying to read
        field: String,
        /// The type the decoder expected
        expected: FieldType,
        /// Position of the offending token
        offset: usize,
    },

    /// A field's raw payload could not be reinterpreted as requested
    InvalidValue {
        /// Name of the field, when the token carried one
        field: String,
        /// Description of the requested reinterpretation
        expected: &'static str,
        /// Position of the offending token
        offset: usize,
    },

    /// A declared table count was negative
    NegativeCount {
        /// Name of the count field
        field: String,
        /// The declared value
        value: i32,
        /// Position of the count token
        offset: usize,
    },

    /// An entity class label had no registered factory and no viable hint
    UnknownClassLabel {
        /// The identifier as it appeared in the file
        label: String,
        /// Position of the identifier token
        offset: usize,
    },

    /// The same class label was registered twice for one format
    DuplicateClassLabel {
        /// The duplicated label
        label: String,
    },

    /// The save type field held a value outside the known classification
    InvalidSaveType {
        /// The value read from the file
        value: u32,
        /// Position of the save type token
        offset: usize,
    },

    /// Tokens remained after the final section of the catalogue
    TrailingData {
        /// Position of the first leftover token
        offset: usize,
    },
}

impl ErrorKind {
    pub fn offset(&self) -> Option<usize> {
        match *self {
            ErrorKind::Eof { offset } => Some(offset),
            ErrorKind::UnexpectedField { offset, .. } => Some(offset),
            ErrorKind::InvalidValue { offset, .. } => Some(offset),
            ErrorKind::NegativeCount { offset, .. } => Some(offset),
            ErrorKind::UnknownClassLabel { offset, .. } => Some(offset),
            ErrorKind::InvalidSaveType { offset, .. } => Some(offset),
            ErrorKind::TrailingData { offset } => Some(offset),
            _ => None,
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::Eof { offset } => {
                write!(f, "unexpected end of file (offset: {})", offset)
            }
            ErrorKind::UnknownFormat => write!(f, "unrecognized file format"),
            ErrorKind::UnsupportedFormat { name } => {
                write!(f, "recognized but unsupported format: {}", name)
            }
            ErrorKind::UnexpectedField {
                ref field,
                expected,
                offset,
            } => write!(
                f,
                "failed to parse {}/{} (offset: {})",
                field, expected, offset
            ),
            ErrorKind::InvalidValue {
                ref field,
                expected,
                offset,
            } => write!(
                f,
                "field {} not interpretable as {} (offset: {})",
                field, expected, offset
            ),
            ErrorKind::NegativeCount {
                ref field,
                value,
                offset,
            } => write!(
                f,
                "negative count {} for {} (offset: {})",
                value, field, offset
            ),
            ErrorKind::UnknownClassLabel { ref label, offset } => {
                write!(f, "unknown class label: {} (offset: {})", label, offset)
            }
            ErrorKind::DuplicateClassLabel { ref label } => {
                write!(f, "duplicate class label: {}", label)
            }
            ErrorKind::InvalidSaveType { value, offset } => {
                write!(f, "invalid save type: {} (offset: {})", value, offset)
            }
            ErrorKind::TrailingData { offset } => {
                write!(f, "tokens left after last known token (offset: {})", offset)
            }
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}
