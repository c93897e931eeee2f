use thiserror::Error;

/// Why a single extract line could not be parsed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("expected {expected} tab-separated fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("field {index} is not an integer: {value:?}")]
    NotAnInteger { index: usize, value: String },

    #[error("field {index} is not a number: {value:?}")]
    NotANumber { index: usize, value: String },

    #[error("field {index} is empty")]
    MissingField { index: usize },
}
