use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Broad category of an [`Error`], used by callers that only care about the
/// class of failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Schema,
    NotFound,
    Io,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to parse input: {0}")]
    Parse(String),

    #[error("Unknown field {field:?} in relation {relation:?}")]
    UnknownField { relation: String, field: String },

    #[error("Duplicate field {field:?} in relation {relation:?}")]
    DuplicateField { relation: String, field: String },

    #[error("Relation {relation:?} has {expected} fields, got {found}")]
    ArityMismatch {
        relation: String,
        expected: usize,
        found: usize,
    },

    #[error("Schemas of {left:?} ({left_fields}) and {right:?} ({right_fields}) differ")]
    SchemaMismatch {
        left: String,
        left_fields: String,
        right: String,
        right_fields: String,
    },

    #[error("Value {value:?} for relation {relation:?} cannot be stored: it contains a comma or line break")]
    UnstorableValue { relation: String, value: String },

    #[error("Relation {0:?} not found")]
    NotFound(String),

    #[error("I/O error on relation {relation:?}: {source}")]
    Io {
        relation: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse(_) | Error::UnstorableValue { .. } => ErrorKind::Parse,
            Error::UnknownField { .. }
            | Error::DuplicateField { .. }
            | Error::ArityMismatch { .. }
            | Error::SchemaMismatch { .. } => ErrorKind::Schema,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn unknown_field(relation: &str, field: &str) -> Self {
        Error::UnknownField {
            relation: relation.to_owned(),
            field: field.to_owned(),
        }
    }
}
