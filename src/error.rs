use thiserror::Error;

/// Input that does not match the query grammar.
///
/// Positions are 0-based character indexes into the original input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("empty search query")]
    Empty,

    #[error("expected {expected}, got end of input")]
    UnexpectedEnd { expected: &'static str },

    #[error("expected {expected} at position {position}, got {found}")]
    Unexpected {
        position: usize,
        found: String,
        expected: &'static str,
    },

    #[error("unterminated quoted value starting at position {position}")]
    UnterminatedQuote { position: usize },

    #[error("unclosed group opened at position {position}")]
    UnclosedGroup { position: usize },

    #[error("unexpected {found} at position {position}")]
    TrailingInput { position: usize, found: String },

    #[error("groups nested too deeply at position {position}")]
    TooDeep { position: usize },

    /// A keyed field that cannot be written as an SQL column reference.
    #[error("invalid field name {field:?}")]
    InvalidField { field: String },
}

impl ParseError {
    /// Position of the failure, if the error points at one.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Empty | Self::UnexpectedEnd { .. } | Self::InvalidField { .. } => None,
            Self::Unexpected { position, .. }
            | Self::UnterminatedQuote { position }
            | Self::UnclosedGroup { position }
            | Self::TrailingInput { position, .. }
            | Self::TooDeep { position } => Some(*position),
        }
    }
}

/// Caller misconfiguration of a [`FieldPolicy`](crate::policy::FieldPolicy).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("bare token {token:?} cannot be expanded: neither `any` nor `isString` is set")]
    NoBareFields { token: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}
