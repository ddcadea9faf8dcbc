use thiserror::Error;

/// Errors surfaced through the public API. File and GUI glue uses `anyhow` instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AipError {
    /// Tab was pressed while nothing in the list matches the typed path.
    #[error("the key \"{0}\" does not match any known keys")]
    NoMatchFound(String),

    #[error("unrecognized data mode \"{0}\"")]
    InvalidDataMode(String),

    #[error("invalid configuration: {0}")]
    Parse(String),
}
