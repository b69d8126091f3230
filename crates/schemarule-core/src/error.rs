use thiserror::Error;

/// Core error type shared across schemarule crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Metadata provider or database failure.
    #[error("database error: {0}")]
    Db(String),
    /// The schema snapshot violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// A configuration value names something that does not exist.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for results returned by schemarule crates.
pub type Result<T> = std::result::Result<T, Error>;
