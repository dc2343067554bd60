//! Error types for the HawkStack core.

/// Core error type for HawkStack infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum HawkStackError {
    /// The MAC algorithm tag is not one of the supported algorithms.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for HawkStack operations.
pub type HawkStackResult<T> = Result<T, HawkStackError>;
