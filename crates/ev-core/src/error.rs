//! Core error type.
//!
//! `ev-spatial` and `ev-engine` keep their own enums and wrap `CoreError`
//! through a `#[from]` variant.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `ev-core`.
pub type CoreResult<T> = Result<T, CoreError>;
