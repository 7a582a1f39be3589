//! CLI support for jexl-lang
//!
//! Provides programmatic access to the `jexl` command-line functionality so
//! that other tools can check expressions the same way.

mod check;

pub use check::{CheckOptions, CheckResult, execute_check, list_tokens};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Lexing, parsing or evaluation failed
    #[error("{0}")]
    Expression(#[from] crate::Error),

    /// The context is not valid JSON
    #[error("Invalid JSON context: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading stdin failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<crate::LexError> for CliError {
    fn from(e: crate::LexError) -> Self {
        CliError::Expression(e.into())
    }
}
