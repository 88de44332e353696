//! Unified error types for the depot workspace
//!
//! [`DepotError`] is the common error representation at crate boundaries.
//! Loaders, validators and the model builder all convert into it so the
//! CLI can report any failure uniformly.
//!
//! # Example
//!
//! ```ignore
//! use depot_core::{DepotError, DepotResult};
//!
//! fn plan(path: &str) -> DepotResult<()> {
//!     let network = load_network(path)?;
//!     network.validate()?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all depot operations.
#[derive(Error, Debug)]
pub enum DepotError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// The network description violates the input schema
    /// (dangling references, missing quantities, invalid numbers).
    #[error("Schema violation: {0}")]
    Schema(String),

    /// Configuration errors, e.g. an undefined warehouse cost curve
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model construction errors
    #[error("Model error: {0}")]
    Model(String),

    /// Solver engine errors
    #[error("Solver error: {0}")]
    Solver(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

impl DepotError {
    /// Schema violations and configuration errors stem from the input
    /// document itself and are never worth retrying.
    pub fn is_input_defect(&self) -> bool {
        matches!(self, DepotError::Schema(_) | DepotError::Config(_))
    }
}

/// Convenience type alias for Results using DepotError.
pub type DepotResult<T> = Result<T, DepotError>;

impl From<anyhow::Error> for DepotError {
    fn from(err: anyhow::Error) -> Self {
        DepotError::Other(err.to_string())
    }
}

impl From<String> for DepotError {
    fn from(s: String) -> Self {
        DepotError::Other(s)
    }
}

impl From<&str> for DepotError {
    fn from(s: &str) -> Self {
        DepotError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for DepotError {
    fn from(err: serde_json::Error) -> Self {
        DepotError::Parse(err.to_string())
    }
}
