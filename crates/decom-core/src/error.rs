//! Error type shared by the decommitment crates
//!
//! [`DecomError`] covers contract violations detected while building a network
//! snapshot or a cost model, as well as the few conditions the decommitment
//! search cannot recover from. Solver non-convergence on an individual trial is
//! *not* an error; it is reported through the solution's `converged` flag.
//!
//! ```ignore
//! use decom_core::{DecomError, DecomResult};
//!
//! fn load(path: &str) -> DecomResult<Network> {
//!     let network = read_case(path)?;
//!     network.validate()?;
//!     Ok(network)
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecomError {
    /// I/O errors while reading or writing case files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Case file or configuration could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Malformed input: degenerate cost tables, bad indices, mismatched lengths
    #[error("Validation error: {0}")]
    Validation(String),

    /// No legal configuration exists (e.g. minimum generation cannot be shed)
    #[error("Infeasible: {0}")]
    Infeasible(String),

    /// The OPF backend failed hard (not a mere non-convergence)
    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type DecomResult<T> = Result<T, DecomError>;

impl From<anyhow::Error> for DecomError {
    fn from(err: anyhow::Error) -> Self {
        DecomError::Other(err.to_string())
    }
}

impl From<String> for DecomError {
    fn from(s: String) -> Self {
        DecomError::Other(s)
    }
}

impl From<&str> for DecomError {
    fn from(s: &str) -> Self {
        DecomError::Other(s.to_string())
    }
}
