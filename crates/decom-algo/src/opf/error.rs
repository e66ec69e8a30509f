use decom_core::DecomError;
use thiserror::Error;

/// OPF backend errors
///
/// These are hard failures: the backend could not even attempt the problem.
/// A solve that ran but did not balance the system is reported through
/// [`OpfSolution::converged`](super::OpfSolution::converged) instead.
#[derive(Debug, Clone, Error)]
pub enum OpfError {
    /// Input data validation error
    #[error("OPF data validation: {0}")]
    DataValidation(String),

    /// Numerical convergence issue
    #[error("OPF numerical issue: {0}")]
    NumericalIssue(String),
}

impl From<OpfError> for DecomError {
    fn from(err: OpfError) -> Self {
        match err {
            OpfError::DataValidation(msg) => DecomError::Validation(msg),
            other @ OpfError::NumericalIssue(_) => DecomError::Solver(other.to_string()),
        }
    }
}
