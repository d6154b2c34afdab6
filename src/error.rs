//! Error types for summit analysis.

use thiserror::Error;

/// Errors raised when the input data or a fit is not well defined.
///
/// Both kinds abort the pipeline before any chart is rendered, since the
/// chart annotations depend on the fit results.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SummitError {
    /// Malformed or inconsistent literal input.
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    /// Input that does not admit a well-defined fit.
    #[error("degenerate fit: {0}")]
    DegenerateFit(String),
}
