//! This module defines the custom error types for the library.
//!
//! All fatal conditions raised by the estimators are collected in a single enum,
//! [`ErrorKind`], wrapped by the opaque [`SpectralError`]. Parameter and shape problems
//! are detected eagerly, before any matrix-vector product is performed.
//!
//! Lanczos breakdown is deliberately absent: an invariant subspace is a legitimate
//! outcome and is reported through [`crate::algorithms::lanczos::Termination`].
//!
//! Note that [`faer::linalg::evd::EvdError`] does not implement [`std::error::Error`], so
//! it is wrapped manually.
use thiserror::Error;

/// Represents all possible errors that can occur during a spectral estimation.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct SpectralError(#[from] ErrorKind);

impl SpectralError {
    /// The kind of failure, for callers that need to branch on it.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }
}

/// The distinct kinds of errors.
#[derive(Error, Debug, PartialEq)]
pub enum ErrorKind {
    /// The spectral bounds do not describe a non-empty interval, so the spectrum cannot
    /// be mapped into `[-1, 1]`.
    #[error("Degenerate spectrum: lmax ({lmax}) must be strictly greater than lmin ({lmin}).")]
    DegenerateSpectrum { lmin: f64, lmax: f64 },

    /// A parameter is out of its valid range, or the operator and a vector disagree on
    /// the dimension.
    #[error("Invalid input parameter: {0}")]
    InvalidParameter(String),

    /// The input matrix is not square, has indices out of range, or is not Hermitian.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Wraps an error originating from [`faer`]'s eigendecomposition module.
    #[error("A numerical error occurred during the eigendecomposition of T_k: {0:?}")]
    Eigendecomposition(faer::linalg::evd::EvdError),
}

impl SpectralError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ErrorKind::InvalidParameter(message.into()).into()
    }

    pub(crate) fn shape(message: impl Into<String>) -> Self {
        ErrorKind::ShapeMismatch(message.into()).into()
    }

    pub(crate) fn dimension_mismatch(operator_cols: usize, vector_rows: usize) -> Self {
        Self::invalid(format!(
            "operator has {operator_cols} columns but vector has {vector_rows} rows."
        ))
    }
}

// Compare by the inner kind.
impl PartialEq for SpectralError {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_spectrum_message() {
        let error = SpectralError(ErrorKind::DegenerateSpectrum {
            lmin: 1.0,
            lmax: 1.0,
        });
        assert_eq!(
            error.to_string(),
            "Degenerate spectrum: lmax (1) must be strictly greater than lmin (1)."
        );
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let error = SpectralError::dimension_mismatch(100, 99);
        assert_eq!(
            error.to_string(),
            "Invalid input parameter: operator has 100 columns but vector has 99 rows."
        );
        assert!(matches!(error.kind(), ErrorKind::InvalidParameter(_)));
    }

    #[test]
    fn test_shape_mismatch_message() {
        let error = SpectralError::shape("entry (0, 1) is not the conjugate of entry (1, 0).");
        assert_eq!(
            error.to_string(),
            "Shape mismatch: entry (0, 1) is not the conjugate of entry (1, 0)."
        );
    }

    #[test]
    fn test_evd_error_message() {
        let evd_error = faer::linalg::evd::EvdError::NoConvergence;
        let error = SpectralError(ErrorKind::Eigendecomposition(evd_error));
        assert_eq!(
            error.to_string(),
            "A numerical error occurred during the eigendecomposition of T_k: NoConvergence"
        );
    }

    #[test]
    fn test_errors_compare_by_kind() {
        assert_eq!(
            SpectralError::invalid("num_vecs must be positive."),
            SpectralError::invalid("num_vecs must be positive.")
        );
        assert_ne!(
            SpectralError::invalid("num_vecs must be positive."),
            SpectralError::shape("num_vecs must be positive.")
        );
    }
}
