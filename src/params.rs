//! Configuration of the two estimators.
//!
//! Both parameter structs implement [`Default`] with the values recommended for a first
//! run, and deserialize with `serde` (missing fields fall back to the defaults), so an
//! experiment can be described in a config file or built in code with struct update
//! syntax:
//!
//! ```
//! use spectral_kpm::params::KpmParams;
//!
//! let params = KpmParams { num_moments: 256, ..KpmParams::default() };
//! assert!(params.validate().is_ok());
//! ```
//!
//! Validation is eager: the solvers call `validate()` before the first matrix-vector
//! product.

use crate::{algorithms::kernel::Kernel, error::SpectralError, probe::ProbeKind};
use serde::{Deserialize, Serialize};

/// Parameters of the Kernel Polynomial Method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpmParams {
    /// The number of Chebyshev moments `N`. Sets the energy resolution, about
    /// `π (lmax - lmin) / (2 N)` with the Jackson kernel.
    pub num_moments: usize,
    /// The number of probe vectors.
    pub num_vecs: usize,
    /// Grid points added on top of `num_moments` in the reconstructed curve.
    pub extra_points: usize,
    /// A lower bound of the spectrum. Must be given together with `lmax`.
    pub lmin: Option<f64>,
    /// An upper bound of the spectrum. Must be given together with `lmin`.
    pub lmax: Option<f64>,
    /// The margin keeping the rescaled spectrum inside `[-1 + ε/2, 1 - ε/2]`.
    pub epsilon: f64,
    /// The damping kernel.
    pub kernel: Kernel,
    /// The probe distribution; `None` picks the default of the scalar type.
    pub probe: Option<ProbeKind>,
    /// The seed of the probe generator.
    pub seed: u64,
    /// The Lanczos budget used to estimate the bounds when they are not given.
    pub bounds_steps: usize,
}

impl Default for KpmParams {
    fn default() -> Self {
        Self {
            num_moments: 100,
            num_vecs: 10,
            extra_points: 12,
            lmin: None,
            lmax: None,
            epsilon: 0.01,
            kernel: Kernel::Jackson,
            probe: None,
            seed: 0,
            bounds_steps: 64,
        }
    }
}

impl KpmParams {
    /// Checks every parameter.
    ///
    /// # Errors
    /// [`crate::error::ErrorKind::InvalidParameter`] for zero counts, an `epsilon` outside
    /// `(0, 2)`, or bounds given on one side only. Degenerate bounds are reported as
    /// [`crate::error::ErrorKind::DegenerateSpectrum`].
    pub fn validate(&self) -> Result<(), SpectralError> {
        positive("num_moments", self.num_moments)?;
        positive("num_vecs", self.num_vecs)?;
        if !(self.epsilon > 0.0 && self.epsilon < 2.0) {
            return Err(SpectralError::invalid(format!(
                "epsilon must lie in (0, 2), got {}.",
                self.epsilon
            )));
        }
        match (self.lmin, self.lmax) {
            (Some(lmin), Some(lmax)) => {
                crate::rescale::SpectralBounds::new(lmin, lmax)?;
            }
            (None, None) => positive("bounds_steps", self.bounds_steps)?,
            _ => {
                return Err(SpectralError::invalid(
                    "lmin and lmax must be given together.",
                ));
            }
        }
        // Rejects a bad Lorentz parameter.
        self.kernel.coefficients::<f64>(self.num_moments)?;
        Ok(())
    }
}

/// Parameters of Stochastic Lanczos Quadrature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlqParams {
    /// The number of probe vectors.
    pub num_vecs: usize,
    /// The Lanczos budget per probe. The quadrature is exact for polynomials of degree up
    /// to `2 num_steps - 1`.
    pub num_steps: usize,
    /// The sensitivity of the orthogonality health test.
    pub orth_tol: f64,
    /// The probe distribution; `None` picks the default of the scalar type.
    pub probe: Option<ProbeKind>,
    /// The seed of the probe generator.
    pub seed: u64,
}

impl Default for SlqParams {
    fn default() -> Self {
        Self {
            num_vecs: 10,
            num_steps: 30,
            orth_tol: crate::algorithms::lanczos::DEFAULT_ORTH_TOL,
            probe: None,
            seed: 0,
        }
    }
}

impl SlqParams {
    /// Checks every parameter.
    ///
    /// # Errors
    /// [`crate::error::ErrorKind::InvalidParameter`] for zero counts or a non-positive
    /// `orth_tol`.
    pub fn validate(&self) -> Result<(), SpectralError> {
        positive("num_vecs", self.num_vecs)?;
        positive("num_steps", self.num_steps)?;
        if !(self.orth_tol > 0.0) || !self.orth_tol.is_finite() {
            return Err(SpectralError::invalid(format!(
                "orth_tol must be a positive, finite number, got {}.",
                self.orth_tol
            )));
        }
        Ok(())
    }
}

fn positive(name: &str, value: usize) -> Result<(), SpectralError> {
    if value == 0 {
        return Err(SpectralError::invalid(format!("{name} must be positive.")));
    }
    Ok(())
}
