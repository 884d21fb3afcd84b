//! Damping kernels for truncated Chebyshev series.
//!
//! Cutting a Chebyshev expansion after `N` terms produces Gibbs oscillations, and the
//! reconstructed density can even turn negative. Multiplying moment `μ_k` by a kernel
//! coefficient `g_k` that decays smoothly towards `k = N - 1` trades these artefacts for a
//! controlled broadening of every spectral feature.

use crate::{error::SpectralError, scalar::real};
use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// The damping kernel applied to the KPM moments.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    /// The Jackson kernel: positive, normalised, and with the smallest broadening
    /// (about `π / N`) among positive kernels. The right choice for densities of states.
    #[default]
    Jackson,
    /// The Lorentz kernel `sinh(λ (1 - k/N)) / sinh(λ)`, which reproduces Lorentzian
    /// broadening and preserves the analytic structure of Green's functions.
    Lorentz { lambda: f64 },
    /// No damping (`g_k = 1`). Shows the raw truncated series, Gibbs oscillations
    /// included.
    Dirichlet,
}

impl Kernel {
    /// Returns the damping coefficients `g_0, ..., g_{num_moments-1}`.
    ///
    /// Every kernel has `g_0 = 1`, so damping never changes the normalisation of the
    /// density.
    ///
    /// # Errors
    /// [`crate::error::ErrorKind::InvalidParameter`] if `num_moments == 0` or the Lorentz
    /// parameter is not positive.
    pub fn coefficients<P: Float>(&self, num_moments: usize) -> Result<Vec<P>, SpectralError> {
        if num_moments == 0 {
            return Err(SpectralError::invalid("num_moments must be positive."));
        }
        let n = num_moments as f64;
        let coefficients = match *self {
            Kernel::Jackson => {
                let q = PI / (n + 1.0);
                let cot_q = q.cos() / q.sin();
                (0..num_moments)
                    .map(|k| {
                        let k = k as f64;
                        ((n - k + 1.0) * (q * k).cos() + (q * k).sin() * cot_q) / (n + 1.0)
                    })
                    .map(real::<P>)
                    .collect()
            }
            Kernel::Lorentz { lambda } => {
                if !(lambda > 0.0) || !lambda.is_finite() {
                    return Err(SpectralError::invalid(format!(
                        "the Lorentz kernel parameter must be positive, got {lambda}."
                    )));
                }
                (0..num_moments)
                    .map(|k| (lambda * (1.0 - k as f64 / n)).sinh() / lambda.sinh())
                    .map(real::<P>)
                    .collect()
            }
            Kernel::Dirichlet => vec![P::one(); num_moments],
        };
        Ok(coefficients)
    }
}
