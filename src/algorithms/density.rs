//! Reconstruction of the density of states from damped Chebyshev moments.
//!
//! With damped moments `g_k μ_k`, the KPM approximation of the density of the rescaled
//! spectrum is
//!
//! ```text
//!     ρ(x) = (g_0 μ_0 + 2 Σ_{k=1}^{N-1} g_k μ_k T_k(x)) / (π sqrt(1 - x^2)),   x in (-1, 1).
//! ```
//!
//! The weight `1/sqrt(1 - x^2)` is singular at the end points, so the curve is evaluated
//! on the open Chebyshev nodes `x_j = -cos(π (j + 1/2) / M)`, which never reach `±1`.
//! Each node is then mapped back to the original energy axis, `E = a x + b`, and the
//! density divided by `a` so that it still integrates to one.

use crate::{error::SpectralError, scalar::real};
use num_traits::Float;

/// A density of states sampled on an increasing energy grid.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityCurve<P> {
    /// The energies, strictly increasing, in the units of the original matrix.
    pub energies: Vec<P>,
    /// The density at each energy.
    pub densities: Vec<P>,
}

impl<P: Float> DensityCurve<P> {
    /// The number of grid points.
    pub fn len(&self) -> usize {
        self.energies.len()
    }

    /// `true` if the curve has no points.
    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }

    /// Iterates over `(energy, density)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (P, P)> + '_ {
        self.energies
            .iter()
            .copied()
            .zip(self.densities.iter().copied())
    }

    /// The trapezoidal integral of the density over the grid.
    pub fn integrate(&self) -> P {
        let half = real::<P>(0.5);
        self.energies
            .windows(2)
            .zip(self.densities.windows(2))
            .fold(P::zero(), |acc, (e, d)| acc + (e[1] - e[0]) * (d[0] + d[1]) * half)
    }
}

/// The `num_points` open Chebyshev nodes in increasing order.
pub fn chebyshev_nodes<P: Float>(num_points: usize) -> Vec<P> {
    let m = num_points as f64;
    (0..num_points)
        .map(|j| real::<P>(-(std::f64::consts::PI * (j as f64 + 0.5) / m).cos()))
        .collect()
}

/// Rebuilds the density of states from moments and kernel coefficients.
///
/// # Arguments
/// * `moments`: the averaged moments `μ_k`.
/// * `kernel`: the damping coefficients `g_k`, as many as moments.
/// * `extra_points`: grid points added on top of `moments.len()`.
/// * `scale_fact_a`, `scale_fact_b`: the factors of the rescaling `H' = (H - b) / a`.
///
/// # Errors
/// [`crate::error::ErrorKind::InvalidParameter`] if there are no moments, the kernel has a
/// different length, or `scale_fact_a` is not positive.
pub fn reconstruct_density<P: Float>(
    moments: &[P],
    kernel: &[P],
    extra_points: usize,
    scale_fact_a: P,
    scale_fact_b: P,
) -> Result<DensityCurve<P>, SpectralError> {
    if moments.is_empty() {
        return Err(SpectralError::invalid("at least one moment is required."));
    }
    if kernel.len() != moments.len() {
        return Err(SpectralError::invalid(format!(
            "expected {} kernel coefficients, got {}.",
            moments.len(),
            kernel.len()
        )));
    }
    if !(scale_fact_a > P::zero()) {
        return Err(SpectralError::invalid("scale_fact_a must be positive."));
    }

    let two = real::<P>(2.0);
    let pi = real::<P>(std::f64::consts::PI);
    let damped: Vec<P> = moments
        .iter()
        .zip(kernel)
        .enumerate()
        .map(|(k, (&mu, &g))| if k == 0 { mu * g } else { two * mu * g })
        .collect();

    let grid = chebyshev_nodes::<P>(moments.len() + extra_points);
    let mut energies = Vec::with_capacity(grid.len());
    let mut densities = Vec::with_capacity(grid.len());
    for &x in &grid {
        let theta = x.acos();
        let series = damped
            .iter()
            .enumerate()
            .fold(P::zero(), |acc, (k, &c)| {
                acc + c * (real::<P>(k as f64) * theta).cos()
            });
        // sqrt(1 - x^2) = sin(θ) for θ in (0, π).
        let rho = series / (pi * theta.sin());
        energies.push(scale_fact_a * x + scale_fact_b);
        densities.push(rho / scale_fact_a);
    }

    Ok(DensityCurve {
        energies,
        densities,
    })
}
