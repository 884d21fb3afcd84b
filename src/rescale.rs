//! Mapping the spectrum of a Hermitian operator into `[-1, 1]`.
//!
//! Chebyshev polynomials are only bounded on `[-1, 1]`, so KPM works on the rescaled
//! operator
//!
//! ```text
//!     H' = (H - b I) / a,    a = (lmax - lmin) / (2 - ε),    b = (lmax + lmin) / 2,
//! ```
//!
//! whose spectrum lies in `[-1 + ε/2, 1 - ε/2]` whenever `[lmin, lmax]` encloses the
//! spectrum of `H`. The margin `ε` keeps the spectrum away from the singular end points of
//! the Chebyshev weight.
//!
//! The rescaled operator is applied matrix-free: `H' x` is computed as `(H x - b x) / a`,
//! so no shifted copy of the matrix is ever formed.

use crate::{
    algorithms::lanczos::{DEFAULT_ORTH_TOL, lanczos},
    error::{ErrorKind, SpectralError},
    matrix::LinearOperator,
    probe::{ProbeGenerator, ProbeKind},
    scalar::{Scalar, real, to_f64},
};
use faer::{Mat, MatRef, Scale};
use num_traits::{Float, Zero};

/// An interval `[lmin, lmax]` assumed to contain the spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralBounds<P> {
    pub lmin: P,
    pub lmax: P,
}

impl<P: Float> SpectralBounds<P> {
    /// Creates the interval, checking that it is non-degenerate.
    ///
    /// # Errors
    /// [`ErrorKind::DegenerateSpectrum`] if `lmax <= lmin` or a bound is not finite.
    pub fn new(lmin: P, lmax: P) -> Result<Self, SpectralError> {
        if !(lmin.is_finite() && lmax.is_finite()) || lmax <= lmin {
            return Err(ErrorKind::DegenerateSpectrum {
                lmin: to_f64(lmin),
                lmax: to_f64(lmax),
            }
            .into());
        }
        Ok(Self { lmin, lmax })
    }

    /// The width `lmax - lmin`.
    pub fn width(&self) -> P {
        self.lmax - self.lmin
    }
}

/// The matrix-free view `H' = (H - b I) / a` of a Hermitian operator.
#[derive(Debug)]
pub struct RescaledOperator<'a, T: Scalar, O: ?Sized> {
    operator: &'a O,
    scale_fact_a: T::Precision,
    scale_fact_b: T::Precision,
}

impl<'a, T, O> RescaledOperator<'a, T, O>
where
    T: Scalar,
    O: LinearOperator<T> + ?Sized,
{
    /// Rescales `operator` so that `bounds` maps onto `[-1 + ε/2, 1 - ε/2]`.
    ///
    /// # Errors
    /// * [`ErrorKind::DegenerateSpectrum`] if `lmax <= lmin`.
    /// * [`ErrorKind::InvalidParameter`] if `epsilon` is outside `(0, 2)`.
    /// * [`ErrorKind::ShapeMismatch`] if the operator is not square.
    pub fn new(
        operator: &'a O,
        bounds: SpectralBounds<T::Precision>,
        epsilon: T::Precision,
    ) -> Result<Self, SpectralError> {
        let bounds = SpectralBounds::new(bounds.lmin, bounds.lmax)?;
        let two = real::<T::Precision>(2.0);
        if !(epsilon > T::Precision::zero() && epsilon < two) {
            return Err(SpectralError::invalid(format!(
                "epsilon must lie in (0, 2), got {}.",
                to_f64(epsilon)
            )));
        }
        if operator.nrows() != operator.ncols() {
            return Err(SpectralError::shape(format!(
                "the operator must be square, got {} x {}.",
                operator.nrows(),
                operator.ncols()
            )));
        }

        let scale_fact_a = bounds.width() / (two - epsilon);
        let scale_fact_b = (bounds.lmax + bounds.lmin) / two;
        log::debug!(
            "Rescaling spectrum [{}, {}]: a = {}, b = {}",
            to_f64(bounds.lmin),
            to_f64(bounds.lmax),
            to_f64(scale_fact_a),
            to_f64(scale_fact_b)
        );

        Ok(Self {
            operator,
            scale_fact_a,
            scale_fact_b,
        })
    }

    /// The scale factor `a`.
    pub fn scale_fact_a(&self) -> T::Precision {
        self.scale_fact_a
    }

    /// The shift `b`.
    pub fn scale_fact_b(&self) -> T::Precision {
        self.scale_fact_b
    }
}

impl<T, O> LinearOperator<T> for RescaledOperator<'_, T, O>
where
    T: Scalar,
    O: LinearOperator<T> + ?Sized,
{
    #[inline]
    fn nrows(&self) -> usize {
        self.operator.nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.operator.ncols()
    }

    fn apply(&self, rhs: MatRef<'_, T>) -> Mat<T> {
        let hx = self.operator.apply(rhs);
        let shifted = &hx - rhs * Scale(T::from_real(self.scale_fact_b));
        &shifted * Scale(T::from_real(self.scale_fact_a.recip()))
    }
}

/// Estimates the extreme eigenvalues of `operator` with a short Lanczos run.
///
/// The Ritz values of a Lanczos run always lie inside the spectrum, and the extreme ones
/// converge first. Each extreme Ritz value `θ_i` is widened by its residual
/// `|β_m U[m-1, i]|`, which is the distance the true eigenvalue can be away from it. When
/// the run reaches an invariant subspace (always the case for `num_steps >= n` in exact
/// arithmetic) the residual vanishes and the estimate is exact.
///
/// # Arguments
/// * `num_steps`: the Lanczos budget, capped at the dimension.
/// * `seed`: the seed of the Rademacher start vector.
///
/// # Errors
/// [`ErrorKind::ShapeMismatch`] for an empty or non-square operator,
/// [`ErrorKind::InvalidParameter`] for a zero budget,
/// [`ErrorKind::Eigendecomposition`] if the small eigenproblem fails.
pub fn estimate_bounds<T, O>(
    operator: &O,
    num_steps: usize,
    seed: u64,
) -> Result<SpectralBounds<T::Precision>, SpectralError>
where
    T: Scalar,
    O: LinearOperator<T> + ?Sized,
{
    let n = operator.ncols();
    if n == 0 || operator.nrows() != n {
        return Err(SpectralError::shape(format!(
            "cannot estimate the spectrum of a {} x {} operator.",
            operator.nrows(),
            n
        )));
    }
    let start = ProbeGenerator::new(ProbeKind::Rademacher, seed, n).probe::<T>(0);
    let output = lanczos(
        operator,
        start.as_ref(),
        num_steps.min(n),
        real::<T::Precision>(DEFAULT_ORTH_TOL),
    )?;
    let pairs = output.tridiagonal.ritz_pairs()?;
    let m = output.steps_taken();

    let (mut i_min, mut i_max) = (0, 0);
    for (i, &theta) in pairs.values.iter().enumerate() {
        if theta < pairs.values[i_min] {
            i_min = i;
        }
        if theta > pairs.values[i_max] {
            i_max = i;
        }
    }
    let margin = |i: usize| (output.residual * pairs.vectors[(m - 1, i)]).abs();
    let lmin = pairs.values[i_min] - margin(i_min);
    let lmax = pairs.values[i_max] + margin(i_max);

    log::debug!(
        "Estimated spectral bounds [{}, {}] from {m} Lanczos steps ({:?}).",
        to_f64(lmin),
        to_f64(lmax),
        output.termination
    );
    Ok(SpectralBounds { lmin, lmax })
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::Side;

    fn diagonal(eigs: &[f64]) -> Mat<f64> {
        Mat::from_fn(eigs.len(), eigs.len(), |i, j| if i == j { eigs[i] } else { 0.0 })
    }

    #[test]
    fn test_scale_factors() {
        let h = diagonal(&[-3.0, 1.0, 5.0]);
        let bounds = SpectralBounds::new(-3.0, 5.0).unwrap();
        let rescaled = RescaledOperator::new(&h, bounds, 0.01).unwrap();
        assert!((rescaled.scale_fact_a() - 8.0 / 1.99).abs() < 1e-14);
        assert_eq!(rescaled.scale_fact_b(), 1.0);

        let x = Mat::from_fn(3, 1, |i, _| (i + 1) as f64);
        let y = rescaled.apply(x.as_ref());
        let expected = [(-3.0 - 1.0) * 1.0, (1.0 - 1.0) * 2.0, (5.0 - 1.0) * 3.0];
        for i in 0..3 {
            assert!((y[(i, 0)] - expected[i] / rescaled.scale_fact_a()).abs() < 1e-14);
        }
    }

    #[test]
    fn test_rescaled_spectrum_is_inside_margin() {
        let eigs = [-2.0, -0.5, 0.0, 3.0, 7.5];
        let h = diagonal(&eigs);
        let epsilon = 0.01;
        let bounds = SpectralBounds::new(-2.0, 7.5).unwrap();
        let rescaled = RescaledOperator::new(&h, bounds, epsilon).unwrap();
        let dense = rescaled.apply(Mat::<f64>::identity(5, 5).as_ref());
        let evd = dense.as_ref().self_adjoint_eigen(Side::Lower).unwrap();
        let s = evd.S();
        for i in 0..5 {
            assert!(s[i] >= -1.0 + epsilon / 2.0 - 1e-12);
            assert!(s[i] <= 1.0 - epsilon / 2.0 + 1e-12);
        }
    }

    #[test]
    fn test_degenerate_bounds_are_rejected() {
        let h = Mat::<f64>::identity(3, 3);
        let err = RescaledOperator::new(&h, SpectralBounds { lmin: 1.0, lmax: 1.0 }, 0.01)
            .unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::DegenerateSpectrum {
                lmin: 1.0,
                lmax: 1.0
            }
        );
        assert!(SpectralBounds::new(2.0, 1.0).is_err());
        assert!(SpectralBounds::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_bad_epsilon_is_rejected() {
        let h = Mat::<f64>::identity(3, 3);
        let bounds = SpectralBounds::new(0.0, 1.0).unwrap();
        assert!(RescaledOperator::new(&h, bounds, 0.0).is_err());
        assert!(RescaledOperator::new(&h, bounds, 2.0).is_err());
    }

    #[test]
    fn test_non_square_operator_is_a_shape_mismatch() {
        let h = Mat::<f64>::zeros(3, 4);
        let bounds = SpectralBounds::new(-1.0, 1.0).unwrap();
        let err = RescaledOperator::new(&h, bounds, 0.01).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ShapeMismatch(_)));
        let err = estimate_bounds(&h, 8, 0).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ShapeMismatch(_)));
    }

    #[test]
    fn test_estimated_bounds_are_exact_for_full_run() {
        let eigs: Vec<f64> = (0..12).map(|i| (i as f64 * 0.7).sin() * 4.0).collect();
        let h = diagonal(&eigs);
        let bounds = estimate_bounds(&h, 64, 3).unwrap();
        let true_min = eigs.iter().copied().fold(f64::INFINITY, f64::min);
        let true_max = eigs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!((bounds.lmin - true_min).abs() < 1e-8, "{} vs {true_min}", bounds.lmin);
        assert!((bounds.lmax - true_max).abs() < 1e-8, "{} vs {true_max}", bounds.lmax);
    }

    #[test]
    fn test_estimated_bounds_enclose_spectrum_for_short_run() {
        // A bulk in [-0.5, 0.5] with isolated extremes at -1 and 1.
        let n = 200;
        let eigs: Vec<f64> = (0..n)
            .map(|i| match i {
                0 => -1.0,
                i if i == n - 1 => 1.0,
                i => -0.5 + (i - 1) as f64 / (n - 3) as f64,
            })
            .collect();
        let h = diagonal(&eigs);
        let bounds = estimate_bounds(&h, 40, 9).unwrap();
        assert!(bounds.lmin <= -1.0 + 1e-6, "lmin = {}", bounds.lmin);
        assert!(bounds.lmax >= 1.0 - 1e-6, "lmax = {}", bounds.lmax);
        assert!(bounds.lmin > -1.5 && bounds.lmax < 1.5);
    }
}
