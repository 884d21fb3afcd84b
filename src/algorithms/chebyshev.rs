//! Chebyshev moments of a rescaled operator for one probe vector.
//!
//! For an operator `H'` with spectrum inside `[-1, 1]`, the Chebyshev polynomials obey
//! the three-term recurrence
//!
//! ```text
//!     T_0(H') v = v,   T_1(H') v = H' v,   T_{k+1}(H') v = 2 H' T_k(H') v - T_{k-1}(H') v
//! ```
//!
//! and the moment of order `k` for the probe `v` is `μ_k = Re <v, T_k(H') v> / <v, v>`.
//! Averaged over probes with `E[v v^H] = I`, it estimates `tr(T_k(H')) / n`.
//!
//! The recursion is numerically stable only when the spectrum of `H'` lies in `[-1, 1]`;
//! outside that interval `T_k` grows exponentially. Callers are expected to pass an
//! operator produced by [`crate::rescale::RescaledOperator`].

use crate::{
    error::SpectralError,
    matrix::LinearOperator,
    scalar::{Scalar, real},
};
use faer::{MatRef, Scale};
use num_traits::{One, Zero};

/// Computes the `num_moments` Chebyshev moments `μ_0, ..., μ_{num_moments-1}` of
/// `operator` for a single probe vector.
///
/// `μ_0` is exactly `1`.
///
/// # Errors
/// [`crate::error::ErrorKind::InvalidParameter`] if `num_moments == 0`, the probe is zero,
/// or its length does not match the operator.
pub fn probe_moments<T, O>(
    operator: &O,
    probe: MatRef<'_, T>,
    num_moments: usize,
) -> Result<Vec<T::Precision>, SpectralError>
where
    T: Scalar,
    O: LinearOperator<T> + ?Sized,
{
    if num_moments == 0 {
        return Err(SpectralError::invalid("num_moments must be positive."));
    }
    if operator.ncols() != probe.nrows() {
        return Err(SpectralError::dimension_mismatch(
            operator.ncols(),
            probe.nrows(),
        ));
    }
    let probe_norm = T::column_norm(probe);
    if !(probe_norm > T::Precision::zero()) {
        return Err(SpectralError::invalid("The probe vector must not be a zero vector."));
    }
    let norm_sq = probe_norm * probe_norm;

    let mut moments = Vec::with_capacity(num_moments);
    moments.push(T::Precision::one());
    if num_moments == 1 {
        return Ok(moments);
    }

    let mut t_prev = probe.to_owned();
    let mut t_curr = operator.apply(probe);
    moments.push((probe.adjoint() * &t_curr)[(0, 0)].real_part() / norm_sq);

    let two = T::from_real(real(2.0));
    for _ in 2..num_moments {
        let ht = operator.apply(t_curr.as_ref());
        let t_next = &ht * Scale(two) - &t_prev;
        moments.push((probe.adjoint() * &t_next)[(0, 0)].real_part() / norm_sq);
        t_prev = std::mem::replace(&mut t_curr, t_next);
    }

    Ok(moments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{ProbeGenerator, ProbeKind};
    use faer::{Mat, c64};

    /// For a diagonal operator the moments are averages of `T_k(λ_i)` weighted by
    /// `|v_i|^2`, which is uniform for Rademacher probes.
    #[test]
    fn test_diagonal_moments_match_chebyshev_polynomials() {
        let eigs = [-0.9, -0.3, 0.1, 0.5, 0.8];
        let n = eigs.len();
        let h = Mat::from_fn(n, n, |i, j| if i == j { eigs[i] } else { 0.0 });
        let probe = ProbeGenerator::new(ProbeKind::Rademacher, 1, n).probe::<f64>(0);
        let moments = probe_moments(&h, probe.as_ref(), 8).unwrap();

        for (k, &mu) in moments.iter().enumerate() {
            let expected: f64 = eigs
                .iter()
                .map(|&x: &f64| (k as f64 * x.acos()).cos())
                .sum::<f64>()
                / n as f64;
            assert!((mu - expected).abs() < 1e-12, "moment {k}: {mu} vs {expected}");
        }
    }

    #[test]
    fn test_first_moment_is_exactly_one() {
        let n = 17;
        let h = Mat::from_fn(n, n, |i, j| {
            if i.abs_diff(j) == 1 { c64::new(0.0, 0.4) * if i < j { 1.0 } else { -1.0 } } else { c64::new(0.0, 0.0) }
        });
        for p in 0..5 {
            let probe = ProbeGenerator::new(ProbeKind::Gaussian, 8, n).probe::<c64>(p);
            let moments = probe_moments(&h, probe.as_ref(), 4).unwrap();
            assert_eq!(moments[0], 1.0);
        }
    }

    #[test]
    fn test_moments_stay_bounded() {
        let n = 40;
        let h = Mat::from_fn(n, n, |i, j| if i.abs_diff(j) == 1 { 0.49 } else { 0.0 });
        let probe = ProbeGenerator::new(ProbeKind::Rademacher, 2, n).probe::<f64>(0);
        let moments = probe_moments(&h, probe.as_ref(), 200).unwrap();
        assert_eq!(moments.len(), 200);
        assert!(moments.iter().all(|mu| mu.abs() <= 1.0 + 1e-9));
    }

    #[test]
    fn test_zero_moments_is_rejected() {
        let h = Mat::<f64>::identity(2, 2);
        let probe = Mat::<f64>::from_fn(2, 1, |_, _| 1.0);
        assert!(probe_moments(&h, probe.as_ref(), 0).is_err());
    }
}
