//! The numeric element types supported by the estimators.
//!
//! Every algorithm in this crate is generic over a [`Scalar`], which is one of `f32`,
//! `f64`, [`faer::c32`] or [`faer::c64`]. The choice of scalar fixes two things at
//! once: whether the matrix is real symmetric or complex Hermitian, and the working
//! precision (single or double) of the probe vectors and recurrences.
//!
//! Spectral quantities (moments, Lanczos coefficients, densities, traces) are always
//! real for a Hermitian matrix, so each scalar names its real counterpart through
//! [`Scalar::Precision`].

use crate::probe::ProbeKind;
use core::fmt::Debug;
use core::ops::{Add, Mul, Neg, Sub};
use faer::{
    MatRef, c32, c64,
    traits::{ComplexField, RealField},
};
use num_traits::{Float, Zero};
use rand::Rng;
use rand_distr::StandardNormal;

/// A matrix entry type usable by the spectral estimators.
///
/// The trait extends [`faer`]'s `ComplexField` (so the type can live in `faer` dense and
/// sparse matrices) with the handful of scalar operations the recurrences need, and with
/// the sampling rule for stochastic probe vectors.
pub trait Scalar:
    ComplexField
    + Copy
    + Debug
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
{
    /// The real type carrying the working precision (`f32` or `f64`).
    type Precision: RealField + Float + Debug + Send + Sync + 'static;

    /// `true` for complex Hermitian scalars.
    const IS_COMPLEX: bool;

    /// Embeds a real value.
    fn from_real(value: Self::Precision) -> Self;

    /// Builds `re + i im`. Real scalars drop the imaginary part.
    fn from_parts(re: Self::Precision, im: Self::Precision) -> Self;

    /// The real part.
    fn real_part(self) -> Self::Precision;

    /// The complex conjugate (identity for real scalars).
    fn conjugate(self) -> Self;

    /// The squared modulus `|z|^2`.
    fn abs_squared(self) -> Self::Precision;

    /// The Euclidean norm of a column, computed by `faer`'s `norm_l2`.
    fn column_norm(x: MatRef<'_, Self>) -> Self::Precision;

    /// Draws one probe-vector entry with `E[|z|^2] = 1` and `E[z] = 0`.
    fn sample_probe<R: Rng + ?Sized>(kind: ProbeKind, rng: &mut R) -> Self;

    /// The probe distribution used when the caller does not pick one.
    fn default_probe() -> ProbeKind {
        if Self::IS_COMPLEX {
            ProbeKind::UnitPhase
        } else {
            ProbeKind::Rademacher
        }
    }
}

macro_rules! impl_real_scalar {
    ($t:ty) => {
        impl Scalar for $t {
            type Precision = $t;
            const IS_COMPLEX: bool = false;

            #[inline]
            fn from_real(value: $t) -> Self {
                value
            }

            #[inline]
            fn from_parts(re: $t, _im: $t) -> Self {
                re
            }

            #[inline]
            fn real_part(self) -> $t {
                self
            }

            #[inline]
            fn conjugate(self) -> Self {
                self
            }

            #[inline]
            fn abs_squared(self) -> $t {
                self * self
            }

            #[inline]
            fn column_norm(x: MatRef<'_, $t>) -> $t {
                x.norm_l2()
            }

            fn sample_probe<R: Rng + ?Sized>(kind: ProbeKind, rng: &mut R) -> Self {
                match kind {
                    // A unit phase restricted to the real line is a random sign.
                    ProbeKind::Rademacher | ProbeKind::UnitPhase => {
                        if rng.random::<bool>() { 1.0 } else { -1.0 }
                    }
                    ProbeKind::Gaussian => rng.sample(StandardNormal),
                }
            }
        }
    };
}

macro_rules! impl_complex_scalar {
    ($t:ty, $re:ty) => {
        impl Scalar for $t {
            type Precision = $re;
            const IS_COMPLEX: bool = true;

            #[inline]
            fn from_real(value: $re) -> Self {
                <$t>::new(value, 0.0)
            }

            #[inline]
            fn from_parts(re: $re, im: $re) -> Self {
                <$t>::new(re, im)
            }

            #[inline]
            fn real_part(self) -> $re {
                self.re
            }

            #[inline]
            fn conjugate(self) -> Self {
                <$t>::new(self.re, -self.im)
            }

            #[inline]
            fn abs_squared(self) -> $re {
                self.re * self.re + self.im * self.im
            }

            #[inline]
            fn column_norm(x: MatRef<'_, $t>) -> $re {
                x.norm_l2()
            }

            fn sample_probe<R: Rng + ?Sized>(kind: ProbeKind, rng: &mut R) -> Self {
                match kind {
                    ProbeKind::Rademacher => {
                        <$t>::new(if rng.random::<bool>() { 1.0 } else { -1.0 }, 0.0)
                    }
                    ProbeKind::UnitPhase => {
                        let phi: $re = rng.random_range(0.0..core::f64::consts::TAU as $re);
                        <$t>::new(phi.cos(), phi.sin())
                    }
                    ProbeKind::Gaussian => {
                        let re: $re = rng.sample(StandardNormal);
                        let im: $re = rng.sample(StandardNormal);
                        <$t>::new(re * core::f64::consts::FRAC_1_SQRT_2 as $re, im * core::f64::consts::FRAC_1_SQRT_2 as $re)
                    }
                }
            }
        }
    };
}

impl_real_scalar!(f32);
impl_real_scalar!(f64);
impl_complex_scalar!(c32, f32);
impl_complex_scalar!(c64, f64);

/// The additive identity of `T`.
#[inline]
pub(crate) fn zero<T: Scalar>() -> T {
    T::from_real(T::Precision::zero())
}

/// Converts an `f64` constant or parameter into the working precision.
#[inline]
pub(crate) fn real<P: Float>(value: f64) -> P {
    P::from(value).unwrap_or_else(P::nan)
}

/// Converts a working-precision value to `f64` for reporting.
#[inline]
pub(crate) fn to_f64<P: Float>(value: P) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_complex_conjugate_and_modulus() {
        let z = c64::new(3.0, -4.0);
        assert_eq!(z.conjugate(), c64::new(3.0, 4.0));
        assert_eq!(z.abs_squared(), 25.0);
        assert_eq!(z.real_part(), 3.0);
        assert_eq!(c64::from_real(2.5), c64::new(2.5, 0.0));
        assert_eq!(c64::from_parts(1.0, -2.0), c64::new(1.0, -2.0));
        assert_eq!(f64::from_parts(1.0, -2.0), 1.0);
    }

    #[test]
    fn test_real_scalar_is_self_conjugate() {
        assert_eq!((-1.5f64).conjugate(), -1.5);
        assert_eq!((-1.5f32).abs_squared(), 2.25);
        assert!(!f64::IS_COMPLEX);
        assert!(c32::IS_COMPLEX);
    }

    #[test]
    fn test_column_norm_of_complex_vector() {
        let x = faer::Mat::from_fn(2, 1, |i, _| if i == 0 { c64::new(3.0, 4.0) } else { c64::new(0.0, 12.0) });
        assert!((c64::column_norm(x.as_ref()) - 13.0).abs() < 1e-14);
        let y = faer::Mat::from_fn(3, 1, |i, _| (i + 1) as f32);
        assert!((f32::column_norm(y.as_ref()) - 14f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_default_probe_kind() {
        assert_eq!(f64::default_probe(), ProbeKind::Rademacher);
        assert_eq!(c64::default_probe(), ProbeKind::UnitPhase);
    }

    #[test]
    fn test_unit_modulus_samples() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let r = f64::sample_probe(ProbeKind::Rademacher, &mut rng);
            assert_eq!(r.abs(), 1.0);
            let z = c64::sample_probe(ProbeKind::UnitPhase, &mut rng);
            assert!((z.abs_squared() - 1.0).abs() < 1e-14);
            let s = f32::sample_probe(ProbeKind::UnitPhase, &mut rng);
            assert_eq!(s.abs(), 1.0);
        }
    }

    #[test]
    fn test_gaussian_second_moment() {
        let mut rng = StdRng::seed_from_u64(11);
        let samples = 20_000;
        let mean_sq: f64 = (0..samples)
            .map(|_| c64::sample_probe(ProbeKind::Gaussian, &mut rng).abs_squared())
            .sum::<f64>()
            / samples as f64;
        assert!((mean_sq - 1.0).abs() < 0.05, "E|z|^2 = {mean_sq}");
    }
}
