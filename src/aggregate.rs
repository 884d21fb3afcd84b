//! Reduction of per-probe results into stochastic estimates.
//!
//! Each probe vector produces an unbiased but noisy sample: a moment vector for KPM, a
//! quadrature value `γ = Σ τ_i f(θ_i)` for SLQ. The estimators here average those samples
//! and report the sample spread, so callers can judge whether `num_vecs` was large enough.

use crate::{error::SpectralError, scalar::real};
use num_traits::Float;

/// The SLQ estimate of `tr(f(H))`.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEstimate<P> {
    /// `(n / num_vecs) Σ γ_p`.
    pub estimate: P,
    /// The per-probe quadrature values `γ_p = e_1^T f(T_m) e_1`, in probe order.
    pub gammas: Vec<P>,
    /// The matrix dimension `n`.
    pub dimension: usize,
    /// The number of probes whose Lanczos run ended on an invariant subspace.
    pub breakdowns: usize,
}

impl<P: Float> TraceEstimate<P> {
    /// Builds the estimate from the quadrature values of `gammas.len()` probes.
    ///
    /// # Errors
    /// [`crate::error::ErrorKind::InvalidParameter`] if `gammas` is empty.
    pub fn from_gammas(
        dimension: usize,
        gammas: Vec<P>,
        breakdowns: usize,
    ) -> Result<Self, SpectralError> {
        if gammas.is_empty() {
            return Err(SpectralError::invalid(
                "a trace estimate needs at least one probe.",
            ));
        }
        let n = real::<P>(dimension as f64);
        let mean = mean(&gammas);
        Ok(Self {
            estimate: n * mean,
            gammas,
            dimension,
            breakdowns,
        })
    }

    /// The number of probes.
    pub fn num_vecs(&self) -> usize {
        self.gammas.len()
    }

    /// The per-probe trace samples `n γ_p`. Their mean is [`TraceEstimate::estimate`].
    pub fn per_probe_traces(&self) -> impl Iterator<Item = P> + '_ {
        let n = real::<P>(self.dimension as f64);
        self.gammas.iter().map(move |&g| n * g)
    }

    /// The standard error of the mean, `n sd(γ) / sqrt(num_vecs)`, using the unbiased
    /// sample variance. Zero for a single probe.
    pub fn std_error(&self) -> P {
        let count = self.gammas.len();
        if count < 2 {
            return P::zero();
        }
        let mean = mean(&self.gammas);
        let sum_sq = self
            .gammas
            .iter()
            .fold(P::zero(), |acc, &g| acc + (g - mean) * (g - mean));
        let variance = sum_sq / real::<P>((count - 1) as f64);
        real::<P>(self.dimension as f64) * (variance / real::<P>(count as f64)).sqrt()
    }
}

/// The averaged KPM moments of several probes.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentEstimate<P> {
    /// `μ_k` averaged over probes.
    pub mean: Vec<P>,
    /// The moments of each probe, in probe order.
    pub per_probe: Vec<Vec<P>>,
}

impl<P: Float> MomentEstimate<P> {
    /// Averages moment vectors order by order.
    ///
    /// # Errors
    /// [`crate::error::ErrorKind::InvalidParameter`] if there are no probes or the vectors
    /// differ in length.
    pub fn from_probes(per_probe: Vec<Vec<P>>) -> Result<Self, SpectralError> {
        let Some(first) = per_probe.first() else {
            return Err(SpectralError::invalid(
                "a moment estimate needs at least one probe.",
            ));
        };
        let num_moments = first.len();
        if let Some(bad) = per_probe.iter().find(|m| m.len() != num_moments) {
            return Err(SpectralError::invalid(format!(
                "expected {num_moments} moments per probe, got {}.",
                bad.len()
            )));
        }

        let count = real::<P>(per_probe.len() as f64);
        let mean = (0..num_moments)
            .map(|k| per_probe.iter().fold(P::zero(), |acc, m| acc + m[k]) / count)
            .collect();
        Ok(Self { mean, per_probe })
    }

    /// The number of probes.
    pub fn num_vecs(&self) -> usize {
        self.per_probe.len()
    }

    /// The standard error of each averaged moment.
    pub fn std_errors(&self) -> Vec<P> {
        let count = self.per_probe.len();
        if count < 2 {
            return vec![P::zero(); self.mean.len()];
        }
        let denom = real::<P>(((count - 1) * count) as f64);
        self.mean
            .iter()
            .enumerate()
            .map(|(k, &mu)| {
                let sum_sq = self
                    .per_probe
                    .iter()
                    .fold(P::zero(), |acc, m| acc + (m[k] - mu) * (m[k] - mu));
                (sum_sq / denom).sqrt()
            })
            .collect()
    }
}

fn mean<P: Float>(values: &[P]) -> P {
    let sum = values.iter().fold(P::zero(), |acc, &v| acc + v);
    sum / real::<P>(values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_estimate_scales_by_dimension() {
        let estimate = TraceEstimate::from_gammas(10, vec![0.5, 0.7, 0.6], 1).unwrap();
        assert!((estimate.estimate - 6.0).abs() < 1e-12);
        assert_eq!(estimate.num_vecs(), 3);
        assert_eq!(estimate.breakdowns, 1);
        let traces: Vec<f64> = estimate.per_probe_traces().collect();
        assert!((traces[0] - 5.0).abs() < 1e-12);
        assert!((traces[1] - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_std_error() {
        // sd of (1, 2, 3) is 1, so the error is n / sqrt(3).
        let estimate = TraceEstimate::from_gammas(4, vec![1.0, 2.0, 3.0], 0).unwrap();
        assert!((estimate.std_error() - 4.0 / 3f64.sqrt()).abs() < 1e-12);

        let single = TraceEstimate::from_gammas(4, vec![1.0f32], 0).unwrap();
        assert_eq!(single.std_error(), 0.0);
    }

    #[test]
    fn test_identical_samples_have_no_spread() {
        let estimate = TraceEstimate::from_gammas(100, vec![1.0; 8], 0).unwrap();
        assert_eq!(estimate.estimate, 100.0);
        assert_eq!(estimate.std_error(), 0.0);
    }

    #[test]
    fn test_empty_inputs_are_rejected() {
        assert!(TraceEstimate::<f64>::from_gammas(3, vec![], 0).is_err());
        assert!(MomentEstimate::<f64>::from_probes(vec![]).is_err());
    }

    #[test]
    fn test_moments_are_averaged_order_by_order() {
        let estimate =
            MomentEstimate::from_probes(vec![vec![1.0, 0.2, -0.1], vec![1.0, 0.4, 0.3]]).unwrap();
        assert_eq!(estimate.num_vecs(), 2);
        assert_eq!(estimate.mean[0], 1.0);
        assert!((estimate.mean[1] - 0.3).abs() < 1e-15);
        assert!((estimate.mean[2] - 0.1).abs() < 1e-15);
        let errors = estimate.std_errors();
        assert_eq!(errors[0], 0.0);
        assert!((errors[1] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_ragged_moments_are_rejected() {
        assert!(MomentEstimate::from_probes(vec![vec![1.0, 0.5], vec![1.0]]).is_err());
    }
}
