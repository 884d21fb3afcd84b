//! Random probe vectors for stochastic trace estimation.
//!
//! A probe vector `v` is drawn so that `E[v v^H] = I`. Then `E[v^H A v] = tr(A)` for any
//! matrix `A`, which is the identity behind both the KPM moments and the SLQ trace
//! estimate.
//!
//! Probes are generated on independent streams of a single ChaCha generator: probe `i`
//! always uses stream `i` of the seeded generator. The result is reproducible for a given
//! seed no matter which worker thread builds which probe, and no two probes share random
//! numbers.

use crate::scalar::Scalar;
use faer::Mat;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// The distribution of the individual probe entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// Independent random signs `±1`. Optimal variance for real symmetric matrices.
    Rademacher,
    /// Independent random phases `e^{iφ}`. Falls back to random signs for real scalars.
    UnitPhase,
    /// Independent standard normal entries (complex normal with unit variance for complex
    /// scalars).
    Gaussian,
}

/// Produces the probe vectors of one estimation run.
#[derive(Debug, Clone, Copy)]
pub struct ProbeGenerator {
    kind: ProbeKind,
    seed: u64,
    dimension: usize,
}

impl ProbeGenerator {
    /// Creates a generator for probes of length `dimension`.
    pub fn new(kind: ProbeKind, seed: u64, dimension: usize) -> Self {
        Self {
            kind,
            seed,
            dimension,
        }
    }

    /// Returns probe number `index` as an `n x 1` column.
    ///
    /// The same `(seed, index)` pair always yields the same vector.
    pub fn probe<T: Scalar>(&self, index: usize) -> Mat<T> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(index as u64);
        Mat::from_fn(self.dimension, 1, |_, _| T::sample_probe(self.kind, &mut rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::c64;

    #[test]
    fn test_probe_is_reproducible() {
        let generator = ProbeGenerator::new(ProbeKind::Rademacher, 42, 64);
        let a = generator.probe::<f64>(3);
        let b = generator.probe::<f64>(3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_streams_are_distinct() {
        let generator = ProbeGenerator::new(ProbeKind::Rademacher, 42, 64);
        let a = generator.probe::<f64>(0);
        let b = generator.probe::<f64>(1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_rademacher_entries_are_signs() {
        let generator = ProbeGenerator::new(ProbeKind::Rademacher, 1, 128);
        let v = generator.probe::<f64>(0);
        for i in 0..v.nrows() {
            assert_eq!(v[(i, 0)].abs(), 1.0);
        }
    }

    /// The sample average of `v v^H` over many probes must approach the identity.
    #[test]
    fn test_outer_product_expectation_is_identity() {
        let n = 6;
        let num_probes = 4000;
        let generator = ProbeGenerator::new(ProbeKind::UnitPhase, 9, n);
        let mut acc = Mat::<c64>::zeros(n, n);
        for p in 0..num_probes {
            let v = generator.probe::<c64>(p);
            for i in 0..n {
                for j in 0..n {
                    acc[(i, j)] += v[(i, 0)] * v[(j, 0)].conjugate();
                }
            }
        }
        for i in 0..n {
            for j in 0..n {
                let expected = if i == j { 1.0 } else { 0.0 };
                let entry = acc[(i, j)] / num_probes as f64;
                assert!((entry.re - expected).abs() < 0.06, "entry ({i},{j}) = {entry}");
                assert!(entry.im.abs() < 0.06, "entry ({i},{j}) = {entry}");
            }
        }
    }
}
