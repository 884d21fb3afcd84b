//! Synthetic lattice Hamiltonians with known spectra.
//!
//! These matrices drive the experiment binaries and the integration tests:
//!
//! - **Anderson model**: the nearest-neighbour tight-binding Hamiltonian on a 1D, 2D or
//!   3D hypercubic lattice with a random on-site potential `V_i ~ U[-W/2, W/2]`. An
//!   optional magnetic flux enters through Peierls phases on the hopping terms and makes
//!   the matrix complex Hermitian.
//! - **Shifted grid Laplacian**: the 5-point Dirichlet Laplacian on an `nx x ny` grid
//!   plus `s I`, a positive definite matrix whose log-determinant has a closed form.
//!
//! The clean spectra are separable, so exact reference eigenvalues are available without
//! a dense eigensolver.

use crate::{
    error::SpectralError,
    matrix::SparseHermitianMatrix,
    scalar::{Scalar, real},
};
use faer::sparse::Triplet;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// The Anderson tight-binding model `H = -t Σ_<ij> e^{iθ_ij} c_i^† c_j + Σ_i V_i n_i`.
///
/// Boundaries are open unless `periodic` is set. Periodic wrapping is only applied along
/// axes of length 3 or more, where it does not duplicate a bond.
///
/// The meaning of `flux` depends on the dimension:
/// * 1D: the total flux through the ring, in flux quanta. Each bond carries the phase
///   `2π flux / L`. Requires `periodic` to have any effect on the spectrum.
/// * 2D and 3D: the flux per plaquette of the `xy` plane, in the Landau gauge (bonds
///   along `x` at height `y` carry the phase `2π flux y`). With periodic boundaries the
///   gauge is only consistent when `flux L_y` is an integer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AndersonModel {
    /// The lattice extent along each axis (1 to 3 axes).
    pub shape: Vec<usize>,
    /// The hopping amplitude `t`.
    pub hopping: f64,
    /// The disorder strength `W`.
    pub disorder: f64,
    /// The magnetic flux, see the type documentation.
    pub flux: f64,
    /// Periodic instead of open boundaries.
    pub periodic: bool,
    /// The seed of the on-site potential.
    pub seed: u64,
}

impl AndersonModel {
    /// A clean lattice with unit hopping and open boundaries.
    pub fn new(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            hopping: 1.0,
            disorder: 0.0,
            flux: 0.0,
            periodic: false,
            seed: 0,
        }
    }

    /// The number of sites.
    pub fn dimension(&self) -> usize {
        self.shape.iter().product()
    }

    /// A guaranteed enclosure of the spectrum, `±(2 d |t| + W / 2)`.
    pub fn spectral_radius_bound(&self) -> f64 {
        2.0 * self.shape.len() as f64 * self.hopping.abs() + 0.5 * self.disorder
    }

    /// Generates the `(row, col, val)` triplets of the Hamiltonian, both triangles
    /// included.
    ///
    /// # Errors
    /// [`crate::error::ErrorKind::InvalidParameter`] for an empty lattice, more than three
    /// axes, negative disorder, or a non-zero flux with a real scalar type.
    pub fn triplets<T: Scalar>(&self) -> Result<Vec<Triplet<usize, usize, T>>, SpectralError> {
        self.validate::<T>()?;

        let d = self.shape.len();
        let n = self.dimension();
        // Row-major strides: the last axis is contiguous.
        let mut strides = vec![1; d];
        for axis in (0..d.saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * self.shape[axis + 1];
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut triplets = Vec::with_capacity(n * (2 * d + 1));
        let mut coords = vec![0; d];
        for site in 0..n {
            let mut rest = site;
            for axis in 0..d {
                coords[axis] = rest / strides[axis];
                rest %= strides[axis];
            }

            let potential = self.disorder * (rng.random::<f64>() - 0.5);
            triplets.push(Triplet {
                row: site,
                col: site,
                val: T::from_real(real(potential)),
            });

            for axis in 0..d {
                let extent = self.shape[axis];
                let neighbour = if coords[axis] + 1 < extent {
                    site + strides[axis]
                } else if self.periodic && extent >= 3 {
                    site + strides[axis] - extent * strides[axis]
                } else {
                    continue;
                };

                let phase = if axis == 0 { self.peierls_phase(&coords) } else { 0.0 };
                let h = T::from_parts(
                    real(-self.hopping * phase.cos()),
                    real(-self.hopping * phase.sin()),
                );
                triplets.push(Triplet {
                    row: site,
                    col: neighbour,
                    val: h,
                });
                triplets.push(Triplet {
                    row: neighbour,
                    col: site,
                    val: h.conjugate(),
                });
            }
        }
        Ok(triplets)
    }

    /// Builds the Hamiltonian as a validated sparse matrix.
    pub fn build<T: Scalar>(&self) -> Result<SparseHermitianMatrix<T>, SpectralError> {
        SparseHermitianMatrix::try_from_triplets(self.dimension(), &self.triplets::<T>()?)
    }

    fn peierls_phase(&self, coords: &[usize]) -> f64 {
        if self.flux == 0.0 {
            0.0
        } else if coords.len() == 1 {
            2.0 * PI * self.flux / self.shape[0] as f64
        } else {
            2.0 * PI * self.flux * coords[1] as f64
        }
    }

    fn validate<T: Scalar>(&self) -> Result<(), SpectralError> {
        if self.shape.is_empty() || self.shape.len() > 3 || self.shape.contains(&0) {
            return Err(SpectralError::invalid(format!(
                "the lattice needs 1 to 3 non-empty axes, got {:?}.",
                self.shape
            )));
        }
        if !(self.disorder >= 0.0) || !self.disorder.is_finite() {
            return Err(SpectralError::invalid(format!(
                "the disorder strength must be non-negative, got {}.",
                self.disorder
            )));
        }
        if self.flux != 0.0 && !T::IS_COMPLEX {
            return Err(SpectralError::invalid(
                "a magnetic flux requires a complex scalar type.",
            ));
        }
        Ok(())
    }
}

/// The eigenvalues `-2 t cos(2π (m + flux) / L)` of a clean periodic ring threaded by
/// `flux` flux quanta. Valid for `L >= 3`.
pub fn ring_eigenvalues(length: usize, hopping: f64, flux: f64) -> Vec<f64> {
    (0..length)
        .map(|m| -2.0 * hopping * (2.0 * PI * (m as f64 + flux) / length as f64).cos())
        .collect()
}

/// The eigenvalues of a clean lattice with open boundaries, unsorted. The spectrum is
/// the sum of the chain spectra `-2 t cos(π m / (L + 1))`, `m = 1..=L`, of every axis.
pub fn open_lattice_eigenvalues(shape: &[usize], hopping: f64) -> Vec<f64> {
    shape.iter().fold(vec![0.0], |acc, &extent| {
        let chain: Vec<f64> = (1..=extent)
            .map(|m| -2.0 * hopping * (PI * m as f64 / (extent + 1) as f64).cos())
            .collect();
        acc.iter()
            .flat_map(|&e| chain.iter().map(move |&c| e + c))
            .collect()
    })
}

/// The 5-point Dirichlet Laplacian on an `nx x ny` grid, shifted by `shift I`.
///
/// # Errors
/// [`crate::error::ErrorKind::InvalidParameter`] for an empty grid.
pub fn shifted_grid_laplacian<T: Scalar>(
    nx: usize,
    ny: usize,
    shift: f64,
) -> Result<SparseHermitianMatrix<T>, SpectralError> {
    let lattice = AndersonModel::new(&[nx, ny]);
    let mut triplets = lattice.triplets::<T>()?;
    let diagonal = T::from_real(real(4.0 + shift));
    triplets.extend((0..lattice.dimension()).map(|i| Triplet {
        row: i,
        col: i,
        val: diagonal,
    }));
    SparseHermitianMatrix::try_from_triplets(lattice.dimension(), &triplets)
}

/// The eigenvalues of [`shifted_grid_laplacian`], unsorted.
pub fn shifted_grid_laplacian_eigenvalues(nx: usize, ny: usize, shift: f64) -> Vec<f64> {
    open_lattice_eigenvalues(&[nx, ny], 1.0)
        .into_iter()
        .map(|e| 4.0 + shift + e)
        .collect()
}

/// `log det` of [`shifted_grid_laplacian`].
pub fn shifted_grid_laplacian_logdet(nx: usize, ny: usize, shift: f64) -> f64 {
    shifted_grid_laplacian_eigenvalues(nx, ny, shift)
        .iter()
        .map(|e| e.ln())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::LinearOperator;
    use faer::{Mat, Side, c64};

    fn sorted(mut values: Vec<f64>) -> Vec<f64> {
        values.sort_by(|a, b| a.total_cmp(b));
        values
    }

    fn dense_eigenvalues(matrix: &SparseHermitianMatrix<f64>) -> Vec<f64> {
        let n = matrix.dimension();
        let dense = matrix.apply(Mat::<f64>::identity(n, n).as_ref());
        let evd = dense.as_ref().self_adjoint_eigen(Side::Lower).unwrap();
        let s = evd.S();
        sorted((0..n).map(|i| s[i]).collect())
    }

    #[test]
    fn test_open_lattice_matches_dense_spectrum() {
        let model = AndersonModel::new(&[4, 3]);
        let h = model.build::<f64>().unwrap();
        assert_eq!(h.dimension(), 12);
        let exact = sorted(open_lattice_eigenvalues(&[4, 3], 1.0));
        for (a, b) in dense_eigenvalues(&h).iter().zip(&exact) {
            assert!((a - b).abs() < 1e-12, "{a} vs {b}");
        }
    }

    #[test]
    fn test_ring_matches_dense_spectrum() {
        let model = AndersonModel {
            periodic: true,
            ..AndersonModel::new(&[7])
        };
        let h = model.build::<f64>().unwrap();
        let exact = sorted(ring_eigenvalues(7, 1.0, 0.0));
        for (a, b) in dense_eigenvalues(&h).iter().zip(&exact) {
            assert!((a - b).abs() < 1e-12, "{a} vs {b}");
        }
    }

    #[test]
    fn test_flux_needs_complex_scalar() {
        let model = AndersonModel {
            flux: 0.25,
            periodic: true,
            ..AndersonModel::new(&[8])
        };
        assert!(model.build::<f64>().is_err());
        assert!(model.build::<c64>().is_ok());
    }

    #[test]
    fn test_disorder_stays_in_bound() {
        let model = AndersonModel {
            disorder: 3.0,
            seed: 5,
            ..AndersonModel::new(&[3, 3, 3])
        };
        let h = model.build::<f64>().unwrap();
        let radius = model.spectral_radius_bound();
        assert_eq!(radius, 7.5);
        for lambda in dense_eigenvalues(&h) {
            assert!(lambda.abs() <= radius);
        }
    }

    #[test]
    fn test_invalid_shapes_are_rejected() {
        assert!(AndersonModel::new(&[]).build::<f64>().is_err());
        assert!(AndersonModel::new(&[2, 2, 2, 2]).build::<f64>().is_err());
        assert!(AndersonModel::new(&[3, 0]).build::<f64>().is_err());
    }

    #[test]
    fn test_grid_laplacian_spectrum() {
        let h = shifted_grid_laplacian::<f64>(5, 4, 0.5).unwrap();
        let exact = sorted(shifted_grid_laplacian_eigenvalues(5, 4, 0.5));
        let computed = dense_eigenvalues(&h);
        for (a, b) in computed.iter().zip(&exact) {
            assert!((a - b).abs() < 1e-12, "{a} vs {b}");
        }
        let logdet: f64 = computed.iter().map(|e| e.ln()).sum();
        assert!((logdet - shifted_grid_laplacian_logdet(5, 4, 0.5)).abs() < 1e-10);
    }
}
