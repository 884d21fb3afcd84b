//! Gauss quadrature from a Lanczos tridiagonal matrix.
//!
//! Let `v` be a unit vector and `T_m = U Θ U^T` the eigendecomposition of the tridiagonal
//! matrix produced by `m` Lanczos steps from `v`. Then
//!
//! ```text
//!     v^H f(A) v  ≈  e_1^T f(T_m) e_1  =  Σ_i τ_i f(θ_i),    τ_i = U[0, i]^2,
//! ```
//!
//! which is the `m`-point Gauss quadrature rule for the spectral measure of `A` seen from
//! `v`. The rule integrates polynomials of degree up to `2m - 1` exactly.

use super::lanczos::TridiagonalMatrix;
use crate::error::{ErrorKind, SpectralError};
use faer::{Mat, Side, traits::RealField};
use num_traits::Float;

/// The nodes and weights of a Gauss quadrature rule.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureRule<P> {
    /// The Ritz values `θ_i`.
    pub nodes: Vec<P>,
    /// The weights `τ_i`, summing to one.
    pub weights: Vec<P>,
}

impl<P: Float> QuadratureRule<P> {
    /// Evaluates `Σ_i τ_i f(θ_i)`.
    pub fn evaluate<F>(&self, f: F) -> P
    where
        F: Fn(P) -> P,
    {
        self.nodes
            .iter()
            .zip(&self.weights)
            .fold(P::zero(), |acc, (&theta, &tau)| acc + tau * f(theta))
    }
}

/// The eigendecomposition of a tridiagonal matrix.
pub(crate) struct RitzPairs<P> {
    pub values: Vec<P>,
    /// Eigenvectors stored column-wise.
    pub vectors: Mat<P>,
}

impl<P: RealField + Float> TridiagonalMatrix<P> {
    /// Assembles the dense `m x m` representation of `T_m`.
    pub fn to_dense(&self) -> Mat<P> {
        let m = self.dim();
        let mut t_k = Mat::<P>::zeros(m, m);
        for (i, &alpha) in self.alphas().iter().enumerate() {
            t_k[(i, i)] = alpha;
        }
        for (i, &beta) in self.betas().iter().enumerate() {
            t_k[(i, i + 1)] = beta;
            t_k[(i + 1, i)] = beta;
        }
        t_k
    }

    /// Computes the eigenvalues (Ritz values) and eigenvectors of `T_m`.
    pub(crate) fn ritz_pairs(&self) -> Result<RitzPairs<P>, SpectralError> {
        let t_k = self.to_dense();
        let evd = t_k
            .as_ref()
            .self_adjoint_eigen(Side::Lower)
            .map_err(|e| SpectralError::from(ErrorKind::Eigendecomposition(e)))?;
        let s = evd.S();
        let values = (0..self.dim()).map(|i| s[i]).collect();
        Ok(RitzPairs {
            values,
            vectors: evd.U().to_owned(),
        })
    }

    /// The Ritz values of `T_m`.
    pub fn eigenvalues(&self) -> Result<Vec<P>, SpectralError> {
        Ok(self.ritz_pairs()?.values)
    }
}

/// Builds the Gauss quadrature rule associated with `T_m`.
///
/// # Errors
/// [`crate::error::ErrorKind::Eigendecomposition`] if the dense eigensolver fails.
pub fn gauss_quadrature<P>(tridiagonal: &TridiagonalMatrix<P>) -> Result<QuadratureRule<P>, SpectralError>
where
    P: RealField + Float,
{
    let pairs = tridiagonal.ritz_pairs()?;
    let weights = (0..tridiagonal.dim())
        .map(|i| {
            let u0 = pairs.vectors[(0, i)];
            u0 * u0
        })
        .collect();
    Ok(QuadratureRule {
        nodes: pairs.values,
        weights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        let t = TridiagonalMatrix::new(vec![1.0, 2.0, 3.0, 4.0], vec![0.5, 0.25, 0.125]).unwrap();
        let rule = gauss_quadrature(&t).unwrap();
        let total: f64 = rule.weights.iter().sum();
        assert!((total - 1.0).abs() < 1e-13);
    }

    /// `e_1^T T e_1 = α_0` and `e_1^T T^2 e_1 = α_0^2 + β_0^2`.
    #[test]
    fn test_rule_reproduces_low_order_moments() {
        let t = TridiagonalMatrix::new(vec![0.3, -1.2, 2.0], vec![0.7, 1.1]).unwrap();
        let rule = gauss_quadrature(&t).unwrap();
        assert!((rule.evaluate(|x| x) - 0.3).abs() < 1e-13);
        assert!((rule.evaluate(|x| x * x) - (0.09 + 0.49)).abs() < 1e-13);
    }

    #[test]
    fn test_one_by_one_rule() {
        let t = TridiagonalMatrix::new(vec![5.0f32], vec![]).unwrap();
        let rule = gauss_quadrature(&t).unwrap();
        assert_eq!(rule.nodes.len(), 1);
        assert!((rule.nodes[0] - 5.0).abs() < 1e-6);
        assert!((rule.weights[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_eigenvalues_of_path_matrix() {
        let m = 6;
        let t = TridiagonalMatrix::new(vec![2.0; m], vec![-1.0; m - 1]).unwrap();
        let mut eigs = t.eigenvalues().unwrap();
        eigs.sort_by(|a: &f64, b| a.partial_cmp(b).unwrap());
        for (k, &lambda) in eigs.iter().enumerate() {
            let expected = 2.0 - 2.0 * (std::f64::consts::PI * (k + 1) as f64 / (m + 1) as f64).cos();
            assert!((lambda - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_dense_assembly() {
        let t = TridiagonalMatrix::new(vec![1.0, 2.0], vec![3.0]).unwrap();
        let dense = t.to_dense();
        assert_eq!(dense, faer::mat![[1.0, 3.0], [3.0, 2.0]]);
    }
}
