//! This module defines the core abstraction for linear operators and the validated
//! sparse Hermitian matrix type.
//!
//! Neither the Chebyshev recursion nor the Lanczos process needs individual matrix
//! entries: the only operation they perform on the matrix is the matrix-vector product.
//! The estimators are therefore written against the [`LinearOperator`] trait, and can run
//! on dense matrices, sparse matrices, or implicit operators such as the rescaled view
//! `(H - b I) / a` built by [`crate::rescale`].
//!
//! [`SparseHermitianMatrix`] is the concrete input type for large problems. It stores the
//! entries in a `faer` compressed sparse column matrix and checks the Hermitian
//! structure once, at construction.

use crate::{
    error::SpectralError,
    rescale::SpectralBounds,
    scalar::{Scalar, zero},
};
use faer::{
    Mat, MatRef, Par,
    dyn_stack::{MemBuffer, MemStack},
    matrix_free::LinOp,
    sparse::{SparseColMat, SparseColMatRef, Triplet},
};
use num_traits::{Float, Zero};
use std::collections::BTreeMap;

/// Represents a Hermitian linear operator that can be applied to a vector (or a block of
/// vectors).
///
/// The operator is shared read-only between the worker threads processing different
/// probe vectors, hence the `Sync` bound.
///
/// # Example
///
/// ```
/// use faer::{Mat, mat};
/// use spectral_kpm::matrix::LinearOperator;
///
/// let a: Mat<f64> = mat![[2.0, -1.0], [-1.0, 2.0]];
/// let x: Mat<f64> = mat![[1.0], [1.0]];
/// let y = a.apply(x.as_ref());
/// assert_eq!(y, mat![[1.0], [1.0]]);
/// ```
pub trait LinearOperator<T: Scalar>: Sync {
    /// Returns the number of rows of the operator.
    fn nrows(&self) -> usize;

    /// Returns the number of columns of the operator.
    fn ncols(&self) -> usize;

    /// Returns `A * rhs`.
    ///
    /// # Panics
    ///
    /// Implementations may panic if `rhs.nrows() != self.ncols()`; the estimators check
    /// dimensions before calling this.
    fn apply(&self, rhs: MatRef<'_, T>) -> Mat<T>;
}

impl<'a, T: Scalar> LinearOperator<T> for MatRef<'a, T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols()
    }

    #[inline]
    fn apply(&self, rhs: MatRef<'_, T>) -> Mat<T> {
        assert_eq!(
            self.ncols(),
            rhs.nrows(),
            "Dimension mismatch: operator columns ({}) do not match vector rows ({}).",
            self.ncols(),
            rhs.nrows(),
        );
        self * rhs
    }
}

impl<T: Scalar> LinearOperator<T> for Mat<T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.as_ref().nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.as_ref().ncols()
    }

    #[inline]
    fn apply(&self, rhs: MatRef<'_, T>) -> Mat<T> {
        LinearOperator::apply(&self.as_ref(), rhs)
    }
}

/// A square sparse matrix with `a_ij == conj(a_ji)`.
///
/// Instances can only be obtained through the checked constructors, so every value of
/// this type satisfies the Hermitian invariant up to the construction tolerance.
#[derive(Debug, Clone)]
pub struct SparseHermitianMatrix<T: Scalar> {
    matrix: SparseColMat<usize, T>,
}

impl<T: Scalar> SparseHermitianMatrix<T> {
    /// Builds an `n x n` matrix from `(row, col, val)` triplets.
    ///
    /// Duplicate coordinates are summed. Both triangles must be present: the entry at
    /// `(j, i)` has to be the conjugate of the entry at `(i, j)`.
    ///
    /// # Errors
    /// [`crate::error::ErrorKind::ShapeMismatch`] if an index is out of range or the
    /// entries are not Hermitian.
    pub fn try_from_triplets(
        dimension: usize,
        triplets: &[Triplet<usize, usize, T>],
    ) -> Result<Self, SpectralError> {
        if dimension == 0 {
            return Err(SpectralError::shape("the matrix dimension must be positive."));
        }

        let mut entries: BTreeMap<(usize, usize), T> = BTreeMap::new();
        for t in triplets {
            if t.row >= dimension || t.col >= dimension {
                return Err(SpectralError::shape(format!(
                    "entry ({}, {}) lies outside a {dimension} x {dimension} matrix.",
                    t.row, t.col
                )));
            }
            let slot = entries.entry((t.row, t.col)).or_insert_with(zero::<T>);
            *slot = *slot + t.val;
        }

        check_hermitian(&entries)?;

        let merged: Vec<Triplet<usize, usize, T>> = entries
            .into_iter()
            .map(|((row, col), val)| Triplet { row, col, val })
            .collect();
        let matrix = SparseColMat::try_new_from_triplets(dimension, dimension, &merged)
            .map_err(|e| SpectralError::shape(format!("sparse construction failed: {e:?}")))?;

        Ok(Self { matrix })
    }

    /// Builds a matrix from triplets, inferring the dimension as the largest index + 1.
    pub fn try_from_triplets_inferred(
        triplets: &[Triplet<usize, usize, T>],
    ) -> Result<Self, SpectralError> {
        let dimension = triplets
            .iter()
            .map(|t| t.row.max(t.col) + 1)
            .max()
            .unwrap_or(0);
        Self::try_from_triplets(dimension, triplets)
    }

    /// Wraps an existing `faer` sparse matrix after checking it is square and Hermitian.
    pub fn try_from_sparse(matrix: SparseColMat<usize, T>) -> Result<Self, SpectralError> {
        if matrix.nrows() != matrix.ncols() {
            return Err(SpectralError::shape(format!(
                "the matrix is {} x {}, expected a square matrix.",
                matrix.nrows(),
                matrix.ncols()
            )));
        }
        let triplets: Vec<Triplet<usize, usize, T>> = matrix
            .triplet_iter()
            .map(|t| Triplet {
                row: t.row,
                col: t.col,
                val: *t.val,
            })
            .collect();
        Self::try_from_triplets(matrix.nrows(), &triplets)
    }

    /// The matrix dimension `n`.
    pub fn dimension(&self) -> usize {
        self.matrix.nrows()
    }

    /// The number of stored entries.
    pub fn nnz(&self) -> usize {
        self.matrix.triplet_iter().count()
    }

    /// A view of the underlying `faer` sparse matrix.
    pub fn as_sparse(&self) -> SparseColMatRef<'_, usize, T> {
        self.matrix.as_ref()
    }

    /// Encloses the spectrum using Gershgorin discs.
    ///
    /// The bounds are guaranteed (every eigenvalue lies inside them) but can be loose,
    /// which costs KPM energy resolution. Column sums are used, which equal row sums in
    /// modulus for a Hermitian matrix.
    pub fn gershgorin_bounds(&self) -> SpectralBounds<T::Precision> {
        let n = self.dimension();
        let mut centers = vec![T::Precision::zero(); n];
        let mut radii = vec![T::Precision::zero(); n];
        for t in self.matrix.triplet_iter() {
            if t.row == t.col {
                centers[t.col] = t.val.real_part();
            } else {
                radii[t.col] = radii[t.col] + t.val.abs_squared().sqrt();
            }
        }
        let mut lmin = T::Precision::infinity();
        let mut lmax = T::Precision::neg_infinity();
        for (&c, &r) in centers.iter().zip(radii.iter()) {
            lmin = lmin.min(c - r);
            lmax = lmax.max(c + r);
        }
        SpectralBounds { lmin, lmax }
    }
}

/// Checks `a_ij == conj(a_ji)` within `sqrt(eps) * max |a_ij|`.
fn check_hermitian<T: Scalar>(entries: &BTreeMap<(usize, usize), T>) -> Result<(), SpectralError> {
    let max_abs_sq = entries
        .values()
        .map(|v| v.abs_squared())
        .fold(T::Precision::zero(), |acc, x| acc.max(x));
    let tol_sq = max_abs_sq * T::Precision::epsilon();

    for (&(i, j), &a_ij) in entries {
        if i > j {
            // Each off-diagonal pair is checked once, from the upper triangle, and the
            // lower-only entries are caught through their missing partner below.
            if !entries.contains_key(&(j, i)) && a_ij.abs_squared() > tol_sq {
                return Err(not_hermitian(i, j));
            }
            continue;
        }
        let a_ji = entries.get(&(j, i)).copied().unwrap_or_else(zero::<T>);
        if (a_ij - a_ji.conjugate()).abs_squared() > tol_sq {
            return Err(not_hermitian(i, j));
        }
    }
    Ok(())
}

fn not_hermitian(i: usize, j: usize) -> SpectralError {
    SpectralError::shape(format!(
        "entry ({i}, {j}) is not the conjugate of entry ({j}, {i})."
    ))
}

impl<T: Scalar> LinearOperator<T> for SparseHermitianMatrix<T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    fn apply(&self, rhs: MatRef<'_, T>) -> Mat<T> {
        let op = self.matrix.as_ref();
        assert_eq!(
            op.ncols(),
            rhs.nrows(),
            "Dimension mismatch: operator columns ({}) do not match vector rows ({}).",
            op.ncols(),
            rhs.nrows(),
        );
        let mut out = Mat::<T>::zeros(op.nrows(), rhs.ncols());
        let mut mem = MemBuffer::new(op.apply_scratch(rhs.ncols(), Par::Seq));
        op.apply(out.as_mut(), rhs, Par::Seq, MemStack::new(&mut mem));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::{c64, mat};

    fn path_triplets(n: usize) -> Vec<Triplet<usize, usize, f64>> {
        let mut triplets = Vec::new();
        for i in 0..n {
            triplets.push(Triplet { row: i, col: i, val: 2.0 });
            if i + 1 < n {
                triplets.push(Triplet { row: i, col: i + 1, val: -1.0 });
                triplets.push(Triplet { row: i + 1, col: i, val: -1.0 });
            }
        }
        triplets
    }

    #[test]
    fn test_linear_operator_for_mat() {
        let matrix: Mat<f64> = mat![[2.0, -1.0, 0.0], [-1.0, 2.0, -1.0], [0.0, -1.0, 2.0],];
        let vector: Mat<f64> = mat![[1.0], [2.0], [3.0]];
        let expected_result = &matrix * &vector;

        let operator: &dyn LinearOperator<f64> = &matrix;
        let result = operator.apply(vector.as_ref());

        assert_eq!(result, expected_result);
        assert_eq!(operator.nrows(), 3);
        assert_eq!(operator.ncols(), 3);
    }

    #[test]
    fn test_sparse_matches_dense_product() {
        let n = 5;
        let sparse = SparseHermitianMatrix::try_from_triplets(n, &path_triplets(n)).unwrap();
        let dense = Mat::from_fn(n, n, |i, j| {
            if i == j {
                2.0
            } else if i.abs_diff(j) == 1 {
                -1.0
            } else {
                0.0
            }
        });
        let x = Mat::from_fn(n, 2, |i, j| (i + 3 * j) as f64);
        let diff = &sparse.apply(x.as_ref()) - &LinearOperator::apply(&dense, x.as_ref());
        assert!(diff.norm_l2() < 1e-14);
    }

    #[test]
    fn test_duplicates_are_summed() {
        let triplets = vec![
            Triplet { row: 0, col: 0, val: 1.0 },
            Triplet { row: 0, col: 0, val: 2.0 },
            Triplet { row: 1, col: 1, val: -1.0 },
        ];
        let sparse = SparseHermitianMatrix::try_from_triplets_inferred(&triplets).unwrap();
        assert_eq!(sparse.dimension(), 2);
        assert_eq!(sparse.nnz(), 2);
        let y = sparse.apply(mat![[1.0], [1.0]].as_ref());
        assert_eq!(y, mat![[3.0], [-1.0]]);
    }

    #[test]
    fn test_non_symmetric_input_is_rejected() {
        let triplets = vec![
            Triplet { row: 0, col: 1, val: 1.0 },
            Triplet { row: 1, col: 0, val: 2.0 },
        ];
        let err = SparseHermitianMatrix::try_from_triplets(2, &triplets).unwrap_err();
        assert!(matches!(err.kind(), crate::error::ErrorKind::ShapeMismatch(_)));
    }

    #[test]
    fn test_missing_partner_is_rejected() {
        let triplets = vec![Triplet { row: 2, col: 0, val: 1.0 }];
        let err = SparseHermitianMatrix::try_from_triplets(3, &triplets).unwrap_err();
        assert!(matches!(err.kind(), crate::error::ErrorKind::ShapeMismatch(_)));
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let triplets = vec![Triplet { row: 0, col: 4, val: 1.0 }];
        let err = SparseHermitianMatrix::try_from_triplets(3, &triplets).unwrap_err();
        assert!(matches!(err.kind(), crate::error::ErrorKind::ShapeMismatch(_)));
    }

    #[test]
    fn test_complex_hermitian_is_accepted() {
        let z = c64::new(0.5, 1.5);
        let triplets = vec![
            Triplet { row: 0, col: 1, val: z },
            Triplet { row: 1, col: 0, val: z.conjugate() },
            Triplet { row: 0, col: 0, val: c64::new(1.0, 0.0) },
        ];
        assert!(SparseHermitianMatrix::try_from_triplets(2, &triplets).is_ok());

        // A complex diagonal entry is not Hermitian.
        let triplets = vec![Triplet { row: 0, col: 0, val: c64::new(1.0, 1.0) }];
        assert!(SparseHermitianMatrix::try_from_triplets(1, &triplets).is_err());
    }

    #[test]
    fn test_gershgorin_encloses_path_spectrum() {
        let n = 8;
        let sparse = SparseHermitianMatrix::try_from_triplets(n, &path_triplets(n)).unwrap();
        let bounds = sparse.gershgorin_bounds();
        assert_eq!(bounds.lmin, 0.0);
        assert_eq!(bounds.lmax, 4.0);
    }
}
