//! Lanczos tridiagonalisation with full re-orthogonalisation.
//!
//! For a Hermitian operator `A` and a start vector `v_0`, the Lanczos process builds an
//! orthonormal basis `V_m = [v_0, ..., v_{m-1}]` of the Krylov subspace
//! `K_m(A, v_0)` together with the real symmetric tridiagonal projection
//! `T_m = V_m^H A V_m`:
//!
//! ```text
//!     T_m = | α_0 β_0              |
//!           | β_0 α_1 β_1          |
//!           |     β_1 ...   β_m-2  |
//!           |         β_m-2 α_m-1  |
//! ```
//!
//! In floating point the three-term recurrence loses orthogonality as Ritz values
//! converge. Every new direction is therefore explicitly re-projected against the whole
//! accumulated basis, which keeps `V_m` orthonormal to working precision at the cost of
//! `O(n m)` work per step and `O(n m)` memory.
//!
//! ## Orthogonality health test
//!
//! The process keeps a running sum `wn = Σ α_i^2 + 2 Σ β_i^2`, an estimate of
//! `||T_m||_F^2`. Step `k` (1-based) is accepted only if
//!
//! ```text
//!     wn * orth_tol < β_k^2 * k
//! ```
//!
//! i.e. the new residual is not negligible relative to the size of the projection seen so
//! far. A failing test means the Krylov subspace is (numerically) invariant: the
//! iteration stops and reports [`Termination::Breakdown`]. This is not an error; the
//! tridiagonal matrix built so far is exact on the invariant subspace and is returned
//! as-is.

use crate::{
    error::SpectralError,
    matrix::LinearOperator,
    scalar::{Scalar, real},
};
use faer::{Mat, MatRef, Scale};
use num_traits::{Float, Zero};

/// The default orthogonality tolerance of the health test.
pub const DEFAULT_ORTH_TOL: f64 = 1e-7;

/// Why a Lanczos run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// All requested steps were performed.
    StepBudget,
    /// The health test failed at the given (1-based) step: an invariant subspace of
    /// dimension `step` was found.
    Breakdown { step: usize },
}

impl Termination {
    /// `true` if the run ended on an invariant subspace.
    pub fn is_breakdown(&self) -> bool {
        matches!(self, Termination::Breakdown { .. })
    }
}

/// The real symmetric tridiagonal matrix `T_m` produced by a Lanczos run.
#[derive(Debug, Clone, PartialEq)]
pub struct TridiagonalMatrix<P> {
    alphas: Vec<P>,
    betas: Vec<P>,
}

impl<P: Float> TridiagonalMatrix<P> {
    /// Creates `T_m` from its diagonal (`m` values) and off-diagonal (`m - 1` values).
    ///
    /// # Errors
    /// [`crate::error::ErrorKind::InvalidParameter`] if the diagonal is empty or the
    /// lengths are inconsistent.
    pub fn new(alphas: Vec<P>, betas: Vec<P>) -> Result<Self, SpectralError> {
        if alphas.is_empty() || betas.len() + 1 != alphas.len() {
            return Err(SpectralError::invalid(format!(
                "a tridiagonal matrix needs m > 0 diagonal and m - 1 off-diagonal entries, got {} and {}.",
                alphas.len(),
                betas.len()
            )));
        }
        Ok(Self { alphas, betas })
    }

    /// The size `m`.
    pub fn dim(&self) -> usize {
        self.alphas.len()
    }

    /// The diagonal coefficients `α_0, ..., α_{m-1}`.
    pub fn alphas(&self) -> &[P] {
        &self.alphas
    }

    /// The off-diagonal coefficients `β_0, ..., β_{m-2}`.
    pub fn betas(&self) -> &[P] {
        &self.betas
    }
}

/// The result of a Lanczos run on one start vector.
#[derive(Debug, Clone)]
pub struct LanczosOutput<T: Scalar> {
    /// The orthonormal Krylov basis `V_m` (`n x m`).
    pub basis: Mat<T>,
    /// The tridiagonal projection `T_m`.
    pub tridiagonal: TridiagonalMatrix<T::Precision>,
    /// The norm of the residual left after the last step, `β_m`. Multiplied by the last
    /// component of a Ritz vector it bounds the distance of the Ritz value to the
    /// spectrum.
    pub residual: T::Precision,
    /// Why the run stopped.
    pub termination: Termination,
}

impl<T: Scalar> LanczosOutput<T> {
    /// The number of completed steps `m`.
    pub fn steps_taken(&self) -> usize {
        self.tridiagonal.dim()
    }
}

/// Per-probe mutable state of the iteration. Created from the start vector, consumed by
/// [`KrylovState::finish`].
struct KrylovState<T: Scalar> {
    /// The basis, preallocated for the whole budget. Columns `0..=k` hold `v_0..v_k`.
    basis: Mat<T>,
    alphas: Vec<T::Precision>,
    betas: Vec<T::Precision>,
    /// `β_{k-1}`, coupling `v_k` to `v_{k-1}`.
    beta: T::Precision,
    /// Running `Σ α_i^2 + 2 Σ β_i^2`.
    wn: T::Precision,
    residual: T::Precision,
    healthy: bool,
}

impl<T: Scalar> KrylovState<T> {
    fn new(v0: MatRef<'_, T>, num_steps: usize) -> Result<Self, SpectralError> {
        let v0_norm = T::column_norm(v0);
        if !(v0_norm > T::Precision::zero()) || !v0_norm.is_finite() {
            return Err(SpectralError::invalid(
                "The initial vector must be a finite, non-zero vector.",
            ));
        }

        let mut basis = Mat::<T>::zeros(v0.nrows(), num_steps);
        let v = v0 * Scale(T::from_real(v0_norm.recip()));
        basis.col_mut(0).copy_from(v.col(0));

        Ok(Self {
            basis,
            alphas: Vec::with_capacity(num_steps),
            betas: Vec::with_capacity(num_steps.saturating_sub(1)),
            beta: T::Precision::zero(),
            wn: T::Precision::zero(),
            residual: T::Precision::zero(),
            healthy: true,
        })
    }

    /// Performs one Lanczos step. Returns `false` when the health test fails.
    ///
    /// When `extend` is false the step only contributes its `α`; the next basis vector
    /// is not formed because the caller's step budget is exhausted.
    fn step<O>(&mut self, operator: &O, orth_tol: T::Precision, extend: bool) -> bool
    where
        O: LinearOperator<T> + ?Sized,
    {
        let k = self.alphas.len();
        let step = k + 1;
        let v = self.basis.get(.., k..k + 1);

        // w = A v_k - β_{k-1} v_{k-1}
        let mut w = operator.apply(v);
        if k > 0 {
            w -= self.basis.get(.., k - 1..k) * Scale(T::from_real(self.beta));
        }

        // The diagonal entry of a Hermitian projection is real.
        let alpha = (v.adjoint() * &w)[(0, 0)].real_part();
        self.wn = self.wn + alpha * alpha;
        self.alphas.push(alpha);
        w -= v * Scale(T::from_real(alpha));

        // Classical Gram-Schmidt against the full basis: w <- w - V (V^H w).
        let filled = self.basis.get(.., ..k + 1);
        let coefficients = filled.adjoint() * &w;
        w -= filled * &coefficients;

        let beta = T::column_norm(w.as_ref());
        let beta_sq = beta * beta;
        self.residual = beta;

        log::trace!(
            "Lanczos step {step}: alpha = {alpha:?}, beta = {beta:?}, wn = {:?}",
            self.wn
        );

        if !(self.wn * orth_tol < beta_sq * real::<T::Precision>(step as f64)) {
            self.healthy = false;
            return false;
        }
        self.wn = self.wn + real::<T::Precision>(2.0) * beta_sq;

        if extend {
            let next = &w * Scale(T::from_real(beta.recip()));
            self.basis.col_mut(k + 1).copy_from(next.col(0));
            self.betas.push(beta);
            self.beta = beta;
        }
        true
    }

    fn finish(self) -> Result<LanczosOutput<T>, SpectralError> {
        let m = self.alphas.len();
        let termination = if self.healthy {
            Termination::StepBudget
        } else {
            Termination::Breakdown { step: m }
        };

        Ok(LanczosOutput {
            basis: self.basis.get(.., ..m).to_owned(),
            tridiagonal: TridiagonalMatrix::new(self.alphas, self.betas)?,
            residual: self.residual,
            termination,
        })
    }
}

/// Runs up to `num_steps` Lanczos steps on `operator` from the start vector `v0`.
///
/// The start vector does not need to be normalised. The run stops early, with
/// [`Termination::Breakdown`], when the orthogonality health test fails.
///
/// # Arguments
/// * `operator`: a Hermitian operator implementing [`LinearOperator`].
/// * `v0`: the `n x 1` start vector. Must not be a zero vector.
/// * `num_steps`: the step budget, at least 1.
/// * `orth_tol`: the sensitivity of the health test, see the module documentation.
///
/// # Errors
/// [`crate::error::ErrorKind::InvalidParameter`] on a zero budget, a non-positive
/// tolerance, a zero start vector or mismatched dimensions.
pub fn lanczos<T, O>(
    operator: &O,
    v0: MatRef<'_, T>,
    num_steps: usize,
    orth_tol: T::Precision,
) -> Result<LanczosOutput<T>, SpectralError>
where
    T: Scalar,
    O: LinearOperator<T> + ?Sized,
{
    if operator.ncols() != v0.nrows() {
        return Err(SpectralError::dimension_mismatch(
            operator.ncols(),
            v0.nrows(),
        ));
    }
    if v0.ncols() != 1 {
        return Err(SpectralError::invalid(format!(
            "the start vector must have a single column, got {}.",
            v0.ncols()
        )));
    }
    if num_steps == 0 {
        return Err(SpectralError::invalid("num_steps must be positive."));
    }
    if !(orth_tol > T::Precision::zero()) || !orth_tol.is_finite() {
        return Err(SpectralError::invalid(
            "orth_tol must be a positive, finite number.",
        ));
    }

    let mut state = KrylovState::new(v0, num_steps)?;
    for k in 0..num_steps {
        let extend = k + 1 < num_steps;
        if !state.step(operator, orth_tol, extend) {
            break;
        }
    }

    let output = state.finish()?;
    if let Termination::Breakdown { step } = output.termination {
        log::debug!("Lanczos breakdown after {step} of {num_steps} steps: invariant subspace found.");
    }
    Ok(output)
}
