//! The numerical kernels behind the two estimators.
//!
//! * [`lanczos`]: Lanczos tridiagonalisation with full re-orthogonalisation and an
//!   orthogonality-health test that detects invariant subspaces.
//! * [`chebyshev`]: the Chebyshev recursion producing one probe's KPM moments.
//! * [`kernel`]: damping coefficients suppressing Gibbs oscillations.
//! * [`density`]: reconstruction of the density of states from damped moments.
//! * [`quadrature`]: Gauss quadrature rules from the Lanczos tridiagonal matrix.
//!
//! All of them act on a single probe vector. The stochastic averaging over probes lives in
//! [`crate::solvers`] and [`crate::aggregate`].

pub mod chebyshev;
pub mod density;
pub mod kernel;
pub mod lanczos;
pub mod quadrature;
