//! This module provides the high-level API: the full KPM and SLQ pipelines.
//!
//! Both estimators share the same outer structure. `num_vecs` probe vectors are drawn
//! from independent random streams, each probe is pushed through a sequential recurrence
//! (Chebyshev for KPM, Lanczos for SLQ), and the per-probe results are averaged. The
//! probes are processed in parallel with `rayon`; results are collected in probe order,
//! so the output for a given seed does not depend on the number of threads.

use crate::{
    aggregate::{MomentEstimate, TraceEstimate},
    algorithms::{
        chebyshev::probe_moments,
        density::{DensityCurve, reconstruct_density},
        lanczos::lanczos,
        quadrature::{QuadratureRule, gauss_quadrature},
    },
    error::{ErrorKind, SpectralError},
    matrix::LinearOperator,
    params::{KpmParams, SlqParams},
    probe::ProbeGenerator,
    rescale::{RescaledOperator, SpectralBounds, estimate_bounds},
    scalar::{Scalar, real, to_f64},
};
use num_traits::{Float, Zero};
use rayon::prelude::*;

/// The result of a KPM run.
#[derive(Debug, Clone)]
pub struct KpmOutput<P> {
    /// The density of states on the original energy axis.
    pub density: DensityCurve<P>,
    /// The Chebyshev moments, averaged and per probe.
    pub moments: MomentEstimate<P>,
    /// The damping coefficients `g_k` applied to the moments.
    pub kernel: Vec<P>,
    /// The spectral bounds used for the rescaling.
    pub bounds: SpectralBounds<P>,
    /// The factor `a` of the rescaling `H' = (H - b) / a`.
    pub scale_fact_a: P,
    /// The shift `b` of the rescaling.
    pub scale_fact_b: P,
}

/// Estimates the density of states of `operator` with the Kernel Polynomial Method.
///
/// The spectrum is mapped into `[-1, 1]` using `params.lmin`/`params.lmax` when given,
/// or bounds estimated with a short Lanczos run otherwise. The returned curve is
/// expressed in the units of `operator` and integrates to approximately one.
///
/// # Arguments
/// * `operator`: a Hermitian operator implementing [`LinearOperator`].
/// * `params`: the KPM configuration, validated before any work is done.
///
/// # Returns
/// A [`KpmOutput`] with the density curve and the moments it was built from.
///
/// # Errors
/// * [`crate::error::ErrorKind::InvalidParameter`] for invalid parameters.
/// * [`crate::error::ErrorKind::ShapeMismatch`] for an empty or non-square operator.
/// * [`crate::error::ErrorKind::DegenerateSpectrum`] if the bounds (given or estimated)
///   do not span a non-empty interval.
pub fn kpm<T, O>(operator: &O, params: &KpmParams) -> Result<KpmOutput<T::Precision>, SpectralError>
where
    T: Scalar,
    O: LinearOperator<T> + ?Sized,
{
    params.validate()?;
    let n = square_dimension::<T, O>(operator)?;

    let bounds = match (params.lmin, params.lmax) {
        (Some(lmin), Some(lmax)) => SpectralBounds::new(real(lmin), real(lmax))?,
        _ => {
            let estimated = estimate_bounds::<T, O>(operator, params.bounds_steps, params.seed)?;
            check_resolvable(estimated)?
        }
    };
    let rescaled = RescaledOperator::<T, O>::new(operator, bounds, real(params.epsilon))?;

    let kind = params.probe.unwrap_or_else(T::default_probe);
    let generator = ProbeGenerator::new(kind, params.seed, n);
    log::debug!(
        "KPM: n = {n}, {} moments, {} {kind:?} probes",
        params.num_moments,
        params.num_vecs
    );

    let per_probe = (0..params.num_vecs)
        .into_par_iter()
        .map(|p| {
            let v = generator.probe::<T>(p);
            probe_moments(&rescaled, v.as_ref(), params.num_moments)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let moments = MomentEstimate::from_probes(per_probe)?;

    let kernel = params.kernel.coefficients(params.num_moments)?;
    let density = reconstruct_density(
        &moments.mean,
        &kernel,
        params.extra_points,
        rescaled.scale_fact_a(),
        rescaled.scale_fact_b(),
    )?;

    Ok(KpmOutput {
        density,
        moments,
        kernel,
        bounds,
        scale_fact_a: rescaled.scale_fact_a(),
        scale_fact_b: rescaled.scale_fact_b(),
    })
}

/// Estimates `tr(f(H))` with Stochastic Lanczos Quadrature.
///
/// Each probe is tridiagonalised with [`lanczos`] and contributes the Gauss quadrature
/// value `e_1^T f(T_m) e_1`. No rescaling is applied: `f` is evaluated at Ritz values in
/// the units of `operator`, so it must be defined on its whole spectrum (for example
/// `f = ln` needs a positive definite operator).
///
/// # Arguments
/// * `operator`: a Hermitian operator implementing [`LinearOperator`].
/// * `params`: the SLQ configuration, validated before any work is done.
/// * `f`: the scalar function whose trace is estimated.
///
/// # Returns
/// A [`TraceEstimate`] with the estimate and the per-probe samples.
///
/// # Errors
/// [`crate::error::ErrorKind::InvalidParameter`] for invalid parameters,
/// [`crate::error::ErrorKind::ShapeMismatch`] for an empty or non-square operator,
/// [`crate::error::ErrorKind::Eigendecomposition`] if a small eigenproblem fails.
pub fn slq<T, O, F>(
    operator: &O,
    params: &SlqParams,
    f: F,
) -> Result<TraceEstimate<T::Precision>, SpectralError>
where
    T: Scalar,
    O: LinearOperator<T> + ?Sized,
    F: Fn(T::Precision) -> T::Precision + Sync,
{
    let (n, rules) = quadrature_rules::<T, O>(operator, params)?;
    let breakdowns = rules.iter().filter(|(_, broke)| *broke).count();
    let gammas: Vec<T::Precision> = rules.iter().map(|(rule, _)| rule.evaluate(&f)).collect();

    let estimate = TraceEstimate::from_gammas(n, gammas, breakdowns)?;
    log::debug!(
        "SLQ: trace estimate {} +/- {} over {} probes ({breakdowns} breakdowns)",
        to_f64(estimate.estimate),
        to_f64(estimate.std_error()),
        estimate.num_vecs()
    );
    Ok(estimate)
}

/// Estimates the density of states from the SLQ quadrature nodes.
///
/// Every Ritz value `θ_i` of every probe is replaced by a normal density of width
/// `sigma` carrying the quadrature weight `τ_i`:
///
/// ```text
///     ρ(E) = (1 / num_vecs) Σ_probes Σ_i τ_i exp(-(E - θ_i)^2 / (2 σ^2)) / (σ sqrt(2π)).
/// ```
///
/// # Arguments
/// * `energies`: the strictly increasing evaluation grid, in the units of `operator`.
/// * `sigma`: the broadening width, positive.
///
/// # Errors
/// [`crate::error::ErrorKind::InvalidParameter`] for an empty or non-increasing grid, a
/// non-positive `sigma`, or any of the conditions of [`slq`].
pub fn slq_density<T, O>(
    operator: &O,
    params: &SlqParams,
    energies: &[T::Precision],
    sigma: T::Precision,
) -> Result<DensityCurve<T::Precision>, SpectralError>
where
    T: Scalar,
    O: LinearOperator<T> + ?Sized,
{
    if energies.is_empty() || energies.windows(2).any(|w| !(w[0] < w[1])) {
        return Err(SpectralError::invalid(
            "the energy grid must be non-empty and strictly increasing.",
        ));
    }
    if !(sigma > T::Precision::zero()) || !sigma.is_finite() {
        return Err(SpectralError::invalid(format!(
            "sigma must be a positive, finite number, got {}.",
            to_f64(sigma)
        )));
    }

    let (_, rules) = quadrature_rules::<T, O>(operator, params)?;
    let norm = real::<T::Precision>((2.0 * std::f64::consts::PI).sqrt()) * sigma
        * real::<T::Precision>(rules.len() as f64);
    let two_sigma_sq = real::<T::Precision>(2.0) * sigma * sigma;

    let densities = energies
        .iter()
        .map(|&e| {
            let total = rules.iter().fold(T::Precision::zero(), |acc, (rule, _)| {
                acc + rule.evaluate(|theta| (-(e - theta) * (e - theta) / two_sigma_sq).exp())
            });
            total / norm
        })
        .collect();

    Ok(DensityCurve {
        energies: energies.to_vec(),
        densities,
    })
}

/// Runs one Lanczos tridiagonalisation per probe and returns the quadrature rules with
/// a breakdown flag, in probe order.
fn quadrature_rules<T, O>(
    operator: &O,
    params: &SlqParams,
) -> Result<(usize, Vec<(QuadratureRule<T::Precision>, bool)>), SpectralError>
where
    T: Scalar,
    O: LinearOperator<T> + ?Sized,
{
    params.validate()?;
    let n = square_dimension::<T, O>(operator)?;
    let num_steps = params.num_steps.min(n);
    let orth_tol = real::<T::Precision>(params.orth_tol);

    let kind = params.probe.unwrap_or_else(T::default_probe);
    let generator = ProbeGenerator::new(kind, params.seed, n);
    log::debug!(
        "SLQ: n = {n}, {num_steps} Lanczos steps, {} {kind:?} probes",
        params.num_vecs
    );

    let rules = (0..params.num_vecs)
        .into_par_iter()
        .map(|p| -> Result<_, SpectralError> {
            let v = generator.probe::<T>(p);
            let output = lanczos(operator, v.as_ref(), num_steps, orth_tol)?;
            let rule = gauss_quadrature(&output.tridiagonal)?;
            Ok((rule, output.termination.is_breakdown()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((n, rules))
}

/// Rejects estimated bounds that are equal up to rounding, as found for a multiple of the
/// identity. Rescaling by such a width would amplify rounding errors without limit.
fn check_resolvable<P: Float>(bounds: SpectralBounds<P>) -> Result<SpectralBounds<P>, SpectralError> {
    let magnitude = bounds.lmin.abs().max(bounds.lmax.abs());
    if bounds.width() <= P::epsilon().sqrt() * magnitude {
        return Err(ErrorKind::DegenerateSpectrum {
            lmin: to_f64(bounds.lmin),
            lmax: to_f64(bounds.lmax),
        }
        .into());
    }
    SpectralBounds::new(bounds.lmin, bounds.lmax)
}

fn square_dimension<T, O>(operator: &O) -> Result<usize, SpectralError>
where
    T: Scalar,
    O: LinearOperator<T> + ?Sized,
{
    let n = operator.ncols();
    if n == 0 || operator.nrows() != n {
        return Err(SpectralError::shape(format!(
            "the operator must be square and non-empty, got {} x {}.",
            operator.nrows(),
            n
        )));
    }
    Ok(n)
}
