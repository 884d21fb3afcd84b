//! Experiment Runner for the Density of States of the Anderson model.
//!
//! This executable builds an Anderson tight-binding Hamiltonian on a 1D, 2D or 3D
//! lattice, estimates its density of states with the Kernel Polynomial Method, and writes
//! the resulting curve to a CSV file with the columns `energy,density`.
//!
//! A non-zero `--flux` threads a magnetic field through the lattice, which makes the
//! Hamiltonian complex Hermitian; the runner then switches to complex arithmetic in the
//! requested precision.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use faer::{c32, c64};
use num_traits::ToPrimitive;
use serde::Serialize;
use spectral_kpm::{
    Kernel, KpmParams, ProbeKind, kpm, scalar::Scalar, utils::lattice::AndersonModel,
};
use std::{path::PathBuf, time::Instant};

/// The working precision of the probe vectors and recurrences.
#[derive(ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
enum Precision {
    Single,
    Double,
}

/// How the spectral bounds used for rescaling are obtained.
#[derive(ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
enum BoundsStrategy {
    /// A short Lanczos run (tight, may need `--bounds-steps` for large lattices).
    Lanczos,
    /// Gershgorin discs of the sparse matrix (guaranteed, loose).
    Gershgorin,
    /// The analytic bound `±(2 d t + W / 2)` of the lattice model.
    Model,
}

/// The damping kernel.
#[derive(ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
enum KernelChoice {
    Jackson,
    Lorentz,
    Dirichlet,
}

/// Command-line arguments for the density-of-states experiment.
#[derive(Parser, Debug)]
#[clap(
    name = "kpm-dos",
    about = "Computes the KPM density of states of an Anderson lattice Hamiltonian."
)]
struct DosArgs {
    /// The lattice extent along each axis, e.g. `--shape 64,64` (1 to 3 axes).
    #[clap(long, value_delimiter = ',', default_value = "64,64")]
    shape: Vec<usize>,

    /// The disorder strength W.
    #[clap(long, default_value_t = 0.0)]
    disorder: f64,

    /// The magnetic flux (per plaquette in 2D/3D, through the ring in 1D).
    #[clap(long, default_value_t = 0.0)]
    flux: f64,

    /// Use periodic instead of open boundaries.
    #[clap(long)]
    periodic: bool,

    /// The number of Chebyshev moments.
    #[clap(long, default_value_t = 256)]
    num_moments: usize,

    /// The number of random probe vectors.
    #[clap(long, default_value_t = 16)]
    num_vecs: usize,

    /// Grid points added on top of the number of moments.
    #[clap(long, default_value_t = 256)]
    extra_points: usize,

    /// The rescaling margin epsilon.
    #[clap(long, default_value_t = 0.01)]
    epsilon: f64,

    /// The damping kernel.
    #[clap(long, value_enum, default_value_t = KernelChoice::Jackson)]
    kernel: KernelChoice,

    /// The parameter of the Lorentz kernel.
    #[clap(long, default_value_t = 4.0)]
    lambda: f64,

    /// Use Gaussian probe vectors instead of the default random signs/phases.
    #[clap(long)]
    gaussian_probes: bool,

    /// How the spectral bounds are obtained.
    #[clap(long, value_enum, default_value_t = BoundsStrategy::Lanczos)]
    bounds: BoundsStrategy,

    /// The Lanczos budget of the bounds estimate.
    #[clap(long, default_value_t = 64)]
    bounds_steps: usize,

    /// The working precision.
    #[clap(long, value_enum, default_value_t = Precision::Double)]
    precision: Precision,

    /// The seed of the disorder and of the probe vectors.
    #[clap(long, default_value_t = 0)]
    seed: u64,

    /// Path to the output CSV file where the density will be written.
    #[clap(long, value_name = "PATH")]
    output: PathBuf,
}

/// A single point of the density curve.
#[derive(Debug, Serialize)]
struct DensityRecord {
    energy: f64,
    density: f64,
}

/// Builds the Hamiltonian in the scalar type `T` and runs KPM on it.
fn run<T: Scalar>(args: &DosArgs, model: &AndersonModel) -> Result<Vec<DensityRecord>> {
    let h = model.build::<T>()?;
    log::info!("Built Hamiltonian: n = {}, nnz = {}", h.dimension(), h.nnz());

    let (lmin, lmax) = match args.bounds {
        BoundsStrategy::Lanczos => (None, None),
        BoundsStrategy::Gershgorin => {
            let bounds = h.gershgorin_bounds();
            (bounds.lmin.to_f64(), bounds.lmax.to_f64())
        }
        BoundsStrategy::Model => {
            let radius = model.spectral_radius_bound();
            (Some(-radius), Some(radius))
        }
    };
    let kernel = match args.kernel {
        KernelChoice::Jackson => Kernel::Jackson,
        KernelChoice::Lorentz => Kernel::Lorentz {
            lambda: args.lambda,
        },
        KernelChoice::Dirichlet => Kernel::Dirichlet,
    };
    let params = KpmParams {
        num_moments: args.num_moments,
        num_vecs: args.num_vecs,
        extra_points: args.extra_points,
        lmin,
        lmax,
        epsilon: args.epsilon,
        kernel,
        probe: args.gaussian_probes.then_some(ProbeKind::Gaussian),
        seed: args.seed,
        bounds_steps: args.bounds_steps,
    };

    let start = Instant::now();
    let output = kpm(&h, &params)?;
    log::info!(
        "KPM finished in {:.3} s: bounds [{:?}, {:?}], integral {:?}",
        start.elapsed().as_secs_f64(),
        output.bounds.lmin,
        output.bounds.lmax,
        output.density.integrate()
    );

    Ok(output
        .density
        .points()
        .map(|(energy, density)| DensityRecord {
            energy: energy.to_f64().unwrap_or(f64::NAN),
            density: density.to_f64().unwrap_or(f64::NAN),
        })
        .collect())
}

/// The main entry point for the density-of-states experiment.
fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;
    let args = DosArgs::parse();

    let model = AndersonModel {
        shape: args.shape.clone(),
        hopping: 1.0,
        disorder: args.disorder,
        flux: args.flux,
        periodic: args.periodic,
        seed: args.seed,
    };
    let complex = args.flux != 0.0;
    log::info!(
        "Starting KPM density of states: lattice {:?}, W = {}, flux = {}, {:?} precision, {}",
        model.shape,
        model.disorder,
        model.flux,
        args.precision,
        if complex { "complex" } else { "real" }
    );

    let records = match (args.precision, complex) {
        (Precision::Single, false) => run::<f32>(&args, &model),
        (Precision::Double, false) => run::<f64>(&args, &model),
        (Precision::Single, true) => run::<c32>(&args, &model),
        (Precision::Double, true) => run::<c64>(&args, &model),
    }?;

    log::info!("Writing {} points to {:?}...", records.len(), &args.output);
    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create CSV writer for {:?}", &args.output))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    log::info!("Density of states complete.");
    Ok(())
}
