//! Command-line parsing for the methylation dynamics engine.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::RateModelKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "methyl", version, about = "Methylation-structured cell population dynamics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sample a trajectory dataset on a uniform time grid.
    Simulate(SimulateArgs),
    /// Per-state extinction probabilities, optionally against Monte Carlo.
    Extinction(ExtinctionArgs),
    /// Continuum-limit extinction curve.
    Limit(LimitArgs),
    /// Long-run population shape and growth rate.
    Quasistationary(QuasistationaryArgs),
}

/// Model selection shared by every subcommand.
///
/// Values come from `--params` when given; individual flags override single
/// fields. Without a file the base record is the built-in reference model.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Rate family.
    #[arg(long, value_enum, default_value_t = RateModelKind::Linear)]
    pub model: RateModelKind,

    /// Parameter record (JSON, model notation: b_0, b_M, d_0, d_M, r_um, r_mu, p, M, ...).
    #[arg(long, value_name = "JSON")]
    pub params: Option<PathBuf>,

    /// Number of methylation sites M.
    #[arg(short = 'M', long)]
    pub sites: Option<usize>,

    #[arg(long = "b0")]
    pub b_0: Option<f64>,

    #[arg(long = "bm")]
    pub b_m: Option<f64>,

    #[arg(long = "d0")]
    pub d_0: Option<f64>,

    #[arg(long = "dm")]
    pub d_m: Option<f64>,

    /// Per-site methylation rate.
    #[arg(long)]
    pub r_um: Option<f64>,

    /// Per-site demethylation rate.
    #[arg(long)]
    pub r_mu: Option<f64>,

    /// Daughter retention probability.
    #[arg(short = 'p', long)]
    pub retention: Option<f64>,

    /// Collaborative methylation amplitude.
    #[arg(long)]
    pub r_um_m: Option<f64>,

    /// Collaborative demethylation amplitude.
    #[arg(long)]
    pub r_mu_u: Option<f64>,

    /// Exponent of the collaborative terms.
    #[arg(long)]
    pub degree: Option<f64>,

    /// Threshold cutoff fraction.
    #[arg(long)]
    pub cutoff: Option<f64>,
}

#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Initial counts, one per state (comma separated, M+1 values).
    #[arg(long, value_delimiter = ',')]
    pub initial: Option<Vec<u64>>,

    /// Without `--initial`: number of founding cells.
    #[arg(long, default_value_t = 10)]
    pub cells: u64,

    /// Without `--initial`: state of the founding cells.
    #[arg(long, default_value_t = 0)]
    pub start_state: usize,

    /// Total simulated time.
    #[arg(long, default_value_t = 10.0)]
    pub duration: f64,

    /// Number of time steps on the grid.
    #[arg(long, default_value_t = 20)]
    pub steps: usize,

    /// Propagate expected counts instead of sampling.
    #[arg(long)]
    pub deterministic: bool,

    /// Divide counts by exp(growth * t).
    #[arg(long)]
    pub normalized: bool,

    /// Step guard per time step (stochastic mode).
    #[arg(long, default_value_t = 100_000)]
    pub max_steps: u64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Abort after this many seconds of wall time.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Export the dataset (CSV, or JSON for a `.json` path).
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ExtinctionArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Also estimate by simulation with this many lineages per state.
    #[arg(long, value_name = "ATTEMPTS")]
    pub monte_carlo: Option<usize>,

    /// Observation window per simulated lineage.
    #[arg(long, default_value_t = 100.0)]
    pub mc_duration: f64,

    /// Step guard per simulated lineage.
    #[arg(long, default_value_t = 10_000)]
    pub mc_max_steps: u64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Additionally solve at these site counts (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub sweep: Vec<usize>,

    /// Abort the Monte Carlo run after this many seconds of wall time.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Export the comparison table (CSV, or JSON for a `.json` path).
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct LimitArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Grid intervals on [0, 1].
    #[arg(long, default_value_t = 100)]
    pub points: usize,

    /// RK4 steps per grid interval.
    #[arg(long, default_value_t = 16)]
    pub substeps: usize,

    /// Also print curves with methylation and demethylation rates multiplied
    /// by these factors (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub scales: Vec<f64>,

    /// Export the curve (CSV, or JSON for a `.json` path).
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct QuasistationaryArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Convergence tolerance of the power iteration.
    #[arg(long, default_value_t = 1e-12)]
    pub tol: f64,

    /// Iteration cap.
    #[arg(long, default_value_t = 2000)]
    pub max_iter: usize,

    /// Skip the eigen-decomposition cross-check.
    #[arg(long)]
    pub no_eigen: bool,

    /// Export the distribution (CSV, or JSON for a `.json` path).
    #[arg(long)]
    pub export: Option<PathBuf>,
}
