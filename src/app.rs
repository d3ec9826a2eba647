//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - builds the model from a params file and flag overrides
//! - runs the requested solver or simulator
//! - prints reports and writes optional exports

use std::time::Duration;

use clap::Parser;

use crate::cli::{Command, ExtinctionArgs, LimitArgs, QuasistationaryArgs, SimulateArgs};
use crate::error::AppError;
use crate::sim::{MonteCarloOptions, RunControl, SamplerOptions, SamplingMode};
use crate::solve::{LimitOptions, QuasistationaryOptions};

pub mod pipeline;

/// Entry point for the `methyl` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Simulate(args) => handle_simulate(args),
        Command::Extinction(args) => handle_extinction(args),
        Command::Limit(args) => handle_limit(args),
        Command::Quasistationary(args) => handle_quasistationary(args),
    }
}

fn run_control(timeout_secs: Option<u64>) -> RunControl {
    match timeout_secs {
        Some(secs) => RunControl::none().with_timeout(Duration::from_secs(secs)),
        None => RunControl::none(),
    }
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let setup = pipeline::load_model(&args.model)?;
    let n_initial = initial_counts(&args, setup.model.state_count())?;
    let opts = SamplerOptions {
        mode: if args.deterministic {
            SamplingMode::Deterministic
        } else {
            SamplingMode::Stochastic
        },
        normalized: args.normalized,
        max_steps: args.max_steps,
        seed: args.seed,
        control: run_control(args.timeout_secs),
    };

    let traj = pipeline::run_simulation(&setup, &n_initial, args.duration, args.steps, &opts)?;

    println!("{}", crate::report::format_model_header(setup.kind, &setup.params));
    println!("{}", crate::report::format_trajectory(&traj));

    if let Some(path) = &args.export {
        crate::io::write_trajectory(path, &traj)?;
    }
    Ok(())
}

/// `--initial` verbatim, or `--cells` founders in `--start-state`.
pub fn initial_counts(args: &SimulateArgs, states: usize) -> Result<Vec<u64>, AppError> {
    if let Some(initial) = &args.initial {
        return Ok(initial.clone());
    }
    if args.start_state >= states {
        return Err(AppError::new(
            2,
            format!("start state {} is outside [0, {}]", args.start_state, states - 1),
        ));
    }
    let mut n = vec![0; states];
    n[args.start_state] = args.cells;
    Ok(n)
}

fn handle_extinction(args: ExtinctionArgs) -> Result<(), AppError> {
    let setup = pipeline::load_model(&args.model)?;
    let monte_carlo = args.monte_carlo.map(|attempts| {
        (
            attempts,
            MonteCarloOptions {
                duration: args.mc_duration,
                max_steps: args.mc_max_steps,
                seed: args.seed,
                control: run_control(args.timeout_secs),
            },
        )
    });

    let run = pipeline::run_extinction(&setup, monte_carlo, &args.sweep)?;

    println!("{}", crate::report::format_model_header(setup.kind, &setup.params));
    println!("{}", crate::report::format_extinction_table(&run.rows, &run.solution));
    if !run.sweep.is_empty() {
        println!("By site count:\n{}", crate::report::format_site_sweep(&run.sweep));
    }

    if let Some(path) = &args.export {
        crate::io::write_extinction(path, &run.solution, &run.rows)?;
    }
    Ok(())
}

fn handle_limit(args: LimitArgs) -> Result<(), AppError> {
    let setup = pipeline::load_model(&args.model)?;
    let opts = LimitOptions {
        substeps: args.substeps,
        ..LimitOptions::default()
    };
    let run = pipeline::run_limit(&setup, args.points, &args.scales, &opts)?;

    println!("{}", crate::report::format_model_header(setup.kind, &setup.params));
    println!("{}", crate::report::format_limit_curve(&run.curve));
    if !run.by_scale.is_empty() {
        println!("By methylation scale:\n{}", crate::report::format_scale_sweep(&run.by_scale));
    }

    if let Some(path) = &args.export {
        crate::io::write_limit_curve(path, &run.curve)?;
    }
    Ok(())
}

fn handle_quasistationary(args: QuasistationaryArgs) -> Result<(), AppError> {
    let setup = pipeline::load_model(&args.model)?;
    let opts = QuasistationaryOptions {
        tol: args.tol,
        max_iter: args.max_iter,
        initial: None,
    };
    let run = pipeline::run_quasistationary(&setup, &opts, !args.no_eigen)?;

    println!("{}", crate::report::format_model_header(setup.kind, &setup.params));
    println!(
        "{}",
        crate::report::format_quasistationary(&run.distribution, run.eigen.as_ref())
    );

    if let Some(path) = &args.export {
        crate::io::write_quasistationary(path, &run.distribution)?;
    }
    Ok(())
}
