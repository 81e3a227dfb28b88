//! Single-size solver: encode one `(mat, n_arr)` probe and solve it, in
//! feasibility or minimize mode.

use anyhow::{Context, Result};
use clap::Parser;
use da_sat::matrix::TrieMatrix;
use da_sat::solver;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Solve one double-array layout probe")]
struct Cli {
    /// Path to the input trie matrix JSON file.
    #[arg(long, value_name = "FILE")]
    mat: PathBuf,

    /// Candidate array size `N`.
    #[arg(long, value_name = "INT")]
    n_arr: usize,

    /// Path to write the decoded double array JSON to.
    #[arg(long, value_name = "FILE")]
    output: PathBuf,

    /// Minimize the number of used slots instead of just finding any model.
    #[arg(long)]
    minimize: bool,

    /// Log verbosity.
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Critical,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            // `log` has no CRITICAL level; Error is the closest fit.
            LogLevel::Critical => log::LevelFilter::Error,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.into())
        .init();

    let mat = TrieMatrix::load(&cli.mat)
        .with_context(|| format!("reading trie matrix from {}", cli.mat.display()))?;

    log::info!("solving {} (n_arr={}, minimize={})", cli.mat.display(), cli.n_arr, cli.minimize);

    let da = if cli.minimize {
        solver::solve_minimize(&mat, cli.n_arr)
    } else {
        solver::solve_feasibility(&mat, cli.n_arr)
    }
    .with_context(|| format!("solving at n_arr={}", cli.n_arr))?;

    da.save(&cli.output)
        .with_context(|| format!("writing result to {}", cli.output.display()))?;

    println!(
        "Solved: wrote double array (n_arr={}) to '{}'",
        da.n_arr(),
        cli.output.display()
    );
    Ok(())
}
