//! Size-search driver: binary search over `N`, probing in parallel, caching
//! each probe's decoded model to `<input>.sat-size=<N>.json`.

use anyhow::{bail, Context, Result};
use clap::Parser;
use da_sat::matrix::TrieMatrix;
use da_sat::search;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about = "Binary-search for the smallest double-array size")]
struct Cli {
    /// Path to the input trie matrix JSON file.
    #[arg(long, value_name = "FILE")]
    input: PathBuf,

    /// Path to write the winning double array JSON to.
    #[arg(long, value_name = "FILE")]
    output: PathBuf,

    /// Per-probe wall-clock budget, e.g. `30s`, `5m`, `1h`.
    #[arg(long, value_name = "N[s|m|h]")]
    timeout: String,

    /// Lower bound of the search window (default: 1).
    #[arg(long, value_name = "INT")]
    size_beg: Option<usize>,

    /// Upper bound of the search window (default: derived from the matrix).
    #[arg(long, value_name = "INT")]
    size_end: Option<usize>,

    /// Number of probes to run in parallel.
    #[arg(long, value_name = "INT", default_value_t = 1)]
    n_proc: usize,
}

fn parse_timeout(s: &str) -> Result<Duration> {
    let (digits, unit) = s.split_at(s.len().saturating_sub(1));
    let value: u64 = digits
        .parse()
        .with_context(|| format!("invalid timeout '{s}': expected a number followed by s/m/h"))?;
    let seconds = match unit {
        "s" => value,
        "m" => value * 60,
        "h" => value * 3600,
        other => bail!("invalid timeout unit '{other}': expected s, m or h"),
    };
    Ok(Duration::from_secs(seconds))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .init();

    let timeout = parse_timeout(&cli.timeout)?;

    let mat = TrieMatrix::load(&cli.input)
        .with_context(|| format!("reading trie matrix from {}", cli.input.display()))?;

    let size_end = cli.size_end.unwrap_or_else(|| search::default_upper_bound(&mat));
    let size_beg = cli.size_beg.unwrap_or(1);

    log::info!(
        "searching N in ({}, {}] with timeout={timeout:?}, n_proc={}",
        size_beg.saturating_sub(1),
        size_end,
        cli.n_proc
    );

    let result = search::search(&mat, size_beg, size_end, timeout, cli.n_proc)
        .context("search exhausted its bracket without finding a feasible size")?;

    let cache_path = format!("{}.sat-size={}.json", cli.input.display(), result.n_arr);
    result
        .model
        .save(&cache_path)
        .with_context(|| format!("caching probe result to {cache_path}"))?;
    result
        .model
        .save(&cli.output)
        .with_context(|| format!("writing result to {}", cli.output.display()))?;

    println!(
        "RESULT method=subopt file={} length={} searchstartlength={} searchendlength={} procs={} timeout={timeout:?}",
        cli.input.display(),
        result.n_arr,
        size_beg,
        size_end,
        cli.n_proc
    );
    Ok(())
}
