use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use group_reduce::{AnyReducer, Backend, Element, GroupReducer, ReduceConfig, Reducer, Statistics};

#[derive(Parser)]
#[command(
    name = "group-reduce",
    about = "Parallel multi-pass min, max, mean, variance and standard deviation",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the five statistics of a numeric file
    Stats {
        /// Input file; values separated by whitespace or commas
        file: PathBuf,

        /// Elements per worker group (at least 2)
        #[arg(long)]
        group_size: Option<usize>,

        /// Execution backend
        #[arg(long, value_enum)]
        backend: Option<Backend>,

        /// GPU adapter index (see `adapters`)
        #[arg(long)]
        adapter: Option<usize>,

        /// CPU worker threads (defaults to one per core)
        #[arg(long)]
        threads: Option<usize>,

        /// Element type of the whole run
        #[arg(long, value_enum, default_value_t = Dtype::F64)]
        dtype: Dtype,

        /// TOML configuration file; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// List GPU adapters visible to the gpu backend
    Adapters {
        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
enum Dtype {
    I32,
    I64,
    F32,
    F64,
}

#[derive(Serialize)]
struct StatsReport<'a, T> {
    file: &'a Path,
    backend: Backend,
    group_size: usize,
    dtype: Dtype,
    #[serde(flatten)]
    statistics: Statistics<T>,
}

/// Flag values that take precedence over the configuration file.
#[derive(Clone, Copy, Debug, Default)]
struct Overrides {
    group_size: Option<usize>,
    backend: Option<Backend>,
    adapter: Option<usize>,
    threads: Option<usize>,
}

fn resolve_config(path: Option<&Path>, overrides: Overrides) -> Result<ReduceConfig> {
    let mut cfg = match path {
        Some(path) => ReduceConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ReduceConfig::default(),
    };
    if let Some(group_size) = overrides.group_size {
        cfg.group_size = group_size;
    }
    if let Some(backend) = overrides.backend {
        cfg.backend = backend;
    }
    if let Some(adapter) = overrides.adapter {
        cfg.adapter = adapter;
    }
    if overrides.threads.is_some() {
        cfg.threads = overrides.threads;
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Stats {
            file,
            group_size,
            backend,
            adapter,
            threads,
            dtype,
            config,
            json,
        } => {
            let cfg = resolve_config(
                config.as_deref(),
                Overrides {
                    group_size,
                    backend,
                    adapter,
                    threads,
                },
            )?;

            let group = cfg.group_size().context("invalid group size")?;
            let reducer = AnyReducer::from_config(&cfg)
                .with_context(|| format!("failed to start the {} backend", cfg.backend))?;
            let reducer = Reducer::new(reducer, group);

            tracing::info!(file = %file.display(), backend = %cfg.backend, group_size = %group, ?dtype, "computing statistics");

            match dtype {
                Dtype::I32 => run_stats::<i32>(&reducer, &file, dtype, json)?,
                Dtype::I64 => run_stats::<i64>(&reducer, &file, dtype, json)?,
                Dtype::F32 => run_stats::<f32>(&reducer, &file, dtype, json)?,
                Dtype::F64 => run_stats::<f64>(&reducer, &file, dtype, json)?,
            }
        }
        Commands::Adapters { json } => list_adapters(json)?,
    }

    Ok(())
}

fn run_stats<T>(reducer: &Reducer<AnyReducer>, file: &Path, dtype: Dtype, json: bool) -> Result<()>
where
    T: Element + FromStr,
    AnyReducer: GroupReducer<T>,
{
    let values: Vec<T> = group_reduce::dataset::read_values(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let statistics = reducer
        .summarize(&values)
        .with_context(|| format!("failed to reduce {} values", values.len()))?;

    if json {
        let report = StatsReport {
            file,
            backend: reducer.backend().kind(),
            group_size: reducer.group_size().get(),
            dtype,
            statistics,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{statistics}");
    }
    Ok(())
}

#[cfg(feature = "gpu")]
fn list_adapters(json: bool) -> Result<()> {
    let adapters = group_reduce::list_adapters();
    if json {
        println!("{}", serde_json::to_string_pretty(&adapters)?);
    } else if adapters.is_empty() {
        println!("no GPU adapters found");
    } else {
        for adapter in &adapters {
            println!("{adapter}");
        }
    }
    Ok(())
}

#[cfg(not(feature = "gpu"))]
fn list_adapters(_json: bool) -> Result<()> {
    anyhow::bail!("adapter listing requires building with `--features gpu`")
}
