use anyhow::Result;
use clap::{Parser, Subcommand};
use indexer::TrainReport;
use std::path::PathBuf;
use textcat_core::{IndexConfig, StorageBackend};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the champion-list index and class centroids", long_about = None)]
struct Cli {
    /// JSON configuration file; defaults apply to anything it leaves out
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Index directory (overrides storage_root)
    #[arg(long, global = true)]
    output: Option<PathBuf>,
    /// Storage backend (overrides storage_backend)
    #[arg(long, global = true, value_parser = parse_backend)]
    backend: Option<StorageBackend>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wipe the index and train it again from the dataset
    Rebuild {
        /// Dataset root holding train/<class dir> (overrides dataset_root)
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Documents per class (overrides train_size_per_class)
        #[arg(long)]
        train_size: Option<usize>,
    },
    /// Recompute champion lists, vectors and centroids of an existing index
    Refresh,
}

fn parse_backend(s: &str) -> Result<StorageBackend, String> {
    match s {
        "files" => Ok(StorageBackend::Files),
        "sled" => Ok(StorageBackend::Sled),
        other => Err(format!("unknown backend {other:?}, expected files or sled")),
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => IndexConfig::from_file(path)?,
        None => IndexConfig::default(),
    };
    if let Some(output) = cli.output {
        config.storage_root = output;
    }
    if let Some(backend) = cli.backend {
        config.storage_backend = backend;
    }

    let report = match cli.command {
        Commands::Rebuild { dataset, train_size } => {
            if let Some(dataset) = dataset {
                config.dataset_root = dataset;
            }
            if let Some(train_size) = train_size {
                config.train_size_per_class = train_size;
            }
            indexer::train(&config)?
        }
        Commands::Refresh => indexer::refresh(&config)?,
    };

    print_report(&report)?;
    tracing::info!(output = %config.storage_root.display(), "index build complete");
    Ok(())
}

fn print_report(report: &TrainReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
