use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use textcat_core::IndexConfig;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "classifier")]
#[command(about = "Classify documents against the trained class centroids", long_about = None)]
struct Cli {
    /// JSON configuration file; defaults apply to anything it leaves out
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Index directory (overrides storage_root)
    #[arg(long, global = true)]
    index: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the best-scoring classes of one document
    Classify {
        #[arg(long)]
        file: PathBuf,
    },
    /// Classify the test split and report accuracy
    Evaluate {
        /// Dataset root holding test/<class dir> (overrides dataset_root)
        #[arg(long)]
        dataset: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => IndexConfig::from_file(path)?,
        None => IndexConfig::default(),
    };
    if let Some(index) = cli.index {
        config.storage_root = index;
    }

    let classifier = classifier::open_from_config(&config)?;
    match cli.command {
        Commands::Classify { file } => {
            let text = std::fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
            let result = classifier.classify(&text)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Evaluate { dataset } => {
            if let Some(dataset) = dataset {
                config.dataset_root = dataset;
            }
            let eval = classifier::evaluate_dataset(&classifier, &config)?;
            println!(
                "correct: {} incorrect: {} failed: {}",
                eval.correct, eval.incorrect, eval.failed
            );
            println!("accuracy: {:.2}%", eval.accuracy() * 100.0);
        }
    }
    Ok(())
}
