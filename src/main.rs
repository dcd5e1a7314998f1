use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use posts_pipeline::config::Config;
use posts_pipeline::constants::TITLE_FRAGMENTS;
use posts_pipeline::logging;
use posts_pipeline::pipeline;
use posts_pipeline::report::{self, TitlePattern};
use posts_pipeline::storage::{MongoPostStore, PostStore};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "posts_pipeline")]
#[command(about = "Loads forum posts into MongoDB and reports on them")]
#[command(version = "0.1.0")]
struct Cli {
    /// TOML configuration file; environment variables still take precedence
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the posts collection with the most viewed posts of an XML export
    Ingest {
        /// Posts XML export to load
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Render the ViewCount and title search PDF reports
    Report {
        /// Directory the PDF files are written to
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Title fragment to search for (repeatable); replaces the default set
        #[arg(long = "fragment")]
        fragments: Vec<String>,
    },
}

impl Commands {
    fn log_name(&self) -> &'static str {
        match self {
            Commands::Ingest { .. } => "ingest",
            Commands::Report { .. } => "report",
        }
    }
}

async fn ingest(config: &Config, input: &Path) -> anyhow::Result<()> {
    let store = MongoPostStore::connect(&config.store.uri)
        .await
        .context("Error loading data into MongoDB")?;

    let result = pipeline::run_ingest(input, &store).await;
    store.close().await;
    let summary = result.context("Error loading data into MongoDB")?;

    println!("\n📊 Ingestion results:");
    println!("   Rows parsed: {}", summary.rows_parsed);
    println!("   Posts kept: {}", summary.posts_kept);
    println!("   Documents inserted: {}", summary.inserted);
    Ok(())
}

async fn report(config: &Config, out_dir: &Path, fragments: &[String]) -> anyhow::Result<()> {
    let pattern = if fragments.is_empty() {
        TitlePattern::new(TITLE_FRAGMENTS)?
    } else {
        TitlePattern::new(fragments)?
    };

    let store = MongoPostStore::connect(&config.store.uri)
        .await
        .context("Error querying MongoDB")?;

    let result = report::run_reports(&store, &pattern, out_dir).await;
    store.close().await;
    let run = result.context("Error preparing the report directory")?;

    if let Err(e) = &run.view_counts {
        error!("ViewCount report failed: {}", e);
    }
    if let Err(e) = &run.title_matches {
        error!("Title search report failed: {}", e);
    }
    if !run.is_success() {
        bail!("not every report could be generated");
    }
    info!("Reports written to {}", out_dir.display());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    // Flushes the log file when dropped at the end of main
    let _guard = match logging::init_logging(&config.logging, cli.command.log_name()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = match cli.command {
        Commands::Ingest { input } => {
            let input = input.unwrap_or_else(|| config.paths.input.clone());
            ingest(&config, &input).await
        }
        Commands::Report { out_dir, fragments } => {
            let out_dir = out_dir.unwrap_or_else(|| config.paths.output_dir.clone());
            report(&config, &out_dir, &fragments).await
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
