use anyhow::{Context, Result};
use arxiv_digest::pipeline::{run, RunOptions};
use arxiv_digest::store::MergeOutcome;
use arxiv_digest::Config;
use clap::Parser;
use log::info;
use std::path::PathBuf;

/// Collect arXiv papers per topic into a JSON store and render markdown listings
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file (built-in topics are used if not specified)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// JSON store path, overrides the config
    #[arg(short, long)]
    store: Option<PathBuf>,
    /// Directory for the generated pages and charts, overrides the config
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Render from the existing store without querying arXiv
    #[arg(long)]
    skip_fetch: bool,
    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Configure logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let mut config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("Failed to load config {:?}", path))?,
        None => Config::default(),
    };
    config.apply_env_overrides();
    if let Some(store) = args.store {
        config.store_path = store;
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }

    let options = RunOptions {
        skip_fetch: args.skip_fetch,
        date: chrono::Local::now().date_naive(),
    };
    let summary = run(&config, &options)
        .with_context(|| format!("Run failed for store {:?}", config.store_path))?;

    for (topic, outcome) in &summary.merges {
        match outcome {
            MergeOutcome::Skipped => info!("{}: skipped (no papers fetched)", topic),
            MergeOutcome::Merged { added, replaced } => {
                info!("{}: {} added, {} refreshed", topic, added, replaced)
            }
        }
    }
    for topic in &summary.uncharted {
        info!("{}: no chart generated", topic);
    }
    info!(
        "Done: {} pages, {} charts in {:?}",
        summary.pages.len(),
        summary.charts.len(),
        config.output_dir
    );

    Ok(())
}
