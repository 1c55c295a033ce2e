//! # event-harvester CLI
//!
//! Command-line entry points for the harvester.
//!
//! ## Subcommands
//!
//! - `harvest`: gate on freshness, reset the output directory and index, then
//!   harvest every configured listing URL
//! - `list`: inspect the records stored in the vector index
//!
//! Configuration comes from flags, with `SCRAPING_URLS`, `SCRAPING_OUTPUT_DIR`
//! and `GEMINI_API_KEY` read from the environment (or a `.env` file).

mod telemetry;

use anyhow::Context;
use chrono::{DateTime, Local, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use event_harvester::freshness::FreshnessGate;
use event_harvester::harvest::{HarvestConfig, HarvestProgress, HarvestReport, Harvester, ItemOutcome};
use event_harvester::index::Database;
use event_harvester::ingest::{Ingester, NullIngester, VectorIngester};
use event_harvester::model::gemini_embedding_model_from_env;
use event_harvester::sink::JsonFileSink;
use event_harvester::transport::{HttpTransport, RetryingTransport, Transport, TransportConfig};
use indicatif::{ProgressBar, ProgressStyle};
use rig::embeddings::EmbeddingModel;
use std::path::PathBuf;
use std::time::Duration;
use telemetry::OtelGuard;
use tokio::sync::mpsc;
use tracing::{info, instrument};

#[derive(Parser)]
#[command(author, version, about = "Harvest event listings into JSON files and a vector index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Harvest all configured listing URLs
    Harvest(HarvestArgs),

    /// List records in the vector index
    List(ListArgs),
}

#[derive(Args, Debug)]
struct HarvestArgs {
    /// Listing URLs to harvest (comma-separated)
    #[arg(short, long, env = "SCRAPING_URLS", value_delimiter = ',', required = true)]
    urls: Vec<String>,

    /// Directory receiving one JSON file per event
    #[arg(short, long, env = "SCRAPING_OUTPUT_DIR")]
    output_dir: PathBuf,

    /// File holding the time of the last completed run
    #[arg(long, default_value = "last_update_timestamp.txt")]
    stamp_file: PathBuf,

    /// Hours after which the last run is considered stale
    #[arg(long, default_value = "12")]
    stale_after_hours: u64,

    /// Harvest even if the last run is recent
    #[arg(short, long)]
    force: bool,

    /// Database path
    #[arg(long, default_value = "index.db")]
    database: PathBuf,

    /// Write JSON files only, skip chunking and embedding
    #[arg(long)]
    no_index: bool,

    /// Detail pages in flight per host
    #[arg(short, long, default_value = "4")]
    concurrency: usize,

    /// Maximum listing pages followed per source
    #[arg(short = 'p', long, default_value = "500")]
    max_pages: usize,

    /// Lower bound of the delay before each request, in milliseconds
    #[arg(long, default_value = "1000")]
    min_delay_ms: u64,

    /// Upper bound of the delay before each request, in milliseconds
    #[arg(long, default_value = "3000")]
    max_delay_ms: u64,

    /// Attempts per request, including the first one
    #[arg(long, default_value = "5")]
    max_attempts: u32,

    /// Also write logs to this file (rotated daily)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Export traces and metrics over OTLP
    #[arg(long)]
    otel: bool,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Show detailed information
    #[arg(short, long)]
    details: bool,

    /// Database path
    #[arg(long, default_value = "index.db")]
    database: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // a missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let (otel, log_file) = match &cli.command {
        Some(Commands::Harvest(args)) => (args.otel, args.log_file.clone()),
        _ => (false, None),
    };
    let _otel: OtelGuard = telemetry::init_tracing_subscriber(otel, log_file.as_deref())?;

    match cli.command {
        Some(Commands::Harvest(args)) => {
            harvest_command(args).await?;
        }
        Some(Commands::List(args)) => {
            list_command(args).await?;
        }
        None => {
            // If no command is provided, show help
            let _ = Cli::parse_from(["event-harvester", "--help"]);
        }
    }

    Ok(())
}

#[instrument]
async fn harvest_command(args: HarvestArgs) -> anyhow::Result<()> {
    let gate = FreshnessGate::new(&args.stamp_file)
        .with_stale_after(Duration::from_secs(args.stale_after_hours * 60 * 60));

    if !args.force && !gate.is_due(Local::now()).await {
        let last = gate
            .last_run()
            .await
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!("Last run at {} is still fresh, nothing to do (use --force to override)", last);
        return Ok(());
    }

    // resolve everything that can fail before the previous output is cleared
    let config = HarvestConfig::builder()
        .sources(&args.urls)
        .concurrency_per_host(args.concurrency)
        .max_pages(args.max_pages)
        .build();
    if config.sources.is_empty() {
        anyhow::bail!("No listing URLs given");
    }

    let transport_config = TransportConfig::builder()
        .politeness_delay(
            Duration::from_millis(args.min_delay_ms),
            Duration::from_millis(args.max_delay_ms),
        )
        .max_attempts(args.max_attempts)
        .build();
    let transport = RetryingTransport::new(HttpTransport::new(&transport_config)?, &transport_config);

    let report = if args.no_index {
        run_harvest(&args, config, transport, NullIngester).await?
    } else {
        let model = gemini_embedding_model_from_env()?;
        let database = Database::new_from_path(&args.database.to_string_lossy(), model.ndims())
            .await
            .with_context(|| format!("Cannot open {}", args.database.display()))?;
        run_harvest(&args, config, transport, VectorIngester::new(model, database)).await?
    };

    gate.mark_completed(Local::now())
        .await
        .with_context(|| format!("Cannot write {}", args.stamp_file.display()))?;

    println!("{}", report);
    for source in report.sources.iter().filter(|s| s.is_failed()) {
        println!(
            "  {} failed: {}",
            source.listing_url,
            source.error.as_deref().unwrap_or_default()
        );
    }
    for url in &report.unrecognized {
        println!("  {} skipped: no adapter for this site", url);
    }

    Ok(())
}

async fn run_harvest<T: Transport, I: Ingester>(
    args: &HarvestArgs,
    config: HarvestConfig,
    transport: T,
    ingester: I,
) -> anyhow::Result<HarvestReport> {
    info!("Harvesting {} sources into {}", config.sources.len(), args.output_dir.display());

    let sink = JsonFileSink::new(&args.output_dir, ingester);

    // Create a channel for progress updates
    let (progress_sender, mut progress_receiver) = mpsc::channel(100);

    let progress_bar = ProgressBar::new(0);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")?
            .progress_chars("##-"),
    );
    progress_bar.set_message("Discovering events...");

    let progress_handle = tokio::spawn({
        let progress_bar = progress_bar.clone();
        async move {
            while let Some(event) = progress_receiver.recv().await {
                match event {
                    HarvestProgress::Discovered { source, queued, .. } => {
                        progress_bar.inc_length(queued as u64);
                        progress_bar.set_message(format!("Queued {} events from {}", queued, source));
                    }
                    HarvestProgress::Processed { url, outcome } => {
                        progress_bar.inc(1);
                        if outcome == ItemOutcome::Failed {
                            progress_bar.set_message(format!("Failed {}", url));
                        }
                    }
                }
            }
            progress_bar.finish_with_message("Harvest completed");
        }
    });

    let harvester = Harvester::new(config, transport, sink).with_progress(progress_sender);
    let report = harvester.run_fresh().await;

    // the progress task ends once every sender is dropped
    drop(harvester);
    let _ = progress_handle.await;

    Ok(report?)
}

#[instrument]
async fn list_command(args: ListArgs) -> anyhow::Result<()> {
    // dimensions only matter for writes
    let db = Database::new_from_path(&args.database.to_string_lossy(), 768)
        .await
        .with_context(|| format!("Cannot open {}", args.database.display()))?;

    let records = db.list_records().await?;
    println!("Indexed records: {}", records.len());

    let format_timestamp = |ts: i64| -> String {
        Utc.timestamp_opt(ts, 0)
            .single()
            .map(|dt: DateTime<Utc>| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| ts.to_string())
    };

    for record in records {
        if args.details {
            println!("Title: {}", record.title);
            println!("Source: {}", record.source);
            println!("Location: {}", record.location);
            println!("Indexed: {}", format_timestamp(record.indexed_at));
            println!("Chunks: {}", record.chunk_count);
            println!();
        } else {
            println!(
                "{} - {} chunks ({})",
                record.title, record.chunk_count, record.source
            );
        }
    }

    Ok(())
}
