mod db;
mod observe;
mod parser;
mod pipeline;
mod settings;
mod snapshot;
mod utils;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing::{error, info};

use observe::{Observer, TracingObserver};
use settings::Settings;
use snapshot::Snapshot;
use utils::{format_duration, truncate};

#[derive(Parser)]
#[command(name = "upwork_scraper", about = "Best Matches job feed ingester")]
struct Cli {
    /// SQLite database file (overrides UPWORK_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Snapshot JSON file or directory with page.txt/links.txt
    #[arg(short, long)]
    snapshot: Option<PathBuf>,
    /// Display name of the logged-in account (cuts the profile panel)
    #[arg(long)]
    viewer: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the jobs table (and migrate old databases)
    Init,
    /// Run one parse-and-store cycle over a page snapshot
    Ingest {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Re-ingest the snapshot forever, pausing between cycles
    Watch {
        #[command(flatten)]
        source: SourceArgs,
        /// Hours between cycles
        #[arg(long)]
        hours: Option<f64>,
    },
    /// Parse a snapshot and print the records as JSON lines
    Parse {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print one stored job as JSON
    Show {
        /// Job id (MD5 of the lower-cased title)
        job_id: String,
    },
    /// Show store statistics
    Stats,
    /// Most recently updated jobs
    Recent {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if let Some(db) = cli.db {
        settings.db_path = db;
    }
    let observer = TracingObserver;

    let result = match cli.command {
        Commands::Init => {
            let conn = open_store(&settings.db_path)?;
            drop(conn);
            println!("Schema ready in {:?}", settings.db_path);
            Ok(())
        }
        Commands::Ingest { source } => {
            apply_source(&mut settings, source);
            let report = ingest_once(&settings, &observer)?;
            println!(
                "{} postings ({} parsed): {} new, {} updated, {} skipped.",
                report.blocks, report.parsed, report.inserted, report.updated, report.skipped
            );
            Ok(())
        }
        Commands::Watch { source, hours } => {
            apply_source(&mut settings, source);
            if let Some(h) = hours {
                settings.refresh_hours = h;
            }
            watch(&settings, &observer).await
        }
        Commands::Parse { source } => {
            apply_source(&mut settings, source);
            let snap = Snapshot::load(&settings.snapshot)?;
            let page = parser::process_page(
                &snap.text,
                &snap.links,
                &settings.page_options(),
                Utc::now(),
                &observer,
            );
            for job in &page.jobs {
                println!("{}", serde_json::to_string(job)?);
            }
            eprintln!(
                "{} blocks, {} parsed, {} skipped",
                page.blocks,
                page.jobs.len(),
                page.skipped
            );
            Ok(())
        }
        Commands::Show { job_id } => {
            let conn = open_store(&settings.db_path)?;
            match db::fetch_job(&conn, &job_id)? {
                Some(job) => println!("{}", serde_json::to_string_pretty(&job)?),
                None => println!("No job with id {}", job_id),
            }
            Ok(())
        }
        Commands::Stats => {
            let conn = open_store(&settings.db_path)?;
            let s = db::get_stats(&conn, Utc::now())?;
            println!("Jobs:           {}", s.total);
            println!("With URL:       {}", s.with_url);
            println!("With posted at: {}", s.with_posted_date);
            println!("Updated (24h):  {}", s.updated_last_day);
            Ok(())
        }
        Commands::Recent { limit } => {
            let conn = open_store(&settings.db_path)?;
            let rows = db::fetch_recent(&conn, limit)?;
            if rows.is_empty() {
                println!("No jobs stored. Run 'ingest' first.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<36} | {:<19} | {:<12} | {:<30}",
                "#", "Title", "Posted", "Proposals", "Tags"
            );
            println!("{}", "-".repeat(112));

            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<36} | {:<19} | {:<12} | {:<30}",
                    i + 1,
                    truncate(&r.title, 36),
                    r.posted_date,
                    truncate(&r.proposals, 12),
                    truncate(&r.tags, 30)
                );
            }

            let with_url: Vec<_> = rows.iter().filter(|r| !r.url.is_empty()).collect();
            if !with_url.is_empty() {
                println!("\n--- Links ---");
                for r in &with_url {
                    println!("  {}: {}", &r.job_id[..8.min(r.job_id.len())], r.url);
                }
            }

            println!("\n{} jobs | last update {}", rows.len(), rows[0].updated_at);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn apply_source(settings: &mut Settings, source: SourceArgs) {
    if let Some(path) = source.snapshot {
        settings.snapshot = path;
    }
    if let Some(name) = source.viewer {
        settings.viewer_name = name;
    }
}

fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }
    let conn = db::connect(path).with_context(|| format!("Failed to open {:?}", path))?;
    db::init_schema(&conn)?;
    Ok(conn)
}

fn ingest_once(settings: &Settings, observer: &dyn Observer) -> Result<pipeline::CycleReport> {
    let snap = Snapshot::load(&settings.snapshot)?;
    if let Some(at) = snap.captured_at {
        info!(%at, links = snap.links.len(), "Loaded snapshot");
    }
    let conn = open_store(&settings.db_path)?;
    let report = pipeline::run_cycle(
        &conn,
        &snap,
        &settings.page_options(),
        Utc::now(),
        observer,
    )?;
    Ok(report)
}

/// Cycle, sleep, repeat. A failed cycle is logged and retried on the next
/// tick; only process termination stops the loop.
async fn watch(settings: &Settings, observer: &dyn Observer) -> Result<()> {
    let pause = Duration::try_from_secs_f64(settings.refresh_hours * 3600.0)
        .context("refresh_hours must be a non-negative number")?;

    loop {
        let started = Instant::now();
        info!(snapshot = ?settings.snapshot, "Starting cycle");
        if let Err(e) = ingest_once(settings, observer) {
            error!("Cycle failed: {:#}", e);
        } else {
            info!("Cycle done in {}", format_duration(started.elapsed()));
        }

        info!("Pausing for {} hour(s) before continuing", settings.refresh_hours);
        tokio::time::sleep(pause).await;
    }
}
