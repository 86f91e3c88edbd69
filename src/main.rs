mod collector;
mod error;
mod export;
mod normalizer;
mod settings;
mod store;
mod table;

use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use crate::collector::Collector;
use crate::settings::Settings;
use crate::table::Table;

const RAW_LABEL: &str = "Scraped Racquet Data";
const RAW_TAG: &str = "raw";
const RAW_MESSAGE: &str =
    "Raw racquet information scraped from each brand's page on tenniswarehouse.com.";
const CLEAN_LABEL: &str = "Basic Cleaned Data";
const CLEAN_TAG: &str = "cleaned";
const CLEAN_MESSAGE: &str = "Removed all junior racquets. Removed duplicate columns. Used regex to \
    extract values for specially formatted columns. Standardized column naming. Dropped all \
    non-preprocessed columns.";

#[derive(Parser)]
#[command(name = "racquet_harvest", about = "Racquet catalog scraper and normalizer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where a table ends up: the dataset store, or a CSV named after the label.
#[derive(Args, Clone)]
struct Sink {
    /// Dataset name, also used for the CSV file name
    #[arg(short, long)]
    label: Option<String>,
    /// Dataset tag
    #[arg(short, long)]
    tag: Option<String>,
    /// Free-text dataset message
    #[arg(short, long)]
    message: Option<String>,
    /// Write a CSV file instead of saving to the dataset store
    #[arg(long)]
    csv: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the catalog and save the raw product table
    Scrape {
        /// Catalog root URL (default from settings)
        #[arg(short, long)]
        url: Option<String>,
        #[command(flatten)]
        sink: Sink,
    },
    /// Normalize a stored raw table
    Clean {
        /// Raw dataset hash (default: latest dataset tagged "raw")
        #[arg(long)]
        hash: Option<String>,
        #[command(flatten)]
        sink: Sink,
    },
    /// Scrape, then clean the result
    Run {
        #[arg(short, long)]
        url: Option<String>,
        /// Also write both tables as CSV files
        #[arg(long)]
        csv: bool,
    },
    /// List stored datasets in the configured collection
    Datasets,
    /// Write a stored dataset to CSV
    Export {
        hash: String,
        /// Label for the CSV file name (default: the dataset name)
        #[arg(short, long)]
        label: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    info!(settings = ?settings, "Starting racquet_harvest");

    let result = match cli.command {
        Commands::Scrape { url, sink } => {
            let root = url.unwrap_or_else(|| settings.root_url.clone());
            let raw = scrape(&settings, &root).await?;
            persist(&settings, &raw, &sink, (RAW_LABEL, RAW_TAG, RAW_MESSAGE))
        }
        Commands::Clean { hash, sink } => {
            let conn = open_store(&settings)?;
            let hash = match hash {
                Some(h) => h,
                None => store::latest(&conn, &settings.collection, RAW_TAG)?
                    .map(|h| h.hash)
                    .context("No raw dataset stored yet. Run 'scrape' first.")?,
            };
            let raw = store::load(&conn, &settings.collection, &hash)?;
            let clean = clean(&raw);
            persist(&settings, &clean, &sink, (CLEAN_LABEL, CLEAN_TAG, CLEAN_MESSAGE))
        }
        Commands::Run { url, csv } => {
            let root = url.unwrap_or_else(|| settings.root_url.clone());
            let sink = Sink {
                label: None,
                tag: None,
                message: None,
                csv: false,
            };

            let t_scrape = Instant::now();
            let raw = scrape(&settings, &root).await?;
            println!("Scraped in {:.1}s", t_scrape.elapsed().as_secs_f64());
            persist(&settings, &raw, &sink, (RAW_LABEL, RAW_TAG, RAW_MESSAGE))?;

            let clean = clean(&raw);
            persist(&settings, &clean, &sink, (CLEAN_LABEL, CLEAN_TAG, CLEAN_MESSAGE))?;

            if csv {
                let csv_sink = Sink { csv: true, ..sink };
                persist(&settings, &raw, &csv_sink, (RAW_LABEL, RAW_TAG, RAW_MESSAGE))?;
                persist(&settings, &clean, &csv_sink, (CLEAN_LABEL, CLEAN_TAG, CLEAN_MESSAGE))?;
            }
            Ok(())
        }
        Commands::Datasets => {
            let conn = open_store(&settings)?;
            let datasets = store::list(&conn, &settings.collection)?;
            if datasets.is_empty() {
                println!("No datasets in collection '{}'.", settings.collection);
                return Ok(());
            }

            println!(
                "{:<16} | {:<24} | {:<8} | {:>5} | {:>4} | {:<20}",
                "Hash", "Name", "Tag", "Rows", "Cols", "Saved"
            );
            println!("{}", "-".repeat(92));
            for d in &datasets {
                println!(
                    "{:<16} | {:<24} | {:<8} | {:>5} | {:>4} | {:<20}",
                    &d.hash[..16.min(d.hash.len())],
                    truncate(&d.name, 24),
                    truncate(&d.tag, 8),
                    d.rows,
                    d.columns,
                    d.saved_at.format("%Y-%m-%d %H:%M:%S"),
                );
            }
            println!("\n{} datasets in '{}'", datasets.len(), settings.collection);
            Ok(())
        }
        Commands::Export { hash, label } => {
            let conn = open_store(&settings)?;
            let handle = store::find(&conn, &settings.collection, &hash)?
                .with_context(|| format!("No dataset {} in '{}'", hash, settings.collection))?;
            let table = store::load(&conn, &settings.collection, &hash)?;
            let path = export::file_name(label.as_deref().unwrap_or(&handle.name));
            export::write_csv(&table, &path)?;
            println!("Wrote {} rows to {}", table.len(), path.display());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn scrape(settings: &Settings, root_url: &str) -> Result<Table> {
    let collector = Collector::new(settings.timeout_secs, settings.concurrency)?;
    let raw = collector.collect(root_url).await?;
    if raw.is_empty() {
        warn!("Catalog at {} listed no products", root_url);
    }
    println!("Collected {} products with {} columns", raw.len(), raw.width());
    Ok(raw)
}

fn clean(raw: &Table) -> Table {
    if !raw.has_column(normalizer::stages::NAME_COLUMN) {
        warn!(
            "Raw table has no {} column; brand and junior filtering will see nulls",
            normalizer::stages::NAME_COLUMN
        );
    }
    let (clean, tracker) = normalizer::normalize(raw);
    tracker.print();
    clean
}

fn open_store(settings: &Settings) -> Result<rusqlite::Connection> {
    let conn = store::connect(&settings.store_path)?;
    store::init_schema(&conn)?;
    Ok(conn)
}

/// Save to the store, or write `<label>.csv` when the sink asks for CSV.
fn persist(
    settings: &Settings,
    table: &Table,
    sink: &Sink,
    defaults: (&str, &str, &str),
) -> Result<()> {
    let label = sink.label.as_deref().unwrap_or(defaults.0);
    if sink.csv {
        let path = export::file_name(label);
        export::write_csv(table, &path)?;
        println!("Wrote {} rows to {}", table.len(), path.display());
        return Ok(());
    }

    let conn = open_store(settings)?;
    let handle = store::save(
        &conn,
        table,
        &settings.collection,
        label,
        sink.tag.as_deref().unwrap_or(defaults.1),
        sink.message.as_deref().unwrap_or(defaults.2),
    )?;
    println!(
        "Saved dataset '{}' [{}] to {}: {}",
        handle.name, handle.tag, settings.collection, handle.hash
    );
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
