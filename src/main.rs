//! # Site Prospector
//!
//! Crawls company websites, measures signs of commercial neglect, and ranks
//! the companies as sales prospects.
//!
//! ## Features
//!
//! - Bounded breadth-first crawl of each verified company site
//! - Per-page SEO signals: title, meta description, H1, canonical, noindex,
//!   visible text volume
//! - Blog detection with three fallbacks, publication rhythm, and site
//!   activity from dated content
//! - CMS fingerprinting, robots.txt and sitemap.xml checks
//! - 1–10 opportunity score with a one-line summary per company
//!
//! ## Usage
//!
//! ```sh
//! site_prospector -i companies_websites.csv -o seo_audit.csv -r prospects.json
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Input**: Read the company registry CSV
//! 2. **Audit**: Crawl each distinct site (several at a time) and aggregate its signals
//! 3. **Scoring**: Turn each verified audit into a prospect score
//! 4. **Output**: Write the enriched CSV and the optional ranked JSON report

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregate;
mod batch;
mod cli;
mod config;
mod crawler;
mod models;
mod outputs;
mod scoring;
mod signals;
mod utils;

use cli::Cli;
use config::AuditConfig;
use crawler::SiteAuditor;
use crawler::fetch::HttpFetcher;
use outputs::{csv, json};
use utils::ensure_writable_parent;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("site_prospector starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = match &args.config {
        Some(path) => AuditConfig::load(path).await?,
        None => AuditConfig::default(),
    };
    if let Some(max_pages) = args.max_pages {
        config.max_pages = max_pages;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    config.validate()?;
    info!(
        max_pages = config.max_pages,
        concurrency = config.concurrency,
        delay_ms = config.politeness_delay_ms,
        "Audit configuration ready"
    );

    // Early check: outputs must be writable before hours of crawling
    for path in std::iter::once(&args.output).chain(args.ranking.as_ref()) {
        if let Err(e) = ensure_writable_parent(path).await {
            error!(
                path = %path,
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    // ---- Input ----
    let table = csv::read_companies(&args.input).await?;

    // ---- Audit and score ----
    let today = Local::now().date_naive();
    info!(%today, "Reference date for this run");

    let auditor = SiteAuditor::new(HttpFetcher::new(&config)?, config.clone());
    let prospects = batch::run_audit(&auditor, table.companies, config.concurrency, today).await;

    // ---- Output ----
    if let Err(e) = csv::write_enriched(&args.output, &table.headers, &prospects, today).await {
        error!(path = %args.output, error = %e, "Failed to write enriched CSV");
        return Err(e);
    }

    if let Some(ranking_path) = &args.ranking {
        if let Err(e) = json::write_ranking(&prospects, ranking_path).await {
            error!(path = %ranking_path, error = %e, "Failed to write ranking");
            return Err(e);
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        companies = prospects.len(),
        "Execution complete"
    );

    Ok(())
}
