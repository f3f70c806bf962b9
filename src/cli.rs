//! Command-line interface definitions for Site Prospector.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Tunables that rarely change live in the YAML config file; the flags here
//! override the page budget and concurrency for a single run.

use clap::Parser;

/// Command-line arguments for the Site Prospector application.
///
/// # Examples
///
/// ```sh
/// # Audit every verified company and write the enriched CSV
/// site_prospector -i companies_websites.csv -o seo_audit.csv
///
/// # Also write the ranked prospect report, crawling at most 15 pages per site
/// site_prospector -i companies_websites.csv -o seo_audit.csv -r prospects.json --max-pages 15
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// CSV with `denominationUniteLegale`, `site_web` and `site_verifie` columns
    #[arg(short, long)]
    pub input: String,

    /// Output path for the enriched CSV
    #[arg(short, long)]
    pub output: String,

    /// Optional output path for the ranked prospect report (JSON)
    #[arg(short, long)]
    pub ranking: Option<String>,

    /// Optional path to an audit config YAML file
    #[arg(short, long, env = "SITE_PROSPECTOR_CONFIG")]
    pub config: Option<String>,

    /// Maximum pages crawled per site (overrides the config file)
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Number of companies audited concurrently (overrides the config file)
    #[arg(long)]
    pub concurrency: Option<usize>,
}
