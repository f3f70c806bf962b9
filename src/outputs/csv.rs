//! Company registry CSV input and enriched CSV output.
//!
//! The input must carry the [`NAME_COLUMN`], [`SITE_COLUMN`] and
//! [`VERIFIED_COLUMN`] columns; every other column passes through untouched.
//! The output repeats the input columns and appends the audit columns
//! ([`SiteAuditResult::CSV_COLUMNS`]) followed by [`SCORE_COLUMN`] and
//! [`SUMMARY_COLUMN`]. Rows that were not audited or scored get blank cells.
//!
//! Input columns named like an appended column are dropped on read, so a
//! previously enriched file can be audited again.

use crate::models::{Company, Prospect, SiteAuditResult};
use chrono::NaiveDate;
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument, warn};

pub const NAME_COLUMN: &str = "denominationUniteLegale";
pub const SITE_COLUMN: &str = "site_web";
pub const VERIFIED_COLUMN: &str = "site_verifie";
pub const SCORE_COLUMN: &str = "prospect_score";
pub const SUMMARY_COLUMN: &str = "prospect_summary";

/// Input header plus parsed rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyTable {
    /// Pass-through column names, matching each [`Company::fields`].
    pub headers: Vec<String>,
    pub companies: Vec<Company>,
}

/// Read the company registry from `path`.
///
/// Fails when a required column is missing, before any crawl starts.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn read_companies(path: &str) -> Result<CompanyTable, Box<dyn Error>> {
    let bytes = fs::read(path).await?;
    let table = parse_companies(&bytes)?;
    info!(
        rows = table.companies.len(),
        verified = table.companies.iter().filter(|c| c.verified).count(),
        "Loaded company registry"
    );
    Ok(table)
}

fn parse_companies(bytes: &[u8]) -> Result<CompanyTable, Box<dyn Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);
    let header = reader.headers()?.clone();

    let column = |name: &str| -> Result<usize, Box<dyn Error>> {
        header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| format!("input CSV has no `{name}` column").into())
    };
    let name_idx = column(NAME_COLUMN)?;
    let site_idx = column(SITE_COLUMN)?;
    let verified_idx = column(VERIFIED_COLUMN)?;

    let kept: Vec<usize> = header
        .iter()
        .enumerate()
        .filter(|(_, h)| !is_appended_column(h.trim()))
        .map(|(i, _)| i)
        .collect();
    if kept.len() < header.len() {
        warn!(
            dropped = header.len() - kept.len(),
            "Input already has audit columns; they will be replaced"
        );
    }

    let mut companies = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cell = |i: usize| record.get(i).unwrap_or_default().to_string();
        companies.push(Company {
            name: cell(name_idx).trim().to_string(),
            site: cell(site_idx).trim().to_string(),
            verified: parse_verified(&cell(verified_idx)),
            fields: kept.iter().map(|&i| cell(i)).collect(),
        });
    }

    Ok(CompanyTable {
        headers: kept.iter().map(|&i| header[i].to_string()).collect(),
        companies,
    })
}

/// Registry booleans come from several tools: `True`, `true`, `1`, `oui`.
pub fn parse_verified(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "true" | "1" | "oui" | "yes" | "vrai"
    )
}

fn is_appended_column(name: &str) -> bool {
    name == SCORE_COLUMN
        || name == SUMMARY_COLUMN
        || SiteAuditResult::CSV_COLUMNS.contains(&name)
}

/// Write the enriched registry to `path`.
#[instrument(level = "info", skip_all, fields(path = %path, rows = prospects.len()))]
pub async fn write_enriched(
    path: &str,
    headers: &[String],
    prospects: &[Prospect],
    today: NaiveDate,
) -> Result<(), Box<dyn Error>> {
    let bytes = render_enriched(headers, prospects, today)?;
    fs::write(path, bytes).await?;
    info!("Wrote enriched CSV");
    Ok(())
}

fn render_enriched(
    headers: &[String],
    prospects: &[Prospect],
    today: NaiveDate,
) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header_row: Vec<&str> = headers.iter().map(String::as_str).collect();
    header_row.extend(SiteAuditResult::CSV_COLUMNS);
    header_row.extend([SCORE_COLUMN, SUMMARY_COLUMN]);
    writer.write_record(&header_row)?;

    let blank_audit = vec![String::new(); SiteAuditResult::CSV_COLUMNS.len()];
    for prospect in prospects {
        let mut row = prospect.company.fields.clone();
        row.resize(headers.len(), String::new());
        match &prospect.audit {
            Some(audit) => row.extend(audit.csv_fields(today)),
            None => row.extend(blank_audit.iter().cloned()),
        }
        match &prospect.score {
            Some(score) => row.extend([format!("{:.1}", score.score), score.summary()]),
            None => row.extend([String::new(), String::new()]),
        }
        writer.write_record(&row)?;
    }

    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}
