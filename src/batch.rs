//! Batch driver: audit and score every company of the registry.
//!
//! Rows whose sites resolve to the same host share one audit. Distinct
//! sites are crawled concurrently, each with its own crawl state, so the
//! politeness delay applies per site. Unverified rows and rows without a
//! site address are carried through unaudited.

use crate::crawler::SiteAuditor;
use crate::crawler::fetch::PageFetcher;
use crate::models::{Company, Prospect, SiteAuditResult};
use crate::scoring;
use crate::utils::{parse_site_url, site_key};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument};

/// Audit key of a row: its site key, or the raw address when unparseable.
fn audit_key(site: &str) -> String {
    parse_site_url(site)
        .map(|url| site_key(&url))
        .unwrap_or_else(|| site.trim().to_lowercase())
}

/// Audit and score `companies`, keeping their order.
///
/// At most `concurrency` sites are crawled at once. `today` is the single
/// reference date for every age computed in this run.
#[instrument(level = "info", skip_all, fields(companies = companies.len(), concurrency = concurrency))]
pub async fn run_audit<F: PageFetcher>(
    auditor: &SiteAuditor<F>,
    companies: Vec<Company>,
    concurrency: usize,
    today: NaiveDate,
) -> Vec<Prospect> {
    let mut sites: Vec<(String, String)> = Vec::new();
    let mut seen = HashSet::new();
    for company in companies.iter().filter(|c| c.verified && !c.site.is_empty()) {
        let key = audit_key(&company.site);
        if seen.insert(key.clone()) {
            sites.push((key, company.site.clone()));
        }
    }

    let total = sites.len();
    info!(sites = total, "Starting site audits");

    let audits: HashMap<String, SiteAuditResult> = stream::iter(sites.into_iter().enumerate())
        .map(|(i, (key, site))| async move {
            let result = auditor.audit(&site, today).await;
            info!(
                index = i + 1,
                total,
                %site,
                pages = result.nb_pages,
                error = result.audit_erreur.as_deref().unwrap_or(""),
                "Audit finished"
            );
            (key, result)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let prospects: Vec<Prospect> = companies
        .into_iter()
        .map(|company| {
            let audit = (company.verified && !company.site.is_empty())
                .then(|| audits.get(&audit_key(&company.site)).cloned())
                .flatten();
            let score = audit
                .as_ref()
                .and_then(|a| scoring::score(a, company.verified));
            Prospect {
                company,
                audit,
                score,
            }
        })
        .collect();

    info!(
        audited = prospects.iter().filter(|p| p.audit.is_some()).count(),
        scored = prospects.iter().filter(|p| p.score.is_some()).count(),
        "Batch complete"
    );
    prospects
}
