//! Ranked prospect report in JSON.
//!
//! Only scored companies appear, best opportunities first. Companies with
//! equal scores keep their registry order.
//!
//! ```text
//! [
//!   { "rang": 1, "entreprise": "Chantier Naval Dupont", "score": 9.5, ... },
//!   { "rang": 2, ... }
//! ]
//! ```

use crate::models::{ActivityStatus, BlogStatus, Prospect};
use chrono::NaiveDate;
use serde::Serialize;
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

/// One line of the ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedProspect {
    pub rang: usize,
    pub entreprise: String,
    pub site_web: String,
    pub score: f64,
    pub resume: String,
    pub opportunites: Vec<String>,
    pub nb_pages: usize,
    pub has_blog: bool,
    pub blog_url: Option<String>,
    pub blog_status: BlogStatus,
    pub derniere_maj_blog: Option<NaiveDate>,
    pub activite_status: ActivityStatus,
    pub has_sitemap: bool,
    pub cms_detecte: Option<String>,
}

/// Scored prospects sorted by score, highest first.
pub fn rank(prospects: &[Prospect]) -> Vec<RankedProspect> {
    let mut scored: Vec<_> = prospects
        .iter()
        .filter_map(|p| Some((p, p.audit.as_ref()?, p.score.as_ref()?)))
        .collect();
    scored.sort_by(|a, b| b.2.score.total_cmp(&a.2.score));

    scored
        .into_iter()
        .enumerate()
        .map(|(i, (prospect, audit, score))| RankedProspect {
            rang: i + 1,
            entreprise: prospect.company.name.clone(),
            site_web: prospect.company.site.clone(),
            score: score.score,
            resume: score.summary(),
            opportunites: score.opportunities.clone(),
            nb_pages: audit.nb_pages,
            has_blog: audit.has_blog,
            blog_url: audit.blog_url.clone(),
            blog_status: audit.blog_status,
            derniere_maj_blog: audit.derniere_maj_blog,
            activite_status: audit.activite_status,
            has_sitemap: audit.has_sitemap,
            cms_detecte: audit.cms_detecte.clone(),
        })
        .collect()
}

/// Write the ranking of `prospects` to `path` as a JSON array.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn write_ranking(prospects: &[Prospect], path: &str) -> Result<(), Box<dyn Error>> {
    let ranking = rank(prospects);
    let json = serde_json::to_string_pretty(&ranking)?;

    if let Err(e) = fs::write(path, json).await {
        error!(error = %e, "Failed to write ranking");
        return Err(e.into());
    }
    info!(prospects = ranking.len(), "Wrote ranked prospects");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Company, ProspectScore, SiteAuditResult};
    use tempfile::tempdir;

    fn prospect(name: &str, score: Option<f64>, audited: bool) -> Prospect {
        Prospect {
            company: Company {
                name: name.to_string(),
                site: format!("{}.fr", name.to_lowercase()),
                verified: score.is_some(),
                fields: Vec::new(),
            },
            audit: audited.then(|| SiteAuditResult {
                nb_pages: 4,
                ..SiteAuditResult::default()
            }),
            score: score.map(|s| ProspectScore {
                score: s,
                opportunities: vec!["pas de blog".to_string()],
            }),
        }
    }

    #[test]
    fn test_rank_orders_by_score_and_skips_unscored() {
        let prospects = vec![
            prospect("Alpha", Some(4.0), true),
            prospect("Bravo", None, true),
            prospect("Charlie", Some(9.5), true),
            prospect("Delta", Some(4.0), true),
            prospect("Echo", None, false),
        ];
        let ranking = rank(&prospects);
        let names: Vec<_> = ranking.iter().map(|r| r.entreprise.as_str()).collect();
        assert_eq!(names, vec!["Charlie", "Alpha", "Delta"]);
        assert_eq!(ranking[0].rang, 1);
        assert_eq!(ranking[2].rang, 3);
        assert_eq!(ranking[0].resume, "Score 9.5/10. Opportunités : pas de blog.");
    }

    #[tokio::test]
    async fn test_write_ranking() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("classement.json");
        let path = path.to_str().unwrap();

        write_ranking(&[prospect("Alpha", Some(7.0), true)], path)
            .await
            .unwrap();

        let written = tokio::fs::read_to_string(path).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value[0]["entreprise"], "Alpha");
        assert_eq!(value[0]["score"], 7.0);
        assert_eq!(value[0]["blog_status"], "absent");
        assert_eq!(value[0]["activite_status"], "inconnu");
        assert_eq!(value[0]["derniere_maj_blog"], serde_json::Value::Null);
    }
}
