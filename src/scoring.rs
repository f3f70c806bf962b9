//! Sales-opportunity scoring.
//!
//! [`score`] projects a [`SiteAuditResult`] onto a 1–10 scale where higher
//! means a more neglected site, hence a better prospect.
//!
//! | Signal | Points |
//! |--------|--------|
//! | blog `abandonné` / `semi-actif` / absent | +5 / +2 / +1 |
//! | blog `actif` publishing weekly or monthly | −4 |
//! | fewer than 5 pages / 5–9 pages / over 50 pages | +3 / +1 / −3 |
//! | under 150 words per page / over 400 | +2 / −2 |
//! | text/HTML ratio under 0.15 | +2 |
//! | no CMS detected / Wix or Squarespace | +2 / +1 |
//! | no sitemap | +1 |
//! | each full 20 % of pages missing meta description, H1, or near-empty | +0.5 |
//! | more than 30 % duplicate titles | +0.5 |

use crate::models::{BlogStatus, ProspectScore, SiteAuditResult};
use crate::utils::round_to;

const MIN_SCORE: f64 = 1.0;
const MAX_SCORE: f64 = 10.0;

/// Score a company, or `None` when it must stay out of the ranking.
///
/// Unverified sites and audits that reached no page are never scored.
pub fn score(result: &SiteAuditResult, verified: bool) -> Option<ProspectScore> {
    if !verified || result.nb_pages == 0 {
        return None;
    }

    let pages = result.nb_pages;
    let mut points = 0.0;

    if result.has_blog {
        points += match result.blog_status {
            BlogStatus::Abandoned => 5.0,
            BlogStatus::SemiActive => 2.0,
            BlogStatus::Active
                if result
                    .frequence_publication
                    .is_some_and(|f| f.is_frequent()) =>
            {
                -4.0
            }
            _ => 0.0,
        };
    } else {
        points += 1.0;
    }

    points += match pages {
        0..=4 => 3.0,
        5..=9 => 1.0,
        10..=50 => 0.0,
        _ => -3.0,
    };

    if result.mots_moyen_par_page < 150 {
        points += 2.0;
    } else if result.mots_moyen_par_page > 400 {
        points -= 2.0;
    }

    if result.ratio_texte_html < 0.15 {
        points += 2.0;
    }

    match result.cms_detecte.as_deref() {
        None => points += 2.0,
        Some("Wix" | "Squarespace") => points += 1.0,
        Some(_) => {}
    }

    if !result.has_sitemap {
        points += 1.0;
    }

    points += tranche_points(result.pages_sans_meta_desc, pages);
    points += tranche_points(result.pages_sans_h1, pages);
    points += tranche_points(result.pages_vides, pages);
    if result.titles_dupliques > 0.30 {
        points += 0.5;
    }

    Some(ProspectScore {
        score: round_to(points, 1).clamp(MIN_SCORE, MAX_SCORE),
        opportunities: opportunities(result),
    })
}

/// Half a point per full 20 % of affected pages.
fn tranche_points(defects: usize, pages: usize) -> f64 {
    0.5 * ((5 * defects) / pages) as f64
}

/// Opportunity phrases in report order.
fn opportunities(result: &SiteAuditResult) -> Vec<String> {
    let mut found = Vec::new();

    if result.has_blog {
        match result.blog_status {
            BlogStatus::Abandoned => found.push("blog abandonné".to_string()),
            BlogStatus::SemiActive => found.push("blog semi-actif".to_string()),
            _ => {}
        }
    } else {
        found.push("pas de blog".to_string());
    }
    if !result.has_sitemap {
        found.push("pas de sitemap".to_string());
    }
    if result.nb_pages < 5 {
        found.push(format!("{} pages seulement", result.nb_pages));
    }
    if result.mots_moyen_par_page < 150 {
        found.push(format!(
            "contenu faible ({} mots/page)",
            result.mots_moyen_par_page
        ));
    }
    if result.ratio_texte_html < 0.15 {
        found.push(format!(
            "ratio texte/HTML faible ({:.0}%)",
            result.ratio_texte_html * 100.0
        ));
    }
    if let Some(cms) = &result.cms_detecte {
        found.push(format!("CMS : {cms}"));
    }
    if result.pages_sans_meta_desc > 0 {
        found.push(format!(
            "{} pages sans meta desc",
            result.pages_sans_meta_desc
        ));
    }
    if result.pages_sans_h1 > 0 {
        found.push(format!("{} pages sans H1", result.pages_sans_h1));
    }

    found
}
