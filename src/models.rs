//! Data models for crawled pages, site audits, and prospect scores.
//!
//! This module defines the core data structures used throughout the application:
//! - [`PageRecord`]: Signals extracted from one fetched page
//! - [`SiteAuditResult`]: Aggregate audit of one company website
//! - [`ProspectScore`]: Opportunity score projected from an audit
//! - [`Company`] and [`Prospect`]: one registry row before and after auditing
//! - Classification enums: [`BlogStatus`], [`ActivityStatus`],
//!   [`PublicationFrequency`], [`BlogSource`]
//!
//! Audit field names follow the column names consumed by the downstream
//! report and enrichment steps, so they stay in French on the wire.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signals extracted from a single fetched HTML page.
///
/// A record is produced once per successfully fetched page and folded into
/// the crawl accumulator straight away; page content itself is never kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRecord {
    /// Normalized URL of the page.
    pub url: String,
    /// BFS depth at which the page was reached (root = 0).
    pub depth: usize,
    /// Raw HTML size in bytes.
    pub html_bytes: usize,
    /// Number of visible words outside script/style/noscript/header/footer/nav.
    pub word_count: usize,
    /// Byte length of the visible words joined by single spaces.
    pub text_bytes: usize,
    /// Trimmed text of the first `<title>`, empty when absent.
    pub title: String,
    pub has_meta_description: bool,
    pub has_canonical: bool,
    pub noindex: bool,
    pub h1_count: usize,
    /// Valid dates found in `<time>` tags, JSON-LD and the URL itself.
    pub dates: Vec<NaiveDate>,
    /// True when the page path matches a blog URL pattern.
    pub is_blog_page: bool,
    /// True when the page declares an RSS or Atom `<link>`.
    pub has_feed: bool,
    /// Fewer than 50 words on a page that is not structurally thin by nature.
    pub near_empty: bool,
}

/// Blog activity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlogStatus {
    #[default]
    #[serde(rename = "absent")]
    Absent,
    /// A blog was found but none of its pages carried a usable date.
    #[serde(rename = "présent")]
    Present,
    #[serde(rename = "actif")]
    Active,
    #[serde(rename = "semi-actif")]
    SemiActive,
    #[serde(rename = "abandonné")]
    Abandoned,
}

impl BlogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlogStatus::Absent => "absent",
            BlogStatus::Present => "présent",
            BlogStatus::Active => "actif",
            BlogStatus::SemiActive => "semi-actif",
            BlogStatus::Abandoned => "abandonné",
        }
    }
}

impl fmt::Display for BlogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall site activity classification.
///
/// Only ever `Active` when derived from dated blog posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivityStatus {
    #[default]
    #[serde(rename = "inconnu")]
    Unknown,
    #[serde(rename = "actif")]
    Active,
    #[serde(rename = "semi-actif")]
    SemiActive,
    #[serde(rename = "abandonné")]
    Abandoned,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Unknown => "inconnu",
            ActivityStatus::Active => "actif",
            ActivityStatus::SemiActive => "semi-actif",
            ActivityStatus::Abandoned => "abandonné",
        }
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication rhythm inferred from the mean gap between blog post dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublicationFrequency {
    /// Mean gap of 14 days or less.
    #[serde(rename = "hebdomadaire")]
    Weekly,
    /// Mean gap of 45 days or less.
    #[serde(rename = "mensuelle")]
    Monthly,
    /// Mean gap of 100 days or less.
    #[serde(rename = "trimestrielle")]
    Quarterly,
    #[serde(rename = "rare")]
    Rare,
}

impl PublicationFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationFrequency::Weekly => "hebdomadaire",
            PublicationFrequency::Monthly => "mensuelle",
            PublicationFrequency::Quarterly => "trimestrielle",
            PublicationFrequency::Rare => "rare",
        }
    }

    /// Weekly or monthly publishing.
    pub fn is_frequent(&self) -> bool {
        matches!(
            self,
            PublicationFrequency::Weekly | PublicationFrequency::Monthly
        )
    }
}

impl fmt::Display for PublicationFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which detection strategy confirmed the blog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlogSource {
    /// A crawled page had a blog-shaped path.
    #[serde(rename = "page")]
    CrawledPage,
    /// A discovered but never fetched URL had a blog-shaped path.
    #[serde(rename = "lien")]
    DiscoveredLink,
    /// A navigation link whose target was re-fetched and showed articles.
    #[serde(rename = "navigation")]
    VerifiedNavLink,
}

impl BlogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlogSource::CrawledPage => "page",
            BlogSource::DiscoveredLink => "lien",
            BlogSource::VerifiedNavLink => "navigation",
        }
    }
}

/// Aggregate audit of one company website.
///
/// Created fresh per site, filled by the crawl, finalized once by the
/// aggregator and immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteAuditResult {
    // Structure
    pub nb_pages: usize,
    pub profondeur_max: usize,
    pub has_sitemap: bool,
    pub has_robots_txt: bool,
    // Blog
    pub has_blog: bool,
    pub blog_url: Option<String>,
    pub blog_source: Option<BlogSource>,
    pub has_rss: bool,
    pub blog_status: BlogStatus,
    pub derniere_maj_blog: Option<NaiveDate>,
    pub frequence_publication: Option<PublicationFrequency>,
    // Activity
    pub derniere_date: Option<NaiveDate>,
    pub activite_status: ActivityStatus,
    // Per-page defects
    pub pages_sans_title: usize,
    pub pages_title_court: usize,
    /// Duplicate-title ratio in `[0.0, 1.0]`, two decimals.
    pub titles_dupliques: f64,
    pub pages_sans_meta_desc: usize,
    pub pages_sans_h1: usize,
    pub pages_h1_multiple: usize,
    pub pages_sans_canonical: usize,
    pub pages_noindex: usize,
    // Content
    pub mots_moyen_par_page: usize,
    pub pages_vides: usize,
    /// Text/HTML byte ratio in `[0.0, 1.0]`, two decimals.
    pub ratio_texte_html: f64,
    // Technology
    pub cms_detecte: Option<String>,
    /// Set only when no page at all could be fetched.
    pub audit_erreur: Option<String>,
}

impl SiteAuditResult {
    /// Column names appended to each company row, in output order.
    pub const CSV_COLUMNS: [&'static str; 27] = [
        "nb_pages",
        "profondeur_max",
        "has_sitemap",
        "has_robots_txt",
        "has_blog",
        "blog_url",
        "blog_source",
        "has_rss",
        "blog_status",
        "derniere_maj_blog",
        "frequence_publication",
        "derniere_date",
        "activite_status",
        "pages_sans_title",
        "pages_title_court",
        "titles_dupliques",
        "pages_sans_meta_desc",
        "pages_sans_h1",
        "pages_h1_multiple",
        "pages_sans_canonical",
        "pages_noindex",
        "mots_moyen_par_page",
        "pages_vides",
        "ratio_texte_html",
        "cms_detecte",
        "audit_erreur",
        "date_audit",
    ];

    /// Result for a site where not a single page could be fetched.
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            audit_erreur: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Render the audit as CSV cells matching [`Self::CSV_COLUMNS`].
    ///
    /// `today` is the reference date the audit was computed against.
    pub fn csv_fields(&self, today: NaiveDate) -> Vec<String> {
        fn opt<T: ToString>(v: &Option<T>) -> String {
            v.as_ref().map(ToString::to_string).unwrap_or_default()
        }

        vec![
            self.nb_pages.to_string(),
            self.profondeur_max.to_string(),
            self.has_sitemap.to_string(),
            self.has_robots_txt.to_string(),
            self.has_blog.to_string(),
            opt(&self.blog_url),
            self.blog_source
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            self.has_rss.to_string(),
            self.blog_status.to_string(),
            opt(&self.derniere_maj_blog),
            opt(&self.frequence_publication),
            opt(&self.derniere_date),
            self.activite_status.to_string(),
            self.pages_sans_title.to_string(),
            self.pages_title_court.to_string(),
            format!("{:.2}", self.titles_dupliques),
            self.pages_sans_meta_desc.to_string(),
            self.pages_sans_h1.to_string(),
            self.pages_h1_multiple.to_string(),
            self.pages_sans_canonical.to_string(),
            self.pages_noindex.to_string(),
            self.mots_moyen_par_page.to_string(),
            self.pages_vides.to_string(),
            format!("{:.2}", self.ratio_texte_html),
            opt(&self.cms_detecte),
            opt(&self.audit_erreur),
            today.to_string(),
        ]
    }
}

/// Opportunity score projected from a [`SiteAuditResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProspectScore {
    /// Clamped to `[1.0, 10.0]`, one decimal.
    pub score: f64,
    /// Opportunity phrases that fired, in report order.
    pub opportunities: Vec<String>,
}

impl ProspectScore {
    /// One-sentence summary used verbatim by the report.
    pub fn summary(&self) -> String {
        let mut summary = format!("Score {:.1}/10.", self.score);
        if !self.opportunities.is_empty() {
            summary.push_str(" Opportunités : ");
            summary.push_str(&self.opportunities.join(", "));
            summary.push('.');
        }
        summary
    }
}

/// One row of the company registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Company {
    pub name: String,
    /// Site address as written in the registry, possibly scheme-less.
    pub site: String,
    /// Whether an earlier step confirmed the site belongs to the company.
    pub verified: bool,
    /// Every input cell kept for the enriched output, in input column order.
    pub fields: Vec<String>,
}

/// A company together with what its audit produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Prospect {
    pub company: Company,
    /// `None` when the row was not audited.
    pub audit: Option<SiteAuditResult>,
    /// `None` when the row is not eligible for the ranking.
    pub score: Option<ProspectScore>,
}
