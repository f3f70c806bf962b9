//! Post-crawl aggregation.
//!
//! The crawler folds each [`PageRecord`] into a [`SiteSignals`] accumulator
//! as soon as the page is extracted. Once the crawl ends, [`finalize`] turns
//! the accumulator into the immutable [`SiteAuditResult`].
//!
//! `finalize` is a pure function: the same signals, blog evidence and
//! reference date always give the same result. The reference date is taken
//! once per run by the caller so that every age comparison agrees.
//!
//! # Activity rules
//!
//! | Evidence | Blog status | Site activity |
//! |----------|-------------|---------------|
//! | dated blog posts | by age of newest post | same as blog status |
//! | blog without dates | `présent` | from any site date, at most `semi-actif` |
//! | no blog | `absent` | from any site date, at most `semi-actif` |
//! | no date anywhere | `présent`/`absent` | `inconnu` |
//!
//! Age thresholds: under 365 days is `actif`, under 730 days `semi-actif`,
//! anything older `abandonné`.

use crate::models::{
    ActivityStatus, BlogStatus, PageRecord, PublicationFrequency, SiteAuditResult,
};
use crate::signals::blog::BlogEvidence;
use crate::utils::round_to;
use chrono::NaiveDate;
use itertools::Itertools;

/// Error recorded when no page of a site could be fetched.
pub const NO_PAGE_REACHABLE: &str = "Aucune page accessible";

/// Titles shorter than this many characters count as short.
const SHORT_TITLE_CHARS: usize = 20;
const ACTIVE_DAYS: i64 = 365;
const SEMI_ACTIVE_DAYS: i64 = 730;

/// Everything the aggregator needs from one crawl.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteSignals {
    pub pages_fetched: usize,
    pub max_depth: usize,
    pub has_robots_txt: bool,
    pub has_sitemap: bool,
    pub cms: Option<String>,
    pub has_feed: bool,
    /// First crawled page whose path looked like a blog.
    pub first_blog_page: Option<String>,
    titles: Vec<String>,
    all_dates: Vec<NaiveDate>,
    /// Dates seen on blog-path pages only.
    blog_dates: Vec<NaiveDate>,
    total_words: usize,
    total_html_bytes: usize,
    total_text_bytes: usize,
    pages_sans_title: usize,
    pages_title_court: usize,
    pages_sans_meta_desc: usize,
    pages_sans_h1: usize,
    pages_h1_multiple: usize,
    pages_sans_canonical: usize,
    pages_noindex: usize,
    pages_vides: usize,
}

impl SiteSignals {
    /// Fold one fetched page into the accumulator.
    pub fn record(&mut self, page: &PageRecord) {
        self.pages_fetched += 1;
        self.max_depth = self.max_depth.max(page.depth);
        self.total_html_bytes += page.html_bytes;
        self.total_words += page.word_count;
        self.total_text_bytes += page.text_bytes;

        if page.title.is_empty() {
            self.pages_sans_title += 1;
        } else if page.title.chars().count() < SHORT_TITLE_CHARS {
            self.pages_title_court += 1;
        }
        self.titles.push(page.title.clone());

        if !page.has_meta_description {
            self.pages_sans_meta_desc += 1;
        }
        match page.h1_count {
            0 => self.pages_sans_h1 += 1,
            1 => {}
            _ => self.pages_h1_multiple += 1,
        }
        if !page.has_canonical {
            self.pages_sans_canonical += 1;
        }
        if page.noindex {
            self.pages_noindex += 1;
        }
        if page.near_empty {
            self.pages_vides += 1;
        }

        self.all_dates.extend(&page.dates);
        if page.is_blog_page {
            self.blog_dates.extend(&page.dates);
            if self.first_blog_page.is_none() {
                self.first_blog_page = Some(page.url.clone());
            }
        }
        self.has_feed |= page.has_feed;
    }
}

/// Build the final audit from the crawl accumulator.
///
/// `blog` is the outcome of the blog detection chain, if any strategy fired.
pub fn finalize(
    signals: &SiteSignals,
    blog: Option<&BlogEvidence>,
    today: NaiveDate,
) -> SiteAuditResult {
    if signals.pages_fetched == 0 {
        return SiteAuditResult::unreachable(NO_PAGE_REACHABLE);
    }

    let pages = signals.pages_fetched;
    let latest_blog_post = signals.blog_dates.iter().max().copied();
    let blog_recency = latest_blog_post.map(|d| recency(d, today));

    let blog_status = match blog_recency {
        Some(ActivityStatus::Active) => BlogStatus::Active,
        Some(ActivityStatus::SemiActive) => BlogStatus::SemiActive,
        Some(_) => BlogStatus::Abandoned,
        None if blog.is_some() => BlogStatus::Present,
        None => BlogStatus::Absent,
    };

    let (derniere_date, activite_status) = match (blog, latest_blog_post, blog_recency) {
        (Some(_), Some(latest), Some(status)) => (Some(latest), status),
        _ => match signals.all_dates.iter().max().copied() {
            // Generic dates (footers, legal notices) never prove ongoing work.
            Some(latest) => {
                let status = match recency(latest, today) {
                    ActivityStatus::Abandoned => ActivityStatus::Abandoned,
                    _ => ActivityStatus::SemiActive,
                };
                (Some(latest), status)
            }
            None => (None, ActivityStatus::Unknown),
        },
    };

    let ratio_texte_html = if signals.total_html_bytes > 0 {
        let ratio = signals.total_text_bytes as f64 / signals.total_html_bytes as f64;
        round_to(ratio.min(1.0), 2)
    } else {
        0.0
    };

    SiteAuditResult {
        nb_pages: pages,
        profondeur_max: signals.max_depth,
        has_sitemap: signals.has_sitemap,
        has_robots_txt: signals.has_robots_txt,
        has_blog: blog.is_some(),
        blog_url: blog.map(|b| b.url.clone()),
        blog_source: blog.map(|b| b.source),
        has_rss: signals.has_feed,
        blog_status,
        derniere_maj_blog: latest_blog_post,
        frequence_publication: publication_frequency(&signals.blog_dates),
        derniere_date,
        activite_status,
        pages_sans_title: signals.pages_sans_title,
        pages_title_court: signals.pages_title_court,
        titles_dupliques: duplicate_title_ratio(&signals.titles),
        pages_sans_meta_desc: signals.pages_sans_meta_desc,
        pages_sans_h1: signals.pages_sans_h1,
        pages_h1_multiple: signals.pages_h1_multiple,
        pages_sans_canonical: signals.pages_sans_canonical,
        pages_noindex: signals.pages_noindex,
        mots_moyen_par_page: (signals.total_words as f64 / pages as f64).round_ties_even() as usize,
        pages_vides: signals.pages_vides,
        ratio_texte_html,
        cms_detecte: signals.cms.clone(),
        audit_erreur: None,
    }
}

/// Age class of the newest dated evidence.
fn recency(latest: NaiveDate, today: NaiveDate) -> ActivityStatus {
    let days = (today - latest).num_days();
    if days < ACTIVE_DAYS {
        ActivityStatus::Active
    } else if days < SEMI_ACTIVE_DAYS {
        ActivityStatus::SemiActive
    } else {
        ActivityStatus::Abandoned
    }
}

/// Publishing rhythm from the mean positive gap between post dates.
///
/// Needs at least two dates; same-day duplicates do not count as a gap.
pub fn publication_frequency(dates: &[NaiveDate]) -> Option<PublicationFrequency> {
    if dates.len() < 2 {
        return None;
    }
    let gaps: Vec<i64> = dates
        .iter()
        .sorted()
        .tuple_windows()
        .map(|(a, b)| (*b - *a).num_days())
        .filter(|days| *days > 0)
        .collect();
    if gaps.is_empty() {
        return None;
    }

    let mean = gaps.iter().sum::<i64>() as f64 / gaps.len() as f64;
    Some(if mean <= 14.0 {
        PublicationFrequency::Weekly
    } else if mean <= 45.0 {
        PublicationFrequency::Monthly
    } else if mean <= 100.0 {
        PublicationFrequency::Quarterly
    } else {
        PublicationFrequency::Rare
    })
}

/// Share of non-empty titles that repeat an earlier one, two decimals.
pub fn duplicate_title_ratio(titles: &[String]) -> f64 {
    let non_empty: Vec<&String> = titles.iter().filter(|t| !t.is_empty()).collect();
    if non_empty.is_empty() {
        return 0.0;
    }
    let distinct = non_empty.iter().unique().count();
    round_to(
        (non_empty.len() - distinct) as f64 / non_empty.len() as f64,
        2,
    )
}
