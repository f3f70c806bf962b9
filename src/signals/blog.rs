//! Blog and feed detection.
//!
//! No single heuristic finds blogs reliably on real sites, so three
//! strategies are tried in order by the crawler:
//!
//! 1. [`from_crawled_page`]: a fetched page had a blog-shaped path
//! 2. [`from_discovered_links`]: a discovered but unfetched URL had one
//! 3. [`from_verified_nav_link`]: a navigation link mentioning a blog
//!    keyword, accepted only once its target shows real articles
//!
//! Feed detection ([`has_feed_link`]) is independent and runs on every page.

use crate::models::BlogSource;
use crate::signals::dates::extract_dates;
use crate::utils::url_path_lower;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Path fragments that mark a blog or news section.
pub const BLOG_URL_PATTERNS: &[&str] = &[
    "/blog",
    "/actualites",
    "/actualite",
    "/fil-dactualite",
    "/fil-actualite",
    "/news",
    "/articles",
    "/article",
    "/journal",
    "/mag",
    "/magazine",
    "/ressources",
    "/publications",
    "/posts",
    "/edito",
    "/chroniques",
    "/insights",
    "/presse",
    "/communiques",
    "/breves",
    "/dossiers",
    "/tribunes",
];

/// Words that mark a blog entry in a navigation menu.
pub const BLOG_NAV_KEYWORDS: &[&str] = &[
    "blog",
    "actualité",
    "actualités",
    "news",
    "journal",
    "magazine",
    "mag",
    "ressources",
    "publications",
    "édito",
    "edito",
    "insights",
    "presse",
    "communiqués",
    "brèves",
    "chroniques",
    "dossiers",
];

/// Class fragments that make a `<div>` count as navigation.
const NAV_CLASS_HINTS: &[&str] = &["nav", "menu", "navigation", "header"];

/// Minimum dates or article links a blog index must show to be trusted.
const MIN_ARTICLE_EVIDENCE: usize = 2;

static NAV_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("nav, header").expect("nav selector is valid"));
static CLASSED_DIV_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div[class]").expect("div selector is valid"));
static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));
static TYPED_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link[type]").expect("link selector is valid"));

static ARTICLE_LINK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/20\d{2}/|/(article|post|billet|actu)s?[-/]|-\d{4}-\d{2}-\d{2}")
        .expect("article link pattern is valid")
});

/// Blog location together with the strategy that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogEvidence {
    pub url: String,
    pub source: BlogSource,
}

/// True when the URL path contains one of [`BLOG_URL_PATTERNS`].
pub fn is_blog_url(url: &str) -> bool {
    let path = url_path_lower(url);
    BLOG_URL_PATTERNS.iter().any(|p| path.contains(p))
}

/// Strategy 1: the first crawled page whose path looked like a blog.
pub fn from_crawled_page(first_blog_page: Option<&str>) -> Option<BlogEvidence> {
    first_blog_page.map(|url| BlogEvidence {
        url: url.to_string(),
        source: BlogSource::CrawledPage,
    })
}

/// Strategy 2: the first discovered URL, fetched or not, whose path looked like a blog.
pub fn from_discovered_links<'a, I>(discovered: I) -> Option<BlogEvidence>
where
    I: IntoIterator<Item = &'a String>,
{
    discovered
        .into_iter()
        .find(|url| is_blog_url(url))
        .map(|url| BlogEvidence {
            url: url.clone(),
            source: BlogSource::DiscoveredLink,
        })
}

/// Strategy 3: accept a navigation candidate once its fetched page shows articles.
pub fn from_verified_nav_link(candidate: &str, document: &Html) -> Option<BlogEvidence> {
    looks_like_blog_index(document, candidate).then(|| BlogEvidence {
        url: candidate.to_string(),
        source: BlogSource::VerifiedNavLink,
    })
}

/// First navigation link whose text or href carries a blog keyword.
///
/// Navigation means `<nav>` and `<header>` elements, then any `<div>` whose
/// class mentions nav, menu or header. The link is resolved against `base`.
pub fn find_nav_blog_link(document: &Html, base: &Url) -> Option<String> {
    let classed_navs = document.select(&CLASSED_DIV_SELECTOR).filter(|div| {
        let classes = div.value().attr("class").unwrap_or_default().to_lowercase();
        NAV_CLASS_HINTS.iter().any(|hint| classes.contains(hint))
    });

    document
        .select(&NAV_SELECTOR)
        .chain(classed_navs)
        .find_map(|container| blog_link_in(container, base))
}

fn blog_link_in(container: ElementRef<'_>, base: &Url) -> Option<String> {
    container.select(&ANCHOR_SELECTOR).find_map(|a| {
        let href = a.value().attr("href")?;
        let text = a.text().collect::<String>().trim().to_lowercase();
        let href_lower = href.to_lowercase();
        let mentions_blog = BLOG_NAV_KEYWORDS
            .iter()
            .any(|kw| text.contains(kw) || href_lower.contains(kw));
        if !mentions_blog {
            return None;
        }
        let resolved = base.join(href).ok()?;
        matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
    })
}

/// True when the page declares an RSS or Atom feed.
pub fn has_feed_link(document: &Html) -> bool {
    document.select(&TYPED_LINK_SELECTOR).any(|link| {
        let kind = link.value().attr("type").unwrap_or_default().to_lowercase();
        kind.contains("rss") || kind.contains("atom")
    })
}

/// A blog index shows at least two distinct dates or two article-shaped links.
///
/// Decorative `/blog` menu entries often lead to empty placeholder pages;
/// those show neither.
pub fn looks_like_blog_index(document: &Html, url: &str) -> bool {
    let distinct_dates: HashSet<_> = extract_dates(document, url).into_iter().collect();
    if distinct_dates.len() >= MIN_ARTICLE_EVIDENCE {
        return true;
    }

    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| ARTICLE_LINK_PATTERN.is_match(&href.to_lowercase()))
        .take(MIN_ARTICLE_EVIDENCE)
        .count()
        >= MIN_ARTICLE_EVIDENCE
}
