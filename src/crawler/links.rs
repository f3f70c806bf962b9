//! Internal link extraction for the crawl frontier.

use crate::utils::{normalize_url, site_key};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

/// Resources that are never HTML pages.
static BINARY_EXTENSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(pdf|jpg|jpeg|png|gif|svg|css|js|zip|doc|xls|mp[34])$")
        .expect("extension pattern is valid")
});

/// Normalized same-site links of a page, deduplicated, in document order.
///
/// A link is kept when it resolves to http(s) on the same host as `site`
/// (ignoring `www.`) and does not point at a binary file.
pub fn internal_links(document: &Html, page_url: &Url, site: &str) -> Vec<String> {
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| page_url.join(href.trim()).ok())
        .filter(|link| matches!(link.scheme(), "http" | "https"))
        .filter(|link| site_key(link) == site)
        .map(|link| normalize_url(&link))
        .filter(|link| !BINARY_EXTENSION.is_match(link))
        .unique()
        .collect()
}
