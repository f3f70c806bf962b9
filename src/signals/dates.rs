//! Publication date extraction.
//!
//! Dates are looked up, in order, in `<time>` tags, in the `datePublished`
//! / `dateModified` fields of JSON-LD blocks, and in the page URL. Only
//! `YYYY-MM-DD` or `YYYY/MM/DD` dates with a year in 2010–2029 are kept, and
//! they must be real calendar dates.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

/// Group 1 is the date; digits may not touch it on either side.
static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?:^|\D)",
        r"(20[12]\d-(?:0[1-9]|1[0-2])-(?:0[1-9]|[12]\d|3[01])",
        r"|20[12]\d/(?:0[1-9]|1[0-2])/(?:0[1-9]|[12]\d|3[01]))",
        r"(?:\D|$)",
    ))
    .expect("date pattern is valid")
});

static TIME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time").expect("time selector is valid"));
static JSON_LD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("json-ld selector is valid")
});

const JSON_LD_FIELDS: [&str; 2] = ["datePublished", "dateModified"];
/// How far after a JSON-LD field name its value is searched for.
const JSON_LD_WINDOW: usize = 50;

/// First well-formed date in `text`, if any.
pub fn find_date(text: &str) -> Option<NaiveDate> {
    let date = DATE_PATTERN.captures(text)?.get(1)?;
    parse_date(date.as_str())
}

/// Parse `YYYY-MM-DD` or `YYYY/MM/DD`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&raw.replace('/', "-"), "%Y-%m-%d").ok()
}

/// All dates found on a page.
pub fn extract_dates(document: &Html, url: &str) -> Vec<NaiveDate> {
    let mut dates = Vec::new();

    for time in document.select(&TIME_SELECTOR) {
        let datetime = time.value().attr("datetime").unwrap_or_default();
        let found = if datetime.is_empty() {
            find_date(&time.text().collect::<String>())
        } else {
            find_date(datetime)
        };
        dates.extend(found);
    }

    for script in document.select(&JSON_LD_SELECTOR) {
        let text = script.text().collect::<String>();
        for field in JSON_LD_FIELDS {
            if let Some(idx) = text.find(field) {
                dates.extend(find_date(window(&text, idx, JSON_LD_WINDOW)));
            }
        }
    }

    dates.extend(find_date(url));
    dates
}

/// `text[start..start + len]`, shrunk to the nearest char boundary.
fn window(text: &str, start: usize, len: usize) -> &str {
    let mut end = (start + len).min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[start..end]
}
