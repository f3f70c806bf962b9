//! Utility functions for URL handling, rounding, logging, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - URL normalization and host comparison for the crawler
//! - Fixed-precision rounding for reported ratios
//! - String truncation for logging
//! - File system validation for output directories

use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Parse a site address from the company registry into an absolute URL.
///
/// Registry values are often scheme-less (`example.fr`), so `https://` is
/// assumed when no scheme is given. Only http(s) URLs with a host are accepted.
pub fn parse_site_url(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    let url = Url::parse(&candidate).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    Some(url)
}

/// Host (and explicit port) of a URL with any leading `www.` removed.
///
/// Two URLs belong to the same site when their site keys are equal.
pub fn site_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    }
}

/// Canonical string form used for the visited set and the frontier.
///
/// Keeps scheme, host, port and path; drops query and fragment; strips the
/// trailing slash so `/a` and `/a/` are the same page.
pub fn normalize_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let raw = format!("{}://{}{}", url.scheme(), authority, url.path());
    raw.trim_end_matches('/').to_string()
}

/// `scheme://host[:port]` of a URL, used to probe robots.txt and sitemap.xml.
pub fn site_root(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    }
}

/// Lower-cased path of a URL string, trailing slash removed.
///
/// Returns an empty string when the URL cannot be parsed.
pub fn url_path_lower(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.path().to_lowercase().trim_end_matches('/').to_string())
        .unwrap_or_default()
}

/// Round to `decimals` decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the last char boundary before `max` bytes with an
/// ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Ensure the parent directory of an output file exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
#[instrument(level = "info", skip_all, fields(path = %file_path))]
pub async fn ensure_writable_parent(file_path: &str) -> Result<(), Box<dyn Error>> {
    let dir = Path::new(file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).await?;

    let probe_path = dir.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!(dir = %dir.display(), "Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
