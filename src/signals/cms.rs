//! CMS fingerprinting from raw HTML.
//!
//! | Platform | Example signature |
//! |----------|-------------------|
//! | WordPress | `wp-content`, `wp-json`, generator meta tag |
//! | Wix | `static.wixstatic.com` |
//! | Shopify | `cdn.shopify.com` |
//! | Prestashop | `/modules/ps_` |
//! | Webflow | `assets.website-files.com` |
//! | Squarespace | `static1.squarespace.com` |
//! | Joomla | `/media/jui/` |
//! | Drupal | `/sites/default/files/` |
//!
//! The table is ordered: the first platform with any matching signature wins.

/// Platform name → literal substrings, in priority order.
pub const CMS_SIGNATURES: &[(&str, &[&str])] = &[
    (
        "WordPress",
        &[
            "wp-content",
            "wp-includes",
            "wp-json",
            "/wp-admin",
            r#"meta name="generator" content="WordPress"#,
        ],
    ),
    (
        "Wix",
        &["wix.com", "X-Wix-", "_wix_browser_sess", "static.wixstatic.com"],
    ),
    ("Shopify", &["cdn.shopify.com", "Shopify.theme", "myshopify.com"]),
    ("Prestashop", &["PrestaShop", "prestashop", "/modules/ps_"]),
    ("Webflow", &["webflow.com", "Webflow", "assets.website-files.com"]),
    (
        "Squarespace",
        &["squarespace.com", "static1.squarespace.com", "Squarespace"],
    ),
    ("Joomla", &["Joomla!", "/media/jui/", "/components/com_"]),
    ("Drupal", &["Drupal", "/sites/default/files/", "drupal.js"]),
];

/// Detect the CMS a page was built with.
pub fn detect_cms(html: &str) -> Option<&'static str> {
    CMS_SIGNATURES
        .iter()
        .find(|(_, signatures)| signatures.iter().any(|sig| html.contains(sig)))
        .map(|(name, _)| *name)
}
