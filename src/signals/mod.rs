//! Per-page signal extraction.
//!
//! [`extract_page`] turns one parsed HTML page into a [`PageRecord`]. The
//! submodules hold the detectors that the crawler also calls on their own:
//!
//! - [`dates`]: publication dates from `<time>`, JSON-LD and the URL
//! - [`cms`]: platform fingerprinting from raw HTML
//! - [`blog`]: blog URL patterns, navigation links, feeds, blog index checks
//!
//! Nothing here mutates the parsed document, so every detector can run
//! against the same parse.

pub mod blog;
pub mod cms;
pub mod dates;

use crate::models::PageRecord;
use crate::utils::url_path_lower;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

/// Subtrees whose text is not page content.
const IGNORED_TEXT_TAGS: &[&str] = &["script", "style", "noscript", "header", "footer", "nav"];

/// Pages expected to be short; they never count as near-empty.
pub const STRUCTURAL_PAGES: &[&str] = &[
    "/contact",
    "/mentions-legales",
    "/mentions_legales",
    "/cgv",
    "/cgu",
    "/privacy",
    "/politique",
    "/politique-de-confidentialite",
    "/login",
    "/connexion",
];

/// Word count under which a page is considered near-empty.
pub const NEAR_EMPTY_WORDS: usize = 50;

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("title selector is valid"));
static META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[name]").expect("meta selector is valid"));
static H1_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1").expect("h1 selector is valid"));
static REL_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link[rel]").expect("link selector is valid"));

/// Extract every per-page signal from a parsed document.
///
/// `html_bytes` is the size of the raw body the document was parsed from.
pub fn extract_page(document: &Html, html_bytes: usize, url: &str, depth: usize) -> PageRecord {
    let words = visible_words(document);
    let word_count = words.len();
    let text_bytes = words.join(" ").len();

    PageRecord {
        url: url.to_string(),
        depth,
        html_bytes,
        word_count,
        text_bytes,
        title: title(document),
        has_meta_description: meta_content(document, "description")
            .is_some_and(|content| !content.trim().is_empty()),
        has_canonical: has_canonical(document),
        noindex: meta_content(document, "robots")
            .is_some_and(|content| content.to_lowercase().contains("noindex")),
        h1_count: document.select(&H1_SELECTOR).count(),
        dates: dates::extract_dates(document, url),
        is_blog_page: blog::is_blog_url(url),
        has_feed: blog::has_feed_link(document),
        near_empty: word_count < NEAR_EMPTY_WORDS && !is_structural_page(url),
    }
}

/// Trimmed text of the first `<title>`, or an empty string.
pub fn title(document: &Html) -> String {
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// `content` of the first `<meta>` whose name matches, case-insensitively.
fn meta_content<'a>(document: &'a Html, name: &str) -> Option<&'a str> {
    document
        .select(&META_SELECTOR)
        .find(|meta| {
            meta.value()
                .attr("name")
                .is_some_and(|n| n.trim().eq_ignore_ascii_case(name))
        })
        .map(|meta| meta.value().attr("content").unwrap_or_default())
}

fn has_canonical(document: &Html) -> bool {
    document.select(&REL_LINK_SELECTOR).any(|link| {
        link.value()
            .attr("rel")
            .unwrap_or_default()
            .split_whitespace()
            .any(|rel| rel.eq_ignore_ascii_case("canonical"))
    })
}

/// Visible words of the page, in document order.
///
/// Walks text nodes and skips those nested under an ignored tag instead of
/// detaching subtrees.
pub fn visible_words(document: &Html) -> Vec<&str> {
    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => Some((node, &**text)),
            _ => None,
        })
        .filter(|(node, _)| {
            !node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|el| IGNORED_TEXT_TAGS.contains(&el.value().name()))
        })
        .flat_map(|(_, text)| text.split_whitespace())
        .collect()
}

/// Contact, legal and login pages are short by nature.
pub fn is_structural_page(url: &str) -> bool {
    let path = url_path_lower(url);
    STRUCTURAL_PAGES
        .iter()
        .any(|p| path == *p || path.starts_with(&format!("{p}/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html: &str, url: &str) -> PageRecord {
        let doc = Html::parse_document(html);
        extract_page(&doc, html.len(), url, 1)
    }

    fn words(n: usize) -> String {
        vec!["mot"; n].join(" ")
    }

    #[test]
    fn test_title_and_meta() {
        let html = r#"<html><head>
            <title>  Chantier naval Dupont  </title>
            <meta name="Description" content="Réparation de bateaux">
            <link rel="canonical" href="https://example.fr/">
            </head><body><h1>Accueil</h1><h1>Bis</h1></body></html>"#;
        let record = page(html, "https://example.fr");
        assert_eq!(record.title, "Chantier naval Dupont");
        assert!(record.has_meta_description);
        assert!(record.has_canonical);
        assert!(!record.noindex);
        assert_eq!(record.h1_count, 2);
        assert_eq!(record.depth, 1);
        assert_eq!(record.html_bytes, html.len());
    }

    #[test]
    fn test_missing_tags_are_absent_signals() {
        let record = page("<p>bonjour</p>", "https://example.fr");
        assert_eq!(record.title, "");
        assert!(!record.has_meta_description);
        assert!(!record.has_canonical);
        assert_eq!(record.h1_count, 0);
        assert!(record.dates.is_empty());
    }

    #[test]
    fn test_blank_meta_description_is_missing() {
        let record = page(
            r#"<head><meta name="description" content="   "></head>"#,
            "https://example.fr",
        );
        assert!(!record.has_meta_description);
    }

    #[test]
    fn test_noindex_case_insensitive() {
        let record = page(
            r#"<head><meta name="ROBOTS" content="NoIndex, follow"></head>"#,
            "https://example.fr",
        );
        assert!(record.noindex);
    }

    #[test]
    fn test_visible_words_skip_chrome_and_scripts() {
        let html = r#"<html><head><style>body { color: red }</style></head><body>
            <header>Menu principal</header>
            <nav><a href="/">Accueil</a></nav>
            <main><p>Un deux trois</p><script>var x = 1;</script><noscript>Activez JS</noscript></main>
            <footer>Mentions légales</footer>
            </body></html>"#;
        let doc = Html::parse_document(html);
        assert_eq!(visible_words(&doc), vec!["Un", "deux", "trois"]);

        let record = extract_page(&doc, html.len(), "https://example.fr", 0);
        assert_eq!(record.word_count, 3);
        assert_eq!(record.text_bytes, "Un deux trois".len());
    }

    #[test]
    fn test_extraction_does_not_mutate_document() {
        let html = "<nav>Blog</nav><p>contenu</p>";
        let doc = Html::parse_document(html);
        let before = doc.html();
        let _ = extract_page(&doc, html.len(), "https://example.fr", 0);
        assert_eq!(doc.html(), before);
    }

    #[test]
    fn test_contact_page_is_not_near_empty() {
        let record = page(&format!("<p>{}</p>", words(10)), "https://example.fr/contact");
        assert_eq!(record.word_count, 10);
        assert!(!record.near_empty);
    }

    #[test]
    fn test_product_page_is_near_empty() {
        let record = page(&format!("<p>{}</p>", words(10)), "https://example.fr/produits");
        assert!(record.near_empty);
    }

    #[test]
    fn test_long_page_is_not_near_empty() {
        let record = page(&format!("<p>{}</p>", words(60)), "https://example.fr/produits");
        assert!(!record.near_empty);
    }

    #[test]
    fn test_structural_pages() {
        assert!(is_structural_page("https://example.fr/contact"));
        assert!(is_structural_page("https://example.fr/Contact/"));
        assert!(is_structural_page("https://example.fr/mentions-legales/cookies"));
        assert!(!is_structural_page("https://example.fr/contacts-presse"));
        assert!(!is_structural_page("https://example.fr"));
    }

    #[test]
    fn test_blog_and_feed_flags() {
        let html = r#"<head><link rel="alternate" type="application/rss+xml" href="/feed"></head>
            <body><time datetime="2024-03-01">1 mars</time></body>"#;
        let record = page(html, "https://example.fr/blog/salon");
        assert!(record.is_blog_page);
        assert!(record.has_feed);
        assert_eq!(record.dates.len(), 1);
    }
}
