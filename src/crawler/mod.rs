//! Breadth-first audit of one website.
//!
//! [`SiteAuditor::audit`] owns a fresh [`CrawlState`] per site and runs the
//! sequence below:
//!
//! 1. probe `robots.txt` and `sitemap.xml` at the site root
//! 2. BFS from the root: dequeue, fetch, extract, expand, until the frontier
//!    is empty or the page budget is spent
//! 3. resolve the blog through the fallback chain (crawled page, discovered
//!    link, verified navigation link)
//! 4. hand the accumulated signals to [`aggregate::finalize`]
//!
//! Only HTML pages count against the budget. Transport and HTTP failures are
//! logged and skipped.

pub mod fetch;
pub mod links;

use crate::aggregate::{self, SiteSignals};
use crate::config::AuditConfig;
use crate::models::SiteAuditResult;
use crate::signals::{self, blog, blog::BlogEvidence, cms};
use crate::utils::{normalize_url, parse_site_url, site_key, site_root, truncate_for_log};
use chrono::NaiveDate;
use fetch::{FetchOutcome, PageFetcher};
use quick_xml::Reader;
use quick_xml::events::Event;
use scraper::Html;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Error recorded when the site address cannot be parsed.
pub const INVALID_URL: &str = "URL invalide";

/// Mutable state of one crawl. Never shared between sites.
#[derive(Debug, Default)]
pub struct CrawlState {
    visited: HashSet<String>,
    /// Every enqueued URL in discovery order, fetched or not.
    discovered: Vec<String>,
    frontier: VecDeque<(String, usize)>,
    signals: SiteSignals,
    nav_blog_candidate: Option<String>,
}

impl CrawlState {
    fn new(root: String) -> Self {
        let mut state = Self::default();
        state.enqueue(root, 0);
        state
    }

    /// Queue a URL unless it was already seen. Returns whether it was queued.
    fn enqueue(&mut self, url: String, depth: usize) -> bool {
        if !self.visited.insert(url.clone()) {
            return false;
        }
        self.discovered.push(url.clone());
        self.frontier.push_back((url, depth));
        true
    }

    pub fn pages_fetched(&self) -> usize {
        self.signals.pages_fetched
    }
}

/// Crawls sites through a [`PageFetcher`] and turns them into audit results.
#[derive(Debug, Clone)]
pub struct SiteAuditor<F> {
    fetcher: F,
    config: AuditConfig,
}

impl<F: PageFetcher> SiteAuditor<F> {
    pub fn new(fetcher: F, config: AuditConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Audit the site at `raw_url`; dates are aged against `today`.
    #[instrument(level = "info", skip_all, fields(site = %raw_url))]
    pub async fn audit(&self, raw_url: &str, today: NaiveDate) -> SiteAuditResult {
        let Some(start) = parse_site_url(raw_url) else {
            warn!("Unparseable site address");
            return SiteAuditResult::unreachable(INVALID_URL);
        };
        let root = site_root(&start);
        let site = site_key(&start);

        let has_robots_txt = self.probe_robots(&root).await;
        let has_sitemap = self.probe_sitemap(&root).await;
        debug!(has_robots_txt, has_sitemap, "Probed site root");

        let mut state = CrawlState::new(normalize_url(&start));
        state.signals.has_robots_txt = has_robots_txt;
        state.signals.has_sitemap = has_sitemap;

        self.crawl(&mut state, &site).await;

        if state.pages_fetched() == 0 {
            warn!(discovered = state.discovered.len(), "No page reachable");
            return aggregate::finalize(&state.signals, None, today);
        }

        let blog = self.resolve_blog(&state).await;
        let result = aggregate::finalize(&state.signals, blog.as_ref(), today);
        info!(
            pages = result.nb_pages,
            depth = result.profondeur_max,
            blog = %result.blog_status,
            activity = %result.activite_status,
            cms = result.cms_detecte.as_deref().unwrap_or("-"),
            "Site audited"
        );
        result
    }

    /// BFS loop. Stops on an empty frontier or a spent page budget.
    async fn crawl(&self, state: &mut CrawlState, site: &str) {
        let budget = self.config.max_pages;
        let delay = self.config.politeness_delay();

        while state.pages_fetched() < budget {
            let Some((url, depth)) = state.frontier.pop_front() else {
                break;
            };

            let body = match self.fetcher.fetch(&url).await {
                FetchOutcome::Html { body, .. } => body,
                FetchOutcome::NonHtml => {
                    debug!(%url, "Not HTML; skipped");
                    continue;
                }
                FetchOutcome::HttpError(status) => {
                    debug!(%url, status, "HTTP error; skipped");
                    continue;
                }
                FetchOutcome::NetworkError(reason) => {
                    debug!(%url, reason = %truncate_for_log(&reason, 200), "Unreachable; skipped");
                    continue;
                }
            };

            // The parsed document is not Send, so it is dropped before the next await.
            let new_links = {
                let document = Html::parse_document(&body);
                let record = signals::extract_page(&document, body.len(), &url, depth);
                state.signals.record(&record);

                if state.signals.cms.is_none() {
                    state.signals.cms = cms::detect_cms(&body).map(str::to_string);
                }

                let page_url = Url::parse(&url).ok();
                if state.nav_blog_candidate.is_none() {
                    state.nav_blog_candidate = page_url
                        .as_ref()
                        .and_then(|base| blog::find_nav_blog_link(&document, base));
                }

                match page_url {
                    Some(base) if state.pages_fetched() < budget => {
                        links::internal_links(&document, &base, site)
                    }
                    _ => Vec::new(),
                }
            };

            let queued = new_links
                .into_iter()
                .filter(|link| state.enqueue(link.clone(), depth + 1))
                .count();
            debug!(
                %url,
                depth,
                pages = state.pages_fetched(),
                queued,
                frontier = state.frontier.len(),
                "Page crawled"
            );

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Blog fallback chain; the first strategy that fires wins.
    async fn resolve_blog(&self, state: &CrawlState) -> Option<BlogEvidence> {
        if let Some(evidence) = blog::from_crawled_page(state.signals.first_blog_page.as_deref())
        {
            return Some(evidence);
        }
        if let Some(evidence) = blog::from_discovered_links(&state.discovered) {
            return Some(evidence);
        }

        let candidate = state.nav_blog_candidate.as_deref()?;
        match self.fetcher.fetch(candidate).await {
            FetchOutcome::Html { body, .. } => {
                let document = Html::parse_document(&body);
                let verified = blog::from_verified_nav_link(candidate, &document);
                if verified.is_none() {
                    debug!(%candidate, "Navigation blog link shows no articles; rejected");
                }
                verified
            }
            other => {
                debug!(%candidate, outcome = ?other, "Navigation blog link unreachable");
                None
            }
        }
    }

    async fn probe_robots(&self, root: &str) -> bool {
        self.fetcher
            .probe(&format!("{root}/robots.txt"))
            .await
            .is_some_and(|body| body.to_lowercase().contains("user-agent"))
    }

    async fn probe_sitemap(&self, root: &str) -> bool {
        self.fetcher
            .probe(&format!("{root}/sitemap.xml"))
            .await
            .is_some_and(|body| has_sitemap_root(&body))
    }
}

/// True when the first element of the XML document is `urlset` or `sitemapindex`.
pub fn has_sitemap_root(xml: &str) -> bool {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = e.local_name();
                return matches!(name.as_ref(), b"urlset" | b"sitemapindex");
            }
            Ok(Event::Eof) | Err(_) => return false,
            Ok(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlogSource, BlogStatus};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves pages from memory and records every fetched URL.
    #[derive(Default)]
    struct StubFetcher {
        pages: HashMap<String, String>,
        resources: HashMap<String, String>,
        non_html: HashSet<String>,
        fetched: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        fn resource(mut self, url: &str, body: &str) -> Self {
            self.resources.insert(url.to_string(), body.to_string());
            self
        }

        fn binary(mut self, url: &str) -> Self {
            self.non_html.insert(url.to_string());
            self
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    impl PageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> FetchOutcome {
            self.fetched.lock().unwrap().push(url.to_string());
            if self.non_html.contains(url) {
                return FetchOutcome::NonHtml;
            }
            match self.pages.get(url) {
                Some(body) => FetchOutcome::Html {
                    body: body.clone(),
                    headers: Default::default(),
                },
                None => FetchOutcome::HttpError(404),
            }
        }

        async fn probe(&self, url: &str) -> Option<String> {
            self.resources.get(url).cloned()
        }
    }

    fn config(max_pages: usize) -> AuditConfig {
        AuditConfig {
            max_pages,
            politeness_delay_ms: 0,
            ..AuditConfig::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn links_page(hrefs: &[&str]) -> String {
        let anchors: String = hrefs
            .iter()
            .map(|h| format!(r#"<a href="{h}">lien</a>"#))
            .collect();
        format!("<html><head><title>Page</title></head><body><main>{anchors}</main></body></html>")
    }

    #[tokio::test]
    async fn test_budget_caps_fetched_pages() {
        let mut fetcher = StubFetcher::default().page(
            "https://example.fr",
            &links_page(&["/p1", "/p2", "/p3", "/p4", "/p5"]),
        );
        for i in 1..=5 {
            fetcher = fetcher.page(&format!("https://example.fr/p{i}"), &links_page(&[]));
        }

        let auditor = SiteAuditor::new(fetcher, config(3));
        let result = auditor.audit("example.fr", today()).await;

        assert_eq!(result.nb_pages, 3);
        assert_eq!(result.profondeur_max, 1);
        assert_eq!(
            auditor.fetcher.fetched(),
            vec![
                "https://example.fr",
                "https://example.fr/p1",
                "https://example.fr/p2"
            ]
        );
    }

    #[tokio::test]
    async fn test_links_not_queued_once_budget_is_spent() {
        let fetcher = StubFetcher::default()
            .page("https://example.fr", &links_page(&["/a"]))
            .page("https://example.fr/a", &links_page(&["/blog"]))
            .page(
                "https://example.fr/blog",
                r#"<time datetime="2025-05-01"></time><time datetime="2025-05-10"></time>"#,
            );
        let auditor = SiteAuditor::new(fetcher, config(2));

        let mut state = CrawlState::new("https://example.fr".to_string());
        auditor.crawl(&mut state, "example.fr").await;
        assert_eq!(state.pages_fetched(), 2);
        assert_eq!(state.discovered, vec!["https://example.fr", "https://example.fr/a"]);
        assert!(state.frontier.is_empty());

        let result = auditor.audit("example.fr", today()).await;
        assert_eq!(result.nb_pages, 2);
        assert!(!result.has_blog);
        assert!(
            !auditor
                .fetcher
                .fetched()
                .contains(&"https://example.fr/blog".to_string())
        );
    }

    #[tokio::test]
    async fn test_each_url_fetched_once() {
        let fetcher = StubFetcher::default()
            .page("https://example.fr", &links_page(&["/a", "/b", "/a/", "/"]))
            .page("https://example.fr/a", &links_page(&["/b", "/", "/a#top"]))
            .page("https://example.fr/b", &links_page(&["/a", "https://www.example.fr/b"]))
            .page("https://www.example.fr/b", &links_page(&["/a"]));

        let auditor = SiteAuditor::new(fetcher, config(30));
        let result = auditor.audit("https://example.fr/", today()).await;

        let fetched = auditor.fetcher.fetched();
        let distinct: HashSet<_> = fetched.iter().collect();
        assert_eq!(fetched.len(), distinct.len());
        assert_eq!(result.nb_pages, 4);
        assert_eq!(result.profondeur_max, 2);
    }

    #[tokio::test]
    async fn test_external_links_not_followed() {
        let fetcher = StubFetcher::default().page(
            "https://example.fr",
            &links_page(&["https://autre-site.fr/blog", "https://example.fr.evil.com/x"]),
        );
        let auditor = SiteAuditor::new(fetcher, config(30));
        let result = auditor.audit("example.fr", today()).await;

        assert_eq!(result.nb_pages, 1);
        assert_eq!(auditor.fetcher.fetched(), vec!["https://example.fr"]);
        assert!(!result.has_blog);
    }

    #[tokio::test]
    async fn test_non_html_pages_do_not_count() {
        let fetcher = StubFetcher::default()
            .page("https://example.fr", &links_page(&["/flux", "/a"]))
            .binary("https://example.fr/flux")
            .page("https://example.fr/a", &links_page(&[]));

        let auditor = SiteAuditor::new(fetcher, config(2));
        let result = auditor.audit("example.fr", today()).await;

        assert_eq!(result.nb_pages, 2);
        assert_eq!(auditor.fetcher.fetched().len(), 3);
    }

    #[tokio::test]
    async fn test_zero_pages_reachable() {
        let fetcher = StubFetcher::default()
            .resource("https://example.fr/robots.txt", "User-agent: *")
            .resource(
                "https://example.fr/sitemap.xml",
                r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"/>"#,
            );
        let auditor = SiteAuditor::new(fetcher, config(30));
        let result = auditor.audit("example.fr", today()).await;

        assert_eq!(result.audit_erreur.as_deref(), Some(aggregate::NO_PAGE_REACHABLE));
        assert_eq!(result.nb_pages, 0);
        assert!(!result.has_robots_txt);
        assert!(!result.has_sitemap);
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let auditor = SiteAuditor::new(StubFetcher::default(), config(30));
        let result = auditor.audit("   ", today()).await;
        assert_eq!(result.audit_erreur.as_deref(), Some(INVALID_URL));
        assert!(auditor.fetcher.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_probes_and_cms() {
        let fetcher = StubFetcher::default()
            .page(
                "https://example.fr",
                r#"<html><head><link rel="stylesheet" href="/wp-content/themes/x.css"></head><body>Bonjour</body></html>"#,
            )
            .resource("https://example.fr/robots.txt", "User-Agent: *\nDisallow: /admin")
            .resource(
                "https://example.fr/sitemap.xml",
                r#"<?xml version="1.0"?><sitemapindex><sitemap><loc>https://example.fr/s1.xml</loc></sitemap></sitemapindex>"#,
            );
        let auditor = SiteAuditor::new(fetcher, config(30));
        let result = auditor.audit("example.fr", today()).await;

        assert!(result.has_robots_txt);
        assert!(result.has_sitemap);
        assert_eq!(result.cms_detecte.as_deref(), Some("WordPress"));
    }

    #[tokio::test]
    async fn test_soft_404_probes_rejected() {
        let fetcher = StubFetcher::default()
            .page("https://example.fr", &links_page(&[]))
            .resource("https://example.fr/robots.txt", "<html>Page introuvable</html>")
            .resource("https://example.fr/sitemap.xml", "<html><body>404</body></html>");
        let auditor = SiteAuditor::new(fetcher, config(30));
        let result = auditor.audit("example.fr", today()).await;

        assert!(!result.has_robots_txt);
        assert!(!result.has_sitemap);
    }

    #[tokio::test]
    async fn test_blog_found_on_crawled_page() {
        let fetcher = StubFetcher::default()
            .page("https://example.fr", &links_page(&["/blog"]))
            .page(
                "https://example.fr/blog",
                r#"<time datetime="2025-05-01"></time><time datetime="2025-05-10"></time>"#,
            );
        let auditor = SiteAuditor::new(fetcher, config(30));
        let result = auditor.audit("example.fr", today()).await;

        assert!(result.has_blog);
        assert_eq!(result.blog_url.as_deref(), Some("https://example.fr/blog"));
        assert_eq!(result.blog_source, Some(BlogSource::CrawledPage));
        assert_eq!(result.blog_status, BlogStatus::Active);
    }

    #[tokio::test]
    async fn test_blog_found_among_unfetched_links() {
        let fetcher = StubFetcher::default()
            .page("https://example.fr", &links_page(&["/a", "/actualites"]))
            .page("https://example.fr/a", &links_page(&[]));
        let auditor = SiteAuditor::new(fetcher, config(2));
        let result = auditor.audit("example.fr", today()).await;

        assert_eq!(result.nb_pages, 2);
        assert_eq!(result.blog_url.as_deref(), Some("https://example.fr/actualites"));
        assert_eq!(result.blog_source, Some(BlogSource::DiscoveredLink));
        assert_eq!(result.blog_status, BlogStatus::Present);
    }

    #[tokio::test]
    async fn test_nav_blog_rejected_without_articles() {
        let fetcher = StubFetcher::default()
            .page(
                "https://example.fr",
                r#"<nav><a href="https://conseils.example.org/">Actualités</a></nav><p>Accueil</p>"#,
            )
            .page(
                "https://conseils.example.org/",
                "<h1>Actualités</h1><p>Bientôt disponible</p>",
            );
        let auditor = SiteAuditor::new(fetcher, config(30));
        let result = auditor.audit("example.fr", today()).await;

        assert!(!result.has_blog);
        assert_eq!(result.blog_status, BlogStatus::Absent);
        assert!(
            auditor
                .fetcher
                .fetched()
                .contains(&"https://conseils.example.org/".to_string())
        );
    }

    #[tokio::test]
    async fn test_crawled_blog_path_wins_over_nav_verification() {
        let fetcher = StubFetcher::default()
            .page(
                "https://example.fr",
                r#"<nav><a href="/blog">Blog</a></nav><p>Accueil</p>"#,
            )
            .page(
                "https://example.fr/blog",
                "<h1>Blog</h1><p>Bientôt disponible</p>",
            );
        let auditor = SiteAuditor::new(fetcher, config(30));
        let result = auditor.audit("example.fr", today()).await;

        assert!(result.has_blog);
        assert_eq!(result.blog_url.as_deref(), Some("https://example.fr/blog"));
        assert_eq!(result.blog_source, Some(BlogSource::CrawledPage));
        assert_eq!(result.blog_status, BlogStatus::Present);
        assert_eq!(
            auditor.fetcher.fetched(),
            vec!["https://example.fr", "https://example.fr/blog"]
        );
    }

    #[tokio::test]
    async fn test_nav_blog_accepted_with_articles() {
        let fetcher = StubFetcher::default()
            .page(
                "https://example.fr",
                r#"<header><a href="https://conseils.example.org/">Le journal</a></header>"#,
            )
            .page(
                "https://conseils.example.org/",
                r#"<a href="/2024/03/salon">Salon</a><a href="/2024/05/gamme">Gamme</a>"#,
            );
        let auditor = SiteAuditor::new(fetcher, config(30));
        let result = auditor.audit("example.fr", today()).await;

        assert!(result.has_blog);
        assert_eq!(result.blog_source, Some(BlogSource::VerifiedNavLink));
        assert_eq!(result.blog_url.as_deref(), Some("https://conseils.example.org/"));
    }

    #[test]
    fn test_has_sitemap_root() {
        assert!(has_sitemap_root(
            r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"><url><loc>https://example.fr/</loc></url></urlset>"#
        ));
        assert!(has_sitemap_root(r#"<sm:urlset xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9"/>"#));
        assert!(!has_sitemap_root("<html><body>Not found</body></html>"));
        assert!(!has_sitemap_root("User-agent: *"));
        assert!(!has_sitemap_root(""));
    }
}
