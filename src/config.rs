//! Audit configuration loaded from an optional YAML file.
//!
//! Every key is optional; anything missing falls back to the defaults
//! below. CLI flags override the file afterwards (see [`crate::cli::Cli`]).
//!
//! ```yaml
//! max_pages: 30
//! request_timeout_secs: 15
//! probe_timeout_secs: 10
//! politeness_delay_ms: 500
//! user_agent: "Mozilla/5.0 (compatible; SEOAuditBot/1.0)"
//! accept_language: "fr-FR,fr;q=0.9"
//! concurrency: 4
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};

/// Tunables for the crawler and the batch driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Page budget per site (successful HTML fetches).
    pub max_pages: usize,
    /// Timeout for each crawled page.
    pub request_timeout_secs: u64,
    /// Timeout for the robots.txt and sitemap.xml probes.
    pub probe_timeout_secs: u64,
    /// Pause after every successfully fetched page.
    pub politeness_delay_ms: u64,
    pub user_agent: String,
    pub accept_language: String,
    /// Number of companies audited at the same time.
    pub concurrency: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_pages: 30,
            request_timeout_secs: 15,
            probe_timeout_secs: 10,
            politeness_delay_ms: 500,
            user_agent: "Mozilla/5.0 (compatible; SEOAuditBot/1.0)".to_string(),
            accept_language: "fr-FR,fr;q=0.9".to_string(),
            concurrency: 4,
        }
    }
}

impl AuditConfig {
    /// Parse a YAML document, then validate it.
    pub fn from_yaml(yaml: &str) -> Result<Self, Box<dyn Error>> {
        let config: AuditConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration file at `path`.
    #[instrument(level = "info")]
    pub async fn load(path: &str) -> Result<Self, Box<dyn Error>> {
        let yaml = fs::read_to_string(path).await?;
        let config = Self::from_yaml(&yaml)?;
        info!(?config, "Loaded audit configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.max_pages == 0 {
            return Err("max_pages must be at least 1".into());
        }
        if self.concurrency == 0 {
            return Err("concurrency must be at least 1".into());
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }
}
