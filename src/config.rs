//! Runtime configuration loaded from an optional YAML file.
//!
//! Every field has a default, so an absent file or a file that only sets a
//! couple of keys both work. The endpoints are configurable mostly so tests
//! and mirrors can point the pipeline somewhere other than the live provider.
//!
//! ```yaml
//! search:
//!   request_interval_ms: 500
//!   concurrency: 4
//!   locale: { hl: ko, gl: KR, ceid: "KR:ko" }
//! llm:
//!   api_base: http://localhost:1234/v1
//!   model: qwen2.5-7b-instruct
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    /// Summarizer backend; without it the local formatter is used.
    pub llm: Option<LlmConfig>,
    pub history_file: Option<PathBuf>,
}

/// Locale parameters appended to every provider query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Locale {
    pub hl: String,
    pub gl: String,
    pub ceid: String,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            hl: "ko".to_string(),
            gl: "KR".to_string(),
            ceid: "KR:ko".to_string(),
        }
    }
}

/// Knobs for the discovery pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Structured feed endpoint queried first.
    pub feed_url: String,
    /// HTML news search page used by the structured-article strategy.
    pub news_search_url: String,
    /// Base that `./relative` links on the news search page resolve against.
    pub news_base_url: String,
    /// Generic web search endpoint used by the last two scrape strategies.
    pub web_search_url: String,
    /// Hosts (and their subdomains) that never count as an article link.
    pub provider_domains: Vec<String>,
    pub locale: Locale,
    pub user_agent: String,
    pub accept_language: String,
    /// `Referer` sent with search-page requests.
    pub referer: String,
    pub fetch_timeout_secs: u64,
    pub search_page_timeout_secs: u64,
    /// Minimum spacing between two fetches of the same search.
    pub request_interval_ms: u64,
    /// Article bodies fetched at the same time.
    pub concurrency: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            feed_url: "https://news.google.com/rss/search".to_string(),
            news_search_url: "https://news.google.com/search".to_string(),
            news_base_url: "https://news.google.com".to_string(),
            web_search_url: "https://www.google.com/search".to_string(),
            provider_domains: vec!["google.com".to_string()],
            locale: Locale::default(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            accept_language: "ko-KR,ko;q=0.9".to_string(),
            referer: "https://www.google.com/".to_string(),
            fetch_timeout_secs: 10,
            search_page_timeout_secs: 15,
            request_interval_ms: 500,
            concurrency: 4,
        }
    }
}

impl SearchConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn search_page_timeout(&self) -> Duration {
        Duration::from_secs(self.search_page_timeout_secs)
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }

    /// True when `host` is one of the provider's domains or a subdomain of one.
    pub fn is_provider_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.provider_domains.iter().any(|domain| {
            let domain = domain.to_ascii_lowercase();
            host == domain || host.ends_with(&format!(".{domain}"))
        })
    }
}

/// An OpenAI-compatible chat-completions backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL up to and including the version segment, e.g. `.../v1`.
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub summary_max_tokens: u32,
    pub summary_temperature: f32,
    pub chat_max_tokens: u32,
    pub chat_temperature: f32,
    pub max_retries: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:1234/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            summary_max_tokens: 800,
            summary_temperature: 0.7,
            chat_max_tokens: 1024,
            chat_temperature: 0.8,
            max_retries: 3,
        }
    }
}

/// Load configuration from `path`, or defaults when no path is given.
#[instrument(level = "info")]
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let Some(path) = path else {
        info!("No config file given; using defaults");
        return Ok(AppConfig::default());
    };
    let shown = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: shown.clone(),
        source,
    })?;
    let config: AppConfig = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: shown.clone(),
        source,
    })?;
    info!(path = %shown, llm = config.llm.is_some(), "Loaded configuration");
    Ok(config)
}
