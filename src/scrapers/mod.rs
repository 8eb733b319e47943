//! Keyword searchers and the machinery they share.
//!
//! Each searcher follows the same two-phase pattern:
//!
//! 1. **Discovery**: turn a provider document into an ordered list of
//!    [`Candidate`]s (title, link, snippet), at most `limit` of them, with
//!    unique links.
//! 2. **Enrichment**: fetch every candidate's page and run the extractor on
//!    it ([`enrich`]).
//!
//! # Searchers
//!
//! | Path | Module | Method |
//! |------|--------|--------|
//! | Feed | [`feed`] | Tolerant regex parse of the RSS search feed |
//! | Scrape | [`scrape`] | Three HTML heuristics over the search pages |
//!
//! Searchers discover up to [`discovery_cap`] candidates so that enrichment
//! can backfill results it drops. Enrichment runs on a bounded pool that
//! keeps discovery order, and every request goes through the search's shared
//! [`Fetcher`] pacer. A failed fetch leaves a publisher result with empty
//! content instead of dropping it; a provider pointer that never resolves to
//! a publisher is dropped.

pub mod feed;
pub mod scrape;

use crate::config::SearchConfig;
use crate::error::ParseError;
use crate::extractor::{Strategy, extract_detailed};
use crate::fetcher::{Fetcher, Transport};
use crate::models::{SNIPPET_MAX_CHARS, SearchResult};
use crate::utils::{clean_text, truncate_chars};
use futures::future;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Titles shorter than this are navigation chrome, not headlines.
pub const MIN_TITLE_CHARS: usize = 4;

/// A discovered `(title, link)` pair waiting for its body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

impl Candidate {
    /// Normalizes whitespace and bounds the snippet.
    pub fn new(title: &str, link: &str, snippet: &str) -> Self {
        let snippet = clean_text(snippet);
        Self {
            title: clean_text(title),
            link: link.trim().to_string(),
            snippet: truncate_chars(&snippet, SNIPPET_MAX_CHARS).trim_end().to_string(),
        }
    }
}

/// Collects candidates up to `limit`, skipping repeated links.
#[derive(Debug)]
pub(crate) struct CandidateList {
    limit: usize,
    items: Vec<Candidate>,
}

impl CandidateList {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            limit,
            items: Vec::with_capacity(limit),
        }
    }

    pub(crate) fn is_full(&self) -> bool {
        self.items.len() >= self.limit
    }

    /// Returns `false` when the link was already collected or the list is full.
    pub(crate) fn push(&mut self, candidate: Candidate) -> bool {
        if self.is_full() || self.items.iter().any(|c| c.link == candidate.link) {
            return false;
        }
        self.items.push(candidate);
        true
    }

    pub(crate) fn into_vec(self) -> Vec<Candidate> {
        self.items
    }
}

/// Destination of a search-result href.
///
/// Accepts direct absolute links and the provider's redirect form
/// (`/url?q=<percent-encoded target>&...`), which is unwrapped. The
/// destination must be `http(s)` and must not live on the provider's domain.
pub fn resolve_destination(href: &str, config: &SearchConfig) -> Result<String, ParseError> {
    let href = href.trim();
    if href.is_empty() {
        return Err(ParseError::MissingLink);
    }

    let parsed = match Url::parse(href) {
        Ok(url) => url,
        Err(_) => Url::parse(&config.web_search_url)
            .and_then(|base| base.join(href))
            .map_err(|_| ParseError::RelativeLink(href.to_string()))?,
    };

    let on_provider = parsed.host_str().is_some_and(|h| config.is_provider_host(h));
    let target = if on_provider && parsed.path() == "/url" {
        let embedded = parsed
            .query_pairs()
            .find(|(key, _)| key == "q" || key == "url")
            .map(|(_, value)| value.into_owned())
            .ok_or(ParseError::MissingLink)?;
        Url::parse(&embedded).map_err(|_| ParseError::RelativeLink(embedded.clone()))?
    } else {
        parsed
    };

    if !matches!(target.scheme(), "http" | "https") {
        return Err(ParseError::RelativeLink(target.to_string()));
    }
    match target.host_str() {
        Some(host) if !config.is_provider_host(host) => Ok(target.to_string()),
        _ => Err(ParseError::ProviderLink(target.to_string())),
    }
}

/// Candidates discovered per requested result, so results dropped during
/// enrichment can be backfilled.
const DISCOVERY_FACTOR: usize = 2;

/// How many candidates a searcher should discover for `limit` results.
pub fn discovery_cap(limit: usize) -> usize {
    limit.saturating_mul(DISCOVERY_FACTOR)
}

/// Absolute `http(s)` URL on a host outside the provider's domains.
fn is_publisher_url(config: &SearchConfig, link: &str) -> bool {
    Url::parse(link).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https")
            && url.host_str().is_some_and(|h| !config.is_provider_host(h))
    })
}

/// The link a result should carry once its page has been fetched.
///
/// Provider links are redirect pointers; when following them lands on a
/// publisher's site, the publisher URL replaces the pointer. `None` when
/// neither URL is a publisher URL.
fn settle_link(config: &SearchConfig, original: &str, final_url: &str) -> Option<String> {
    [final_url, original]
        .into_iter()
        .find(|link| is_publisher_url(config, link))
        .map(str::to_string)
}

/// Fetch one candidate and extract its body.
///
/// A failed fetch keeps the candidate without content; a link that never
/// leaves the provider drops it.
async fn enrich_one<T: Transport>(
    fetcher: &Fetcher<'_, T>,
    candidate: Candidate,
) -> (Option<SearchResult>, Option<Strategy>) {
    let config = fetcher.config();
    match fetcher.page(&candidate.link).await {
        Ok(page) => {
            let Some(link) = settle_link(config, &candidate.link, &page.url) else {
                warn!(url = %candidate.link, final_url = %page.url, "Link never left the provider; dropping result");
                return (None, None);
            };
            let extraction = extract_detailed(&page.body);
            debug!(%link, chars = extraction.content.chars().count(), "Extracted article");
            let result = SearchResult {
                title: candidate.title,
                link,
                snippet: candidate.snippet,
                content: extraction.content,
            };
            (Some(result), extraction.strategy)
        }
        Err(e) if is_publisher_url(config, &candidate.link) => {
            warn!(url = %candidate.link, error = %e, "Article fetch failed; keeping result without content");
            let result = SearchResult {
                title: candidate.title,
                link: candidate.link,
                snippet: candidate.snippet,
                content: String::new(),
            };
            (Some(result), None)
        }
        Err(e) => {
            warn!(url = %candidate.link, error = %e, "Provider link could not be resolved; dropping result");
            (None, None)
        }
    }
}

/// Fetch and extract the body of candidates, in order, until `limit`
/// results are collected.
///
/// Results whose links converge on the same article after redirects are
/// collapsed to the first one, and later candidates fill the gap. Once
/// `limit` results are in, fetches still in flight are dropped.
#[instrument(level = "info", skip_all, fields(candidates = candidates.len(), limit = limit))]
pub async fn enrich<T: Transport>(
    fetcher: &Fetcher<'_, T>,
    candidates: Vec<Candidate>,
    limit: usize,
) -> Vec<SearchResult> {
    let width = fetcher.config().concurrency.max(1);
    let mut seen = HashSet::new();
    let mut hits = Vec::new();

    let results: Vec<SearchResult> = stream::iter(candidates)
        .map(|candidate| enrich_one(fetcher, candidate))
        .buffered(width)
        .filter_map(|(result, strategy)| {
            hits.push(strategy.map_or("none", Strategy::name));
            let kept = result.filter(|r| {
                let first = seen.insert(r.link.clone());
                if !first {
                    debug!(link = %r.link, "Skipping repeated article");
                }
                first
            });
            future::ready(kept)
        })
        .take(limit)
        .collect()
        .await;

    info!(hits = ?hits.into_iter().counts(), kept = results.len(), "Extraction cascade hits");
    results
}
