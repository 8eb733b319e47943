//! Data models for search results and the state built on top of them.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SearchResult`]: One discovered article, enriched with extracted body text
//! - [`SearchSession`]: The last completed search, read by follow-up questions
//! - [`HistoryRecord`]: One entry of the append-only search history
//! - [`SearchReport`]: The machine-readable output of one run
//!
//! All text fields are plain `String`s. A field with nothing in it is the
//! empty string, never `null`, so the serialized shape is stable for consumers.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of characters kept in [`SearchResult::snippet`].
pub const SNIPPET_MAX_CHARS: usize = 200;

/// Maximum number of characters kept in [`SearchResult::content`].
pub const CONTENT_MAX_CHARS: usize = 2000;

/// A single news article discovered for a keyword.
///
/// Built by a searcher from a feed entry or a scraped candidate, then given
/// its `content` by the extractor. Nothing mutates it after that.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct SearchResult {
    /// The article headline.
    pub title: String,
    /// Absolute URL of the article.
    pub link: String,
    /// Short description supplied by the provider, at most 200 characters.
    pub snippet: String,
    /// Extracted body text, at most 2000 characters.
    pub content: String,
}

impl SearchResult {
    /// Host part of [`Self::link`], used for compact log lines.
    pub fn source_host(&self) -> Option<String> {
        url::Url::parse(&self.link)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }

    /// Body text if present, otherwise the snippet.
    pub fn body_or_snippet(&self) -> &str {
        if self.content.is_empty() {
            &self.snippet
        } else {
            &self.content
        }
    }
}

/// The most recent completed search.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct SearchSession {
    pub keyword: String,
    pub results: Vec<SearchResult>,
    pub summary: String,
}

/// One entry of the search history file.
///
/// The history is a JSON array of these, appended to after every search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistoryRecord {
    pub keyword: String,
    pub summary: String,
    pub news: Vec<SearchResult>,
    /// UTC timestamp in RFC 3339 form with a trailing `Z`.
    pub timestamp: String,
}

impl HistoryRecord {
    /// Build a record stamped with the current UTC time.
    pub fn now(session: &SearchSession) -> Self {
        Self {
            keyword: session.keyword.clone(),
            summary: session.summary.clone(),
            news: session.results.clone(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

/// Everything one run produced, printed with `--json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchReport {
    pub keyword: String,
    pub count: usize,
    pub summary: String,
    pub news: Vec<SearchResult>,
    /// `(question, answer)` pairs for each follow-up asked in this run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub answers: Vec<FollowUp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FollowUp {
    pub question: String,
    pub answer: String,
}

impl SearchReport {
    pub fn new(session: &SearchSession) -> Self {
        Self {
            keyword: session.keyword.clone(),
            count: session.results.len(),
            summary: session.summary.clone(),
            news: session.results.clone(),
            answers: Vec::new(),
        }
    }
}
