//! Error taxonomy for the search pipeline and its collaborators.
//!
//! Only [`SearchError`] ever reaches the caller of a search. [`FetchError`]
//! and [`ParseError`] are recovered where they happen: the candidate or
//! source that produced them is skipped and the batch carries on.

use thiserror::Error;

/// Failures surfaced to the caller of [`crate::search::NewsSearcher::search`].
///
/// An empty result list is *not* an error; it is the "no matches" outcome.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    /// The keyword was empty or whitespace only.
    #[error("keyword must not be blank")]
    EmptyKeyword,

    /// The search did not finish before its deadline and was abandoned.
    #[error("search abandoned after {deadline_ms}ms")]
    DeadlineExceeded {
        /// The deadline that was exceeded, in milliseconds.
        deadline_ms: u64,
    },
}

/// A single HTTP retrieval failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request did not complete within its timeout.
    #[error("timed out fetching {url}")]
    Timeout { url: String },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Connection, TLS, redirect or body-decoding failure.
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

/// A markup fragment could not be turned into a candidate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no usable link in fragment")]
    MissingLink,

    #[error("no usable title in fragment")]
    MissingTitle,

    #[error("link {0} is not an absolute http(s) URL")]
    RelativeLink(String),

    #[error("link {0} points at the search provider")]
    ProviderLink(String),
}

/// Follow-up questions against the last search.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("question must not be blank")]
    EmptyQuestion,

    #[error("no search results to talk about yet; run a search first")]
    NoActiveSearch,
}

/// Failures talking to the language model behind the summarizer.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("LLM returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM response had no choices")]
    EmptyResponse,
}

/// Loading the YAML configuration file failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
