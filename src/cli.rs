//! Command-line interface definitions for News Digest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Secrets and the history location can also come from environment variables.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the News Digest application.
///
/// # Examples
///
/// ```sh
/// # Search, summarize and print
/// news_digest 인공지능
///
/// # Five results as JSON, with two follow-up questions
/// news_digest 반도체 -n 5 --json --ask "수출은 왜 늘었어?" --ask "핵심만 알려줘"
///
/// # Summaries from a local model configured in YAML
/// news_digest 기후 -c ./config.yaml --history-file ./history.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Keyword to search news for
    pub keyword: String,

    /// Maximum number of articles to return
    #[arg(short = 'n', long, default_value_t = crate::search::DEFAULT_LIMIT)]
    pub limit: usize,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON file every completed search is appended to
    #[arg(long, env = "NEWS_DIGEST_HISTORY")]
    pub history_file: Option<PathBuf>,

    /// Follow-up question about the results (repeatable)
    #[arg(short, long = "ask")]
    pub ask: Vec<String>,

    /// Print the results, summary and answers as JSON
    #[arg(long)]
    pub json: bool,

    /// Give up on the search after this many seconds
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// API key for the summarizer's LLM endpoint
    #[arg(long, env = "NEWS_DIGEST_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}
