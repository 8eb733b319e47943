//! # News Digest
//!
//! Keyword news discovery, body extraction and digest. Finds articles for a
//! keyword through the provider's RSS search feed, falls back to scraping
//! its HTML search pages when the feed yields nothing, pulls readable body
//! text out of each article page, and summarizes the lot.
//!
//! ## Usage
//!
//! ```sh
//! news_digest 인공지능
//! news_digest 반도체 --ask "수출은 왜 늘었어?" --json
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Discovery**: RSS feed first, then three HTML scraping strategies
//! 2. **Extraction**: Fetch each article and run the body-extraction cascade
//!    (bounded concurrency, rate limited, order preserved)
//! 3. **Digest**: Summarize through an LLM or the local formatter
//! 4. **Follow-ups**: Answer questions against the last search
//! 5. **Output**: Append to the history file and print text or JSON

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod digest;
mod error;
mod extractor;
mod fetcher;
mod models;
mod outputs;
mod scrapers;
mod search;
mod session;
mod utils;

use api::{LlmClient, Summarizer};
use cli::Cli;
use fetcher::HttpTransport;
use models::{FollowUp, HistoryRecord, SearchReport, SearchSession};
use search::NewsSearcher;
use session::SessionSlot;
use utils::truncate_for_log;

const NOTHING_FOUND: &str = "뉴스를 찾을 수 없습니다. 다른 키워드로 시도해보세요.";

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_digest starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(keyword = %args.keyword, limit = args.limit, questions = args.ask.len(), "Parsed CLI arguments");

    let mut app_config = config::load_config(args.config.as_deref())?;
    if let (Some(llm), Some(key)) = (app_config.llm.as_mut(), args.api_key.clone()) {
        llm.api_key = Some(key);
    }
    let history_file = args.history_file.clone().or(app_config.history_file.clone());

    let summarizer = match &app_config.llm {
        Some(llm) => {
            info!(api_base = %llm.api_base, model = %llm.model, "Summarizing with LLM");
            Summarizer::with_llm(LlmClient::new(llm)?, llm)
        }
        None => {
            info!("No LLM configured; using local summaries");
            Summarizer::<LlmClient>::local()
        }
    };

    // ---- Search ----
    let transport = HttpTransport::new(&app_config.search)?;
    let searcher = NewsSearcher::new(transport, app_config.search.clone());
    let outcome = match args.deadline_secs {
        Some(secs) => {
            searcher
                .search_with_deadline(&args.keyword, args.limit, Duration::from_secs(secs))
                .await
        }
        None => searcher.search(&args.keyword, args.limit).await,
    };
    let results = match outcome {
        Ok(results) => results,
        Err(e) => {
            error!(error = %e, "Search failed");
            return Err(e.into());
        }
    };

    let slot = SessionSlot::new();
    if results.is_empty() {
        info!(keyword = %args.keyword, "No news found");
        println!("{NOTHING_FOUND}");
    } else {
        // ---- Digest ----
        let keyword = args.keyword.trim().to_string();
        let summary = summarizer.summarize(&results, &keyword).await;
        debug!(summary = %truncate_for_log(&summary, 300), "Summary ready");

        let session = SearchSession {
            keyword,
            results,
            summary,
        };

        if let Some(path) = &history_file {
            if let Err(e) = outputs::history::append_record(path, &HistoryRecord::now(&session)).await {
                warn!(path = %path.display(), error = %e, "Failed to write search history");
            }
        } else {
            debug!("No history file configured; skipping history");
        }
        slot.replace(session);
    }

    // ---- Follow-ups ----
    let current = slot.current();
    let mut answers = Vec::with_capacity(args.ask.len());
    for question in &args.ask {
        match summarizer.answer(question, current.as_ref()).await {
            Ok(answer) => answers.push(FollowUp {
                question: question.trim().to_string(),
                answer,
            }),
            Err(e) => {
                warn!(%question, error = %e, "Follow-up question rejected");
                eprintln!("{question}: {e}");
            }
        }
    }

    // ---- Output ----
    if let Some(session) = &current {
        if args.json {
            let mut report = SearchReport::new(session);
            report.answers = answers;
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{}", outputs::text::render(session, &answers));
        }
    }

    info!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "news_digest finished"
    );
    Ok(())
}
