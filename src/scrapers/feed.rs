//! RSS search feed, the preferred discovery path.
//!
//! The provider's feed is not reliably well-formed, so it is read with
//! tolerant patterns instead of an XML parser: `<item>` blocks first, then
//! `title`, `link` and `description` inside each block. Text fields are
//! unwrapped from CDATA, entity-decoded and stripped of inline markup.
//!
//! # URL Pattern
//!
//! `{feed_url}?q=<keyword>&hl=ko&gl=KR&ceid=KR:ko`

use super::{Candidate, CandidateList, discovery_cap, enrich};
use crate::config::SearchConfig;
use crate::error::ParseError;
use crate::fetcher::{Fetcher, Transport};
use crate::models::SearchResult;
use crate::utils::clean_text;
use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, instrument, warn};
use url::Url;

static ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<item\b[^>]*>(.*?)</item>").unwrap());
static TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<link\b[^>]*>(.*?)</link>").unwrap());
static DESCRIPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<description\b[^>]*>(.*?)</description>").unwrap());
static CDATA: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Feed query URL for `keyword`.
pub fn feed_url(config: &SearchConfig, keyword: &str) -> String {
    format!(
        "{}?q={}&hl={}&gl={}&ceid={}",
        config.feed_url,
        urlencoding::encode(keyword),
        config.locale.hl,
        config.locale.gl,
        urlencoding::encode(&config.locale.ceid),
    )
}

/// Parse up to `limit` entries from a feed document, in feed order.
///
/// Malformed entries are skipped; a document with no `<item>` yields nothing.
pub fn parse_feed(xml: &str, limit: usize) -> Vec<Candidate> {
    let mut list = CandidateList::new(limit);
    for block in ITEM.captures_iter(xml).filter_map(|c| c.get(1)) {
        if list.is_full() {
            break;
        }
        match parse_item(block.as_str()) {
            Ok(candidate) => {
                if !list.push(candidate) {
                    debug!("Skipping repeated feed entry");
                }
            }
            Err(e) => debug!(reason = %e, "Skipping feed entry"),
        }
    }
    list.into_vec()
}

fn parse_item(block: &str) -> Result<Candidate, ParseError> {
    let title = field(&TITLE, block).ok_or(ParseError::MissingTitle)?;
    let link = field(&LINK, block).ok_or(ParseError::MissingLink)?;
    let snippet = field(&DESCRIPTION, block).unwrap_or_default();

    let parsed = Url::parse(&link).map_err(|_| ParseError::RelativeLink(link.clone()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ParseError::RelativeLink(link));
    }
    Ok(Candidate::new(&title, &link, &snippet))
}

/// Text of the first match of `pattern` in `block`, or `None` when absent or blank.
fn field(pattern: &Regex, block: &str) -> Option<String> {
    let raw = pattern.captures(block)?.get(1)?.as_str();
    let text = plain_text(raw);
    (!text.is_empty()).then_some(text)
}

/// CDATA unwrapped, entities decoded, markup removed, whitespace collapsed.
///
/// Decoding runs on both sides of tag stripping because descriptions carry
/// escaped HTML (`&lt;a href=...&gt;`) whose own text holds entities.
fn plain_text(raw: &str) -> String {
    let unwrapped = CDATA.replace_all(raw, "$1");
    let decoded = decode_html_entities(&unwrapped);
    let stripped = TAG.replace_all(&decoded, " ");
    clean_text(&decode_html_entities(&stripped))
}

/// Search the feed for `keyword` and return up to `limit` enriched entries.
///
/// Never fails: an unreachable feed, a non-2xx answer or an unparseable
/// document all produce an empty list so the caller can fall back.
#[instrument(level = "info", skip(fetcher))]
pub async fn search_feed<T: Transport>(
    fetcher: &Fetcher<'_, T>,
    keyword: &str,
    limit: usize,
) -> Vec<SearchResult> {
    let url = feed_url(fetcher.config(), keyword);
    let page = match fetcher.page(&url).await {
        Ok(page) => page,
        Err(e) => {
            warn!(%url, error = %e, "Feed unavailable");
            return Vec::new();
        }
    };

    let candidates = parse_feed(&page.body, discovery_cap(limit));
    info!(count = candidates.len(), "Parsed feed entries");
    if candidates.is_empty() {
        return Vec::new();
    }
    enrich(fetcher, candidates, limit).await
}
