//! HTML scraping of the provider's search pages, the degraded discovery path.
//!
//! Used only when the feed yields nothing. Three strategies run in order and
//! each one only when everything before it came up empty:
//!
//! | Strategy | Page | Looks for |
//! |----------|------|-----------|
//! | [`ScrapeStrategy::ArticleCards`] | news search | `<article>` cards with a link and heading |
//! | [`ScrapeStrategy::ResultContainers`] | generic search | known result container classes |
//! | [`ScrapeStrategy::LinkScan`] | generic search | every link that unwraps to a publisher |
//!
//! The class names below track the provider's current markup and go stale
//! without warning; a stale name just means fewer candidates.

use super::{Candidate, CandidateList, MIN_TITLE_CHARS, discovery_cap, enrich, resolve_destination};
use crate::config::SearchConfig;
use crate::error::ParseError;
use crate::extractor::visible_text;
use crate::fetcher::{Fetcher, Transport};
use crate::models::SearchResult;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use tracing::{debug, info, instrument, warn};

static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static H2: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static H3: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").unwrap());
static H4: Lazy<Selector> = Lazy::new(|| Selector::parse("h4").unwrap());
static ROLE_HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"a[role="heading"]"#).unwrap());
static RESULT_CONTAINER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.MjjYud, div.g, div.SoaBEf, div.Ww4FFb").unwrap());

static CARD_SNIPPETS: Lazy<Vec<Selector>> =
    Lazy::new(|| selectors(&["div.Y3v8qd", "div.GI74Re", "span.aCOpRe"]));
static RESULT_SNIPPETS: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&["div.VwiC3b", "div.Y3v8qd", "span.aCOpRe", "div.GI74Re", "div.s"])
});

fn selectors(list: &[&str]) -> Vec<Selector> {
    list.iter().map(|s| Selector::parse(s).unwrap()).collect()
}

/// Which scrape heuristic produced the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeStrategy {
    ArticleCards,
    ResultContainers,
    LinkScan,
}

impl fmt::Display for ScrapeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScrapeStrategy::ArticleCards => "article_cards",
            ScrapeStrategy::ResultContainers => "result_containers",
            ScrapeStrategy::LinkScan => "link_scan",
        })
    }
}

/// News search page URL for `keyword`.
pub fn news_search_url(config: &SearchConfig, keyword: &str) -> String {
    format!(
        "{}?q={}&hl={}&gl={}&ceid={}",
        config.news_search_url,
        urlencoding::encode(keyword),
        config.locale.hl,
        config.locale.gl,
        urlencoding::encode(&config.locale.ceid),
    )
}

/// Generic search page URL for `keyword`, restricted to news results.
pub fn web_search_url(config: &SearchConfig, keyword: &str, limit: usize) -> String {
    format!(
        "{}?q={}&tbm=nws&num={}&hl={}",
        config.web_search_url,
        urlencoding::encode(keyword),
        limit,
        config.locale.hl,
    )
}

/// Scrape the search pages for `keyword` and return up to `limit` enriched results.
///
/// A page that cannot be fetched counts as a strategy that found nothing, as
/// does a strategy whose candidates were all dropped during enrichment. When
/// all three strategies come up empty the result is an empty list.
#[instrument(level = "info", skip(fetcher))]
pub async fn search_scrape<T: Transport>(
    fetcher: &Fetcher<'_, T>,
    keyword: &str,
    limit: usize,
) -> Vec<SearchResult> {
    let config = fetcher.config();
    let cap = discovery_cap(limit);

    let news_url = news_search_url(config, keyword);
    match fetcher.search_page(&news_url).await {
        Ok(page) => {
            let candidates = article_candidates(&page.body, config, cap);
            let results = run_strategy(fetcher, ScrapeStrategy::ArticleCards, candidates, limit).await;
            if !results.is_empty() {
                return results;
            }
        }
        Err(e) => warn!(url = %news_url, error = %e, "News search page unavailable"),
    }

    let web_url = web_search_url(config, keyword, limit);
    let page = match fetcher.search_page(&web_url).await {
        Ok(page) => page,
        Err(e) => {
            warn!(url = %web_url, error = %e, "Generic search page unavailable");
            return Vec::new();
        }
    };
    for strategy in [ScrapeStrategy::ResultContainers, ScrapeStrategy::LinkScan] {
        let candidates = match strategy {
            ScrapeStrategy::ResultContainers => container_candidates(&page.body, config, cap),
            _ => link_scan_candidates(&page.body, config, cap),
        };
        let results = run_strategy(fetcher, strategy, candidates, limit).await;
        if !results.is_empty() {
            return results;
        }
    }

    info!("Every scrape strategy came up empty");
    Vec::new()
}

async fn run_strategy<T: Transport>(
    fetcher: &Fetcher<'_, T>,
    strategy: ScrapeStrategy,
    candidates: Vec<Candidate>,
    limit: usize,
) -> Vec<SearchResult> {
    if candidates.is_empty() {
        debug!(%strategy, "Strategy found no candidates");
        return Vec::new();
    }
    info!(%strategy, count = candidates.len(), "Scrape strategy produced candidates");
    debug!(links = ?candidates.iter().map(|c| &c.link).collect::<Vec<_>>(), "Scraped links");

    let results = enrich(fetcher, candidates, limit).await;
    if results.is_empty() {
        info!(%strategy, "Every candidate was dropped during enrichment");
    }
    results
}

/// `<article>` cards on the news search page.
pub fn article_candidates(html: &str, config: &SearchConfig, limit: usize) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    let mut list = CandidateList::new(limit);
    for card in document.select(&ARTICLE).take(limit.saturating_mul(2)) {
        if list.is_full() {
            break;
        }
        match article_card(card, config) {
            Ok(candidate) => {
                list.push(candidate);
            }
            Err(e) => debug!(reason = %e, "Skipping article card"),
        }
    }
    list.into_vec()
}

fn article_card(card: ElementRef<'_>, config: &SearchConfig) -> Result<Candidate, ParseError> {
    let anchor = card.select(&LINK).next().ok_or(ParseError::MissingLink)?;
    let href = anchor.value().attr("href").unwrap_or_default();
    let link = absolutize_card_href(href, &config.news_base_url)?;

    let heading = anchor
        .select(&H3)
        .next()
        .or_else(|| anchor.select(&H4).next())
        .or_else(|| card.select(&H3).next())
        .or_else(|| card.select(&H4).next());
    let title = visible_text(heading.unwrap_or(anchor));
    if title.chars().count() < MIN_TITLE_CHARS {
        return Err(ParseError::MissingTitle);
    }

    let snippet = first_text(card, &CARD_SNIPPETS);
    Ok(Candidate::new(&title, &link, &snippet))
}

/// `./path` becomes absolute on the news host; other hrefs must already be absolute.
fn absolutize_card_href(href: &str, base: &str) -> Result<String, ParseError> {
    if let Some(rest) = href.strip_prefix("./") {
        Ok(format!("{}/{}", base.trim_end_matches('/'), rest))
    } else if href.starts_with("http://") || href.starts_with("https://") {
        Ok(href.to_string())
    } else {
        Err(ParseError::RelativeLink(href.to_string()))
    }
}

/// Known result containers on the generic search page.
pub fn container_candidates(html: &str, config: &SearchConfig, limit: usize) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    let mut list = CandidateList::new(limit);
    for container in document.select(&RESULT_CONTAINER).take(limit.saturating_mul(3)) {
        if list.is_full() {
            break;
        }
        match result_container(container, config) {
            Ok(candidate) => {
                if !list.push(candidate) {
                    debug!("Skipping duplicate result");
                }
            }
            Err(e) => debug!(reason = %e, "Skipping result container"),
        }
    }
    list.into_vec()
}

fn result_container(container: ElementRef<'_>, config: &SearchConfig) -> Result<Candidate, ParseError> {
    let heading = [&*H3, &*H2, &*H4, &*ROLE_HEADING]
        .into_iter()
        .find_map(|selector| container.select(selector).next());

    let (title, anchor) = match heading {
        Some(heading) => {
            let anchor = enclosing_link(heading)
                .or_else(|| container.select(&LINK).next())
                .ok_or(ParseError::MissingLink)?;
            (visible_text(heading), anchor)
        }
        None => {
            let anchor = container
                .select(&LINK)
                .find(|a| visible_text(*a).chars().count() >= MIN_TITLE_CHARS)
                .ok_or(ParseError::MissingLink)?;
            (visible_text(anchor), anchor)
        }
    };
    if title.chars().count() < MIN_TITLE_CHARS {
        return Err(ParseError::MissingTitle);
    }

    let href = anchor.value().attr("href").unwrap_or_default();
    let link = resolve_destination(href, config)?;
    let snippet = first_text(container, &RESULT_SNIPPETS);
    Ok(Candidate::new(&title, &link, &snippet))
}

/// Every link on the generic search page, as a last resort.
pub fn link_scan_candidates(html: &str, config: &SearchConfig, limit: usize) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    let mut list = CandidateList::new(limit);
    for anchor in document.select(&LINK) {
        if list.is_full() {
            break;
        }
        let href = anchor.value().attr("href").unwrap_or_default();
        let Ok(link) = resolve_destination(href, config) else {
            continue;
        };
        let title = visible_text(anchor);
        if title.chars().count() < MIN_TITLE_CHARS {
            continue;
        }
        list.push(Candidate::new(&title, &link, ""));
    }
    list.into_vec()
}

/// The heading itself when it is a link, else its nearest `<a href>` ancestor.
fn enclosing_link(heading: ElementRef<'_>) -> Option<ElementRef<'_>> {
    std::iter::once(heading)
        .chain(heading.ancestors().filter_map(ElementRef::wrap))
        .find(|el| el.value().name() == "a" && el.value().attr("href").is_some())
}

/// Text of the first selector, in priority order, that matches inside `scope`.
fn first_text(scope: ElementRef<'_>, candidates: &[Selector]) -> String {
    candidates
        .iter()
        .find_map(|selector| scope.select(selector).next())
        .map(visible_text)
        .unwrap_or_default()
}
