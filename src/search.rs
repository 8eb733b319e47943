//! Keyword search: feed first, scraping as the fallback.
//!
//! The feed is cheaper and more stable, so it always goes first; the scrape
//! path only runs when the feed produced nothing at all. Each call to
//! [`NewsSearcher::search`] is one self-contained future with its own
//! [`Fetcher`] and pacer. Dropping it cancels every in-flight request, and
//! [`NewsSearcher::search_with_deadline`] does exactly that on a timer.

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::fetcher::{Fetcher, Transport};
use crate::models::SearchResult;
use crate::scrapers::{feed, scrape};
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Results returned when the caller does not ask for a specific number.
pub const DEFAULT_LIMIT: usize = 10;

/// Which discovery path produced a search's results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPath {
    Feed,
    Scrape,
}

pub struct NewsSearcher<T> {
    transport: T,
    config: SearchConfig,
}

impl<T: Transport> NewsSearcher<T> {
    pub fn new(transport: T, config: SearchConfig) -> Self {
        Self { transport, config }
    }

    /// Search news for `keyword`, returning at most `limit` results.
    ///
    /// A blank keyword is rejected before any request is made. An empty list
    /// is a valid outcome meaning nothing was found.
    #[instrument(level = "info", skip(self))]
    pub async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(SearchError::EmptyKeyword);
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        let t0 = Instant::now();
        let fetcher = Fetcher::new(&self.transport, &self.config);

        let mut path = SearchPath::Feed;
        let mut results = feed::search_feed(&fetcher, keyword, limit).await;
        if results.is_empty() {
            info!("Feed produced nothing; falling back to scraping");
            path = SearchPath::Scrape;
            results = scrape::search_scrape(&fetcher, keyword, limit).await;
        }
        results.truncate(limit);

        let with_content = results.iter().filter(|r| !r.content.is_empty()).count();
        info!(
            ?path,
            count = results.len(),
            with_content,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Search finished"
        );
        Ok(results)
    }

    /// [`Self::search`], abandoned with [`SearchError::DeadlineExceeded`] after `deadline`.
    pub async fn search_with_deadline(
        &self,
        keyword: &str,
        limit: usize,
        deadline: Duration,
    ) -> Result<Vec<SearchResult>, SearchError> {
        match tokio::time::timeout(deadline, self.search(keyword, limit)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(deadline_ms = deadline.as_millis() as u64, "Search deadline exceeded");
                Err(SearchError::DeadlineExceeded {
                    deadline_ms: deadline.as_millis() as u64,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::ScriptedTransport;
    use crate::models::{CONTENT_MAX_CHARS, SNIPPET_MAX_CHARS};
    use crate::scrapers::feed::feed_url;
    use crate::scrapers::scrape::{news_search_url, web_search_url};
    use std::collections::HashSet;

    fn config() -> SearchConfig {
        SearchConfig {
            request_interval_ms: 0,
            ..SearchConfig::default()
        }
    }

    fn feed_with(items: &[(&str, &str)]) -> String {
        let items: String = items
            .iter()
            .map(|(title, link)| {
                format!(
                    "<item><title>{title}</title><link>{link}</link><description>{title} 요약</description></item>"
                )
            })
            .collect();
        format!("<rss><channel>{items}</channel></rss>")
    }

    fn article_page(body: &str) -> String {
        format!(
            r#"<html><body><nav>메뉴</nav><article><h1>제목</h1><div class="article-body">{body}</div></article></body></html>"#
        )
    }

    fn assert_result_invariants(results: &[SearchResult], config: &SearchConfig) {
        let mut seen = HashSet::new();
        for r in results {
            assert!(!r.title.is_empty());
            let url = url::Url::parse(&r.link).expect("absolute link");
            assert!(!config.is_provider_host(url.host_str().unwrap()));
            assert!(seen.insert(r.link.clone()), "duplicate link {}", r.link);
            assert!(r.content.chars().count() <= CONTENT_MAX_CHARS);
            assert!(r.snippet.chars().count() <= SNIPPET_MAX_CHARS);
        }
    }

    #[tokio::test]
    async fn test_feed_path_end_to_end() {
        let config = config();
        let keyword = "인공지능";
        let transport = ScriptedTransport::new()
            .page(
                &feed_url(&config, keyword),
                &feed_with(&[
                    ("AI 반도체 투자 확대", "https://www.hani.co.kr/arti/101.html"),
                    ("생성형 AI 규제 논의", "https://www.yna.co.kr/view/AKR202"),
                    ("인공지능 인재 양성", "https://www.chosun.com/303"),
                ]),
            )
            .page("https://www.hani.co.kr/arti/101.html", &article_page("반도체 본문"))
            .page("https://www.yna.co.kr/view/AKR202", &article_page("규제 본문"))
            .page("https://www.chosun.com/303", &article_page("인재 본문"));
        let searcher = NewsSearcher::new(transport, config.clone());

        let results = searcher.search(keyword, DEFAULT_LIMIT).await.unwrap();

        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["AI 반도체 투자 확대", "생성형 AI 규제 논의", "인공지능 인재 양성"]
        );
        assert_eq!(results[0].content, "반도체 본문");
        assert_eq!(results[1].content, "규제 본문");
        assert_eq!(results[2].content, "인재 본문");
        assert_eq!(results[0].snippet, "AI 반도체 투자 확대 요약");
        assert_result_invariants(&results, &config);
    }

    #[tokio::test]
    async fn test_feed_success_never_touches_scrape_pages() {
        let config = config();
        let transport = ScriptedTransport::new().page(
            &feed_url(&config, "경제"),
            &feed_with(&[("경제 성장률 발표", "https://www.mk.co.kr/news/1")]),
        );
        let searcher = NewsSearcher::new(transport, config.clone());

        let results = searcher.search("경제", 10).await.unwrap();
        assert_eq!(results.len(), 1);

        let transport = &searcher.transport;
        assert_eq!(transport.calls_starting_with(&config.news_search_url), 0);
        assert_eq!(transport.calls_starting_with(&config.web_search_url), 0);
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_scrape_fallback_end_to_end() {
        let config = config();
        let keyword = "기후";
        let containers = [
            ("https%3A%2F%2Fwww.hani.co.kr%2Farti%2F1.html", "한겨레 기후 위기 기사"),
            ("https://www.yna.co.kr/view/AKR2", "연합뉴스 기후 속보"),
            ("https://www.hani.co.kr/arti/1.html", "한겨레 같은 기사 재게시"),
            ("https://www.khan.co.kr/env/4", "경향신문 환경 기사"),
            ("https://www.donga.com/news/5", "동아일보 폭염 기사"),
        ]
        .iter()
        .map(|(target, title)| {
            format!(
                r#"<div class="MjjYud"><a href="/url?q={target}&amp;sa=U&amp;ved=x"><h3>{title}</h3></a><div class="VwiC3b">{title} 요약</div></div>"#
            )
        })
        .collect::<String>();

        let transport = ScriptedTransport::new()
            .page(&feed_url(&config, keyword), "<rss><channel></channel></rss>")
            .page(
                &web_search_url(&config, keyword, 4),
                &format!("<html><body>{containers}</body></html>"),
            )
            .page("https://www.hani.co.kr/arti/1.html", &article_page("한겨레 본문"))
            .page("https://www.yna.co.kr/view/AKR2", &article_page("연합 본문"))
            .page("https://www.khan.co.kr/env/4", &article_page("경향 본문"))
            .page("https://www.donga.com/news/5", &article_page("동아 본문"));
        let searcher = NewsSearcher::new(transport, config.clone());

        let results = searcher.search(keyword, 4).await.unwrap();

        let links: Vec<&str> = results.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://www.hani.co.kr/arti/1.html",
                "https://www.yna.co.kr/view/AKR2",
                "https://www.khan.co.kr/env/4",
                "https://www.donga.com/news/5",
            ]
        );
        assert_eq!(results[3].content, "동아 본문");
        assert_result_invariants(&results, &config);
        assert_eq!(
            searcher
                .transport
                .calls_starting_with(&news_search_url(&config, keyword)),
            1
        );
    }

    #[tokio::test]
    async fn test_unresolved_provider_pointers_never_reach_results() {
        let config = config();
        let keyword = "인공지능";
        let transport = ScriptedTransport::new()
            .page(
                &feed_url(&config, keyword),
                &feed_with(&[
                    ("구글 포인터 기사", "https://news.google.com/rss/articles/CBMi123"),
                    ("리다이렉트 된 기사", "https://news.google.com/rss/articles/CBMi456"),
                    ("직접 링크 기사", "https://www.yna.co.kr/view/AKR7"),
                ]),
            )
            .redirect(
                "https://news.google.com/rss/articles/CBMi456",
                "https://www.hani.co.kr/arti/456.html",
                &article_page("리다이렉트 본문"),
            )
            .page("https://www.yna.co.kr/view/AKR7", &article_page("연합 본문"));
        let searcher = NewsSearcher::new(transport, config.clone());

        let results = searcher.search(keyword, 10).await.unwrap();

        let links: Vec<&str> = results.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(
            links,
            vec!["https://www.hani.co.kr/arti/456.html", "https://www.yna.co.kr/view/AKR7"]
        );
        assert_result_invariants(&results, &config);
    }

    #[tokio::test]
    async fn test_limit_caps_results() {
        let config = config();
        let items: Vec<(String, String)> = (0..8)
            .map(|i| (format!("기사 제목 {i}"), format!("https://news{i}.example.com/a")))
            .collect();
        let refs: Vec<(&str, &str)> = items.iter().map(|(t, l)| (t.as_str(), l.as_str())).collect();
        let transport = ScriptedTransport::new().page(&feed_url(&config, "뉴스"), &feed_with(&refs));
        let searcher = NewsSearcher::new(transport, config);

        for limit in [1, 3, 8, 20] {
            let results = searcher.search("뉴스", limit).await.unwrap();
            assert_eq!(results.len(), limit.min(8));
        }
        assert!(searcher.search("뉴스", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_keyword_is_rejected_without_requests() {
        let searcher = NewsSearcher::new(ScriptedTransport::new(), config());
        assert_eq!(
            searcher.search("   ", 10).await,
            Err(SearchError::EmptyKeyword)
        );
        assert_eq!(searcher.search("", 10).await, Err(SearchError::EmptyKeyword));
        assert!(searcher.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_nothing_found_is_an_empty_list() {
        let searcher = NewsSearcher::new(ScriptedTransport::new(), config());
        assert_eq!(searcher.search("아무것도", 10).await, Ok(Vec::new()));
        assert_eq!(searcher.transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_keyword_is_trimmed_before_querying() {
        let config = config();
        let searcher = NewsSearcher::new(ScriptedTransport::new(), config.clone());
        let _ = searcher.search("  반도체 ", 10).await;
        assert_eq!(
            searcher.transport.calls()[0],
            feed_url(&config, "반도체")
        );
    }

    #[tokio::test]
    async fn test_deadline_abandons_slow_search() {
        let config = SearchConfig {
            request_interval_ms: 60_000,
            ..SearchConfig::default()
        };
        let transport = ScriptedTransport::new().page(
            &feed_url(&config, "반도체"),
            &feed_with(&[("반도체 기사 하나", "https://a.example.com/1")]),
        );
        let searcher = NewsSearcher::new(transport, config);

        let outcome = searcher
            .search_with_deadline("반도체", 10, Duration::from_millis(100))
            .await;
        assert_eq!(outcome, Err(SearchError::DeadlineExceeded { deadline_ms: 100 }));
        assert_eq!(searcher.transport.calls().len(), 1);
    }
}
