//! Paced HTTP retrieval.
//!
//! The [`Transport`] trait is the seam between the pipeline and the network:
//! [`HttpTransport`] is the real `reqwest` client, and tests substitute a
//! scripted transport that records every URL it was asked for.
//!
//! A [`Fetcher`] wraps a transport for the duration of one search. All of its
//! requests share one [`Pacer`], so concurrent body fetches still leave the
//! provider at a steady cadence instead of in bursts.

use crate::config::SearchConfig;
use crate::error::FetchError;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// A retrieved document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// URL after all redirects were followed.
    pub url: String,
    pub body: String,
}

/// Something that can GET a URL.
///
/// Implementations follow redirects, report the final URL, and fail with
/// [`FetchError`] on timeout or any non-2xx status.
pub trait Transport {
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
        referer: Option<&str>,
    ) -> Result<Page, FetchError>;
}

/// `reqwest`-backed transport with browser-like default headers.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &SearchConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        for (name, value) in [
            (USER_AGENT, &config.user_agent),
            (ACCEPT_LANGUAGE, &config.accept_language),
        ] {
            match HeaderValue::from_str(value) {
                Ok(v) => {
                    headers.insert(name, v);
                }
                Err(e) => warn!(header = %name, error = %e, "Ignoring invalid header value"),
            }
        }

        let client = Client::builder()
            .default_headers(headers)
            .redirect(Policy::limited(10))
            .timeout(config.search_page_timeout())
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    #[instrument(level = "debug", skip(self), fields(timeout_ms = timeout.as_millis() as u64))]
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
        referer: Option<&str>,
    ) -> Result<Page, FetchError> {
        let mut request = self.client.get(url).timeout(timeout);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = request.send().await.map_err(|e| classify(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| classify(url, e))?;
        debug!(%final_url, bytes = body.len(), "Fetched page");
        Ok(Page {
            url: final_url,
            body,
        })
    }
}

fn classify(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

/// Token bucket spacing the requests of one search.
///
/// A zero interval disables pacing.
pub struct Pacer {
    limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            limiter: Quota::with_period(interval).map(RateLimiter::direct),
        }
    }

    /// Wait for the next slot.
    pub async fn ready(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

/// Per-search view of a transport: paced, with the right timeout per kind of page.
pub struct Fetcher<'a, T> {
    transport: &'a T,
    config: &'a SearchConfig,
    pacer: Pacer,
}

impl<'a, T: Transport> Fetcher<'a, T> {
    pub fn new(transport: &'a T, config: &'a SearchConfig) -> Self {
        Self {
            transport,
            config,
            pacer: Pacer::new(config.request_interval()),
        }
    }

    /// Feed documents and article pages.
    pub async fn page(&self, url: &str) -> Result<Page, FetchError> {
        self.pacer.ready().await;
        self.transport
            .get(url, self.config.fetch_timeout(), None)
            .await
    }

    /// HTML search-result pages, which get a longer timeout and a `Referer`.
    pub async fn search_page(&self, url: &str) -> Result<Page, FetchError> {
        self.pacer.ready().await;
        self.transport
            .get(
                url,
                self.config.search_page_timeout(),
                Some(&self.config.referer),
            )
            .await
    }

    pub fn config(&self) -> &SearchConfig {
        self.config
    }
}
