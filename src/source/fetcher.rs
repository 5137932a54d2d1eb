use reqwest::StatusCode;
use thiserror::Error;

use super::pacing::RequestPacer;
use super::rss::parse_document;
use super::{Entry, FeedSource};

/// Reasons a fetch produced nothing.  Never escapes the fetcher as an `Err`;
/// it travels inside [`FetchOutcome::Failed`] so callers can log it.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS, connect, TLS, proxy or timeout failure.
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Non-success status other than 429.
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// The body was not a readable RSS document.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Result of one fetch of one URL.
#[derive(Debug)]
pub enum FetchOutcome {
    Entries(Vec<Entry>),
    /// A valid document with no usable items.
    Empty,
    /// HTTP 429 just now, or the URL is still cooling down from one.
    RateLimited,
    Failed(FetchError),
}

impl FetchOutcome {
    /// The entries, or `None` for every outcome that yields nothing.
    pub fn into_entries(self) -> Option<Vec<Entry>> {
        match self {
            FetchOutcome::Entries(entries) if !entries.is_empty() => Some(entries),
            _ => None,
        }
    }
}

/// Fetches RSS documents over HTTP with per-URL pacing and 429 cool-downs.
pub struct Fetcher {
    client: reqwest::Client,
    pacer: RequestPacer,
}

impl Fetcher {
    pub fn new(client: reqwest::Client, pacer: RequestPacer) -> Self {
        Self { client, pacer }
    }

    async fn request(&mut self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Failed(FetchError::Network(e)),
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            self.pacer.cool_down(url);
            return FetchOutcome::RateLimited;
        }
        if !status.is_success() {
            return FetchOutcome::Failed(FetchError::HttpStatus(status.as_u16()));
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return FetchOutcome::Failed(FetchError::Network(e)),
        };

        match parse_document(body.as_ref()) {
            Ok(entries) if entries.is_empty() => FetchOutcome::Empty,
            Ok(entries) => FetchOutcome::Entries(entries),
            Err(e) => FetchOutcome::Failed(FetchError::Parse(e.to_string())),
        }
    }
}

impl FeedSource for Fetcher {
    async fn fetch(&mut self, url: &str) -> FetchOutcome {
        if let Some(remaining) = self.pacer.cooldown_remaining(url) {
            tracing::info!(
                url,
                remaining_secs = remaining.as_secs(),
                "Source is cooling down after a rate limit, skipping"
            );
            return FetchOutcome::RateLimited;
        }

        self.pacer.wait_turn(url).await;
        tracing::info!(url, "Fetching feed");

        let outcome = self.request(url).await;
        match &outcome {
            FetchOutcome::Entries(entries) => {
                tracing::info!(url, count = entries.len(), "Fetched feed entries");
            }
            FetchOutcome::Empty => tracing::warn!(url, "Feed returned no entries"),
            FetchOutcome::RateLimited => {
                tracing::warn!(url, "Rate limited by source, cooling down");
            }
            FetchOutcome::Failed(e) => tracing::warn!(url, error = %e, "Feed fetch failed"),
        }
        outcome
    }
}
