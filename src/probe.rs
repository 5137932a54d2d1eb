//! One-shot connectivity check over every configured source.
//!
//! Unlike [`Fetcher`](crate::source::Fetcher) this ignores pacing and
//! cool-downs: each URL gets exactly one request, and the report keeps the
//! detail the monitor folds away.

use std::fmt;
use std::time::{Duration, Instant};

use crate::source::parse_document;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// Parsed, with this many entries.
    Ok(usize),
    NoEntries,
    HttpStatus(u16),
    Parse,
    Network(String),
}

impl ProbeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeStatus::Ok(_))
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Ok(n) => write!(f, "ok: {n} entries"),
            ProbeStatus::NoEntries => write!(f, "ok, no entries"),
            ProbeStatus::HttpStatus(code) => write!(f, "status {code}"),
            ProbeStatus::Parse => write!(f, "not a feed"),
            ProbeStatus::Network(e) => write!(f, "error: {e}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub url: String,
    pub status: ProbeStatus,
    pub elapsed: Duration,
}

/// Request `url` once and classify the result.
pub async fn probe_source(client: &reqwest::Client, url: &str) -> ProbeReport {
    let start = Instant::now();
    let status = match client.get(url).send().await {
        Err(e) => ProbeStatus::Network(e.to_string()),
        Ok(resp) if !resp.status().is_success() => ProbeStatus::HttpStatus(resp.status().as_u16()),
        Ok(resp) => match resp.bytes().await {
            Err(e) => ProbeStatus::Network(e.to_string()),
            Ok(body) => match parse_document(body.as_ref()) {
                Ok(entries) if entries.is_empty() => ProbeStatus::NoEntries,
                Ok(entries) => ProbeStatus::Ok(entries.len()),
                Err(_) => ProbeStatus::Parse,
            },
        },
    };

    let report = ProbeReport {
        url: url.to_string(),
        status,
        elapsed: start.elapsed(),
    };
    tracing::info!(url, status = %report.status, elapsed_ms = report.elapsed.as_millis() as u64, "Probed source");
    report
}

/// Probe every URL in order, one at a time.
pub async fn probe_all<'a>(
    client: &reqwest::Client,
    urls: impl IntoIterator<Item = &'a str>,
) -> Vec<ProbeReport> {
    let mut reports = Vec::new();
    for url in urls {
        reports.push(probe_source(client, url).await);
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::path;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn classifies_each_kind_of_source() {
        let server = MockServer::start().await;
        Mock::given(path("/good"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<?xml version="1.0"?><rss version="2.0"><channel><title>t</title>
                <item><guid>a</guid></item><item><guid>b</guid></item></channel></rss>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(path("/empty"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<?xml version="1.0"?><rss version="2.0"><channel><title>t</title></channel></rss>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(path("/html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;
        Mock::given(path("/limited"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let urls: Vec<String> = ["good", "empty", "html", "limited"]
            .iter()
            .map(|p| format!("{}/{p}", server.uri()))
            .collect();
        let client = reqwest::Client::new();
        let reports = probe_all(&client, urls.iter().map(String::as_str)).await;

        let statuses: Vec<ProbeStatus> = reports.into_iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                ProbeStatus::Ok(2),
                ProbeStatus::NoEntries,
                ProbeStatus::Parse,
                ProbeStatus::HttpStatus(429),
            ]
        );
    }

    #[tokio::test]
    async fn connection_refused_is_network_status() {
        let report = probe_source(&reqwest::Client::new(), "http://127.0.0.1:9/rss").await;
        assert!(matches!(report.status, ProbeStatus::Network(_)));
        assert!(!report.status.is_success());
    }
}
