//! HTTP client construction.
//!
//! Feeds go through the optional forward proxy; the webhook never does.

use std::time::Duration;

use reqwest::{Client, Proxy};

use crate::config::Config;

/// Client for feed requests: timeout, user agent and, when enabled, the
/// configured proxy.
pub fn feed_client(config: &Config) -> reqwest::Result<Client> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(config.fetch.request_timeout_secs))
        .user_agent(config.fetch.user_agent.as_str());

    if let Some(proxy_url) = config.proxy.url() {
        tracing::info!(proxy = %proxy_url, "Routing feed requests through proxy");
        builder = builder.proxy(Proxy::all(&proxy_url)?);
    }

    builder.build()
}

/// Client for webhook delivery.
pub fn webhook_client(config: &Config) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.fetch.request_timeout_secs))
        .build()
}
