//! Chat webhook delivery.
//!
//! Delivery is at-most-once: a failed POST is logged and reported as `false`,
//! never retried or queued.

mod format;

pub use format::{LinkRewrite, Messages};

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport failure talking to the webhook.
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The webhook answered with something other than 200.
    #[error("webhook returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Anything that can deliver a text message.
#[allow(async_fn_in_trait)]
pub trait Notify {
    /// Deliver `message`; `true` when the endpoint accepted it.
    async fn notify(&self, message: &str) -> bool;
}

#[derive(Serialize)]
struct TextContent<'a> {
    text: &'a str,
}

/// Body of a custom-bot text message.
#[derive(Serialize)]
struct TextMessage<'a> {
    msg_type: &'static str,
    content: TextContent<'a>,
}

impl<'a> TextMessage<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            msg_type: "text",
            content: TextContent { text },
        }
    }
}

/// Posts text messages to a single chat webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Send one message, surfacing the failure reason.
    pub async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&TextMessage::new(text))
            .send()
            .await?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

impl Notify for WebhookNotifier {
    async fn notify(&self, message: &str) -> bool {
        match self.send(message).await {
            Ok(()) => {
                tracing::info!(chars = message.chars().count(), "Notification delivered");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Notification delivery failed");
                false
            }
        }
    }
}
