//! feedwatch: forwards new posts from a social-media account's RSS mirrors
//! to a chat webhook.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌───────────┐  FetchOutcome  ┌────────────┐  text  ┌───────────┐
//! │  source/  │ ─────────────► │ monitor.rs │ ─────► │  notify/  │
//! │ (fetcher) │                │   (loop)   │        │ (webhook) │
//! └───────────┘                └────────────┘        └───────────┘
//! ```
//!
//! * **`source`**: entries, RSS parsing, per-URL pacing, fetcher, selector.
//! * **`notify`**: message formatting and webhook delivery.
//! * **`monitor`**: the startup / poll / backoff state machine.
//! * **`config`**, **`http`**, **`logging`**: process setup.
//! * **`probe`**: one-shot source connectivity report.

pub mod config;
pub mod http;
pub mod logging;
pub mod monitor;
pub mod notify;
pub mod probe;
pub mod source;
