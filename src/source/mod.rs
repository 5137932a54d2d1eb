//! Feed retrieval.
//!
//! This module defines the [`FeedSource`] trait and the common [`Entry`]
//! type.  [`Fetcher`] is the HTTP implementation; the monitor only sees the
//! trait, so tests drive it with scripted sources.
//!
//! * **`entry`**: the post type.
//! * **`rss`**: document → entries.
//! * **`pacing`**: per-URL spacing and 429 cool-downs.
//! * **`fetcher`**: HTTP GET + parse, folded into a [`FetchOutcome`].
//! * **`selector`**: primary-then-fallbacks source selection.

mod entry;
mod fetcher;
pub mod pacing;
mod rss;
mod selector;

pub use entry::{identity_key, Entry};
pub use fetcher::{FetchError, FetchOutcome, Fetcher};
pub use pacing::{Jitter, RequestPacer};
pub use self::rss::{parse_channel, parse_document};
pub use selector::{select_excluding, select_source, Selection};

/// Anything that can turn a feed URL into a [`FetchOutcome`].
///
/// Implementations must absorb every failure into the outcome; the poll loop
/// never sees an error from a fetch.
#[allow(async_fn_in_trait)]
pub trait FeedSource {
    async fn fetch(&mut self, url: &str) -> FetchOutcome;
}
