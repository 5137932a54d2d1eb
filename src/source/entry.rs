//! The post type shared by the fetcher, the selector and the notifier.
//!
//! An `Entry` is one item of a feed snapshot.  Snapshots are kept in the order
//! the feed delivers them, which for the mirrors we poll is newest first, so
//! the first entry of a snapshot is treated as "the latest post".

use url::Url;

/// A single post, normalised from an RSS `<item>`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Entry {
    /// The `<guid>` element, falling back to `<link>`.  Items with neither are
    /// dropped while parsing, so this is never empty.
    ///
    /// Mirrors put their own host into this value; compare posts with
    /// [`Entry::key`] instead.
    pub id: String,

    /// Post text as carried in `<title>`.
    pub title: String,

    /// Raw `<pubDate>` text, empty when the feed omits it.
    ///
    /// Kept verbatim: it only ever ends up in a chat message.
    pub published: String,

    /// URL of the post on the mirror that served it.
    pub link: String,
}

impl Entry {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        published: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            published: published.into(),
            link: link.into(),
        }
    }

    /// Host-independent identity of the post, see [`identity_key`].
    pub fn key(&self) -> String {
        identity_key(&self.id)
    }
}

/// Reduce an entry id to something every mirror agrees on.
///
/// URL ids keep only their path, so `https://nitter.net/a/status/5#m` and
/// `http://nitter.poast.org:8080/a/status/5?x=1` both become `/a/status/5`.
/// Anything else, or a URL without a usable path, is returned unchanged.
pub fn identity_key(id: &str) -> String {
    match Url::parse(id) {
        Ok(url) if url.has_host() => {
            let path = url.path().trim_end_matches('/');
            if path.is_empty() {
                id.to_string()
            } else {
                path.to_string()
            }
        }
        _ => id.to_string(),
    }
}
