//! RSS document parsing.
//!
//! Converts an RSS 2.0 document into [`Entry`] values using the [`rss`]
//! crate.  Nothing here does I/O, so the fetcher and the probe share it and
//! tests can feed it literal XML.

use super::Entry;

/// Parse a raw RSS document.
pub fn parse_document(body: &[u8]) -> Result<Vec<Entry>, rss::Error> {
    let channel = rss::Channel::read_from(body)?;
    Ok(parse_channel(&channel))
}

/// Convert an already-parsed [`rss::Channel`] into entries, preserving feed
/// order.
pub fn parse_channel(channel: &rss::Channel) -> Vec<Entry> {
    channel
        .items()
        .iter()
        .filter_map(|item| {
            // Prefer <guid>, fall back to <link>; without either we cannot
            // tell posts apart.
            let id = item
                .guid()
                .map(|g| g.value().trim().to_string())
                .filter(|id| !id.is_empty())
                .or_else(|| item.link().map(|l| l.trim().to_string()))
                .filter(|id| !id.is_empty());

            let Some(id) = id else {
                tracing::debug!(title = ?item.title(), "Skipping feed item without guid or link");
                return None;
            };

            Some(Entry {
                id,
                title: item.title().unwrap_or("(untitled)").to_string(),
                published: item.pub_date().unwrap_or_default().to_string(),
                link: item.link().unwrap_or_default().to_string(),
            })
        })
        .collect()
}
