//! Fallback source selection: strictly ordered, first success wins.

use super::{Entry, FeedSource};

/// The source that produced entries, and what it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub url: String,
    pub entries: Vec<Entry>,
}

/// Try `primary`, then each of `fallbacks` in order, stopping at the first
/// source that yields at least one entry.
///
/// `None` means every source came back empty; callers treat that as a
/// transient failure.
pub async fn select_source<S: FeedSource>(
    source: &mut S,
    primary: &str,
    fallbacks: &[String],
) -> Option<Selection> {
    select_excluding(source, primary, fallbacks, None).await
}

/// Same as [`select_source`], but never fetches `skip`.
///
/// The poll loop passes the source that just came back empty so it is not
/// requested twice in one cycle.
pub async fn select_excluding<S: FeedSource>(
    source: &mut S,
    primary: &str,
    fallbacks: &[String],
    skip: Option<&str>,
) -> Option<Selection> {
    let candidates = std::iter::once(primary)
        .chain(fallbacks.iter().map(String::as_str))
        .filter(|url| Some(*url) != skip);

    for url in candidates {
        if let Some(entries) = source.fetch(url).await.into_entries() {
            return Some(Selection {
                url: url.to_string(),
                entries,
            });
        }
        tracing::debug!(url, "Source yielded nothing, trying next");
    }

    tracing::warn!(primary, fallbacks = fallbacks.len(), "No source returned any entries");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FetchOutcome;
    use std::collections::HashMap;

    /// Source that serves canned entry lists and records every URL asked for.
    #[derive(Default)]
    struct Scripted {
        feeds: HashMap<String, Vec<Entry>>,
        calls: Vec<String>,
    }

    impl Scripted {
        fn with(mut self, url: &str, ids: &[&str]) -> Self {
            let entries = ids.iter().map(|id| Entry::new(*id, *id, "", "")).collect();
            self.feeds.insert(url.to_string(), entries);
            self
        }
    }

    impl FeedSource for Scripted {
        async fn fetch(&mut self, url: &str) -> FetchOutcome {
            self.calls.push(url.to_string());
            match self.feeds.get(url) {
                Some(entries) if !entries.is_empty() => FetchOutcome::Entries(entries.clone()),
                _ => FetchOutcome::Empty,
            }
        }
    }

    fn fallbacks() -> Vec<String> {
        vec!["f1".into(), "f2".into(), "f3".into()]
    }

    #[tokio::test]
    async fn primary_success_skips_fallbacks() {
        let mut source = Scripted::default().with("p", &["e1"]).with("f1", &["x"]);

        let selection = select_source(&mut source, "p", &fallbacks()).await.unwrap();

        assert_eq!(selection.url, "p");
        assert_eq!(source.calls, vec!["p"]);
    }

    #[tokio::test]
    async fn fallbacks_tried_once_in_order_until_first_success() {
        let mut source = Scripted::default().with("f3", &["e9"]).with("f2", &[]);

        let selection = select_source(&mut source, "p", &fallbacks()).await.unwrap();

        assert_eq!(selection.url, "f3");
        assert_eq!(selection.entries[0].id, "e9");
        assert_eq!(source.calls, vec!["p", "f1", "f2", "f3"]);
    }

    #[tokio::test]
    async fn exhausted_sources_return_none() {
        let mut source = Scripted::default();

        assert!(select_source(&mut source, "p", &fallbacks()).await.is_none());
        assert_eq!(source.calls.len(), 4);
    }

    #[tokio::test]
    async fn excluded_source_is_not_fetched() {
        let mut source = Scripted::default().with("f2", &["e1"]);

        let selection = select_excluding(&mut source, "p", &fallbacks(), Some("f1"))
            .await
            .unwrap();

        assert_eq!(selection.url, "f2");
        assert_eq!(source.calls, vec!["p", "f2"]);
    }
}
