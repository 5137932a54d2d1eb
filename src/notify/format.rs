use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, Local};
use url::Url;

use crate::source::Entry;

/// Maps links on known mirror hosts to the canonical site.
///
/// Only the host changes; mirrors serve the same `/<account>/status/<id>`
/// paths.  The result is never checked for reachability.
#[derive(Debug, Clone, Default)]
pub struct LinkRewrite {
    mirror_domains: Vec<String>,
    canonical_host: String,
}

impl LinkRewrite {
    pub fn new(mirror_domains: &[String], canonical_host: impl Into<String>) -> Self {
        Self {
            mirror_domains: mirror_domains.iter().map(|d| d.to_ascii_lowercase()).collect(),
            canonical_host: canonical_host.into(),
        }
    }

    /// Canonical equivalent of `link`, or `None` when `link` is not on a
    /// mirror (or not a URL at all).
    pub fn canonical_link(&self, link: &str) -> Option<String> {
        if self.canonical_host.is_empty() {
            return None;
        }

        let mut url = Url::parse(link).ok()?;
        let host = url.host_str()?.to_ascii_lowercase();
        if !self.mirror_domains.iter().any(|d| *d == host) {
            return None;
        }

        url.set_scheme("https").ok()?;
        url.set_host(Some(&self.canonical_host)).ok()?;
        url.set_port(None).ok()?;
        url.set_query(None);
        url.set_fragment(None);
        Some(url.into())
    }
}

/// Builds every chat message the monitor sends.
#[derive(Debug, Clone)]
pub struct Messages {
    display_name: String,
    rewrite: LinkRewrite,
}

impl Messages {
    pub fn new(display_name: impl Into<String>, rewrite: LinkRewrite) -> Self {
        Self {
            display_name: display_name.into(),
            rewrite,
        }
    }

    pub fn entry(&self, entry: &Entry) -> String {
        let mut text = format!(
            "{} posted:\nTime: {}\nContent: {}\nLink: {}",
            self.display_name, entry.published, entry.title, entry.link
        );
        if let Some(original) = self.rewrite.canonical_link(&entry.link) {
            text.push_str("\nOriginal: ");
            text.push_str(&original);
        }
        text
    }

    pub fn startup(&self, started: DateTime<Local>, poll_interval: Duration) -> String {
        format!(
            "🤖 {} monitor started\nStart time: {}\nPolling every {}",
            self.display_name,
            started.format("%Y-%m-%d %H:%M:%S"),
            human_duration(poll_interval)
        )
    }

    pub fn recent_summary(&self, count: usize) -> String {
        format!("📋 Latest {} posts from {}:", count, self.display_name)
    }

    pub fn no_recent(&self) -> String {
        format!("⚠️ Could not fetch recent posts from {}", self.display_name)
    }

    pub fn error(&self, error: &dyn Display, retry_count: u32, delay: Duration) -> String {
        format!(
            "❌ Monitor error: {}\nConsecutive failures: {}\nRetrying in {}",
            error,
            retry_count,
            human_duration(delay)
        )
    }

    pub fn status_report(&self, now: DateTime<Local>) -> String {
        format!(
            "ℹ️ {} monitor still running ({}), but no feed source is returning data",
            self.display_name,
            now.format("%Y-%m-%d %H:%M")
        )
    }
}

fn human_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 3600 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn rewrite() -> LinkRewrite {
        LinkRewrite::new(&["nitter.net".to_string(), "Nitter.Poast.org".to_string()], "x.com")
    }

    #[test]
    fn mirror_link_maps_to_canonical_host() {
        assert_eq!(
            rewrite().canonical_link("https://nitter.net/realDonaldTrump/status/1234567890#m"),
            Some("https://x.com/realDonaldTrump/status/1234567890".to_string())
        );
    }

    #[test]
    fn mirror_match_ignores_case_and_drops_port_and_query() {
        assert_eq!(
            rewrite().canonical_link("http://NITTER.POAST.ORG:8080/a/status/1?s=20"),
            Some("https://x.com/a/status/1".to_string())
        );
    }

    #[test]
    fn unknown_host_and_garbage_are_left_alone() {
        assert_eq!(rewrite().canonical_link("https://example.com/a/status/1"), None);
        assert_eq!(rewrite().canonical_link("not a url"), None);
        assert_eq!(LinkRewrite::default().canonical_link("https://nitter.net/a"), None);
    }

    #[test]
    fn entry_message_includes_original_link_for_mirrors() {
        let messages = Messages::new("Someone", rewrite());
        let entry = Entry::new(
            "id",
            "Hello world",
            "Mon, 01 Jan 2024 00:00:00 GMT",
            "https://nitter.net/someone/status/42#m",
        );

        assert_eq!(
            messages.entry(&entry),
            "Someone posted:\n\
             Time: Mon, 01 Jan 2024 00:00:00 GMT\n\
             Content: Hello world\n\
             Link: https://nitter.net/someone/status/42#m\n\
             Original: https://x.com/someone/status/42"
        );
    }

    #[test]
    fn entry_message_without_mirror_has_no_original_line() {
        let messages = Messages::new("Someone", rewrite());
        let entry = Entry::new("id", "t", "", "https://example.com/p/1");
        assert!(!messages.entry(&entry).contains("Original:"));
    }

    #[test]
    fn startup_message_mentions_interval() {
        let messages = Messages::new("Someone", LinkRewrite::default());
        let started = Local.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();
        let text = messages.startup(started, Duration::from_secs(300));
        assert!(text.contains("2025-03-01 08:30:00"));
        assert!(text.contains("every 5m"));
    }

    #[test]
    fn human_duration_picks_largest_whole_unit() {
        assert_eq!(human_duration(Duration::from_secs(7200)), "2h");
        assert_eq!(human_duration(Duration::from_secs(120)), "2m");
        assert_eq!(human_duration(Duration::from_secs(90)), "90s");
    }
}
