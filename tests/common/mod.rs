//! Scripted feed source and recording notifier shared by the loop tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use feedwatch::monitor::{Monitor, MonitorSettings};
use feedwatch::notify::{LinkRewrite, Messages, Notify};
use feedwatch::source::{Entry, FeedSource, FetchOutcome, Jitter};

/// `[E<newest>, ..., E<oldest>]`, newest first like a real feed.
pub fn snapshot(newest: u32, oldest: u32) -> Vec<Entry> {
    (oldest..=newest)
        .rev()
        .map(|n| {
            let id = format!("E{n}");
            Entry::new(id.clone(), id, "Mon, 01 Jan 2024 00:00:00 GMT", format!("https://nitter.net/someone/status/{n}"))
        })
        .collect()
}

/// Posts `newest..=oldest` as served by the mirror at `host`: guid and link
/// both carry the mirror's host, like nitter instances do.
pub fn mirror_snapshot(host: &str, newest: u32, oldest: u32) -> Vec<Entry> {
    (oldest..=newest)
        .rev()
        .map(|n| {
            let link = format!("https://{host}/someone/status/{n}#m");
            Entry::new(link.clone(), format!("post {n}"), "Mon, 01 Jan 2024 00:00:00 GMT", link)
        })
        .collect()
}

/// Serves queued snapshots per URL.  The last snapshot of a queue repeats;
/// an unknown URL or an empty snapshot yields `FetchOutcome::Empty`.
#[derive(Default)]
pub struct ScriptedSource {
    feeds: HashMap<String, VecDeque<Vec<Entry>>>,
    pub calls: Vec<String>,
}

impl ScriptedSource {
    pub fn push(&mut self, url: &str, entries: Vec<Entry>) {
        self.feeds.entry(url.to_string()).or_default().push_back(entries);
    }

    /// Replace everything queued for `url` with a single repeating snapshot.
    pub fn set(&mut self, url: &str, entries: Vec<Entry>) {
        self.feeds.insert(url.to_string(), VecDeque::from([entries]));
    }
}

impl FeedSource for ScriptedSource {
    async fn fetch(&mut self, url: &str) -> FetchOutcome {
        self.calls.push(url.to_string());
        let Some(queue) = self.feeds.get_mut(url) else {
            return FetchOutcome::Empty;
        };
        let entries = if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_default()
        };
        if entries.is_empty() {
            FetchOutcome::Empty
        } else {
            FetchOutcome::Entries(entries)
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: RefCell<Vec<String>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<String> {
        self.sent.borrow().clone()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.sent.borrow().iter().filter(|m| m.contains(needle)).count()
    }
}

impl Notify for RecordingNotifier {
    async fn notify(&self, message: &str) -> bool {
        self.sent.borrow_mut().push(message.to_string());
        true
    }
}

pub fn settings() -> MonitorSettings {
    MonitorSettings {
        primary_url: "p".into(),
        fallback_urls: vec!["f1".into(), "f2".into()],
        poll_interval: Duration::from_secs(300),
        poll_jitter: Jitter::NONE,
        backoff_base: Duration::from_secs(60),
        backoff_max: Duration::from_secs(600),
        error_notify_cooldown: Duration::from_secs(3600),
        status_report_hour: None,
        startup_count: 3,
        startup_message_delay: Duration::from_secs(1),
    }
}

pub fn monitor(
    source: ScriptedSource,
    settings: MonitorSettings,
) -> Monitor<ScriptedSource, RecordingNotifier> {
    Monitor::new(
        source,
        RecordingNotifier::default(),
        Messages::new("Someone", LinkRewrite::default()),
        settings,
    )
}
