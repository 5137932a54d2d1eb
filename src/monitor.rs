//! The poll loop.
//!
//! ```text
//! STARTING ──► POLLING ◄──► BACKING_OFF
//! ```
//!
//! Everything runs on one task: fetch, compare, notify, sleep.  A cycle that
//! finds no entries on any source fails with [`MonitorError::NoSource`]; the
//! loop turns that into an exponential backoff and a rate-limited error
//! notification.  There is no terminal state.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, Timelike};
use thiserror::Error;
use tokio::time::Instant;

use crate::config::Config;
use crate::notify::{Messages, Notify};
use crate::source::{identity_key, select_excluding, select_source, Entry, FeedSource, Jitter};

/// How many entry keys are remembered to reject stale mirror snapshots.
const SEEN_HISTORY: usize = 512;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("no feed source returned any entries")]
    NoSource,
}

/// What a successful cycle found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A new latest entry was found and forwarded.
    NewEntry(String),
    Unchanged,
    /// The newest entry is one seen before; a lagging mirror.
    Stale(String),
}

/// Timing and source settings for the loop.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub primary_url: String,
    pub fallback_urls: Vec<String>,
    pub poll_interval: Duration,
    pub poll_jitter: Jitter,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    pub error_notify_cooldown: Duration,
    pub status_report_hour: Option<u32>,
    pub startup_count: usize,
    pub startup_message_delay: Duration,
}

impl MonitorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            primary_url: config.primary_url.clone(),
            fallback_urls: config.fallback_urls.clone(),
            poll_interval: config.poll_interval(),
            poll_jitter: config.poll_jitter(),
            backoff_base: Duration::from_secs(config.retry.base_delay_secs),
            backoff_max: Duration::from_secs(config.retry.max_delay_secs),
            error_notify_cooldown: Duration::from_secs(config.retry.error_notify_cooldown_secs),
            status_report_hour: config.status_report_hour,
            startup_count: config.startup.count,
            startup_message_delay: Duration::from_millis(config.startup.message_delay_ms),
        }
    }
}

/// Bounded set of entry keys, oldest evicted first.
#[derive(Debug, Default)]
struct SeenIds {
    order: VecDeque<String>,
    ids: HashSet<String>,
}

impl SeenIds {
    fn insert(&mut self, key: String) {
        if !self.ids.insert(key.clone()) {
            return;
        }
        self.order.push_back(key);
        if self.order.len() > SEEN_HISTORY {
            if let Some(old) = self.order.pop_front() {
                self.ids.remove(&old);
            }
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.ids.contains(key)
    }
}

/// In-memory loop state.  Nothing survives a restart.
#[derive(Debug)]
pub struct MonitorState {
    /// Newest entry forwarded or acknowledged.  Never cleared once set.
    pub last_seen_entry_id: Option<String>,
    pub current_source: String,
    /// Consecutive failed cycles.
    pub retry_count: u32,
    pub last_error_notification: Option<Instant>,
    pub last_status_report: Option<NaiveDate>,
    seen: SeenIds,
}

impl MonitorState {
    fn new(current_source: String) -> Self {
        Self {
            last_seen_entry_id: None,
            current_source,
            retry_count: 0,
            last_error_notification: None,
            last_status_report: None,
            seen: SeenIds::default(),
        }
    }

    fn remember(&mut self, entries: &[Entry]) {
        for entry in entries {
            self.seen.insert(entry.key());
        }
    }
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// `min(base × 2^(retry_count − 1), cap)`; `retry_count` counts from 1.
pub fn backoff_delay(base: Duration, cap: Duration, retry_count: u32) -> Duration {
    let exponent = retry_count.saturating_sub(1);
    let scaled = 1u128
        .checked_shl(exponent)
        .and_then(|multiplier| base.as_nanos().checked_mul(multiplier));
    match scaled {
        Some(nanos) if nanos < cap.as_nanos() => {
            // Below the cap, so the seconds fit in a u64.
            Duration::new((nanos / NANOS_PER_SEC) as u64, (nanos % NANOS_PER_SEC) as u32)
        }
        _ => cap,
    }
}

pub struct Monitor<S, N> {
    source: S,
    notifier: N,
    messages: Messages,
    settings: MonitorSettings,
    state: MonitorState,
}

impl<S: FeedSource, N: Notify> Monitor<S, N> {
    pub fn new(source: S, notifier: N, messages: Messages, settings: MonitorSettings) -> Self {
        let state = MonitorState::new(settings.primary_url.clone());
        Self {
            source,
            notifier,
            messages,
            settings,
            state,
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Run forever: startup, then poll / back off.
    pub async fn run(&mut self) {
        self.startup().await;

        loop {
            let delay = match self.poll_once().await {
                Ok(outcome) => {
                    tracing::debug!(?outcome, "Poll cycle complete");
                    self.settings.poll_jitter.apply(self.settings.poll_interval)
                }
                Err(err) => self.record_failure(&err).await,
            };
            tracing::debug!(delay_secs = delay.as_secs(), "Sleeping until next cycle");
            tokio::time::sleep(delay).await;
        }
    }

    /// Announce startup and forward the most recent entries.
    pub async fn startup(&mut self) {
        let startup = self.messages.startup(Local::now(), self.settings.poll_interval);
        self.notifier.notify(&startup).await;
        tracing::info!("Startup notification sent, fetching recent entries");

        let selection = select_source(
            &mut self.source,
            &self.settings.primary_url,
            &self.settings.fallback_urls,
        )
        .await;

        let Some(selection) = selection else {
            tracing::warn!("No recent entries available at startup");
            self.notifier.notify(&self.messages.no_recent()).await;
            return;
        };

        let recent = &selection.entries[..self.settings.startup_count.min(selection.entries.len())];
        if !recent.is_empty() {
            self.notifier
                .notify(&self.messages.recent_summary(recent.len()))
                .await;
            for entry in recent {
                self.notifier.notify(&self.messages.entry(entry)).await;
                tokio::time::sleep(self.settings.startup_message_delay).await;
            }
        }

        self.state.remember(&selection.entries);
        self.state.last_seen_entry_id = Some(selection.entries[0].id.clone());
        tracing::info!(
            source = %selection.url,
            last_seen = ?self.state.last_seen_entry_id,
            forwarded = recent.len(),
            "Startup complete"
        );
        self.state.current_source = selection.url;
    }

    /// One POLLING cycle.
    pub async fn poll_once(&mut self) -> Result<PollOutcome, MonitorError> {
        let current = self.state.current_source.clone();

        let entries = match self.source.fetch(&current).await.into_entries() {
            Some(entries) => entries,
            None => {
                let selection = select_excluding(
                    &mut self.source,
                    &self.settings.primary_url,
                    &self.settings.fallback_urls,
                    Some(&current),
                )
                .await;

                match selection {
                    Some(selection) => {
                        tracing::info!(from = %current, to = %selection.url, "Switching feed source");
                        self.state.current_source = selection.url;
                        selection.entries
                    }
                    None => {
                        self.maybe_send_status_report(Local::now()).await;
                        return Err(MonitorError::NoSource);
                    }
                }
            }
        };

        self.state.retry_count = 0;
        Ok(self.process_snapshot(&entries).await)
    }

    async fn process_snapshot(&mut self, entries: &[Entry]) -> PollOutcome {
        // Callers only pass non-empty snapshots.
        let newest = &entries[0];
        let key = newest.key();

        let last_key = self.state.last_seen_entry_id.as_deref().map(identity_key);
        if last_key.as_deref() == Some(key.as_str()) {
            return PollOutcome::Unchanged;
        }

        if self.state.seen.contains(&key) {
            tracing::warn!(
                source = %self.state.current_source,
                id = %newest.id,
                "Source served an older snapshot, ignoring"
            );
            return PollOutcome::Stale(newest.id.clone());
        }

        tracing::info!(id = %newest.id, title = %newest.title, "New entry found");
        self.notifier.notify(&self.messages.entry(newest)).await;
        self.state.remember(entries);
        self.state.last_seen_entry_id = Some(newest.id.clone());
        PollOutcome::NewEntry(newest.id.clone())
    }

    /// BACKING_OFF: bump the retry count, maybe notify, and return how long
    /// to sleep.
    pub async fn record_failure(&mut self, err: &MonitorError) -> Duration {
        self.state.retry_count = self.state.retry_count.saturating_add(1);
        let delay = backoff_delay(
            self.settings.backoff_base,
            self.settings.backoff_max,
            self.state.retry_count,
        );
        tracing::error!(
            error = %err,
            retry_count = self.state.retry_count,
            delay_secs = delay.as_secs(),
            "Poll cycle failed, backing off"
        );

        let due = self
            .state
            .last_error_notification
            .map_or(true, |at| at.elapsed() >= self.settings.error_notify_cooldown);
        if due {
            self.state.last_error_notification = Some(Instant::now());
            let text = self.messages.error(err, self.state.retry_count, delay);
            self.notifier.notify(&text).await;
        } else {
            tracing::debug!("Error notification suppressed by cooldown");
        }

        delay
    }

    /// Send the "still running, no data" report if `now` is in the configured
    /// hour and none went out today.  Returns whether one was sent.
    pub async fn maybe_send_status_report(&mut self, now: DateTime<Local>) -> bool {
        let Some(hour) = self.settings.status_report_hour else {
            return false;
        };
        let today = now.date_naive();
        if now.hour() != hour || self.state.last_status_report == Some(today) {
            return false;
        }

        self.state.last_status_report = Some(today);
        tracing::info!(%today, "Sending daily status report");
        self.notifier.notify(&self.messages.status_report(now)).await;
        true
    }
}
