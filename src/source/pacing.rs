//! Per-URL request pacing.
//!
//! Mirrors throttle aggressively, so every URL gets a minimum spacing between
//! requests plus a random jitter, and a URL that answered HTTP 429 is parked
//! for a long cool-down.  All state is in memory and lost on restart.

use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

/// A bounded random addition to a wait interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    pub min: Duration,
    pub max: Duration,
}

impl Jitter {
    pub const NONE: Jitter = Jitter {
        min: Duration::ZERO,
        max: Duration::ZERO,
    };

    pub fn from_secs(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_secs(min),
            max: Duration::from_secs(max),
        }
    }

    /// Draw a uniformly distributed duration in `[min, max]`.
    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let min_ms = u64::try_from(self.min.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::rng().random_range(min_ms..=max_ms))
    }

    /// `base` plus a fresh jitter sample.
    pub fn apply(&self, base: Duration) -> Duration {
        base.saturating_add(self.sample())
    }
}

#[derive(Debug, Default)]
struct SourceSlot {
    last_request: Option<Instant>,
    cooldown_until: Option<Instant>,
}

/// Tracks request timing for every URL the fetcher has touched.
#[derive(Debug)]
pub struct RequestPacer {
    min_interval: Duration,
    jitter: Jitter,
    cooldown: Duration,
    slots: HashMap<String, SourceSlot>,
}

impl RequestPacer {
    pub fn new(min_interval: Duration, jitter: Jitter, cooldown: Duration) -> Self {
        Self {
            min_interval,
            jitter,
            cooldown,
            slots: HashMap::new(),
        }
    }

    /// Sleep until `url` may be requested again, then record the request.
    ///
    /// The first request to a URL never waits.
    pub async fn wait_turn(&mut self, url: &str) {
        let slot = self.slots.entry(url.to_string()).or_default();

        if let Some(last) = slot.last_request {
            let required = self.jitter.apply(self.min_interval);
            let elapsed = last.elapsed();
            if elapsed < required {
                let wait = required - elapsed;
                tracing::debug!(url, wait_ms = wait.as_millis() as u64, "Pacing request");
                tokio::time::sleep(wait).await;
            }
        }

        slot.last_request = Some(Instant::now());
    }

    /// Park `url` for the configured cool-down, starting now.
    pub fn cool_down(&mut self, url: &str) {
        let until = Instant::now() + self.cooldown;
        self.slots.entry(url.to_string()).or_default().cooldown_until = Some(until);
    }

    /// Time left in `url`'s cool-down, if it is cooling down.
    pub fn cooldown_remaining(&self, url: &str) -> Option<Duration> {
        let until = self.slots.get(url)?.cooldown_until?;
        let now = Instant::now();
        (until > now).then(|| until - now)
    }

    pub fn is_cooling_down(&self, url: &str) -> bool {
        self.cooldown_remaining(url).is_some()
    }
}
