//! Configuration loading.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML file
//! (`FEEDWATCH_CONFIG`, default `feedwatch.toml`), then environment variables.
//! `.env` is loaded by `main` before any of this runs.
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::source::Jitter;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "FEEDWATCH_CONFIG";
/// Environment variable overriding `webhook_url`.
pub const WEBHOOK_ENV: &str = "FEISHU_WEBHOOK_URL";

const DEFAULT_CONFIG_PATH: &str = "feedwatch.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("No webhook URL configured (set `webhook_url` or FEISHU_WEBHOOK_URL)")]
    MissingWebhook,

    #[error("Invalid URL for {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("Jitter range for {0} has min greater than max")]
    InvalidJitter(&'static str),

    #[error("status_report_hour must be 0-23, got {0}")]
    InvalidHour(u32),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration.  Every table uses `#[serde(default)]` so any
/// subset of keys can be given.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Account handle on the monitored site.
    pub account: String,
    /// Name used in chat messages.
    pub display_name: String,
    /// Chat webhook endpoint.  `FEISHU_WEBHOOK_URL` takes precedence.
    pub webhook_url: Option<String>,
    pub primary_url: String,
    /// Tried in listed order when the current source comes back empty.
    pub fallback_urls: Vec<String>,
    /// Hosts whose post links get a canonical counterpart in messages.
    pub mirror_domains: Vec<String>,
    pub canonical_host: String,
    /// Local hour (0-23) of the daily "no data" status report; unset disables it.
    pub status_report_hour: Option<u32>,
    pub poll: PollConfig,
    pub fetch: FetchConfig,
    pub retry: RetryConfig,
    pub startup: StartupConfig,
    pub proxy: ProxyConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
    /// `[min, max]` seconds added to every interval.
    pub jitter_secs: [u64; 2],
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Minimum spacing between two requests to the same URL.
    pub min_request_interval_secs: u64,
    pub jitter_secs: [u64; 2],
    /// How long a URL is skipped after it answers 429.
    pub rate_limit_cooldown_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub base_delay_secs: u64,
    /// Cap on the exponential backoff delay.
    pub max_delay_secs: u64,
    /// Minimum spacing between two error notifications.
    pub error_notify_cooldown_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    /// How many recent posts to forward on startup.
    pub count: usize,
    /// Pause between startup messages.
    pub message_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyKind {
    Http,
    Socks4,
    Socks5,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub enabled: bool,
    pub kind: ProxyKind,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub dir: String,
    pub file: String,
}

// ============================================================================
// Defaults
// ============================================================================

const MIRRORS: &[&str] = &[
    "nitter.net",
    "nitter.mehicano.me",
    "nitter.privacydev.net",
    "twiiit.com",
    "twitter116.com",
    "nitter.pussthecat.org",
    "nitter.1d4.us",
    "nitter.poast.org",
];

impl Default for Config {
    fn default() -> Self {
        let account = "realDonaldTrump";
        Self {
            account: account.to_string(),
            display_name: "Donald Trump".to_string(),
            webhook_url: None,
            primary_url: format!("https://{}/{account}/rss", MIRRORS[0]),
            fallback_urls: MIRRORS[1..]
                .iter()
                .map(|host| format!("https://{host}/{account}/rss"))
                .collect(),
            mirror_domains: MIRRORS.iter().map(|h| h.to_string()).collect(),
            canonical_host: "x.com".to_string(),
            status_report_hour: Some(9),
            poll: PollConfig::default(),
            fetch: FetchConfig::default(),
            retry: RetryConfig::default(),
            startup: StartupConfig::default(),
            proxy: ProxyConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            jitter_secs: [0, 30],
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            min_request_interval_secs: 60,
            jitter_secs: [0, 15],
            rate_limit_cooldown_secs: 3600,
            request_timeout_secs: 10,
            user_agent: concat!("feedwatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_secs: 60,
            max_delay_secs: 1800,
            error_notify_cooldown_secs: 3600,
        }
    }
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            count: 3,
            message_delay_ms: 1000,
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: ProxyKind::Http,
            host: "127.0.0.1".to_string(),
            port: 7890,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            file: "feedwatch.log".to_string(),
        }
    }
}

/// The webhook URL carries its access token, so it is masked in Debug output.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("account", &self.account)
            .field("display_name", &self.display_name)
            .field("webhook_url", &self.webhook_url.as_ref().map(|_| "[REDACTED]"))
            .field("primary_url", &self.primary_url)
            .field("fallback_urls", &self.fallback_urls)
            .field("mirror_domains", &self.mirror_domains)
            .field("canonical_host", &self.canonical_host)
            .field("status_report_hour", &self.status_report_hour)
            .field("poll", &self.poll)
            .field("fetch", &self.fetch)
            .field("retry", &self.retry)
            .field("startup", &self.startup)
            .field("proxy", &self.proxy)
            .field("log", &self.log)
            .finish()
    }
}

// ============================================================================
// Loading
// ============================================================================

impl Config {
    /// Load from the file named by `FEEDWATCH_CONFIG` (or the default path),
    /// apply environment overrides and validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let mut config = Self::load(Path::new(&path))?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file.  A missing or empty file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides through `lookup` (a seam for tests).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(WEBHOOK_ENV).filter(|u| !u.trim().is_empty()) {
            self.webhook_url = Some(url.trim().to_string());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let webhook = self.webhook_url.as_deref().ok_or(ConfigError::MissingWebhook)?;
        check_url("webhook_url", webhook)?;
        check_url("primary_url", &self.primary_url)?;
        for url in &self.fallback_urls {
            check_url("fallback_urls", url)?;
        }

        let [lo, hi] = self.poll.jitter_secs;
        if lo > hi {
            return Err(ConfigError::InvalidJitter("poll.jitter_secs"));
        }
        let [lo, hi] = self.fetch.jitter_secs;
        if lo > hi {
            return Err(ConfigError::InvalidJitter("fetch.jitter_secs"));
        }

        if let Some(hour) = self.status_report_hour {
            if hour > 23 {
                return Err(ConfigError::InvalidHour(hour));
            }
        }
        Ok(())
    }

    /// Webhook URL; empty until [`validate`](Self::validate) has passed.
    pub fn webhook(&self) -> &str {
        self.webhook_url.as_deref().unwrap_or_default()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs)
    }

    pub fn poll_jitter(&self) -> Jitter {
        let [lo, hi] = self.poll.jitter_secs;
        Jitter::from_secs(lo, hi)
    }

    pub fn fetch_jitter(&self) -> Jitter {
        let [lo, hi] = self.fetch.jitter_secs;
        Jitter::from_secs(lo, hi)
    }

    /// Every source in selection order.
    pub fn all_sources(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_url.as_str()).chain(self.fallback_urls.iter().map(String::as_str))
    }
}

impl ProxyConfig {
    /// Proxy URL in the form reqwest expects, or `None` when disabled.
    pub fn url(&self) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let scheme = match self.kind {
            ProxyKind::Http => "http",
            ProxyKind::Socks4 => "socks4",
            // socks5h resolves names on the proxy side.
            ProxyKind::Socks5 => "socks5h",
        };
        Some(format!("{scheme}://{}:{}", self.host, self.port))
    }
}

fn check_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    match url::Url::parse(value) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
    }
}
