use std::time::Duration;

use anyhow::{Context, Result};

use feedwatch::config::Config;
use feedwatch::http;
use feedwatch::logging;
use feedwatch::monitor::{Monitor, MonitorSettings};
use feedwatch::notify::{LinkRewrite, Messages, WebhookNotifier};
use feedwatch::source::{Fetcher, RequestPacer};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("loading configuration")?;
    let _log_guard = logging::init(&config.log.dir, &config.log.file)?;
    tracing::info!(?config, "Configuration loaded");

    // -- feed side -----------------------------------------------------------
    let pacer = RequestPacer::new(
        Duration::from_secs(config.fetch.min_request_interval_secs),
        config.fetch_jitter(),
        Duration::from_secs(config.fetch.rate_limit_cooldown_secs),
    );
    let fetcher = Fetcher::new(
        http::feed_client(&config).context("building feed client")?,
        pacer,
    );

    // -- chat side -----------------------------------------------------------
    let notifier = WebhookNotifier::new(
        http::webhook_client(&config).context("building webhook client")?,
        config.webhook(),
    );
    let messages = Messages::new(
        &config.display_name,
        LinkRewrite::new(&config.mirror_domains, &config.canonical_host),
    );

    let mut monitor = Monitor::new(fetcher, notifier, messages, MonitorSettings::from_config(&config));

    tokio::select! {
        _ = monitor.run() => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for interrupt")?;
            tracing::info!("Interrupted, shutting down");
        }
    }

    Ok(())
}
