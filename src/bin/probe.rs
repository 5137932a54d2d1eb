//! Print a connectivity report for every configured feed source.

use std::path::Path;

use anyhow::{Context, Result};

use feedwatch::config::Config;
use feedwatch::{http, probe};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // The webhook is irrelevant here, so skip full validation.
    let path = std::env::var(feedwatch::config::CONFIG_PATH_ENV)
        .unwrap_or_else(|_| "feedwatch.toml".into());
    let config = Config::load(Path::new(&path)).context("loading configuration")?;
    let client = http::feed_client(&config).context("building feed client")?;

    let proxy = config.proxy.url();
    println!(
        "Probing {} sources (proxy: {})\n",
        config.fallback_urls.len() + 1,
        proxy.as_deref().unwrap_or("disabled")
    );
    println!("{:<60} | {:<24} | {:>8}", "URL", "Result", "Time");
    println!("{}", "-".repeat(98));

    let reports = probe::probe_all(&client, config.all_sources()).await;
    for report in &reports {
        println!(
            "{:<60} | {:<24} | {:>7.2}s",
            report.url,
            report.status.to_string(),
            report.elapsed.as_secs_f64()
        );
    }

    let ok = reports.iter().filter(|r| r.status.is_success()).count();
    println!("\n{ok}/{} sources returned entries", reports.len());

    if ok == 0 {
        println!("\nNo source is reachable. Check network and proxy settings.");
        match proxy {
            Some(url) => {
                println!("  - current proxy: {url}");
                println!("  - make sure the proxy is running, or set proxy.enabled = false");
            }
            None => println!("  - mirrors may be blocked; try enabling [proxy]"),
        }
    }

    Ok(())
}
