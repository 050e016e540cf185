//! csvcache - render a remote CSV file as an HTML widget.
//!
//! Prints a sortable table or a grouped timeline for a CSV source to stdout.
//! The source is fetched at most once a day after the configured cutoff and
//! served from the local cache otherwise.
//!
//! ```text
//! csvcache [url=<csv url>] [hide=<col,col>] [grouped-timeline=<id,label,value,unit>]
//! csvcache --status [url=<csv url>]
//! csvcache --check-update
//! csvcache --teardown
//! ```

use std::collections::HashMap;
use std::io;

use anyhow::{bail, Result};
use chrono::Utc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use csvcache_core::models::ATTR_URL;
use csvcache_core::service::render_configured;
use csvcache_core::update::{check_for_update, CURRENT_VERSION};
use csvcache_core::{Config, CsvView};

/// Directory for a daily rolling log file, in addition to stderr.
const LOG_DIR_ENV_VAR: &str = "CSVCACHE_LOG_DIR";

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV_VAR) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir.trim(), "csvcache.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    // stdout carries the rendered HTML, so logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

/// Parse `key=value` arguments into view attributes.
fn parse_attrs(args: &[String]) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::new();
    for arg in args {
        let Some((key, value)) = arg.split_once('=') else {
            bail!("expected key=value, got {:?}", arg);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("empty attribute name in {:?}", arg);
        }
        attrs.insert(key.to_lowercase(), value.to_string());
    }
    Ok(attrs)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = init_tracing();

    let mut config = Config::load()?;
    config.apply_env();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("--teardown") => teardown(&config),
        Some("--check-update") => check_update(&config).await,
        Some("--status") => status(&config, &parse_attrs(&args[1..])?),
        Some("--version") => {
            println!("csvcache {}", CURRENT_VERSION);
            Ok(())
        }
        _ => {
            render(&config, &parse_attrs(&args)?).await;
            Ok(())
        }
    }
}

async fn render(config: &Config, attrs: &HashMap<String, String>) {
    // setup failures come back as a placeholder too, never as an exit error
    println!("{}", render_configured(config, attrs).await);
}

fn teardown(config: &Config) -> Result<()> {
    let view = CsvView::from_config(config)?;
    let removed = view.source().teardown()?;
    info!(removed, "Teardown complete");
    println!("Removed {} cached entries", removed);
    Ok(())
}

fn status(config: &Config, attrs: &HashMap<String, String>) -> Result<()> {
    let view = CsvView::from_config(config)?;
    let url = attrs
        .get(ATTR_URL)
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .unwrap_or(view.default_url());
    let status = view.source().status(url, Utc::now())?;

    let report = serde_json::json!({
        "url": url,
        "fingerprint": status.fingerprint,
        "cached_rows": status.cached_rows,
        "cached_age": status.cached_age,
        "last_fetch": status.last_fetch.map(|t| t.to_rfc3339()),
        "refresh_due": status.refresh_due,
        "next_refresh": status.next_refresh.to_rfc3339(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn check_update(config: &Config) -> Result<()> {
    let Some(manifest_url) = config.update_manifest_url.as_deref() else {
        bail!("No update_manifest_url configured in {}", Config::config_path()?.display());
    };
    let fetcher = csvcache_core::fetch::ReqwestFetcher::new()?;
    match check_for_update(&fetcher, manifest_url, CURRENT_VERSION).await? {
        Some(update) => println!(
            "Update available: {} -> {}\n{}",
            update.current, update.latest, update.download_url
        ),
        None => println!("csvcache {} is up to date", CURRENT_VERSION),
    }
    Ok(())
}
