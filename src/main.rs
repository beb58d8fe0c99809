//! News-to-Tweet Monitor — Binary Entrypoint
//! Boots the Axum HTTP server and wires the monitor controller, Gemini
//! collaborators, and metrics.
//!
//! See `README.md` for quickstart.

use std::time::Duration;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_tweet_monitor::api::{self, AppState};
use news_tweet_monitor::config;
use news_tweet_monitor::gemini;
use news_tweet_monitor::metrics::Metrics;
use news_tweet_monitor::monitor::Monitor;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - MONITOR_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("MONITOR_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("monitor=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // This enables GEMINI_API_KEY / MONITOR_INTERVAL_SECS from .env.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    let cfg = config::load();
    let metrics = Metrics::init(cfg.interval_secs);

    let (news, writer) = gemini::build_collaborators(&cfg);
    let monitor = Monitor::new(news, writer, Duration::from_secs(cfg.interval_secs));

    let router = api::router(AppState { monitor }).merge(metrics.router());

    Ok(router.into())
}
