// src/monitor.rs
//! Monitor loop controller: owns the monitoring state machine, the repeating
//! timer, and the tweet feed. All transitions go through `start`/`stop` or
//! outcome application under one lock; nothing else mutates the state.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::news::NewsSource;
use crate::pipeline::{self, CycleOutcome, NoChangeReason};
use crate::tweet::{Tweet, TweetWriter};

/// Rejections surfaced by [`Monitor::start`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error("Please enter a topic to monitor.")]
    InvalidTopic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MonitorPhase {
    Idle,
    Starting,
    Running,
    PausedOnError,
}

/// Point-in-time view of the controller, shaped for the status surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSnapshot {
    pub phase: MonitorPhase,
    pub topic: String,
    pub status: String,
    pub error: Option<String>,
    pub loading: bool,
    pub tweet_count: usize,
}

struct Inner {
    phase: MonitorPhase,
    topic: String,
    status: String,
    error: Option<String>,
    loading: bool,
    tweets: Vec<Tweet>,
    /// Bumped on every `start`/`stop`. A loop task whose epoch no longer
    /// matches discards its outcome and exits, so a result arriving after
    /// `stop()` (or a restart) can never touch the state.
    epoch: u64,
    timer: Option<JoinHandle<()>>,
}

impl Inner {
    /// Apply one cycle outcome. Returns `true` when the loop must halt.
    fn apply(&mut self, outcome: CycleOutcome) -> bool {
        self.loading = false;
        match outcome {
            CycleOutcome::NoChange(NoChangeReason::NothingFound) => {
                counter!("monitor_no_change_total").increment(1);
                self.status = format!(
                    "No new updates found for \"{}\". Checking again soon.",
                    self.topic
                );
                false
            }
            CycleOutcome::NoChange(NoChangeReason::Unchanged) => {
                counter!("monitor_no_change_total").increment(1);
                self.status = format!(
                    "No new updates found for \"{}\". The latest news is unchanged. Checking again soon.",
                    self.topic
                );
                false
            }
            CycleOutcome::Generated(tweet) => {
                counter!("monitor_tweets_total").increment(1);
                tracing::info!(id = %tweet.id, sources = tweet.sources.len(), "tweet drafted");
                self.tweets.insert(0, tweet);
                self.status = "Tweet generated! Monitoring for next update...".to_string();
                false
            }
            CycleOutcome::Failed(msg) => {
                counter!("monitor_cycle_failures_total").increment(1);
                tracing::warn!(error = %msg, "cycle failed, pausing monitor");
                self.error = Some(format!("Error: {msg}"));
                self.status = "An error occurred. Pausing monitoring.".to_string();
                self.phase = MonitorPhase::PausedOnError;
                self.timer = None;
                true
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // No cycle may fire once the last handle is gone.
        if let Some(h) = self.timer.take() {
            h.abort();
        }
    }
}

/// Cheaply clonable controller handle; clones share one state.
#[derive(Clone)]
pub struct Monitor {
    news: Arc<dyn NewsSource>,
    writer: Arc<dyn TweetWriter>,
    period: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl Monitor {
    pub fn new(news: Arc<dyn NewsSource>, writer: Arc<dyn TweetWriter>, period: Duration) -> Self {
        ensure_metrics_described();
        Self {
            news,
            writer,
            period,
            inner: Arc::new(Mutex::new(Inner {
                phase: MonitorPhase::Idle,
                topic: String::new(),
                status: "Ready to monitor.".to_string(),
                error: None,
                loading: false,
                tweets: Vec::new(),
                epoch: 0,
                timer: None,
            })),
        }
    }

    /// Begin monitoring `topic`. Rejects blank topics; a no-op while a loop
    /// is already live. The first cycle fires immediately, subsequent ones
    /// on the fixed period.
    pub fn start(&self, topic: &str) -> Result<(), StartError> {
        let mut g = self.inner.lock().expect("monitor state poisoned");
        if matches!(g.phase, MonitorPhase::Starting | MonitorPhase::Running) {
            return Ok(());
        }
        if topic.trim().is_empty() {
            return Err(StartError::InvalidTopic);
        }

        g.topic = topic.to_string();
        g.phase = MonitorPhase::Starting;
        g.status = format!("Starting to monitor \"{topic}\"...");
        g.error = None;
        g.epoch += 1;

        tracing::info!(topic, period_secs = self.period.as_secs(), "monitor started");
        let handle = tokio::spawn(run_loop(
            Arc::downgrade(&self.inner),
            self.news.clone(),
            self.writer.clone(),
            self.period,
            g.epoch,
        ));
        g.timer = Some(handle);
        Ok(())
    }

    /// Stop monitoring. Disarms the timer, cancels any in-flight cycle, and
    /// returns to `Idle`. Safe to call repeatedly.
    pub fn stop(&self) {
        let handle = {
            let mut g = self.inner.lock().expect("monitor state poisoned");
            g.epoch += 1;
            g.phase = MonitorPhase::Idle;
            g.status = "Monitoring stopped.".to_string();
            g.loading = false;
            g.timer.take()
        };
        if let Some(h) = handle {
            h.abort();
            tracing::info!("monitor stopped");
        }
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        let g = self.inner.lock().expect("monitor state poisoned");
        MonitorSnapshot {
            phase: g.phase,
            topic: g.topic.clone(),
            status: g.status.clone(),
            error: g.error.clone(),
            loading: g.loading,
            tweet_count: g.tweets.len(),
        }
    }

    /// Tweets newest-first.
    pub fn tweets(&self) -> Vec<Tweet> {
        let g = self.inner.lock().expect("monitor state poisoned");
        g.tweets.clone()
    }

    pub fn tweet(&self, id: &str) -> Option<Tweet> {
        let g = self.inner.lock().expect("monitor state poisoned");
        g.tweets.iter().find(|t| t.id == id).cloned()
    }
}

/// The repeating loop. Holds only a weak reference to the state, so a
/// dropped controller both aborts this task and, failing that, starves it
/// of anything to act on. The lock is never held across an await.
async fn run_loop(
    inner: Weak<Mutex<Inner>>,
    news: Arc<dyn NewsSource>,
    writer: Arc<dyn TweetWriter>,
    period: Duration,
    epoch: u64,
) {
    // The first tick completes immediately.
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;

        let (topic, last_accepted) = {
            let Some(state) = inner.upgrade() else { return };
            let mut g = state.lock().expect("monitor state poisoned");
            if g.epoch != epoch {
                return;
            }
            g.phase = MonitorPhase::Running;
            g.loading = true;
            g.error = None;
            g.status = format!("Searching for latest news on \"{}\"...", g.topic);
            (
                g.topic.clone(),
                g.tweets.first().map(|t| t.original_summary.clone()),
            )
        };

        let outcome =
            pipeline::run_cycle(news.as_ref(), writer.as_ref(), &topic, last_accepted.as_deref())
                .await;
        counter!("monitor_cycles_total").increment(1);
        gauge!("monitor_last_cycle_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

        let Some(state) = inner.upgrade() else { return };
        let mut g = state.lock().expect("monitor state poisoned");
        if g.epoch != epoch {
            // stop() or a restart won the race; this outcome is stale.
            tracing::debug!(topic = %topic, "discarding stale cycle outcome");
            return;
        }
        if g.apply(outcome) {
            return;
        }
    }
}

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("monitor_cycles_total", "Monitoring cycles completed.");
        describe_counter!("monitor_tweets_total", "Tweets drafted from new summaries.");
        describe_counter!(
            "monitor_no_change_total",
            "Cycles that found nothing new (empty or unchanged)."
        );
        describe_counter!(
            "monitor_cycle_failures_total",
            "Cycles that failed and paused the monitor."
        );
        describe_gauge!("monitor_last_cycle_ts", "Unix ts when a cycle last finished.");
    });
}
