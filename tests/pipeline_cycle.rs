// tests/pipeline_cycle.rs
//
// run_cycle against scripted collaborators: change detection, empty
// retrieval, and collapsing collaborator failures into Failed outcomes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use news_tweet_monitor::news::{GroundingSource, NewsSource, NewsUpdate};
use news_tweet_monitor::pipeline::{run_cycle, CycleOutcome, NoChangeReason};
use news_tweet_monitor::tweet::TweetWriter;

struct ScriptedNews {
    update: Option<NewsUpdate>,
    fail: Option<&'static str>,
    calls: AtomicUsize,
}

impl ScriptedNews {
    fn returning(update: Option<NewsUpdate>) -> Self {
        Self {
            update,
            fail: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(msg: &'static str) -> Self {
        Self {
            update: None,
            fail: Some(msg),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl NewsSource for ScriptedNews {
    async fn latest(&self, _topic: &str) -> Result<Option<NewsUpdate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail {
            Some(msg) => Err(anyhow!(msg)),
            None => Ok(self.update.clone()),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct CountingWriter {
    fail: bool,
    calls: AtomicUsize,
    last_input: Mutex<Option<String>>,
}

impl CountingWriter {
    fn ok() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
            last_input: Mutex::new(None),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
            last_input: Mutex::new(None),
        }
    }
}

#[async_trait]
impl TweetWriter for CountingWriter {
    async fn draft(&self, summary: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = Some(summary.to_string());
        if self.fail {
            Err(anyhow!("generation exploded"))
        } else {
            Ok(format!("tweet: {summary}"))
        }
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

fn update(summary: &str) -> NewsUpdate {
    NewsUpdate {
        summary: summary.into(),
        sources: vec![GroundingSource {
            uri: "https://a".into(),
            title: "A".into(),
        }],
    }
}

#[tokio::test]
async fn empty_retrieval_is_no_change_not_failure() {
    let news = ScriptedNews::returning(None);
    let writer = CountingWriter::ok();

    let outcome = run_cycle(&news, &writer, "ai", None).await;
    assert!(matches!(
        outcome,
        CycleOutcome::NoChange(NoChangeReason::NothingFound)
    ));
    assert_eq!(writer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn blank_summary_counts_as_nothing_found() {
    let news = ScriptedNews::returning(Some(update("   ")));
    let writer = CountingWriter::ok();

    let outcome = run_cycle(&news, &writer, "ai", None).await;
    assert!(matches!(
        outcome,
        CycleOutcome::NoChange(NoChangeReason::NothingFound)
    ));
}

#[tokio::test]
async fn unchanged_summary_suppresses_generation() {
    let news = ScriptedNews::returning(Some(update("S")));
    let writer = CountingWriter::ok();

    let outcome = run_cycle(&news, &writer, "ai", Some("S")).await;
    assert!(matches!(
        outcome,
        CycleOutcome::NoChange(NoChangeReason::Unchanged)
    ));
    assert_eq!(writer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn changed_summary_generates_exactly_once() {
    let news = ScriptedNews::returning(Some(update("S2")));
    let writer = CountingWriter::ok();

    let outcome = run_cycle(&news, &writer, "ai", Some("S1")).await;
    let tweet = match outcome {
        CycleOutcome::Generated(t) => t,
        other => panic!("expected Generated, got {other:?}"),
    };

    assert_eq!(writer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(writer.last_input.lock().unwrap().as_deref(), Some("S2"));
    assert_eq!(tweet.original_summary, "S2");
    assert_eq!(tweet.text, "tweet: S2");
    assert_eq!(tweet.sources.len(), 1);
}

#[tokio::test]
async fn first_cycle_with_no_prior_summary_generates() {
    let news = ScriptedNews::returning(Some(update("S")));
    let writer = CountingWriter::ok();

    let outcome = run_cycle(&news, &writer, "ai", None).await;
    assert!(matches!(outcome, CycleOutcome::Generated(_)));
}

#[tokio::test]
async fn retrieval_failure_becomes_failed_outcome() {
    let news = ScriptedNews::failing("retrieval down");
    let writer = CountingWriter::ok();

    let outcome = run_cycle(&news, &writer, "ai", None).await;
    match outcome {
        CycleOutcome::Failed(msg) => assert!(msg.contains("retrieval down")),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(writer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn generation_failure_becomes_failed_outcome() {
    let news = ScriptedNews::returning(Some(update("S")));
    let writer = CountingWriter::failing();

    let outcome = run_cycle(&news, &writer, "ai", None).await;
    match outcome {
        CycleOutcome::Failed(msg) => assert!(msg.contains("generation exploded")),
        other => panic!("expected Failed, got {other:?}"),
    }
}
