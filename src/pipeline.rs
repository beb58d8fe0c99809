// src/pipeline.rs
//! One fetch-compare-generate cycle. Stateless: the caller hands in the
//! previously accepted summary, the outcome hands back what to do with it.

use crate::news::NewsSource;
use crate::tweet::{Tweet, TweetWriter};

/// Why a cycle produced nothing new.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoChangeReason {
    /// Retrieval returned nothing, or a blank summary.
    NothingFound,
    /// The fetched summary matches the last accepted one exactly.
    Unchanged,
}

#[derive(Debug)]
pub enum CycleOutcome {
    NoChange(NoChangeReason),
    Generated(Tweet),
    Failed(String),
}

/// Run a single monitoring cycle for `topic`.
///
/// The writer is invoked only when the fetched summary is non-blank and
/// differs from `last_accepted` by exact string comparison. A `Generated`
/// outcome therefore never carries an `original_summary` equal to
/// `last_accepted`. Collaborator failures of either kind collapse into
/// `Failed(message)`; retry policy lives entirely with the caller.
pub async fn run_cycle(
    news: &dyn NewsSource,
    writer: &dyn TweetWriter,
    topic: &str,
    last_accepted: Option<&str>,
) -> CycleOutcome {
    let update = match news.latest(topic).await {
        Ok(u) => u,
        Err(e) => return CycleOutcome::Failed(format!("{e:#}")),
    };

    let update = match update {
        Some(u) if !u.summary.trim().is_empty() => u,
        _ => {
            tracing::debug!(topic, "no material update");
            return CycleOutcome::NoChange(NoChangeReason::NothingFound);
        }
    };

    if last_accepted.is_some_and(|prev| prev == update.summary) {
        tracing::debug!(topic, "summary unchanged");
        return CycleOutcome::NoChange(NoChangeReason::Unchanged);
    }

    let text = match writer.draft(&update.summary).await {
        Ok(t) => t,
        Err(e) => return CycleOutcome::Failed(format!("{e:#}")),
    };

    CycleOutcome::Generated(Tweet::assemble(text, update))
}
