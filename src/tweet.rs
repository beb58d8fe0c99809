// src/tweet.rs
//! The drafted-post record and the drafting collaborator.

use anyhow::Result;
use chrono::{Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::news::{GroundingSource, NewsUpdate};

/// A drafted post. Immutable once assembled; `original_summary` is kept so
/// the next cycle can compare the freshly fetched summary against it.
/// Serialized camelCase for UI consumers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    pub id: String,
    pub text: String,
    pub sources: Vec<GroundingSource>,
    pub created_at: String,
    pub original_summary: String,
}

impl Tweet {
    /// Assemble a fresh record from generated text and the update that
    /// triggered it. The id is the UTC assembly instant at nanosecond
    /// precision; `created_at` is a local display time.
    pub fn assemble(text: String, update: NewsUpdate) -> Self {
        Self {
            id: Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
            text,
            sources: update.sources,
            created_at: Local::now().format("%H:%M:%S").to_string(),
            original_summary: update.summary,
        }
    }
}

/// Drafting collaborator: turns a news summary into post text.
#[async_trait::async_trait]
pub trait TweetWriter: Send + Sync {
    async fn draft(&self, summary: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_carries_summary_and_sources() {
        let update = NewsUpdate {
            summary: "S".into(),
            sources: vec![GroundingSource {
                uri: "https://a".into(),
                title: "A".into(),
            }],
        };
        let t = Tweet::assemble("drafted".into(), update);
        assert_eq!(t.text, "drafted");
        assert_eq!(t.original_summary, "S");
        assert_eq!(t.sources.len(), 1);
        assert!(!t.id.is_empty());
        assert!(!t.created_at.is_empty());
    }
}
