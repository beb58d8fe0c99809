// src/news.rs
//! Retrieval-side model: a grounded news update and its cited sources.

use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Placeholder uri for grounding chunks that carried none.
pub const FALLBACK_URI: &str = "#";
/// Placeholder title when neither title nor uri is usable.
pub const FALLBACK_TITLE: &str = "Untitled Source";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroundingSource {
    pub uri: String,
    pub title: String,
}

impl GroundingSource {
    /// Build a source from raw (possibly missing) fields. An empty string
    /// counts as missing. The title falls back to the raw uri, then to a
    /// fixed placeholder; the uri falls back to `"#"`.
    pub fn from_parts(uri: Option<String>, title: Option<String>) -> Self {
        let uri = uri.filter(|u| !u.is_empty());
        let title = title
            .filter(|t| !t.is_empty())
            .or_else(|| uri.clone())
            .unwrap_or_else(|| FALLBACK_TITLE.to_string());
        let uri = uri.unwrap_or_else(|| FALLBACK_URI.to_string());
        Self { uri, title }
    }
}

/// One retrieval result. `sources` holds at most one entry per uri.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsUpdate {
    pub summary: String,
    pub sources: Vec<GroundingSource>,
}

/// Collapse repeated uris to a single entry each: the slot keeps the
/// first-seen position, the payload keeps the last occurrence. Keyed-map
/// semantics, so running it twice changes nothing.
pub fn dedup_sources(sources: Vec<GroundingSource>) -> Vec<GroundingSource> {
    let mut slot: HashMap<String, usize> = HashMap::with_capacity(sources.len());
    let mut out: Vec<GroundingSource> = Vec::with_capacity(sources.len());
    for src in sources {
        match slot.get(&src.uri) {
            Some(&i) => out[i] = src,
            None => {
                slot.insert(src.uri.clone(), out.len());
                out.push(src);
            }
        }
    }
    out
}

/// Retrieval collaborator: returns the latest grounded update for a topic,
/// or `None` when nothing material was found.
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    async fn latest(&self, topic: &str) -> Result<Option<NewsUpdate>>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src(uri: &str, title: &str) -> GroundingSource {
        GroundingSource {
            uri: uri.into(),
            title: title.into(),
        }
    }

    #[test]
    fn from_parts_fills_missing_fields() {
        let s = GroundingSource::from_parts(None, None);
        assert_eq!(s.uri, FALLBACK_URI);
        assert_eq!(s.title, FALLBACK_TITLE);

        let s = GroundingSource::from_parts(Some("https://a".into()), None);
        assert_eq!(s.title, "https://a");

        // Empty strings behave like absent fields.
        let s = GroundingSource::from_parts(Some(String::new()), Some(String::new()));
        assert_eq!(s.uri, FALLBACK_URI);
        assert_eq!(s.title, FALLBACK_TITLE);
    }

    #[test]
    fn dedup_keeps_first_position_and_last_title() {
        let out = dedup_sources(vec![src("a", "T1"), src("b", "T2"), src("a", "T3")]);
        assert_eq!(out, vec![src("a", "T3"), src("b", "T2")]);
    }

    #[test]
    fn dedup_passes_distinct_uris_through() {
        let input = vec![src("a", "A"), src("b", "B")];
        assert_eq!(dedup_sources(input.clone()), input);
    }
}
