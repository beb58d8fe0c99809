// src/gemini.rs
//! Gemini-backed collaborators: grounded news retrieval and tweet drafting.
//! One HTTP client serves both roles; `AI_TEST_MODE=mock` swaps in
//! deterministic stand-ins for local runs without an API key.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::MonitorConfig;
use crate::news::{dedup_sources, GroundingSource, NewsSource, NewsUpdate};
use crate::tweet::TweetWriter;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

fn news_prompt(topic: &str) -> String {
    format!(
        "Provide a concise, single-paragraph summary of the absolute latest news or breaking \
         event about \"{topic}\". Focus only on the most recent development within the last few hours."
    )
}

fn tweet_prompt(summary: &str) -> String {
    format!(
        "Based on the following news summary, write a compelling and concise tweet. The tweet \
         must be under 280 characters and include 2-3 relevant hashtags.\n\nNews Summary: \"{summary}\""
    )
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(cfg: &MonitorConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("news-tweet-monitor/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(25))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        }
    }

    async fn generate(&self, prompt: &str, with_search: bool) -> Result<GenerateContentResp> {
        if self.api_key.is_empty() {
            return Err(anyhow!("GEMINI_API_KEY is not set"));
        }

        let req = GenerateContentReq {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            tools: with_search.then(|| vec![Tool::google_search()]),
        };

        let url = format!("{API_BASE}/{}:generateContent", self.model);
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await
            .context("calling Gemini")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(anyhow!("Gemini returned {status}: {snippet}"));
        }

        resp.json::<GenerateContentResp>()
            .await
            .context("decoding Gemini response")
    }
}

#[async_trait::async_trait]
impl NewsSource for GeminiClient {
    async fn latest(&self, topic: &str) -> Result<Option<NewsUpdate>> {
        let resp = self
            .generate(&news_prompt(topic), true)
            .await
            .context("Failed to fetch news from Gemini")?;
        Ok(parse_news_update(&resp))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[async_trait::async_trait]
impl TweetWriter for GeminiClient {
    async fn draft(&self, summary: &str) -> Result<String> {
        let resp = self
            .generate(&tweet_prompt(summary), false)
            .await
            .context("Failed to generate tweet from Gemini")?;
        let text = resp.text().trim().to_string();
        if text.is_empty() {
            return Err(anyhow!("Gemini returned an empty tweet"));
        }
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// Map a raw response to an update: concatenated candidate text as the
/// summary (blank means no update), web grounding chunks as sources.
fn parse_news_update(resp: &GenerateContentResp) -> Option<NewsUpdate> {
    let summary = resp.text().trim().to_string();
    if summary.is_empty() {
        return None;
    }

    let raw: Vec<GroundingSource> = resp
        .candidates
        .first()
        .and_then(|c| c.grounding_metadata.as_ref())
        .map(|m| {
            m.grounding_chunks
                .iter()
                .filter_map(|chunk| chunk.web.as_ref())
                .map(|web| GroundingSource::from_parts(web.uri.clone(), web.title.clone()))
                .collect()
        })
        .unwrap_or_default();

    Some(NewsUpdate {
        summary,
        sources: dedup_sources(raw),
    })
}

/// Wire the collaborator pair for the service. `AI_TEST_MODE=mock` returns
/// deterministic mocks; otherwise one Gemini client serves both roles.
pub fn build_collaborators(cfg: &MonitorConfig) -> (Arc<dyn NewsSource>, Arc<dyn TweetWriter>) {
    if std::env::var("AI_TEST_MODE").map(|v| v == "mock").unwrap_or(false) {
        tracing::info!("AI_TEST_MODE=mock, using canned collaborators");
        return (Arc::new(MockNewsSource::default()), Arc::new(MockTweetWriter::default()));
    }
    let client = Arc::new(GeminiClient::new(cfg));
    let news: Arc<dyn NewsSource> = client.clone();
    let writer: Arc<dyn TweetWriter> = client;
    (news, writer)
}

/// Always returns the same update, so a mock run drafts exactly one tweet
/// and then reports "unchanged" forever.
#[derive(Clone)]
pub struct MockNewsSource {
    pub update: NewsUpdate,
}

impl Default for MockNewsSource {
    fn default() -> Self {
        Self {
            update: NewsUpdate {
                summary: "Canned summary for test mode.".to_string(),
                sources: vec![GroundingSource {
                    uri: "https://example.com/mock".to_string(),
                    title: "Mock Source".to_string(),
                }],
            },
        }
    }
}

#[async_trait::async_trait]
impl NewsSource for MockNewsSource {
    async fn latest(&self, _topic: &str) -> Result<Option<NewsUpdate>> {
        Ok(Some(self.update.clone()))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[derive(Clone)]
pub struct MockTweetWriter {
    pub text: String,
}

impl Default for MockTweetWriter {
    fn default() -> Self {
        Self {
            text: "Canned tweet (test mode). #mock".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl TweetWriter for MockTweetWriter {
    async fn draft(&self, _summary: &str) -> Result<String> {
        Ok(self.text.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ------------------------------------------------------------
// Wire types (generateContent request/response, camelCase JSON)
// ------------------------------------------------------------

#[derive(Serialize)]
struct GenerateContentReq<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Tool {
    #[serde(rename = "googleSearch")]
    google_search: EmptyObject,
}

impl Tool {
    fn google_search() -> Self {
        Self {
            google_search: EmptyObject {},
        }
    }
}

#[derive(Serialize)]
struct EmptyObject {}

#[derive(Debug, Deserialize)]
struct GenerateContentResp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResp {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}
