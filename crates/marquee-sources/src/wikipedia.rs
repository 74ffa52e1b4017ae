//! Wikipedia API client for the topic kind.
//!
//! Uses the MediaWiki action API: `list=search` for candidates, then a
//! `prop=info|extracts|pageimages` query for the article intro, canonical
//! URL, and thumbnail. Article titles double as detail ids.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use marquee_core::config::WikipediaConfig;
use marquee_core::{Result, SourceKind};

use crate::client::EntitySource;
use crate::error::SourceError;
use crate::types::{Candidate, EntityProfile, TopicProfile};

/// Search results requested per query.
const SEARCH_LIMIT: &str = "3";
/// Sentences of intro text requested per article.
const EXTRACT_SENTENCES: &str = "20";
/// Requested thumbnail width in pixels.
const THUMB_SIZE: &str = "500";

/// Wikipedia HTTP client.
pub struct WikipediaClient {
    client: reqwest::Client,
    endpoint: String,
}

impl WikipediaClient {
    pub fn new(config: &WikipediaConfig, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(SourceError::Http)?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    async fn search_topics(&self, query: &str) -> Result<Vec<Candidate>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", SEARCH_LIMIT),
                ("srprop", "snippet"),
            ])
            .send()
            .await
            .map_err(SourceError::Http)?;

        if !response.status().is_success() {
            warn!(status = %response.status(), query, "Wikipedia search returned an error status");
            return Ok(Vec::new());
        }

        let parsed: SearchResponse = response.json().await.map_err(SourceError::Http)?;
        Ok(parsed
            .query
            .map(|q| q.search.into_iter().map(topic_candidate).collect())
            .unwrap_or_default())
    }

    async fn page_detail(&self, title: &str) -> Result<Option<TopicProfile>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("titles", title),
                ("prop", "info|extracts|pageimages"),
                ("inprop", "url"),
                ("exsentences", EXTRACT_SENTENCES),
                ("explaintext", "1"),
                ("pithumbsize", THUMB_SIZE),
            ])
            .send()
            .await
            .map_err(SourceError::Http)?;

        if !response.status().is_success() {
            warn!(status = %response.status(), title, "Wikipedia page fetch returned an error status");
            return Ok(None);
        }

        let parsed: PageResponse = response.json().await.map_err(SourceError::Http)?;
        let pages = match parsed.query {
            Some(q) => q.pages,
            None => return Ok(None),
        };
        // The API keys pages by page id; "-1" marks a missing title.
        if pages.contains_key("-1") {
            return Ok(None);
        }
        Ok(pages.into_values().next().and_then(topic_profile))
    }
}

#[async_trait]
impl EntitySource for WikipediaClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Topic
    }

    async fn search(&self, name: &str) -> Result<Vec<Candidate>> {
        self.search_topics(name).await
    }

    async fn detail(&self, id: &str) -> Result<Option<EntityProfile>> {
        Ok(self.page_detail(id).await?.map(EntityProfile::Topic))
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    query: Option<PageQuery>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: Option<String>,
    /// Present (as an empty marker) when the title does not exist.
    missing: Option<serde_json::Value>,
    fullurl: Option<String>,
    extract: Option<String>,
    thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    source: Option<String>,
}

// =============================================================================
// Mapping
// =============================================================================

fn topic_candidate(hit: SearchHit) -> Candidate {
    Candidate {
        id: hit.title.clone(),
        name: hit.title,
        summary: hit.snippet.map(|s| strip_search_markup(&s)),
        date: None,
        rating: None,
        image_url: None,
    }
}

/// Remove the `searchmatch` highlight spans MediaWiki embeds in snippets.
fn strip_search_markup(snippet: &str) -> String {
    snippet
        .replace("<span class=\"searchmatch\">", "")
        .replace("</span>", "")
}

fn topic_profile(page: Page) -> Option<TopicProfile> {
    if page.missing.is_some() {
        return None;
    }
    let title = page.title?;
    Some(TopicProfile {
        url: page
            .fullurl
            .or_else(|| Some(article_url(&title))),
        extract: page.extract.unwrap_or_default(),
        thumbnail_url: page.thumbnail.and_then(|t| t.source),
        title,
    })
}

/// Fallback article URL when the API response lacks `fullurl`.
pub(crate) fn article_url(title: &str) -> String {
    format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_"))
}
