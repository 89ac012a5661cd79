//! Web search condensed for speech
//!
//! Queries Brave or Serper and turns the top snippets into a short paragraph
//! suitable for text-to-speech.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::assistant::Searcher;
use crate::config::ApiKeys;
use crate::{Error, Result};

/// Snippets folded into one spoken summary
const SUMMARY_RESULTS: usize = 3;

/// Search provider configuration
#[derive(Debug, Clone)]
pub enum SearchProvider {
    /// Brave Search API
    Brave {
        /// API key for Brave Search
        api_key: String,
    },
    /// Serper (Google) Search API
    Serper {
        /// API key for Serper
        api_key: String,
    },
}

/// Web search client
pub struct WebSearch {
    provider: SearchProvider,
    client: reqwest::Client,
}

/// Search result from web search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Deserialize)]
struct BraveSearchResponse {
    web: Option<BraveWebResults>,
}

#[derive(Debug, Deserialize)]
struct BraveWebResults {
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    title: String,
    url: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct SerperSearchResponse {
    organic: Option<Vec<SerperResult>>,
}

#[derive(Debug, Deserialize)]
struct SerperResult {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
}

impl WebSearch {
    /// Search with Brave
    #[must_use]
    pub fn new_brave(api_key: String) -> Self {
        Self {
            provider: SearchProvider::Brave { api_key },
            client: reqwest::Client::new(),
        }
    }

    /// Search with Serper
    #[must_use]
    pub fn new_serper(api_key: String) -> Self {
        Self {
            provider: SearchProvider::Serper { api_key },
            client: reqwest::Client::new(),
        }
    }

    /// Pick a provider from the available keys, preferring Brave
    #[must_use]
    pub fn from_keys(keys: &ApiKeys) -> Option<Self> {
        keys.brave
            .clone()
            .map(Self::new_brave)
            .or_else(|| keys.serper.clone().map(Self::new_serper))
    }

    /// Perform a web search
    ///
    /// # Errors
    ///
    /// Returns error if the search request fails or response parsing fails
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let results = match &self.provider {
            SearchProvider::Brave { api_key } => self.search_brave(api_key, query, limit).await,
            SearchProvider::Serper { api_key } => self.search_serper(api_key, query, limit).await,
        }
        .map_err(|e| match e {
            Error::Http(e) => Error::Search(e.to_string()),
            other => other,
        })?;

        tracing::debug!(query, results = results.len(), "web search complete");
        Ok(results)
    }

    async fn search_brave(
        &self,
        api_key: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .get("https://api.search.brave.com/res/v1/web/search")
            .header("X-Subscription-Token", api_key)
            .query(&[("q", query), ("count", &limit.to_string())])
            .send()
            .await?
            .error_for_status()?;

        let brave_response: BraveSearchResponse = response.json().await?;

        Ok(brave_response
            .web
            .map(|web| {
                web.results
                    .into_iter()
                    .map(|r| SearchResult {
                        title: r.title,
                        url: r.url,
                        snippet: r.description,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn search_serper(
        &self,
        api_key: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .post("https://google.serper.dev/search")
            .header("X-API-KEY", api_key)
            .json(&SerperRequest { q: query, num: limit })
            .send()
            .await?
            .error_for_status()?;

        let serper_response: SerperSearchResponse = response.json().await?;

        Ok(serper_response
            .organic
            .map(|organic| {
                organic
                    .into_iter()
                    .map(|r| SearchResult {
                        title: r.title,
                        url: r.link,
                        snippet: r.snippet,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl Searcher for WebSearch {
    async fn summarize(&self, query: &str) -> Result<String> {
        let results = self.search(query, SUMMARY_RESULTS).await?;
        Ok(summarize_results(query, &results))
    }
}

/// Condense the top results into one paragraph
#[must_use]
pub fn summarize_results(query: &str, results: &[SearchResult]) -> String {
    let sentences: Vec<String> = results
        .iter()
        .map(|r| clean_snippet(&r.snippet))
        .filter(|s| !s.is_empty())
        .take(SUMMARY_RESULTS)
        .collect();

    if sentences.is_empty() {
        return format!("I couldn't find anything about {query}.");
    }

    sentences.join(" ")
}

/// Strip markup and make the snippet end like a sentence
fn clean_snippet(snippet: &str) -> String {
    let mut text = String::with_capacity(snippet.len());
    let mut in_tag = false;
    for c in snippet.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    let text = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches("...")
        .trim_end_matches('…')
        .trim()
        .to_string();

    if text.is_empty() || text.ends_with(['.', '!', '?']) {
        text
    } else {
        format!("{text}.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(snippet: &str) -> SearchResult {
        SearchResult {
            title: "t".into(),
            url: "https://example.com".into(),
            snippet: snippet.into(),
        }
    }

    #[test]
    fn test_provider_selection() {
        let keys = ApiKeys {
            brave: Some("b".into()),
            serper: Some("s".into()),
            ..ApiKeys::default()
        };
        let search = WebSearch::from_keys(&keys).unwrap();
        assert!(matches!(search.provider, SearchProvider::Brave { .. }));

        let keys = ApiKeys {
            serper: Some("s".into()),
            ..ApiKeys::default()
        };
        let search = WebSearch::from_keys(&keys).unwrap();
        assert!(matches!(search.provider, SearchProvider::Serper { .. }));

        assert!(WebSearch::from_keys(&ApiKeys::default()).is_none());
    }

    #[test]
    fn no_results() {
        assert_eq!(
            summarize_results("rust crabs", &[]),
            "I couldn't find anything about rust crabs."
        );
    }

    #[test]
    fn joins_top_three_snippets() {
        let results = [
            result("Rust is a <strong>systems</strong> language"),
            result("Ferris is the mascot."),
            result(""),
            result("Cargo builds   crates..."),
            result("Never reached"),
        ];
        assert_eq!(
            summarize_results("rust", &results),
            "Rust is a systems language. Ferris is the mascot. Cargo builds crates."
        );
    }
}
