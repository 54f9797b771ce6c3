//! # Web Search
//!
//! The `SearchProvider` collaborator seam and its SearXNG-backed
//! production implementation. Endpoints are tried in order: a configured
//! instance, then public instances, then localhost.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::WorkflowError;

/// One search result: title, url, snippet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// The web-search collaborator contract.
///
/// Zero hits is a valid result; `Err` means the query itself could not
/// be executed.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize)
        -> Result<Vec<SearchHit>, WorkflowError>;
}

/// Production `SearchProvider` over SearXNG's JSON API.
pub struct SearxngSearch {
    client: reqwest::Client,
    endpoints: Vec<String>,
    timeout_secs: u64,
}

impl SearxngSearch {
    /// Build a search client. `custom_url` takes priority over the
    /// public-instance list.
    pub fn new(custom_url: Option<&str>, timeout_secs: u64) -> Result<Self, WorkflowError> {
        let mut endpoints: Vec<String> = Vec::new();

        if let Some(url) = custom_url {
            endpoints.push(format!("{}/search", url.trim_end_matches('/')));
        }

        // Public SearXNG instances (subset of reliable ones)
        // Full list: https://searx.space/
        endpoints.extend([
            "https://searx.be/search".to_string(),
            "https://search.sapti.me/search".to_string(),
            "https://searx.tiekoetter.com/search".to_string(),
        ]);

        // Local fallback
        endpoints.push("http://localhost:8888/search".to_string());
        endpoints.push("http://127.0.0.1:8888/search".to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| WorkflowError::Configuration(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            endpoints,
            timeout_secs,
        })
    }
}

/// Map a SearXNG JSON response body to hits, capped at `max_results`.
fn parse_results(body: &serde_json::Value, max_results: usize) -> Option<Vec<SearchHit>> {
    let results = body.get("results")?.as_array()?;
    let hits = results
        .iter()
        .take(max_results)
        .map(|r| SearchHit {
            title: r
                .get("title")
                .and_then(|t| t.as_str())
                .unwrap_or("")
                .to_string(),
            url: r
                .get("url")
                .and_then(|u| u.as_str())
                .unwrap_or("")
                .to_string(),
            snippet: r
                .get("content")
                .and_then(|c| c.as_str())
                .unwrap_or("")
                .to_string(),
        })
        .collect();
    Some(hits)
}

#[async_trait]
impl SearchProvider for SearxngSearch {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, WorkflowError> {
        let mut timed_out = false;

        for endpoint in &self.endpoints {
            let url = format!("{}?q={}&format=json", endpoint, urlencoding::encode(query));

            match self.client.get(&url).send().await {
                Ok(response) => {
                    if let Ok(body) = response.json::<serde_json::Value>().await {
                        if let Some(hits) = parse_results(&body, max_results) {
                            tracing::debug!(endpoint = %endpoint, hits = hits.len(), "search ok");
                            return Ok(hits);
                        }
                    }
                }
                Err(e) => {
                    timed_out |= e.is_timeout();
                    tracing::debug!(endpoint = %endpoint, error = %e, "search endpoint failed");
                }
            }
        }

        if timed_out {
            Err(WorkflowError::CollaboratorTimeout {
                collaborator: "web search",
                seconds: self.timeout_secs,
            })
        } else {
            Err(WorkflowError::Collaborator {
                collaborator: "web search",
                reason: "no search backend available".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_results_maps_fields() {
        let body = json!({
            "results": [
                {"title": "Rust", "url": "https://rust-lang.org", "content": "A language"},
                {"title": "Crates", "url": "https://crates.io", "content": "Registry"}
            ]
        });
        let hits = parse_results(&body, 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Rust");
        assert_eq!(hits[1].snippet, "Registry");
    }

    #[test]
    fn test_parse_results_caps_at_max() {
        let results: Vec<_> = (0..20)
            .map(|i| json!({"title": format!("r{}", i), "url": "", "content": ""}))
            .collect();
        let body = json!({ "results": results });
        let hits = parse_results(&body, 5).unwrap();
        assert_eq!(hits.len(), 5);
    }

    #[test]
    fn test_parse_results_tolerates_missing_fields() {
        let body = json!({"results": [{"url": "https://example.com"}]});
        let hits = parse_results(&body, 10).unwrap();
        assert_eq!(hits[0].title, "");
        assert_eq!(hits[0].url, "https://example.com");
    }

    #[test]
    fn test_parse_results_rejects_bad_shape() {
        assert!(parse_results(&json!({"error": "nope"}), 10).is_none());
        assert!(parse_results(&json!({"results": "not-a-list"}), 10).is_none());
    }

    #[test]
    fn test_custom_url_is_first_endpoint() {
        let search = SearxngSearch::new(Some("https://searx.internal/"), 30).unwrap();
        assert_eq!(search.endpoints[0], "https://searx.internal/search");
    }
}
