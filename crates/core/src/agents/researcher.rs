//! # Researcher Agent
//!
//! Turns a topic into search queries, runs them against the search
//! provider, and consolidates the raw results into research notes. A
//! single failing query is skipped; the step only fails when every query
//! fails.

use serde::{Deserialize, Serialize};

use super::prompts;
use crate::error::WorkflowError;
use crate::models::LanguageModel;
use crate::tools::{SearchHit, SearchProvider};

/// Hard cap on generated queries per run.
const MAX_QUERIES: usize = 5;

/// Snippet length cap used when building the consolidation corpus.
const SNIPPET_CHARS: usize = 500;

/// Source count cap used when building the consolidation corpus.
const MAX_SOURCES: usize = 10;

/// Results for one executed query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResults {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

/// Everything the researcher hands to the writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchFindings {
    /// Queries that were generated (including failed ones).
    pub queries: Vec<String>,
    /// Results for the queries that succeeded.
    pub results: Vec<QueryResults>,
    /// Consolidated research notes.
    pub notes: String,
}

pub struct ResearcherAgent;

impl ResearcherAgent {
    /// Run the full research step for a topic.
    #[tracing::instrument(skip(llm, search))]
    pub async fn run(
        llm: &dyn LanguageModel,
        search: &dyn SearchProvider,
        topic: &str,
        max_results_per_query: usize,
    ) -> Result<ResearchFindings, WorkflowError> {
        let queries = Self::generate_queries(llm, topic).await?;
        tracing::info!(count = queries.len(), "generated search queries");

        let mut results: Vec<QueryResults> = Vec::new();
        for query in &queries {
            match search.search(query, max_results_per_query).await {
                Ok(hits) => {
                    tracing::debug!(query = %query, hits = hits.len(), "query ok");
                    results.push(QueryResults {
                        query: query.clone(),
                        hits,
                    });
                }
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "query failed, skipping");
                }
            }
        }

        if results.is_empty() {
            return Err(WorkflowError::Collaborator {
                collaborator: "web search",
                reason: format!("all {} queries failed", queries.len()),
            });
        }

        let notes = Self::consolidate(llm, topic, &results).await?;

        Ok(ResearchFindings {
            queries,
            results,
            notes,
        })
    }

    /// Ask the model for queries, one per line. Falls back to the bare
    /// topic when nothing usable comes back.
    async fn generate_queries(
        llm: &dyn LanguageModel,
        topic: &str,
    ) -> Result<Vec<String>, WorkflowError> {
        let prompt = format!("Topic: {}", topic);
        let response = llm.generate(prompts::RESEARCHER_QUERIES, &prompt).await?;
        Ok(parse_queries(&response, topic))
    }

    /// Consolidate the successful results into notes.
    async fn consolidate(
        llm: &dyn LanguageModel,
        topic: &str,
        results: &[QueryResults],
    ) -> Result<String, WorkflowError> {
        let corpus = build_corpus(results);
        let prompt = format!("Topic: {}\n\nSearch results:\n\n{}", topic, corpus);
        let notes = llm.generate(prompts::RESEARCHER_NOTES, &prompt).await?;

        if notes.trim().is_empty() {
            return Err(WorkflowError::Collaborator {
                collaborator: "language model",
                reason: "empty research notes".to_string(),
            });
        }
        Ok(notes)
    }
}

/// Parse the query-planner response: one query per line, list markers
/// stripped, capped at [`MAX_QUERIES`]. An unusable response yields the
/// bare topic as the single query.
fn parse_queries(response: &str, topic: &str) -> Vec<String> {
    let queries: Vec<String> = response
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
                .trim_start_matches(['-', '*'])
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .take(MAX_QUERIES)
        .collect();

    if queries.is_empty() {
        vec![topic.to_string()]
    } else {
        queries
    }
}

/// Flatten results into a source list for the consolidation prompt,
/// capped at [`MAX_SOURCES`] sources and [`SNIPPET_CHARS`] chars each.
fn build_corpus(results: &[QueryResults]) -> String {
    let mut corpus = String::new();
    let mut count = 0usize;

    'outer: for qr in results {
        for hit in &qr.hits {
            if count >= MAX_SOURCES {
                break 'outer;
            }
            count += 1;
            let snippet: String = hit.snippet.chars().take(SNIPPET_CHARS).collect();
            corpus.push_str(&format!(
                "[{}] {}\nURL: {}\n{}\n\n",
                count, hit.title, hit.url, snippet
            ));
        }
    }

    if corpus.is_empty() {
        corpus.push_str("(no search results were returned)\n");
    }
    corpus
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedModel {
        responses: Mutex<VecDeque<String>>,
    }

    impl ScriptedModel {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, WorkflowError> {
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted model ran out of responses"))
        }
    }

    /// Fails queries containing the given marker, succeeds otherwise.
    struct FlakySearch {
        fail_marker: &'static str,
    }

    #[async_trait]
    impl SearchProvider for FlakySearch {
        async fn search(
            &self,
            query: &str,
            _max_results: usize,
        ) -> Result<Vec<SearchHit>, WorkflowError> {
            if query.contains(self.fail_marker) {
                return Err(WorkflowError::Collaborator {
                    collaborator: "web search",
                    reason: "backend unavailable".to_string(),
                });
            }
            Ok(vec![SearchHit {
                title: format!("result for {}", query),
                url: "https://example.com".to_string(),
                snippet: "snippet".to_string(),
            }])
        }
    }

    #[test]
    fn test_parse_queries_strips_markers_and_caps() {
        let response = "1. rust async runtimes\n- tokio vs async-std\n\n* actor model rust\n2) rust channels\nrust executors\nrust futures history";
        let queries = parse_queries(response, "rust");
        assert_eq!(queries.len(), 5);
        assert_eq!(queries[0], "rust async runtimes");
        assert_eq!(queries[1], "tokio vs async-std");
        assert_eq!(queries[2], "actor model rust");
    }

    #[test]
    fn test_parse_queries_falls_back_to_topic() {
        let queries = parse_queries("   \n\n", "quantum computing");
        assert_eq!(queries, vec!["quantum computing".to_string()]);
    }

    #[test]
    fn test_corpus_truncates_snippets_and_caps_sources() {
        let long = "x".repeat(2000);
        let hits: Vec<SearchHit> = (0..15)
            .map(|i| SearchHit {
                title: format!("t{}", i),
                url: format!("https://example.com/{}", i),
                snippet: long.clone(),
            })
            .collect();
        let results = vec![QueryResults {
            query: "q".to_string(),
            hits,
        }];
        let corpus = build_corpus(&results);
        assert!(corpus.contains("[10]"));
        assert!(!corpus.contains("[11]"));
        // Each snippet is cut to 500 chars.
        assert!(!corpus.contains(&"x".repeat(501)));
        assert!(corpus.contains(&"x".repeat(500)));
    }

    #[tokio::test]
    async fn test_partial_query_failure_is_tolerated() {
        let llm = ScriptedModel::new(&[
            "good one\nFAIL two\ngood three\nFAIL four\ngood five",
            "consolidated notes",
        ]);
        let search = FlakySearch {
            fail_marker: "FAIL",
        };

        let findings = ResearcherAgent::run(&llm, &search, "topic", 10)
            .await
            .unwrap();
        assert_eq!(findings.queries.len(), 5);
        assert_eq!(findings.results.len(), 3);
        assert_eq!(findings.notes, "consolidated notes");
    }

    #[tokio::test]
    async fn test_all_queries_failing_is_an_error() {
        let llm = ScriptedModel::new(&["FAIL a\nFAIL b"]);
        let search = FlakySearch {
            fail_marker: "FAIL",
        };

        let err = ResearcherAgent::run(&llm, &search, "topic", 10)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("all 2 queries failed"));
    }

    #[tokio::test]
    async fn test_zero_hit_query_still_counts_as_success() {
        struct EmptySearch;
        #[async_trait]
        impl SearchProvider for EmptySearch {
            async fn search(
                &self,
                _query: &str,
                _max_results: usize,
            ) -> Result<Vec<SearchHit>, WorkflowError> {
                Ok(vec![])
            }
        }

        let llm = ScriptedModel::new(&["only query", "notes"]);
        let findings = ResearcherAgent::run(&llm, &EmptySearch, "topic", 10)
            .await
            .unwrap();
        assert_eq!(findings.results.len(), 1);
        assert!(findings.results[0].hits.is_empty());
    }
}
