// Request/response schema of the retrieval service
use serde::{Deserialize, Serialize};

use crate::index::SearchHit;

/// Number of results returned when the caller doesn't ask for a count
pub const DEFAULT_TOP_K: i64 = 3;

fn default_top_k() -> i64 {
    DEFAULT_TOP_K
}

/// A question to answer from the indexed passages.
///
/// `top_k` stays signed so that zero and negative counts arriving off the
/// wire are rejected as invalid input instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(rename = "query")]
    pub text: String,
    #[serde(default = "default_top_k")]
    pub top_k: i64,
}

impl Query {
    pub fn new(text: impl Into<String>, top_k: i64) -> Self {
        Self {
            text: text.into(),
            top_k,
        }
    }

    /// Query with the default result count
    pub fn with_default_top_k(text: impl Into<String>) -> Self {
        Self::new(text, DEFAULT_TOP_K)
    }
}

/// Client-facing result: one retrieved passage and its similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub text: String,
    pub score: f32,
}

impl SearchResult {
    /// Map a raw index hit. A payload without a string `"text"` entry yields
    /// an empty `text`; the score is carried over unchanged.
    pub fn from_hit(hit: &SearchHit) -> Self {
        let text = match hit.text() {
            Some(text) => text.to_string(),
            None => {
                if hit.payload.contains_key(crate::index::TEXT_PAYLOAD_KEY) {
                    tracing::warn!(id = %hit.id, "payload \"text\" is not a string, using empty text");
                } else {
                    tracing::debug!(id = %hit.id, "payload has no \"text\", using empty text");
                }
                String::new()
            }
        };

        Self {
            text,
            score: hit.score,
        }
    }
}

/// Map hits to results in index order, keeping at most `limit` of them
pub fn map_hits(hits: &[SearchHit], limit: usize) -> Vec<SearchResult> {
    hits.iter().take(limit).map(SearchResult::from_hit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit(id: &str, score: f32, payload: serde_json::Value) -> SearchHit {
        SearchHit::new(id, score, payload.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn test_query_default_top_k() {
        let query: Query = serde_json::from_value(json!({"query": "When is sports day?"})).unwrap();
        assert_eq!(query.top_k, 3);
        assert_eq!(query.text, "When is sports day?");
    }

    #[test]
    fn test_query_accepts_negative_top_k() {
        let query: Query = serde_json::from_value(json!({"query": "x", "top_k": -2})).unwrap();
        assert_eq!(query.top_k, -2);
    }

    #[test]
    fn test_missing_text_defaults_to_empty() {
        let result = SearchResult::from_hit(&hit("1", 0.42, json!({"title": "Calendar"})));
        assert_eq!(result.text, "");
        assert_eq!(result.score, 0.42);
    }

    #[test]
    fn test_non_string_text_defaults_to_empty() {
        let result = SearchResult::from_hit(&hit("1", 0.5, json!({"text": ["a", "b"]})));
        assert_eq!(result.text, "");
        assert_eq!(result.score, 0.5);
    }

    #[test]
    fn test_map_hits_keeps_order_and_ties() {
        let hits = vec![
            hit("a", 0.8, json!({"text": "first"})),
            hit("b", 0.8, json!({"text": "second"})),
            hit("c", 0.9, json!({"text": "third"})),
        ];

        let results = map_hits(&hits, 10);
        let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_map_hits_truncates() {
        let hits = vec![
            hit("a", 0.9, json!({"text": "a"})),
            hit("b", 0.8, json!({"text": "b"})),
            hit("c", 0.7, json!({"text": "c"})),
        ];
        assert_eq!(map_hits(&hits, 2).len(), 2);
    }

    #[test]
    fn test_search_result_json_shape() {
        let result = SearchResult {
            text: "School starts at 8:00 AM".to_string(),
            score: 0.91,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["text"], "School starts at 8:00 AM");
        assert!((value["score"].as_f64().unwrap() - 0.91).abs() < 1e-6);
    }
}
