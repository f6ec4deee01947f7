// Vector index client backed by a Qdrant server (gRPC)
use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, vectors_config::Config as VectorsConfigKind, PointId,
    ScoredPoint, SearchPointsBuilder, Value as QdrantValue,
};
use qdrant_client::{Qdrant, QdrantError};
use serde_json::{Map, Value as JsonValue};

use super::{SearchHit, VectorIndex};
use crate::config::IndexConfig;
use crate::errors::IndexError;

/// Qdrant client handle; cheap to share, safe for concurrent use
pub struct QdrantIndex {
    client: Qdrant,
    url: String,
}

impl QdrantIndex {
    /// Build a client for the configured server. No request is made until
    /// the first call.
    pub fn connect(config: &IndexConfig) -> Result<Self, IndexError> {
        let mut builder = Qdrant::from_url(&config.url).timeout(config.timeout());
        if let Some(api_key) = &config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| IndexError::Unavailable(format!("Failed to create Qdrant client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<SearchHit>, IndexError> {
        let response = self
            .client
            .search_points(SearchPointsBuilder::new(collection, vector, limit).with_payload(true))
            .await
            .map_err(|e| classify_error(collection, e))?;

        Ok(response.result.into_iter().map(scored_point_to_hit).collect())
    }

    async fn collection_dimension(&self, collection: &str) -> Result<usize, IndexError> {
        let exists = self
            .client
            .collection_exists(collection)
            .await
            .map_err(|e| classify_error(collection, e))?;
        if !exists {
            return Err(IndexError::CollectionNotFound(collection.to_string()));
        }

        let info = self
            .client
            .collection_info(collection)
            .await
            .map_err(|e| classify_error(collection, e))?;

        let vectors = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config);

        match vectors {
            Some(VectorsConfigKind::Params(params)) => Ok(params.size as usize),
            Some(VectorsConfigKind::ParamsMap(_)) => Err(IndexError::Backend(format!(
                "collection {} uses named vectors; a single unnamed vector is required",
                collection
            ))),
            None => Err(IndexError::Backend(format!(
                "collection {} reports no vector configuration",
                collection
            ))),
        }
    }
}

fn scored_point_to_hit(point: ScoredPoint) -> SearchHit {
    let payload: Map<String, JsonValue> = point
        .payload
        .iter()
        .map(|(key, value)| (key.clone(), qdrant_to_json_value(value)))
        .collect();

    SearchHit {
        id: point_id_to_string(&point.id),
        score: point.score,
        payload,
    }
}

// gRPC status codes, as carried in `tonic::Code`
const GRPC_CANCELLED: i32 = 1;
const GRPC_DEADLINE_EXCEEDED: i32 = 4;
const GRPC_NOT_FOUND: i32 = 5;
const GRPC_UNAVAILABLE: i32 = 14;

/// Map a client error onto the index failure taxonomy
fn classify_error(collection: &str, err: QdrantError) -> IndexError {
    match &err {
        QdrantError::ResponseError { status, .. } => {
            classify_status(i32::from(status.code()), status.message(), collection)
        }
        _ => IndexError::Backend(err.to_string()),
    }
}

/// Decide the failure kind from a gRPC status code and message
fn classify_status(code: i32, message: &str, collection: &str) -> IndexError {
    if code == GRPC_NOT_FOUND || message.contains("doesn't exist") {
        return IndexError::CollectionNotFound(collection.to_string());
    }
    if let Some((expected, actual)) = parse_dimension_error(message) {
        return IndexError::DimensionMismatch { expected, actual };
    }
    if matches!(code, GRPC_UNAVAILABLE | GRPC_DEADLINE_EXCEEDED | GRPC_CANCELLED)
        || is_connect_failure(message)
    {
        return IndexError::Unavailable(message.to_string());
    }

    IndexError::Backend(message.to_string())
}

/// The client reports a refused or dropped channel as an `Internal` status
fn is_connect_failure(message: &str) -> bool {
    message.starts_with("Failed to connect")
        || message.contains("transport error")
        || message.contains("tcp connect error")
}

/// Qdrant reports e.g. "Wrong input: Vector dimension error: expected dim: 384, got 768"
fn parse_dimension_error(message: &str) -> Option<(usize, usize)> {
    let rest = &message[message.find("expected dim:")? + "expected dim:".len()..];
    let (expected, rest) = rest.split_once(',')?;
    let actual = rest.trim().strip_prefix("got")?;

    let digits = |s: &str| -> Option<usize> {
        s.trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect::<String>()
            .parse()
            .ok()
    };

    Some((digits(expected)?, digits(actual)?))
}

fn qdrant_to_json_value(value: &QdrantValue) -> JsonValue {
    match &value.kind {
        Some(Kind::StringValue(s)) => JsonValue::String(s.clone()),
        Some(Kind::IntegerValue(i)) => JsonValue::Number((*i).into()),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Some(Kind::BoolValue(b)) => JsonValue::Bool(*b),
        Some(Kind::ListValue(list)) => {
            JsonValue::Array(list.values.iter().map(qdrant_to_json_value).collect())
        }
        Some(Kind::StructValue(s)) => JsonValue::Object(
            s.fields
                .iter()
                .map(|(k, v)| (k.clone(), qdrant_to_json_value(v)))
                .collect(),
        ),
        Some(Kind::NullValue(_)) | None => JsonValue::Null,
    }
}

fn point_id_to_string(point_id: &Option<PointId>) -> String {
    match point_id.as_ref().and_then(|id| id.point_id_options.as_ref()) {
        Some(PointIdOptions::Num(n)) => n.to_string(),
        Some(PointIdOptions::Uuid(u)) => u.clone(),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::{ListValue, Struct};
    use std::collections::HashMap;

    fn string_value(s: &str) -> QdrantValue {
        QdrantValue {
            kind: Some(Kind::StringValue(s.to_string())),
        }
    }

    #[test]
    fn test_parse_dimension_error() {
        let message = "Wrong input: Vector dimension error: expected dim: 384, got 768";
        assert_eq!(parse_dimension_error(message), Some((384, 768)));
    }

    #[test]
    fn test_parse_dimension_error_unrelated_message() {
        assert_eq!(parse_dimension_error("Service unavailable"), None);
        assert_eq!(parse_dimension_error("expected dim: abc, got 3"), None);
    }

    const GRPC_INTERNAL: i32 = 13;
    const GRPC_INVALID_ARGUMENT: i32 = 3;

    #[test]
    fn test_classify_connect_failure_as_unavailable() {
        let message = "Failed to connect to http://127.0.0.1:1/: tonic::transport::Error(Transport, \
                       ConnectError(\"tcp connect error\", Os { code: 111, kind: ConnectionRefused }))";
        assert!(matches!(
            classify_status(GRPC_INTERNAL, message, "school_info"),
            IndexError::Unavailable(_)
        ));
        assert!(matches!(
            classify_status(GRPC_UNAVAILABLE, "connection reset", "school_info"),
            IndexError::Unavailable(_)
        ));
        assert!(matches!(
            classify_status(GRPC_DEADLINE_EXCEEDED, "Timeout expired", "school_info"),
            IndexError::Unavailable(_)
        ));
    }

    #[test]
    fn test_classify_missing_collection() {
        assert_eq!(
            classify_status(GRPC_NOT_FOUND, "Not found", "school_info"),
            IndexError::CollectionNotFound("school_info".to_string())
        );
        assert_eq!(
            classify_status(
                GRPC_INTERNAL,
                "Collection `campus_faq` doesn't exist!",
                "campus_faq"
            ),
            IndexError::CollectionNotFound("campus_faq".to_string())
        );
    }

    #[test]
    fn test_classify_dimension_mismatch() {
        let message = "Wrong input: Vector dimension error: expected dim: 384, got 768";
        assert_eq!(
            classify_status(GRPC_INVALID_ARGUMENT, message, "school_info"),
            IndexError::DimensionMismatch {
                expected: 384,
                actual: 768
            }
        );
    }

    #[test]
    fn test_classify_other_failures_as_backend() {
        assert_eq!(
            classify_status(GRPC_INTERNAL, "Service internal error: segment locked", "school_info"),
            IndexError::Backend("Service internal error: segment locked".to_string())
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let config = IndexConfig {
            url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
            ..IndexConfig::default()
        };
        let index = QdrantIndex::connect(&config).unwrap();

        let err = index.search("school_info", vec![0.0; 4], 3).await.unwrap_err();
        assert!(matches!(err, IndexError::Unavailable(_)), "got {:?}", err);
    }

    #[test]
    fn test_payload_conversion() {
        let mut fields = HashMap::new();
        fields.insert("page".to_string(), QdrantValue { kind: Some(Kind::IntegerValue(4)) });

        let nested = QdrantValue {
            kind: Some(Kind::StructValue(Struct { fields })),
        };
        let list = QdrantValue {
            kind: Some(Kind::ListValue(ListValue {
                values: vec![string_value("a"), QdrantValue { kind: Some(Kind::BoolValue(true)) }],
            })),
        };

        assert_eq!(qdrant_to_json_value(&string_value("hi")), JsonValue::from("hi"));
        assert_eq!(qdrant_to_json_value(&nested), serde_json::json!({"page": 4}));
        assert_eq!(qdrant_to_json_value(&list), serde_json::json!(["a", true]));
        assert_eq!(qdrant_to_json_value(&QdrantValue { kind: None }), JsonValue::Null);
    }

    #[test]
    fn test_scored_point_to_hit() {
        let mut payload = HashMap::new();
        payload.insert("text".to_string(), string_value("Office hours are 9-5"));

        let point = ScoredPoint {
            id: Some(PointId {
                point_id_options: Some(PointIdOptions::Num(7)),
            }),
            payload,
            score: 0.77,
            ..Default::default()
        };

        let hit = scored_point_to_hit(point);
        assert_eq!(hit.id, "7");
        assert_eq!(hit.score, 0.77);
        assert_eq!(hit.text(), Some("Office hours are 9-5"));
    }

    #[test]
    fn test_point_id_missing() {
        assert_eq!(point_id_to_string(&None), "unknown");
    }

    #[tokio::test]
    #[ignore] // Integration test - requires Qdrant with a school_info collection
    async fn test_collection_dimension_live() {
        let index = QdrantIndex::connect(&IndexConfig::default()).unwrap();
        let dimension = index.collection_dimension("school_info").await.unwrap();
        assert_eq!(dimension, 384);
    }

    #[tokio::test]
    #[ignore] // Integration test - requires Qdrant
    async fn test_missing_collection_live() {
        let index = QdrantIndex::connect(&IndexConfig::default()).unwrap();
        let err = index.collection_dimension("no_such_collection").await.unwrap_err();
        assert!(matches!(err, IndexError::CollectionNotFound(_)));
    }
}
