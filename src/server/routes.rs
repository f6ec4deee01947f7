//! HTTP route handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value as JsonValue};

use super::error::ApiResult;
use super::state::AppState;
use crate::errors::RelayError;
use crate::relay::MessageRequest;
use crate::retrieval::{Query, SearchResult};

/// Liveness probe (GET /)
pub async fn root() -> Json<JsonValue> {
    Json(json!({ "message": "School RAG API is running" }))
}

/// POST /query_school
pub async fn query_school(
    State(state): State<AppState>,
    payload: Result<Json<Query>, JsonRejection>,
) -> ApiResult<Json<Vec<SearchResult>>> {
    let Json(query) = payload?;
    let results = state.retrieval.query_school(&query).await?;
    Ok(Json(results))
}

/// POST /send_whatsapp
pub async fn send_whatsapp(
    State(state): State<AppState>,
    payload: Result<Json<MessageRequest>, JsonRejection>,
) -> ApiResult<Json<JsonValue>> {
    let Json(request) = payload?;

    let relay = state.relay.as_ref().ok_or_else(|| {
        RelayError::NotConfigured("set relay.dsn, relay.api_key and relay.account_id".to_string())
    })?;

    let receipt = relay
        .send_message(&request.phone_number, &request.message)
        .await?;
    Ok(Json(receipt))
}

/// POST /webhook: provider callbacks are logged and acknowledged
pub async fn webhook(payload: Result<Json<JsonValue>, JsonRejection>) -> ApiResult<Json<JsonValue>> {
    let Json(event) = payload?;
    tracing::info!(event = %event, "webhook received");
    Ok(Json(json!({ "status": "received" })))
}
