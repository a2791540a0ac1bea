use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use super::api::{ApiError, bad_request};
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRuleRequest {
    #[serde(default)]
    rule_text: String,
    rule_order: Option<i64>,
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRuleRequest>,
) -> Result<Response, ApiError> {
    if req.rule_text.is_empty() {
        return Ok(bad_request("Rule text is required"));
    }

    state
        .db
        .update_rule(id, &req.rule_text, req.rule_order.unwrap_or(0))
        .map_err(|e| ApiError::new("Failed to update rule", e))?;

    Ok(Json(json!({ "message": "Rule updated successfully" })).into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .db
        .delete_rule(id)
        .map_err(|e| ApiError::new("Failed to delete rule", e))?;

    Ok(Json(json!({ "message": "Rule deleted successfully" })))
}
