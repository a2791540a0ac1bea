use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};

use super::api::{ApiError, bad_request, not_found};
use crate::AppState;
use crate::db::{ActivityEntry, ConfigurationSummary, ConfigurationUpdate, Rule};

pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConfigurationSummary>>, ApiError> {
    let configurations = state
        .db
        .list_configurations()
        .map_err(|e| ApiError::new("Failed to fetch configurations", e))?;
    Ok(Json(configurations))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let config = state
        .db
        .get_configuration(id)
        .map_err(|e| ApiError::new("Failed to fetch configuration", e))?;

    match config {
        Some(config) => Ok(Json(config).into_response()),
        None => Ok(not_found("Configuration not found")),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConfigurationRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    semantic_schema: String,
    #[serde(default)]
    data_schema: String,
    #[serde(default)]
    ui_schema: String,
    #[serde(default)]
    js_function_impl: String,
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateConfigurationRequest>,
) -> Result<Response, ApiError> {
    if req.name.is_empty() || req.semantic_schema.is_empty() {
        return Ok(bad_request("Name and semanticSchema are required"));
    }

    match state.db.create_configuration(
        &req.name,
        &req.semantic_schema,
        &req.data_schema,
        &req.ui_schema,
        &req.js_function_impl,
    ) {
        Ok(id) => Ok(Json(json!({
            "id": id,
            "message": "Configuration created successfully"
        }))
        .into_response()),
        Err(err) if err.to_string().contains("UNIQUE constraint failed") => {
            Ok(bad_request("Configuration name already exists"))
        }
        Err(err) => Err(ApiError::new("Failed to create configuration", err)),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfigurationRequest {
    name: Option<String>,
    semantic_schema: Option<String>,
    data_schema: Option<String>,
    ui_schema: Option<String>,
    js_function_impl: Option<String>,
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateConfigurationRequest>,
) -> Result<Json<Value>, ApiError> {
    let update = ConfigurationUpdate {
        // An empty name would violate the uniqueness contract; skip it.
        name: req.name.filter(|n| !n.is_empty()),
        semantic_schema: req.semantic_schema,
        data_schema: req.data_schema,
        ui_schema: req.ui_schema,
        js_function_impl: req.js_function_impl,
    };

    state
        .db
        .update_configuration(id, &update)
        .map_err(|e| ApiError::new("Failed to update configuration", e))?;

    Ok(Json(json!({ "message": "Configuration updated successfully" })))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let deleted = state
        .db
        .delete_configuration(id)
        .map_err(|e| ApiError::new("Failed to delete configuration", e))?;

    if deleted {
        Ok(Json(json!({ "message": "Configuration deleted successfully" })).into_response())
    } else {
        Ok(not_found("Configuration not found"))
    }
}

#[derive(Deserialize)]
pub struct ActivityQuery {
    limit: Option<i64>,
}

pub async fn activity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityEntry>>, ApiError> {
    let entries = state
        .db
        .activity_log(id, query.limit.unwrap_or(50))
        .map_err(|e| ApiError::new("Failed to fetch activity log", e))?;
    Ok(Json(entries))
}

pub async fn list_rules(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Rule>>, ApiError> {
    let rules = state
        .db
        .rules_for_configuration(id)
        .map_err(|e| ApiError::new("Failed to fetch rules", e))?;
    Ok(Json(rules))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRuleRequest {
    #[serde(default)]
    rule_text: String,
    rule_order: Option<i64>,
}

pub async fn create_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CreateRuleRequest>,
) -> Result<Response, ApiError> {
    if req.rule_text.is_empty() {
        return Ok(bad_request("Rule text is required"));
    }

    let rule_id = state
        .db
        .create_rule(id, &req.rule_text, req.rule_order.unwrap_or(0))
        .map_err(|e| ApiError::new("Failed to create rule", e))?;

    Ok(Json(json!({
        "id": rule_id,
        "message": "Rule created successfully"
    }))
    .into_response())
}
