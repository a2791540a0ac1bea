use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::AppState;
use crate::ai::prompts::SchemaEditContext;
use crate::error::ConfiguratorError;

/// A handler failure: the inner error kind picks the status code, the
/// context string prefixes the client-facing message.
pub struct ApiError {
    context: &'static str,
    inner: ConfiguratorError,
}

impl ApiError {
    pub fn new(context: &'static str, inner: ConfiguratorError) -> Self {
        Self { context, inner }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.inner {
            ConfiguratorError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        log::error!("API Error: {}", self.inner);

        let body = Json(json!({ "error": format!("{}: {}", self.context, self.inner) }));
        (status, body).into_response()
    }
}

pub fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

pub fn not_found(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyJsonRequest {
    #[serde(default)]
    command: String,
    #[serde(default)]
    json_data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyJsonResponse {
    modified_json: String,
}

pub async fn modify_json(
    State(state): State<AppState>,
    Json(req): Json<ModifyJsonRequest>,
) -> Result<Json<ModifyJsonResponse>, ApiError> {
    let modified = state
        .editor
        .modify_json(&req.command, &req.json_data)
        .await
        .map_err(|e| ApiError::new("Failed to modify JSON", e))?;

    Ok(Json(ModifyJsonResponse {
        modified_json: modified,
    }))
}

/// The schema-edit payload. Everything except the command is optional;
/// absent history fields fall back to the same defaults the prompt
/// placeholders expect.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifySchemasRequest {
    #[serde(default)]
    command: String,
    #[serde(default)]
    target: String,
    #[serde(default = "empty_object")]
    schema: Value,
    #[serde(default = "empty_object")]
    ui_schema: Value,
    #[serde(default = "empty_object")]
    form_data: Value,
    #[serde(default)]
    rules: Vec<String>,
    #[serde(default)]
    current_functions: String,
    #[serde(default)]
    current_semantic_schema: String,
    #[serde(default)]
    current_rule_set: Vec<String>,
    #[serde(default)]
    last_semantic_schema: String,
    #[serde(default)]
    last_rule_set: Vec<String>,
    #[serde(default = "empty_object_text")]
    last_data_schema: String,
    #[serde(default = "empty_object_text")]
    last_ui_schema: String,
    #[serde(default)]
    last_js_function_impl: String,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn empty_object_text() -> String {
    "{}".to_string()
}

impl From<ModifySchemasRequest> for SchemaEditContext {
    fn from(req: ModifySchemasRequest) -> Self {
        Self {
            command: req.command,
            target: req.target,
            schema: req.schema,
            ui_schema: req.ui_schema,
            form_data: req.form_data,
            rules: req.rules,
            current_functions: req.current_functions,
            current_semantic_schema: req.current_semantic_schema,
            current_rule_set: req.current_rule_set,
            last_semantic_schema: req.last_semantic_schema,
            last_rule_set: req.last_rule_set,
            last_data_schema: req.last_data_schema,
            last_ui_schema: req.last_ui_schema,
            last_js_function_impl: req.last_js_function_impl,
        }
    }
}

pub async fn modify_schemas(
    State(state): State<AppState>,
    Json(req): Json<ModifySchemasRequest>,
) -> Result<Json<Value>, ApiError> {
    let ctx = SchemaEditContext::from(req);
    let result = state
        .editor
        .modify_schemas(&ctx)
        .await
        .map_err(|e| ApiError::new("Failed to modify schemas", e))?;

    Ok(Json(result))
}
