mod config;
mod db;
mod error;
mod ai {
    pub mod client;
    pub mod editor;
    pub mod extract;
    pub mod prompts;
}
mod routes {
    pub mod api;
    pub mod configurations;
    pub mod rules;
}

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post, put};
use dotenv::dotenv;
use tower_http::cors::{Any, CorsLayer};

use ai::editor::JsonEditor;
use config::ServerConfig;
use db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub editor: Arc<JsonEditor>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::builder().filter_level(log::LevelFilter::Info).init();

    let config = ServerConfig::from_env();

    let db = Database::open(&config.database_path)?;
    log::info!("Connected to SQLite database: {}", config.database_path);

    let editor = Arc::new(JsonEditor::new(config.ai.clone()));
    let state = AppState { db, editor };

    let cors = if config.cors_origin == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(config.cors_origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let app = Router::new()
        .route("/api/health", get(routes::api::health))
        .route("/api/modify-json", post(routes::api::modify_json))
        .route("/api/modify-schemas", post(routes::api::modify_schemas))
        .route(
            "/api/configurations",
            get(routes::configurations::list).post(routes::configurations::create),
        )
        .route(
            "/api/configurations/:id",
            get(routes::configurations::get_one)
                .put(routes::configurations::update)
                .delete(routes::configurations::delete),
        )
        .route(
            "/api/configurations/:id/activity",
            get(routes::configurations::activity),
        )
        .route(
            "/api/configurations/:id/rules",
            get(routes::configurations::list_rules).post(routes::configurations::create_rule),
        )
        .route(
            "/api/rules/:id",
            put(routes::rules::update).delete(routes::rules::delete),
        )
        .with_state(state)
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    log::info!("Server is running on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
