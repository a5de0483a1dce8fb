//! Read-only HTTP API over the cache artifacts and the store.
//!
//! Cache-backed endpoints (`/meta`, `/classes`, `/classes/{name}`) read
//! the flat JSON artifacts and never touch the store — they keep
//! working with store connectivity unset. Store-backed feature lookups
//! degrade to 503 when no store URL is configured, instead of erroring.
//!
//! All error responses are structured `{status, detail}` JSON.

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::slug::class_name_slug;
use crate::store;

/// Shared state for all route handlers. The pool exists only when a
/// store URL was configured; its absence is the degraded-mode signal.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    pool: Option<SqlitePool>,
}

/// Build the API router, opening the store pool if a URL is configured.
pub async fn build(config: &Config) -> anyhow::Result<Router> {
    let pool = match &config.store.url {
        Some(url) => Some(store::connect(url).await?),
        None => None,
    };

    let state = AppState {
        config: Arc::new(config.clone()),
        pool,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/health", get(handle_health))
        .route("/meta", get(handle_meta))
        .route("/classes", get(handle_classes))
        .route("/classes/{name}", get(handle_class))
        .route("/classes/{name}/features", get(handle_class_features))
        .route("/features/{slug}", get(handle_feature))
        .layer(cors)
        .with_state(state))
}

/// Start the server on `[server].bind` and run until terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let app = build(config).await?;
    let bind_addr = &config.server.bind;

    println!("SRD grounding API listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

/// `{status, detail}` error body.
#[derive(Serialize)]
struct ErrorBody {
    status: u16,
    detail: String,
}

struct ApiError {
    status: StatusCode,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: self.status.as_u16(),
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(detail: impl Into<String>) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        detail: detail.into(),
    }
}

fn not_found(detail: impl Into<String>) -> ApiError {
    ApiError {
        status: StatusCode::NOT_FOUND,
        detail: detail.into(),
    }
}

fn malformed_artifact(detail: impl Into<String>) -> ApiError {
    ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        detail: detail.into(),
    }
}

fn store_unavailable() -> ApiError {
    ApiError {
        status: StatusCode::SERVICE_UNAVAILABLE,
        detail: "store not configured".to_string(),
    }
}

fn store_error(err: sqlx::Error) -> ApiError {
    ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        detail: format!("store query failed: {}", err),
    }
}

/// Read and parse a flat JSON artifact. Missing file is 404;
/// unparseable content is 500 — a broken cache generation step must
/// never be silently tolerated.
fn read_json(path: &Path) -> Result<serde_json::Value, ApiError> {
    if !path.exists() {
        return Err(not_found(format!("Not found: {}", path.display())));
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| malformed_artifact(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        malformed_artifact(format!("Invalid JSON in {}: {}", name, e))
    })
}

// ============ Handlers ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn handle_meta(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let path = state.config.paths.cache_dir.join(crate::cache::META_FILE);
    read_json(&path).map(Json)
}

async fn handle_classes(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let path = state
        .config
        .paths
        .cache_dir
        .join(crate::cache::CLASSES_MIN_FILE);
    read_json(&path).map(Json)
}

async fn handle_class(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let slug = class_name_slug(&name);
    let path = state.config.paths.data_dir.join(format!("{}.json", slug));
    read_json(&path).map(Json)
}

#[derive(Deserialize)]
struct FeaturesQuery {
    level: Option<i64>,
}

#[derive(Serialize)]
struct FeatureRef {
    name: String,
    slug: String,
}

async fn handle_class_features(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
    Query(query): Query<FeaturesQuery>,
) -> Result<Json<Vec<FeatureRef>>, ApiError> {
    let pool = state.pool.as_ref().ok_or_else(store_unavailable)?;

    let level = query
        .level
        .ok_or_else(|| bad_request("level query parameter is required"))?;
    if !(1..=20).contains(&level) {
        return Err(bad_request("level must be between 1 and 20"));
    }

    // Resolve the path token back to a stored class display name.
    let wanted = class_name_slug(&name);
    let class_names: Vec<String> = sqlx::query_scalar("SELECT name FROM classes")
        .fetch_all(pool)
        .await
        .map_err(store_error)?;
    let class_name = class_names
        .into_iter()
        .find(|n| class_name_slug(n) == wanted)
        .ok_or_else(|| not_found(format!("no such class: {}", name)))?;

    let rows = sqlx::query(
        "SELECT name, slug FROM features WHERE class_name = ? AND level = ? ORDER BY name ASC",
    )
    .bind(&class_name)
    .bind(level)
    .fetch_all(pool)
    .await
    .map_err(store_error)?;

    if rows.is_empty() {
        return Err(not_found(format!(
            "no features for {} at level {}",
            class_name, level
        )));
    }

    Ok(Json(
        rows.iter()
            .map(|row| FeatureRef {
                name: row.get("name"),
                slug: row.get("slug"),
            })
            .collect(),
    ))
}

async fn handle_feature(
    State(state): State<AppState>,
    AxumPath(slug): AxumPath<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.pool.as_ref().ok_or_else(store_unavailable)?;

    let doc: Option<String> = sqlx::query_scalar("SELECT doc FROM features WHERE slug = ?")
        .bind(&slug)
        .fetch_optional(pool)
        .await
        .map_err(store_error)?;

    let raw = doc.ok_or_else(|| not_found(format!("no feature with slug: {}", slug)))?;
    serde_json::from_str(&raw)
        .map(Json)
        .map_err(|e| malformed_artifact(format!("Invalid stored document for {}: {}", slug, e)))
}
