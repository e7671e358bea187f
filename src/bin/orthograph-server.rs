//! orthograph HTTP server.
//!
//! One engine per process, plain-text answers:
//!
//! **Mutations:**
//! - `POST /add` and `POST /add/` with JSON `{title, body}`: echoes the title
//! - `DELETE /`: clear all state
//!
//! **Counts:**
//! - `GET /sentences`, `/pairs`, `/phrases`, `/chains`
//! - `GET /count`: outstanding tasks
//! - `GET /depth`: highest outstanding generation
//! - `GET /orthos[?dims=d1,d2,...]`
//!
//! **Dumps:**
//! - `GET /splat?dims=d1,d2,...`: matching orthotopes as text
//! - `GET /`: titles of accepted documents
//!
//! **Health:**
//! - `GET /health`: JSON statistics
//!
//! Build and run: `cargo run --features server --bin orthograph-server`

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use orthograph::config::{ENV_CONFIG, Settings};
use orthograph::engine::{Engine, EngineInfo};
use orthograph::error::{OrthoError, QueueError};

// ── Server state ──────────────────────────────────────────────────────────

struct ServerState {
    engine: Engine,
}

type ApiResult<T> = Result<T, (StatusCode, String)>;

fn reject(err: OrthoError) -> (StatusCode, String) {
    let status = match &err {
        OrthoError::Query(_) => StatusCode::BAD_REQUEST,
        OrthoError::Queue(QueueError::Full { .. } | QueueError::ShutDown) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        OrthoError::Config(_) | OrthoError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

// ── Request / response types ──────────────────────────────────────────────

#[derive(Deserialize)]
struct AddRequest {
    title: String,
    body: String,
}

#[derive(Deserialize)]
struct DimsParams {
    dims: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    idle: bool,
    #[serde(flatten)]
    info: EngineInfo,
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    let info = state.engine.info();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        idle: info.pending == 0,
        info,
    })
}

async fn add(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<AddRequest>, JsonRejection>,
) -> ApiResult<String> {
    let Json(request) = payload.map_err(|e| (StatusCode::BAD_REQUEST, e.body_text()))?;
    // Waits on the reset barrier while a reset is in progress.
    let admission = tokio::task::spawn_blocking(move || {
        state.engine.add(&request.title, &request.body)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    .map_err(reject)?;
    Ok(admission.title)
}

async fn reset(State(state): State<Arc<ServerState>>) -> ApiResult<String> {
    // Waits for in-flight tasks to release the barrier.
    tokio::task::spawn_blocking(move || state.engine.reset())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok("ok".to_string())
}

async fn titles(State(state): State<Arc<ServerState>>) -> String {
    state.engine.titles().join("\n")
}

async fn sentences(State(state): State<Arc<ServerState>>) -> String {
    state.engine.sentence_count().to_string()
}

async fn pairs(State(state): State<Arc<ServerState>>) -> String {
    state.engine.pair_count().to_string()
}

async fn phrases(State(state): State<Arc<ServerState>>) -> String {
    state.engine.phrase_count().to_string()
}

async fn chains(State(state): State<Arc<ServerState>>) -> String {
    state.engine.chain_count().to_string()
}

async fn count(State(state): State<Arc<ServerState>>) -> String {
    state.engine.pending_task_count().to_string()
}

async fn depth(State(state): State<Arc<ServerState>>) -> String {
    state.engine.max_in_flight_generation().to_string()
}

async fn orthos(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<DimsParams>,
) -> ApiResult<String> {
    let count = match params.dims.as_deref() {
        Some(dims) => state.engine.ortho_count_query(dims).map_err(reject)?,
        None => state.engine.ortho_count(),
    };
    Ok(count.to_string())
}

async fn splat(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<DimsParams>,
) -> ApiResult<String> {
    let dims = params.dims.unwrap_or_default();
    state.engine.splat(&dims).map_err(reject)
}

// ── Main ──────────────────────────────────────────────────────────────────

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::var_os(ENV_CONFIG).map(PathBuf::from);
    let settings = Settings::resolve(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::error!("failed to load settings: {e}");
        std::process::exit(1);
    });
    let addr = settings.server.address();

    let engine = Engine::new(settings.engine).unwrap_or_else(|e| {
        tracing::error!("failed to start engine: {e}");
        std::process::exit(1);
    });
    let state = Arc::new(ServerState { engine });

    let app = Router::new()
        // Health.
        .route("/health", get(health))
        // Mutations and titles.
        .route("/", get(titles).delete(reset))
        .route("/add", post(add))
        .route("/add/", post(add))
        // Counts.
        .route("/sentences", get(sentences))
        .route("/pairs", get(pairs))
        .route("/phrases", get(phrases))
        .route("/chains", get(chains))
        .route("/count", get(count))
        .route("/depth", get(depth))
        .route("/orthos", get(orthos))
        // Dumps.
        .route("/splat", get(splat))
        .layer(CorsLayer::permissive())
        .with_state(state);

    tracing::info!("orthograph server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("failed to bind {addr}: {e}");
            std::process::exit(1);
        });
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orthograph::engine::EngineConfig;

    fn test_state() -> Arc<ServerState> {
        let engine = Engine::new(EngineConfig {
            workers: 2,
            ..Default::default()
        })
        .unwrap();
        Arc::new(ServerState { engine })
    }

    fn request(title: &str, body: &str) -> Result<Json<AddRequest>, JsonRejection> {
        Ok(Json(AddRequest {
            title: title.to_string(),
            body: body.to_string(),
        }))
    }

    #[tokio::test]
    async fn add_echoes_title_off_the_runtime() {
        let state = test_state();
        let title = add(State(Arc::clone(&state)), request("square", "a b. c d. a c. b d"))
            .await
            .unwrap();
        assert_eq!(title, "square");
        assert!(state.engine.wait_idle(std::time::Duration::from_secs(10)));
        assert_eq!(phrases(State(Arc::clone(&state))).await, "1");
        assert_eq!(titles(State(state)).await, "square");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn add_and_reset_interleave() {
        let state = test_state();
        let mut handles = Vec::new();
        for i in 0..8 {
            let state = Arc::clone(&state);
            handles.push(tokio::spawn(async move {
                let title = format!("doc{i}");
                let body = format!("a{i} b{i}. c{i} d{i}. a{i} c{i}. b{i} d{i}");
                add(State(Arc::clone(&state)), request(&title, &body)).await?;
                reset(State(state)).await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "ok");
        }
        reset(State(Arc::clone(&state))).await.unwrap();
        assert_eq!(sentences(State(Arc::clone(&state))).await, "0");
        assert_eq!(state.engine.ortho_count(), 0);
    }

    #[test]
    fn queue_errors_are_unavailable() {
        let (status, _) = reject(QueueError::ShutDown.into());
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
