//! Local HTTP surface: a single-page UI plus a small conversion API.
//!
//! Conversions run as background tasks tracked in an in-process job map;
//! the UI polls `/api/jobs/{id}` until a job settles. Nothing is persisted
//! across restarts.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
};
use kobopress_core::validate_article_url;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::convert::{self, ConvertOptions};
use crate::errors::is_user_error;
use crate::store;
use crate::ui;

/// Arguments for `kobopress serve`.
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "3000", value_name = "PORT")]
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum JobStatus {
    Pending,
    Converting,
    Done,
    Error,
}

#[derive(Debug, Clone, Serialize)]
struct Job {
    status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Clone, Default)]
struct AppState {
    jobs: Arc<RwLock<HashMap<u64, Job>>>,
    next_id: Arc<AtomicU64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConvertRequest {
    url: String,
    no_upload: Option<bool>,
}

pub async fn run(args: ServeArgs) -> Result<()> {
    init_logging();

    let state = AppState::default();
    let app = router(state);

    let addr = format!("127.0.0.1:{}", args.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("kobopress server running");
    info!("Web UI:  http://localhost:{}", args.port);
    info!("API:     http://localhost:{}/api/convert", args.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kobopress=info"));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(ui_handler))
        .route("/api/convert", post(convert_handler))
        .route("/api/jobs/{id}", get(job_handler))
        .route("/api/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

async fn ui_handler() -> Html<&'static str> {
    Html(ui::PAGE)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn convert_handler(
    State(state): State<AppState>,
    body: Result<Json<ConvertRequest>, axum::extract::rejection::JsonRejection>,
) -> (StatusCode, Json<serde_json::Value>) {
    let Ok(Json(request)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid JSON body");
    };
    if request.url.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Missing required field: url");
    }
    if let Err(error) = validate_article_url(&request.url) {
        return error_response(StatusCode::BAD_REQUEST, &error.to_string());
    }

    let id = state.next_id.fetch_add(1, Ordering::Relaxed) + 1;
    state
        .jobs
        .write()
        .await
        .insert(id, Job { status: JobStatus::Pending, message: None });

    info!("job {}: converting {}", id, request.url);
    tokio::spawn(run_job(state.clone(), id, request));

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "jobId": id.to_string(), "status": "pending" })),
    )
}

async fn job_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    let found = match id.parse::<u64>() {
        Ok(id) => state.jobs.read().await.get(&id).cloned(),
        Err(_) => None,
    };

    match found {
        Some(job) => (StatusCode::OK, Json(serde_json::to_value(&job).unwrap_or_default())),
        None => error_response(StatusCode::NOT_FOUND, "Job not found"),
    }
}

async fn run_job(state: AppState, id: u64, request: ConvertRequest) {
    set_job(&state, id, JobStatus::Converting, None).await;

    let options = job_options(&request);
    match convert::convert_one(&request.url, &options).await {
        Ok(()) => {
            info!("job {}: done", id);
            set_job(
                &state,
                id,
                JobStatus::Done,
                Some("Article converted successfully".to_string()),
            )
            .await;
        }
        Err(err) => {
            error!("job {}: {:#}", id, err);
            let message = if is_user_error(&err) {
                err.to_string()
            } else {
                "Conversion failed".to_string()
            };
            set_job(&state, id, JobStatus::Error, Some(message)).await;
        }
    }
}

/// Server-side conversions run with the stored defaults; the request can
/// only opt out of the upload.
fn job_options(request: &ConvertRequest) -> ConvertOptions {
    let defaults = store::user_defaults();
    ConvertOptions {
        output: defaults.output.as_ref().map(PathBuf::from),
        no_upload: request.no_upload.unwrap_or_else(|| defaults.no_upload.unwrap_or(false)),
        verbose: false,
        title: None,
        url: None,
        cookie: defaults.cookie.clone(),
        timeout: 30,
    }
}

fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({ "error": message })))
}

async fn set_job(state: &AppState, id: u64, status: JobStatus, message: Option<String>) {
    if let Some(job) = state.jobs.write().await.get_mut(&id) {
        job.status = status;
        job.message = message;
    }
}
