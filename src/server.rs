//! HTTP surface of the processing entry point.
//!
//! `POST /process` runs one invocation at the depth carried by the
//! `x-recursion-depth` header (zero when absent) and answers with a JSON
//! report. `GET /health` answers once the router is up.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::queue::{
    adapters::http::DEPTH_HEADER,
    domain::{InvocationReport, QueueDepth, TaskOutcome},
    services::{EntryPointError, ProcessInvocation},
};

/// Shared handler state.
#[derive(Clone)]
struct AppState {
    entry: Arc<dyn ProcessInvocation>,
}

/// Builds the router serving `entry`.
pub fn router(entry: Arc<dyn ProcessInvocation>) -> Router {
    Router::new()
        .route("/process", post(process))
        .route("/health", get(health))
        .with_state(AppState { entry })
}

/// Serves the router on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn serve<F>(
    listener: TcpListener,
    entry: Arc<dyn ProcessInvocation>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(address) = listener.local_addr() {
        info!(%address, "entry point listening");
    }
    axum::serve(listener, router(entry))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn process(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let raw_depth = headers
        .get(DEPTH_HEADER)
        .and_then(|value| value.to_str().ok());
    let depth = match QueueDepth::parse_indicator(raw_depth) {
        Ok(depth) => depth,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"status": "invalid_depth", "error": err.to_string()})),
            )
                .into_response();
        }
    };

    // A claimed task must reach its outcome even if the caller hangs up.
    let entry = Arc::clone(&state.entry);
    let invocation = tokio::spawn(async move { entry.invoke(depth).await });
    match invocation.await {
        Ok(Ok(report)) => report_response(&report),
        Ok(Err(err)) => error_response(&err),
        Err(err) => {
            error!(error = %err, "invocation task aborted");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "aborted", "error": err.to_string()})),
            )
                .into_response()
        }
    }
}

/// Maps a report to its status code and body.
fn report_response(report: &InvocationReport) -> Response {
    let (status, mut body) = match &report.outcome {
        TaskOutcome::QueueEmpty => (
            StatusCode::OK,
            json!({"status": "empty", "message": "No pending tasks."}),
        ),
        TaskOutcome::ClaimLost { task_id } => (
            StatusCode::OK,
            json!({"status": "claim_lost", "task_id": task_id}),
        ),
        TaskOutcome::Completed {
            task_id,
            name,
            reference,
        } => (
            StatusCode::OK,
            json!({
                "status": "completed",
                "task_id": task_id,
                "name": name,
                "url": reference,
                "remaining": report.remaining(),
            }),
        ),
        TaskOutcome::Failed {
            task_id,
            retry_count,
            disposition,
            message,
        } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "status": "failed",
                "task_id": task_id,
                "error": message,
                "retry_count": retry_count,
                "permanent": disposition.is_permanent(),
                "remaining": report.remaining(),
            }),
        ),
    };

    if let Value::Object(fields) = &mut body {
        fields.insert("invocation_id".to_owned(), json!(report.invocation_id));
        fields.insert("depth".to_owned(), json!(report.depth));
        fields.insert("continuation".to_owned(), json!(report.continuation));
    }
    (status, Json(body)).into_response()
}

fn error_response(err: &EntryPointError) -> Response {
    match err {
        EntryPointError::DepthLimitExceeded { depth, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "depth_limit_exceeded",
                "error": err.to_string(),
                "depth": depth,
            })),
        )
            .into_response(),
        EntryPointError::Processing(_) => {
            error!(error = %err, "invocation failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "store_unavailable", "error": err.to_string()})),
            )
                .into_response()
        }
    }
}
