mod analyze;
mod results;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use vibenet_reddit::Collector;
use vibenet_sentiment::{ArtifactStore, Classifier, RunStage, SentimentError, TeiClassifier};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<Collector>,
    pub classifier: Arc<Classifier<TeiClassifier>>,
    pub store: ArtifactStore,
    /// Held for the duration of an analysis; both runs would write the same files.
    pub run_lock: Arc<Mutex<()>>,
    pub posts_per_month: usize,
    pub final_limit: usize,
}

impl AppState {
    pub fn new(
        collector: Collector,
        classifier: Classifier<TeiClassifier>,
        store: ArtifactStore,
        posts_per_month: usize,
        final_limit: usize,
    ) -> Self {
        Self {
            collector: Arc::new(collector),
            classifier: Arc::new(classifier),
            store,
            run_lock: Arc::new(Mutex::new(())),
            posts_per_month,
            final_limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    /// Stage of the run currently in the data directory, if any.
    last_run: Option<RunStage>,
    analysis_running: bool,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "no_data" => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Sample preview size: 25 posts unless asked otherwise, at most 200.
pub(super) const DEFAULT_PREVIEW_LIMIT: i64 = 25;

pub(super) fn normalize_limit(limit: Option<i64>) -> usize {
    let limit = limit.unwrap_or(DEFAULT_PREVIEW_LIMIT).clamp(1, 200);
    usize::try_from(limit).unwrap_or(1)
}

pub(super) fn map_artifact_error(request_id: String, error: &SentimentError) -> ApiError {
    tracing::error!(error = %error, "artifact read failed");
    ApiError::new(request_id, "internal_error", "failed to read run artifacts")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/analyze", post(analyze::analyze))
        .route("/api/v1/summary", get(results::get_summary))
        .route("/api/v1/monthly", get(results::list_monthly))
        .route("/api/v1/yearly", get(results::list_yearly))
        .route("/api/v1/posts", get(results::list_posts))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);
    let analysis_running = state.run_lock.try_lock().is_err();

    match state.store.read_manifest() {
        Ok(manifest) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    last_run: manifest.map(|m| m.stage),
                    analysis_running,
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: run manifest unreadable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        last_run: None,
                        analysis_running,
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests;
