use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;
use vibenet_reddit::CollectRequest;
use vibenet_sentiment::PipelineOutcome;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeRequest {
    pub topic: String,
    pub year: i32,
}

/// Runs the full pipeline for one topic/year and replaces the current run.
pub(super) async fn analyze(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PipelineOutcome>>, ApiError> {
    let Json(body) = payload
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.body_text()))?;

    let request = CollectRequest::new(
        &body.topic,
        body.year,
        state.posts_per_month,
        state.final_limit,
    )
    .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    let Ok(guard) = Arc::clone(&state.run_lock).try_lock_owned() else {
        return Err(ApiError::new(
            req_id.0,
            "conflict",
            "an analysis is already running",
        ));
    };

    tracing::info!(topic = %request.topic, year = request.year, "analysis requested");

    // The run owns the lock and outlives the request, so a client that
    // disconnects never leaves the data directory half-written.
    let collector = Arc::clone(&state.collector);
    let classifier = Arc::clone(&state.classifier);
    let store = state.store.clone();
    let run = tokio::spawn(async move {
        let _guard = guard;
        let result = vibenet_sentiment::run_pipeline(
            collector.as_ref(),
            classifier.as_ref(),
            &store,
            &request,
        )
        .await;
        match &result {
            Ok(outcome) => tracing::info!(
                topic = %outcome.topic,
                year = outcome.year,
                posts = outcome.post_count,
                "analysis finished"
            ),
            Err(e) if e.is_collection_empty() => {
                tracing::warn!(topic = %request.topic, year = request.year, "no posts collected");
            }
            Err(e) => {
                tracing::error!(topic = %request.topic, error = %e, "analysis failed");
            }
        }
        result
    });

    match run.await {
        Ok(Ok(outcome)) => Ok(Json(ApiResponse {
            data: outcome,
            meta: ResponseMeta::new(req_id.0),
        })),
        Ok(Err(e)) if e.is_collection_empty() => {
            Err(ApiError::new(req_id.0, "no_data", e.to_string()))
        }
        Ok(Err(_)) => Err(ApiError::new(req_id.0, "internal_error", "analysis failed")),
        Err(e) => {
            tracing::error!(error = %e, "analysis task failed");
            Err(ApiError::new(req_id.0, "internal_error", "analysis failed"))
        }
    }
}
