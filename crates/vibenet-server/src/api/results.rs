//! Read-only views over the last completed run.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use vibenet_core::ScoredPost;
use vibenet_sentiment::{
    ArtifactStore, DashboardSummary, MonthlyAggregate, RunManifest, RunStage, SentimentError,
    YearlyAggregate,
};

use crate::middleware::RequestId;

use super::{map_artifact_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct PostsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct PostsPage {
    pub total: usize,
    pub items: Vec<ScoredPost>,
}

/// Reads from the store on the blocking pool, but only if the manifest says
/// the run is complete. Artifacts of an unfinished or failed run are never served.
async fn load_completed<T, F>(
    store: &ArtifactStore,
    request_id: &str,
    read: F,
) -> Result<(RunManifest, T), ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ArtifactStore) -> Result<T, SentimentError> + Send + 'static,
{
    let store = store.clone();
    let joined = tokio::task::spawn_blocking(
        move || -> Result<Option<(RunManifest, T)>, SentimentError> {
            match store.read_manifest()? {
                Some(manifest) if manifest.stage == RunStage::Complete => {
                    let data = read(&store)?;
                    Ok(Some((manifest, data)))
                }
                _ => Ok(None),
            }
        },
    )
    .await;

    match joined {
        Ok(Ok(Some(loaded))) => Ok(loaded),
        Ok(Ok(None)) => Err(ApiError::new(
            request_id,
            "not_found",
            "no completed analysis; POST /api/v1/analyze first",
        )),
        Ok(Err(e)) => Err(map_artifact_error(request_id.to_string(), &e)),
        Err(e) => {
            tracing::error!(error = %e, "artifact read task failed");
            Err(ApiError::new(
                request_id,
                "internal_error",
                "failed to read run artifacts",
            ))
        }
    }
}

pub(super) async fn get_summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<DashboardSummary>>, ApiError> {
    let (manifest, (monthly, posts)) = load_completed(&state.store, &req_id.0, |store| {
        Ok((store.read_monthly()?, store.read_scored()?))
    })
    .await?;

    Ok(Json(ApiResponse {
        data: DashboardSummary::build(&manifest.topic, manifest.year, &monthly, &posts),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_monthly(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<MonthlyAggregate>>>, ApiError> {
    let (_, data) = load_completed(&state.store, &req_id.0, ArtifactStore::read_monthly).await?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_yearly(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<YearlyAggregate>>>, ApiError> {
    let (_, data) = load_completed(&state.store, &req_id.0, ArtifactStore::read_yearly).await?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_posts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PostsQuery>,
) -> Result<Json<ApiResponse<PostsPage>>, ApiError> {
    let (_, mut posts) =
        load_completed(&state.store, &req_id.0, ArtifactStore::read_scored).await?;

    let total = posts.len();
    posts.truncate(normalize_limit(query.limit));

    Ok(Json(ApiResponse {
        data: PostsPage {
            total,
            items: posts,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
