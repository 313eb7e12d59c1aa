//! Sentiment pipeline orchestration: collect → classify → aggregate.
//!
//! Each stage reads the complete table the previous stage wrote to the
//! [`ArtifactStore`] and writes its own before updating the run manifest.
//! Artifact file I/O runs on tokio's blocking pool so an async caller's
//! worker threads never wait on the disk.

use chrono::Utc;
use serde::Serialize;
use vibenet_core::{Post, ScoredPost};
use vibenet_reddit::{CollectRequest, Collector};

use crate::aggregate::{aggregate_monthly, aggregate_yearly, MonthlyAggregate, YearlyAggregate};
use crate::artifacts::{ArtifactPaths, ArtifactStore, RunManifest, RunStage};
use crate::classifier::Classifier;
use crate::error::SentimentError;
use crate::model::SentimentModel;

/// Result of a successful full run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub topic: String,
    pub year: i32,
    pub post_count: usize,
    pub month_count: usize,
    pub artifacts: ArtifactPaths,
}

/// Collects posts and writes `posts.csv`.
///
/// Nothing in the store is touched when collection fails, including when it
/// comes back empty.
///
/// # Errors
///
/// Returns [`SentimentError::Collector`] on `CollectionEmpty`, or an
/// artifact error if the posts cannot be written.
pub async fn collect_stage(
    collector: &Collector,
    store: &ArtifactStore,
    request: &CollectRequest,
) -> Result<Vec<Post>, SentimentError> {
    tracing::info!(topic = %request.topic, year = request.year, "collect stage starting");
    let posts = collector.collect(request).await?;

    let manifest = RunManifest {
        topic: request.topic.clone(),
        year: request.year,
        stage: RunStage::Collected,
        post_count: posts.len(),
        updated_at: Utc::now(),
    };
    let writer = store.clone();
    on_blocking_pool(move || {
        writer.clear_manifest()?;
        writer.write_posts(&posts)?;
        writer.write_manifest(&manifest)?;
        Ok(posts)
    })
    .await
}

/// Scores `posts.csv` and rewrites it with the sentiment columns.
///
/// # Errors
///
/// Returns [`SentimentError::StageOutOfOrder`] if no collected run exists,
/// the model's error if inference fails, or an artifact error.
pub async fn classify_stage<M: SentimentModel>(
    classifier: &Classifier<M>,
    store: &ArtifactStore,
) -> Result<Vec<ScoredPost>, SentimentError> {
    let reader = store.clone();
    let (manifest, posts) = on_blocking_pool(move || {
        let manifest = require_stage(&reader, RunStage::Collected)?;
        let posts = reader.read_posts()?;
        Ok((manifest, posts))
    })
    .await?;
    tracing::info!(
        topic = %manifest.topic,
        year = manifest.year,
        posts = posts.len(),
        "classify stage starting"
    );

    let scored = classifier.classify_posts(posts).await?;

    let manifest = RunManifest {
        stage: RunStage::Classified,
        post_count: scored.len(),
        updated_at: Utc::now(),
        ..manifest
    };
    let writer = store.clone();
    on_blocking_pool(move || {
        writer.clear_manifest()?;
        writer.write_scored(&scored)?;
        writer.write_manifest(&manifest)?;
        Ok(scored)
    })
    .await
}

/// Monthly and yearly tables produced by [`aggregate_stage`].
#[derive(Debug, Clone)]
pub struct AggregateTables {
    pub monthly: Vec<MonthlyAggregate>,
    pub yearly: Vec<YearlyAggregate>,
}

/// Aggregates the scored posts into `monthly.csv` and `yearly.csv`.
///
/// Blocking. Async callers should go through [`run_pipeline`], which runs
/// it on the blocking pool.
///
/// # Errors
///
/// Returns [`SentimentError::StageOutOfOrder`] if the posts are not scored
/// yet, or an artifact error.
pub fn aggregate_stage(store: &ArtifactStore) -> Result<AggregateTables, SentimentError> {
    let manifest = require_stage(store, RunStage::Classified)?;
    let scored = store.read_scored()?;

    let monthly = aggregate_monthly(&scored);
    let yearly = aggregate_yearly(&scored);

    store.clear_manifest()?;
    store.write_aggregates(&monthly, &yearly)?;
    store.write_manifest(&RunManifest {
        stage: RunStage::Complete,
        post_count: scored.len(),
        updated_at: Utc::now(),
        ..manifest
    })?;

    tracing::info!(
        months = monthly.len(),
        years = yearly.len(),
        posts = scored.len(),
        "aggregate stage complete"
    );

    Ok(AggregateTables { monthly, yearly })
}

/// Runs all three stages for one topic/year.
///
/// # Errors
///
/// Returns the first stage error. A `CollectionEmpty` failure leaves every
/// artifact from the previous run untouched.
pub async fn run_pipeline<M: SentimentModel>(
    collector: &Collector,
    classifier: &Classifier<M>,
    store: &ArtifactStore,
    request: &CollectRequest,
) -> Result<PipelineOutcome, SentimentError> {
    collect_stage(collector, store, request).await?;
    let scored = classify_stage(classifier, store).await?;
    let writer = store.clone();
    let tables = on_blocking_pool(move || aggregate_stage(&writer)).await?;

    tracing::info!(
        topic = %request.topic,
        year = request.year,
        posts = scored.len(),
        "pipeline completed"
    );

    Ok(PipelineOutcome {
        topic: request.topic.clone(),
        year: request.year,
        post_count: scored.len(),
        month_count: tables.monthly.len(),
        artifacts: store.paths(),
    })
}

/// Runs blocking artifact work on tokio's blocking pool.
async fn on_blocking_pool<T, F>(work: F) -> Result<T, SentimentError>
where
    F: FnOnce() -> Result<T, SentimentError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

/// Returns the manifest if the store has reached at least `stage`.
fn require_stage(store: &ArtifactStore, stage: RunStage) -> Result<RunManifest, SentimentError> {
    match store.read_manifest()? {
        Some(manifest) if manifest.stage >= stage => Ok(manifest),
        _ => Err(SentimentError::StageOutOfOrder {
            expected: stage.to_string(),
        }),
    }
}
