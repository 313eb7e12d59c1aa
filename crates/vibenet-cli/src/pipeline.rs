//! Pipeline stage command handlers.

use std::time::Duration;

use vibenet_core::AppConfig;
use vibenet_reddit::{CollectRequest, Collector, RedditSearchClient};
use vibenet_sentiment::{ArtifactStore, Classifier, TeiClassifier};

use crate::TopicArgs;

fn build_request(config: &AppConfig, args: &TopicArgs) -> anyhow::Result<CollectRequest> {
    let request = CollectRequest::new(
        &args.topic,
        args.year,
        args.posts_per_month.unwrap_or(config.posts_per_month),
        args.final_limit.unwrap_or(config.final_limit),
    )?;
    Ok(request)
}

fn build_collector(config: &AppConfig) -> anyhow::Result<Collector> {
    let client = RedditSearchClient::with_base_url(
        config.request_timeout_secs,
        &config.user_agent,
        &config.reddit_base_url,
    )?;
    Ok(Collector::new(
        client,
        Duration::from_millis(config.inter_request_delay_ms),
    ))
}

fn build_classifier(config: &AppConfig) -> anyhow::Result<Classifier<TeiClassifier>> {
    let model = TeiClassifier::new(&config.model_url, config.request_timeout_secs)?;
    Ok(Classifier::new(
        model,
        config.confidence_floor,
        config.model_max_tokens,
    ))
}

/// Runs all three stages for one topic and year.
///
/// # Errors
///
/// Returns an error on invalid arguments, an empty collection, a model
/// failure, or an artifact write failure.
pub(crate) async fn run_full(config: &AppConfig, args: &TopicArgs) -> anyhow::Result<()> {
    let request = build_request(config, args)?;
    let collector = build_collector(config)?;
    let classifier = build_classifier(config)?;
    let store = ArtifactStore::new(&config.data_dir);

    tracing::info!(
        topic = %request.topic,
        year = request.year,
        data_dir = %config.data_dir.display(),
        "full run starting"
    );
    let outcome = vibenet_sentiment::run_pipeline(&collector, &classifier, &store, &request)
        .await
        .inspect_err(|e| tracing::error!(topic = %request.topic, error = %e, "full run failed"))?;
    tracing::info!(
        topic = %outcome.topic,
        posts = outcome.post_count,
        months = outcome.month_count,
        "full run complete"
    );

    println!(
        "pipeline complete: topic '{}' {} -> {} posts across {} months",
        outcome.topic, outcome.year, outcome.post_count, outcome.month_count
    );
    println!("  posts:   {}", outcome.artifacts.posts.display());
    println!("  monthly: {}", outcome.artifacts.monthly.display());
    println!("  yearly:  {}", outcome.artifacts.yearly.display());
    Ok(())
}

/// Collects posts into `posts.csv`.
///
/// # Errors
///
/// Returns an error on invalid arguments, an empty collection, or a write failure.
pub(crate) async fn run_collect(config: &AppConfig, args: &TopicArgs) -> anyhow::Result<()> {
    let request = build_request(config, args)?;
    let collector = build_collector(config)?;
    let store = ArtifactStore::new(&config.data_dir);

    let posts = vibenet_sentiment::collect_stage(&collector, &store, &request)
        .await
        .inspect_err(|e| tracing::error!(topic = %request.topic, error = %e, "collect failed"))?;
    tracing::info!(topic = %request.topic, posts = posts.len(), "collect complete");

    println!(
        "collected {} posts for '{}' {} into {}",
        posts.len(),
        request.topic,
        request.year,
        store.paths().posts.display()
    );
    Ok(())
}

/// Scores the collected posts.
///
/// # Errors
///
/// Returns an error if nothing has been collected or the model fails.
pub(crate) async fn run_classify(config: &AppConfig) -> anyhow::Result<()> {
    let classifier = build_classifier(config)?;
    let store = ArtifactStore::new(&config.data_dir);

    let scored = vibenet_sentiment::classify_stage(&classifier, &store)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "classify failed"))?;
    tracing::info!(posts = scored.len(), "classify complete");

    println!("classified {} posts", scored.len());
    Ok(())
}

/// Aggregates the scored posts.
///
/// # Errors
///
/// Returns an error if the posts have not been scored yet.
pub(crate) fn run_aggregate(config: &AppConfig) -> anyhow::Result<()> {
    let store = ArtifactStore::new(&config.data_dir);
    let tables = vibenet_sentiment::aggregate_stage(&store)
        .inspect_err(|e| tracing::error!(error = %e, "aggregate failed"))?;
    tracing::info!(
        months = tables.monthly.len(),
        years = tables.yearly.len(),
        "aggregate complete"
    );

    println!(
        "aggregated {} months and {} years",
        tables.monthly.len(),
        tables.yearly.len()
    );
    Ok(())
}
