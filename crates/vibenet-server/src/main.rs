mod api;
mod middleware;

use std::time::Duration;

use tracing_subscriber::EnvFilter;
use vibenet_reddit::{Collector, RedditSearchClient};
use vibenet_sentiment::{ArtifactStore, Classifier, TeiClassifier};

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = vibenet_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let client = RedditSearchClient::with_base_url(
        config.request_timeout_secs,
        &config.user_agent,
        &config.reddit_base_url,
    )?;
    let collector = Collector::new(
        client,
        Duration::from_millis(config.inter_request_delay_ms),
    );
    let model = TeiClassifier::new(&config.model_url, config.request_timeout_secs)?;
    let classifier = Classifier::new(model, config.confidence_floor, config.model_max_tokens);

    let state = AppState::new(
        collector,
        classifier,
        ArtifactStore::new(&config.data_dir),
        config.posts_per_month,
        config.final_limit,
    );
    let app = build_app(state);

    tracing::info!(
        env = %config.env,
        bind_addr = %config.bind_addr,
        data_dir = %config.data_dir.display(),
        "vibenet-server listening"
    );
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
