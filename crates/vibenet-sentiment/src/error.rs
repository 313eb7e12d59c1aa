use std::path::PathBuf;

use thiserror::Error;
use vibenet_reddit::CollectorError;

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error(transparent)]
    Collector(#[from] CollectorError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TEI predict error: {0}")]
    Model(String),

    #[error("artifact error at {}: {source}", path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("run manifest error at {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("blocking artifact task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// A stage was asked to run before the stage it depends on finished.
    #[error("no {expected} run found in the data directory; run the earlier stages first")]
    StageOutOfOrder { expected: String },
}

impl SentimentError {
    /// `true` when collection produced zero posts.
    #[must_use]
    pub fn is_collection_empty(&self) -> bool {
        matches!(
            self,
            SentimentError::Collector(CollectorError::CollectionEmpty { .. })
        )
    }

    /// `true` when the topic/year/limits were rejected before any network call.
    #[must_use]
    pub fn is_invalid_arguments(&self) -> bool {
        matches!(
            self,
            SentimentError::Collector(CollectorError::InvalidArguments(_))
        )
    }
}
