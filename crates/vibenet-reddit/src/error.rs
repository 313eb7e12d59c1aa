use thiserror::Error;

/// Errors returned by the Reddit search client and the collector.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The search endpoint answered with a non-success status.
    #[error("upstream request failed with status {status}")]
    UpstreamRequestFailed { status: u16 },

    /// The response body could not be deserialized into a listing.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Topic, year, or limits rejected before any network activity.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Every month came back empty (or failed); nothing to score.
    #[error("no posts collected for '{topic}' in {year}")]
    CollectionEmpty { topic: String, year: i32 },
}
