//! HTTP client for Reddit's public, unauthenticated `search.json` endpoint.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::CollectorError;
use crate::types::{Listing, RedditPost};

const DEFAULT_BASE_URL: &str = "https://www.reddit.com/";

/// Client for Reddit search.
///
/// Use [`RedditSearchClient::new`] for production or
/// [`RedditSearchClient::with_base_url`] to point at a mock server in tests.
pub struct RedditSearchClient {
    client: Client,
    base_url: Url,
}

impl RedditSearchClient {
    /// Creates a client pointed at `www.reddit.com`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, CollectorError> {
        Self::with_base_url(timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`CollectorError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, CollectorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash, so `join("search.json")` appends rather
        // than replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| CollectorError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// Fetches up to `limit` of the newest posts matching `query` created
    /// before the Unix timestamp `before`.
    ///
    /// # Errors
    ///
    /// - [`CollectorError::Http`] on network failure.
    /// - [`CollectorError::UpstreamRequestFailed`] on a non-2xx status.
    /// - [`CollectorError::Deserialize`] if the body is not a search listing.
    pub async fn search_before(
        &self,
        query: &str,
        limit: usize,
        before: i64,
    ) -> Result<Vec<RedditPost>, CollectorError> {
        let url = self.search_url(query, limit, before)?;
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollectorError::UpstreamRequestFailed {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let listing: Listing =
            serde_json::from_str(&body).map_err(|e| CollectorError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| child.data)
            .collect())
    }

    /// Builds `search.json?q=..&sort=new&limit=..&before=..` with encoded parameters.
    fn search_url(&self, query: &str, limit: usize, before: i64) -> Result<Url, CollectorError> {
        let mut url = self
            .base_url
            .join("search.json")
            .map_err(|e| CollectorError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("sort", "new")
            .append_pair("limit", &limit.to_string())
            .append_pair("before", &before.to_string());
        Ok(url)
    }
}
