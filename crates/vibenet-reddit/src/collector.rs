//! Year-long collection: one search per month, then rank, dedup, and cap.

use std::collections::HashSet;
use std::time::Duration;

use vibenet_core::Post;

use crate::client::RedditSearchClient;
use crate::error::CollectorError;
use crate::types::RedditPost;
use crate::window::{from_unix_seconds, month_windows, MonthWindow};

/// Earliest year the search endpoint has data for.
pub const MIN_YEAR: i32 = 2005;
pub const MAX_YEAR: i32 = 9999;

/// Validated parameters for one collection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectRequest {
    pub topic: String,
    pub year: i32,
    /// Per-request `limit` sent to the search endpoint.
    pub posts_per_month: usize,
    /// Cap on the total number of posts after ranking and dedup.
    pub final_limit: usize,
}

impl CollectRequest {
    /// Validates and builds a request. The topic is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::InvalidArguments`] for an empty topic, a year
    /// outside `MIN_YEAR..=MAX_YEAR`, or a zero limit.
    pub fn new(
        topic: &str,
        year: i32,
        posts_per_month: usize,
        final_limit: usize,
    ) -> Result<Self, CollectorError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(CollectorError::InvalidArguments(
                "topic must not be empty".to_string(),
            ));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(CollectorError::InvalidArguments(format!(
                "year {year} is outside {MIN_YEAR}..={MAX_YEAR}"
            )));
        }
        if posts_per_month == 0 || final_limit == 0 {
            return Err(CollectorError::InvalidArguments(
                "posts_per_month and final_limit must be positive".to_string(),
            ));
        }
        Ok(Self {
            topic: topic.to_string(),
            year,
            posts_per_month,
            final_limit,
        })
    }
}

/// Sequential month-by-month collector with a fixed politeness delay.
pub struct Collector {
    client: RedditSearchClient,
    delay: Duration,
}

impl Collector {
    #[must_use]
    pub fn new(client: RedditSearchClient, delay: Duration) -> Self {
        Self { client, delay }
    }

    /// Collects the top posts for `request.topic` across `request.year`.
    ///
    /// A month whose request fails for any reason contributes nothing; the
    /// failure is logged and the run moves on without retrying.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::CollectionEmpty`] if no post survives filtering.
    pub async fn collect(&self, request: &CollectRequest) -> Result<Vec<Post>, CollectorError> {
        let mut posts = Vec::new();

        for (idx, window) in month_windows(request.year).iter().enumerate() {
            if idx > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match self
                .client
                .search_before(
                    &request.topic,
                    request.posts_per_month,
                    window.before_cursor(),
                )
                .await
            {
                Ok(items) => {
                    let returned = items.len();
                    let before = posts.len();
                    posts.extend(items.iter().filter_map(|item| to_post(item, window)));
                    tracing::debug!(
                        topic = %request.topic,
                        month = %window.label(),
                        returned,
                        kept = posts.len() - before,
                        "collected monthly search results"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        topic = %request.topic,
                        month = %window.label(),
                        error = %e,
                        "monthly search failed; skipping month"
                    );
                }
            }
        }

        let collected = posts.len();
        let posts = rank_and_cap(posts, request.final_limit);

        if posts.is_empty() {
            return Err(CollectorError::CollectionEmpty {
                topic: request.topic.clone(),
                year: request.year,
            });
        }

        tracing::info!(
            topic = %request.topic,
            year = request.year,
            collected,
            kept = posts.len(),
            "collection complete"
        );

        Ok(posts)
    }
}

/// Converts a search item into a [`Post`] if it was created inside `window`.
fn to_post(item: &RedditPost, window: &MonthWindow) -> Option<Post> {
    let created = from_unix_seconds(item.created_utc?)?;
    if !window.contains(created) {
        return None;
    }
    Some(Post {
        date: created.date_naive(),
        text: item.text(),
        engagement: item.engagement(),
    })
}

/// Sorts by engagement descending, drops exact-text duplicates keeping the
/// first occurrence, and truncates to `limit`.
///
/// Order among equal engagement is whatever the stable sort leaves.
#[must_use]
pub fn rank_and_cap(mut posts: Vec<Post>, limit: usize) -> Vec<Post> {
    posts.sort_by(|a, b| b.engagement.cmp(&a.engagement));

    let mut seen: HashSet<String> = HashSet::new();
    posts.retain(|post| seen.insert(post.text.clone()));
    posts.truncate(limit);
    posts
}
