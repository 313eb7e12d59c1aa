//! Wire types for Reddit's `search.json` listing.

use serde::Deserialize;

/// Reddit search listing wrapper.
#[derive(Debug, Deserialize)]
pub(crate) struct Listing {
    pub(crate) data: ListingData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingData {
    #[serde(default)]
    pub(crate) children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Child {
    pub(crate) data: RedditPost,
}

/// The fields of a search result the collector reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedditPost {
    /// Creation time as fractional Unix seconds.
    pub created_utc: Option<f64>,
    pub title: Option<String>,
    pub selftext: Option<String>,
    /// Net upvotes. Can be negative.
    #[serde(default)]
    pub score: i64,
}

impl RedditPost {
    /// Title and body joined by a single space and trimmed.
    ///
    /// Missing fields count as empty strings, so a post with neither yields `""`.
    #[must_use]
    pub fn text(&self) -> String {
        let title = self.title.as_deref().unwrap_or_default();
        let body = self.selftext.as_deref().unwrap_or_default();
        format!("{title} {body}").trim().to_string()
    }

    /// Upvotes clamped at zero.
    #[must_use]
    pub fn engagement(&self) -> u64 {
        u64::try_from(self.score).unwrap_or(0)
    }
}
