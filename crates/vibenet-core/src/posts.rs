use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A collected social post, before sentiment scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// UTC calendar day the post was created.
    pub date: NaiveDate,
    /// Title and body joined by a space, trimmed. Empty when both are missing.
    #[serde(default)]
    pub text: String,
    /// Upvote count, clamped at zero.
    pub engagement: u64,
}

/// Three-class sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

impl SentimentLabel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Positive => "positive",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A [`Post`] annotated by the classifier.
///
/// `sentiment_score` is `0.0` exactly when the label is neutral; otherwise its
/// magnitude is the model confidence and its sign follows the label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPost {
    pub date: NaiveDate,
    #[serde(default)]
    pub text: String,
    pub engagement: u64,
    pub sentiment_label: SentimentLabel,
    pub sentiment_score: f64,
}

impl ScoredPost {
    #[must_use]
    pub fn new(post: Post, sentiment_label: SentimentLabel, sentiment_score: f64) -> Self {
        Self {
            date: post.date,
            text: post.text,
            engagement: post.engagement,
            sentiment_label,
            sentiment_score,
        }
    }

    /// Month key used for monthly grouping, e.g. `"2024-03"`. Sorts
    /// chronologically for four-digit years.
    #[must_use]
    pub fn month_key(&self) -> String {
        format!("{:04}-{:02}", self.date.year(), self.date.month())
    }
}
