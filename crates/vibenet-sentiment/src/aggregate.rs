//! Monthly and yearly sentiment aggregation.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use vibenet_core::ScoredPost;

/// Sentiment for one calendar month, keyed `"YYYY-MM"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub period: String,
    pub mean_sentiment: f64,
    pub total_engagement: u64,
    /// `NaN` when `total_engagement` is zero.
    pub weighted_sentiment: f64,
    pub post_count: usize,
}

/// Sentiment for one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyAggregate {
    pub period: i32,
    pub mean_sentiment: f64,
    pub total_engagement: u64,
    /// `NaN` when `total_engagement` is zero.
    pub weighted_sentiment: f64,
    pub post_count: usize,
}

#[derive(Debug, Default)]
struct Accumulator {
    score_sum: f64,
    weighted_sum: f64,
    engagement: u64,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, post: &ScoredPost) {
        #[allow(clippy::cast_precision_loss)]
        let engagement = post.engagement as f64;
        self.score_sum += post.sentiment_score;
        self.weighted_sum += post.sentiment_score * engagement;
        self.engagement = self.engagement.saturating_add(post.engagement);
        self.count += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    fn mean(&self) -> f64 {
        self.score_sum / self.count as f64
    }

    /// Zero engagement divides 0 by 0 and yields `NaN`.
    #[allow(clippy::cast_precision_loss)]
    fn weighted(&self) -> f64 {
        self.weighted_sum / self.engagement as f64
    }
}

/// Groups posts by calendar month, oldest month first.
#[must_use]
pub fn aggregate_monthly(posts: &[ScoredPost]) -> Vec<MonthlyAggregate> {
    let mut groups: BTreeMap<String, Accumulator> = BTreeMap::new();
    for post in posts {
        groups.entry(post.month_key()).or_default().add(post);
    }

    groups
        .into_iter()
        .map(|(period, acc)| MonthlyAggregate {
            period,
            mean_sentiment: acc.mean(),
            total_engagement: acc.engagement,
            weighted_sentiment: acc.weighted(),
            post_count: acc.count,
        })
        .collect()
}

/// Groups posts by calendar year, oldest year first.
#[must_use]
pub fn aggregate_yearly(posts: &[ScoredPost]) -> Vec<YearlyAggregate> {
    let mut groups: BTreeMap<i32, Accumulator> = BTreeMap::new();
    for post in posts {
        groups.entry(post.date.year()).or_default().add(post);
    }

    groups
        .into_iter()
        .map(|(year, acc)| YearlyAggregate {
            period: year,
            mean_sentiment: acc.mean(),
            total_engagement: acc.engagement,
            weighted_sentiment: acc.weighted(),
            post_count: acc.count,
        })
        .collect()
}
