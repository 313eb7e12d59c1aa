//! Headline numbers for the dashboard.

use serde::Serialize;
use vibenet_core::{ScoredPost, SentimentLabel};

use crate::aggregate::MonthlyAggregate;

/// Mean monthly sentiment above this reads as bullish, below its negation as bearish.
pub const SIGNAL_THRESHOLD: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSignal {
    Bullish,
    Neutral,
    Bearish,
}

impl MarketSignal {
    /// `NaN` (no months) reads as neutral.
    #[must_use]
    pub fn from_sentiment(value: f64) -> Self {
        if value > SIGNAL_THRESHOLD {
            MarketSignal::Bullish
        } else if value < -SIGNAL_THRESHOLD {
            MarketSignal::Bearish
        } else {
            MarketSignal::Neutral
        }
    }

    #[must_use]
    pub fn interpretation(self) -> &'static str {
        match self {
            MarketSignal::Bullish => {
                "Sentiment is predominantly positive. Discussion tone suggests optimism and favorable perception."
            }
            MarketSignal::Bearish => {
                "Sentiment is predominantly negative. Discussion shows concern or a bearish outlook."
            }
            MarketSignal::Neutral => {
                "Discussion is mostly neutral. Content is informational rather than opinion-driven."
            }
        }
    }
}

impl std::fmt::Display for MarketSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketSignal::Bullish => write!(f, "Bullish"),
            MarketSignal::Neutral => write!(f, "Neutral"),
            MarketSignal::Bearish => write!(f, "Bearish"),
        }
    }
}

/// Post counts per label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LabelDistribution {
    pub negative: usize,
    pub neutral: usize,
    pub positive: usize,
}

impl LabelDistribution {
    #[must_use]
    pub fn from_posts(posts: &[ScoredPost]) -> Self {
        let mut dist = Self::default();
        for post in posts {
            match post.sentiment_label {
                SentimentLabel::Negative => dist.negative += 1,
                SentimentLabel::Neutral => dist.neutral += 1,
                SentimentLabel::Positive => dist.positive += 1,
            }
        }
        dist
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub topic: String,
    pub year: i32,
    pub signal: MarketSignal,
    pub interpretation: &'static str,
    /// Mean of the monthly mean sentiments.
    pub avg_sentiment: f64,
    /// Mean of the monthly weighted sentiments, skipping `NaN` months.
    pub weighted_sentiment: f64,
    /// Number of scored posts.
    pub mentions: usize,
    pub distribution: LabelDistribution,
}

impl DashboardSummary {
    #[must_use]
    pub fn build(
        topic: &str,
        year: i32,
        monthly: &[MonthlyAggregate],
        posts: &[ScoredPost],
    ) -> Self {
        let avg_sentiment = mean_skip_nan(monthly.iter().map(|m| m.mean_sentiment));
        let weighted_sentiment = mean_skip_nan(monthly.iter().map(|m| m.weighted_sentiment));
        let signal = MarketSignal::from_sentiment(avg_sentiment);

        Self {
            topic: topic.to_string(),
            year,
            signal,
            interpretation: signal.interpretation(),
            avg_sentiment,
            weighted_sentiment,
            mentions: posts.len(),
            distribution: LabelDistribution::from_posts(posts),
        }
    }
}

/// Mean of the finite-or-infinite values, ignoring `NaN`. `NaN` if nothing is left.
fn mean_skip_nan(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return f64::NAN;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = count as f64;
    sum / count
}
