//! The classifier seam: text in, class probabilities out.

use std::future::Future;

use vibenet_core::SentimentLabel;

use crate::error::SentimentError;

/// Probability over the three sentiment classes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassProbabilities {
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
}

impl ClassProbabilities {
    #[must_use]
    pub fn new(negative: f64, neutral: f64, positive: f64) -> Self {
        Self {
            negative,
            neutral,
            positive,
        }
    }

    #[must_use]
    pub fn get(&self, label: SentimentLabel) -> f64 {
        match label {
            SentimentLabel::Negative => self.negative,
            SentimentLabel::Neutral => self.neutral,
            SentimentLabel::Positive => self.positive,
        }
    }

    /// The most probable class and its probability.
    ///
    /// Ties go to the earlier class in negative, neutral, positive order.
    #[must_use]
    pub fn argmax(&self) -> (SentimentLabel, f64) {
        let mut best = (SentimentLabel::Negative, self.negative);
        for label in [SentimentLabel::Neutral, SentimentLabel::Positive] {
            let p = self.get(label);
            if p > best.1 {
                best = (label, p);
            }
        }
        best
    }
}

/// A pretrained 3-class sentiment classifier.
///
/// Implementations are built once per process and handed to
/// [`crate::Classifier`]; tests substitute a stub.
pub trait SentimentModel: Send + Sync {
    /// Class probabilities for `text`. The caller has already truncated it.
    fn predict(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<ClassProbabilities, SentimentError>> + Send;
}
