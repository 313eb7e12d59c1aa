//! Per-post sentiment decision rules.
//!
//! Evaluated in order, first match wins:
//!
//! 1. Questions (a `?` anywhere, or a leading interrogative word) are neutral
//!    and never reach the model.
//! 2. The model's most probable class below the confidence floor is neutral.
//! 3. Otherwise the score is `+confidence` for positive, `-confidence` for
//!    negative, and `0.0` for neutral.

use std::sync::LazyLock;

use regex::Regex;
use vibenet_core::{Post, ScoredPost, SentimentLabel};

use crate::error::SentimentError;
use crate::model::{ClassProbabilities, SentimentModel};

pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.55;
pub const DEFAULT_MAX_TOKENS: usize = 128;

static QUESTION_LEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(how|what|which|why|can|should|is|are|need)\b").expect("valid question regex")
});

/// Which rule produced a [`Verdict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictSource {
    Interrogative,
    BelowFloor,
    Model,
}

/// Label and signed score for one text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub label: SentimentLabel,
    pub score: f64,
    pub source: VerdictSource,
}

impl Verdict {
    fn neutral(source: VerdictSource) -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: 0.0,
            source,
        }
    }
}

/// `true` if the trimmed, lowercased text contains `?` or opens with one of
/// how, what, which, why, can, should, is, are, need.
#[must_use]
pub fn is_question(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    text.contains('?') || QUESTION_LEAD.is_match(&text)
}

/// Applies the confidence floor and signed scoring to model output.
#[must_use]
pub fn verdict_from_probabilities(probs: &ClassProbabilities, confidence_floor: f64) -> Verdict {
    let (label, confidence) = probs.argmax();
    if confidence < confidence_floor {
        return Verdict::neutral(VerdictSource::BelowFloor);
    }
    let score = match label {
        SentimentLabel::Positive => confidence,
        SentimentLabel::Negative => -confidence,
        SentimentLabel::Neutral => 0.0,
    };
    Verdict {
        label,
        score,
        source: VerdictSource::Model,
    }
}

/// Keeps the first `max_tokens` whitespace-separated tokens.
fn truncate_tokens(text: &str, max_tokens: usize) -> String {
    text.split_whitespace()
        .take(max_tokens)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sentiment classifier wrapping an injected [`SentimentModel`].
pub struct Classifier<M> {
    model: M,
    confidence_floor: f64,
    max_tokens: usize,
}

impl<M: SentimentModel> Classifier<M> {
    #[must_use]
    pub fn new(model: M, confidence_floor: f64, max_tokens: usize) -> Self {
        Self {
            model,
            confidence_floor,
            max_tokens,
        }
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Classifies a single text.
    ///
    /// # Errors
    ///
    /// Returns the model's error if inference fails.
    pub async fn classify_text(&self, text: &str) -> Result<Verdict, SentimentError> {
        let text = text.trim();
        if is_question(text) {
            return Ok(Verdict::neutral(VerdictSource::Interrogative));
        }
        let truncated = truncate_tokens(text, self.max_tokens);
        let probs = self.model.predict(&truncated).await?;
        Ok(verdict_from_probabilities(&probs, self.confidence_floor))
    }

    /// Scores every post in order, one model call per non-question post.
    ///
    /// # Errors
    ///
    /// Returns the first model error; no partial result is produced.
    pub async fn classify_posts(&self, posts: Vec<Post>) -> Result<Vec<ScoredPost>, SentimentError> {
        let total = posts.len();
        let mut scored = Vec::with_capacity(total);
        let mut questions = 0usize;
        let mut below_floor = 0usize;

        for (idx, post) in posts.into_iter().enumerate() {
            let verdict = self.classify_text(&post.text).await?;
            match verdict.source {
                VerdictSource::Interrogative => questions += 1,
                VerdictSource::BelowFloor => below_floor += 1,
                VerdictSource::Model => {}
            }
            if (idx + 1) % 50 == 0 {
                tracing::debug!(done = idx + 1, total, "classification progress");
            }
            scored.push(ScoredPost::new(post, verdict.label, verdict.score));
        }

        tracing::info!(
            total,
            questions,
            below_floor,
            model_calls = total - questions,
            "classification complete"
        );

        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;

    use super::*;

    /// Returns fixed probabilities and counts calls.
    struct StubModel {
        probs: ClassProbabilities,
        calls: AtomicUsize,
        last_input: std::sync::Mutex<Option<String>>,
    }

    impl StubModel {
        fn new(negative: f64, neutral: f64, positive: f64) -> Self {
            Self {
                probs: ClassProbabilities::new(negative, neutral, positive),
                calls: AtomicUsize::new(0),
                last_input: std::sync::Mutex::new(None),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SentimentModel for StubModel {
        async fn predict(&self, text: &str) -> Result<ClassProbabilities, SentimentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_input.lock().unwrap() = Some(text.to_string());
            Ok(self.probs)
        }
    }

    struct FailingModel;

    impl SentimentModel for FailingModel {
        async fn predict(&self, _text: &str) -> Result<ClassProbabilities, SentimentError> {
            Err(SentimentError::Model("offline".to_string()))
        }
    }

    fn classifier(model: StubModel) -> Classifier<StubModel> {
        Classifier::new(model, DEFAULT_CONFIDENCE_FLOOR, DEFAULT_MAX_TOKENS)
    }

    fn post(text: &str) -> Post {
        Post {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            text: text.to_string(),
            engagement: 1,
        }
    }

    #[test]
    fn question_mark_anywhere_is_a_question() {
        assert!(is_question("Is this coin going up?"));
        assert!(is_question("bought more today? maybe"));
    }

    #[test]
    fn lead_words_are_questions_case_insensitively() {
        for text in [
            "How to stake",
            "WHAT a day",
            "which exchange",
            "Why not",
            "can anyone help",
            "Should i sell",
            "  is it over",
            "Are we back",
            "need advice on taxes",
        ] {
            assert!(is_question(text), "{text:?} should be a question");
        }
    }

    #[test]
    fn lead_word_requires_word_boundary() {
        assert!(!is_question("Island vacation was great"));
        assert!(!is_question("Howdy everyone, great gains"));
        assert!(!is_question("Needless to say, we won"));
        assert!(!is_question("the market is up"));
    }

    #[test]
    fn below_floor_is_neutral_even_for_positive_argmax() {
        let verdict = verdict_from_probabilities(&ClassProbabilities::new(0.3, 0.3, 0.4), 0.55);
        assert_eq!(verdict.label, SentimentLabel::Neutral);
        assert_eq!(verdict.score, 0.0);
        assert_eq!(verdict.source, VerdictSource::BelowFloor);
    }

    #[test]
    fn confident_negative_scores_negative_confidence() {
        let verdict = verdict_from_probabilities(&ClassProbabilities::new(0.8, 0.15, 0.05), 0.55);
        assert_eq!(verdict.label, SentimentLabel::Negative);
        assert!((verdict.score + 0.8).abs() < 1e-12);
    }

    #[test]
    fn confident_neutral_scores_zero() {
        let verdict = verdict_from_probabilities(&ClassProbabilities::new(0.05, 0.9, 0.05), 0.55);
        assert_eq!(verdict.label, SentimentLabel::Neutral);
        assert_eq!(verdict.score, 0.0);
        assert_eq!(verdict.source, VerdictSource::Model);
    }

    #[test]
    fn floor_is_inclusive_at_threshold() {
        let verdict = verdict_from_probabilities(&ClassProbabilities::new(0.0, 0.45, 0.55), 0.55);
        assert_eq!(verdict.label, SentimentLabel::Positive);
        assert!((verdict.score - 0.55).abs() < 1e-12);
    }

    #[test]
    fn truncate_keeps_leading_tokens() {
        assert_eq!(truncate_tokens("a  b\tc d", 3), "a b c");
        assert_eq!(truncate_tokens("", 3), "");
    }

    #[tokio::test]
    async fn question_never_reaches_model() {
        let clf = classifier(StubModel::new(0.0, 0.0, 1.0));
        let verdict = clf.classify_text("Is this coin going up?").await.unwrap();
        assert_eq!(verdict.label, SentimentLabel::Neutral);
        assert_eq!(verdict.score, 0.0);
        assert_eq!(verdict.source, VerdictSource::Interrogative);
        assert_eq!(clf.model().calls(), 0);
    }

    #[tokio::test]
    async fn low_confidence_positive_is_forced_neutral() {
        let clf = classifier(StubModel::new(0.35, 0.25, 0.40));
        let verdict = clf.classify_text("Great quarter for the company").await.unwrap();
        assert_eq!(verdict.label, SentimentLabel::Neutral);
        assert_eq!(verdict.score, 0.0);
        assert_eq!(clf.model().calls(), 1);
    }

    #[tokio::test]
    async fn empty_text_is_still_scored() {
        let clf = classifier(StubModel::new(0.1, 0.8, 0.1));
        let verdict = clf.classify_text("   ").await.unwrap();
        assert_eq!(verdict.label, SentimentLabel::Neutral);
        assert_eq!(clf.model().calls(), 1);
        assert_eq!(clf.model().last_input.lock().unwrap().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn model_sees_truncated_text() {
        let clf = Classifier::new(StubModel::new(0.0, 0.0, 1.0), 0.55, 2);
        clf.classify_text("  bullish on everything ").await.unwrap();
        assert_eq!(
            clf.model().last_input.lock().unwrap().as_deref(),
            Some("bullish on")
        );
    }

    #[tokio::test]
    async fn classify_posts_preserves_order_and_invariants() {
        let clf = classifier(StubModel::new(0.02, 0.08, 0.90));
        let scored = clf
            .classify_posts(vec![post("Moon soon"), post("why is it down"), post("")])
            .await
            .unwrap();

        assert_eq!(scored.len(), 3);
        assert_eq!(scored[0].sentiment_label, SentimentLabel::Positive);
        assert!((scored[0].sentiment_score - 0.90).abs() < 1e-12);
        assert_eq!(scored[1].sentiment_label, SentimentLabel::Neutral);
        assert_eq!(clf.model().calls(), 2);

        for post in &scored {
            let neutral = post.sentiment_label == SentimentLabel::Neutral;
            assert_eq!(neutral, post.sentiment_score == 0.0);
            match post.sentiment_label {
                SentimentLabel::Positive => assert!(post.sentiment_score > 0.0),
                SentimentLabel::Negative => assert!(post.sentiment_score < 0.0),
                SentimentLabel::Neutral => {}
            }
        }
    }

    #[tokio::test]
    async fn model_failure_aborts_batch() {
        let clf = Classifier::new(FailingModel, 0.55, 128);
        let result = clf.classify_posts(vec![post("fine text")]).await;
        assert!(matches!(result, Err(SentimentError::Model(_))));
    }
}
