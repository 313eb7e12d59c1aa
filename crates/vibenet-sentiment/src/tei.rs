//! TEI (Text Embeddings Inference) client for sequence classification.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SentimentError;
use crate::model::{ClassProbabilities, SentimentModel};

/// TEI HTTP client hosting a 3-class sentiment model (e.g. FinBERT).
pub struct TeiClassifier {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    inputs: &'a str,
    truncate: bool,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

impl TeiClassifier {
    /// Create a new `TeiClassifier` pointed at `{tei_url}/predict`.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(tei_url: &str, timeout_secs: u64) -> Result<Self, SentimentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/predict", tei_url.trim_end_matches('/')),
        })
    }

    async fn request(&self, text: &str) -> Result<ClassProbabilities, SentimentError> {
        let request = PredictRequest {
            inputs: text,
            truncate: true,
        };
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SentimentError::Model(format!("TEI request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SentimentError::Model(format!(
                "TEI returned status {}",
                response.status()
            )));
        }

        let scores: Vec<LabelScore> = response
            .json()
            .await
            .map_err(|e| SentimentError::Model(format!("TEI response parse error: {e}")))?;

        to_probabilities(&scores)
    }
}

impl SentimentModel for TeiClassifier {
    async fn predict(&self, text: &str) -> Result<ClassProbabilities, SentimentError> {
        self.request(text).await
    }
}

/// Maps TEI's label/score pairs onto the three classes.
///
/// Accepts named labels in any case (`positive`, `Negative`, ...) and the
/// generic `LABEL_0..2` names in negative, neutral, positive order. Classes
/// the server omits get probability zero.
fn to_probabilities(scores: &[LabelScore]) -> Result<ClassProbabilities, SentimentError> {
    let mut probs = ClassProbabilities::new(0.0, 0.0, 0.0);
    let mut matched = 0;

    for entry in scores {
        let slot = match entry.label.to_ascii_lowercase().as_str() {
            "negative" | "label_0" => &mut probs.negative,
            "neutral" | "label_1" => &mut probs.neutral,
            "positive" | "label_2" => &mut probs.positive,
            other => {
                tracing::debug!(label = other, "ignoring unknown TEI label");
                continue;
            }
        };
        *slot = entry.score;
        matched += 1;
    }

    if matched == 0 {
        return Err(SentimentError::Model(format!(
            "TEI returned no recognised sentiment labels ({} entries)",
            scores.len()
        )));
    }

    Ok(probs)
}
