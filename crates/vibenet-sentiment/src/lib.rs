//! Sentiment scoring and aggregation for VibeNet.
//!
//! Scores collected posts with a 3-class classifier served by TEI, applies the
//! interrogative and confidence-floor overrides, aggregates scores into
//! monthly and yearly series, and persists every stage as CSV artifacts.

pub mod aggregate;
pub mod artifacts;
pub mod classifier;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod summary;

mod tei;

pub use aggregate::{aggregate_monthly, aggregate_yearly, MonthlyAggregate, YearlyAggregate};
pub use artifacts::{ArtifactPaths, ArtifactStore, RunManifest, RunStage};
pub use classifier::{is_question, Classifier, Verdict, VerdictSource};
pub use error::SentimentError;
pub use model::{ClassProbabilities, SentimentModel};
pub use pipeline::{
    aggregate_stage, classify_stage, collect_stage, run_pipeline, AggregateTables, PipelineOutcome,
};
pub use summary::{DashboardSummary, LabelDistribution, MarketSignal};
pub use tei::TeiClassifier;
