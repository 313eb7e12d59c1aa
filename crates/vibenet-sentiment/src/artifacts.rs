//! CSV artifacts shared between pipeline stages and the dashboard.
//!
//! Layout under the data directory:
//!
//! | File | Written by | Columns |
//! |------|-----------|---------|
//! | `posts.csv` | collect, then rewritten by classify | `date,text,engagement[,sentiment_label,sentiment_score]` |
//! | `monthly.csv` | aggregate | `period,mean_sentiment,total_engagement,weighted_sentiment,post_count` |
//! | `yearly.csv` | aggregate | same as monthly |
//! | `run.json` | every stage, last | [`RunManifest`] |
//!
//! Each stage deletes `run.json` before touching any CSV and writes it back
//! only after its own CSVs are complete, so readers never mistake a
//! half-written run for a finished one.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use vibenet_core::{Post, ScoredPost};

use crate::aggregate::{MonthlyAggregate, YearlyAggregate};
use crate::error::SentimentError;

const POSTS_FILE: &str = "posts.csv";
const MONTHLY_FILE: &str = "monthly.csv";
const YEARLY_FILE: &str = "yearly.csv";
const MANIFEST_FILE: &str = "run.json";

/// Last stage a run finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStage {
    Collected,
    Classified,
    Complete,
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStage::Collected => write!(f, "collected"),
            RunStage::Classified => write!(f, "classified"),
            RunStage::Complete => write!(f, "complete"),
        }
    }
}

/// What the artifacts in the data directory describe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifest {
    pub topic: String,
    pub year: i32,
    pub stage: RunStage,
    pub post_count: usize,
    pub updated_at: DateTime<Utc>,
}

/// Absolute locations of a run's artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
    pub posts: PathBuf,
    pub monthly: PathBuf,
    pub yearly: PathBuf,
    pub manifest: PathBuf,
}

/// Reads and writes the pipeline's artifacts in one directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            posts: self.dir.join(POSTS_FILE),
            monthly: self.dir.join(MONTHLY_FILE),
            yearly: self.dir.join(YEARLY_FILE),
            manifest: self.dir.join(MANIFEST_FILE),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the directory or the CSV cannot be written.
    pub fn write_posts(&self, posts: &[Post]) -> Result<(), SentimentError> {
        write_csv(&self.dir.join(POSTS_FILE), posts)
    }

    /// Reads `posts.csv`, ignoring sentiment columns if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn read_posts(&self) -> Result<Vec<Post>, SentimentError> {
        read_csv(&self.dir.join(POSTS_FILE))
    }

    /// Overwrites `posts.csv` with the sentiment columns appended.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV cannot be written.
    pub fn write_scored(&self, posts: &[ScoredPost]) -> Result<(), SentimentError> {
        write_csv(&self.dir.join(POSTS_FILE), posts)
    }

    /// # Errors
    ///
    /// Returns an error if the file is missing, malformed, or not yet scored.
    pub fn read_scored(&self) -> Result<Vec<ScoredPost>, SentimentError> {
        read_csv(&self.dir.join(POSTS_FILE))
    }

    /// # Errors
    ///
    /// Returns an error if either CSV cannot be written.
    pub fn write_aggregates(
        &self,
        monthly: &[MonthlyAggregate],
        yearly: &[YearlyAggregate],
    ) -> Result<(), SentimentError> {
        write_csv(&self.dir.join(MONTHLY_FILE), monthly)?;
        write_csv(&self.dir.join(YEARLY_FILE), yearly)
    }

    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn read_monthly(&self) -> Result<Vec<MonthlyAggregate>, SentimentError> {
        read_csv(&self.dir.join(MONTHLY_FILE))
    }

    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn read_yearly(&self) -> Result<Vec<YearlyAggregate>, SentimentError> {
        read_csv(&self.dir.join(YEARLY_FILE))
    }

    /// The current manifest, or `None` when no stage has finished.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest exists but cannot be read or parsed.
    pub fn read_manifest(&self) -> Result<Option<RunManifest>, SentimentError> {
        let path = self.dir.join(MANIFEST_FILE);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SentimentError::Io { path, source }),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| SentimentError::Manifest { path, source })
    }

    /// # Errors
    ///
    /// Returns an error if the manifest cannot be serialized or written.
    pub fn write_manifest(&self, manifest: &RunManifest) -> Result<(), SentimentError> {
        let path = self.dir.join(MANIFEST_FILE);
        let json = serde_json::to_vec_pretty(manifest).map_err(|source| {
            SentimentError::Manifest {
                path: path.clone(),
                source,
            }
        })?;
        ensure_dir(&self.dir)?;
        replace_file(&path, |tmp| {
            fs::write(tmp, &json).map_err(|source| SentimentError::Io {
                path: tmp.to_path_buf(),
                source,
            })
        })
    }

    /// Removes `run.json`. A missing manifest is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear_manifest(&self) -> Result<(), SentimentError> {
        let path = self.dir.join(MANIFEST_FILE);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SentimentError::Io { path, source }),
        }
    }
}

fn ensure_dir(dir: &Path) -> Result<(), SentimentError> {
    fs::create_dir_all(dir).map_err(|source| SentimentError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// Writes through a sibling `.tmp` file and renames it over `path`.
fn replace_file<F>(path: &Path, write: F) -> Result<(), SentimentError>
where
    F: FnOnce(&Path) -> Result<(), SentimentError>,
{
    let tmp = path.with_extension("tmp");
    write(&tmp)?;
    fs::rename(&tmp, path).map_err(|source| SentimentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), SentimentError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    replace_file(path, |tmp| {
        let artifact_err = |source: csv::Error| SentimentError::Artifact {
            path: tmp.to_path_buf(),
            source,
        };
        let mut writer = csv::Writer::from_path(tmp).map_err(artifact_err)?;
        for row in rows {
            writer.serialize(row).map_err(artifact_err)?;
        }
        writer.flush().map_err(|source| SentimentError::Io {
            path: tmp.to_path_buf(),
            source,
        })
    })?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "wrote artifact");
    Ok(())
}

fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SentimentError> {
    let artifact_err = |source: csv::Error| SentimentError::Artifact {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(artifact_err)?;
    reader
        .deserialize()
        .map(|row| row.map_err(artifact_err))
        .collect()
}
