//! Wire types exchanged with the refinery service.

use crate::recipe::{Recipe, Step};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /preview` and `POST /generate-code`: the recipe plus the
/// dataset session it targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelinePayload {
    pub session_id: String,
    pub steps: Vec<Step>,
}

impl PipelinePayload {
    pub fn new(session_id: impl Into<String>, recipe: &Recipe) -> Self {
        Self {
            session_id: session_id.into(),
            steps: recipe.steps().to_vec(),
        }
    }
}

/// Response of `POST /upload/{session_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    pub rows_processed: u64,
    pub session_id: String,
    pub message: String,
}

/// Response of `POST /preview`: the dataset after applying the recipe,
/// sampled. Replaced wholesale on every successful preview; never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewData {
    /// Row count after transformation
    pub rows: u64,
    /// Column names, ordered
    pub columns: Vec<String>,
    /// Sample records (the service caps these at 100), name → value
    pub data: Vec<Map<String, Value>>,
}

/// Response of `POST /generate-code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub status: String,
    pub filename: String,
    pub code: String,
    pub requirements: Vec<String>,
    pub install_command: String,
}

/// One bucket of a column's value distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionBucket {
    pub label: String,
    pub value: f64,
}

/// Per-column statistics from `GET /analyze/{session_id}`.
///
/// Numeric summary fields are absent for non-numeric columns; categorical
/// summary fields are absent for numeric ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    #[serde(rename = "type")]
    pub dtype: String,
    pub missing: u64,
    pub missing_pct: f64,
    pub unique: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freq: Option<u64>,
    #[serde(default)]
    pub distribution: Vec<DistributionBucket>,
}

/// Response of `GET /analyze/{session_id}`: the full dataset profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub filename: String,
    pub total_rows: u64,
    pub total_cols: u64,
    pub memory_usage: String,
    pub duplicate_rows: u64,
    pub columns: Vec<ColumnProfile>,
}

impl AnalysisReport {
    /// The dataset's column names, in profile order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Merge the master column list with columns surfaced by the latest
/// preview, deduplicated and sorted for stable presentation.
pub fn available_columns(master: &[String], preview: Option<&PreviewData>) -> Vec<String> {
    let mut all: Vec<String> = master.to_vec();
    if let Some(preview) = preview {
        all.extend(preview.columns.iter().cloned());
    }
    all.sort();
    all.dedup();
    all
}
