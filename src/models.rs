//! Data models for analysis tasks.
//!
//! This module contains the task lifecycle types, the status document
//! returned while a task runs, and the result document returned once it
//! has completed.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of an analysis task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum TaskStatus {
    /// Accepted by the backend, not yet picked up by a worker
    Pending,
    /// A worker is running the analysis
    Processing,
    /// Finished; a result document is available
    Completed,
    /// Finished with an error
    Failed,
    /// Stopped on user request
    Cancelled,
}

impl TaskStatus {
    /// Whether no further transitions can happen from this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    fn rank(&self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Processing => 1,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled => 2,
        }
    }

    /// Whether moving from `self` to `next` respects the forward-only lifecycle.
    ///
    /// Repeating the current state is allowed; leaving a terminal state is not.
    pub fn can_advance_to(&self, next: TaskStatus) -> bool {
        if *self == next {
            return true;
        }
        !self.is_terminal() && next.rank() >= self.rank()
    }

    /// Returns an emoji representation of the status.
    pub fn emoji(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "⏳",
            TaskStatus::Processing => "🔄",
            TaskStatus::Completed => "✅",
            TaskStatus::Failed => "❌",
            TaskStatus::Cancelled => "🚫",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "Pending"),
            TaskStatus::Processing => write!(f, "Processing"),
            TaskStatus::Completed => write!(f, "Completed"),
            TaskStatus::Failed => write!(f, "Failed"),
            TaskStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Worker-queue state names are passed through by some backends.
        match s.trim().to_lowercase().as_str() {
            "pending" | "queued" => Ok(TaskStatus::Pending),
            "processing" | "started" | "progress" | "running" => Ok(TaskStatus::Processing),
            "completed" | "success" => Ok(TaskStatus::Completed),
            "failed" | "failure" => Ok(TaskStatus::Failed),
            "cancelled" | "canceled" | "revoked" => Ok(TaskStatus::Cancelled),
            other => Err(format!("unknown task status: {}", other)),
        }
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Task progress as an integer percentage, always within `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Progress(u8);

impl Progress {
    /// Round and clamp a raw progress value. NaN maps to zero.
    pub fn from_raw(raw: f64) -> Self {
        if raw.is_nan() {
            return Self(0);
        }
        Self(raw.round().clamp(0.0, 100.0) as u8)
    }

    pub fn percent(&self) -> u8 {
        self.0
    }

    pub fn complete() -> Self {
        Self(100)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl Serialize for Progress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProgress {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Progress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let progress = match Option::<RawProgress>::deserialize(deserializer)? {
            None => Progress::default(),
            Some(RawProgress::Number(n)) => Progress::from_raw(n),
            Some(RawProgress::Text(s)) => s
                .trim()
                .trim_end_matches('%')
                .parse::<f64>()
                .map(Progress::from_raw)
                .unwrap_or_default(),
        };
        Ok(progress)
    }
}

/// Body of `GET /api/tasks/{id}/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: TaskStatus,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusReport {
    /// The text to show for a failed task: its error, else its message.
    pub fn failure_text(&self) -> String {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("analysis failed")
            .to_string()
    }
}

/// A predicted interest with the model's confidence in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedInterest {
    #[serde(alias = "category", alias = "name")]
    pub interest: String,
    #[serde(default, alias = "score", alias = "probability")]
    pub confidence: f64,
}

/// One named metric inside an analysis category.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub label: String,
    pub value: f64,
}

/// An analysis category flattened to its numeric metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScores {
    pub name: String,
    pub metrics: Vec<Metric>,
}

/// The result document of a completed task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticity_score: Option<f64>,
    #[serde(default)]
    pub content_analysis: BTreeMap<String, Value>,
    #[serde(default)]
    pub predicted_interests: Vec<PredictedInterest>,
}

impl AnalysisResult {
    /// Numeric metrics per category, in category name order.
    ///
    /// A category holding a bare number becomes a single metric named after
    /// the category. Non-numeric entries are dropped.
    pub fn categories(&self) -> Vec<CategoryScores> {
        self.content_analysis
            .iter()
            .map(|(name, value)| CategoryScores {
                name: name.clone(),
                metrics: numeric_metrics(name, value),
            })
            .collect()
    }
}

fn numeric_metrics(name: &str, value: &Value) -> Vec<Metric> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(|value| {
                vec![Metric {
                    label: name.to_string(),
                    value,
                }]
            })
            .unwrap_or_default(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(label, v)| {
                v.as_f64().map(|value| Metric {
                    label: label.clone(),
                    value,
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Full task document returned by `GET /api/tasks/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(alias = "task_id", deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default, deserialize_with = "deserialize_id_or_empty")]
    pub profile_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,
    /// Wall-clock duration of the analysis in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
}

impl Task {
    /// Duration reported by the backend, else derived from the timestamps.
    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration.or_else(|| {
            let started = self.started_at?;
            let completed = self.completed_at?;
            Some((completed - started).num_milliseconds() as f64 / 1000.0)
        })
    }
}

/// Response of the start-analysis endpoint: `{task_id}` or `{error}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitResponse {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub task_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Generic `{success, message, error}` envelope used by action endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Envelope {
    /// A present `error` or an explicit `success: false` marks failure.
    pub fn is_failure(&self) -> bool {
        self.error.is_some() || self.success == Some(false)
    }

    /// The text the backend wants shown for this envelope, if any.
    pub fn text(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

fn id_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    id_from_value(value).ok_or_else(|| serde::de::Error::custom("id must be a string or number"))
}

fn deserialize_id_or_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    Ok(deserialize_opt_id(deserializer)?.unwrap_or_default())
}

fn deserialize_opt_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(id_from_value))
}

/// Parse a backend timestamp: RFC 3339, or a naive ISO string taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .as_deref()
        .and_then(parse_timestamp))
}
