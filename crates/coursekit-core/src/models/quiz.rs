//! Attempts and submissions for quiz steps.

use serde::{Deserialize, Serialize};

/// A learner's answer. The shape depends on the quiz type, so it is kept as
/// raw JSON (`{"choices": [true, false]}`, `{"text": "..."}`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reply(pub serde_json::Value);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    #[serde(default)]
    pub step: i64,
    #[serde(default)]
    pub user: i64,
    /// Quiz-specific dataset (options, matrix, code template, ...).
    pub dataset: Option<serde_json::Value>,
    pub dataset_url: Option<String>,
    pub status: Option<String>,
    pub time: Option<String>,
    pub time_left: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Correct,
    Wrong,
    Evaluation,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub status: Option<SubmissionStatus>,
    pub score: Option<f64>,
    pub hint: Option<String>,
    pub feedback: Option<serde_json::Value>,
    pub reply: Option<Reply>,
    #[serde(default)]
    pub attempt: i64,
    pub time: Option<String>,
}

impl Submission {
    pub fn is_pending(&self) -> bool {
        matches!(self.status, Some(SubmissionStatus::Evaluation))
    }
}
