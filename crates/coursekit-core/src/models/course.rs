//! Course structure: courses, sections, units, lessons, steps, and the
//! progress records attached to them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub cover: Option<String>,
    pub language: Option<String>,
    pub workload: Option<String>,
    pub course_format: Option<String>,
    pub intro: Option<String>,
    pub certificate: Option<String>,
    /// Non-zero when the current user is enrolled.
    #[serde(default)]
    pub enrollment: i64,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub sections: Vec<i64>,
    #[serde(default)]
    pub instructors: Vec<i64>,
    pub progress: Option<String>,
    pub review_summary: Option<i64>,
    pub learners_count: Option<i64>,
    pub slug: Option<String>,
    pub begin_date: Option<String>,
    pub end_date: Option<String>,
}

impl Course {
    pub fn is_enrolled(&self) -> bool {
        self.enrollment != 0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Section {
    pub id: i64,
    #[serde(default)]
    pub course: i64,
    #[serde(default)]
    pub units: Vec<i64>,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub title: String,
    pub slug: Option<String>,
    pub progress: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_exam: bool,
    pub soft_deadline: Option<String>,
    pub hard_deadline: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Unit {
    pub id: i64,
    #[serde(default)]
    pub section: i64,
    #[serde(default)]
    pub lesson: i64,
    #[serde(default)]
    pub assignments: Vec<i64>,
    #[serde(default)]
    pub position: i32,
    pub progress: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub steps: Vec<i64>,
    pub cover_url: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    pub time_to_complete: Option<i64>,
    pub progress: Option<String>,
}

/// Content block of a step (text, video, or a quiz type).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Block {
    pub name: String,
    pub text: Option<String>,
    pub video: Option<serde_json::Value>,
    pub options: Option<serde_json::Value>,
}

impl Block {
    pub fn is_theory(&self) -> bool {
        matches!(self.name.as_str(), "text" | "video")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Step {
    pub id: i64,
    #[serde(default)]
    pub lesson: i64,
    #[serde(default)]
    pub position: i32,
    pub status: Option<String>,
    pub block: Option<Block>,
    pub progress: Option<String>,
    pub discussion_proxy: Option<String>,
    #[serde(default)]
    pub discussions_count: i64,
    #[serde(default)]
    pub has_submissions_restrictions: bool,
    pub max_submissions_count: Option<i64>,
}

/// Progress record; ids are string keys like `77-1234`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Progress {
    pub id: String,
    #[serde(default)]
    pub cost: i64,
    pub score: Option<String>,
    #[serde(default)]
    pub n_steps: i64,
    #[serde(default)]
    pub n_steps_passed: i64,
    #[serde(default)]
    pub is_passed: bool,
    pub last_viewed: Option<String>,
}

impl Progress {
    /// Fraction of steps passed, 0.0 when the unit has no steps.
    pub fn completion(&self) -> f64 {
        if self.n_steps <= 0 {
            0.0
        } else {
            self.n_steps_passed as f64 / self.n_steps as f64
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    #[serde(default)]
    pub unit: i64,
    #[serde(default)]
    pub step: i64,
    pub progress: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LastStep {
    pub id: String,
    pub unit: Option<i64>,
    pub lesson: Option<i64>,
    pub step: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseCollection {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub language: String,
    pub description: Option<String>,
    #[serde(default)]
    pub courses: Vec<i64>,
    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseReview {
    pub id: i64,
    #[serde(default)]
    pub course: i64,
    #[serde(default)]
    pub user: i64,
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub text: String,
    pub create_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: i64,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub target_id: i64,
    #[serde(default)]
    pub target_type: String,
    pub course: Option<i64>,
    pub course_title: Option<String>,
    pub course_cover: Option<String>,
}
