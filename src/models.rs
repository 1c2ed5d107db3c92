use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A top-level study domain, e.g. a course, with planned vs. studied hours.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Display color tag, e.g. `#1e88e5` or `primary`.
    #[serde(default)]
    pub color: String,
    /// Planned hours.
    #[serde(default)]
    pub total_hours: f64,
    /// Hours booked by completed study sessions.
    #[serde(default)]
    pub studied_hours: f64,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub estimated_hours: f64,
    /// Hours from completed sessions logged against this topic.
    #[serde(default)]
    pub studied_hours: f64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub subtopics: Vec<Subtopic>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subtopic {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
}

/// Ordered `Low < Medium < High`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// A to-do item attached to exactly one subject.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub subject_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

/// A single timed study interval. Only completed sessions count toward statistics.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: String,
    pub subject_id: String,
    /// Topic of the subject the time counts toward, if any.
    #[serde(default)]
    pub topic_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "duration")]
    pub duration_minutes: u32,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl StudySession {
    pub fn hours(&self) -> f64 {
        self.duration_minutes as f64 / 60.0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Completed,
}

/// A date-ranged, goal-oriented schedule over a set of subjects.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    /// Exclusive.
    pub end_date: NaiveDate,
    #[serde(default)]
    pub subject_ids: Vec<String>,
    #[serde(default)]
    pub daily_hours_goal: f64,
    #[serde(default)]
    pub weekly_hours_goal: f64,
    #[serde(default)]
    pub status: PlanStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CycleSubjectStatus {
    #[default]
    Pending,
    Studying,
    Paused,
    Completed,
}

/// A subject slot inside a cycle, timed independently of the others.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CycleSubject {
    pub id: String,
    pub subject_id: String,
    #[serde(default)]
    pub planned_minutes: u32,
    #[serde(default)]
    pub actual_minutes: u32,
    #[serde(default)]
    pub status: CycleSubjectStatus,
    #[serde(default)]
    pub last_studied_at: Option<DateTime<Utc>>,
    /// Scheduled review, 24 hours after the subject was completed.
    #[serde(default)]
    pub review_at: Option<DateTime<Utc>>,
}

/// A bounded-time container of subjects organized toward an exam or goal.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudyCycle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub plan_id: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: PlanStatus,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub subjects: Vec<CycleSubject>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        })
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority '{}'. Supported: low, medium, high.", other)),
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlanStatus::Draft => "draft",
            PlanStatus::Active => "active",
            PlanStatus::Paused => "paused",
            PlanStatus::Completed => "completed",
        })
    }
}

impl FromStr for PlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(PlanStatus::Draft),
            "active" => Ok(PlanStatus::Active),
            "paused" => Ok(PlanStatus::Paused),
            "completed" => Ok(PlanStatus::Completed),
            other => Err(format!(
                "unknown status '{}'. Supported: draft, active, paused, completed.",
                other
            )),
        }
    }
}

impl fmt::Display for CycleSubjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CycleSubjectStatus::Pending => "pending",
            CycleSubjectStatus::Studying => "studying",
            CycleSubjectStatus::Paused => "paused",
            CycleSubjectStatus::Completed => "completed",
        })
    }
}
