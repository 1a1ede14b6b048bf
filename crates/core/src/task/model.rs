//! Task model definitions

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::date::{date_key, normalize_date};

/// Task priority level, stored as a one-character code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Low
    }
}

impl TaskPriority {
    /// Parse a stored priority code ("1", "2" or "3")
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "1" => Some(Self::Low),
            "2" => Some(Self::Medium),
            "3" => Some(Self::High),
            _ => None,
        }
    }

    /// The code written to the `color` column
    pub fn code(self) -> &'static str {
        match self {
            Self::Low => "1",
            Self::Medium => "2",
            Self::High => "3",
        }
    }

    /// Leaderboard weight of a completed task with this priority
    pub fn weight(self) -> f64 {
        match self {
            Self::Low => 1.0,
            Self::Medium => 2.0,
            Self::High => 3.0,
        }
    }
}

/// Map legacy colour names onto priority codes.
///
/// Numeric codes pass through untouched; unknown names become the low code.
pub fn normalize_priority_code(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.parse::<i64>().is_ok() {
        return trimmed.to_string();
    }
    let priority = match trimmed.to_lowercase().as_str() {
        "red" => TaskPriority::High,
        "yellow" => TaskPriority::Medium,
        _ => TaskPriority::Low,
    };
    priority.code().to_string()
}

/// A row of the `tasks` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    /// Calendar day as `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub time_start: Option<String>,
    #[serde(default)]
    pub time_end: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Priority code; the column predates priorities and is still named `color`
    #[serde(rename = "color")]
    pub priority_code: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new task for the given day
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            date: date_key(date),
            time_start: None,
            time_end: None,
            description: None,
            priority_code: TaskPriority::default().code().to_string(),
            is_completed: false,
            user_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Set the owning user
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the start and end clock strings
    pub fn with_time_range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.time_start = Some(start.into());
        self.time_end = Some(end.into());
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority_code = priority.code().to_string();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the completion flag
    pub fn completed(mut self, is_completed: bool) -> Self {
        self.is_completed = is_completed;
        self
    }

    /// The decoded priority, if the stored code is a known one
    pub fn priority(&self) -> Option<TaskPriority> {
        TaskPriority::from_code(&self.priority_code)
    }

    /// The calendar day of this task, with malformed dates read as `today`
    pub fn day(&self, today: NaiveDate) -> NaiveDate {
        normalize_date(&self.date, today)
    }

    /// Rewrite the date column into its canonical form
    pub fn with_normalized_date(mut self, today: NaiveDate) -> Self {
        self.date = date_key(self.day(today));
        self
    }

    /// Rewrite a legacy colour name into a priority code
    pub fn with_normalized_priority(mut self) -> Self {
        self.priority_code = normalize_priority_code(&self.priority_code);
        self
    }
}
