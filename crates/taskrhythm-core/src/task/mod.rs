//! Task types.
//!
//! A task is a unit of work owned by one user. It carries the effort it
//! needs, an optional duration and deadline, and at most one assigned
//! energy window.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::energy::WindowId;
use crate::error::ValidationError;

/// Unique identifier for a user. Identity itself is managed elsewhere.
pub type UserId = i64;

/// Unique identifier for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Effort a task requires.
///
/// Values outside the three known levels are kept verbatim as
/// `Unrecognized` so they round-trip through storage and still sort by their
/// literal text in the backlog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EffortLevel {
    High,
    Medium,
    Low,
    Unrecognized(String),
}

impl EffortLevel {
    /// Literal stored form.
    pub fn as_str(&self) -> &str {
        match self {
            EffortLevel::High => "high",
            EffortLevel::Medium => "medium",
            EffortLevel::Low => "low",
            EffortLevel::Unrecognized(raw) => raw,
        }
    }

    /// Numeric rank used by the ranked backlog order. Unknown values rank last.
    pub fn rank(&self) -> i8 {
        match self {
            EffortLevel::High => 2,
            EffortLevel::Medium => 1,
            EffortLevel::Low => 0,
            EffortLevel::Unrecognized(_) => -1,
        }
    }

    /// Strict parse for user input: only the three known levels are accepted.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match EffortLevel::from(input.trim().to_lowercase()) {
            EffortLevel::Unrecognized(_) => Err(ValidationError::InvalidValue {
                field: "effort".to_string(),
                message: format!("'{input}' is not one of high, medium, low"),
            }),
            level => Ok(level),
        }
    }
}

impl From<String> for EffortLevel {
    fn from(value: String) -> Self {
        match value.as_str() {
            "high" => EffortLevel::High,
            "medium" => EffortLevel::Medium,
            "low" => EffortLevel::Low,
            _ => EffortLevel::Unrecognized(value),
        }
    }
}

impl From<&str> for EffortLevel {
    fn from(value: &str) -> Self {
        EffortLevel::from(value.to_string())
    }
}

impl From<EffortLevel> for String {
    fn from(level: EffortLevel) -> Self {
        match level {
            EffortLevel::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EffortLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub effort: EffortLevel,
    /// Minutes. `None` means unspecified.
    pub estimated_duration: Option<u32>,
    pub deadline: Option<NaiveDate>,
    pub is_completed: bool,
    pub assigned_window: Option<WindowId>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: TaskId, user_id: UserId, title: impl Into<String>, effort: EffortLevel) -> Self {
        Self {
            id,
            user_id,
            title: title.into(),
            description: None,
            effort,
            estimated_duration: None,
            deadline: None,
            is_completed: false,
            assigned_window: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.estimated_duration = Some(minutes);
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn assigned_to(mut self, window: WindowId) -> Self {
        self.assigned_window = Some(window);
        self
    }

    pub fn completed(mut self) -> Self {
        self.is_completed = true;
        self
    }

    /// Duration used for capacity checks: the estimate, or `default_minutes`.
    pub fn effective_duration(&self, default_minutes: u32) -> u32 {
        self.estimated_duration.unwrap_or(default_minutes)
    }

    /// Not completed and not assigned: a scheduling candidate.
    pub fn is_backlog(&self) -> bool {
        !self.is_completed && self.assigned_window.is_none()
    }

    /// Whether this task consumes capacity in `window`.
    pub fn occupies(&self, window: WindowId) -> bool {
        !self.is_completed && self.assigned_window == Some(window)
    }
}

/// Fields supplied when creating a task; storage assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub effort: EffortLevel,
    pub estimated_duration: Option<u32>,
    pub deadline: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, effort: EffortLevel) -> Self {
        Self {
            title: title.into(),
            description: None,
            effort,
            estimated_duration: None,
            deadline: None,
        }
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.estimated_duration = Some(minutes);
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Boundary checks: non-empty title, positive duration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_title(&self.title)?;
        check_duration(self.estimated_duration)
    }
}

/// Partial update for an existing task. `None` leaves a field untouched;
/// an empty description clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub effort: Option<EffortLevel>,
    pub estimated_duration: Option<u32>,
    pub deadline: Option<NaiveDate>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.effort.is_none()
            && self.estimated_duration.is_none()
            && self.deadline.is_none()
    }

    /// Same boundary checks as [`NewTask::validate`], for the fields present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            check_title(title)?;
        }
        check_duration(self.estimated_duration)
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = match description.trim() {
                "" => None,
                _ => Some(description.clone()),
            };
        }
        if let Some(effort) = &self.effort {
            task.effort = effort.clone();
        }
        if let Some(minutes) = self.estimated_duration {
            task.estimated_duration = Some(minutes);
        }
        if let Some(deadline) = self.deadline {
            task.deadline = Some(deadline);
        }
    }
}

fn check_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "title".to_string(),
            message: "must not be empty".to_string(),
        });
    }
    Ok(())
}

fn check_duration(minutes: Option<u32>) -> Result<(), ValidationError> {
    if minutes == Some(0) {
        return Err(ValidationError::InvalidValue {
            field: "estimated_duration".to_string(),
            message: "must be a positive number of minutes".to_string(),
        });
    }
    Ok(())
}
