//! Energy window types.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::task::UserId;

/// Unique identifier for an energy window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub i64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Energy level declared for a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    High,
    Medium,
    Low,
}

impl EnergyLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            EnergyLevel::High => "high",
            EnergyLevel::Medium => "medium",
            EnergyLevel::Low => "low",
        }
    }

    /// Parse user input (case-insensitive).
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_lowercase().as_str() {
            "high" => Ok(EnergyLevel::High),
            "medium" => Ok(EnergyLevel::Medium),
            "low" => Ok(EnergyLevel::Low),
            _ => Err(ValidationError::InvalidValue {
                field: "energy".to_string(),
                message: format!("'{input}' is not one of high, medium, low"),
            }),
        }
    }
}

impl fmt::Display for EnergyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recurring weekly time slot owned by one user.
///
/// `time_end <= time_start` means the window runs past midnight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyWindow {
    pub id: WindowId,
    pub user_id: UserId,
    pub day_of_week: Weekday,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
    pub energy_level: EnergyLevel,
    pub created_at: DateTime<Utc>,
}

impl EnergyWindow {
    pub fn new(
        id: WindowId,
        user_id: UserId,
        day_of_week: Weekday,
        time_start: NaiveTime,
        time_end: NaiveTime,
        energy_level: EnergyLevel,
    ) -> Self {
        Self {
            id,
            user_id,
            day_of_week,
            time_start,
            time_end,
            energy_level,
            created_at: Utc::now(),
        }
    }

    pub fn crosses_midnight(&self) -> bool {
        self.time_end <= self.time_start
    }

    /// Total length in minutes, midnight wrap included.
    pub fn duration_minutes(&self) -> u32 {
        crate::scheduler::capacity::duration(self)
    }

    /// Natural ordering: Monday first, then start time, then id.
    pub fn sort_key(&self) -> (u32, NaiveTime, WindowId) {
        (self.day_of_week.num_days_from_monday(), self.time_start, self.id)
    }
}

/// Fields supplied when creating a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWindow {
    pub day_of_week: Weekday,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
    pub energy_level: EnergyLevel,
}

impl NewWindow {
    pub fn new(
        day_of_week: Weekday,
        time_start: NaiveTime,
        time_end: NaiveTime,
        energy_level: EnergyLevel,
    ) -> Self {
        Self {
            day_of_week,
            time_start,
            time_end,
            energy_level,
        }
    }
}

/// Partial update for an existing window. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowUpdate {
    pub day_of_week: Option<Weekday>,
    pub time_start: Option<NaiveTime>,
    pub time_end: Option<NaiveTime>,
    pub energy_level: Option<EnergyLevel>,
}

impl WindowUpdate {
    pub fn is_empty(&self) -> bool {
        self.day_of_week.is_none()
            && self.time_start.is_none()
            && self.time_end.is_none()
            && self.energy_level.is_none()
    }

    pub fn apply(&self, window: &mut EnergyWindow) {
        if let Some(day) = self.day_of_week {
            window.day_of_week = day;
        }
        if let Some(start) = self.time_start {
            window.time_start = start;
        }
        if let Some(end) = self.time_end {
            window.time_end = end;
        }
        if let Some(level) = self.energy_level {
            window.energy_level = level;
        }
    }
}
