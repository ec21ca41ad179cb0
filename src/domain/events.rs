use super::{require_date_order, require_non_negative, require_text};
use crate::error::{ParksError, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Scheduled,
    Cancelled,
    Completed,
}

text_enum!(EventStatus {
    Scheduled => "scheduled",
    Cancelled => "cancelled",
    Completed => "completed",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub event_type: String,
    pub target_audience: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub capacity: Option<i64>,
    pub status: EventStatus,
    pub park_ids: Vec<i64>,
    pub instructor_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    pub title: String,
    pub description: Option<String>,
    pub event_type: String,
    pub target_audience: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub capacity: Option<i64>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub park_ids: Vec<i64>,
}

impl EventInput {
    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title)?;
        require_text("event_type", &self.event_type)?;
        require_date_order("start_date", Some(self.start_date), "end_date", self.end_date)?;
        if matches!(self.capacity, Some(c) if c < 0) {
            return Err(ParksError::validation("capacity must not be negative"));
        }
        Ok(())
    }
}

/// List filter; `from`/`to` select events whose date range overlaps the window.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    pub park_id: Option<i64>,
    pub event_type: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InstructorStatus {
    #[default]
    Active,
    Inactive,
}

text_enum!(InstructorStatus {
    Active => "active",
    Inactive => "inactive",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instructor {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub specialties: Vec<String>,
    pub experience_years: Option<i64>,
    pub hourly_rate: Option<f64>,
    pub status: InstructorStatus,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstructorInput {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    pub experience_years: Option<i64>,
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub status: InstructorStatus,
    pub bio: Option<String>,
}

impl InstructorInput {
    pub fn validate(&self) -> Result<()> {
        require_text("full_name", &self.full_name)?;
        if !self.email.contains('@') {
            return Err(ParksError::validation(format!(
                "'{}' is not an email address",
                self.email
            )));
        }
        if matches!(self.experience_years, Some(y) if y < 0) {
            return Err(ParksError::validation("experience_years must not be negative"));
        }
        require_non_negative("hourly_rate", self.hourly_rate)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstructorAssignment {
    pub instructor_id: i64,
}
