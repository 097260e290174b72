//! Reminder and medication log records
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Added MedicationLog for completed medication reminders
//! - 1.0.0: Initial reminder model with partial updates

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status written to a medication log when a reminder is completed
pub const MEDICATION_TAKEN: &str = "taken";

/// A stored reminder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    /// Unique reminder identifier
    pub id: String,

    /// Owner of the reminder
    pub user_id: String,

    /// Display text
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Medication this reminder is for, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_id: Option<String>,

    /// Wall-clock time of day, "HH:MM" 24-hour
    pub reminder_time: String,

    pub is_active: bool,

    pub is_recurring: bool,

    /// Weekday names; only consulted for recurring reminders
    #[serde(default)]
    pub days_of_week: Vec<String>,

    /// Firing is suppressed until this instant
    #[serde(default)]
    pub snooze_until: Option<DateTime<Utc>>,

    /// When the reminder last fired
    #[serde(default)]
    pub last_triggered: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a reminder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReminder {
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub medication_id: Option<String>,
    pub reminder_time: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub days_of_week: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl NewReminder {
    pub fn new(
        user_id: impl Into<String>,
        title: impl Into<String>,
        reminder_time: impl Into<String>,
    ) -> Self {
        NewReminder {
            user_id: user_id.into(),
            title: title.into(),
            description: None,
            medication_id: None,
            reminder_time: reminder_time.into(),
            is_active: true,
            is_recurring: false,
            days_of_week: Vec::new(),
        }
    }

    /// Make this a recurring reminder on the given weekdays
    pub fn recurring_on(mut self, days: &[&str]) -> Self {
        self.is_recurring = true;
        self.days_of_week = days.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(anyhow!("Reminder title must not be empty"));
        }
        parse_reminder_time(&self.reminder_time)?;
        Ok(())
    }

    /// Turn the payload into a stored record with a fresh id
    pub fn into_reminder(self, now: DateTime<Utc>) -> Reminder {
        Reminder {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            medication_id: self.medication_id,
            reminder_time: self.reminder_time,
            is_active: self.is_active,
            is_recurring: self.is_recurring,
            days_of_week: self.days_of_week,
            snooze_until: None,
            last_triggered: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReminderUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_recurring: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snooze_until: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_triggered: Option<DateTime<Utc>>,
}

impl ReminderUpdate {
    pub fn triggered_at(at: DateTime<Utc>) -> Self {
        ReminderUpdate {
            last_triggered: Some(at),
            ..Default::default()
        }
    }

    pub fn snoozed_until(until: DateTime<Utc>) -> Self {
        ReminderUpdate {
            snooze_until: Some(until),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(time) = &self.reminder_time {
            parse_reminder_time(time)?;
        }
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            return Err(anyhow!("Reminder title must not be empty"));
        }
        Ok(())
    }

    /// Apply the set fields onto `reminder` and bump `updated_at`
    pub fn apply(self, reminder: &mut Reminder, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            reminder.title = title;
        }
        if let Some(description) = self.description {
            reminder.description = Some(description);
        }
        if let Some(time) = self.reminder_time {
            reminder.reminder_time = time;
        }
        if let Some(active) = self.is_active {
            reminder.is_active = active;
        }
        if let Some(recurring) = self.is_recurring {
            reminder.is_recurring = recurring;
        }
        if let Some(days) = self.days_of_week {
            reminder.days_of_week = days;
        }
        if let Some(until) = self.snooze_until {
            reminder.snooze_until = Some(until);
        }
        if let Some(at) = self.last_triggered {
            reminder.last_triggered = Some(at);
        }
        reminder.updated_at = now;
    }
}

/// Payload for recording a taken medication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedicationLog {
    pub user_id: String,
    pub medication_id: String,
    pub taken_at: DateTime<Utc>,
    /// "HH:MM" the dose was scheduled for
    pub scheduled_time: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationLog {
    pub id: String,
    pub user_id: String,
    pub medication_id: String,
    pub taken_at: DateTime<Utc>,
    pub scheduled_time: String,
    pub status: String,
}

impl NewMedicationLog {
    pub fn into_log(self) -> MedicationLog {
        MedicationLog {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: self.user_id,
            medication_id: self.medication_id,
            taken_at: self.taken_at,
            scheduled_time: self.scheduled_time,
            status: self.status,
        }
    }
}

/// Parse an "HH:MM" 24-hour time into minutes since midnight
pub fn parse_reminder_time(raw: &str) -> Result<u32> {
    let (hour, minute) = raw
        .trim()
        .split_once(':')
        .ok_or_else(|| anyhow!("Invalid reminder time '{raw}': expected HH:MM"))?;

    let hour: u32 = hour
        .parse()
        .map_err(|_| anyhow!("Invalid hour in reminder time '{raw}'"))?;
    let minute: u32 = minute
        .parse()
        .map_err(|_| anyhow!("Invalid minute in reminder time '{raw}'"))?;

    if hour > 23 || minute > 59 {
        return Err(anyhow!("Reminder time '{raw}' is out of range"));
    }

    Ok(hour * 60 + minute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reminder_time() {
        assert_eq!(parse_reminder_time("00:00").unwrap(), 0);
        assert_eq!(parse_reminder_time("09:05").unwrap(), 545);
        assert_eq!(parse_reminder_time("9:05").unwrap(), 545);
        assert_eq!(parse_reminder_time("23:59").unwrap(), 1439);
    }

    #[test]
    fn test_parse_reminder_time_rejects_garbage() {
        assert!(parse_reminder_time("").is_err());
        assert!(parse_reminder_time("0900").is_err());
        assert!(parse_reminder_time("24:00").is_err());
        assert!(parse_reminder_time("12:60").is_err());
        assert!(parse_reminder_time("ab:cd").is_err());
    }

    #[test]
    fn test_new_reminder_validation() {
        assert!(NewReminder::new("u", "Pills", "08:30").validate().is_ok());
        assert!(NewReminder::new("u", "Pills", "8h30").validate().is_err());
        assert!(NewReminder::new("u", "  ", "08:30").validate().is_err());
    }

    #[test]
    fn test_update_only_touches_set_fields() {
        let created = Utc::now();
        let mut reminder = NewReminder::new("u", "Pills", "08:30").into_reminder(created);
        let later = created + chrono::Duration::minutes(5);

        ReminderUpdate::triggered_at(later).apply(&mut reminder, later);

        assert_eq!(reminder.title, "Pills");
        assert_eq!(reminder.reminder_time, "08:30");
        assert_eq!(reminder.last_triggered, Some(later));
        assert_eq!(reminder.updated_at, later);
        assert!(reminder.snooze_until.is_none());
    }

    #[test]
    fn test_new_reminder_defaults_to_active() {
        let payload: NewReminder =
            serde_json::from_str(r#"{"user_id":"u","title":"t","reminder_time":"07:00"}"#).unwrap();
        assert!(payload.is_active);
        assert!(!payload.is_recurring);
        assert!(payload.days_of_week.is_empty());
    }
}
