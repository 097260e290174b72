//! # Core Module
//!
//! Core domain types and configuration for the reminder daemon.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add medication log records
//! - 1.0.0: Initial creation with config and reminder models

pub mod config;
pub mod models;

// Re-export commonly used items
pub use config::{Config, DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_USER_SCOPE};
pub use models::{
    parse_reminder_time, MedicationLog, NewMedicationLog, NewReminder, Reminder, ReminderUpdate,
    MEDICATION_TAKEN,
};
