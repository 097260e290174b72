//! # Reminders Feature
//!
//! Due-reminder evaluation and the background monitor that fires them.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 2.0.0: Start/stop controller replaces the always-on scheduler
//! - 1.1.0: Snooze and completion through ReminderService
//! - 1.0.0: Initial release with time-of-day reminders

pub mod controller;
pub mod due;
pub mod monitor;
pub mod service;

pub use controller::{ControlOutcome, MonitorController, MonitorStatus};
pub use due::{check_due, filter_due, is_due};
pub use monitor::{
    Clock, LogSink, MonitorSettings, NotificationSink, ReminderMonitor, SystemClock, TickReport,
};
pub use service::{Completion, ReminderService, DEFAULT_SNOOZE_MINUTES};
