//! # Features
//!
//! Feature modules layered on top of `core` and `database`.

pub mod reminders;

pub use reminders::{
    ControlOutcome, LogSink, MonitorController, MonitorSettings, MonitorStatus, NotificationSink,
    ReminderMonitor, ReminderService,
};
