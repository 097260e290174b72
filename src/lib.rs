// Core layer - shared types and configuration
pub mod core;

// Persistence layer - reminder stores
pub mod database;

// Features layer - due rule, monitor loop, controller, service
pub mod features;

// IPC layer - local control surface for the daemon
pub mod ipc;

pub use crate::core::{Config, NewReminder, Reminder, ReminderUpdate};
pub use crate::database::{Database, MemoryStore, ReminderStore};
pub use crate::features::reminders::{
    check_due, is_due, ControlOutcome, LogSink, MonitorController, MonitorSettings,
    MonitorStatus, NotificationSink, ReminderService,
};
pub use crate::ipc::{ControlRequest, ControlResponse, IpcClient, IpcServer};
