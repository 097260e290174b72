//! # Database Module
//!
//! Reminder persistence. The monitor and service only talk to the
//! [`ReminderStore`] trait; `Database` backs it with SQLite and
//! `MemoryStore` keeps everything in process memory.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Added MemoryStore and medication logs
//! - 1.0.0: SQLite reminder table

pub mod memory;
pub mod sqlite_store;

pub use memory::MemoryStore;
pub use sqlite_store::Database;

use crate::core::{MedicationLog, NewMedicationLog, NewReminder, Reminder, ReminderUpdate};
use anyhow::Result;
use async_trait::async_trait;

/// Storage backend for reminders.
///
/// Implementations must apply `update_reminder` atomically per record: the
/// monitor loop and request handlers may write the same reminder concurrently.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// All reminders owned by `user_id`, optionally only the active ones
    async fn list_reminders(&self, user_id: &str, active_only: bool) -> Result<Vec<Reminder>>;

    async fn get_reminder(&self, id: &str) -> Result<Option<Reminder>>;

    async fn add_reminder(&self, reminder: NewReminder) -> Result<Reminder>;

    /// Returns `None` when no reminder has this id
    async fn update_reminder(&self, id: &str, update: ReminderUpdate)
        -> Result<Option<Reminder>>;

    /// Returns `false` when no reminder has this id
    async fn delete_reminder(&self, id: &str) -> Result<bool>;

    async fn add_medication_log(&self, log: NewMedicationLog) -> Result<MedicationLog>;

    async fn list_active_reminders(&self, user_scope: &str) -> Result<Vec<Reminder>> {
        self.list_reminders(user_scope, true).await
    }
}
