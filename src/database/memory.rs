//! In-process reminder store backed by `DashMap`.
//!
//! Used by tests and by embedders that do not want a database file.
//! Per-record updates hold the shard lock for the entry, so concurrent
//! writers to the same reminder are serialized.

use super::ReminderStore;
use crate::core::{MedicationLog, NewMedicationLog, NewReminder, Reminder, ReminderUpdate};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryStore {
    reminders: DashMap<String, Reminder>,
    medication_logs: DashMap<String, MedicationLog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed record as-is, replacing any with the same id
    pub fn insert(&self, reminder: Reminder) {
        self.reminders.insert(reminder.id.clone(), reminder);
    }

    pub fn medication_logs(&self) -> Vec<MedicationLog> {
        self.medication_logs.iter().map(|l| l.clone()).collect()
    }
}

#[async_trait]
impl ReminderStore for MemoryStore {
    async fn list_reminders(&self, user_id: &str, active_only: bool) -> Result<Vec<Reminder>> {
        let mut reminders: Vec<Reminder> = self
            .reminders
            .iter()
            .filter(|r| r.user_id == user_id && (!active_only || r.is_active))
            .map(|r| r.clone())
            .collect();

        reminders.sort_by(|a, b| {
            a.reminder_time
                .cmp(&b.reminder_time)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(reminders)
    }

    async fn get_reminder(&self, id: &str) -> Result<Option<Reminder>> {
        Ok(self.reminders.get(id).map(|r| r.clone()))
    }

    async fn add_reminder(&self, reminder: NewReminder) -> Result<Reminder> {
        reminder.validate()?;
        let reminder = reminder.into_reminder(Utc::now());
        self.reminders.insert(reminder.id.clone(), reminder.clone());
        Ok(reminder)
    }

    async fn update_reminder(
        &self,
        id: &str,
        update: ReminderUpdate,
    ) -> Result<Option<Reminder>> {
        update.validate()?;
        Ok(self.reminders.get_mut(id).map(|mut reminder| {
            update.apply(&mut reminder, Utc::now());
            reminder.clone()
        }))
    }

    async fn delete_reminder(&self, id: &str) -> Result<bool> {
        Ok(self.reminders.remove(id).is_some())
    }

    async fn add_medication_log(&self, log: NewMedicationLog) -> Result<MedicationLog> {
        let log = log.into_log();
        self.medication_logs.insert(log.id.clone(), log.clone());
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_is_scoped_and_sorted() {
        let store = MemoryStore::new();
        store
            .add_reminder(NewReminder::new("user1", "Evening", "20:00"))
            .await
            .unwrap();
        store
            .add_reminder(NewReminder::new("user1", "Morning", "08:00"))
            .await
            .unwrap();
        store
            .add_reminder(NewReminder::new("user2", "Other", "09:00"))
            .await
            .unwrap();

        let titles: Vec<String> = store
            .list_reminders("user1", true)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["Morning", "Evening"]);
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let store = MemoryStore::new();
        let result = store
            .update_reminder("nope", ReminderUpdate::triggered_at(Utc::now()))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_rejects_bad_time() {
        let store = MemoryStore::new();
        let reminder = store
            .add_reminder(NewReminder::new("user1", "Pills", "08:00"))
            .await
            .unwrap();

        let update = ReminderUpdate {
            reminder_time: Some("8 o'clock".to_string()),
            ..Default::default()
        };
        assert!(store.update_reminder(&reminder.id, update).await.is_err());

        let stored = store.get_reminder(&reminder.id).await.unwrap().unwrap();
        assert_eq!(stored.reminder_time, "08:00");
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let reminder = store
            .add_reminder(NewReminder::new("user1", "Pills", "08:00"))
            .await
            .unwrap();
        assert!(store.delete_reminder(&reminder.id).await.unwrap());
        assert!(!store.delete_reminder(&reminder.id).await.unwrap());
    }
}
