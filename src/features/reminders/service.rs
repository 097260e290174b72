//! Reminder operations offered to the control surface
//!
//! Thin layer over the store: CRUD, the "due right now" query, snooze, and
//! completion with an optional medication log entry.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Medication logging on completion
//! - 1.0.0: CRUD, due query and snooze

use crate::core::{
    MedicationLog, NewMedicationLog, NewReminder, Reminder, ReminderUpdate, MEDICATION_TAKEN,
};
use crate::database::ReminderStore;
use crate::features::reminders::due::filter_due;
use crate::features::reminders::monitor::{Clock, SystemClock};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Snooze length when the caller does not pick one
pub const DEFAULT_SNOOZE_MINUTES: i64 = 5;

/// Result of completing a reminder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub reminder: Reminder,
    pub completed_at: DateTime<Utc>,
    /// Present when a medication id was supplied and the log was written
    pub medication_log: Option<MedicationLog>,
}

#[derive(Clone)]
pub struct ReminderService {
    store: Arc<dyn ReminderStore>,
    clock: Arc<dyn Clock>,
}

impl ReminderService {
    pub fn new(store: Arc<dyn ReminderStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn ReminderStore>, clock: Arc<dyn Clock>) -> Self {
        ReminderService { store, clock }
    }

    pub async fn list(&self, user_id: &str, active_only: bool) -> Result<Vec<Reminder>> {
        self.store.list_reminders(user_id, active_only).await
    }

    pub async fn create(&self, reminder: NewReminder) -> Result<Reminder> {
        let reminder = self.store.add_reminder(reminder).await?;
        info!(
            "Created reminder {} for user {} at {}",
            reminder.id, reminder.user_id, reminder.reminder_time
        );
        Ok(reminder)
    }

    pub async fn update(&self, id: &str, update: ReminderUpdate) -> Result<Reminder> {
        self.store
            .update_reminder(id, update)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if self.store.delete_reminder(id).await? {
            info!("Deleted reminder {id}");
            Ok(())
        } else {
            Err(not_found(id))
        }
    }

    /// Active reminders for `user_id` that are due at this moment
    pub async fn due_reminders(&self, user_id: &str) -> Result<Vec<Reminder>> {
        let now = self.clock.now();
        let reminders = self.store.list_active_reminders(user_id).await?;
        Ok(filter_due(reminders, &now))
    }

    /// Suppress a reminder for `minutes` from now
    pub async fn snooze(&self, id: &str, minutes: i64) -> Result<Reminder> {
        if minutes <= 0 {
            return Err(anyhow!("Snooze length must be positive, got {minutes}"));
        }

        let until = Duration::try_minutes(minutes)
            .and_then(|offset| self.clock.now().with_timezone(&Utc).checked_add_signed(offset))
            .ok_or_else(|| anyhow!("Snooze length out of range: {minutes} minutes"))?;
        let reminder = self.update(id, ReminderUpdate::snoozed_until(until)).await?;
        info!("Snoozed reminder {id} for {minutes} minutes");
        Ok(reminder)
    }

    /// Mark a reminder handled for today, logging the dose when a medication is given
    pub async fn complete(&self, id: &str, medication_id: Option<&str>) -> Result<Completion> {
        let now = self.clock.now();
        let completed_at = now.with_timezone(&Utc);
        let reminder = self
            .update(id, ReminderUpdate::triggered_at(completed_at))
            .await?;

        let medication_log = match medication_id {
            Some(medication_id) => {
                let log = NewMedicationLog {
                    user_id: reminder.user_id.clone(),
                    medication_id: medication_id.to_string(),
                    taken_at: completed_at,
                    scheduled_time: now.format("%H:%M").to_string(),
                    status: MEDICATION_TAKEN.to_string(),
                };
                match self.store.add_medication_log(log).await {
                    Ok(log) => {
                        info!("Medication log created for reminder {id}");
                        Some(log)
                    }
                    Err(e) => {
                        warn!("Failed to create medication log: {e}");
                        None
                    }
                }
            }
            None => None,
        };

        Ok(Completion {
            reminder,
            completed_at,
            medication_log,
        })
    }
}

fn not_found(id: &str) -> anyhow::Error {
    anyhow!("Reminder not found: {id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::features::reminders::due::is_due;
    use crate::features::reminders::monitor::testing::{hh_mm, local_instant, FixedClock};

    fn service(store: Arc<MemoryStore>) -> (ReminderService, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(local_instant()));
        (ReminderService::with_clock(store, clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_due_reminders_query() {
        let now = local_instant();
        let store = Arc::new(MemoryStore::new());
        let (service, _) = service(store);

        let due = service
            .create(NewReminder::new("user1", "Pills", hh_mm(&now)))
            .await
            .unwrap();
        service
            .create(NewReminder::new(
                "user1",
                "Later",
                hh_mm(&(now + Duration::hours(2))),
            ))
            .await
            .unwrap();
        service
            .create(NewReminder::new("user2", "Other user", hh_mm(&now)))
            .await
            .unwrap();

        let found = service.due_reminders("user1").await.unwrap();
        assert_eq!(found, vec![due]);
    }

    #[tokio::test]
    async fn test_snooze_suppresses_until_expiry() {
        let now = local_instant();
        let store = Arc::new(MemoryStore::new());
        let (service, _) = service(store);
        let reminder = service
            .create(NewReminder::new("user1", "Pills", hh_mm(&now)))
            .await
            .unwrap();

        let snoozed = service.snooze(&reminder.id, DEFAULT_SNOOZE_MINUTES).await.unwrap();
        assert_eq!(
            snoozed.snooze_until,
            Some(now.with_timezone(&Utc) + Duration::minutes(5))
        );
        assert!(!is_due(&snoozed, &now));
        assert!(service.due_reminders("user1").await.unwrap().is_empty());

        assert!(service.snooze(&reminder.id, 0).await.is_err());
        assert!(service.snooze("missing", 5).await.is_err());
    }

    #[tokio::test]
    async fn test_snooze_rejects_out_of_range_length() {
        let store = Arc::new(MemoryStore::new());
        let (service, _) = service(store);
        let reminder = service
            .create(NewReminder::new("user1", "Pills", "08:00"))
            .await
            .unwrap();

        assert!(service.snooze(&reminder.id, i64::MAX).await.is_err());
        assert!(service.snooze(&reminder.id, 2_000_000_000_000).await.is_err());

        let stored = service.list("user1", false).await.unwrap();
        assert!(stored[0].snooze_until.is_none());
    }

    #[tokio::test]
    async fn test_complete_with_medication_log() {
        let now = local_instant();
        let store = Arc::new(MemoryStore::new());
        let (service, _) = service(store.clone());
        let reminder = service
            .create(NewReminder::new("user1", "Pills", hh_mm(&now)))
            .await
            .unwrap();

        let completion = service.complete(&reminder.id, Some("med-7")).await.unwrap();
        assert_eq!(completion.reminder.last_triggered, Some(completion.completed_at));

        let log = completion.medication_log.unwrap();
        assert_eq!(log.medication_id, "med-7");
        assert_eq!(log.user_id, "user1");
        assert_eq!(log.scheduled_time, hh_mm(&now));
        assert_eq!(log.status, MEDICATION_TAKEN);
        assert_eq!(store.medication_logs().len(), 1);

        // Completed today, so not due any more
        assert!(service.due_reminders("user1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_complete_without_medication() {
        let store = Arc::new(MemoryStore::new());
        let (service, _) = service(store.clone());
        let reminder = service
            .create(NewReminder::new("user1", "Stretch", "10:00"))
            .await
            .unwrap();

        let completion = service.complete(&reminder.id, None).await.unwrap();
        assert!(completion.medication_log.is_none());
        assert!(store.medication_logs().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let (service, _) = service(Arc::new(MemoryStore::new()));
        assert!(service
            .update("missing", ReminderUpdate::default())
            .await
            .is_err());
        assert!(service.delete("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_due_follows_clock() {
        let now = local_instant();
        let (service, clock) = service(Arc::new(MemoryStore::new()));
        service
            .create(NewReminder::new("user1", "Pills", hh_mm(&now)))
            .await
            .unwrap();

        clock.set(now + Duration::minutes(2));
        assert!(service.due_reminders("user1").await.unwrap().is_empty());
        clock.set(now + Duration::minutes(1));
        assert_eq!(service.due_reminders("user1").await.unwrap().len(), 1);
    }
}
