//! Background reminder monitor
//!
//! Polls the store on a fixed interval, fires due reminders into a
//! [`NotificationSink`] and stamps `last_triggered` so they do not fire
//! twice on the same day. A failed tick is logged and the loop carries on;
//! only the shutdown signal ends it.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Injectable clock and per-tick reports
//! - 1.0.0: Initial polling loop

use crate::core::{Reminder, ReminderUpdate, DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_USER_SCOPE};
use crate::database::ReminderStore;
use crate::features::reminders::due::filter_due;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Shortest interval the monitor will sleep between ticks
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock in the process's local timezone
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Downstream receiver for reminders that just became due
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, reminder: &Reminder, fired_at: DateTime<Local>) -> Result<()>;
}

/// Sink that only writes the reminder to the log
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn notify(&self, reminder: &Reminder, fired_at: DateTime<Local>) -> Result<()> {
        info!(
            "⏰ Due reminder: {} at {} (user {}, fired {})",
            reminder.title,
            reminder.reminder_time,
            reminder.user_id,
            fired_at.format("%Y-%m-%d %H:%M:%S")
        );
        Ok(())
    }
}

/// What to watch and how often
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub user_scope: String,
    pub check_interval: Duration,
}

impl MonitorSettings {
    /// Intervals shorter than [`MIN_CHECK_INTERVAL`] are raised to it
    pub fn new(user_scope: impl Into<String>, check_interval: Duration) -> Self {
        let check_interval = if check_interval < MIN_CHECK_INTERVAL {
            warn!("Check interval {check_interval:?} too short, using {MIN_CHECK_INTERVAL:?}");
            MIN_CHECK_INTERVAL
        } else {
            check_interval
        };

        MonitorSettings {
            user_scope: user_scope.into(),
            check_interval,
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        MonitorSettings::new(
            DEFAULT_USER_SCOPE,
            Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
        )
    }
}

/// Outcome of one fetch-evaluate-update pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Active reminders fetched from the store
    pub checked: usize,
    /// Reminders that were due and handed to the sink
    pub due: usize,
    /// Due reminders whose `last_triggered` was written back
    pub marked: usize,
    /// Due reminders whose write-back failed or found no record
    pub failed_marks: usize,
}

pub struct ReminderMonitor {
    store: Arc<dyn ReminderStore>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    settings: MonitorSettings,
}

impl ReminderMonitor {
    pub fn new(
        store: Arc<dyn ReminderStore>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        settings: MonitorSettings,
    ) -> Self {
        ReminderMonitor {
            store,
            sink,
            clock,
            settings,
        }
    }

    /// Run ticks until `shutdown` holds `true` or its sender is dropped.
    ///
    /// The signal is only observed between ticks, so a tick in progress
    /// always finishes its store calls.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Reminder monitor started for user {} (interval: {}s)",
            self.settings.user_scope,
            self.settings.check_interval.as_secs()
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            if let Err(e) = self.tick().await {
                error!("Error in reminder monitoring: {e:#}");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.check_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Reminder monitor stopped for user {}", self.settings.user_scope);
    }

    /// One pass over the user's active reminders.
    ///
    /// Only a failed fetch is returned as an error; per-reminder failures
    /// are logged and counted in the report.
    pub async fn tick(&self) -> Result<TickReport> {
        let now = self.clock.now();
        debug!(
            "Checking reminders at {} on {}",
            now.format("%H:%M"),
            now.format("%A")
        );

        let reminders = self
            .store
            .list_active_reminders(&self.settings.user_scope)
            .await?;

        let mut report = TickReport {
            checked: reminders.len(),
            ..Default::default()
        };

        let due = filter_due(reminders, &now);
        if due.is_empty() {
            return Ok(report);
        }

        info!("Found {} due reminders", due.len());
        report.due = due.len();
        let fired_at = now.with_timezone(&Utc);

        for reminder in &due {
            if let Err(e) = self.sink.notify(reminder, now).await {
                warn!("Failed to deliver reminder {}: {e}", reminder.id);
            }

            match self
                .store
                .update_reminder(&reminder.id, ReminderUpdate::triggered_at(fired_at))
                .await
            {
                Ok(Some(_)) => report.marked += 1,
                Ok(None) => {
                    warn!("Reminder {} disappeared before it could be marked", reminder.id);
                    report.failed_marks += 1;
                }
                Err(e) => {
                    error!("Failed to mark reminder {} as triggered: {e}", reminder.id);
                    report.failed_marks += 1;
                }
            }
        }

        Ok(report)
    }
}
