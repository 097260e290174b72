//! SQLite-backed reminder store
//!
//! One connection guarded by an async mutex. Every read-modify-write runs
//! while holding the lock, which serializes writes to the same record.

use super::ReminderStore;
use crate::core::{MedicationLog, NewMedicationLog, NewReminder, Reminder, ReminderUpdate};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use sqlite::{Connection, State, Statement};
use std::sync::Arc;
use tokio::sync::Mutex;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS reminders (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        medication_id TEXT,
        reminder_time TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        is_recurring INTEGER NOT NULL DEFAULT 0,
        days_of_week TEXT NOT NULL DEFAULT '[]',
        snooze_until TEXT,
        last_triggered TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_reminders_user ON reminders(user_id, is_active);

    CREATE TABLE IF NOT EXISTS medication_logs (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        medication_id TEXT NOT NULL,
        taken_at TEXT NOT NULL,
        scheduled_time TEXT NOT NULL,
        status TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_medication_logs_user ON medication_logs(user_id, taken_at);
";

const REMINDER_COLUMNS: &str = "id, user_id, title, description, medication_id, reminder_time, \
     is_active, is_recurring, days_of_week, snooze_until, last_triggered, created_at, updated_at";

#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and apply the schema
    pub async fn new(database_path: &str) -> Result<Self> {
        let connection = sqlite::open(database_path)
            .with_context(|| format!("Failed to open database at {database_path}"))?;
        connection
            .execute(SCHEMA)
            .context("Failed to initialize database schema")?;

        info!("Database ready at {database_path}");

        Ok(Database {
            connection: Arc::new(Mutex::new(connection)),
        })
    }
}

#[async_trait]
impl ReminderStore for Database {
    async fn list_reminders(&self, user_id: &str, active_only: bool) -> Result<Vec<Reminder>> {
        let conn = self.connection.lock().await;
        let query = format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders
             WHERE user_id = ? AND (? = 0 OR is_active = 1)
             ORDER BY reminder_time, created_at"
        );
        let mut statement = conn.prepare(query)?;
        statement.bind((1, user_id))?;
        statement.bind((2, active_only as i64))?;

        let mut reminders = Vec::new();
        while let State::Row = statement.next()? {
            reminders.push(read_reminder(&statement)?);
        }
        debug!("Loaded {} reminders for user {user_id}", reminders.len());
        Ok(reminders)
    }

    async fn get_reminder(&self, id: &str) -> Result<Option<Reminder>> {
        let conn = self.connection.lock().await;
        select_reminder(&conn, id)
    }

    async fn add_reminder(&self, reminder: NewReminder) -> Result<Reminder> {
        reminder.validate()?;
        let reminder = reminder.into_reminder(Utc::now());

        let conn = self.connection.lock().await;
        let query = format!(
            "INSERT INTO reminders ({REMINDER_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        let mut statement = conn.prepare(query)?;
        bind_reminder(&mut statement, &reminder)?;
        statement.next()?;

        debug!("Inserted reminder {} for user {}", reminder.id, reminder.user_id);
        Ok(reminder)
    }

    async fn update_reminder(
        &self,
        id: &str,
        update: ReminderUpdate,
    ) -> Result<Option<Reminder>> {
        update.validate()?;

        let conn = self.connection.lock().await;
        let Some(mut reminder) = select_reminder(&conn, id)? else {
            return Ok(None);
        };
        update.apply(&mut reminder, Utc::now());

        let mut statement = conn.prepare(
            "UPDATE reminders SET
                id = ?, user_id = ?, title = ?, description = ?, medication_id = ?,
                reminder_time = ?, is_active = ?, is_recurring = ?, days_of_week = ?,
                snooze_until = ?, last_triggered = ?, created_at = ?, updated_at = ?
             WHERE id = ?",
        )?;
        bind_reminder(&mut statement, &reminder)?;
        statement.bind((14, id))?;
        statement.next()?;

        Ok(Some(reminder))
    }

    async fn delete_reminder(&self, id: &str) -> Result<bool> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare("DELETE FROM reminders WHERE id = ?")?;
        statement.bind((1, id))?;
        statement.next()?;
        drop(statement);
        Ok(conn.change_count() > 0)
    }

    async fn add_medication_log(&self, log: NewMedicationLog) -> Result<MedicationLog> {
        let log = log.into_log();

        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "INSERT INTO medication_logs
                 (id, user_id, medication_id, taken_at, scheduled_time, status)
             VALUES (?, ?, ?, ?, ?, ?)",
        )?;
        statement.bind((1, log.id.as_str()))?;
        statement.bind((2, log.user_id.as_str()))?;
        statement.bind((3, log.medication_id.as_str()))?;
        statement.bind((4, log.taken_at.to_rfc3339().as_str()))?;
        statement.bind((5, log.scheduled_time.as_str()))?;
        statement.bind((6, log.status.as_str()))?;
        statement.next()?;

        Ok(log)
    }
}

fn select_reminder(conn: &Connection, id: &str) -> Result<Option<Reminder>> {
    let query = format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = ?");
    let mut statement = conn.prepare(query)?;
    statement.bind((1, id))?;

    match statement.next()? {
        State::Row => Ok(Some(read_reminder(&statement)?)),
        State::Done => Ok(None),
    }
}

/// Bind every column in `REMINDER_COLUMNS` order to positions 1..=13
fn bind_reminder(statement: &mut Statement<'_>, reminder: &Reminder) -> Result<()> {
    let days = serde_json::to_string(&reminder.days_of_week)?;
    let snooze_until = reminder.snooze_until.map(|t| t.to_rfc3339());
    let last_triggered = reminder.last_triggered.map(|t| t.to_rfc3339());
    let created_at = reminder.created_at.to_rfc3339();
    let updated_at = reminder.updated_at.to_rfc3339();

    statement.bind((1, reminder.id.as_str()))?;
    statement.bind((2, reminder.user_id.as_str()))?;
    statement.bind((3, reminder.title.as_str()))?;
    statement.bind((4, reminder.description.as_deref()))?;
    statement.bind((5, reminder.medication_id.as_deref()))?;
    statement.bind((6, reminder.reminder_time.as_str()))?;
    statement.bind((7, reminder.is_active as i64))?;
    statement.bind((8, reminder.is_recurring as i64))?;
    statement.bind((9, days.as_str()))?;
    statement.bind((10, snooze_until.as_deref()))?;
    statement.bind((11, last_triggered.as_deref()))?;
    statement.bind((12, created_at.as_str()))?;
    statement.bind((13, updated_at.as_str()))?;
    Ok(())
}

fn read_reminder(statement: &Statement<'_>) -> Result<Reminder> {
    let days: String = statement.read("days_of_week")?;
    let snooze_until: Option<String> = statement.read("snooze_until")?;
    let last_triggered: Option<String> = statement.read("last_triggered")?;

    Ok(Reminder {
        id: statement.read("id")?,
        user_id: statement.read("user_id")?,
        title: statement.read("title")?,
        description: statement.read("description")?,
        medication_id: statement.read("medication_id")?,
        reminder_time: statement.read("reminder_time")?,
        is_active: statement.read::<i64, _>("is_active")? != 0,
        is_recurring: statement.read::<i64, _>("is_recurring")? != 0,
        days_of_week: serde_json::from_str(&days)
            .with_context(|| format!("Corrupt days_of_week column: {days}"))?,
        snooze_until: snooze_until.as_deref().map(parse_timestamp).transpose()?,
        last_triggered: last_triggered.as_deref().map(parse_timestamp).transpose()?,
        created_at: parse_timestamp(&statement.read::<String, _>("created_at")?)?,
        updated_at: parse_timestamp(&statement.read::<String, _>("updated_at")?)?,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid timestamp in database: {raw}"))?
        .with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MEDICATION_TAKEN;
    use chrono::Duration;

    async fn temp_database() -> (tempfile::TempDir, Database, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chime.db").to_string_lossy().to_string();
        let db = Database::new(&path).await.unwrap();
        (dir, db, path)
    }

    async fn medication_logs(db: &Database, user_id: &str) -> Vec<MedicationLog> {
        let conn = db.connection.lock().await;
        let mut statement = conn
            .prepare(
                "SELECT id, user_id, medication_id, taken_at, scheduled_time, status
                 FROM medication_logs WHERE user_id = ? ORDER BY taken_at DESC",
            )
            .unwrap();
        statement.bind((1, user_id)).unwrap();

        let mut logs = Vec::new();
        while let State::Row = statement.next().unwrap() {
            logs.push(MedicationLog {
                id: statement.read::<String, _>("id").unwrap(),
                user_id: statement.read::<String, _>("user_id").unwrap(),
                medication_id: statement.read::<String, _>("medication_id").unwrap(),
                taken_at: parse_timestamp(&statement.read::<String, _>("taken_at").unwrap())
                    .unwrap(),
                scheduled_time: statement.read::<String, _>("scheduled_time").unwrap(),
                status: statement.read::<String, _>("status").unwrap(),
            });
        }
        logs
    }

    #[tokio::test]
    async fn test_add_and_list_reminders() {
        let (_dir, db, _) = temp_database().await;

        let pills = db
            .add_reminder(NewReminder::new("user1", "Pills", "08:00").recurring_on(&["Monday"]))
            .await
            .unwrap();
        db.add_reminder(NewReminder::new("user2", "Walk", "18:00"))
            .await
            .unwrap();

        let listed = db.list_reminders("user1", false).await.unwrap();
        assert_eq!(listed, vec![pills]);
        assert_eq!(listed[0].days_of_week, vec!["Monday".to_string()]);
    }

    #[tokio::test]
    async fn test_active_only_filter() {
        let (_dir, db, _) = temp_database().await;

        let mut inactive = NewReminder::new("user1", "Old", "07:00");
        inactive.is_active = false;
        db.add_reminder(inactive).await.unwrap();
        db.add_reminder(NewReminder::new("user1", "New", "07:30"))
            .await
            .unwrap();

        assert_eq!(db.list_reminders("user1", false).await.unwrap().len(), 2);
        let active = db.list_active_reminders("user1").await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "New");
    }

    #[tokio::test]
    async fn test_rejects_malformed_time() {
        let (_dir, db, _) = temp_database().await;
        assert!(db
            .add_reminder(NewReminder::new("user1", "Bad", "25:00"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (_dir, db, _) = temp_database().await;
        let reminder = db
            .add_reminder(NewReminder::new("user1", "Pills", "08:00"))
            .await
            .unwrap();

        let snooze = Utc::now() + Duration::minutes(5);
        let updated = db
            .update_reminder(&reminder.id, ReminderUpdate::snoozed_until(snooze))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            updated.snooze_until.map(|t| t.timestamp()),
            Some(snooze.timestamp())
        );

        let stored = db.get_reminder(&reminder.id).await.unwrap().unwrap();
        assert_eq!(stored.snooze_until, updated.snooze_until);

        assert!(db
            .update_reminder("missing", ReminderUpdate::default())
            .await
            .unwrap()
            .is_none());

        assert!(db.delete_reminder(&reminder.id).await.unwrap());
        assert!(!db.delete_reminder(&reminder.id).await.unwrap());
        assert!(db.get_reminder(&reminder.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let (_dir, db, path) = temp_database().await;
        let reminder = db
            .add_reminder(NewReminder::new("user1", "Pills", "08:00"))
            .await
            .unwrap();
        drop(db);

        let reopened = Database::new(&path).await.unwrap();
        let stored = reopened.get_reminder(&reminder.id).await.unwrap();
        assert_eq!(stored.map(|r| r.title), Some("Pills".to_string()));
    }

    #[tokio::test]
    async fn test_medication_logs() {
        let (_dir, db, _) = temp_database().await;
        let log = db
            .add_medication_log(NewMedicationLog {
                user_id: "user1".to_string(),
                medication_id: "med-1".to_string(),
                taken_at: Utc::now(),
                scheduled_time: "08:00".to_string(),
                status: MEDICATION_TAKEN.to_string(),
            })
            .await
            .unwrap();

        let logs = medication_logs(&db, "user1").await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].id, log.id);
        assert_eq!(logs[0].status, MEDICATION_TAKEN);
    }
}
