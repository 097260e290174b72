//! Due-reminder evaluation
//!
//! Decides whether a reminder should fire at a given instant. Pure: the
//! caller supplies `now`, and "today" means the calendar date of `now` in
//! whatever timezone `now` carries.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use crate::core::{parse_reminder_time, Reminder};
use anyhow::Result;
use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc, Weekday};
use log::warn;

/// Minutes either side of `reminder_time` that still count as "now"
pub const MATCH_TOLERANCE_MINUTES: u32 = 1;

/// Evaluate a reminder, surfacing a malformed `reminder_time` as an error.
///
/// Checks run in order and stop at the first failure: active, not snoozed,
/// within the time window, on a scheduled weekday (recurring reminders with
/// explicit days only), not already fired today.
pub fn check_due<Tz: TimeZone>(reminder: &Reminder, now: &DateTime<Tz>) -> Result<bool> {
    if !reminder.is_active {
        return Ok(false);
    }

    if let Some(snooze_until) = reminder.snooze_until {
        if snooze_until > now.with_timezone(&Utc) {
            return Ok(false);
        }
    }

    // No wraparound: 23:59 vs 00:00 is 1439 minutes apart, not 1.
    let target = parse_reminder_time(&reminder.reminder_time)?;
    let current = now.hour() * 60 + now.minute();
    if target.abs_diff(current) > MATCH_TOLERANCE_MINUTES {
        return Ok(false);
    }

    if reminder.is_recurring
        && !reminder.days_of_week.is_empty()
        && !scheduled_on(&reminder.days_of_week, now.weekday())
    {
        return Ok(false);
    }

    if let Some(last) = reminder.last_triggered {
        if last.with_timezone(&now.timezone()).date_naive() == now.date_naive() {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Like [`check_due`], but a malformed reminder is logged and reported as not due
pub fn is_due<Tz: TimeZone>(reminder: &Reminder, now: &DateTime<Tz>) -> bool {
    check_due(reminder, now).unwrap_or_else(|e| {
        warn!("Skipping reminder {} ({}): {e}", reminder.id, reminder.title);
        false
    })
}

/// Keep only the reminders that are due at `now`
pub fn filter_due<Tz: TimeZone>(reminders: Vec<Reminder>, now: &DateTime<Tz>) -> Vec<Reminder> {
    reminders.into_iter().filter(|r| is_due(r, now)).collect()
}

/// Day names are matched case-insensitively; "Monday" and "mon" both work.
/// Names chrono cannot parse never match.
fn scheduled_on(days: &[String], today: Weekday) -> bool {
    days.iter()
        .filter_map(|day| day.trim().parse::<Weekday>().ok())
        .any(|day| day == today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NewReminder;
    use chrono::Duration;

    // 2024-01-01 is a Monday
    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0).unwrap()
    }

    fn reminder(time: &str) -> Reminder {
        NewReminder::new("user1", "Pills", time).into_reminder(at(1, 0, 0) - Duration::days(7))
    }

    #[test]
    fn test_inactive_never_due() {
        let mut r = reminder("09:00");
        r.is_active = false;
        r.is_recurring = true;
        r.days_of_week = vec!["Monday".to_string()];
        assert!(!is_due(&r, &at(1, 9, 0)));
        assert!(!is_due(&r, &at(2, 9, 0)));
    }

    #[test]
    fn test_snooze_suppresses() {
        let now = at(1, 9, 0);
        let mut r = reminder("09:00");

        r.snooze_until = Some(now + Duration::seconds(1));
        assert!(!is_due(&r, &now));

        // Snooze that has expired no longer matters
        r.snooze_until = Some(now - Duration::minutes(1));
        assert!(is_due(&r, &now));

        // Exactly now is not "in the future"
        r.snooze_until = Some(now);
        assert!(is_due(&r, &now));
    }

    #[test]
    fn test_time_window_tolerance() {
        let r = reminder("09:00");
        assert!(is_due(&r, &at(1, 9, 0)));
        assert!(is_due(&r, &at(1, 9, 1)));
        assert!(is_due(&r, &at(1, 8, 59)));
        assert!(!is_due(&r, &at(1, 9, 2)));
        assert!(!is_due(&r, &at(1, 8, 58)));
    }

    #[test]
    fn test_no_midnight_wraparound() {
        let r = reminder("23:59");
        assert!(!is_due(&r, &at(2, 0, 0)));
        assert!(is_due(&r, &at(1, 23, 59)));
    }

    #[test]
    fn test_recurring_weekday_filter() {
        let mut r = reminder("09:00");
        r.is_recurring = true;
        r.days_of_week = vec!["Monday".to_string()];

        assert!(is_due(&r, &at(1, 9, 0))); // Monday
        assert!(!is_due(&r, &at(2, 9, 0))); // Tuesday
    }

    #[test]
    fn test_weekday_names_are_case_insensitive() {
        let mut r = reminder("09:00");
        r.is_recurring = true;
        r.days_of_week = vec!["tuesday".to_string(), "WED".to_string()];

        assert!(!is_due(&r, &at(1, 9, 0)));
        assert!(is_due(&r, &at(2, 9, 0)));
        assert!(is_due(&r, &at(3, 9, 0)));
    }

    #[test]
    fn test_non_recurring_ignores_days() {
        let mut r = reminder("09:00");
        r.days_of_week = vec!["Monday".to_string()];
        assert!(is_due(&r, &at(2, 9, 0)));

        r.days_of_week.clear();
        for day in 1..=7 {
            assert!(is_due(&r, &at(day, 9, 0)));
        }
    }

    #[test]
    fn test_recurring_without_days_fires_every_day() {
        let mut r = reminder("09:00");
        r.is_recurring = true;
        for day in 1..=7 {
            assert!(is_due(&r, &at(day, 9, 0)));
        }
    }

    #[test]
    fn test_fires_once_per_day() {
        let fired = at(1, 9, 0);
        let mut r = reminder("09:00");
        assert!(is_due(&r, &fired));

        r.last_triggered = Some(fired);
        assert!(!is_due(&r, &fired));
        assert!(!is_due(&r, &at(1, 9, 1)));

        // Next calendar date it is eligible again
        assert!(is_due(&r, &at(2, 9, 0)));
    }

    #[test]
    fn test_triggered_today_uses_local_date() {
        // 23:30 UTC on Jan 1 is already Jan 2 at UTC+2
        let plus_two = chrono::FixedOffset::east_opt(2 * 3600).unwrap();
        let now = plus_two.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();

        let mut r = reminder("09:00");
        r.last_triggered = Some(at(1, 23, 30));
        assert!(!is_due(&r, &now));

        r.last_triggered = Some(at(1, 21, 30));
        assert!(is_due(&r, &now));
    }

    #[test]
    fn test_malformed_time_is_not_due() {
        let mut r = reminder("09:00");
        r.reminder_time = "nine".to_string();
        assert!(check_due(&r, &at(1, 9, 0)).is_err());
        assert!(!is_due(&r, &at(1, 9, 0)));
    }

    #[test]
    fn test_filter_due_skips_malformed() {
        let good = reminder("09:00");
        let mut bad = reminder("09:00");
        bad.reminder_time = "9am".to_string();
        let later = reminder("10:00");

        let due = filter_due(vec![bad, good.clone(), later], &at(1, 9, 0));
        assert_eq!(due, vec![good]);
    }
}
