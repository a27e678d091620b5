use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// What a tick should do, given the time and the last swept day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowDecision {
    /// Before today's reminder time.
    Idle,
    /// Today has already been swept (or skipped).
    AlreadySwept,
    /// Past the grace window: mark today swept and send nothing.
    TooLate,
    Sweep,
}

/// Daily reminder time plus how long after it a sweep may still start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderWindow {
    pub at: NaiveTime,
    pub grace: chrono::Duration,
}

impl Default for ReminderWindow {
    fn default() -> Self {
        Self {
            at: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN),
            grace: chrono::Duration::minutes(10),
        }
    }
}

impl ReminderWindow {
    pub fn new(at: NaiveTime, grace_minutes: i64) -> Self {
        Self {
            at,
            grace: chrono::Duration::minutes(grace_minutes),
        }
    }

    pub fn check(&self, now: NaiveDateTime, last_swept: Option<NaiveDate>) -> WindowDecision {
        let today = now.date();
        let threshold = today.and_time(self.at);

        if now < threshold {
            return WindowDecision::Idle;
        }
        if last_swept.is_some_and(|d| d >= today) {
            return WindowDecision::AlreadySwept;
        }
        // Whole minutes: 10:10:59 is still inside a 10-minute grace.
        if (now - threshold).num_minutes() > self.grace.num_minutes() {
            return WindowDecision::TooLate;
        }
        WindowDecision::Sweep
    }
}
