//! Once-per-day alarm matching.
//!
//! The matcher is polled far more often than once a minute, so matching the
//! configured minute alone would fire repeatedly. A [`TriggerRecord`] keyed
//! on (calendar date, alarm time) suppresses every repeat for the rest of
//! that day. Changing the alarm resets the record, so the same time fires
//! again tomorrow or immediately after being re-set.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::time::AlarmTime;

/// The day and time the alarm last fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub date: NaiveDate,
    pub time: AlarmTime,
}

impl TriggerRecord {
    fn of(now: NaiveDateTime) -> Self {
        Self {
            date: now.date(),
            time: AlarmTime::of(now),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlarmMatcher {
    alarm: Option<AlarmTime>,
    #[serde(default)]
    last_trigger: Option<TriggerRecord>,
}

impl AlarmMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn alarm(&self) -> Option<AlarmTime> {
        self.alarm
    }

    pub fn last_trigger(&self) -> Option<TriggerRecord> {
        self.last_trigger
    }

    /// Whether the alarm should fire at `now`.
    ///
    /// Pure: acting on a `true` result is the caller's job, which must
    /// include [`record_trigger`](Self::record_trigger). Use
    /// [`check`](Self::check) to do both at once.
    pub fn evaluate(&self, now: NaiveDateTime) -> bool {
        let Some(alarm) = self.alarm else {
            return false;
        };
        let record = TriggerRecord::of(now);
        record.time == alarm && self.last_trigger != Some(record)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn set_alarm(&mut self, time: AlarmTime) {
        self.alarm = Some(time);
        self.last_trigger = None;
    }

    pub fn clear_alarm(&mut self) {
        self.alarm = None;
        self.last_trigger = None;
    }

    pub fn record_trigger(&mut self, now: NaiveDateTime) {
        self.last_trigger = Some(TriggerRecord::of(now));
    }

    /// Evaluate and, on a match, record the trigger in the same step.
    pub fn check(&mut self, now: NaiveDateTime) -> bool {
        if self.evaluate(now) {
            self.record_trigger(now);
            true
        } else {
            false
        }
    }
}

/// Detects the first poll of each new wall-clock second.
///
/// Only the seconds field is compared, so a poll gap longer than a whole
/// second that lands on the same seconds value is not noticed.
#[derive(Debug, Clone, Default)]
pub struct SecondGate {
    last_second: Option<u32>,
}

impl SecondGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `now` is in a different second from the previous call.
    /// The first call only primes the gate.
    pub fn advance(&mut self, now: NaiveDateTime) -> bool {
        let sec = now.second();
        match self.last_second.replace(sec) {
            None => false,
            Some(prev) => prev != sec,
        }
    }
}
