//! Display collaborators and the status line text.
//!
//! The status strings are user-facing copy; keep them stable.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::alarm::AlarmTime;
use crate::theme::Theme;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    AlarmSet(AlarmTime),
    Ringing(AlarmTime),
    NoAlarm,
    PickTimeFirst,
    AudioUnsupported,
    AudioNotEnabled,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::AlarmSet(t) => write!(f, "Alarm set for {t}."),
            Status::Ringing(t) => write!(f, "ALARM! ({t}) Click Clear to stop."),
            Status::NoAlarm => f.write_str("No alarm set."),
            Status::PickTimeFirst => f.write_str("Pick a time first (HH:MM)."),
            Status::AudioUnsupported => f.write_str("Audio output not supported."),
            Status::AudioNotEnabled => f.write_str("Enable audio to hear the alarm."),
        }
    }
}

/// Receives the alarm status line.
pub trait StatusDisplay: Send {
    fn show_status(&mut self, status: &str);
}

/// Receives the once-per-second clock face.
pub trait ClockDisplay: Send {
    fn show_time(&mut self, face: &str, theme: Theme);
}

/// Keeps everything it is shown. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    statuses: Arc<Mutex<Vec<String>>>,
    faces: Arc<Mutex<Vec<(String, Theme)>>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_status(&self) -> Option<String> {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn faces(&self) -> Vec<(String, Theme)> {
        self.faces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StatusDisplay for RecordingDisplay {
    fn show_status(&mut self, status: &str) {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(status.to_string());
    }
}

impl ClockDisplay for RecordingDisplay {
    fn show_time(&mut self, face: &str, theme: Theme) {
        self.faces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((face.to_string(), theme));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_copy() {
        let t = AlarmTime::new(7, 30);
        assert_eq!(Status::AlarmSet(t).to_string(), "Alarm set for 07:30.");
        assert_eq!(
            Status::Ringing(t).to_string(),
            "ALARM! (07:30) Click Clear to stop."
        );
        assert_eq!(Status::NoAlarm.to_string(), "No alarm set.");
        assert_eq!(Status::PickTimeFirst.to_string(), "Pick a time first (HH:MM).");
    }
}
