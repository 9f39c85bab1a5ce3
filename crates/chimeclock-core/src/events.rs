use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::alarm::AlarmTime;
use crate::theme::Theme;

/// Every state change in the clock produces an Event.
/// Front ends print or forward them; tests assert on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    AudioEnabled {
        gain: f32,
    },
    /// Enabling failed; audio stays off for the session.
    AudioUnavailable {
        reason: String,
    },
    VolumeChanged {
        gain: f32,
    },
    TickToggled {
        enabled: bool,
    },
    /// One per-second tick beep was emitted.
    Tick {
        at: NaiveDateTime,
    },
    AlarmSet {
        time: AlarmTime,
    },
    AlarmCleared,
    /// The configured minute was reached for the first time today.
    AlarmTriggered {
        time: AlarmTime,
        at: NaiveDateTime,
    },
    WarbleStarted {
        time: AlarmTime,
    },
    WarbleStopped,
    ThemeChanged {
        theme: Theme,
    },
}
