//! The clock controller.
//!
//! One controller per session owns all mutable clock state: the alarm
//! matcher, the tone engine, the per-second gate and the optional display
//! collaborators. Every operation takes `&mut self`, so callers that share
//! it (see [`crate::runtime`]) serialize operations through one lock and a
//! set/clear can never interleave with half of a poll.
//!
//! Errors from the tone engine and from alarm input are handled here by
//! updating the status line; none of them reach the caller.

use chrono::NaiveDateTime;

use crate::alarm::{AlarmMatcher, AlarmTime, SecondGate};
use crate::display::{ClockDisplay, Status, StatusDisplay};
use crate::error::ToneError;
use crate::events::Event;
use crate::storage::Config;
use crate::theme::{clock_face, Theme};
use crate::tone::{AudioBackend, BeepSpec, ToneEngine, WarbleSpec};

pub struct ClockController {
    matcher: AlarmMatcher,
    tone: ToneEngine,
    gate: SecondGate,
    backend: Box<dyn AudioBackend + Send>,
    /// Set once the backend reported no usable output.
    audio_unsupported: bool,
    tick_enabled: bool,
    theme: Theme,
    beep: BeepSpec,
    warble: WarbleSpec,
    status: Status,
    status_display: Option<Box<dyn StatusDisplay>>,
    clock_display: Option<Box<dyn ClockDisplay>>,
}

impl std::fmt::Debug for ClockController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClockController")
            .field("matcher", &self.matcher)
            .field("tone", &self.tone)
            .field("tick_enabled", &self.tick_enabled)
            .field("theme", &self.theme)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl ClockController {
    pub fn new(config: &Config, backend: Box<dyn AudioBackend + Send>) -> Self {
        Self {
            matcher: AlarmMatcher::new(),
            tone: ToneEngine::new(config.gain()),
            gate: SecondGate::new(),
            backend,
            audio_unsupported: false,
            tick_enabled: config.audio.tick_enabled,
            theme: config.ui.theme,
            beep: config.beep,
            warble: config.warble,
            status: Status::NoAlarm,
            status_display: None,
            clock_display: None,
        }
    }

    pub fn with_status_display(mut self, display: Box<dyn StatusDisplay>) -> Self {
        self.status_display = Some(display);
        self
    }

    pub fn with_clock_display(mut self, display: Box<dyn ClockDisplay>) -> Self {
        self.clock_display = Some(display);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn alarm(&self) -> Option<AlarmTime> {
        self.matcher.alarm()
    }

    pub fn matcher(&self) -> &AlarmMatcher {
        &self.matcher
    }

    pub fn is_ringing(&self) -> bool {
        self.tone.is_ringing()
    }

    pub fn is_audio_enabled(&self) -> bool {
        self.tone.is_enabled()
    }

    pub fn gain(&self) -> f32 {
        self.tone.gain()
    }

    pub fn tick_enabled(&self) -> bool {
        self.tick_enabled
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn warble_period(&self) -> Option<std::time::Duration> {
        self.tone.warble_period()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Open audio output if it is not open yet.
    ///
    /// Returns the resulting event, or `None` when nothing changed. After an
    /// unsupported-output failure every later call just repeats the status.
    pub fn enable_audio(&mut self) -> Option<Event> {
        if self.tone.is_enabled() {
            return None;
        }
        if self.audio_unsupported {
            self.show(Status::AudioUnsupported);
            return None;
        }
        match self.tone.enable(self.backend.as_mut()) {
            Ok(true) => Some(Event::AudioEnabled {
                gain: self.tone.gain(),
            }),
            Ok(false) => None,
            Err(err) => {
                tracing::warn!(error = %err, "audio output unavailable");
                self.audio_unsupported = true;
                self.show(Status::AudioUnsupported);
                Some(Event::AudioUnavailable {
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Volume from a 0-100 control.
    pub fn set_volume_percent(&mut self, percent: u8) -> Event {
        self.tone.set_volume(f32::from(percent.min(100)) / 100.0);
        Event::VolumeChanged {
            gain: self.tone.gain(),
        }
    }

    pub fn set_tick_enabled(&mut self, enabled: bool) -> Event {
        self.tick_enabled = enabled;
        Event::TickToggled { enabled }
    }

    pub fn set_theme(&mut self, theme: Theme) -> Event {
        self.theme = theme;
        Event::ThemeChanged { theme }
    }

    pub fn set_alarm(&mut self, time: AlarmTime) -> Event {
        self.matcher.set_alarm(time);
        tracing::info!(%time, "alarm set");
        self.show(Status::AlarmSet(time));
        Event::AlarmSet { time }
    }

    /// Set the alarm from an `HH:MM` input field, opening audio first.
    ///
    /// Empty or malformed input leaves the current alarm untouched and asks
    /// for a time instead.
    pub fn set_alarm_input(&mut self, input: &str) -> Vec<Event> {
        let mut events: Vec<Event> = self.enable_audio().into_iter().collect();
        match AlarmTime::parse(input) {
            Ok(time) => events.push(self.set_alarm(time)),
            Err(err) => {
                tracing::debug!(error = %err, "alarm input rejected");
                self.show(Status::PickTimeFirst);
            }
        }
        events
    }

    /// Remove the alarm and silence it if ringing.
    pub fn clear_alarm(&mut self) -> Vec<Event> {
        self.matcher.clear_alarm();
        tracing::info!("alarm cleared");
        let mut events = vec![Event::AlarmCleared];
        events.extend(self.stop_warble());
        events
    }

    /// Silence the warble. Safe to call when silent.
    pub fn stop_warble(&mut self) -> Option<Event> {
        let was_ringing = self.tone.stop_warble();
        let status = match self.matcher.alarm() {
            Some(time) => Status::AlarmSet(time),
            None => Status::NoAlarm,
        };
        self.show(status);
        was_ringing.then_some(Event::WarbleStopped)
    }

    /// Ring right now.
    ///
    /// Uses `input` if it is a valid time, else the current alarm, else
    /// midnight. A different time replaces the current alarm. Does nothing
    /// beyond the audio status when output cannot be opened.
    pub fn test_alarm(&mut self, input: Option<&str>) -> Vec<Event> {
        let mut events: Vec<Event> = self.enable_audio().into_iter().collect();
        if !self.tone.is_enabled() {
            return events;
        }
        let time = input
            .and_then(|s| AlarmTime::parse(s).ok())
            .or(self.matcher.alarm())
            .unwrap_or(AlarmTime::MIDNIGHT);
        if self.matcher.alarm() != Some(time) {
            events.push(self.set_alarm(time));
        }
        events.extend(self.ring(time));
        events
    }

    /// The sub-second check. Acts at most once per wall-clock second: a
    /// tick beep when ticking is on, then the alarm match.
    ///
    /// Until audio is enabled a due alarm only asks for audio and is not
    /// recorded, so enabling later in the same minute still rings. Without
    /// any usable output the alarm triggers silently.
    pub fn poll(&mut self, now: NaiveDateTime) -> Vec<Event> {
        if !self.gate.advance(now) {
            return Vec::new();
        }

        let mut events = Vec::new();
        if self.tick_enabled && self.tone.is_enabled() {
            match self.tone.beep(&self.beep) {
                Ok(_) => events.push(Event::Tick { at: now }),
                Err(err) => tracing::debug!(error = %err, "tick skipped"),
            }
        }

        if !self.tone.is_enabled() && !self.audio_unsupported {
            if self.matcher.evaluate(now) && self.status != Status::AudioNotEnabled {
                tracing::debug!(%now, "alarm due, audio not enabled");
                self.show(Status::AudioNotEnabled);
            }
            return events;
        }

        if self.matcher.check(now) {
            if let Some(time) = self.matcher.alarm() {
                tracing::info!(%time, %now, "alarm triggered");
                events.push(Event::AlarmTriggered { time, at: now });
                events.extend(self.ring(time));
            }
        }
        events
    }

    /// Push the clock face to the display, if there is one.
    pub fn refresh_display(&mut self, now: NaiveDateTime) {
        let theme = self.theme;
        if let Some(display) = self.clock_display.as_mut() {
            display.show_time(&clock_face(now), theme);
        }
    }

    /// One warble alternation; see [`ToneEngine::alternate_warble`].
    pub fn alternate_warble(&mut self) -> Option<f32> {
        self.tone.alternate_warble()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn ring(&mut self, time: AlarmTime) -> Vec<Event> {
        if self.tone.is_ringing() {
            return Vec::new();
        }
        self.show(Status::Ringing(time));
        match self.tone.start_warble(&self.warble) {
            Ok(true) => vec![Event::WarbleStarted { time }],
            Ok(false) => Vec::new(),
            Err(ToneError::NotEnabled) => {
                tracing::debug!(%time, "alarm is silent, audio not enabled");
                Vec::new()
            }
            Err(err) => {
                tracing::warn!(error = %err, "warble failed");
                Vec::new()
            }
        }
    }

    fn show(&mut self, status: Status) {
        if let Some(display) = self.status_display.as_mut() {
            display.show_status(&status.to_string());
        }
        self.status = status;
    }
}
