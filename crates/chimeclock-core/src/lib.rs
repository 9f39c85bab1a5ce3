//! # chimeclock Core Library
//!
//! This library provides the core logic for chimeclock: a digital clock
//! with an audible per-second tick and a once-per-day alarm. All operations
//! are available through the standalone CLI binary, which is a thin layer
//! over this crate.
//!
//! ## Architecture
//!
//! - **Alarm Matcher**: decides once per calendar day whether the configured
//!   `HH:MM` has been reached
//! - **Tone Engine**: beeps and the two-tone alarm warble, mixed through a
//!   shared master gain stage
//! - **Controller**: the per-session context object that owns both and
//!   talks to the optional display collaborators
//! - **Runtime**: cancellable repeating tasks that drive the controller
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`AlarmMatcher`]: once-per-day alarm decision
//! - [`ToneEngine`]: tone production state machine
//! - [`ClockController`]: session state and user operations
//! - [`ClockRuntime`]: timers driving the controller
//! - [`Config`]: Application configuration management

pub mod alarm;
pub mod clock;
pub mod controller;
pub mod display;
pub mod error;
pub mod events;
pub mod runtime;
pub mod storage;
pub mod theme;
pub mod tone;

pub use alarm::{AlarmMatcher, AlarmTime, SecondGate, TriggerRecord};
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::ClockController;
pub use display::{ClockDisplay, RecordingDisplay, Status, StatusDisplay};
pub use error::{AlarmInputError, ConfigError, CoreError, ToneError};
pub use events::Event;
pub use runtime::{ClockRuntime, RepeatingTask, SharedController};
pub use storage::Config;
pub use theme::{clock_face, Palette, Theme};
pub use tone::{
    AudioBackend, AudioGraph, BeepSpec, OfflineBackend, SharedGraph, SynthGraph, ToneEngine,
    UnsupportedBackend, WarbleSpec, Waveform,
};
