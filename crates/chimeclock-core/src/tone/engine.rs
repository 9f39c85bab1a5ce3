//! Tone engine.
//!
//! Produces one-shot beeps and the continuous alarm warble through a shared
//! [`AudioGraph`]. Nothing sounds until [`ToneEngine::enable`] has opened the
//! graph; enabling is one-way for the life of the engine.
//!
//! ## Ringing state
//!
//! ```text
//! Silent -> (start_warble) -> Ringing -> (stop_warble) -> Silent
//! ```
//!
//! Beeps are independent of this state. The engine keeps no timers: the
//! owner calls [`ToneEngine::alternate_warble`] once per
//! [`WarbleSpec::period`] while ringing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::envelope::Envelope;
use super::graph::{lock_graph, AudioBackend, SharedGraph, VoiceId, VoiceSpec};
use super::waveform::Waveform;
use crate::error::ToneError;

/// Envelopes start and end here instead of zero.
pub const ENVELOPE_FLOOR: f32 = 0.0001;

const BEEP_PEAK: f32 = 0.18;
const BEEP_ATTACK_SECS: f64 = 0.01;
const MIN_DECAY_SECS: f64 = 0.001;
/// Extra time a beep voice lives after its envelope has decayed.
const BEEP_TAIL_SECS: f64 = 0.02;

const WARBLE_PEAK: f32 = 0.25;
const WARBLE_ATTACK_SECS: f64 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeepSpec {
    pub freq: f32,
    pub duration_secs: f64,
    pub waveform: Waveform,
}

impl Default for BeepSpec {
    fn default() -> Self {
        Self {
            freq: 1200.0,
            duration_secs: 0.03,
            waveform: Waveform::Square,
        }
    }
}

impl BeepSpec {
    fn voice(&self) -> VoiceSpec {
        // Decay ends strictly after the attack peak.
        let end = self.duration_secs.max(BEEP_ATTACK_SECS + MIN_DECAY_SECS);
        VoiceSpec {
            waveform: self.waveform,
            frequency: self.freq,
            envelope: Envelope::starting_at(ENVELOPE_FLOOR)
                .exponential_ramp_to_value_at(BEEP_PEAK, BEEP_ATTACK_SECS)
                .exponential_ramp_to_value_at(ENVELOPE_FLOOR, end),
            stop_after: Some(end + BEEP_TAIL_SECS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarbleSpec {
    pub low_hz: f32,
    pub high_hz: f32,
    pub period_ms: u64,
}

impl Default for WarbleSpec {
    fn default() -> Self {
        Self {
            low_hz: 660.0,
            high_hz: 880.0,
            period_ms: 350,
        }
    }
}

impl WarbleSpec {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms.max(1))
    }

    fn voice(&self) -> VoiceSpec {
        VoiceSpec {
            waveform: Waveform::Square,
            frequency: self.low_hz,
            envelope: Envelope::starting_at(ENVELOPE_FLOOR)
                .exponential_ramp_to_value_at(WARBLE_PEAK, WARBLE_ATTACK_SECS),
            stop_after: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Warble {
    voice: VoiceId,
    spec: WarbleSpec,
    /// The next alternation switches to `high_hz`.
    up: bool,
}

pub struct ToneEngine {
    graph: Option<SharedGraph>,
    gain: f32,
    warble: Option<Warble>,
}

impl std::fmt::Debug for ToneEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToneEngine")
            .field("enabled", &self.is_enabled())
            .field("gain", &self.gain)
            .field("ringing", &self.is_ringing())
            .finish()
    }
}

impl ToneEngine {
    /// A disabled engine. `gain` is applied to the graph once enabled.
    pub fn new(gain: f32) -> Self {
        Self {
            graph: None,
            gain: gain.clamp(0.0, 1.0),
            warble: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_enabled(&self) -> bool {
        self.graph.is_some()
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn is_ringing(&self) -> bool {
        self.warble.is_some()
    }

    /// Alternation period of the sounding warble.
    pub fn warble_period(&self) -> Option<Duration> {
        self.warble.map(|w| w.spec.period())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Open the output graph. Returns `Ok(false)` if already enabled.
    ///
    /// # Errors
    ///
    /// Propagates the backend's [`ToneError::Unsupported`]; the engine stays
    /// disabled.
    pub fn enable(&mut self, backend: &mut dyn AudioBackend) -> Result<bool, ToneError> {
        if self.graph.is_some() {
            return Ok(false);
        }
        let graph = backend.open()?;
        lock_graph(&graph).set_master_gain(self.gain);
        self.graph = Some(graph);
        tracing::info!(gain = self.gain, "audio enabled");
        Ok(true)
    }

    /// Set the master gain, clamped to `[0, 1]`. Sounding tones follow.
    pub fn set_volume(&mut self, level: f32) {
        self.gain = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
        if let Some(graph) = &self.graph {
            lock_graph(graph).set_master_gain(self.gain);
        }
    }

    /// # Errors
    ///
    /// [`ToneError::NotEnabled`] before [`enable`](Self::enable).
    pub fn beep(&mut self, spec: &BeepSpec) -> Result<VoiceId, ToneError> {
        let graph = self.graph.as_ref().ok_or(ToneError::NotEnabled)?;
        Ok(lock_graph(graph).start_voice(spec.voice()))
    }

    /// Start ringing. Returns `Ok(false)` when already ringing.
    ///
    /// # Errors
    ///
    /// [`ToneError::NotEnabled`] before [`enable`](Self::enable).
    pub fn start_warble(&mut self, spec: &WarbleSpec) -> Result<bool, ToneError> {
        let graph = self.graph.as_ref().ok_or(ToneError::NotEnabled)?;
        if self.warble.is_some() {
            return Ok(false);
        }
        let voice = lock_graph(graph).start_voice(spec.voice());
        self.warble = Some(Warble {
            voice,
            spec: *spec,
            up: true,
        });
        tracing::debug!(?voice, low = spec.low_hz, high = spec.high_hz, "warble started");
        Ok(true)
    }

    /// Switch the warble to its other frequency. Returns the new frequency,
    /// or `None` when not ringing or the voice has already been released.
    pub fn alternate_warble(&mut self) -> Option<f32> {
        let graph = self.graph.as_ref()?;
        let warble = self.warble.as_mut()?;
        let hz = if warble.up {
            warble.spec.high_hz
        } else {
            warble.spec.low_hz
        };
        if !lock_graph(graph).set_voice_frequency(warble.voice, hz) {
            return None;
        }
        warble.up = !warble.up;
        Some(hz)
    }

    /// Stop ringing and release the voice. Returns whether it was ringing.
    pub fn stop_warble(&mut self) -> bool {
        let Some(warble) = self.warble.take() else {
            return false;
        };
        if let Some(graph) = &self.graph {
            lock_graph(graph).stop_voice(warble.voice);
        }
        tracing::debug!(voice = ?warble.voice, "warble stopped");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tone::graph::{AudioGraph, OfflineBackend, UnsupportedBackend};

    fn enabled(gain: f32) -> (ToneEngine, OfflineBackend) {
        let mut backend = OfflineBackend::new(48_000);
        let mut engine = ToneEngine::new(gain);
        assert_eq!(engine.enable(&mut backend), Ok(true));
        (engine, backend)
    }

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0, |m, s| m.max(s.abs()))
    }

    #[test]
    fn tones_require_enable() {
        let mut engine = ToneEngine::new(1.0);
        assert_eq!(engine.beep(&BeepSpec::default()), Err(ToneError::NotEnabled));
        assert_eq!(
            engine.start_warble(&WarbleSpec::default()),
            Err(ToneError::NotEnabled)
        );
        assert!(!engine.is_ringing());
    }

    #[test]
    fn enable_is_one_way_and_idempotent() {
        let (mut engine, mut backend) = enabled(0.35);
        assert_eq!(engine.enable(&mut backend), Ok(false));
        assert!(engine.is_enabled());
        assert!((backend.graph().lock().unwrap().master_gain() - 0.35).abs() < 1e-6);
    }

    #[test]
    fn unsupported_backend_leaves_engine_disabled() {
        let mut engine = ToneEngine::new(1.0);
        let mut backend = UnsupportedBackend::default();
        assert!(matches!(
            engine.enable(&mut backend),
            Err(ToneError::Unsupported(_))
        ));
        assert!(!engine.is_enabled());
    }

    #[test]
    fn beep_peaks_at_fixed_level() {
        let (mut engine, backend) = enabled(1.0);
        engine.beep(&BeepSpec::default()).unwrap();
        let samples = backend.render(48_000 / 10);
        assert!((peak(&samples) - BEEP_PEAK).abs() < 1e-3);
        assert_eq!(backend.graph().lock().unwrap().active_voices(), 0);
    }

    #[test]
    fn short_beep_still_reaches_peak() {
        for duration_secs in [0.0, 0.005, BEEP_ATTACK_SECS] {
            let spec = BeepSpec {
                duration_secs,
                ..BeepSpec::default()
            };
            let envelope = spec.voice().envelope;
            assert!(
                (envelope.value_at(BEEP_ATTACK_SECS) - BEEP_PEAK).abs() < 1e-6,
                "duration {duration_secs}"
            );
            assert!(envelope.value_at(BEEP_ATTACK_SECS + 0.01) < 0.001);
        }
    }

    #[test]
    fn beep_peak_scales_with_volume() {
        let (mut loud, loud_out) = enabled(1.0);
        let (mut quiet, quiet_out) = enabled(1.0);
        quiet.set_volume(0.5);

        loud.beep(&BeepSpec::default()).unwrap();
        quiet.beep(&BeepSpec::default()).unwrap();
        let ratio = peak(&quiet_out.render(2400)) / peak(&loud_out.render(2400));
        assert!((ratio - 0.5).abs() < 1e-4, "ratio was {ratio}");
    }

    #[test]
    fn volume_is_clamped() {
        let mut engine = ToneEngine::new(0.5);
        engine.set_volume(2.0);
        assert_eq!(engine.gain(), 1.0);
        engine.set_volume(-0.5);
        assert_eq!(engine.gain(), 0.0);
        engine.set_volume(f32::NAN);
        assert_eq!(engine.gain(), 0.0);
    }

    #[test]
    fn volume_applies_to_sounding_warble() {
        let (mut engine, backend) = enabled(1.0);
        engine.start_warble(&WarbleSpec::default()).unwrap();
        assert!(peak(&backend.render(4800)) > 0.2);

        engine.set_volume(0.0);
        assert_eq!(peak(&backend.render(4800)), 0.0);
    }

    #[test]
    fn start_warble_is_idempotent() {
        let (mut engine, backend) = enabled(1.0);
        assert_eq!(engine.start_warble(&WarbleSpec::default()), Ok(true));
        assert_eq!(engine.start_warble(&WarbleSpec::default()), Ok(false));
        assert_eq!(backend.graph().lock().unwrap().active_voices(), 1);
        assert_eq!(engine.warble_period(), Some(Duration::from_millis(350)));
    }

    #[test]
    fn warble_alternates_between_two_frequencies() {
        let (mut engine, _backend) = enabled(1.0);
        engine.start_warble(&WarbleSpec::default()).unwrap();
        let seq: Vec<_> = (0..4).filter_map(|_| engine.alternate_warble()).collect();
        assert_eq!(seq, vec![880.0, 660.0, 880.0, 660.0]);
    }

    #[test]
    fn stop_warble_is_idempotent_and_releases_voice() {
        let (mut engine, backend) = enabled(1.0);
        engine.start_warble(&WarbleSpec::default()).unwrap();
        assert!(engine.stop_warble());
        assert!(!engine.is_ringing());
        assert!(!engine.stop_warble());
        assert!(!engine.is_ringing());
        assert_eq!(backend.graph().lock().unwrap().active_voices(), 0);
    }

    #[test]
    fn alternation_after_stop_does_nothing() {
        let (mut engine, backend) = enabled(1.0);
        engine.start_warble(&WarbleSpec::default()).unwrap();
        engine.stop_warble();
        assert_eq!(engine.alternate_warble(), None);
        assert_eq!(peak(&backend.render(480)), 0.0);
    }

    #[test]
    fn alternation_guards_against_released_voice() {
        let (mut engine, backend) = enabled(1.0);
        engine.start_warble(&WarbleSpec::default()).unwrap();
        backend.graph().lock().unwrap().stop_voice(VoiceId(0));
        assert_eq!(engine.alternate_warble(), None);
    }
}
