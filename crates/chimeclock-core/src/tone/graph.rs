//! The output graph: voices mixed into a shared master gain stage.
//!
//! [`AudioGraph`] is the seam between the tone engine and whatever produces
//! sound. [`SynthGraph`] is the software implementation; it is also what an
//! output device pulls samples from, so every graph is shared behind a mutex.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use super::envelope::Envelope;
use super::waveform::Waveform;
use crate::error::ToneError;

pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Handle to a sounding voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoiceId(pub u64);

/// Everything needed to start one oscillator voice.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSpec {
    pub waveform: Waveform,
    pub frequency: f32,
    pub envelope: Envelope,
    /// Seconds after which the voice stops by itself. `None` sounds until
    /// stopped.
    pub stop_after: Option<f64>,
}

pub trait AudioGraph: Send {
    fn master_gain(&self) -> f32;

    /// Takes effect on voices already sounding.
    fn set_master_gain(&mut self, gain: f32);

    fn start_voice(&mut self, spec: VoiceSpec) -> VoiceId;

    /// Returns false if the voice no longer exists.
    fn set_voice_frequency(&mut self, id: VoiceId, hz: f32) -> bool;

    /// Stop and release a voice. Returns false if it was already gone.
    fn stop_voice(&mut self, id: VoiceId) -> bool;

    fn has_voice(&self, id: VoiceId) -> bool;
}

pub type SharedGraph = Arc<Mutex<dyn AudioGraph>>;

/// Opens the output graph. Called once, when audio is enabled.
pub trait AudioBackend {
    /// # Errors
    ///
    /// [`ToneError::Unsupported`] when there is no usable output.
    fn open(&mut self) -> Result<SharedGraph, ToneError>;
}

pub(crate) fn lock_graph(graph: &SharedGraph) -> MutexGuard<'_, dyn AudioGraph + 'static> {
    graph.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Software synthesis ───────────────────────────────────────────────

#[derive(Debug)]
struct ActiveVoice {
    id: VoiceId,
    waveform: Waveform,
    frequency: f32,
    phase: f64,
    elapsed: u64,
    stop_at: Option<u64>,
    envelope: Envelope,
}

/// Mixes voices sample by sample: oscillator × envelope × master gain.
#[derive(Debug)]
pub struct SynthGraph {
    sample_rate: u32,
    master_gain: f32,
    next_id: u64,
    voices: Vec<ActiveVoice>,
}

impl SynthGraph {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            master_gain: 1.0,
            next_id: 0,
            voices: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn voice_frequency(&self, id: VoiceId) -> Option<f32> {
        self.voices.iter().find(|v| v.id == id).map(|v| v.frequency)
    }

    /// Produce the next mono sample and advance every voice.
    pub fn next_sample(&mut self) -> f32 {
        let rate = self.sample_rate as f64;
        let mut mix = 0.0f32;
        for voice in &mut self.voices {
            let t = voice.elapsed as f64 / rate;
            mix += voice.waveform.sample(voice.phase) * voice.envelope.value_at(t);
            voice.phase = (voice.phase + voice.frequency as f64 / rate).fract();
            voice.elapsed += 1;
        }
        self.voices
            .retain(|v| v.stop_at.map_or(true, |stop| v.elapsed < stop));
        mix * self.master_gain
    }

    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }
}

impl Default for SynthGraph {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl AudioGraph for SynthGraph {
    fn master_gain(&self) -> f32 {
        self.master_gain
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain.clamp(0.0, 1.0);
    }

    fn start_voice(&mut self, spec: VoiceSpec) -> VoiceId {
        let id = VoiceId(self.next_id);
        self.next_id += 1;
        let rate = self.sample_rate as f64;
        self.voices.push(ActiveVoice {
            id,
            waveform: spec.waveform,
            frequency: spec.frequency,
            phase: 0.0,
            elapsed: 0,
            stop_at: spec.stop_after.map(|secs| (secs.max(0.0) * rate).ceil() as u64),
            envelope: spec.envelope,
        });
        id
    }

    fn set_voice_frequency(&mut self, id: VoiceId, hz: f32) -> bool {
        match self.voices.iter_mut().find(|v| v.id == id) {
            Some(voice) => {
                voice.frequency = hz;
                true
            }
            None => false,
        }
    }

    fn stop_voice(&mut self, id: VoiceId) -> bool {
        let before = self.voices.len();
        self.voices.retain(|v| v.id != id);
        self.voices.len() != before
    }

    fn has_voice(&self, id: VoiceId) -> bool {
        self.voices.iter().any(|v| v.id == id)
    }
}

// ── Backends ─────────────────────────────────────────────────────────

/// A [`SynthGraph`] nobody listens to, rendered on demand by the caller.
/// Used for simulation and tests.
#[derive(Debug, Clone)]
pub struct OfflineBackend {
    graph: Arc<Mutex<SynthGraph>>,
}

impl OfflineBackend {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            graph: Arc::new(Mutex::new(SynthGraph::new(sample_rate))),
        }
    }

    /// The concrete graph, for rendering and inspection.
    pub fn graph(&self) -> Arc<Mutex<SynthGraph>> {
        Arc::clone(&self.graph)
    }

    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        self.graph
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .render(&mut out);
        out
    }
}

impl Default for OfflineBackend {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl AudioBackend for OfflineBackend {
    fn open(&mut self) -> Result<SharedGraph, ToneError> {
        let graph: SharedGraph = self.graph.clone();
        Ok(graph)
    }
}

/// Backend for hosts without audio output.
#[derive(Debug, Clone, Default)]
pub struct UnsupportedBackend {
    pub reason: String,
}

impl AudioBackend for UnsupportedBackend {
    fn open(&mut self) -> Result<SharedGraph, ToneError> {
        Err(ToneError::Unsupported(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady(freq: f32) -> VoiceSpec {
        VoiceSpec {
            waveform: Waveform::Square,
            frequency: freq,
            envelope: Envelope::starting_at(0.5),
            stop_after: None,
        }
    }

    #[test]
    fn silent_without_voices() {
        let mut graph = SynthGraph::new(1000);
        let mut out = [1.0; 16];
        graph.render(&mut out);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn shared_graph_lock_reaches_backend_graph() {
        let mut backend = OfflineBackend::new(1000);
        let shared = backend.open().unwrap();
        let voice = lock_graph(&shared).start_voice(steady(100.0));
        lock_graph(&shared).set_master_gain(0.25);
        assert!(lock_graph(&shared).has_voice(voice));
        assert_eq!(backend.graph().lock().unwrap().master_gain(), 0.25);
    }

    #[test]
    fn master_gain_scales_output() {
        let mut graph = SynthGraph::new(1000);
        graph.start_voice(steady(100.0));
        graph.set_master_gain(0.5);
        assert!((graph.next_sample() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn master_gain_is_clamped() {
        let mut graph = SynthGraph::new(1000);
        graph.set_master_gain(3.0);
        assert_eq!(graph.master_gain(), 1.0);
        graph.set_master_gain(-1.0);
        assert_eq!(graph.master_gain(), 0.0);
    }

    #[test]
    fn voice_stops_by_itself() {
        let mut graph = SynthGraph::new(1000);
        let mut spec = steady(100.0);
        spec.stop_after = Some(0.01);
        let id = graph.start_voice(spec);
        let mut out = [0.0; 10];
        graph.render(&mut out);
        assert!(!graph.has_voice(id));
        assert_eq!(graph.next_sample(), 0.0);
    }

    #[test]
    fn stop_and_retune_report_missing_voices() {
        let mut graph = SynthGraph::new(1000);
        let id = graph.start_voice(steady(660.0));
        assert!(graph.set_voice_frequency(id, 880.0));
        assert_eq!(graph.voice_frequency(id), Some(880.0));
        assert!(graph.stop_voice(id));
        assert!(!graph.stop_voice(id));
        assert!(!graph.set_voice_frequency(id, 660.0));
    }

    #[test]
    fn unsupported_backend_fails_to_open() {
        let mut backend = UnsupportedBackend {
            reason: "no device".into(),
        };
        assert_eq!(
            backend.open().err(),
            Some(ToneError::Unsupported("no device".into()))
        );
    }
}
