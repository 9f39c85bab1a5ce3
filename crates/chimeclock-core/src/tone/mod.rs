mod engine;
mod envelope;
mod graph;
mod waveform;

pub use engine::{BeepSpec, ToneEngine, WarbleSpec, ENVELOPE_FLOOR};
pub use envelope::Envelope;
pub use graph::{
    AudioBackend, AudioGraph, OfflineBackend, SharedGraph, SynthGraph, UnsupportedBackend,
    VoiceId, VoiceSpec, DEFAULT_SAMPLE_RATE,
};
pub use waveform::Waveform;
