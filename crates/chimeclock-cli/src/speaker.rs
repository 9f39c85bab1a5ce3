//! Speaker output through rodio.
//!
//! The output stream is not `Send`, so it lives on its own thread for the
//! rest of the process. The stream pulls samples from a [`SynthGraph`]
//! shared with the tone engine.

use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::time::Duration;

use chimeclock_core::tone::DEFAULT_SAMPLE_RATE;
use chimeclock_core::{AudioBackend, SharedGraph, SynthGraph, ToneError};
use rodio::{OutputStream, Source};

const CHUNK: usize = 512;

struct GraphSource {
    graph: Arc<Mutex<SynthGraph>>,
    sample_rate: u32,
    buf: Vec<f32>,
    pos: usize,
}

impl GraphSource {
    fn new(graph: Arc<Mutex<SynthGraph>>, sample_rate: u32) -> Self {
        Self {
            graph,
            sample_rate,
            buf: vec![0.0; CHUNK],
            pos: CHUNK,
        }
    }
}

impl Iterator for GraphSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.pos == self.buf.len() {
            self.graph
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .render(&mut self.buf);
            self.pos = 0;
        }
        let sample = self.buf[self.pos];
        self.pos += 1;
        Some(sample)
    }
}

impl Source for GraphSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Opens the default output device.
#[derive(Debug, Default)]
pub struct SpeakerBackend;

impl AudioBackend for SpeakerBackend {
    fn open(&mut self) -> Result<SharedGraph, ToneError> {
        let graph = Arc::new(Mutex::new(SynthGraph::new(DEFAULT_SAMPLE_RATE)));
        let source = GraphSource::new(Arc::clone(&graph), DEFAULT_SAMPLE_RATE);
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        std::thread::Builder::new()
            .name("chimeclock-audio".into())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                if let Err(e) = handle.play_raw(source) {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
                let _ = ready_tx.send(Ok(()));
                loop {
                    std::thread::park();
                }
            })
            .map_err(|e| ToneError::Unsupported(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                tracing::info!(sample_rate = DEFAULT_SAMPLE_RATE, "speaker output opened");
                let graph: SharedGraph = graph;
                Ok(graph)
            }
            Ok(Err(reason)) => Err(ToneError::Unsupported(reason)),
            Err(_) => Err(ToneError::Unsupported("audio thread exited".into())),
        }
    }
}
