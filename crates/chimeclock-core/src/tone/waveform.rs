use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

/// Oscillator shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    #[default]
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Amplitude in `[-1, 1]` at `phase` (cycles, `0.0..1.0`).
    pub fn sample(self, phase: f64) -> f32 {
        let p = phase.rem_euclid(1.0);
        let v = match self {
            Waveform::Sine => (TAU * p).sin(),
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * p - 1.0,
            Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
        };
        v as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_has_unit_amplitude() {
        assert_eq!(Waveform::Square.sample(0.0), 1.0);
        assert_eq!(Waveform::Square.sample(0.75), -1.0);
    }

    #[test]
    fn shapes_stay_in_range() {
        for shape in [Waveform::Sine, Waveform::Square, Waveform::Sawtooth, Waveform::Triangle] {
            for i in 0..100 {
                let v = shape.sample(i as f64 / 100.0);
                assert!((-1.0..=1.0).contains(&v), "{shape:?} gave {v}");
            }
        }
    }

    #[test]
    fn waveform_names_are_lowercase() {
        let json = serde_json::to_string(&Waveform::Sawtooth).unwrap();
        assert_eq!(json, "\"sawtooth\"");
    }
}
