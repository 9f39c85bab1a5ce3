//! Amplitude automation for a single voice.
//!
//! Points are placed on the voice's own timeline (seconds since the voice
//! started). Between a point and a following exponential ramp the value
//! follows `v0 * (v1 / v0) ^ ((t - t0) / (t1 - t0))`, which is what keeps a
//! fast attack and decay free of clicks. Ramps cannot cross or touch zero,
//! so envelopes start and end at a small floor value instead.

#[derive(Debug, Clone, Copy, PartialEq)]
enum Curve {
    Set,
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    at: f64,
    value: f32,
    curve: Curve,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    points: Vec<Point>,
}

impl Envelope {
    /// An envelope that holds `initial` from the start of the voice.
    pub fn starting_at(initial: f32) -> Self {
        Self::default().set_value_at(initial, 0.0)
    }

    pub fn set_value_at(self, value: f32, at: f64) -> Self {
        self.push(Point {
            at,
            value,
            curve: Curve::Set,
        })
    }

    pub fn exponential_ramp_to_value_at(self, value: f32, at: f64) -> Self {
        self.push(Point {
            at,
            value,
            curve: Curve::Exponential,
        })
    }

    fn push(mut self, point: Point) -> Self {
        let idx = self.points.partition_point(|p| p.at <= point.at);
        self.points.insert(idx, point);
        self
    }

    /// Highest value the envelope reaches.
    pub fn peak(&self) -> f32 {
        self.points.iter().map(|p| p.value).fold(0.0, f32::max)
    }

    /// Value at `t` seconds. Silent before the first point.
    pub fn value_at(&self, t: f64) -> f32 {
        let mut prev: Option<&Point> = None;
        for point in &self.points {
            if point.at <= t {
                prev = Some(point);
                continue;
            }
            return match (prev, point.curve) {
                (None, _) => 0.0,
                (Some(p), Curve::Set) => p.value,
                (Some(p), Curve::Exponential) => exponential(p, point, t),
            };
        }
        prev.map(|p| p.value).unwrap_or(0.0)
    }
}

fn exponential(from: &Point, to: &Point, t: f64) -> f32 {
    let (v0, v1) = (from.value as f64, to.value as f64);
    if v0 <= 0.0 || v1 <= 0.0 || to.at <= from.at {
        return from.value;
    }
    let frac = (t - from.at) / (to.at - from.at);
    (v0 * (v1 / v0).powf(frac)) as f32
}
