//! Timeline model of an automatable audio parameter.
//!
//! Mirrors the WebAudio `AudioParam` event semantics closely enough to answer
//! "what is this gain at time t" without asking the device. The envelope
//! controller keeps one of these per voice so a release can start from the
//! exact value an unfinished attack or decay would have reached.

/// A scheduled change on an automatable parameter, in audio-clock seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamEvent {
    SetValueAtTime { value: f32, time: f64 },
    LinearRampToValueAtTime { value: f32, time: f64 },
    /// Drop every event at or after `from`.
    CancelScheduledValues { from: f64 },
    /// Drop events at or after `at`, keeping the value the timeline had there.
    CancelAndHoldAtTime { at: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointKind {
    Set,
    Ramp,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamPoint {
    pub time: f64,
    pub value: f32,
    pub kind: PointKind,
}

#[derive(Clone, Debug)]
pub struct Automation {
    default_value: f32,
    points: Vec<ParamPoint>,
}

impl Automation {
    pub fn new(default_value: f32) -> Self {
        Self {
            default_value,
            points: Vec::new(),
        }
    }

    pub fn points(&self) -> &[ParamPoint] {
        &self.points
    }

    pub fn apply(&mut self, event: ParamEvent) {
        match event {
            ParamEvent::SetValueAtTime { value, time } => self.insert(ParamPoint {
                time,
                value,
                kind: PointKind::Set,
            }),
            ParamEvent::LinearRampToValueAtTime { value, time } => self.insert(ParamPoint {
                time,
                value,
                kind: PointKind::Ramp,
            }),
            ParamEvent::CancelScheduledValues { from } => {
                self.points.retain(|p| p.time < from);
            }
            ParamEvent::CancelAndHoldAtTime { at } => {
                let held = self.value_at(at);
                let next_is_ramp = self.ramp_running_at(at);
                self.points.retain(|p| p.time < at);
                // A ramp in progress is truncated to end at `at`; otherwise hold.
                self.insert(ParamPoint {
                    time: at,
                    value: held,
                    kind: if next_is_ramp {
                        PointKind::Ramp
                    } else {
                        PointKind::Set
                    },
                });
            }
        }
    }

    /// Whether the first event at or after `t` is a ramp, i.e. a plain cancel
    /// from `t` would remove a ramp that shapes the value up to `t`.
    pub fn ramp_running_at(&self, t: f64) -> bool {
        self.points
            .iter()
            .find(|p| p.time >= t)
            .is_some_and(|p| p.kind == PointKind::Ramp)
    }

    /// Value of the parameter at audio time `t`.
    pub fn value_at(&self, t: f64) -> f32 {
        // Index of the first point strictly after t; equal times are already in effect.
        let next = self.points.partition_point(|p| p.time <= t);
        let (prev_time, prev_value) = match next.checked_sub(1) {
            Some(i) => (self.points[i].time, self.points[i].value),
            None => (0.0, self.default_value),
        };
        match self.points.get(next) {
            Some(p) if p.kind == PointKind::Ramp && p.time > prev_time => {
                let frac = ((t - prev_time) / (p.time - prev_time)).clamp(0.0, 1.0) as f32;
                prev_value + (p.value - prev_value) * frac
            }
            _ => prev_value,
        }
    }

    // Stable insert: events sharing a time keep their call order.
    fn insert(&mut self, point: ParamPoint) {
        let at = self.points.partition_point(|p| p.time <= point.time);
        self.points.insert(at, point);
    }
}
