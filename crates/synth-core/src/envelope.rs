//! ADSR envelope scheduling against the audio clock.
//!
//! The controller never samples the envelope itself. It emits `ParamEvent`s
//! which are written to the voice's envelope gain node and to a local
//! [`Automation`] mirror. The mirror is what a release reads to find the gain
//! it must hold, so release can interrupt an unfinished attack or decay
//! without a jump.

use crate::automation::{Automation, ParamEvent};
use crate::backend::AudioBackend;
use crate::config::EnvelopeParams;
use crate::constants::RELEASE_FLOOR;

/// A gain node paired with the record of everything scheduled on it.
pub struct ScheduledGain<G> {
    pub node: G,
    automation: Automation,
}

impl<G> ScheduledGain<G> {
    pub fn new(node: G, initial: f32) -> Self {
        Self {
            node,
            automation: Automation::new(initial),
        }
    }

    /// Gain the node will have at audio time `t`, given what is scheduled now.
    pub fn value_at(&self, t: f64) -> f32 {
        self.automation.value_at(t)
    }

    pub fn automation(&self) -> &Automation {
        &self.automation
    }

    pub fn apply<B>(&mut self, backend: &B, events: &[ParamEvent])
    where
        B: AudioBackend<Gain = G>,
    {
        for event in events {
            backend.automate_gain(&self.node, *event);
            self.automation.apply(*event);
        }
    }
}

/// Events for attack (0 → 1) followed by decay (1 → sustain) from `start`.
pub fn attack_decay_events(start: f64, params: &EnvelopeParams) -> [ParamEvent; 4] {
    let peak_at = start + params.attack;
    [
        ParamEvent::CancelScheduledValues { from: start },
        ParamEvent::SetValueAtTime {
            value: 0.0,
            time: start,
        },
        ParamEvent::LinearRampToValueAtTime {
            value: 1.0,
            time: peak_at,
        },
        ParamEvent::LinearRampToValueAtTime {
            value: params.sustain,
            time: peak_at + params.decay,
        },
    ]
}

/// Events that pin the gain to its scheduled value at `at` using plain cancels.
///
/// A ramp still running at `at` is cancelled and re-scheduled to end at `at`
/// on the same line, so the level never jumps. Otherwise the value is set.
pub fn hold_events(automation: &Automation, at: f64) -> [ParamEvent; 2] {
    let value = automation.value_at(at);
    let hold = if automation.ramp_running_at(at) {
        ParamEvent::LinearRampToValueAtTime { value, time: at }
    } else {
        ParamEvent::SetValueAtTime { value, time: at }
    };
    [ParamEvent::CancelScheduledValues { from: at }, hold]
}

/// Events for a release that holds the scheduled level at `start` and fades
/// to the floor over `release_sec`.
pub fn release_events(automation: &Automation, start: f64, release_sec: f64) -> [ParamEvent; 3] {
    let [cancel, hold] = hold_events(automation, start);
    [
        cancel,
        hold,
        ParamEvent::LinearRampToValueAtTime {
            value: RELEASE_FLOOR,
            time: start + release_sec,
        },
    ]
}

pub fn apply_attack_decay<B: AudioBackend>(
    backend: &B,
    gain: &mut ScheduledGain<B::Gain>,
    note_start: f64,
    params: &EnvelopeParams,
) {
    gain.apply(backend, &attack_decay_events(note_start, params));
}

/// Start the release at `release_start`. Returns the gain the ramp starts from.
pub fn apply_release<B: AudioBackend>(
    backend: &B,
    gain: &mut ScheduledGain<B::Gain>,
    release_start: f64,
    release_sec: f64,
) -> f32 {
    let held = gain.value_at(release_start);
    let events = release_events(gain.automation(), release_start, release_sec);
    gain.apply(backend, &events);
    held
}

/// Silence at `at` without a ramp; used when a voice is cut by a retrigger.
pub fn apply_cut<B: AudioBackend>(backend: &B, gain: &mut ScheduledGain<B::Gain>, at: f64) {
    let [cancel, hold] = hold_events(gain.automation(), at);
    gain.apply(
        backend,
        &[
            cancel,
            hold,
            ParamEvent::SetValueAtTime {
                value: RELEASE_FLOOR,
                time: at,
            },
        ],
    );
}
