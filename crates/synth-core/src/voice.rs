//! One sounding note: two detuned oscillators, each through its own gain,
//! summed into a shared envelope gain that feeds the engine input.

use crate::backend::AudioBackend;
use crate::config::{EnvelopeParams, OscParam, OscSlot, OscillatorSettings};
use crate::constants::CLEANUP_MARGIN_SEC;
use crate::engine::AudioEngine;
use crate::envelope::{self, ScheduledGain};
use crate::error::{Result, SynthError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u64);

/// Lifecycle phase of a registered voice. A note with no voice is idle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VoicePhase {
    Sounding,
    /// Releasing; oscillators stop at `stop_at`.
    Releasing { stop_at: f64 },
}

pub struct Voice<B: AudioBackend> {
    id: VoiceId,
    note: String,
    frequency_hz: f64,
    oscillators: [B::Oscillator; 2],
    osc_gains: [B::Gain; 2],
    envelope: ScheduledGain<B::Gain>,
    start_time: f64,
    phase: VoicePhase,
    cleanup_at: Option<f64>,
}

impl<B: AudioBackend> Voice<B> {
    /// Build, wire and start a voice at `start`.
    ///
    /// On any failure after nodes exist, everything already created is
    /// disconnected (and any oscillator that did start is stopped) before the
    /// error is returned, so no half-built voice survives.
    pub fn start(
        engine: &AudioEngine<B>,
        id: VoiceId,
        note: &str,
        frequency_hz: f64,
        settings: &[OscillatorSettings; 2],
        params: &EnvelopeParams,
        start: f64,
    ) -> Result<Self> {
        let backend = engine.backend();
        let fail = |reason: SynthError| SynthError::VoiceStartFailure {
            note: note.to_string(),
            reason: reason.to_string(),
        };

        let envelope_node = backend.create_gain(0.0).map_err(fail)?;
        let make_osc = |s: &OscillatorSettings| -> Result<(B::Oscillator, B::Gain)> {
            let osc = backend.create_oscillator(s.waveform, frequency_hz as f32, s.detune)?;
            let gain = backend.create_gain(s.gain)?;
            Ok((osc, gain))
        };
        let (osc_a, gain_a) = make_osc(&settings[0]).map_err(fail)?;
        let (osc_b, gain_b) = make_osc(&settings[1]).map_err(fail)?;

        let mut voice = Voice {
            id,
            note: note.to_string(),
            frequency_hz,
            oscillators: [osc_a, osc_b],
            osc_gains: [gain_a, gain_b],
            envelope: ScheduledGain::new(envelope_node, 0.0),
            start_time: start,
            phase: VoicePhase::Sounding,
            cleanup_at: None,
        };

        if let Err(e) = voice.wire_and_start(engine, start) {
            voice.disconnect(backend);
            return Err(fail(e));
        }
        envelope::apply_attack_decay(backend, &mut voice.envelope, start, params);
        Ok(voice)
    }

    fn wire_and_start(&self, engine: &AudioEngine<B>, start: f64) -> Result<()> {
        let backend = engine.backend();
        for (osc, gain) in self.oscillators.iter().zip(&self.osc_gains) {
            backend.connect(osc.as_ref(), gain.as_ref())?;
            backend.connect(gain.as_ref(), self.envelope.node.as_ref())?;
        }
        backend.connect(self.envelope.node.as_ref(), engine.input().as_ref())?;

        let mut started = 0;
        for osc in &self.oscillators {
            if let Err(e) = backend.start_oscillator(osc, start) {
                for running in &self.oscillators[..started] {
                    let _ = backend.stop_oscillator(running, start);
                }
                return Err(e);
            }
            started += 1;
        }
        Ok(())
    }

    #[inline]
    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn phase(&self) -> VoicePhase {
        self.phase
    }

    /// Audio time after which the voice's nodes may be disconnected.
    pub fn cleanup_at(&self) -> Option<f64> {
        self.cleanup_at
    }

    pub fn oscillator(&self, slot: OscSlot) -> &B::Oscillator {
        &self.oscillators[slot.index()]
    }

    pub fn oscillator_gain(&self, slot: OscSlot) -> &B::Gain {
        &self.osc_gains[slot.index()]
    }

    pub fn envelope_node(&self) -> &B::Gain {
        &self.envelope.node
    }

    /// Scheduled envelope gain at audio time `t`.
    pub fn envelope_at(&self, t: f64) -> f32 {
        self.envelope.value_at(t)
    }

    /// Fade out from `stop_time` and stop the oscillators once the fade ends.
    pub fn release(&mut self, backend: &B, stop_time: f64, release_sec: f64) {
        let held = envelope::apply_release(backend, &mut self.envelope, stop_time, release_sec);
        let stop_at = stop_time + release_sec;
        self.stop_oscillators(backend, stop_at);
        self.phase = VoicePhase::Releasing { stop_at };
        self.cleanup_at = Some(stop_at + CLEANUP_MARGIN_SEC);
        log::debug!(
            "[voice] {} #{} release from {:.3} at {:.3}, stop {:.3}",
            self.note,
            self.id.0,
            held,
            stop_time,
            stop_at
        );
    }

    /// Silence immediately at `at` (retrigger cut).
    pub fn cut(&mut self, backend: &B, at: f64) {
        envelope::apply_cut(backend, &mut self.envelope, at);
        self.stop_oscillators(backend, at);
        self.phase = VoicePhase::Releasing { stop_at: at };
        self.cleanup_at = Some(at + CLEANUP_MARGIN_SEC);
    }

    fn stop_oscillators(&self, backend: &B, when: f64) {
        for osc in &self.oscillators {
            if let Err(e) = backend.stop_oscillator(osc, when) {
                log::warn!("[voice] {} #{} stop failed: {}", self.note, self.id.0, e);
            }
        }
    }

    /// Apply a live oscillator change without touching the envelope.
    pub fn apply_osc_param(&self, backend: &B, slot: OscSlot, param: OscParam) {
        let i = slot.index();
        match param {
            OscParam::Waveform(w) => backend.set_waveform(&self.oscillators[i], w),
            OscParam::Detune(cents) => backend.set_detune(&self.oscillators[i], cents),
            OscParam::Gain(g) => backend.set_gain(&self.osc_gains[i], g.clamp(0.0, 1.0)),
        }
    }

    /// Detach every node this voice owns from the graph.
    pub fn disconnect(&self, backend: &B) {
        for osc in &self.oscillators {
            backend.disconnect(osc.as_ref());
        }
        for gain in &self.osc_gains {
            backend.disconnect(gain.as_ref());
        }
        backend.disconnect(self.envelope.node.as_ref());
    }
}
