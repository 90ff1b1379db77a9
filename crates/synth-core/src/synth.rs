//! Top-level instrument: configuration, shared graph, voices and sequencer.
//!
//! Everything the UI may call goes through `Synth`. It is single-threaded and
//! expects the host to call [`Synth::tick`] on a fixed interval.
//!
//! Typical usage:
//! - Construct with `Synth::new(backend, SynthConfig::default())`
//! - Forward key and button events to `note_on`/`note_off` and the setters
//! - Call `tick()` every `SCHEDULER_TICK_MS` to run the sequencer and reap voices
//! - Poll `waveform_snapshot()` from the render loop

use crate::backend::AudioBackend;
use crate::config::{EffectStage, EnvelopeParam, OscParam, OscSlot, RetriggerMode, SynthConfig};
use crate::engine::AudioEngine;
use crate::error::Result;
use crate::preset::PresetSnapshot;
use crate::registry::{NoteOffOutcome, VoiceRegistry};
use crate::sequencer::{Sequencer, SequencerEvent};
use crate::voice::VoiceId;

pub struct Synth<B: AudioBackend> {
    config: SynthConfig,
    engine: AudioEngine<B>,
    voices: VoiceRegistry<B>,
    sequencer: Sequencer,
    pending: Vec<SequencerEvent>,
}

impl<B: AudioBackend> Synth<B> {
    /// Build the audio graph. Fails with `DeviceUnavailable` if it cannot.
    pub fn new(backend: B, config: SynthConfig) -> Result<Self> {
        let engine = AudioEngine::new(backend, &config)?;
        let sequencer = Sequencer::new(
            config.sequencer.notes.as_slice(),
            config.sequencer.tempo_bpm,
        )?;
        Ok(Self {
            config,
            engine,
            voices: VoiceRegistry::new(),
            sequencer,
            pending: Vec::new(),
        })
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    pub fn engine(&self) -> &AudioEngine<B> {
        &self.engine
    }

    pub fn voices(&self) -> &VoiceRegistry<B> {
        &self.voices
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn current_time(&self) -> f64 {
        self.engine.current_time()
    }

    /// Start `note` at `time`, or now. Keyboard notes always cut a previous voice.
    pub fn note_on(&mut self, note: &str, time: Option<f64>) -> Result<VoiceId> {
        let start = time.unwrap_or_else(|| self.engine.current_time());
        self.voices
            .note_on(&self.engine, &self.config, note, start, RetriggerMode::Cut)
    }

    pub fn note_off(&mut self, note: &str, time: Option<f64>) -> NoteOffOutcome {
        let stop = time.unwrap_or_else(|| self.engine.current_time());
        self.voices.note_off(&self.engine, &self.config, note, stop)
    }

    /// Update the stored oscillator settings and every sounding voice.
    pub fn set_oscillator_param(&mut self, slot: OscSlot, param: OscParam) {
        self.config.oscillators[slot.index()].apply(param);
        self.voices
            .apply_osc_param(self.engine.backend(), slot, param);
        log::debug!("[synth] osc{} {:?}", slot.index() + 1, param);
    }

    /// Affects notes started (or released) after the call.
    pub fn set_envelope_param(&mut self, param: EnvelopeParam, value: f64) -> Result<()> {
        self.config.envelope.set(param, value)
    }

    pub fn set_master_volume(&mut self, value: f32) {
        self.config.master_volume = value.clamp(0.0, 1.0);
        self.engine.set_master_volume(value);
    }

    pub fn set_effect_param(&mut self, stage: EffectStage, value: f32) {
        self.config.effects.set(stage, value);
        self.engine.set_effect_param(stage, value);
    }

    pub fn toggle_step(&mut self, note: &str, index: usize) -> Result<bool> {
        self.sequencer.toggle_step(note, index)
    }

    pub fn set_step(&mut self, note: &str, index: usize, on: bool) -> Result<()> {
        self.sequencer.set_step(note, index, on)
    }

    pub fn start_sequencer(&mut self) {
        let now = self.engine.current_time();
        self.sequencer.start(now);
    }

    pub fn stop_sequencer(&mut self) {
        self.sequencer.stop();
    }

    pub fn set_tempo(&mut self, bpm: u32) -> Result<()> {
        self.sequencer.set_tempo(bpm)?;
        self.config.sequencer.tempo_bpm = bpm;
        Ok(())
    }

    pub fn set_retrigger_mode(&mut self, mode: RetriggerMode) {
        self.config.sequencer.retrigger = mode;
    }

    /// Run one scheduling pass and clean up finished voices.
    ///
    /// Returns the sequencer events committed in this pass.
    pub fn tick(&mut self) -> &[SequencerEvent] {
        let now = self.engine.current_time();
        self.pending.clear();
        self.sequencer.tick(now, &mut self.pending);

        let retrigger = self.config.sequencer.retrigger;
        for event in &self.pending {
            match event {
                SequencerEvent::NoteOn { note, time } => {
                    // Failures are logged by the registry; the step just stays silent.
                    let _ = self
                        .voices
                        .note_on(&self.engine, &self.config, note, *time, retrigger);
                }
                SequencerEvent::NoteOff { note, time } => {
                    self.voices
                        .note_off(&self.engine, &self.config, note, *time);
                }
                SequencerEvent::Step { .. } => {}
            }
        }

        self.voices.reap(self.engine.backend(), now);
        &self.pending
    }

    pub fn waveform_snapshot(&self) -> Vec<u8> {
        self.engine.waveform_snapshot()
    }

    pub fn fill_waveform(&self, out: &mut [u8]) {
        self.engine.fill_waveform(out);
    }

    pub fn preset_snapshot(&self) -> PresetSnapshot {
        PresetSnapshot::from_config(&self.config)
    }

    /// Load a preset into the configuration and push it to the engine and
    /// to every sounding voice.
    pub fn apply_preset(&mut self, preset: &PresetSnapshot) {
        preset.apply_to(&mut self.config);
        self.engine.set_master_volume(self.config.master_volume);
        for stage in EffectStage::ALL {
            self.engine
                .set_effect_param(stage, self.config.effects.get(stage));
        }
        for slot in OscSlot::ALL {
            let osc = *self.config.oscillator(slot);
            for param in [
                OscParam::Waveform(osc.waveform),
                OscParam::Detune(osc.detune),
                OscParam::Gain(osc.gain),
            ] {
                self.voices
                    .apply_osc_param(self.engine.backend(), slot, param);
            }
        }
        log::info!("[synth] preset applied");
    }
}
