//! Note → voice mapping with retrigger and cleanup rules.
//!
//! Invariant: at most one registered voice per note. Superseding moves the
//! previous voice out of the map and into `detached` in the same step, so the
//! map never holds two voices for a note. Detached voices are only reaped,
//! never looked up by note, which keeps a late cleanup of an old voice from
//! touching its successor.

use crate::backend::AudioBackend;
use crate::config::{OscParam, OscSlot, RetriggerMode, SynthConfig};
use crate::engine::AudioEngine;
use crate::error::Result;
use crate::note;
use crate::voice::{Voice, VoiceId, VoicePhase};
use fnv::FnvHashMap;
use smallvec::SmallVec;

/// Result of a note-off request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NoteOffOutcome {
    /// Release scheduled; oscillators stop at `stop_at`.
    Released { stop_at: f64 },
    /// No voice for the note. Not an error.
    AlreadyIdle,
    /// The voice is already fading out; its schedule is left alone.
    AlreadyReleasing,
}

pub struct VoiceRegistry<B: AudioBackend> {
    voices: FnvHashMap<String, Voice<B>>,
    detached: Vec<Voice<B>>,
    next_id: u64,
}

impl<B: AudioBackend> Default for VoiceRegistry<B> {
    fn default() -> Self {
        Self {
            voices: FnvHashMap::default(),
            detached: Vec::new(),
            next_id: 1,
        }
    }
}

impl<B: AudioBackend> VoiceRegistry<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `note` at audio time `start`, superseding any voice it already has.
    ///
    /// Invalid notes and start failures are logged and leave the note idle.
    pub fn note_on(
        &mut self,
        engine: &AudioEngine<B>,
        config: &SynthConfig,
        note: &str,
        start: f64,
        retrigger: RetriggerMode,
    ) -> Result<VoiceId> {
        let frequency = note::resolve(note).map_err(|e| {
            log::warn!("[voice] note on ignored: {}", e);
            e
        })?;

        if let Some(previous) = self.voices.remove(note) {
            self.supersede(engine, previous, start, retrigger, config.envelope.release);
        }

        let id = VoiceId(self.next_id);
        self.next_id += 1;
        match Voice::start(
            engine,
            id,
            note,
            frequency,
            &config.oscillators,
            &config.envelope,
            start,
        ) {
            Ok(voice) => {
                log::debug!("[voice] {} #{} on at {:.3} ({:.2} Hz)", note, id.0, start, frequency);
                self.voices.insert(note.to_string(), voice);
                Ok(id)
            }
            Err(e) => {
                log::error!("[voice] {}", e);
                Err(e)
            }
        }
    }

    fn supersede(
        &mut self,
        engine: &AudioEngine<B>,
        mut previous: Voice<B>,
        start: f64,
        retrigger: RetriggerMode,
        release_sec: f64,
    ) {
        let backend = engine.backend();
        match (retrigger, previous.phase()) {
            (RetriggerMode::Cut, _) => {
                // Never cut earlier than the audio clock allows.
                let at = start.max(engine.current_time());
                previous.cut(backend, at);
            }
            (RetriggerMode::Overlap, VoicePhase::Sounding) => {
                previous.release(backend, start, release_sec);
            }
            (RetriggerMode::Overlap, VoicePhase::Releasing { .. }) => {}
        }
        log::debug!(
            "[voice] {} #{} superseded ({:?})",
            previous.note(),
            previous.id().0,
            retrigger
        );
        self.detached.push(previous);
    }

    /// Release `note` from audio time `stop`.
    pub fn note_off(
        &mut self,
        engine: &AudioEngine<B>,
        config: &SynthConfig,
        note: &str,
        stop: f64,
    ) -> NoteOffOutcome {
        let Some(voice) = self.voices.get_mut(note) else {
            return NoteOffOutcome::AlreadyIdle;
        };
        match voice.phase() {
            VoicePhase::Releasing { .. } => NoteOffOutcome::AlreadyReleasing,
            VoicePhase::Sounding => {
                voice.release(engine.backend(), stop, config.envelope.release);
                NoteOffOutcome::Released {
                    stop_at: stop + config.envelope.release,
                }
            }
        }
    }

    /// Disconnect every voice whose stop time plus margin has passed by `now`.
    ///
    /// Returns the ids of the voices that were torn down.
    pub fn reap(&mut self, backend: &B, now: f64) -> SmallVec<[VoiceId; 8]> {
        let due = |v: &Voice<B>| v.cleanup_at().is_some_and(|at| at <= now);
        let mut reaped = SmallVec::new();

        let finished: SmallVec<[String; 8]> = self
            .voices
            .iter()
            .filter(|&(_, v)| due(v))
            .map(|(note, _)| note.clone())
            .collect();
        for note in finished {
            if let Some(voice) = self.voices.remove(&note) {
                voice.disconnect(backend);
                reaped.push(voice.id());
            }
        }

        self.detached.retain(|v| {
            if due(v) {
                v.disconnect(backend);
                reaped.push(v.id());
                false
            } else {
                true
            }
        });

        if !reaped.is_empty() {
            log::debug!("[voice] reaped {} voice(s) at {:.3}", reaped.len(), now);
        }
        reaped
    }

    /// Push an oscillator change to every registered voice.
    pub fn apply_osc_param(&self, backend: &B, slot: OscSlot, param: OscParam) {
        for voice in self.voices.values() {
            voice.apply_osc_param(backend, slot, param);
        }
    }

    pub fn voice(&self, note: &str) -> Option<&Voice<B>> {
        self.voices.get(note)
    }

    pub fn phase(&self, note: &str) -> Option<VoicePhase> {
        self.voices.get(note).map(|v| v.phase())
    }

    pub fn is_active(&self, note: &str) -> bool {
        self.voices.contains_key(note)
    }

    pub fn start_time(&self, note: &str) -> Option<f64> {
        self.voices.get(note).map(|v| v.start_time())
    }

    /// Registered voices (one per note at most).
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Superseded voices still waiting for cleanup.
    pub fn detached_count(&self) -> usize {
        self.detached.len()
    }

    pub fn active_notes(&self) -> impl Iterator<Item = &str> {
        self.voices.keys().map(String::as_str)
    }
}
