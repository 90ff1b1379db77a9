//! Scheduling core of the browser synth.
//!
//! Turns note-on/note-off events and a step grid into timed oscillator and
//! gain automation against an audio clock. The graph itself is reached only
//! through [`AudioBackend`], so the same code drives WebAudio in the browser
//! and [`OfflineContext`] on the host.

pub mod automation;
pub mod backend;
pub mod config;
pub mod constants;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod keymap;
pub mod note;
pub mod offline;
pub mod preset;
pub mod registry;
pub mod sequencer;
pub mod synth;
pub mod voice;

pub use automation::{Automation, ParamEvent};
pub use backend::AudioBackend;
pub use config::*;
pub use constants::*;
pub use engine::{distortion_curve, AudioEngine};
pub use error::{Result, SynthError};
pub use keymap::{note_for_key, PressedKeys};
pub use note::{midi_number, midi_to_hz, resolve};
pub use offline::{NodeId, OfflineContext};
pub use preset::{PresetBank, PresetSnapshot};
pub use registry::{NoteOffOutcome, VoiceRegistry};
pub use sequencer::{step_duration, Sequencer, SequencerEvent};
pub use synth::Synth;
pub use voice::{Voice, VoiceId, VoicePhase};
