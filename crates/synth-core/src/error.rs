use thiserror::Error;

/// Failures surfaced by the synth core.
///
/// Only `DeviceUnavailable` is fatal to a session. Everything else is
/// recovered where it happens: the offending call becomes a no-op and is logged.
#[derive(Debug, Error)]
pub enum SynthError {
    /// Note name did not parse as `<pitch class><octave>`.
    #[error("invalid note name `{0}`")]
    InvalidNote(String),

    /// No usable audio backend, or the shared graph could not be built.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// An oscillator refused to start; the partial voice was rolled back.
    #[error("voice for `{note}` failed to start: {reason}")]
    VoiceStartFailure { note: String, reason: String },

    /// Out-of-range or unparsable control value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A single node-level operation failed inside the backend.
    #[error("audio backend error: {0}")]
    Backend(String),

    #[error("preset format error: {0}")]
    PresetFormat(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SynthError>;
