//! Explicit configuration shared by the voice registry, the audio engine and
//! the sequencer.
//!
//! Nothing here is global: `Synth` owns one `SynthConfig` and hands references
//! to the components that need to read it. Every type is `serde`-serializable
//! so the UI can read current values and the preset layer can store them.

use crate::constants::DEFAULT_TEMPO_BPM;
use crate::error::{Result, SynthError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Basic oscillator shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub fn as_str(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }
}

impl FromStr for Waveform {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sine" => Ok(Waveform::Sine),
            "square" => Ok(Waveform::Square),
            "sawtooth" | "saw" => Ok(Waveform::Sawtooth),
            "triangle" => Ok(Waveform::Triangle),
            other => Err(SynthError::InvalidParameter(format!("waveform `{other}`"))),
        }
    }
}

/// Which of the two per-voice oscillators a parameter targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OscSlot {
    One,
    Two,
}

impl OscSlot {
    pub const ALL: [OscSlot; 2] = [OscSlot::One, OscSlot::Two];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            OscSlot::One => 0,
            OscSlot::Two => 1,
        }
    }

    /// Map the UI's 1-based oscillator number.
    pub fn from_number(n: u8) -> Result<Self> {
        match n {
            1 => Ok(OscSlot::One),
            2 => Ok(OscSlot::Two),
            _ => Err(SynthError::InvalidParameter(format!("oscillator slot {n}"))),
        }
    }
}

/// A single oscillator parameter change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OscParam {
    Waveform(Waveform),
    /// Detune in cents.
    Detune(f32),
    /// Per-oscillator gain before the envelope.
    Gain(f32),
}

impl OscParam {
    /// Parse a `(param, value)` pair as sent by the UI (`"type"`, `"detune"`, `"gain"`).
    pub fn parse(param: &str, value: &str) -> Result<Self> {
        let number = || {
            value
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| SynthError::InvalidParameter(format!("{param} = `{value}`")))
        };
        match param {
            "type" | "waveform" => Ok(OscParam::Waveform(value.parse()?)),
            "detune" => Ok(OscParam::Detune(number()?)),
            "gain" => Ok(OscParam::Gain(number()?.clamp(0.0, 1.0))),
            other => Err(SynthError::InvalidParameter(format!("oscillator param `{other}`"))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OscillatorSettings {
    #[serde(rename = "type")]
    pub waveform: Waveform,
    pub detune: f32,
    pub gain: f32,
}

impl Default for OscillatorSettings {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            detune: 0.0,
            gain: 0.5,
        }
    }
}

impl OscillatorSettings {
    pub fn apply(&mut self, param: OscParam) {
        match param {
            OscParam::Waveform(w) => self.waveform = w,
            OscParam::Detune(c) => self.detune = c,
            OscParam::Gain(g) => self.gain = g.clamp(0.0, 1.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnvelopeParam {
    Attack,
    Decay,
    Sustain,
    Release,
}

impl FromStr for EnvelopeParam {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "attack" => Ok(EnvelopeParam::Attack),
            "decay" => Ok(EnvelopeParam::Decay),
            "sustain" => Ok(EnvelopeParam::Sustain),
            "release" => Ok(EnvelopeParam::Release),
            other => Err(SynthError::InvalidParameter(format!("envelope param `{other}`"))),
        }
    }
}

/// ADSR settings: times in seconds, `sustain` is a gain multiplier in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeParams {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f32,
    pub release: f64,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.1,
        }
    }
}

impl EnvelopeParams {
    /// Set one field. Negative times clamp to zero, sustain clamps to [0, 1].
    pub fn set(&mut self, param: EnvelopeParam, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(SynthError::InvalidParameter(format!("{param:?} = {value}")));
        }
        match param {
            EnvelopeParam::Attack => self.attack = value.max(0.0),
            EnvelopeParam::Decay => self.decay = value.max(0.0),
            EnvelopeParam::Sustain => self.sustain = value.clamp(0.0, 1.0) as f32,
            EnvelopeParam::Release => self.release = value.max(0.0),
        }
        Ok(())
    }
}

/// Closed set of stages in the effects chain, in signal order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectStage {
    Distortion,
    Delay,
    Reverb,
}

impl EffectStage {
    pub const ALL: [EffectStage; 3] = [
        EffectStage::Distortion,
        EffectStage::Delay,
        EffectStage::Reverb,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            EffectStage::Distortion => 0,
            EffectStage::Delay => 1,
            EffectStage::Reverb => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EffectStage::Distortion => "distortion",
            EffectStage::Delay => "delay",
            EffectStage::Reverb => "reverb",
        }
    }
}

impl FromStr for EffectStage {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        EffectStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| SynthError::InvalidParameter(format!("effect `{s}`")))
    }
}

/// UI-level effect amounts, each in [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectLevels {
    pub reverb: f32,
    pub delay: f32,
    pub distortion: f32,
}

impl EffectLevels {
    pub fn get(&self, stage: EffectStage) -> f32 {
        match stage {
            EffectStage::Distortion => self.distortion,
            EffectStage::Delay => self.delay,
            EffectStage::Reverb => self.reverb,
        }
    }

    pub fn set(&mut self, stage: EffectStage, value: f32) {
        let value = value.clamp(0.0, 1.0);
        match stage {
            EffectStage::Distortion => self.distortion = value,
            EffectStage::Delay => self.delay = value,
            EffectStage::Reverb => self.reverb = value,
        }
    }
}

/// What happens to a still-sounding voice when its note is triggered again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetriggerMode {
    /// Silence the previous voice at the new start time.
    #[default]
    Cut,
    /// Let the previous voice finish its release underneath the new one.
    Overlap,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequencerSettings {
    pub tempo_bpm: u32,
    /// Grid rows, top to bottom.
    pub notes: Vec<String>,
    /// Retrigger policy for sequenced notes. Keyboard notes always cut.
    pub retrigger: RetriggerMode,
}

impl Default for SequencerSettings {
    fn default() -> Self {
        Self {
            tempo_bpm: DEFAULT_TEMPO_BPM,
            notes: ["C5", "A4", "G4", "E4", "C4"]
                .iter()
                .map(|n| n.to_string())
                .collect(),
            retrigger: RetriggerMode::Cut,
        }
    }
}

/// Whole-instrument configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynthConfig {
    pub oscillators: [OscillatorSettings; 2],
    pub envelope: EnvelopeParams,
    pub effects: EffectLevels,
    pub master_volume: f32,
    pub sequencer: SequencerSettings,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            oscillators: [OscillatorSettings::default(); 2],
            envelope: EnvelopeParams::default(),
            effects: EffectLevels::default(),
            master_volume: 0.5,
            sequencer: SequencerSettings::default(),
        }
    }
}

impl SynthConfig {
    #[inline]
    pub fn oscillator(&self, slot: OscSlot) -> &OscillatorSettings {
        &self.oscillators[slot.index()]
    }
}
