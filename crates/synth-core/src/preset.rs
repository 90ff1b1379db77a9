//! Sound presets: snapshot layout, built-ins and a bank the UI can persist.
//!
//! Storage itself belongs to the front-end; the bank only converts to and
//! from the JSON layout `{ name: {oscillator1, oscillator2, envelope,
//! effects, masterVolume} }`.

use crate::config::{EffectLevels, EnvelopeParams, OscillatorSettings, SynthConfig, Waveform};
use crate::error::{Result, SynthError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_PRESET: &str = "default";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetSnapshot {
    pub oscillator1: OscillatorSettings,
    pub oscillator2: OscillatorSettings,
    pub envelope: EnvelopeParams,
    pub effects: EffectLevels,
    pub master_volume: f32,
}

impl PresetSnapshot {
    pub fn from_config(config: &SynthConfig) -> Self {
        Self {
            oscillator1: config.oscillators[0],
            oscillator2: config.oscillators[1],
            envelope: config.envelope,
            effects: config.effects,
            master_volume: config.master_volume,
        }
    }

    /// Overwrite the sound-related parts of `config`; sequencer state is kept.
    pub fn apply_to(&self, config: &mut SynthConfig) {
        config.oscillators = [self.oscillator1, self.oscillator2];
        config.envelope = self.envelope;
        config.effects = self.effects;
        config.master_volume = self.master_volume;
    }
}

fn osc(waveform: Waveform, detune: f32, gain: f32) -> OscillatorSettings {
    OscillatorSettings {
        waveform,
        detune,
        gain,
    }
}

fn env(attack: f64, decay: f64, sustain: f32, release: f64) -> EnvelopeParams {
    EnvelopeParams {
        attack,
        decay,
        sustain,
        release,
    }
}

fn fx(reverb: f32, delay: f32, distortion: f32) -> EffectLevels {
    EffectLevels {
        reverb,
        delay,
        distortion,
    }
}

/// Factory sounds other than `default`.
pub fn factory_presets() -> [(&'static str, PresetSnapshot); 3] {
    [
        (
            "bass",
            PresetSnapshot {
                oscillator1: osc(Waveform::Square, -5.0, 0.6),
                oscillator2: osc(Waveform::Sawtooth, 5.0, 0.4),
                envelope: env(0.02, 0.3, 0.1, 0.2),
                effects: fx(0.1, 0.0, 0.1),
                master_volume: 0.6,
            },
        ),
        (
            "lead",
            PresetSnapshot {
                oscillator1: osc(Waveform::Sawtooth, -10.0, 0.5),
                oscillator2: osc(Waveform::Square, 10.0, 0.5),
                envelope: env(0.05, 0.2, 0.6, 0.4),
                effects: fx(0.3, 0.4, 0.0),
                master_volume: 0.5,
            },
        ),
        (
            "pad",
            PresetSnapshot {
                oscillator1: osc(Waveform::Sine, -7.0, 0.5),
                oscillator2: osc(Waveform::Triangle, 7.0, 0.5),
                envelope: env(0.8, 1.5, 0.8, 1.0),
                effects: fx(0.6, 0.2, 0.0),
                master_volume: 0.4,
            },
        ),
    ]
}

#[derive(Clone, Debug, Default)]
pub struct PresetBank {
    presets: BTreeMap<String, PresetSnapshot>,
}

impl PresetBank {
    /// Factory presets plus `default` captured from `initial`.
    pub fn with_factory(initial: &SynthConfig) -> Self {
        let mut presets: BTreeMap<String, PresetSnapshot> = factory_presets()
            .into_iter()
            .map(|(name, p)| (name.to_string(), p))
            .collect();
        presets.insert(DEFAULT_PRESET.to_string(), PresetSnapshot::from_config(initial));
        Self { presets }
    }

    pub fn get(&self, name: &str) -> Option<&PresetSnapshot> {
        self.presets.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Store under a trimmed, non-empty name, replacing any previous entry.
    pub fn insert(&mut self, name: &str, snapshot: PresetSnapshot) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SynthError::InvalidParameter(
                "preset name cannot be empty".into(),
            ));
        }
        self.presets.insert(name.to_string(), snapshot);
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.presets)?)
    }

    /// Merge previously saved presets. A stored `default` never replaces the
    /// one captured at startup. Returns how many entries were taken.
    pub fn merge_json(&mut self, json: &str) -> Result<usize> {
        let loaded: BTreeMap<String, PresetSnapshot> = serde_json::from_str(json)?;
        let mut taken = 0;
        for (name, snapshot) in loaded {
            if name == DEFAULT_PRESET || name.trim().is_empty() {
                continue;
            }
            self.presets.insert(name, snapshot);
            taken += 1;
        }
        log::info!("[preset] merged {} saved preset(s)", taken);
        Ok(taken)
    }
}
