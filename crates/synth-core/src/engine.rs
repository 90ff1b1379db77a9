//! Shared signal graph: voice bus, effects chain, master gain, analysis tap.
//!
//! Built once, mutated only through the methods here, never rebuilt while
//! the engine is alive.
//!
//! Routing:
//! `input -> distortion -> delay -> reverb -> master -> destination`, plus
//! `master -> analyser`. Each stage splits into a dry path and a wet path
//! through its processor, and both are summed into the stage output.

use crate::backend::AudioBackend;
use crate::config::{EffectStage, SynthConfig};
use crate::constants::*;
use crate::error::{Result, SynthError};

/// Wave shaper transfer curve over the input domain [-1, 1].
///
/// `y = (π + k)·x / (π + k·|x|)`: identity at `k = 0`, monotonic and
/// increasingly hard-clipping as `k` grows.
pub fn distortion_curve(amount: f32, len: usize) -> Vec<f32> {
    let k = amount.max(0.0);
    let pi = std::f32::consts::PI;
    (0..len)
        .map(|i| {
            let x = i as f32 * 2.0 / len as f32 - 1.0;
            (pi + k) * x / (pi + k * x.abs())
        })
        .collect()
}

enum Processor<B: AudioBackend> {
    Shaper(B::Shaper),
    Feedback { line: B::Delay, feedback: B::Gain },
}

struct StageNodes<B: AudioBackend> {
    input: B::Gain,
    dry: B::Gain,
    wet: B::Gain,
    output: B::Gain,
    processor: Processor<B>,
}

impl<B: AudioBackend> StageNodes<B> {
    fn build(backend: &B, stage: EffectStage, mix: f32, amount: f32) -> Result<Self> {
        let input = backend.create_gain(1.0)?;
        let dry = backend.create_gain(dry_level(stage, mix))?;
        let wet = backend.create_gain(mix)?;
        let output = backend.create_gain(1.0)?;
        let processor = match stage {
            EffectStage::Distortion => {
                let curve = distortion_curve(amount, DISTORTION_CURVE_LEN);
                Processor::Shaper(backend.create_wave_shaper(&curve)?)
            }
            EffectStage::Delay => Processor::Feedback {
                line: backend.create_delay(DELAY_TIME_SEC, DELAY_MAX_SEC)?,
                feedback: backend.create_gain(DELAY_FEEDBACK)?,
            },
            EffectStage::Reverb => Processor::Feedback {
                line: backend.create_delay(REVERB_COMB_SEC, DELAY_MAX_SEC)?,
                feedback: backend.create_gain(REVERB_FEEDBACK)?,
            },
        };

        backend.connect(input.as_ref(), dry.as_ref())?;
        backend.connect(dry.as_ref(), output.as_ref())?;
        match &processor {
            Processor::Shaper(shaper) => {
                let shaper: &B::Node = AsRef::<B::Node>::as_ref(shaper);
                backend.connect(input.as_ref(), shaper)?;
                backend.connect(shaper, wet.as_ref())?;
            }
            Processor::Feedback { line, feedback } => {
                let line: &B::Node = AsRef::<B::Node>::as_ref(line);
                let feedback: &B::Node = AsRef::<B::Node>::as_ref(feedback);
                backend.connect(input.as_ref(), line)?;
                backend.connect(line, feedback)?;
                backend.connect(feedback, line)?;
                backend.connect(line, wet.as_ref())?;
            }
        }
        backend.connect(wet.as_ref(), output.as_ref())?;

        Ok(Self {
            input,
            dry,
            wet,
            output,
            processor,
        })
    }
}

/// Distortion is an insert and crossfades; delay and reverb are sends on top
/// of an untouched dry signal.
#[inline]
fn dry_level(stage: EffectStage, mix: f32) -> f32 {
    match stage {
        EffectStage::Distortion => 1.0 - mix,
        EffectStage::Delay | EffectStage::Reverb => 1.0,
    }
}

pub struct AudioEngine<B: AudioBackend> {
    backend: B,
    input: B::Gain,
    stages: [StageNodes<B>; 3],
    master: B::Gain,
    analyser: B::Analyser,
    mix: [f32; 3],
    distortion_amount: f32,
    master_volume: f32,
}

impl<B: AudioBackend> AudioEngine<B> {
    /// Build the shared graph from the initial configuration.
    ///
    /// Any failure here means the session cannot produce sound and is reported
    /// as `DeviceUnavailable`.
    pub fn new(backend: B, config: &SynthConfig) -> Result<Self> {
        let unavailable = |e: SynthError| SynthError::DeviceUnavailable(e.to_string());

        let effects = &config.effects;
        let mut mix = [0.0_f32; 3];
        for stage in EffectStage::ALL {
            mix[stage.index()] = stage_mix(stage, effects.get(stage));
        }
        let distortion_amount = effects.distortion * DISTORTION_AMOUNT_SCALE;
        let master_volume = config.master_volume.clamp(0.0, 1.0);

        let input = backend.create_gain(1.0).map_err(unavailable)?;
        let stages = [
            StageNodes::build(&backend, EffectStage::Distortion, mix[0], distortion_amount),
            StageNodes::build(&backend, EffectStage::Delay, mix[1], 0.0),
            StageNodes::build(&backend, EffectStage::Reverb, mix[2], 0.0),
        ];
        let [distortion, delay, reverb] = stages;
        let stages = [
            distortion.map_err(unavailable)?,
            delay.map_err(unavailable)?,
            reverb.map_err(unavailable)?,
        ];
        let master = backend.create_gain(master_volume).map_err(unavailable)?;
        let analyser = backend
            .create_analyser(ANALYSER_FFT_SIZE)
            .map_err(unavailable)?;

        let wire = || -> Result<()> {
            backend.connect(input.as_ref(), stages[0].input.as_ref())?;
            for pair in stages.windows(2) {
                backend.connect(pair[0].output.as_ref(), pair[1].input.as_ref())?;
            }
            backend.connect(stages[2].output.as_ref(), master.as_ref())?;
            backend.connect_to_destination(master.as_ref())?;
            backend.connect(master.as_ref(), analyser.as_ref())?;
            Ok(())
        };
        wire().map_err(unavailable)?;

        log::info!(
            "[engine] graph ready master={:.2} mix=({:.2},{:.2},{:.2})",
            master_volume,
            mix[0],
            mix[1],
            mix[2]
        );
        Ok(Self {
            backend,
            input,
            stages,
            master,
            analyser,
            mix,
            distortion_amount,
            master_volume,
        })
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Node every voice's envelope gain connects into.
    #[inline]
    pub fn input(&self) -> &B::Gain {
        &self.input
    }

    #[inline]
    pub fn current_time(&self) -> f64 {
        self.backend.current_time()
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn effect_mix(&self, stage: EffectStage) -> f32 {
        self.mix[stage.index()]
    }

    pub fn distortion_amount(&self) -> f32 {
        self.distortion_amount
    }

    pub fn master_node(&self) -> &B::Gain {
        &self.master
    }

    pub fn analyser_node(&self) -> &B::Analyser {
        &self.analyser
    }

    /// Wet gain node of a stage, for inspection.
    pub fn stage_wet(&self, stage: EffectStage) -> &B::Gain {
        &self.stages[stage.index()].wet
    }

    pub fn stage_dry(&self, stage: EffectStage) -> &B::Gain {
        &self.stages[stage.index()].dry
    }

    pub fn set_master_volume(&mut self, value: f32) {
        let value = value.clamp(0.0, 1.0);
        self.master_volume = value;
        self.backend.set_gain(&self.master, value);
        log::debug!("[engine] master volume {:.2}", value);
    }

    /// Write a stage's wet mix (and the matching dry level) immediately.
    pub fn set_effect_mix(&mut self, stage: EffectStage, value: f32) {
        let value = value.clamp(0.0, 1.0);
        self.mix[stage.index()] = value;
        let nodes = &self.stages[stage.index()];
        self.backend.set_gain(&nodes.wet, value);
        self.backend.set_gain(&nodes.dry, dry_level(stage, value));
        log::debug!("[engine] {} mix {:.2}", stage.as_str(), value);
    }

    /// Regenerate the wave shaper curve for a new drive amount.
    pub fn set_distortion_amount(&mut self, amount: f32) {
        let amount = amount.max(0.0);
        self.distortion_amount = amount;
        if let Processor::Shaper(shaper) = &self.stages[EffectStage::Distortion.index()].processor
        {
            let curve = distortion_curve(amount, DISTORTION_CURVE_LEN);
            self.backend.set_curve(shaper, &curve);
        }
    }

    /// Apply a UI-level effect amount in [0, 1].
    ///
    /// Distortion drives the curve with `level * 100` and switches its mix fully
    /// on above a small threshold; delay and reverb use the level as wet mix.
    pub fn set_effect_param(&mut self, stage: EffectStage, level: f32) {
        let level = level.clamp(0.0, 1.0);
        if stage == EffectStage::Distortion {
            self.set_distortion_amount(level * DISTORTION_AMOUNT_SCALE);
        }
        self.set_effect_mix(stage, stage_mix(stage, level));
    }

    /// Copy the current post-master waveform into `out`.
    pub fn fill_waveform(&self, out: &mut [u8]) {
        self.backend.read_waveform(&self.analyser, out);
    }

    /// Fixed-size byte time-domain snapshot of the post-master signal.
    pub fn waveform_snapshot(&self) -> Vec<u8> {
        let mut buf = vec![WAVEFORM_SILENCE; WAVEFORM_SNAPSHOT_LEN];
        self.fill_waveform(&mut buf);
        buf
    }
}

#[inline]
fn stage_mix(stage: EffectStage, level: f32) -> f32 {
    match stage {
        EffectStage::Distortion => {
            if level > DISTORTION_MIX_THRESHOLD {
                1.0
            } else {
                0.0
            }
        }
        EffectStage::Delay | EffectStage::Reverb => level.clamp(0.0, 1.0),
    }
}
