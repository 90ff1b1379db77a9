#![cfg(target_arch = "wasm32")]
use crate::audio::Scheduler;
use crate::backend::WebAudioBackend;
use std::cell::RefCell;
use std::rc::Rc;
use synth_core::{
    EffectStage, EnvelopeParam, NoteOffOutcome, OscParam, OscSlot, PresetBank, PresetSnapshot,
    Synth, SynthConfig, SynthError,
};
use wasm_bindgen::prelude::*;

mod audio;
mod backend;
mod dom;
mod events;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("synth-web starting");
    Ok(())
}

fn to_js(e: SynthError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// The synthesizer as seen from the page.
///
/// Owns the audio context, the scheduler interval and the keyboard listeners.
/// Construction is the only call that can end the session: if the audio
/// graph cannot be built the user is told and nothing else runs.
#[wasm_bindgen]
pub struct SynthHandle {
    synth: Rc<RefCell<Synth<WebAudioBackend>>>,
    presets: RefCell<PresetBank>,
    _scheduler: Scheduler,
}

fn init() -> anyhow::Result<SynthHandle> {
    let backend = WebAudioBackend::new()?;
    let synth = Synth::new(backend, SynthConfig::default())?;
    let presets = PresetBank::with_factory(synth.config());
    let synth = Rc::new(RefCell::new(synth));
    let scheduler = Scheduler::start(synth.clone())?;
    events::wire_keyboard(synth.clone());
    log::info!("[synth] initialized");
    Ok(SynthHandle {
        synth,
        presets: RefCell::new(presets),
        _scheduler: scheduler,
    })
}

impl SynthHandle {
    fn resume(&self) {
        audio::ensure_running(self.synth.borrow().engine().backend().context());
    }
}

#[wasm_bindgen]
impl SynthHandle {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<SynthHandle, JsValue> {
        init().map_err(|e| {
            log::error!("init error: {:?}", e);
            dom::alert("Web Audio is not available in this browser, or it failed to start.");
            JsValue::from_str(&e.to_string())
        })
    }

    /// Returns false when the note was ignored (bad name or start failure).
    #[wasm_bindgen(js_name = noteOn)]
    pub fn note_on(&self, note: &str, time: Option<f64>) -> bool {
        self.resume();
        self.synth.borrow_mut().note_on(note, time).is_ok()
    }

    /// Returns false when the note was not sounding.
    #[wasm_bindgen(js_name = noteOff)]
    pub fn note_off(&self, note: &str, time: Option<f64>) -> bool {
        matches!(
            self.synth.borrow_mut().note_off(note, time),
            NoteOffOutcome::Released { .. }
        )
    }

    /// `slot` is 1 or 2; `param` is `type`, `detune` or `gain`.
    #[wasm_bindgen(js_name = setOscillatorParam)]
    pub fn set_oscillator_param(&self, slot: u8, param: &str, value: &str) -> Result<(), JsValue> {
        let slot = OscSlot::from_number(slot).map_err(to_js)?;
        let param = OscParam::parse(param, value).map_err(to_js)?;
        self.synth.borrow_mut().set_oscillator_param(slot, param);
        Ok(())
    }

    #[wasm_bindgen(js_name = setEnvelopeParam)]
    pub fn set_envelope_param(&self, param: &str, value: f64) -> Result<(), JsValue> {
        let param: EnvelopeParam = param.parse().map_err(to_js)?;
        self.synth
            .borrow_mut()
            .set_envelope_param(param, value)
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = setMasterVolume)]
    pub fn set_master_volume(&self, value: f32) {
        self.synth.borrow_mut().set_master_volume(value);
    }

    #[wasm_bindgen(js_name = setEffectParam)]
    pub fn set_effect_param(&self, effect: &str, value: f32) -> Result<(), JsValue> {
        let stage: EffectStage = effect.parse().map_err(to_js)?;
        self.synth.borrow_mut().set_effect_param(stage, value);
        Ok(())
    }

    #[wasm_bindgen(js_name = toggleStep)]
    pub fn toggle_step(&self, note: &str, index: usize) -> Result<bool, JsValue> {
        self.synth
            .borrow_mut()
            .toggle_step(note, index)
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = startSequencer)]
    pub fn start_sequencer(&self) {
        self.resume();
        self.synth.borrow_mut().start_sequencer();
    }

    #[wasm_bindgen(js_name = stopSequencer)]
    pub fn stop_sequencer(&self) {
        self.synth.borrow_mut().stop_sequencer();
    }

    #[wasm_bindgen(js_name = setTempo)]
    pub fn set_tempo(&self, bpm: u32) -> Result<(), JsValue> {
        self.synth.borrow_mut().set_tempo(bpm).map_err(to_js)
    }

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.synth.borrow().sequencer().is_playing()
    }

    /// Step the next scheduling pass will commit; the UI lights it.
    #[wasm_bindgen(js_name = currentStep)]
    pub fn current_step(&self) -> usize {
        self.synth.borrow().sequencer().current_step()
    }

    /// Byte time-domain samples of the output (128 = silence).
    #[wasm_bindgen(js_name = waveformSnapshot)]
    pub fn waveform_snapshot(&self) -> Vec<u8> {
        self.synth.borrow().waveform_snapshot()
    }

    /// Current configuration, for initializing controls.
    #[wasm_bindgen(js_name = config)]
    pub fn config(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.synth.borrow().config()).map_err(JsValue::from)
    }

    #[wasm_bindgen(js_name = presetSnapshot)]
    pub fn preset_snapshot(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.synth.borrow().preset_snapshot()).map_err(JsValue::from)
    }

    #[wasm_bindgen(js_name = applyPreset)]
    pub fn apply_preset(&self, preset: JsValue) -> Result<(), JsValue> {
        let preset: PresetSnapshot = serde_wasm_bindgen::from_value(preset)?;
        self.synth.borrow_mut().apply_preset(&preset);
        Ok(())
    }

    #[wasm_bindgen(js_name = presetNames)]
    pub fn preset_names(&self) -> js_sys::Array {
        self.presets
            .borrow()
            .names()
            .map(JsValue::from_str)
            .collect()
    }

    /// Apply a named preset from the bank.
    #[wasm_bindgen(js_name = loadPreset)]
    pub fn load_preset(&self, name: &str) -> Result<(), JsValue> {
        let presets = self.presets.borrow();
        let preset = presets
            .get(name)
            .ok_or_else(|| JsValue::from_str(&format!("unknown preset `{name}`")))?;
        self.synth.borrow_mut().apply_preset(preset);
        Ok(())
    }

    /// Store the current sound under `name`.
    #[wasm_bindgen(js_name = savePreset)]
    pub fn save_preset(&self, name: &str) -> Result<(), JsValue> {
        let snapshot = self.synth.borrow().preset_snapshot();
        self.presets
            .borrow_mut()
            .insert(name, snapshot)
            .map_err(to_js)
    }

    /// The whole bank as JSON, for the page to put in local storage.
    #[wasm_bindgen(js_name = exportPresets)]
    pub fn export_presets(&self) -> Result<String, JsValue> {
        self.presets.borrow().to_json().map_err(to_js)
    }

    /// Merge presets previously returned by `exportPresets`.
    #[wasm_bindgen(js_name = importPresets)]
    pub fn import_presets(&self, json: &str) -> Result<usize, JsValue> {
        self.presets.borrow_mut().merge_json(json).map_err(|e| {
            log::warn!("[preset] import failed: {}", e);
            to_js(e)
        })
    }
}
