use synth_core::{AudioBackend, ParamEvent, Result, SynthError, Waveform};
use wasm_bindgen::JsValue;
use web_sys as web;

/// `AudioBackend` over a live browser `AudioContext`.
pub struct WebAudioBackend {
    ctx: web::AudioContext,
}

fn js_err(what: &'static str) -> impl Fn(JsValue) -> SynthError {
    move |e| SynthError::Backend(format!("{what}: {e:?}"))
}

#[inline]
fn oscillator_type(waveform: Waveform) -> web::OscillatorType {
    match waveform {
        Waveform::Sine => web::OscillatorType::Sine,
        Waveform::Square => web::OscillatorType::Square,
        Waveform::Sawtooth => web::OscillatorType::Sawtooth,
        Waveform::Triangle => web::OscillatorType::Triangle,
    }
}

impl WebAudioBackend {
    /// Open the default output device.
    pub fn new() -> Result<Self> {
        let ctx = web::AudioContext::new()
            .map_err(|e| SynthError::DeviceUnavailable(format!("{e:?}")))?;
        log::info!(
            "[audio] context ready: {} Hz, state {:?}",
            ctx.sample_rate(),
            ctx.state()
        );
        Ok(Self { ctx })
    }

    pub fn context(&self) -> &web::AudioContext {
        &self.ctx
    }
}

impl AudioBackend for WebAudioBackend {
    type Node = web::AudioNode;
    type Gain = web::GainNode;
    type Oscillator = web::OscillatorNode;
    type Shaper = web::WaveShaperNode;
    type Delay = web::DelayNode;
    type Analyser = web::AnalyserNode;

    fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }

    fn create_gain(&self, value: f32) -> Result<web::GainNode> {
        let g = web::GainNode::new(&self.ctx).map_err(js_err("GainNode"))?;
        g.gain().set_value(value);
        Ok(g)
    }

    fn create_oscillator(
        &self,
        waveform: Waveform,
        frequency_hz: f32,
        detune_cents: f32,
    ) -> Result<web::OscillatorNode> {
        let osc = web::OscillatorNode::new(&self.ctx).map_err(js_err("OscillatorNode"))?;
        osc.set_type(oscillator_type(waveform));
        osc.frequency().set_value(frequency_hz);
        osc.detune().set_value(detune_cents);
        Ok(osc)
    }

    fn create_wave_shaper(&self, curve: &[f32]) -> Result<web::WaveShaperNode> {
        let shaper = web::WaveShaperNode::new(&self.ctx).map_err(js_err("WaveShaperNode"))?;
        self.set_curve(&shaper, curve);
        shaper.set_oversample(web::OverSampleType::N4x);
        Ok(shaper)
    }

    fn create_delay(&self, delay_sec: f64, max_delay_sec: f64) -> Result<web::DelayNode> {
        let delay = self
            .ctx
            .create_delay_with_max_delay_time(max_delay_sec)
            .map_err(js_err("DelayNode"))?;
        delay.delay_time().set_value(delay_sec as f32);
        Ok(delay)
    }

    fn create_analyser(&self, fft_size: u32) -> Result<web::AnalyserNode> {
        let analyser = web::AnalyserNode::new(&self.ctx).map_err(js_err("AnalyserNode"))?;
        analyser.set_fft_size(fft_size);
        Ok(analyser)
    }

    fn connect(&self, from: &web::AudioNode, to: &web::AudioNode) -> Result<()> {
        from.connect_with_audio_node(to)
            .map(|_| ())
            .map_err(js_err("connect"))
    }

    fn connect_to_destination(&self, from: &web::AudioNode) -> Result<()> {
        from.connect_with_audio_node(&self.ctx.destination())
            .map(|_| ())
            .map_err(js_err("connect destination"))
    }

    fn disconnect(&self, node: &web::AudioNode) {
        // Disconnecting an already detached node throws; that is fine here.
        if let Err(e) = node.disconnect() {
            log::debug!("[audio] disconnect: {:?}", e);
        }
    }

    fn start_oscillator(&self, osc: &web::OscillatorNode, when: f64) -> Result<()> {
        osc.start_with_when(when).map_err(js_err("oscillator start"))
    }

    fn stop_oscillator(&self, osc: &web::OscillatorNode, when: f64) -> Result<()> {
        osc.stop_with_when(when).map_err(js_err("oscillator stop"))
    }

    fn set_waveform(&self, osc: &web::OscillatorNode, waveform: Waveform) {
        osc.set_type(oscillator_type(waveform));
    }

    fn set_detune(&self, osc: &web::OscillatorNode, cents: f32) {
        _ = osc.detune().set_value_at_time(cents, self.ctx.current_time());
    }

    fn set_gain(&self, gain: &web::GainNode, value: f32) {
        _ = gain.gain().set_value_at_time(value, self.ctx.current_time());
    }

    fn automate_gain(&self, gain: &web::GainNode, event: ParamEvent) {
        let param = gain.gain();
        let result = match event {
            ParamEvent::SetValueAtTime { value, time } => param.set_value_at_time(value, time),
            ParamEvent::LinearRampToValueAtTime { value, time } => {
                param.linear_ramp_to_value_at_time(value, time)
            }
            ParamEvent::CancelScheduledValues { from } => param.cancel_scheduled_values(from),
            // Not exposed by web-sys. The envelope only emits plain cancels.
            ParamEvent::CancelAndHoldAtTime { at } => param.cancel_scheduled_values(at),
        };
        if let Err(e) = result {
            log::warn!("[audio] {:?} rejected: {:?}", event, e);
        }
    }

    fn set_curve(&self, shaper: &web::WaveShaperNode, curve: &[f32]) {
        let mut curve = curve.to_vec();
        shaper.set_curve(Some(curve.as_mut_slice()));
    }

    fn read_waveform(&self, analyser: &web::AnalyserNode, out: &mut [u8]) {
        analyser.get_byte_time_domain_data(out);
    }
}
