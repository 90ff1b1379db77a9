//! The narrow slice of a WebAudio-style graph the synth drives.
//!
//! Implemented by the browser front-end over `web-sys` and by
//! [`OfflineContext`](crate::offline::OfflineContext) for host-side use.
//! Every node handle derefs to a common `Node` type so routing code can
//! connect heterogeneous nodes without caring which kind they are.

use crate::automation::ParamEvent;
use crate::config::Waveform;
use crate::error::Result;

pub trait AudioBackend {
    type Node;
    type Gain: AsRef<Self::Node>;
    type Oscillator: AsRef<Self::Node>;
    type Shaper: AsRef<Self::Node>;
    type Delay: AsRef<Self::Node>;
    type Analyser: AsRef<Self::Node>;

    /// Audio clock in seconds. Advances on its own; only ever polled.
    fn current_time(&self) -> f64;

    fn create_gain(&self, value: f32) -> Result<Self::Gain>;
    fn create_oscillator(
        &self,
        waveform: Waveform,
        frequency_hz: f32,
        detune_cents: f32,
    ) -> Result<Self::Oscillator>;
    fn create_wave_shaper(&self, curve: &[f32]) -> Result<Self::Shaper>;
    fn create_delay(&self, delay_sec: f64, max_delay_sec: f64) -> Result<Self::Delay>;
    fn create_analyser(&self, fft_size: u32) -> Result<Self::Analyser>;

    fn connect(&self, from: &Self::Node, to: &Self::Node) -> Result<()>;
    fn connect_to_destination(&self, from: &Self::Node) -> Result<()>;
    /// Remove every outgoing connection of `node`. Never fails loudly.
    fn disconnect(&self, node: &Self::Node);

    fn start_oscillator(&self, osc: &Self::Oscillator, when: f64) -> Result<()>;
    /// May be called again to move an already scheduled stop.
    fn stop_oscillator(&self, osc: &Self::Oscillator, when: f64) -> Result<()>;

    fn set_waveform(&self, osc: &Self::Oscillator, waveform: Waveform);
    /// Immediate write at the current audio time.
    fn set_detune(&self, osc: &Self::Oscillator, cents: f32);
    /// Immediate write at the current audio time.
    fn set_gain(&self, gain: &Self::Gain, value: f32);
    fn automate_gain(&self, gain: &Self::Gain, event: ParamEvent);

    fn set_curve(&self, shaper: &Self::Shaper, curve: &[f32]);
    /// Fill `out` with byte time-domain samples (128 = silence).
    fn read_waveform(&self, analyser: &Self::Analyser, out: &mut [u8]);
}
