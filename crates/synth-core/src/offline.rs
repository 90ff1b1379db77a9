//! Deterministic in-memory backend with a manually advanced clock.
//!
//! It renders no audio. Instead it records the graph the synth builds (nodes,
//! connections, oscillator start/stop times, gain automation) so the
//! scheduling engine can be driven and inspected on the host. It enforces the
//! same start/stop rules a browser does: an oscillator starts at most once,
//! and start/stop times must be finite and non-negative. Gain automation is
//! limited to the events `web-sys` exposes.

use crate::automation::{Automation, ParamEvent};
use crate::backend::AudioBackend;
use crate::config::Waveform;
use crate::constants::WAVEFORM_SILENCE;
use crate::error::{Result, SynthError};
use std::cell::{Cell, RefCell};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl AsRef<NodeId> for NodeId {
    fn as_ref(&self) -> &NodeId {
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Gain,
    Oscillator,
    Shaper,
    Delay,
    Analyser,
}

/// Everything the offline context knows about one node.
#[derive(Clone, Debug)]
pub struct NodeRecord {
    pub kind: NodeKind,
    pub outputs: Vec<NodeId>,
    pub to_destination: bool,
    pub disconnected: bool,
    pub gain: Automation,
    pub waveform: Waveform,
    pub frequency_hz: f32,
    pub detune: f32,
    pub started_at: Option<f64>,
    pub stop_at: Option<f64>,
    pub curve: Vec<f32>,
    pub delay_sec: f64,
    pub fft_size: u32,
}

impl NodeRecord {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            outputs: Vec::new(),
            to_destination: false,
            disconnected: false,
            gain: Automation::new(1.0),
            waveform: Waveform::Sine,
            frequency_hz: 0.0,
            detune: 0.0,
            started_at: None,
            stop_at: None,
            curve: Vec::new(),
            delay_sec: 0.0,
            fft_size: 0,
        }
    }

    /// Whether an oscillator is producing sound at audio time `t`.
    pub fn is_playing_at(&self, t: f64) -> bool {
        match self.started_at {
            Some(start) => {
                !self.disconnected && start <= t && self.stop_at.map_or(true, |stop| t < stop)
            }
            None => false,
        }
    }
}

#[derive(Default)]
struct State {
    nodes: Vec<NodeRecord>,
    refuse_starts: usize,
}

#[derive(Default)]
pub struct OfflineContext {
    time: Cell<f64>,
    state: RefCell<State>,
}

impl OfflineContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_time(&self, t: f64) {
        self.time.set(t);
    }

    pub fn advance(&self, dt: f64) {
        self.time.set(self.time.get() + dt);
    }

    /// Make the next `n` oscillator starts fail.
    pub fn refuse_next_starts(&self, n: usize) {
        self.state.borrow_mut().refuse_starts = n;
    }

    pub fn node(&self, id: NodeId) -> NodeRecord {
        self.state.borrow().nodes[id.0].clone()
    }

    pub fn node_count(&self) -> usize {
        self.state.borrow().nodes.len()
    }

    pub fn gain_at(&self, id: NodeId, t: f64) -> f32 {
        self.state.borrow().nodes[id.0].gain.value_at(t)
    }

    pub fn is_connected(&self, from: NodeId, to: NodeId) -> bool {
        self.state.borrow().nodes[from.0].outputs.contains(&to)
    }

    /// Oscillators that are started, not yet stopped and still wired at `t`.
    pub fn oscillators_playing_at(&self, t: f64) -> usize {
        self.state
            .borrow()
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Oscillator && n.is_playing_at(t))
            .count()
    }

    /// Oscillators that were created and never disconnected.
    pub fn attached_oscillators(&self) -> usize {
        self.state
            .borrow()
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Oscillator && !n.disconnected)
            .count()
    }

    fn push(&self, record: NodeRecord) -> NodeId {
        let mut state = self.state.borrow_mut();
        state.nodes.push(record);
        NodeId(state.nodes.len() - 1)
    }

    fn with_node<R>(&self, id: NodeId, f: impl FnOnce(&mut NodeRecord) -> R) -> R {
        f(&mut self.state.borrow_mut().nodes[id.0])
    }
}

fn check_time(when: f64, what: &str) -> Result<()> {
    if when.is_finite() && when >= 0.0 {
        Ok(())
    } else {
        Err(SynthError::Backend(format!("{what}: time {when} out of range")))
    }
}

impl AudioBackend for OfflineContext {
    type Node = NodeId;
    type Gain = NodeId;
    type Oscillator = NodeId;
    type Shaper = NodeId;
    type Delay = NodeId;
    type Analyser = NodeId;

    fn current_time(&self) -> f64 {
        self.time.get()
    }

    fn create_gain(&self, value: f32) -> Result<NodeId> {
        let mut record = NodeRecord::new(NodeKind::Gain);
        record.gain = Automation::new(value);
        Ok(self.push(record))
    }

    fn create_oscillator(
        &self,
        waveform: Waveform,
        frequency_hz: f32,
        detune_cents: f32,
    ) -> Result<NodeId> {
        let mut record = NodeRecord::new(NodeKind::Oscillator);
        record.waveform = waveform;
        record.frequency_hz = frequency_hz;
        record.detune = detune_cents;
        Ok(self.push(record))
    }

    fn create_wave_shaper(&self, curve: &[f32]) -> Result<NodeId> {
        let mut record = NodeRecord::new(NodeKind::Shaper);
        record.curve = curve.to_vec();
        Ok(self.push(record))
    }

    fn create_delay(&self, delay_sec: f64, max_delay_sec: f64) -> Result<NodeId> {
        if delay_sec > max_delay_sec {
            return Err(SynthError::Backend(format!(
                "delay {delay_sec}s exceeds max {max_delay_sec}s"
            )));
        }
        let mut record = NodeRecord::new(NodeKind::Delay);
        record.delay_sec = delay_sec;
        Ok(self.push(record))
    }

    fn create_analyser(&self, fft_size: u32) -> Result<NodeId> {
        if !fft_size.is_power_of_two() || fft_size < 32 {
            return Err(SynthError::Backend(format!("fft size {fft_size}")));
        }
        let mut record = NodeRecord::new(NodeKind::Analyser);
        record.fft_size = fft_size;
        Ok(self.push(record))
    }

    fn connect(&self, from: &NodeId, to: &NodeId) -> Result<()> {
        let to = *to;
        self.with_node(*from, |n| {
            if !n.outputs.contains(&to) {
                n.outputs.push(to);
            }
        });
        Ok(())
    }

    fn connect_to_destination(&self, from: &NodeId) -> Result<()> {
        self.with_node(*from, |n| n.to_destination = true);
        Ok(())
    }

    fn disconnect(&self, node: &NodeId) {
        self.with_node(*node, |n| {
            n.outputs.clear();
            n.to_destination = false;
            n.disconnected = true;
        });
    }

    fn start_oscillator(&self, osc: &NodeId, when: f64) -> Result<()> {
        {
            let mut state = self.state.borrow_mut();
            if state.refuse_starts > 0 {
                state.refuse_starts -= 1;
                return Err(SynthError::Backend("oscillator start refused".into()));
            }
        }
        check_time(when, "start")?;
        self.with_node(*osc, |n| {
            if n.started_at.is_some() {
                return Err(SynthError::Backend("oscillator already started".into()));
            }
            n.started_at = Some(when);
            Ok(())
        })
    }

    fn stop_oscillator(&self, osc: &NodeId, when: f64) -> Result<()> {
        check_time(when, "stop")?;
        self.with_node(*osc, |n| {
            if n.started_at.is_none() {
                return Err(SynthError::Backend("stop before start".into()));
            }
            n.stop_at = Some(when);
            Ok(())
        })
    }

    fn set_waveform(&self, osc: &NodeId, waveform: Waveform) {
        self.with_node(*osc, |n| n.waveform = waveform);
    }

    fn set_detune(&self, osc: &NodeId, cents: f32) {
        self.with_node(*osc, |n| n.detune = cents);
    }

    fn set_gain(&self, gain: &NodeId, value: f32) {
        let now = self.current_time();
        self.with_node(*gain, |n| {
            n.gain
                .apply(ParamEvent::SetValueAtTime { value, time: now })
        });
    }

    fn automate_gain(&self, gain: &NodeId, event: ParamEvent) {
        // web-sys has no cancel-and-hold; degrade it the same way here.
        let event = match event {
            ParamEvent::CancelAndHoldAtTime { at } => {
                ParamEvent::CancelScheduledValues { from: at }
            }
            other => other,
        };
        self.with_node(*gain, |n| n.gain.apply(event));
    }

    fn set_curve(&self, shaper: &NodeId, curve: &[f32]) {
        self.with_node(*shaper, |n| n.curve = curve.to_vec());
    }

    fn read_waveform(&self, _analyser: &NodeId, out: &mut [u8]) {
        out.fill(WAVEFORM_SILENCE);
    }
}
