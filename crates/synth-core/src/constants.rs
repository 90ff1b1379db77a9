// Timing and routing constants shared by the core and the web front-end.

// Scheduling
pub const LOOKAHEAD_SEC: f64 = 0.1; // how far ahead of the audio clock steps are committed
pub const SCHEDULER_TICK_MS: i32 = 25; // wall-clock interval of the scheduler tick
pub const STEP_COUNT: usize = 8; // steps per sequencer row
pub const STEPS_PER_BEAT: f64 = 4.0; // each step is a sixteenth note
pub const NOTE_OFF_FRACTION: f64 = 0.95; // sequenced note length relative to the step
pub const DEFAULT_TEMPO_BPM: u32 = 120;

// Voice lifecycle
pub const RELEASE_FLOOR: f32 = 0.0001; // release target; never ramp to exact zero
pub const CLEANUP_MARGIN_SEC: f64 = 0.1; // wait after oscillator stop before disconnecting

// Analysis tap
pub const ANALYSER_FFT_SIZE: u32 = 2048;
pub const WAVEFORM_SNAPSHOT_LEN: usize = (ANALYSER_FFT_SIZE / 2) as usize;
pub const WAVEFORM_SILENCE: u8 = 128; // byte time-domain midpoint

// Effects
pub const DISTORTION_CURVE_LEN: usize = 44_100;
pub const DISTORTION_AMOUNT_SCALE: f32 = 100.0; // UI level 0..1 -> curve amount
pub const DISTORTION_MIX_THRESHOLD: f32 = 0.01; // below this the shaper is bypassed
pub const DELAY_TIME_SEC: f64 = 0.3;
pub const DELAY_MAX_SEC: f64 = 1.0;
pub const DELAY_FEEDBACK: f32 = 0.35;
pub const REVERB_COMB_SEC: f64 = 0.045; // short comb standing in for a room
pub const REVERB_FEEDBACK: f32 = 0.6;
