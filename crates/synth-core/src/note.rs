use crate::error::{Result, SynthError};

/// Pitch class names in semitone order starting from C.
pub const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Convert a MIDI note number to Hertz (A4 = MIDI 69 = 440 Hz).
///
/// Monotonic and exhibits octave symmetry: +12 semitones doubles the frequency.
pub fn midi_to_hz(midi: f64) -> f64 {
    440.0 * 2.0_f64.powf((midi - 69.0) / 12.0)
}

/// MIDI number of a note name such as `"C4"` or `"F#5"`.
///
/// `midi = pitch_class_index + octave * 12 + 12`, so `"C4"` is 60 and `"A4"` 69.
pub fn midi_number(note: &str) -> Result<i32> {
    let split = note
        .find(|c: char| c.is_ascii_digit() || c == '-')
        .ok_or_else(|| SynthError::InvalidNote(note.to_string()))?;
    let (class, octave) = note.split_at(split);
    let class_index = PITCH_CLASSES
        .iter()
        .position(|c| *c == class)
        .ok_or_else(|| SynthError::InvalidNote(note.to_string()))?;
    let octave: i32 = octave
        .parse()
        .map_err(|_| SynthError::InvalidNote(note.to_string()))?;
    octave
        .checked_mul(12)
        .and_then(|v| v.checked_add(class_index as i32 + 12))
        .ok_or_else(|| SynthError::InvalidNote(note.to_string()))
}

/// Resolve a note name to its equal-tempered frequency in Hz.
pub fn resolve(note: &str) -> Result<f64> {
    midi_number(note).map(|m| midi_to_hz(m as f64))
}
