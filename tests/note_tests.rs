// Host-side tests for note name resolution.

use synth_core::{midi_number, midi_to_hz, resolve, SynthError};

#[test]
fn resolve_matches_reference_pitches() {
    assert_eq!(resolve("A4").unwrap(), 440.0);
    assert!((resolve("A3").unwrap() - 220.0).abs() < 1e-9);
    let c5 = resolve("C5").unwrap();
    assert!((c5 - 523.2511).abs() < 1e-3, "C5 = {c5}");
    let c4 = resolve("C4").unwrap();
    assert!((c4 - 261.6256).abs() < 1e-3, "C4 = {c4}");
}

#[test]
fn midi_numbers_follow_octave_formula() {
    assert_eq!(midi_number("C4").unwrap(), 60);
    assert_eq!(midi_number("A4").unwrap(), 69);
    assert_eq!(midi_number("C#4").unwrap(), 61);
    assert_eq!(midi_number("B3").unwrap(), 59);
    assert_eq!(midi_number("C-1").unwrap(), 0);
}

#[test]
fn sharps_sit_between_naturals() {
    let c = resolve("C4").unwrap();
    let cs = resolve("C#4").unwrap();
    let d = resolve("D4").unwrap();
    assert!(c < cs && cs < d);
}

#[test]
fn unknown_pitch_class_is_rejected() {
    for bad in ["H4", "Cb4", "c4", "", "C", "C#x", "4"] {
        match resolve(bad) {
            Err(SynthError::InvalidNote(name)) => assert_eq!(name, bad),
            other => panic!("expected InvalidNote for {bad:?}, got {other:?}"),
        }
    }
}

#[test]
fn midi_to_hz_octave_doubling_property() {
    for midi in 20..100 {
        let f1 = midi_to_hz(midi as f64);
        let f2 = midi_to_hz((midi + 12) as f64);
        assert!((f2 / f1 - 2.0).abs() < 1e-9, "octave ratio broken at {midi}");
    }
}

#[test]
fn midi_to_hz_is_monotonic_over_range() {
    let mut prev = midi_to_hz(0.0);
    for m in 1..=127 {
        let f = midi_to_hz(m as f64);
        assert!(f > prev, "frequency not increasing at midi {m}");
        prev = f;
    }
}

#[test]
fn octaves_too_large_for_midi_arithmetic_are_rejected() {
    for bad in ["C300000000", "B178956970", "C-300000000"] {
        assert!(
            matches!(resolve(bad), Err(SynthError::InvalidNote(_))),
            "{bad} should be rejected"
        );
    }
    assert_eq!(midi_number("C100").unwrap(), 1212);
}
