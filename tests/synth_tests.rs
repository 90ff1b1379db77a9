// Host-side tests for the Synth facade: keyboard path, sequencer ticks and
// live parameter changes.

use synth_core::{
    EffectStage, EnvelopeParam, NoteOffOutcome, OfflineContext, OscParam, OscSlot,
    RetriggerMode, SequencerEvent, Synth, SynthConfig, VoicePhase, Waveform,
};

fn synth() -> Synth<OfflineContext> {
    Synth::new(OfflineContext::new(), SynthConfig::default()).unwrap()
}

#[test]
fn keyboard_note_defaults_to_now() {
    let mut s = synth();
    s.engine().backend().set_time(2.0);
    s.note_on("A4", None).unwrap();
    assert_eq!(s.voices().start_time("A4"), Some(2.0));

    s.engine().backend().set_time(2.5);
    match s.note_off("A4", None) {
        NoteOffOutcome::Released { stop_at } => assert!((stop_at - 2.6).abs() < 1e-9),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn sequenced_cell_plays_and_is_cleaned_up() {
    let mut s = synth();
    s.toggle_step("C4", 0).unwrap();
    s.start_sequencer();

    let events = s.tick().to_vec();
    assert!(events.contains(&SequencerEvent::NoteOn {
        note: "C4".into(),
        time: 0.0
    }));
    match s.voices().phase("C4") {
        Some(VoicePhase::Releasing { stop_at }) => {
            assert!((stop_at - (0.11875 + 0.1)).abs() < 1e-9)
        }
        other => panic!("unexpected phase {other:?}"),
    }

    s.engine().backend().set_time(0.5);
    let events = s.tick().to_vec();
    let stepped: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            SequencerEvent::Step { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(stepped, vec![1, 2, 3, 4]);
    assert!(!s.voices().is_active("C4"));
    assert_eq!(s.engine().backend().attached_oscillators(), 0);
}

#[test]
fn stopping_the_sequencer_keeps_committed_notes() {
    let mut s = synth();
    s.toggle_step("E4", 0).unwrap();
    s.start_sequencer();
    s.tick();
    s.stop_sequencer();
    assert!(s.voices().is_active("E4"));
    assert!(!s.sequencer().is_playing());
    assert_eq!(s.engine().backend().oscillators_playing_at(0.05), 2);
}

#[test]
fn sequencer_overlap_mode_is_configurable() {
    let mut s = synth();
    s.set_retrigger_mode(RetriggerMode::Overlap);
    s.set_envelope_param(EnvelopeParam::Release, 0.5).unwrap();
    s.set_step("G4", 0, true).unwrap();
    s.set_step("G4", 1, true).unwrap();
    s.start_sequencer();
    s.engine().backend().set_time(0.1);
    s.tick();
    // Step 0's tail overlaps step 1's attack.
    assert_eq!(s.engine().backend().oscillators_playing_at(0.13), 4);
}

#[test]
fn oscillator_params_update_config_and_voices() {
    let mut s = synth();
    s.note_on("C4", Some(0.0)).unwrap();
    s.set_oscillator_param(OscSlot::One, OscParam::Waveform(Waveform::Triangle));
    s.set_oscillator_param(OscSlot::Two, OscParam::Detune(-7.0));
    assert_eq!(s.config().oscillators[0].waveform, Waveform::Triangle);
    assert_eq!(s.config().oscillators[1].detune, -7.0);

    let voice = s.voices().voice("C4").unwrap();
    let ctx = s.engine().backend();
    assert_eq!(ctx.node(*voice.oscillator(OscSlot::One)).waveform, Waveform::Triangle);
    assert_eq!(ctx.node(*voice.oscillator(OscSlot::Two)).detune, -7.0);

    // New voices pick up the stored settings.
    s.note_on("E4", Some(0.0)).unwrap();
    let voice = s.voices().voice("E4").unwrap();
    let ctx = s.engine().backend();
    assert_eq!(ctx.node(*voice.oscillator(OscSlot::One)).waveform, Waveform::Triangle);
}

#[test]
fn envelope_params_are_validated() {
    let mut s = synth();
    s.set_envelope_param(EnvelopeParam::Attack, -1.0).unwrap();
    assert_eq!(s.config().envelope.attack, 0.0);
    s.set_envelope_param(EnvelopeParam::Sustain, 3.0).unwrap();
    assert_eq!(s.config().envelope.sustain, 1.0);
    assert!(s.set_envelope_param(EnvelopeParam::Decay, f64::NAN).is_err());
    assert_eq!(s.config().envelope.decay, 0.1);
}

#[test]
fn effect_and_volume_changes_reach_config_and_graph() {
    let mut s = synth();
    s.set_effect_param(EffectStage::Delay, 0.4);
    s.set_master_volume(0.8);
    assert_eq!(s.config().effects.delay, 0.4);
    assert_eq!(s.config().master_volume, 0.8);
    assert_eq!(s.engine().effect_mix(EffectStage::Delay), 0.4);
    let master = *s.engine().master_node();
    assert_eq!(s.engine().backend().gain_at(master, 0.0), 0.8);
}

#[test]
fn tempo_updates_sequencer_and_config() {
    let mut s = synth();
    s.set_tempo(90).unwrap();
    assert_eq!(s.sequencer().tempo(), 90);
    assert_eq!(s.config().sequencer.tempo_bpm, 90);
    assert!(s.set_tempo(0).is_err());
    assert_eq!(s.config().sequencer.tempo_bpm, 90);
}

#[test]
fn preset_round_trip_through_facade() {
    let mut s = synth();
    let bank = synth_core::PresetBank::with_factory(s.config());
    let lead = bank.get("lead").unwrap().clone();
    s.apply_preset(&lead);
    assert_eq!(s.preset_snapshot(), lead);
    assert_eq!(s.engine().master_volume(), 0.5);
    assert_eq!(s.engine().effect_mix(EffectStage::Delay), 0.4);
    assert_eq!(s.config().oscillators[0].waveform, Waveform::Sawtooth);
}

#[test]
fn snapshot_is_silent_without_audio() {
    let s = synth();
    assert_eq!(s.waveform_snapshot().len(), 1024);
}
