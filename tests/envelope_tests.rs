// Host-side tests for gain automation and ADSR scheduling.

use synth_core::envelope::{
    apply_attack_decay, apply_cut, apply_release, attack_decay_events, release_events,
    ScheduledGain,
};
use synth_core::{
    AudioBackend, Automation, EnvelopeParams, OfflineContext, ParamEvent, RELEASE_FLOOR,
};

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

fn params(attack: f64, decay: f64, sustain: f32, release: f64) -> EnvelopeParams {
    EnvelopeParams {
        attack,
        decay,
        sustain,
        release,
    }
}

#[test]
fn automation_holds_default_until_first_event() {
    let mut a = Automation::new(0.3);
    assert_eq!(a.value_at(5.0), 0.3);
    a.apply(ParamEvent::SetValueAtTime {
        value: 0.8,
        time: 1.0,
    });
    assert_eq!(a.value_at(0.5), 0.3);
    assert_eq!(a.value_at(1.0), 0.8);
    assert_eq!(a.value_at(9.0), 0.8);
}

#[test]
fn automation_interpolates_linear_ramps() {
    let mut a = Automation::new(0.0);
    a.apply(ParamEvent::SetValueAtTime {
        value: 0.0,
        time: 1.0,
    });
    a.apply(ParamEvent::LinearRampToValueAtTime {
        value: 1.0,
        time: 2.0,
    });
    assert!(close(a.value_at(1.25), 0.25));
    assert!(close(a.value_at(1.5), 0.5));
    assert_eq!(a.value_at(2.0), 1.0);
    assert_eq!(a.value_at(3.0), 1.0);
}

#[test]
fn cancel_drops_later_events() {
    let mut a = Automation::new(0.0);
    a.apply(ParamEvent::SetValueAtTime {
        value: 0.5,
        time: 1.0,
    });
    a.apply(ParamEvent::SetValueAtTime {
        value: 0.9,
        time: 2.0,
    });
    a.apply(ParamEvent::CancelScheduledValues { from: 1.5 });
    assert_eq!(a.points().len(), 1);
    assert_eq!(a.value_at(3.0), 0.5);
}

#[test]
fn cancel_and_hold_truncates_a_running_ramp() {
    let mut a = Automation::new(0.0);
    a.apply(ParamEvent::SetValueAtTime {
        value: 0.0,
        time: 0.0,
    });
    a.apply(ParamEvent::LinearRampToValueAtTime {
        value: 1.0,
        time: 1.0,
    });
    a.apply(ParamEvent::CancelAndHoldAtTime { at: 0.4 });
    assert!(close(a.value_at(0.2), 0.2));
    assert!(close(a.value_at(0.4), 0.4));
    assert!(close(a.value_at(0.9), 0.4));
}

#[test]
fn attack_peaks_then_settles_at_sustain() {
    let ctx = OfflineContext::new();
    let mut gain = ScheduledGain::new(ctx.create_gain(0.0).unwrap(), 0.0);
    let p = params(0.1, 0.2, 0.5, 0.3);
    apply_attack_decay(&ctx, &mut gain, 1.0, &p);

    assert_eq!(gain.value_at(1.0), 0.0);
    assert!(close(gain.value_at(1.05), 0.5));
    assert_eq!(gain.value_at(1.0 + 0.1), 1.0);
    assert!(close(gain.value_at(1.2), 0.75));
    assert!(close(gain.value_at(1.3), 0.5));
    assert!(close(gain.value_at(4.0), 0.5));
    // The node saw exactly what the mirror recorded.
    assert_eq!(ctx.gain_at(gain.node, 1.05), gain.value_at(1.05));
    assert_eq!(ctx.gain_at(gain.node, 2.0), gain.value_at(2.0));
}

#[test]
fn release_during_attack_starts_from_reached_level() {
    let ctx = OfflineContext::new();
    let mut gain = ScheduledGain::new(ctx.create_gain(0.0).unwrap(), 0.0);
    let p = params(0.1, 0.2, 0.5, 0.3);
    apply_attack_decay(&ctx, &mut gain, 1.0, &p);

    let held = apply_release(&ctx, &mut gain, 1.05, p.release);
    assert!(close(held, 0.5), "held = {held}");
    // No jump back up to the attack peak and no drop to zero.
    assert!(close(gain.value_at(1.05), 0.5));
    assert!(close(gain.value_at(1.2), (0.5 + RELEASE_FLOOR) / 2.0));
    assert!(close(gain.value_at(1.35), RELEASE_FLOOR));
    assert!(close(gain.value_at(2.0), RELEASE_FLOOR));
    assert!(close(ctx.gain_at(gain.node, 1.2), gain.value_at(1.2)));
}

#[test]
fn release_after_decay_starts_from_sustain() {
    let ctx = OfflineContext::new();
    let mut gain = ScheduledGain::new(ctx.create_gain(0.0).unwrap(), 0.0);
    let p = params(0.01, 0.1, 0.7, 0.5);
    apply_attack_decay(&ctx, &mut gain, 0.0, &p);

    let held = apply_release(&ctx, &mut gain, 2.0, p.release);
    assert!(close(held, 0.7));
    assert!(close(gain.value_at(1.9), 0.7));
    assert!(close(gain.value_at(2.25), (0.7 + RELEASE_FLOOR) / 2.0));
    assert!(close(gain.value_at(2.5), RELEASE_FLOOR));
}

#[test]
fn zero_length_release_lands_on_floor() {
    let ctx = OfflineContext::new();
    let mut gain = ScheduledGain::new(ctx.create_gain(0.0).unwrap(), 0.0);
    apply_attack_decay(&ctx, &mut gain, 0.0, &params(0.01, 0.1, 0.7, 0.0));
    apply_release(&ctx, &mut gain, 1.0, 0.0);
    assert!(close(gain.value_at(1.0), RELEASE_FLOOR));
    assert!(close(gain.value_at(0.5), 0.7));
}

#[test]
fn cut_silences_at_the_given_instant() {
    let ctx = OfflineContext::new();
    let mut gain = ScheduledGain::new(ctx.create_gain(0.0).unwrap(), 0.0);
    apply_attack_decay(&ctx, &mut gain, 0.0, &params(0.01, 0.1, 0.7, 0.3));
    apply_cut(&ctx, &mut gain, 0.5);
    assert!(close(gain.value_at(0.4), 0.7));
    assert!(close(gain.value_at(0.5), RELEASE_FLOOR));
    assert!(close(gain.value_at(3.0), RELEASE_FLOOR));
}

#[test]
fn retrigger_restarts_attack_from_zero() {
    let ctx = OfflineContext::new();
    let mut gain = ScheduledGain::new(ctx.create_gain(0.0).unwrap(), 0.0);
    let p = params(0.1, 0.1, 0.6, 0.2);
    apply_attack_decay(&ctx, &mut gain, 0.0, &p);
    apply_attack_decay(&ctx, &mut gain, 1.0, &p);
    assert!(close(gain.value_at(0.9), 0.6));
    assert_eq!(gain.value_at(1.0), 0.0);
    assert!(close(gain.value_at(1.05), 0.5));
}

// Replays events the way a browser gain param would: plain cancels only.
fn replay(events: &[ParamEvent]) -> Automation {
    let mut a = Automation::new(0.0);
    for event in events {
        assert!(
            !matches!(event, ParamEvent::CancelAndHoldAtTime { .. }),
            "cancel-and-hold is not available in the browser"
        );
        a.apply(*event);
    }
    a
}

#[test]
fn future_release_mid_attack_keeps_the_attack_line() {
    // Slow pad-like attack, released at the end of a 120 bpm step.
    let p = params(0.8, 1.5, 0.8, 1.0);
    let off = 0.11875;
    let mut events = attack_decay_events(0.0, &p).to_vec();
    let scheduled = replay(&events);
    events.extend(release_events(&scheduled, off, p.release));
    let gain = replay(&events);

    assert!(close(gain.value_at(0.05), 0.0625), "at 0.05: {}", gain.value_at(0.05));
    assert!(close(gain.value_at(0.118), 0.1475), "at 0.118: {}", gain.value_at(0.118));
    assert!(close(gain.value_at(off), 0.1484375));
    assert!(close(
        gain.value_at(off + 0.5),
        (0.1484375 + RELEASE_FLOOR) / 2.0
    ));
    assert!(close(gain.value_at(off + 1.0), RELEASE_FLOOR));
}

#[test]
fn future_release_mid_decay_keeps_the_decay_line() {
    // Default envelope at 180 bpm: the note-off lands inside the decay.
    let p = params(0.01, 0.1, 0.7, 0.1);
    let off = 60.0 / 180.0 / 4.0 * 0.95;
    let mut events = attack_decay_events(0.0, &p).to_vec();
    let scheduled = replay(&events);
    events.extend(release_events(&scheduled, off, p.release));
    let gain = replay(&events);

    assert!(close(gain.value_at(0.01), 1.0));
    assert!(close(gain.value_at(0.07), 0.82), "at 0.07: {}", gain.value_at(0.07));
    assert!(close(gain.value_at(off), 0.7925), "at off: {}", gain.value_at(off));
    assert!(gain.value_at(off + 0.05) < 0.7925);
}

#[test]
fn offline_node_matches_mirror_for_future_release_and_cut() {
    let ctx = OfflineContext::new();
    let p = params(0.8, 1.5, 0.8, 1.0);

    let mut released = ScheduledGain::new(ctx.create_gain(0.0).unwrap(), 0.0);
    apply_attack_decay(&ctx, &mut released, 0.0, &p);
    let held = apply_release(&ctx, &mut released, 0.11875, p.release);
    assert!(close(held, 0.1484375));

    let mut cut = ScheduledGain::new(ctx.create_gain(0.0).unwrap(), 0.0);
    apply_attack_decay(&ctx, &mut cut, 0.0, &p);
    apply_cut(&ctx, &mut cut, 0.4);

    for t in [0.05, 0.1, 0.11875, 0.3, 0.39, 0.4, 0.6, 1.2] {
        assert!(
            close(ctx.gain_at(released.node, t), released.value_at(t)),
            "release diverges at {t}"
        );
        assert!(
            close(ctx.gain_at(cut.node, t), cut.value_at(t)),
            "cut diverges at {t}"
        );
    }
    assert!(close(ctx.gain_at(cut.node, 0.39), 0.4875));
    assert!(close(ctx.gain_at(cut.node, 0.4), RELEASE_FLOOR));
}
