// Host-side tests for the music director over a recording audio backend.

mod common;

use common::RecordingAudioBackend;
use strike_core::audio::{GainId, InstrumentKind};
use strike_core::constants::{
    COMBAT_BPM_HIGH, COMBAT_BPM_LOW, EXPLORATION_STATE_GAIN, TEMPO_RAMP_SECONDS,
};
use strike_core::music::{CombatIntensity, MusicDirector, MusicState};
use strike_core::sequence::{combat_patterns, LayerSequencer};

fn make_director() -> MusicDirector<RecordingAudioBackend> {
    MusicDirector::new(RecordingAudioBackend::new())
}

/// Tick well past one crossfade + grace period.
fn settle(director: &mut MusicDirector<RecordingAudioBackend>) {
    for _ in 0..40 {
        director.tick(0.1);
    }
}

fn master_gain(director: &MusicDirector<RecordingAudioBackend>) -> GainId {
    let backend = director.backend();
    let id = backend
        .gains
        .iter()
        .find(|(_, (_, parent))| parent.is_none())
        .map(|(id, _)| *id)
        .expect("master gain must exist");
    GainId(id)
}

#[test]
fn playing_menu_twice_constructs_pad_and_arp_once() {
    let mut director = make_director();
    director.play(MusicState::Menu);
    assert_eq!(director.backend().build_count(InstrumentKind::Pad), 1);
    assert_eq!(director.backend().build_count(InstrumentKind::Arp), 1);

    director.play(MusicState::Menu);
    settle(&mut director);
    assert_eq!(
        director.backend().build_count(InstrumentKind::Pad),
        1,
        "no second construction of the pad synthesizer"
    );
    assert_eq!(director.backend().build_count(InstrumentKind::Arp), 1);
}

#[test]
fn exploration_reuses_the_menu_set_at_reduced_gain() {
    let mut director = make_director();
    director.play(MusicState::Menu);
    let built_before = director.backend().built.len();

    director.play(MusicState::Exploration);
    assert_eq!(director.state(), MusicState::Exploration);
    assert_eq!(
        director.backend().built.len(),
        built_before,
        "exploration must not duplicate menu instrument construction"
    );

    // The state gain ramped down to the exploration level.
    let pad_out = director
        .backend()
        .instrument_output(InstrumentKind::Pad)
        .unwrap();
    let family = director.backend().gains[&pad_out.0]
        .1
        .map(GainId)
        .expect("pad layer gain must nest under the state gain");
    let target = director.backend().gain_target(family).unwrap();
    assert!((target - EXPLORATION_STATE_GAIN).abs() < 1e-6);
}

#[test]
fn combat_high_ramps_tempo_and_opens_the_lead_layer_once() {
    let mut director = make_director();
    director.play(MusicState::Combat);
    assert_eq!(director.state(), MusicState::Combat);

    director.set_combat_intensity(CombatIntensity::High);
    assert_eq!(director.backend().bpm_ramps_to(COMBAT_BPM_HIGH), 1);
    assert!((director.bpm_target() - COMBAT_BPM_HIGH).abs() < 1e-6);

    let lead_out = director
        .backend()
        .instrument_output(InstrumentKind::Lead)
        .unwrap();
    let lead_gain = director.backend().gain_target(lead_out).unwrap();
    assert!(lead_gain > 0.0, "lead layer must become audible at high");

    director.set_combat_intensity(CombatIntensity::High);
    assert_eq!(
        director.backend().bpm_ramps_to(COMBAT_BPM_HIGH),
        1,
        "repeating the same tier must not issue another tempo ramp"
    );

    // The core-side tempo interpolates toward the target across ticks.
    director.tick(TEMPO_RAMP_SECONDS / 2.0);
    assert!(director.bpm() > COMBAT_BPM_LOW);
    assert!(director.bpm() < COMBAT_BPM_HIGH);
    director.tick(TEMPO_RAMP_SECONDS);
    assert!((director.bpm() - COMBAT_BPM_HIGH).abs() < 1e-3);
}

#[test]
fn returning_to_low_intensity_ramps_exactly_once() {
    let mut director = make_director();
    director.play(MusicState::Combat);
    director.set_combat_intensity(CombatIntensity::Medium);

    director.set_combat_intensity(CombatIntensity::Low);
    director.set_combat_intensity(CombatIntensity::Low);
    let low_ramps = director
        .backend()
        .bpm_ramps
        .iter()
        .filter(|(bpm, secs)| (bpm - COMBAT_BPM_LOW).abs() < 1e-3 && *secs > 0.0)
        .count();
    assert_eq!(low_ramps, 1, "exactly one tempo-ramp call, not two");
}

#[test]
fn low_tier_keeps_stabs_and_lead_silent() {
    let mut director = make_director();
    director.play(MusicState::Combat);
    let stabs = director
        .backend()
        .instrument_output(InstrumentKind::Stabs)
        .unwrap();
    let lead = director
        .backend()
        .instrument_output(InstrumentKind::Lead)
        .unwrap();
    assert_eq!(director.backend().gain_target(stabs), Some(0.0));
    assert_eq!(director.backend().gain_target(lead), Some(0.0));

    director.set_combat_intensity(CombatIntensity::Medium);
    assert!(director.backend().gain_target(stabs).unwrap() > 0.0);
    assert_eq!(director.backend().gain_target(lead), Some(0.0));
}

#[test]
fn crossfade_disposes_old_family_then_builds_new() {
    let mut director = make_director();
    director.play(MusicState::Menu);
    director.play(MusicState::Combat);
    assert!(director.in_transition());
    assert_eq!(
        director.backend().build_count(InstrumentKind::Percussion),
        0,
        "combat set must not exist until the fade-out lands"
    );

    settle(&mut director);
    assert_eq!(director.state(), MusicState::Combat);
    assert!(!director.in_transition());
    assert!(director
        .backend()
        .disposed_instruments
        .contains(&InstrumentKind::Pad));
    assert_eq!(director.backend().build_count(InstrumentKind::Percussion), 1);
    assert_eq!(director.backend().build_count(InstrumentKind::Bass), 1);
    assert_eq!(director.backend().build_count(InstrumentKind::Stabs), 1);
    assert_eq!(director.backend().build_count(InstrumentKind::Lead), 1);
}

#[test]
fn overlapping_play_requests_coalesce_last_write_wins() {
    let mut director = make_director();
    director.play(MusicState::Menu);
    director.play(MusicState::Combat);
    director.play(MusicState::Boss);
    director.play(MusicState::Exploration);

    settle(&mut director);
    assert_eq!(director.state(), MusicState::Exploration);
    assert_eq!(
        director.backend().build_count(InstrumentKind::Percussion),
        0,
        "superseded combat target must never be constructed"
    );
    assert_eq!(director.backend().bpm_ramps_to(160.0), 0);
}

#[test]
fn duck_is_idempotent_and_volume_is_restored_after_unduck() {
    let mut director = make_director();
    let master = master_gain(&director);

    director.set_volume(0.5);
    assert_eq!(director.backend().gain_target(master), Some(0.5));

    director.duck(0.4, 0.2);
    assert!((director.backend().gain_target(master).unwrap() - 0.2).abs() < 1e-6);
    let ramps = director.backend().gain_ramps.len();
    director.duck(0.4, 0.2);
    assert_eq!(director.backend().gain_ramps.len(), ramps, "double-duck guard");

    // Volume set while ducked is remembered, not applied.
    director.set_volume(1.0);
    assert!((director.backend().gain_target(master).unwrap() - 0.2).abs() < 1e-6);
    assert!((director.volume() - 1.0).abs() < 1e-6);

    director.unduck(0.2);
    assert!((director.backend().gain_target(master).unwrap() - 1.0).abs() < 1e-6);
    let ramps = director.backend().gain_ramps.len();
    director.unduck(0.2);
    assert_eq!(director.backend().gain_ramps.len(), ramps, "double-unduck guard");
}

#[test]
fn volume_is_clamped_to_unit_range() {
    let mut director = make_director();
    director.set_volume(3.0);
    assert!((director.volume() - 1.0).abs() < 1e-6);
    director.set_volume(-2.0);
    assert!((director.volume() - 0.0).abs() < 1e-6);
}

#[test]
fn victory_stinger_plays_and_self_disposes() {
    let mut director = make_director();
    director.play_victory_stinger();
    assert_eq!(director.backend().build_count(InstrumentKind::Stinger), 1);
    assert!(director.backend().notes.len() >= 4, "stinger schedules a fanfare");

    director.tick(5.0);
    assert!(director
        .backend()
        .disposed_instruments
        .contains(&InstrumentKind::Stinger));
}

#[test]
fn combat_state_emits_scheduled_notes() {
    let mut director = make_director();
    director.play(MusicState::Combat);
    for _ in 0..20 {
        director.tick(0.05);
    }
    let backend = director.backend();
    assert!(!backend.notes.is_empty(), "the sequencer must schedule events");
    for (_, event) in &backend.notes {
        assert!(event.frequency_hz > 0.0);
        assert!(event.velocity > 0.0 && event.velocity <= 1.0);
        assert!(event.duration_sec > 0.0);
    }
}

#[test]
fn dispose_stops_transport_and_releases_everything() {
    let mut director = make_director();
    director.play(MusicState::Combat);
    director.play_victory_stinger();
    director.tick(0.1);
    assert!(director.backend().transport_running);

    director.dispose();
    assert!(!director.backend().transport_running);
    assert!(director.backend().gains.is_empty(), "every gain released");
    assert!(director.backend().instruments.is_empty(), "every instrument released");

    // Every call after dispose is a no-op.
    let built = director.backend().built.len();
    director.play(MusicState::Menu);
    director.tick(0.1);
    director.dispose();
    assert_eq!(director.backend().built.len(), built);
}

#[test]
fn sequencer_keeps_pattern_phase_across_tempo_changes() {
    let mut sequencer = LayerSequencer::new(combat_patterns(), 110.0, 7);
    let mut events = Vec::new();
    // Advance a handful of sixteenth steps.
    for _ in 0..6 {
        sequencer.tick(0.14, 0.0, &mut events);
    }
    let positions = sequencer.step_positions();
    assert!(positions.iter().any(|p| *p > 0), "grid must have advanced");

    sequencer.set_bpm(150.0);
    assert_eq!(
        sequencer.step_positions(),
        positions,
        "a tempo change must not reset pattern positions"
    );

    events.clear();
    for _ in 0..6 {
        sequencer.tick(0.14, 1.0, &mut events);
    }
    assert!(!events.is_empty(), "sequencing continues after the ramp");
}
