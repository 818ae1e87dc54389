//! Procedural music director: a discrete state machine over synthesized
//! instrument families with crossfaded transitions, plus a continuous
//! combat-intensity sub-parameter blending layer gains and tempo.
//!
//! Transitions are time-driven, not awaited: `tick(dt)` advances an explicit
//! fade-out → grace → teardown → construct → fade-in phase sequence on the
//! frame loop. A `play()` arriving mid-transition is coalesced last-write-wins
//! and honored once the in-flight transition lands.

use fnv::FnvHashMap;
use smallvec::SmallVec;

use crate::audio::{AudioBackend, GainId, InstrumentId, InstrumentKind};
use crate::constants::*;
use crate::sequence::{ambient_patterns, combat_patterns, LayerSequencer, NoteEvent, Voice};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MusicState {
    Silent,
    Menu,
    Exploration,
    Combat,
    Boss,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombatIntensity {
    Low,
    Medium,
    High,
}

/// Instrument families. Menu and exploration share one set (exploration is
/// the menu set at reduced gain); combat and boss share the layered set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Family {
    Ambient,
    Combat,
}

fn family_of(state: MusicState) -> Option<Family> {
    match state {
        MusicState::Silent => None,
        MusicState::Menu | MusicState::Exploration => Some(Family::Ambient),
        MusicState::Combat | MusicState::Boss => Some(Family::Combat),
    }
}

fn state_gain(state: MusicState) -> f32 {
    match state {
        MusicState::Silent => 0.0,
        MusicState::Menu => MENU_STATE_GAIN,
        MusicState::Exploration => EXPLORATION_STATE_GAIN,
        MusicState::Combat => COMBAT_STATE_GAIN,
        MusicState::Boss => BOSS_STATE_GAIN,
    }
}

fn instrument_for(voice: Voice) -> InstrumentKind {
    match voice {
        Voice::Pad => InstrumentKind::Pad,
        Voice::Arp => InstrumentKind::Arp,
        Voice::Percussion => InstrumentKind::Percussion,
        Voice::Bass => InstrumentKind::Bass,
        Voice::Stabs => InstrumentKind::Stabs,
        Voice::Lead => InstrumentKind::Lead,
    }
}

pub fn bpm_for(intensity: CombatIntensity) -> f32 {
    match intensity {
        CombatIntensity::Low => COMBAT_BPM_LOW,
        CombatIntensity::Medium => COMBAT_BPM_MEDIUM,
        CombatIntensity::High => COMBAT_BPM_HIGH,
    }
}

/// Per-layer gain targets per intensity tier. Percussion and bass are always
/// present; stabs gate in at medium, lead at high only.
pub fn layer_mix(intensity: CombatIntensity) -> [(Voice, f32); 4] {
    match intensity {
        CombatIntensity::Low => [
            (Voice::Percussion, 0.9),
            (Voice::Bass, 0.8),
            (Voice::Stabs, 0.0),
            (Voice::Lead, 0.0),
        ],
        CombatIntensity::Medium => [
            (Voice::Percussion, 1.0),
            (Voice::Bass, 0.9),
            (Voice::Stabs, 0.7),
            (Voice::Lead, 0.0),
        ],
        CombatIntensity::High => [
            (Voice::Percussion, 1.0),
            (Voice::Bass, 1.0),
            (Voice::Stabs, 0.85),
            (Voice::Lead, 0.75),
        ],
    }
}

const SEQUENCER_SEED: u64 = 0x5EED_5046;

struct ActiveSet {
    family: Family,
    gain: GainId,
    layer_gains: FnvHashMap<Voice, GainId>,
    instruments: FnvHashMap<Voice, InstrumentId>,
    sequencer: LayerSequencer,
}

#[derive(Clone, Copy)]
enum Phase {
    Steady,
    FadeOut { to: MusicState, remaining: f32 },
    Grace { to: MusicState, remaining: f32 },
}

pub struct MusicDirector<A: AudioBackend> {
    backend: A,
    master: GainId,
    current: MusicState,
    phase: Phase,
    pending: Option<MusicState>,
    active: Option<ActiveSet>,

    intensity: CombatIntensity,
    bpm_current: f32,
    bpm_target: f32,
    bpm_ramp_remaining: f32,

    volume: f32,
    ducked: bool,
    transport_started: bool,
    stingers: SmallVec<[(InstrumentId, f32); 2]>,
    disposed: bool,
}

impl<A: AudioBackend> MusicDirector<A> {
    pub fn new(mut backend: A) -> Self {
        let master = backend.create_gain(DEFAULT_MASTER_VOLUME, None);
        Self {
            backend,
            master,
            current: MusicState::Silent,
            phase: Phase::Steady,
            pending: None,
            active: None,
            intensity: CombatIntensity::Low,
            bpm_current: MENU_BPM,
            bpm_target: MENU_BPM,
            bpm_ramp_remaining: 0.0,
            volume: DEFAULT_MASTER_VOLUME,
            ducked: false,
            transport_started: false,
            stingers: SmallVec::new(),
            disposed: false,
        }
    }

    pub fn state(&self) -> MusicState {
        self.current
    }

    pub fn intensity(&self) -> CombatIntensity {
        self.intensity
    }

    pub fn bpm(&self) -> f32 {
        self.bpm_current
    }

    pub fn bpm_target(&self) -> f32 {
        self.bpm_target
    }

    pub fn in_transition(&self) -> bool {
        !matches!(self.phase, Phase::Steady)
    }

    /// Request a music state. No-op when already there. Within a family the
    /// switch is a gain ramp only — exploration reuses the menu instruments
    /// rather than duplicating construction. Across families the old set
    /// fades out, rests a grace period, is disposed, and the new set is built
    /// and faded in. Requests arriving mid-transition coalesce to the most
    /// recent one.
    pub fn play(&mut self, state: MusicState) {
        if self.disposed {
            return;
        }
        if !matches!(self.phase, Phase::Steady) {
            self.pending = Some(state);
            return;
        }
        if state == self.current {
            return;
        }

        let same_family = family_of(state).is_some()
            && family_of(state) == family_of(self.current)
            && self.active.is_some();
        if same_family {
            self.current = state;
            if let Some(set) = &self.active {
                self.backend
                    .ramp_gain(set.gain, state_gain(state), CROSSFADE_SECONDS);
            }
            if state == MusicState::Boss {
                self.ramp_tempo(BOSS_BPM, TEMPO_RAMP_SECONDS);
                self.apply_layer_mix(CombatIntensity::High, LAYER_RAMP_SECONDS);
            } else if state == MusicState::Combat {
                self.ramp_tempo(bpm_for(self.intensity), TEMPO_RAMP_SECONDS);
                self.apply_layer_mix(self.intensity, LAYER_RAMP_SECONDS);
            }
            return;
        }

        match &self.active {
            Some(set) => {
                self.backend.ramp_gain(set.gain, 0.0, CROSSFADE_SECONDS);
                self.phase = Phase::FadeOut {
                    to: state,
                    remaining: CROSSFADE_SECONDS,
                };
            }
            None => {
                // Coming from silence there is nothing to fade out.
                self.current = state;
                if family_of(state).is_some() {
                    self.construct_state(state);
                }
            }
        }
    }

    /// Blend combat layers and tempo toward the tier targets. No-op when the
    /// tier is unchanged; loops are never retriggered, only their gain and
    /// the transport tempo are modulated, preserving musical phase.
    ///
    /// Outside the combat family the tier is stored but the tempo is left
    /// untouched (tempo ramps during non-combat states are undefined); it
    /// applies when the combat set is next constructed.
    pub fn set_combat_intensity(&mut self, intensity: CombatIntensity) {
        if self.disposed {
            return;
        }
        if intensity == self.intensity {
            return;
        }
        self.intensity = intensity;

        let in_combat_set = self
            .active
            .as_ref()
            .map(|s| s.family == Family::Combat)
            .unwrap_or(false);
        // Boss keeps its own tempo and full mix regardless of the tier.
        if in_combat_set && self.current == MusicState::Combat {
            self.apply_layer_mix(intensity, LAYER_RAMP_SECONDS);
            self.ramp_tempo(bpm_for(intensity), TEMPO_RAMP_SECONDS);
        }
    }

    /// Multiply the master gain down for dialogue or cutscenes. Guarded
    /// against double-duck; volume changes while ducked are remembered and
    /// restored by `unduck`.
    pub fn duck(&mut self, amount: f32, duration_sec: f32) {
        if self.disposed || self.ducked {
            return;
        }
        self.ducked = true;
        self.backend.ramp_gain(
            self.master,
            self.volume * amount.clamp(0.0, 1.0),
            duration_sec.max(0.0),
        );
    }

    pub fn unduck(&mut self, duration_sec: f32) {
        if self.disposed || !self.ducked {
            return;
        }
        self.ducked = false;
        self.backend
            .ramp_gain(self.master, self.volume, duration_sec.max(0.0));
    }

    /// Master volume 0..1. While ducked the value is only remembered; ducking
    /// stays relative to the last explicit volume.
    pub fn set_volume(&mut self, volume: f32) {
        if self.disposed {
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        if !self.ducked {
            self.backend
                .ramp_gain(self.master, self.volume, SET_VOLUME_RAMP_SECONDS);
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Fire-and-forget victory fanfare, independent of the state machine;
    /// self-disposes after a fixed lifetime.
    pub fn play_victory_stinger(&mut self) {
        if self.disposed {
            return;
        }
        let id = self
            .backend
            .build_instrument(InstrumentKind::Stinger, self.master);
        let now = self.backend.now();
        // Short rising arpeggio on the minor-pentatonic home chord.
        for (i, semis) in [0, 7, 12, 19].iter().enumerate() {
            let midi = (crate::sequence::ROOT_MIDI + 24 + semis) as f32;
            self.backend.note_on(
                id,
                &NoteEvent {
                    voice: Voice::Lead,
                    frequency_hz: crate::sequence::midi_to_hz(midi),
                    velocity: 0.9,
                    start_time_sec: now + 0.02 + i as f64 * 0.11,
                    duration_sec: if i == 3 { 1.2 } else { 0.18 },
                },
            );
        }
        self.stingers.push((id, STINGER_LIFETIME_SECONDS));
    }

    /// Advance transitions, tempo ramps, sequencing, and stinger expiry.
    /// Called once per frame by the owner of the frame loop.
    pub fn tick(&mut self, dt: f32) {
        if self.disposed {
            return;
        }

        match self.phase {
            Phase::Steady => {}
            Phase::FadeOut { to, remaining } => {
                let remaining = remaining - dt;
                self.phase = if remaining <= 0.0 {
                    Phase::Grace {
                        to,
                        remaining: DISPOSE_GRACE_SECONDS,
                    }
                } else {
                    Phase::FadeOut { to, remaining }
                };
            }
            Phase::Grace { to, remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.dispose_active();
                    // Requests that arrived mid-transition coalesce here: the
                    // most recent one wins, superseded targets are never built.
                    let target = self.pending.take().unwrap_or(to);
                    self.current = target;
                    self.phase = Phase::Steady;
                    if family_of(target).is_some() {
                        self.construct_state(target);
                    }
                } else {
                    self.phase = Phase::Grace { to, remaining };
                }
            }
        }

        if self.bpm_ramp_remaining > 0.0 {
            let step = (self.bpm_target - self.bpm_current) * (dt / self.bpm_ramp_remaining);
            self.bpm_current += step;
            self.bpm_ramp_remaining -= dt;
            if self.bpm_ramp_remaining <= 0.0 {
                self.bpm_current = self.bpm_target;
                self.bpm_ramp_remaining = 0.0;
            }
            if let Some(set) = self.active.as_mut() {
                set.sequencer.set_bpm(self.bpm_current);
            }
        }

        // Keep sequencing through fade-out; the gain ramp handles audibility.
        let now = self.backend.now();
        let mut events: Vec<NoteEvent> = Vec::new();
        if let Some(set) = self.active.as_mut() {
            set.sequencer.tick(dt, now, &mut events);
            for ev in &events {
                if let Some(instrument) = set.instruments.get(&ev.voice) {
                    self.backend.note_on(*instrument, ev);
                }
            }
        }

        let mut expired: SmallVec<[InstrumentId; 2]> = SmallVec::new();
        for (id, remaining) in self.stingers.iter_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                expired.push(*id);
            }
        }
        if !expired.is_empty() {
            for id in &expired {
                self.backend.dispose_instrument(*id);
            }
            self.stingers.retain(|(id, _)| !expired.contains(id));
        }
    }

    /// Stop the transport and dispose every instrument, loop, and gain across
    /// both families regardless of which was active. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.dispose_active();
        for (id, _) in self.stingers.drain(..) {
            self.backend.dispose_instrument(id);
        }
        if self.transport_started {
            self.backend.stop_transport();
        }
        self.backend.dispose_gain(self.master);
        self.disposed = true;
    }

    pub fn backend(&self) -> &A {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut A {
        &mut self.backend
    }

    // ---- internals ---------------------------------------------------------

    fn ramp_tempo(&mut self, bpm: f32, seconds: f32) {
        self.bpm_target = bpm;
        self.bpm_ramp_remaining = seconds.max(0.0);
        if seconds <= 0.0 {
            self.bpm_current = bpm;
            if let Some(set) = self.active.as_mut() {
                set.sequencer.set_bpm(bpm);
            }
        }
        self.backend.ramp_transport_bpm(bpm, seconds.max(0.0));
    }

    fn apply_layer_mix(&mut self, intensity: CombatIntensity, ramp_seconds: f32) {
        let Some(set) = self.active.as_ref() else {
            return;
        };
        if set.family != Family::Combat {
            return;
        }
        for (voice, target) in layer_mix(intensity) {
            if let Some(gain) = set.layer_gains.get(&voice) {
                self.backend.ramp_gain(*gain, target, ramp_seconds);
            }
        }
    }

    fn construct_state(&mut self, state: MusicState) {
        let family = match family_of(state) {
            Some(f) => f,
            None => return,
        };
        if !self.transport_started {
            self.backend.start_transport();
            self.transport_started = true;
        }

        let gain = self.backend.create_gain(0.0, Some(self.master));
        let (patterns, bpm) = match family {
            Family::Ambient => (ambient_patterns(), MENU_BPM),
            Family::Combat => {
                let bpm = if state == MusicState::Boss {
                    BOSS_BPM
                } else {
                    bpm_for(self.intensity)
                };
                (combat_patterns(), bpm)
            }
        };

        let mut layer_gains = FnvHashMap::default();
        let mut instruments = FnvHashMap::default();
        let mix: SmallVec<[(Voice, f32); 4]> = match family {
            Family::Ambient => {
                SmallVec::from_slice(&[(Voice::Pad, 1.0), (Voice::Arp, 1.0)])
            }
            Family::Combat => {
                let tier = if state == MusicState::Boss {
                    CombatIntensity::High
                } else {
                    self.intensity
                };
                SmallVec::from_slice(&layer_mix(tier))
            }
        };
        for (voice, level) in mix {
            let layer_gain = self.backend.create_gain(level, Some(gain));
            let instrument = self.backend.build_instrument(instrument_for(voice), layer_gain);
            layer_gains.insert(voice, layer_gain);
            instruments.insert(voice, instrument);
        }

        self.bpm_current = bpm;
        self.bpm_target = bpm;
        self.bpm_ramp_remaining = 0.0;
        self.backend.ramp_transport_bpm(bpm, 0.0);

        self.backend
            .ramp_gain(gain, state_gain(state), CROSSFADE_SECONDS);

        self.active = Some(ActiveSet {
            family,
            gain,
            layer_gains,
            instruments,
            sequencer: LayerSequencer::new(patterns, bpm, SEQUENCER_SEED),
        });
        log::info!("music: constructed {:?} set for {:?}", family, state);
    }

    fn dispose_active(&mut self) {
        if let Some(set) = self.active.take() {
            for (_, instrument) in set.instruments {
                self.backend.dispose_instrument(instrument);
            }
            for (_, gain) in set.layer_gains {
                self.backend.dispose_gain(gain);
            }
            self.backend.dispose_gain(set.gain);
        }
    }
}
