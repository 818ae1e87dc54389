//! Step-sequenced note scheduling for the music director.
//!
//! Each voice advances over a fixed step pattern on a sixteenth-note grid
//! driven by a beat accumulator, emitting [`NoteEvent`]s the audio backend
//! renders as envelope-shaped one-shots. Tempo changes flow through the
//! accumulator, so a BPM ramp shifts the grid without restarting any voice's
//! pattern position — musical phase survives intensity transitions.

use rand::prelude::*;

/// Synthesizer voices across both instrument families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Voice {
    Pad,
    Arp,
    Percussion,
    Bass,
    Stabs,
    Lead,
}

/// A scheduled musical event for playback.
#[derive(Clone, Copy, Debug)]
pub struct NoteEvent {
    pub voice: Voice,
    pub frequency_hz: f32,
    pub velocity: f32,
    pub start_time_sec: f64,
    pub duration_sec: f32,
}

/// Natural minor, the campaign's home color.
pub const AEOLIAN: &[i32] = &[0, 2, 3, 5, 7, 8, 10, 12];
pub const MINOR_PENTATONIC: &[i32] = &[0, 3, 5, 7, 10, 12];

/// Root for the whole score (A2 keeps basses out of the mud).
pub const ROOT_MIDI: i32 = 45;

/// How a voice fills the sixteenth grid. `steps` holds scale degrees, `None`
/// is a rest. `chance` below 1.0 makes the voice generative: a step only
/// fires with that probability, re-rolled every pass.
#[derive(Clone, Copy, Debug)]
pub struct VoicePattern {
    pub voice: Voice,
    pub steps: &'static [Option<i32>],
    pub octave: i32,
    pub velocity: f32,
    /// Note length in steps.
    pub gate: f32,
    pub chance: f32,
}

const PERCUSSION_STEPS: &[Option<i32>] = &[
    Some(0), None, None, None, Some(0), None, None, Some(0),
    Some(0), None, None, None, Some(0), None, Some(0), None,
];

const BASS_STEPS: &[Option<i32>] = &[
    Some(0), None, Some(0), None, None, Some(0), None, None,
    Some(0), None, Some(3), None, None, Some(0), None, Some(5),
];

const STABS_STEPS: &[Option<i32>] = &[
    None, None, Some(7), None, None, None, Some(5), None,
    None, None, Some(7), None, None, Some(8), None, None,
];

const LEAD_STEPS: &[Option<i32>] = &[
    Some(12), None, Some(10), Some(12), None, Some(7), None, None,
    Some(12), None, Some(15), None, Some(12), None, Some(10), None,
];

const PAD_STEPS: &[Option<i32>] = &[
    Some(0), None, None, None, None, None, None, None,
    Some(7), None, None, None, None, None, None, None,
];

const ARP_STEPS: &[Option<i32>] = &[
    Some(0), Some(3), Some(7), Some(12), Some(7), Some(3), Some(0), Some(7),
    Some(3), Some(7), Some(12), Some(15), Some(12), Some(7), Some(3), Some(7),
];

/// Menu / exploration instrument family: slow pads, sparse generative arp.
pub fn ambient_patterns() -> Vec<VoicePattern> {
    vec![
        VoicePattern {
            voice: Voice::Pad,
            steps: PAD_STEPS,
            octave: 0,
            velocity: 0.5,
            gate: 8.0,
            chance: 1.0,
        },
        VoicePattern {
            voice: Voice::Arp,
            steps: ARP_STEPS,
            octave: 2,
            velocity: 0.35,
            gate: 0.9,
            chance: 0.55,
        },
    ]
}

/// Combat family: four layers; audibility is gated by per-layer gain, not by
/// the sequencer, so muted layers keep their grid position.
pub fn combat_patterns() -> Vec<VoicePattern> {
    vec![
        VoicePattern {
            voice: Voice::Percussion,
            steps: PERCUSSION_STEPS,
            octave: -1,
            velocity: 1.0,
            gate: 0.5,
            chance: 1.0,
        },
        VoicePattern {
            voice: Voice::Bass,
            steps: BASS_STEPS,
            octave: 0,
            velocity: 0.85,
            gate: 0.8,
            chance: 1.0,
        },
        VoicePattern {
            voice: Voice::Stabs,
            steps: STABS_STEPS,
            octave: 1,
            velocity: 0.7,
            gate: 0.6,
            chance: 0.9,
        },
        VoicePattern {
            voice: Voice::Lead,
            steps: LEAD_STEPS,
            octave: 2,
            velocity: 0.6,
            gate: 0.7,
            chance: 0.8,
        },
    ]
}

struct ActiveVoice {
    pattern: VoicePattern,
    step_ix: usize,
}

/// Beat-accumulator scheduler over a set of voice patterns.
pub struct LayerSequencer {
    bpm: f32,
    scale: &'static [i32],
    voices: Vec<ActiveVoice>,
    step_accum: f64,
    rng: StdRng,
}

impl LayerSequencer {
    pub fn new(patterns: Vec<VoicePattern>, bpm: f32, seed: u64) -> Self {
        Self {
            bpm,
            scale: AEOLIAN,
            voices: patterns
                .into_iter()
                .map(|pattern| ActiveVoice {
                    pattern,
                    step_ix: 0,
                })
                .collect(),
            step_accum: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Tempo change; the accumulator carries over so pattern positions hold.
    pub fn set_bpm(&mut self, bpm: f32) {
        self.bpm = bpm.max(1.0);
    }

    /// Positions of every voice on the grid, for phase-continuity checks.
    pub fn step_positions(&self) -> Vec<usize> {
        self.voices.iter().map(|v| v.step_ix).collect()
    }

    /// Advance by `dt` seconds, scheduling events slightly ahead of `now_sec`
    /// (audio-context time) so the backend has headroom.
    pub fn tick(&mut self, dt: f32, now_sec: f64, out_events: &mut Vec<NoteEvent>) {
        let seconds_per_step = 60.0 / self.bpm as f64 / 4.0; // sixteenth grid
        self.step_accum += dt as f64;
        while self.step_accum >= seconds_per_step {
            self.step_accum -= seconds_per_step;
            self.schedule_step(now_sec, seconds_per_step, out_events);
        }
    }

    fn schedule_step(&mut self, now_sec: f64, seconds_per_step: f64, out: &mut Vec<NoteEvent>) {
        for active in &mut self.voices {
            let pattern = active.pattern;
            let step = pattern.steps[active.step_ix % pattern.steps.len()];
            active.step_ix = (active.step_ix + 1) % pattern.steps.len();

            let degree = match step {
                Some(d) => d,
                None => continue,
            };
            if pattern.chance < 1.0 && self.rng.gen::<f32>() >= pattern.chance {
                continue;
            }
            // Fold the raw degree into the scale for generative voices, keep
            // literal semitone offsets for authored ones.
            let semis = if pattern.chance < 1.0 {
                *self.scale.choose(&mut self.rng).unwrap_or(&degree)
            } else {
                degree
            };
            let midi = ROOT_MIDI + semis + (pattern.octave + 1) * 12;
            let vel = (pattern.velocity * (0.85 + self.rng.gen::<f32>() * 0.3)).min(1.0);
            out.push(NoteEvent {
                voice: pattern.voice,
                frequency_hz: midi_to_hz(midi as f32),
                velocity: vel,
                start_time_sec: now_sec + 0.02,
                duration_sec: (pattern.gate as f64 * seconds_per_step) as f32,
            });
        }
    }
}

/// Convert a MIDI note number to Hertz (A4=440 Hz).
pub fn midi_to_hz(midi: f32) -> f32 {
    440.0 * (2.0_f32).powf((midi - 69.0) / 12.0)
}
