//! Audio-backend collaborator contract consumed by the music director.
//!
//! The backend owns the real audio graph (WebAudio in `strike-web`); the
//! director only holds opaque handles. Gains form a tree: a gain created with
//! no parent feeds the backend's output bus, otherwise it feeds its parent,
//! so ramping a state gain attenuates every layer nested under it.

use crate::sequence::NoteEvent;

/// Opaque handle to a backend gain node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GainId(pub u32);

/// Opaque handle to a backend synthesizer / loop instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstrumentId(pub u32);

/// Synthesizer archetypes the backend knows how to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    Pad,
    Arp,
    Percussion,
    Bass,
    Stabs,
    Lead,
    Stinger,
}

pub trait AudioBackend {
    /// Current audio-context time in seconds.
    fn now(&self) -> f64;

    /// Create a gain node routed into `parent`, or into the backend's output
    /// bus when `parent` is `None`.
    fn create_gain(&mut self, initial: f32, parent: Option<GainId>) -> GainId;

    /// Linear ramp of a gain toward `target` over `seconds`. A zero duration
    /// sets the value immediately.
    fn ramp_gain(&mut self, gain: GainId, target: f32, seconds: f32);

    fn dispose_gain(&mut self, gain: GainId);

    /// Build a synthesizer routed into `output`.
    fn build_instrument(&mut self, kind: InstrumentKind, output: GainId) -> InstrumentId;

    fn dispose_instrument(&mut self, instrument: InstrumentId);

    /// Render one scheduled note on an instrument.
    fn note_on(&mut self, instrument: InstrumentId, event: &NoteEvent);

    fn start_transport(&mut self);

    fn stop_transport(&mut self);

    /// Ramp the transport tempo toward `bpm` over `seconds`.
    fn ramp_transport_bpm(&mut self, bpm: f32, seconds: f32);
}
