// Recording backends shared by the integration tests. They implement the
// collaborator contracts over plain maps and append-only call logs so the
// call-count and ordering properties are directly assertable.

#![allow(dead_code)]

use fnv::FnvHashMap;
use strike_core::audio::{AudioBackend, GainId, InstrumentId, InstrumentKind};
use strike_core::effects::{
    CameraId, EffectBuildError, EffectDesc, EffectId, EffectKind, EffectParams, RenderBackend,
};
use strike_core::sequence::NoteEvent;

#[derive(Default)]
pub struct RecordingRenderBackend {
    pub max_samples: u32,
    pub unsupported: Vec<EffectKind>,
    pub never_ready: Vec<EffectKind>,
    next_id: u32,
    pub alive: FnvHashMap<u32, EffectKind>,
    pub created: Vec<(EffectKind, bool, u32)>,
    pub disposed: Vec<EffectKind>,
    pub attached: Vec<(u32, u32)>,
    pub last_params: FnvHashMap<EffectKind, EffectParams>,
    pub param_pushes: u32,
}

impl RecordingRenderBackend {
    pub fn new() -> Self {
        Self {
            max_samples: 4,
            ..Self::default()
        }
    }

    pub fn create_count(&self) -> usize {
        self.created.len()
    }

    pub fn alive_kinds(&self) -> Vec<EffectKind> {
        let mut kinds: Vec<_> = self.alive.values().copied().collect();
        kinds.sort_by_key(|k| format!("{k:?}"));
        kinds
    }

    /// Creation order since the given log position.
    pub fn created_since(&self, mark: usize) -> Vec<EffectKind> {
        self.created[mark..].iter().map(|(k, _, _)| *k).collect()
    }
}

impl RenderBackend for RecordingRenderBackend {
    fn max_sample_count(&self) -> u32 {
        self.max_samples
    }

    fn create_effect(
        &mut self,
        kind: EffectKind,
        desc: &EffectDesc,
    ) -> Result<EffectId, EffectBuildError> {
        if self.unsupported.contains(&kind) {
            return Err(EffectBuildError::Unsupported(kind.name()));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.alive.insert(id, kind);
        self.created.push((kind, desc.clear_owner, desc.samples));
        Ok(EffectId(id))
    }

    fn effect_ready(&self, effect: EffectId) -> bool {
        match self.alive.get(&effect.0) {
            Some(kind) => !self.never_ready.contains(kind),
            None => false,
        }
    }

    fn apply_params(&mut self, effect: EffectId, params: &EffectParams) {
        if let Some(kind) = self.alive.get(&effect.0) {
            self.last_params.insert(*kind, *params);
            self.param_pushes += 1;
        }
    }

    fn attach_camera(&mut self, effect: EffectId, camera: CameraId) {
        self.attached.push((effect.0, camera.0));
    }

    fn dispose_effect(&mut self, effect: EffectId) {
        if let Some(kind) = self.alive.remove(&effect.0) {
            self.disposed.push(kind);
        }
    }
}

#[derive(Default)]
pub struct RecordingAudioBackend {
    pub time: f64,
    next_id: u32,
    pub gains: FnvHashMap<u32, (f32, Option<u32>)>,
    pub gain_ramps: Vec<(u32, f32, f32)>,
    pub instruments: FnvHashMap<u32, (InstrumentKind, u32)>,
    pub built: Vec<InstrumentKind>,
    pub notes: Vec<(u32, NoteEvent)>,
    pub bpm_ramps: Vec<(f32, f32)>,
    pub transport_running: bool,
    pub transport_starts: u32,
    pub disposed_gains: Vec<u32>,
    pub disposed_instruments: Vec<InstrumentKind>,
}

impl RecordingAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build_count(&self, kind: InstrumentKind) -> usize {
        self.built.iter().filter(|k| **k == kind).count()
    }

    /// Latest ramp target for a gain, falling back to its initial value.
    pub fn gain_target(&self, gain: GainId) -> Option<f32> {
        self.gain_ramps
            .iter()
            .rev()
            .find(|(id, _, _)| *id == gain.0)
            .map(|(_, target, _)| *target)
            .or_else(|| self.gains.get(&gain.0).map(|(v, _)| *v))
    }

    /// Ramp targets ever requested for gains currently parented to `parent`.
    pub fn child_gain_targets(&self, parent: GainId) -> Vec<f32> {
        self.gains
            .iter()
            .filter(|(_, (_, p))| *p == Some(parent.0))
            .filter_map(|(id, _)| self.gain_target(GainId(*id)))
            .collect()
    }

    /// Output gain of the most recently built instrument of `kind`.
    pub fn instrument_output(&self, kind: InstrumentKind) -> Option<GainId> {
        self.instruments
            .values()
            .find(|(k, _)| *k == kind)
            .map(|(_, out)| GainId(*out))
    }

    pub fn bpm_ramps_to(&self, bpm: f32) -> usize {
        self.bpm_ramps
            .iter()
            .filter(|(target, _)| (*target - bpm).abs() < 1e-3)
            .count()
    }
}

impl AudioBackend for RecordingAudioBackend {
    fn now(&self) -> f64 {
        self.time
    }

    fn create_gain(&mut self, initial: f32, parent: Option<GainId>) -> GainId {
        let id = self.next_id;
        self.next_id += 1;
        self.gains.insert(id, (initial, parent.map(|g| g.0)));
        GainId(id)
    }

    fn ramp_gain(&mut self, gain: GainId, target: f32, seconds: f32) {
        self.gain_ramps.push((gain.0, target, seconds));
        if let Some(entry) = self.gains.get_mut(&gain.0) {
            entry.0 = target;
        }
    }

    fn dispose_gain(&mut self, gain: GainId) {
        if self.gains.remove(&gain.0).is_some() {
            self.disposed_gains.push(gain.0);
        }
    }

    fn build_instrument(&mut self, kind: InstrumentKind, output: GainId) -> InstrumentId {
        let id = self.next_id;
        self.next_id += 1;
        self.instruments.insert(id, (kind, output.0));
        self.built.push(kind);
        InstrumentId(id)
    }

    fn dispose_instrument(&mut self, instrument: InstrumentId) {
        if let Some((kind, _)) = self.instruments.remove(&instrument.0) {
            self.disposed_instruments.push(kind);
        }
    }

    fn note_on(&mut self, instrument: InstrumentId, event: &NoteEvent) {
        self.notes.push((instrument.0, *event));
    }

    fn start_transport(&mut self) {
        self.transport_running = true;
        self.transport_starts += 1;
    }

    fn stop_transport(&mut self) {
        self.transport_running = false;
    }

    fn ramp_transport_bpm(&mut self, bpm: f32, seconds: f32) {
        self.bpm_ramps.push((bpm, seconds));
    }
}
