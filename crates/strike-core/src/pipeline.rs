//! Render pipeline composer: owns the active post-process chain for the
//! attached cameras and rebuilds it when chain membership changes.
//!
//! Rebuilds are coarse on purpose. Tearing everything down and re-scanning
//! the configuration in chain order is simpler than incremental diffing and
//! costs one frame hitch on a toggle, which only happens on quality or
//! settings changes.

use smallvec::SmallVec;
use thiserror::Error;

use crate::config::EffectToggles;
use crate::constants::{DESIRED_SAMPLE_COUNT, EFFECT_READY_POLL_LIMIT};
use crate::effects::{
    CameraId, EffectBuildError, EffectDesc, EffectId, EffectKind, EffectParams, RenderBackend,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Wiring bug: a pipeline with no viewpoint can never render. Fail fast
    /// rather than silently composing a no-op chain.
    #[error("no cameras attached to the post-process pipeline")]
    NoCameras,
}

/// Snapshot handed to the rebuild listener after the chain is reassembled.
#[derive(Clone, Debug)]
pub struct RebuildEvent {
    pub active: SmallVec<[EffectKind; 8]>,
    pub camera_count: usize,
}

struct ActiveEffect {
    kind: EffectKind,
    id: EffectId,
    ready: bool,
    polls: u32,
}

/// Maintains exactly one active chain across the attached camera set.
pub struct PipelineComposer<B: RenderBackend> {
    backend: B,
    cameras: SmallVec<[CameraId; 2]>,
    active: Vec<ActiveEffect>,
    current: EffectToggles,
    rebuild_listener: Option<Box<dyn FnMut(&RebuildEvent)>>,
    msaa_warned: bool,
}

impl<B: RenderBackend> PipelineComposer<B> {
    pub fn new(backend: B, cameras: &[CameraId]) -> Result<Self, PipelineError> {
        if cameras.is_empty() {
            return Err(PipelineError::NoCameras);
        }
        Ok(Self {
            backend,
            cameras: SmallVec::from_slice(cameras),
            active: Vec::new(),
            current: EffectToggles::default(),
            rebuild_listener: None,
            msaa_warned: false,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Register the single typed rebuild listener (e.g. depth-of-field's
    /// depth-texture refresh). Replaces any previous listener.
    pub fn set_rebuild_listener(&mut self, listener: impl FnMut(&RebuildEvent) + 'static) {
        self.rebuild_listener = Some(Box::new(listener));
    }

    pub fn add_camera(&mut self, camera: CameraId) {
        if self.cameras.contains(&camera) {
            return;
        }
        self.cameras.push(camera);
        let toggles = self.current;
        self.rebuild(&toggles);
    }

    pub fn remove_camera(&mut self, camera: CameraId) {
        let before = self.cameras.len();
        self.cameras.retain(|c| *c != camera);
        if self.cameras.len() != before {
            let toggles = self.current;
            self.rebuild(&toggles);
        }
    }

    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }

    /// Membership comparison; parameter-only changes never rebuild.
    pub fn needs_rebuild(&self, toggles: &EffectToggles) -> bool {
        *toggles != self.current
    }

    pub fn active_kinds(&self) -> SmallVec<[EffectKind; 8]> {
        self.active.iter().map(|e| e.kind).collect()
    }

    pub fn has_effect(&self, kind: EffectKind) -> bool {
        self.active.iter().any(|e| e.kind == kind)
    }

    /// Coarse rebuild: dispose every attached instance, then re-scan the
    /// configuration in chain order and re-instantiate the enabled set.
    pub fn rebuild(&mut self, toggles: &EffectToggles) {
        for effect in self.active.drain(..) {
            self.backend.dispose_effect(effect.id);
        }
        self.current = *toggles;

        let samples = self.negotiated_samples();
        let mut first = true;
        for kind in EffectKind::CHAIN_ORDER {
            if !toggles.enabled(kind) {
                continue;
            }
            // The first enabled effect owns the target clear and is the only
            // legal MSAA receiver; everyone after shares its output chain.
            let desc = EffectDesc {
                clear_owner: first,
                samples: if first { samples } else { 1 },
            };
            match self.backend.create_effect(kind, &desc) {
                Ok(id) => {
                    for camera in &self.cameras {
                        self.backend.attach_camera(id, *camera);
                    }
                    let ready = self.backend.effect_ready(id);
                    self.active.push(ActiveEffect {
                        kind,
                        id,
                        ready,
                        polls: 0,
                    });
                    first = false;
                }
                Err(EffectBuildError::Unsupported(name)) => {
                    log::warn!("skipping unsupported post effect '{name}'");
                }
                Err(EffectBuildError::Backend(msg)) => {
                    log::warn!("post effect '{}' failed to build: {msg}", kind.name());
                }
            }
        }

        let event = RebuildEvent {
            active: self.active.iter().map(|e| e.kind).collect(),
            camera_count: self.cameras.len(),
        };
        log::info!(
            "post chain rebuilt: {} effects over {} camera(s)",
            event.active.len(),
            event.camera_count
        );
        if let Some(listener) = self.rebuild_listener.as_mut() {
            listener(&event);
        }
    }

    fn negotiated_samples(&mut self) -> u32 {
        let max = self.backend.max_sample_count();
        if max >= DESIRED_SAMPLE_COUNT {
            DESIRED_SAMPLE_COUNT
        } else {
            if !self.msaa_warned {
                log::warn!("driver limits post-process MSAA to {max}; continuing at 1 sample");
                self.msaa_warned = true;
            }
            1
        }
    }

    /// Advance readiness polls. Effects that never compile are dropped from
    /// the chain after a bounded number of polls.
    pub fn poll_readiness(&mut self) {
        let mut dropped: SmallVec<[EffectId; 2]> = SmallVec::new();
        for effect in &mut self.active {
            if effect.ready {
                continue;
            }
            if self.backend.effect_ready(effect.id) {
                effect.ready = true;
                continue;
            }
            effect.polls += 1;
            if effect.polls > EFFECT_READY_POLL_LIMIT {
                log::warn!(
                    "post effect '{}' never became ready; dropping it",
                    effect.kind.name()
                );
                dropped.push(effect.id);
            }
        }
        if !dropped.is_empty() {
            for id in &dropped {
                self.backend.dispose_effect(*id);
            }
            self.active.retain(|e| !dropped.contains(&e.id));
        }
    }

    /// Push a parameter block into the matching effect, if present and ready.
    pub fn push_params(&mut self, params: &EffectParams) {
        let kind = params.kind();
        if let Some(effect) = self.active.iter().find(|e| e.kind == kind && e.ready) {
            self.backend.apply_params(effect.id, params);
        }
    }

    /// Tear down every owned instance. Idempotent.
    pub fn dispose(&mut self) {
        for effect in self.active.drain(..) {
            self.backend.dispose_effect(effect.id);
        }
        self.current = EffectToggles::default();
    }
}
