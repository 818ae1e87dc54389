// Host-side tests for the render pipeline composer over a recording backend.

mod common;

use common::RecordingRenderBackend;
use strike_core::config::EffectToggles;
use strike_core::effects::{CameraId, EffectKind};
use strike_core::pipeline::{PipelineComposer, PipelineError};

fn full_toggles() -> EffectToggles {
    EffectToggles {
        depth_of_field: true,
        motion_blur: true,
        bloom: true,
        image_process: true,
        sharpen: true,
        film_grain: true,
        chromatic_aberration: true,
        fxaa: true,
    }
}

#[test]
fn construction_without_cameras_fails_fast() {
    let backend = RecordingRenderBackend::new();
    let result = PipelineComposer::new(backend, &[]);
    assert!(matches!(result, Err(PipelineError::NoCameras)));
}

#[test]
fn rebuild_instantiates_in_fixed_chain_order() {
    let backend = RecordingRenderBackend::new();
    let mut composer = PipelineComposer::new(backend, &[CameraId(0)]).unwrap();
    composer.rebuild(&full_toggles());

    let order: Vec<EffectKind> = composer
        .backend()
        .created
        .iter()
        .map(|(k, _, _)| *k)
        .collect();
    assert_eq!(order, EffectKind::CHAIN_ORDER.to_vec());
}

#[test]
fn first_effect_owns_clear_and_msaa() {
    let backend = RecordingRenderBackend::new();
    let mut composer = PipelineComposer::new(backend, &[CameraId(0)]).unwrap();
    composer.rebuild(&full_toggles());

    let created = &composer.backend().created;
    assert!(created[0].1, "first effect must clear the target");
    assert_eq!(created[0].2, 4, "first effect carries the MSAA samples");
    for (kind, clear, samples) in &created[1..] {
        assert!(!clear, "{kind:?} must share the clear owner's output");
        assert_eq!(*samples, 1, "{kind:?} must not multisample");
    }
}

#[test]
fn msaa_falls_back_to_one_sample_when_unsupported() {
    let mut backend = RecordingRenderBackend::new();
    backend.max_samples = 1;
    let mut composer = PipelineComposer::new(backend, &[CameraId(0)]).unwrap();
    composer.rebuild(&full_toggles());
    assert_eq!(composer.backend().created[0].2, 1);
}

#[test]
fn unsupported_effects_are_skipped_without_failing_the_chain() {
    let mut backend = RecordingRenderBackend::new();
    backend.unsupported = vec![EffectKind::DepthOfField, EffectKind::MotionBlur];
    let mut composer = PipelineComposer::new(backend, &[CameraId(0)]).unwrap();
    composer.rebuild(&full_toggles());

    assert!(!composer.has_effect(EffectKind::DepthOfField));
    assert!(composer.has_effect(EffectKind::Bloom));
    // Clear ownership moves to the first effect that actually built.
    let created = &composer.backend().created;
    assert_eq!(created[0].0, EffectKind::Bloom);
    assert!(created[0].1);
}

#[test]
fn rebuild_disposes_previous_instances_first() {
    let backend = RecordingRenderBackend::new();
    let mut composer = PipelineComposer::new(backend, &[CameraId(0)]).unwrap();
    composer.rebuild(&full_toggles());
    assert_eq!(composer.backend().alive.len(), 8);

    let mut fewer = full_toggles();
    fewer.depth_of_field = false;
    fewer.sharpen = false;
    composer.rebuild(&fewer);

    assert_eq!(composer.backend().alive.len(), 6, "old instances must not leak");
    assert_eq!(composer.backend().disposed.len(), 8);
}

#[test]
fn needs_rebuild_tracks_membership_not_parameters() {
    let backend = RecordingRenderBackend::new();
    let mut composer = PipelineComposer::new(backend, &[CameraId(0)]).unwrap();
    let toggles = full_toggles();
    composer.rebuild(&toggles);
    assert!(!composer.needs_rebuild(&toggles));

    let mut changed = toggles;
    changed.fxaa = false;
    assert!(composer.needs_rebuild(&changed));
}

#[test]
fn effects_attach_to_every_tracked_camera() {
    let backend = RecordingRenderBackend::new();
    let mut composer = PipelineComposer::new(backend, &[CameraId(0), CameraId(1)]).unwrap();
    let mut toggles = EffectToggles::default();
    toggles.bloom = true;
    composer.rebuild(&toggles);

    let cams: Vec<u32> = composer.backend().attached.iter().map(|(_, c)| *c).collect();
    assert_eq!(cams, vec![0, 1]);
}

#[test]
fn add_camera_triggers_rebuild_and_reattach() {
    let backend = RecordingRenderBackend::new();
    let mut composer = PipelineComposer::new(backend, &[CameraId(0)]).unwrap();
    let mut toggles = EffectToggles::default();
    toggles.bloom = true;
    toggles.fxaa = true;
    composer.rebuild(&toggles);
    let mark = composer.backend().create_count();

    composer.add_camera(CameraId(7));
    assert_eq!(
        composer.backend().created_since(mark),
        vec![EffectKind::Bloom, EffectKind::Fxaa]
    );
    assert_eq!(composer.camera_count(), 2);

    // Adding a camera that is already tracked does nothing.
    let mark = composer.backend().create_count();
    composer.add_camera(CameraId(7));
    assert_eq!(composer.backend().created_since(mark).len(), 0);
}

#[test]
fn rebuild_listener_sees_the_active_set() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let backend = RecordingRenderBackend::new();
    let mut composer = PipelineComposer::new(backend, &[CameraId(0)]).unwrap();
    let seen: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
    let seen_in = seen.clone();
    composer.set_rebuild_listener(move |event| {
        seen_in.borrow_mut().push(event.active.len());
    });

    let mut toggles = EffectToggles::default();
    toggles.bloom = true;
    composer.rebuild(&toggles);
    toggles.fxaa = true;
    composer.rebuild(&toggles);

    assert_eq!(*seen.borrow(), vec![1, 2]);
}

#[test]
fn never_ready_effect_is_dropped_after_poll_limit() {
    let mut backend = RecordingRenderBackend::new();
    backend.never_ready = vec![EffectKind::ChromaticAberration];
    let mut composer = PipelineComposer::new(backend, &[CameraId(0)]).unwrap();
    composer.rebuild(&full_toggles());
    assert!(composer.has_effect(EffectKind::ChromaticAberration));

    for _ in 0..500 {
        composer.poll_readiness();
    }
    assert!(
        !composer.has_effect(EffectKind::ChromaticAberration),
        "an effect that never compiles must be dropped, not polled forever"
    );
    assert!(composer.has_effect(EffectKind::Bloom));
}

#[test]
fn dispose_is_idempotent() {
    let backend = RecordingRenderBackend::new();
    let mut composer = PipelineComposer::new(backend, &[CameraId(0)]).unwrap();
    composer.rebuild(&full_toggles());
    composer.dispose();
    assert!(composer.backend().alive.is_empty());
    composer.dispose();
    assert!(composer.backend().alive.is_empty());
}
