//! Post-process state manager: the single owning facade over the pipeline
//! composer plus all per-frame adaptive logic. Gameplay code talks to this
//! and nothing else.
//!
//! There is deliberately no finite-state machine here. Gameplay signals are
//! not mutually exclusive (a player can be sprinting, taking damage, and in
//! combat at once), so every flag and timed modifier independently gates a
//! numeric contribution and the composed result is recomputed every tick.

use glam::Vec3;

use crate::config::{
    bloom_weight, film_grain_amount, EffectToggles, PipelineConfig, QualityTier, SettingsPatch,
};
use crate::constants::*;
use crate::effects::{
    BloomParams, CameraId, ChromaticAberrationParams, DepthOfFieldParams, EffectParams,
    FilmGrainParams, ImageProcessParams, MotionBlurParams, RenderBackend, SharpenParams,
};
use crate::grade::{GradeState, LevelType};
use crate::modifier::{
    ConfirmPulse, DecayingBoost, DecayingFlash, KillStreakBoost, LowHealthPulse, TimedBoost,
};
use crate::pipeline::{PipelineComposer, PipelineError, RebuildEvent};

pub struct PostFxManager<B: RenderBackend> {
    pipeline: PipelineComposer<B>,
    config: PipelineConfig,
    grade: GradeState,

    damage_flash: DecayingFlash,
    explosion: DecayingBoost,
    hit_confirm: ConfirmPulse,
    low_health: LowHealthPulse,
    kill_streak: KillStreakBoost,
    weapon_shake: Option<TimedBoost>,
    fov_punch: Option<TimedBoost>,
    low_health_desat: f32,

    in_combat: bool,
    sliding: bool,
    sprinting: bool,
    aiming: bool,

    dof: DepthOfFieldParams,

    rebuild_pending: bool,
    disposed: bool,
}

impl<B: RenderBackend> PostFxManager<B> {
    /// Construct the manager and compose the initial chain. An empty camera
    /// set is a wiring bug and fails fast.
    pub fn new(
        backend: B,
        cameras: &[CameraId],
        quality: QualityTier,
        initial: &SettingsPatch,
    ) -> Result<Self, PipelineError> {
        let config = PipelineConfig::new(quality, initial);
        let mut pipeline = PipelineComposer::new(backend, cameras)?;
        pipeline.rebuild(&config.resolved());
        Ok(Self {
            pipeline,
            config,
            grade: GradeState::default(),
            damage_flash: DecayingFlash::default(),
            explosion: DecayingBoost::default(),
            hit_confirm: ConfirmPulse::default(),
            low_health: LowHealthPulse::default(),
            kill_streak: KillStreakBoost::default(),
            weapon_shake: None,
            fov_punch: None,
            low_health_desat: 0.0,
            in_combat: false,
            sliding: false,
            sprinting: false,
            aiming: false,
            dof: DepthOfFieldParams::default(),
            rebuild_pending: false,
            disposed: false,
        })
    }

    // ---- configuration ----------------------------------------------------

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Resolved chain membership as of the current configuration.
    pub fn toggles(&self) -> EffectToggles {
        self.config.resolved()
    }

    /// Apply a quality preset. Idempotent for an unchanged tier; a membership
    /// change defers the chain rebuild to the next tick boundary.
    pub fn set_quality(&mut self, quality: QualityTier) {
        if self.disposed {
            return;
        }
        if self.config.set_quality(quality) {
            self.rebuild_pending = true;
        }
    }

    /// Tag-string variant for settings files. Unknown tags are ignored with a
    /// warning, keeping the previous tier.
    pub fn set_quality_tag(&mut self, tag: &str) {
        match QualityTier::parse(tag) {
            Some(tier) => self.set_quality(tier),
            None => log::warn!("ignoring unknown quality tier '{tag}'"),
        }
    }

    /// One-way merge of external user preferences. `post_processing_enabled:
    /// false` is the master kill switch and forces every effect off.
    pub fn sync_with_settings(&mut self, patch: &SettingsPatch) {
        if self.disposed {
            return;
        }
        if self.config.apply_settings(patch) {
            self.rebuild_pending = true;
        }
    }

    // ---- level grading ----------------------------------------------------

    pub fn set_level_type(&mut self, level: LevelType) {
        if self.disposed {
            return;
        }
        self.grade.set(level);
    }

    pub fn set_level_type_tag(&mut self, tag: &str) {
        match LevelType::parse(tag) {
            Some(level) => self.set_level_type(level),
            None => log::warn!("ignoring unknown level type '{tag}'"),
        }
    }

    pub fn transition_to_level_type(&mut self, level: LevelType, duration_ms: f32) {
        if self.disposed {
            return;
        }
        self.grade.transition_to(level, duration_ms.max(0.0) / 1000.0);
    }

    // ---- gameplay signals -------------------------------------------------

    /// Decaying vignette/contrast flash. Re-triggering before the decay
    /// completes takes the max of current and new intensity.
    pub fn trigger_damage_flash(&mut self, intensity: f32) {
        if self.disposed {
            return;
        }
        let decay = if self.config.reduced_flashing() {
            DAMAGE_FLASH_REDUCED_SECONDS
        } else {
            DAMAGE_FLASH_SECONDS
        };
        self.damage_flash.trigger(intensity, decay);
    }

    /// Health as a 0..1 fraction of maximum. Below the threshold a sinusoidal
    /// vignette pulse activates, independent of the damage flash.
    pub fn set_player_health(&mut self, health: f32) {
        if self.disposed {
            return;
        }
        let health = health.clamp(0.0, 1.0);
        self.low_health.set_active(health < LOW_HEALTH_THRESHOLD);
    }

    /// Streak count maps to a capped, monotone bloom/contrast boost; zero
    /// resets to baseline.
    pub fn update_kill_streak(&mut self, count: u32) {
        if self.disposed {
            return;
        }
        self.kill_streak.set_streak(count);
    }

    pub fn set_combat_state(&mut self, in_combat: bool) {
        if self.disposed {
            return;
        }
        self.in_combat = in_combat;
    }

    pub fn set_sliding(&mut self, sliding: bool) {
        if self.disposed {
            return;
        }
        self.sliding = sliding;
    }

    pub fn set_sprinting(&mut self, sprinting: bool) {
        if self.disposed {
            return;
        }
        self.sprinting = sprinting;
    }

    pub fn set_aiming(&mut self, aiming: bool) {
        if self.disposed {
            return;
        }
        self.aiming = aiming;
    }

    /// Extra desaturation while badly hurt, 0..1, clamped.
    pub fn set_low_health_desaturation(&mut self, amount: f32) {
        if self.disposed {
            return;
        }
        self.low_health_desat = amount.clamp(0.0, 1.0);
    }

    pub fn trigger_explosion_bloom(&mut self, peak: f32, decay_seconds: f32) {
        if self.disposed {
            return;
        }
        self.explosion.trigger(peak, decay_seconds);
    }

    pub fn trigger_hit_confirmation(&mut self) {
        if self.disposed {
            return;
        }
        self.hit_confirm.trigger();
    }

    pub fn trigger_weapon_shake(&mut self, amount: f32, duration_ms: f32) {
        if self.disposed {
            return;
        }
        self.weapon_shake = Some(TimedBoost::new(
            amount.clamp(0.0, 1.0),
            duration_ms.max(0.0) / 1000.0,
        ));
    }

    pub fn trigger_fov_punch(&mut self, amount: f32, duration_ms: f32) {
        if self.disposed {
            return;
        }
        self.fov_punch = Some(TimedBoost::new(amount, duration_ms.max(0.0) / 1000.0));
    }

    pub fn enable_depth_of_field(
        &mut self,
        focus_distance: f32,
        focal_length: Option<f32>,
        f_stop: Option<f32>,
    ) {
        if self.disposed {
            return;
        }
        let defaults = DepthOfFieldParams::default();
        self.dof = DepthOfFieldParams {
            focus_distance: focus_distance.max(0.0),
            focal_length: focal_length.unwrap_or(defaults.focal_length),
            f_stop: f_stop.unwrap_or(defaults.f_stop),
        };
        if self.config.set_depth_of_field_requested(true) {
            self.rebuild_pending = true;
        }
    }

    pub fn disable_depth_of_field(&mut self) {
        if self.disposed {
            return;
        }
        if self.config.set_depth_of_field_requested(false) {
            self.rebuild_pending = true;
        }
    }

    // ---- cameras / observers ----------------------------------------------

    pub fn add_camera(&mut self, camera: CameraId) {
        if self.disposed {
            return;
        }
        self.pipeline.add_camera(camera);
    }

    pub fn remove_camera(&mut self, camera: CameraId) {
        if self.disposed {
            return;
        }
        self.pipeline.remove_camera(camera);
    }

    pub fn set_rebuild_listener(&mut self, listener: impl FnMut(&RebuildEvent) + 'static) {
        self.pipeline.set_rebuild_listener(listener);
    }

    // ---- per-frame outputs for the game glue -------------------------------

    /// Motion blur is gated on sprinting and suppressed by aiming even while
    /// the sprint flag stays true.
    pub fn motion_blur_active(&self) -> bool {
        self.toggles().motion_blur && self.sprinting && !self.aiming
    }

    /// Instantaneous FOV delta the camera glue applies this frame.
    pub fn fov_offset(&self) -> f32 {
        self.fov_punch.map(|p| p.amount).unwrap_or(0.0)
    }

    /// Instantaneous weapon-shake amount for the view-model glue.
    pub fn shake_amount(&self) -> f32 {
        self.weapon_shake.map(|s| s.amount).unwrap_or(0.0)
    }

    pub fn damage_flash_magnitude(&self) -> f32 {
        self.damage_flash.magnitude()
    }

    pub fn low_health_pulse_active(&self) -> bool {
        self.low_health.active()
    }

    pub fn disposed(&self) -> bool {
        self.disposed
    }

    // ---- the tick ----------------------------------------------------------

    /// The single per-frame entry point. Sub-step order is load-bearing:
    /// deferred rebuild, modifier expiry/advance, pulse phase, grade
    /// interpolation, then the final parameter push — later steps read what
    /// earlier steps wrote within the same tick.
    pub fn update(&mut self, dt: f32) {
        if self.disposed {
            return;
        }
        if self.rebuild_pending {
            self.pipeline.rebuild(&self.config.resolved());
            self.rebuild_pending = false;
        }
        self.pipeline.poll_readiness();

        self.damage_flash.advance(dt);
        self.explosion.advance(dt);
        self.hit_confirm.advance(dt);
        if let Some(shake) = self.weapon_shake.as_mut() {
            if !shake.advance(dt) {
                self.weapon_shake = None;
            }
        }
        if let Some(punch) = self.fov_punch.as_mut() {
            if !punch.advance(dt) {
                self.fov_punch = None;
            }
        }
        self.low_health.advance(dt);
        self.grade.tick(dt);

        self.push_composed();
    }

    /// Compose base + modifiers per effect and write into the live instances.
    fn push_composed(&mut self) {
        let toggles = self.config.resolved();
        let flash = self.damage_flash.magnitude();
        let hit = self.hit_confirm.value();
        let shake = self.weapon_shake.map(|s| s.amount).unwrap_or(0.0);
        let grade = self.grade.value();

        if toggles.bloom {
            let weight = (bloom_weight(self.config.bloom_intensity())
                + self.kill_streak.bloom_boost()
                + self.explosion.magnitude())
            .clamp(0.0, BLOOM_WEIGHT_MAX);
            self.pipeline.push_params(&EffectParams::Bloom(BloomParams {
                weight,
                ..BloomParams::default()
            }));
        }

        if toggles.image_process {
            let grading_on = self.config.color_grading_enabled();
            let base = ImageProcessParams::default();
            let graded = if grading_on { grade } else { Default::default() };
            let contrast =
                graded.contrast + flash * DAMAGE_FLASH_CONTRAST + self.kill_streak.contrast_boost();
            let exposure = graded.exposure + hit * HIT_CONFIRM_EXPOSURE;
            let combat_desat = if self.in_combat { COMBAT_DESATURATION } else { 0.0 };
            let saturation =
                (graded.saturation - combat_desat - self.low_health_desat * 0.5).max(0.0);
            let vignette_weight = if self.config.vignette_enabled() {
                (base.vignette_weight
                    + flash * DAMAGE_FLASH_VIGNETTE
                    + self.low_health.value() * LOW_HEALTH_PULSE_VIGNETTE)
                    .clamp(0.0, VIGNETTE_WEIGHT_MAX)
            } else {
                0.0
            };
            self.pipeline
                .push_params(&EffectParams::ImageProcess(ImageProcessParams {
                    contrast,
                    exposure,
                    saturation,
                    tint: graded.tint,
                    vignette_weight,
                    vignette_stretch: base.vignette_stretch,
                    // Flash pushes the vignette toward red.
                    vignette_color: Vec3::ZERO.lerp(Vec3::new(0.6, 0.0, 0.0), flash),
                }));
        }

        if toggles.sharpen {
            let base = SharpenParams::default();
            self.pipeline.push_params(&EffectParams::Sharpen(SharpenParams {
                edge_amount: base.edge_amount + hit * HIT_CONFIRM_SHARPEN,
                color_amount: base.color_amount,
            }));
        }

        if toggles.film_grain {
            let intensity = film_grain_amount(self.config.film_grain_intensity())
                .clamp(0.0, GRAIN_INTENSITY_MAX);
            self.pipeline
                .push_params(&EffectParams::FilmGrain(FilmGrainParams {
                    intensity,
                    animated: true,
                }));
        }

        if toggles.chromatic_aberration {
            let base = ChromaticAberrationParams::default();
            let slide = if self.sliding { SLIDE_CHROMATIC_BOOST } else { 0.0 };
            let amount = (base.amount + slide + shake * WEAPON_SHAKE_CHROMATIC)
                .clamp(0.0, CHROMATIC_AMOUNT_MAX);
            self.pipeline
                .push_params(&EffectParams::ChromaticAberration(
                    ChromaticAberrationParams {
                        amount,
                        radial_intensity: base.radial_intensity,
                    },
                ));
        }

        if toggles.motion_blur {
            let strength = if self.sprinting && !self.aiming {
                SPRINT_MOTION_BLUR_STRENGTH
            } else {
                0.0
            };
            self.pipeline
                .push_params(&EffectParams::MotionBlur(MotionBlurParams { strength }));
        }

        if toggles.depth_of_field {
            self.pipeline
                .push_params(&EffectParams::DepthOfField(self.dof));
        }
    }

    /// Tear down the owned chain and release GPU resources. Idempotent; every
    /// later call on the manager is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.pipeline.dispose();
        self.disposed = true;
    }

    pub fn backend(&self) -> &B {
        self.pipeline.backend()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        self.pipeline.backend_mut()
    }
}
