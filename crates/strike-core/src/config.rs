//! Declarative pipeline configuration: quality tiers, per-effect toggles, and
//! the one-way merge from external game settings.
//!
//! The resolved toggle set is the single source of truth for which effects are
//! members of the post-process chain. Explicit per-effect overrides are stored
//! separately from tier-derived values so that re-applying a quality preset
//! never forgets a choice the player (or a level script) made.

use crate::effects::EffectKind;

/// Rendering quality preset. Gates which optional effects may enable at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QualityTier {
    Low,
    Medium,
    High,
    Ultra,
}

impl QualityTier {
    /// Parse a settings-file tag. Unknown tags are a configuration error and
    /// yield `None`; callers log and keep the previous tier.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "ultra" => Some(Self::Ultra),
            _ => None,
        }
    }
}

/// Tier-gated optional effects: which ones the preset turns on, and (the same
/// set) which ones the tier permits at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QualityPreset {
    pub film_grain: bool,
    pub chromatic_aberration: bool,
    pub bloom: bool,
    pub motion_blur: bool,
    pub depth_of_field: bool,
}

/// Preset table. Low disables every optional effect; each step up adds to the
/// previous tier, with Ultra enabling everything.
pub const fn preset_for(tier: QualityTier) -> QualityPreset {
    match tier {
        QualityTier::Low => QualityPreset {
            film_grain: false,
            chromatic_aberration: false,
            bloom: false,
            motion_blur: false,
            depth_of_field: false,
        },
        QualityTier::Medium => QualityPreset {
            film_grain: true,
            chromatic_aberration: true,
            bloom: true,
            motion_blur: false,
            depth_of_field: false,
        },
        QualityTier::High => QualityPreset {
            film_grain: true,
            chromatic_aberration: true,
            bloom: true,
            motion_blur: true,
            depth_of_field: false,
        },
        QualityTier::Ultra => QualityPreset {
            film_grain: true,
            chromatic_aberration: true,
            bloom: true,
            motion_blur: true,
            depth_of_field: true,
        },
    }
}

/// Fully resolved membership set for the post-process chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EffectToggles {
    pub depth_of_field: bool,
    pub motion_blur: bool,
    pub bloom: bool,
    pub image_process: bool,
    pub sharpen: bool,
    pub film_grain: bool,
    pub chromatic_aberration: bool,
    pub fxaa: bool,
}

impl EffectToggles {
    pub fn enabled(&self, kind: EffectKind) -> bool {
        match kind {
            EffectKind::DepthOfField => self.depth_of_field,
            EffectKind::MotionBlur => self.motion_blur,
            EffectKind::Bloom => self.bloom,
            EffectKind::ImageProcess => self.image_process,
            EffectKind::Sharpen => self.sharpen,
            EffectKind::FilmGrain => self.film_grain,
            EffectKind::ChromaticAberration => self.chromatic_aberration,
            EffectKind::Fxaa => self.fxaa,
        }
    }

    pub fn any(&self) -> bool {
        EffectKind::CHAIN_ORDER.iter().any(|k| self.enabled(*k))
    }
}

/// Explicit per-effect overrides layered on top of the tier preset. `None`
/// means "no opinion, follow the preset".
#[derive(Clone, Copy, Debug, Default)]
pub struct ToggleOverrides {
    pub bloom: Option<bool>,
    pub vignette: Option<bool>,
    pub chromatic_aberration: Option<bool>,
    pub film_grain: Option<bool>,
    pub fxaa: Option<bool>,
    pub motion_blur: Option<bool>,
    pub depth_of_field: Option<bool>,
    pub sharpen: Option<bool>,
    pub color_grading: Option<bool>,
}

/// One-way merge target for the external user-preferences object. Keys absent
/// from the patch leave the live configuration unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct SettingsPatch {
    pub post_processing_enabled: Option<bool>,
    pub bloom_enabled: Option<bool>,
    pub bloom_intensity: Option<f32>,
    pub chromatic_aberration_enabled: Option<bool>,
    pub vignette_enabled: Option<bool>,
    pub film_grain_enabled: Option<bool>,
    pub film_grain_intensity: Option<f32>,
    pub motion_blur: Option<bool>,
    pub color_grading_enabled: Option<bool>,
    pub reduced_flashing: Option<bool>,
}

/// Bloom weight from the 0..1 user intensity setting.
#[inline]
pub fn bloom_weight(intensity: f32) -> f32 {
    0.1 + intensity.clamp(0.0, 1.0) * 0.5
}

/// Film-grain amount from the 0..1 user intensity setting.
#[inline]
pub fn film_grain_amount(intensity: f32) -> f32 {
    0.05 + intensity.clamp(0.0, 1.0) * 0.25
}

/// The declarative source of truth for chain membership and user intensity
/// settings. Mutated by `set_quality`, the effect setters, and
/// `apply_settings`; read via `resolved()`.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    quality: QualityTier,
    post_processing_enabled: bool,
    reduced_flashing: bool,
    overrides: ToggleOverrides,
    bloom_intensity: f32,
    film_grain_intensity: f32,
    depth_of_field_requested: bool,
}

impl PipelineConfig {
    pub fn new(quality: QualityTier, initial: &SettingsPatch) -> Self {
        let mut cfg = Self {
            quality,
            post_processing_enabled: true,
            reduced_flashing: false,
            overrides: ToggleOverrides::default(),
            bloom_intensity: 0.5,
            film_grain_intensity: 0.5,
            depth_of_field_requested: false,
        };
        cfg.apply_settings(initial);
        cfg
    }

    pub fn quality(&self) -> QualityTier {
        self.quality
    }

    pub fn post_processing_enabled(&self) -> bool {
        self.post_processing_enabled
    }

    pub fn reduced_flashing(&self) -> bool {
        self.reduced_flashing
    }

    pub fn bloom_intensity(&self) -> f32 {
        self.bloom_intensity
    }

    pub fn film_grain_intensity(&self) -> f32 {
        self.film_grain_intensity
    }

    /// Re-applies the tier preset. Returns true when the resolved membership
    /// set changed (callers rebuild the chain only then).
    pub fn set_quality(&mut self, quality: QualityTier) -> bool {
        if self.quality == quality {
            return false;
        }
        let before = self.resolved();
        self.quality = quality;
        self.resolved() != before
    }

    pub fn set_depth_of_field_requested(&mut self, on: bool) -> bool {
        let before = self.resolved();
        self.depth_of_field_requested = on;
        self.resolved() != before
    }

    /// One-way merge from the external settings object. Returns true when the
    /// resolved membership set changed.
    pub fn apply_settings(&mut self, patch: &SettingsPatch) -> bool {
        let before = self.resolved();
        if let Some(on) = patch.post_processing_enabled {
            self.post_processing_enabled = on;
        }
        if let Some(on) = patch.bloom_enabled {
            self.overrides.bloom = Some(on);
        }
        if let Some(v) = patch.bloom_intensity {
            self.bloom_intensity = v.clamp(0.0, 1.0);
        }
        if let Some(on) = patch.chromatic_aberration_enabled {
            self.overrides.chromatic_aberration = Some(on);
        }
        if let Some(on) = patch.vignette_enabled {
            self.overrides.vignette = Some(on);
        }
        if let Some(on) = patch.film_grain_enabled {
            self.overrides.film_grain = Some(on);
        }
        if let Some(v) = patch.film_grain_intensity {
            self.film_grain_intensity = v.clamp(0.0, 1.0);
        }
        if let Some(on) = patch.motion_blur {
            self.overrides.motion_blur = Some(on);
        }
        if let Some(on) = patch.color_grading_enabled {
            self.overrides.color_grading = Some(on);
        }
        if let Some(on) = patch.reduced_flashing {
            self.reduced_flashing = on;
        }
        self.resolved() != before
    }

    /// Resolve the membership set: built-in defaults, then the tier preset for
    /// optional effects, then explicit overrides, then the tier gate (a tier
    /// that disallows an effect wins over any override), then the master kill
    /// switch.
    pub fn resolved(&self) -> EffectToggles {
        let preset = preset_for(self.quality);
        let ov = &self.overrides;

        let bloom = ov.bloom.unwrap_or(preset.bloom) && preset.bloom;
        let film_grain = ov.film_grain.unwrap_or(preset.film_grain) && preset.film_grain;
        let chromatic_aberration = ov
            .chromatic_aberration
            .unwrap_or(preset.chromatic_aberration)
            && preset.chromatic_aberration;
        let motion_blur = ov.motion_blur.unwrap_or(preset.motion_blur) && preset.motion_blur;
        let depth_of_field = (ov.depth_of_field.unwrap_or(false) || self.depth_of_field_requested)
            && preset.depth_of_field;

        // Vignette and color grading render through the shared image-process
        // stage; it stays in the chain while either wants it.
        let vignette = ov.vignette.unwrap_or(true);
        let color_grading = ov.color_grading.unwrap_or(true);

        let mut toggles = EffectToggles {
            depth_of_field,
            motion_blur,
            bloom,
            image_process: vignette || color_grading,
            sharpen: ov.sharpen.unwrap_or(false),
            film_grain,
            chromatic_aberration,
            fxaa: ov.fxaa.unwrap_or(true),
        };

        if !self.post_processing_enabled {
            toggles = EffectToggles::default();
        }
        toggles
    }

    /// Whether the vignette sub-effect of the image-process stage is wanted.
    pub fn vignette_enabled(&self) -> bool {
        self.post_processing_enabled && self.overrides.vignette.unwrap_or(true)
    }

    /// Whether color grading inside the image-process stage is wanted.
    pub fn color_grading_enabled(&self) -> bool {
        self.post_processing_enabled && self.overrides.color_grading.unwrap_or(true)
    }
}
