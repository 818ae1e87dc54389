//! Effect-primitive contract: the chain vocabulary, per-effect parameter
//! blocks, and the backend trait the render pipeline composer drives.
//!
//! Effect instances live on the other side of [`RenderBackend`]; this crate
//! only ever writes parameters into them. The live numeric state is owned
//! here, never read back, so concurrent fade/animation logic cannot feed on
//! its own output.

use glam::Vec3;
use thiserror::Error;

/// Screen-space effect kinds, in no particular order. Chain order is fixed by
/// [`EffectKind::CHAIN_ORDER`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    DepthOfField,
    MotionBlur,
    Bloom,
    ImageProcess,
    Sharpen,
    FilmGrain,
    ChromaticAberration,
    Fxaa,
}

impl EffectKind {
    /// Fixed composition order. Later stages consume the color output of
    /// earlier ones: depth-driven blurs first, then bloom, then color work,
    /// grain and aberration near the end, and FXAA last so edge antialiasing
    /// acts on the final shaded image.
    pub const CHAIN_ORDER: [EffectKind; 8] = [
        EffectKind::DepthOfField,
        EffectKind::MotionBlur,
        EffectKind::Bloom,
        EffectKind::ImageProcess,
        EffectKind::Sharpen,
        EffectKind::FilmGrain,
        EffectKind::ChromaticAberration,
        EffectKind::Fxaa,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::DepthOfField => "depth_of_field",
            EffectKind::MotionBlur => "motion_blur",
            EffectKind::Bloom => "bloom",
            EffectKind::ImageProcess => "image_process",
            EffectKind::Sharpen => "sharpen",
            EffectKind::FilmGrain => "film_grain",
            EffectKind::ChromaticAberration => "chromatic_aberration",
            EffectKind::Fxaa => "fxaa",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BloomParams {
    pub weight: f32,
    pub threshold: f32,
    pub kernel: f32,
    pub scale: f32,
}

impl Default for BloomParams {
    fn default() -> Self {
        Self {
            weight: 0.35,
            threshold: 0.82,
            kernel: 64.0,
            scale: 0.5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageProcessParams {
    pub contrast: f32,
    pub exposure: f32,
    pub saturation: f32,
    pub tint: Vec3,
    pub vignette_weight: f32,
    pub vignette_stretch: f32,
    pub vignette_color: Vec3,
}

impl Default for ImageProcessParams {
    fn default() -> Self {
        Self {
            contrast: 1.0,
            exposure: 1.0,
            saturation: 1.0,
            tint: Vec3::ONE,
            vignette_weight: 1.2,
            vignette_stretch: 0.5,
            vignette_color: Vec3::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChromaticAberrationParams {
    pub amount: f32,
    pub radial_intensity: f32,
}

impl Default for ChromaticAberrationParams {
    fn default() -> Self {
        Self {
            amount: 8.0,
            radial_intensity: 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilmGrainParams {
    pub intensity: f32,
    pub animated: bool,
}

impl Default for FilmGrainParams {
    fn default() -> Self {
        Self {
            intensity: 0.175,
            animated: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SharpenParams {
    pub edge_amount: f32,
    pub color_amount: f32,
}

impl Default for SharpenParams {
    fn default() -> Self {
        Self {
            edge_amount: 0.3,
            color_amount: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionBlurParams {
    pub strength: f32,
}

impl Default for MotionBlurParams {
    fn default() -> Self {
        Self { strength: 0.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthOfFieldParams {
    pub focus_distance: f32,
    pub focal_length: f32,
    pub f_stop: f32,
}

impl Default for DepthOfFieldParams {
    fn default() -> Self {
        Self {
            focus_distance: 10.0,
            focal_length: 50.0,
            f_stop: 1.4,
        }
    }
}

/// Live parameter block for one effect kind. FXAA carries none.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EffectParams {
    DepthOfField(DepthOfFieldParams),
    MotionBlur(MotionBlurParams),
    Bloom(BloomParams),
    ImageProcess(ImageProcessParams),
    Sharpen(SharpenParams),
    FilmGrain(FilmGrainParams),
    ChromaticAberration(ChromaticAberrationParams),
    Fxaa,
}

impl EffectParams {
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectParams::DepthOfField(_) => EffectKind::DepthOfField,
            EffectParams::MotionBlur(_) => EffectKind::MotionBlur,
            EffectParams::Bloom(_) => EffectKind::Bloom,
            EffectParams::ImageProcess(_) => EffectKind::ImageProcess,
            EffectParams::Sharpen(_) => EffectKind::Sharpen,
            EffectParams::FilmGrain(_) => EffectKind::FilmGrain,
            EffectParams::ChromaticAberration(_) => EffectKind::ChromaticAberration,
            EffectParams::Fxaa => EffectKind::Fxaa,
        }
    }
}

/// Construction-time description for one effect instance.
#[derive(Clone, Copy, Debug)]
pub struct EffectDesc {
    /// Exactly one effect in the chain clears the backing render target; all
    /// later ones share its output.
    pub clear_owner: bool,
    /// MSAA sample count. Only the first chain stage may carry more than 1.
    pub samples: u32,
}

/// Opaque handle to a backend effect instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EffectId(pub u32);

/// Opaque handle to a backend camera / viewpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CameraId(pub u32);

#[derive(Debug, Error)]
pub enum EffectBuildError {
    /// The driver or backend cannot express this effect. Expected degradation:
    /// the composer skips it with a warning.
    #[error("effect {0} is not supported by this backend")]
    Unsupported(&'static str),
    /// Backend-reported construction failure.
    #[error("effect construction failed: {0}")]
    Backend(String),
}

/// The rendering-engine collaborator contract consumed by the pipeline
/// composer. Implemented over WebGPU in `strike-web` and by recording mocks
/// in tests.
pub trait RenderBackend {
    /// Largest MSAA sample count the driver honors on a post-process target.
    fn max_sample_count(&self) -> u32;

    fn create_effect(
        &mut self,
        kind: EffectKind,
        desc: &EffectDesc,
    ) -> Result<EffectId, EffectBuildError>;

    /// Readiness poll: shader compilation may lag construction. Parameters
    /// are only pushed into ready effects.
    fn effect_ready(&self, effect: EffectId) -> bool;

    fn apply_params(&mut self, effect: EffectId, params: &EffectParams);

    fn attach_camera(&mut self, effect: EffectId, camera: CameraId);

    fn dispose_effect(&mut self, effect: EffectId);
}
