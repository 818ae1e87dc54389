//! Per-level color grading: named presets keyed by level-type tag, with
//! instant application or timed interpolation.
//!
//! Interpolation runs inside the manager's per-frame update rather than any
//! engine-native tween so it composes with transient modifiers touching the
//! same parameters in the same tick.

use glam::Vec3;

/// Level families of the campaign. Tags come from level scripts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelType {
    Station,
    Hive,
    Extraction,
    Surface,
}

impl LevelType {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "station" => Some(Self::Station),
            "hive" => Some(Self::Hive),
            "extraction" => Some(Self::Extraction),
            "surface" => Some(Self::Surface),
            _ => None,
        }
    }
}

/// Contrast/exposure/tint triple applied to the image-process stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradeSettings {
    pub contrast: f32,
    pub exposure: f32,
    pub tint: Vec3,
    pub saturation: f32,
}

impl Default for GradeSettings {
    fn default() -> Self {
        Self {
            contrast: 1.0,
            exposure: 1.0,
            tint: Vec3::ONE,
            saturation: 1.0,
        }
    }
}

pub fn grade_for(level: LevelType) -> GradeSettings {
    match level {
        // Sterile interiors: cool tint, slightly crushed blacks.
        LevelType::Station => GradeSettings {
            contrast: 1.1,
            exposure: 1.0,
            tint: Vec3::new(0.92, 0.97, 1.08),
            saturation: 0.95,
        },
        // Organic warrens: warm, dim, heavy contrast.
        LevelType::Hive => GradeSettings {
            contrast: 1.22,
            exposure: 0.85,
            tint: Vec3::new(1.1, 0.94, 0.86),
            saturation: 1.05,
        },
        // Night extraction: washed out, low saturation.
        LevelType::Extraction => GradeSettings {
            contrast: 1.05,
            exposure: 0.9,
            tint: Vec3::new(0.95, 0.98, 1.02),
            saturation: 0.8,
        },
        LevelType::Surface => GradeSettings {
            contrast: 1.0,
            exposure: 1.08,
            tint: Vec3::new(1.04, 1.0, 0.94),
            saturation: 1.0,
        },
    }
}

struct GradeTransition {
    from: GradeSettings,
    to: GradeSettings,
    elapsed: f32,
    duration: f32,
}

/// Current grade plus an optional in-flight timed transition.
pub struct GradeState {
    current: GradeSettings,
    level: Option<LevelType>,
    transition: Option<GradeTransition>,
}

impl Default for GradeState {
    fn default() -> Self {
        Self {
            current: GradeSettings::default(),
            level: None,
            transition: None,
        }
    }
}

impl GradeState {
    pub fn level(&self) -> Option<LevelType> {
        self.level
    }

    /// Instantaneous switch; cancels any in-flight transition.
    pub fn set(&mut self, level: LevelType) {
        self.level = Some(level);
        self.current = grade_for(level);
        self.transition = None;
    }

    /// Timed interpolation toward the named preset. A non-positive duration
    /// degenerates to an instant switch.
    pub fn transition_to(&mut self, level: LevelType, duration_sec: f32) {
        if duration_sec <= 0.0 {
            self.set(level);
            return;
        }
        self.transition = Some(GradeTransition {
            from: self.value(),
            to: grade_for(level),
            elapsed: 0.0,
            duration: duration_sec,
        });
        self.level = Some(level);
    }

    pub fn tick(&mut self, dt: f32) {
        if let Some(t) = self.transition.as_mut() {
            t.elapsed += dt;
            if t.elapsed >= t.duration {
                self.current = t.to;
                self.transition = None;
            }
        }
    }

    /// The instantaneous grade, mid-transition values included.
    pub fn value(&self) -> GradeSettings {
        match &self.transition {
            None => self.current,
            Some(t) => {
                let f = (t.elapsed / t.duration).clamp(0.0, 1.0);
                GradeSettings {
                    contrast: t.from.contrast + (t.to.contrast - t.from.contrast) * f,
                    exposure: t.from.exposure + (t.to.exposure - t.from.exposure) * f,
                    tint: t.from.tint.lerp(t.to.tint, f),
                    saturation: t.from.saturation + (t.to.saturation - t.from.saturation) * f,
                }
            }
        }
    }

    pub fn in_transition(&self) -> bool {
        self.transition.is_some()
    }
}
