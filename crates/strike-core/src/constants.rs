// Shared visual/audio tuning constants used by both the post-FX manager and
// the music director.

// Post-process chain
pub const DESIRED_SAMPLE_COUNT: u32 = 4; // MSAA on the first chain stage only
pub const EFFECT_READY_POLL_LIMIT: u32 = 240; // ticks before an unready effect is dropped

// Damage feedback
pub const DAMAGE_FLASH_SECONDS: f32 = 1.2; // full-intensity flash decay time
pub const DAMAGE_FLASH_REDUCED_SECONDS: f32 = 0.4; // with reduced-flashing accessibility
pub const DAMAGE_FLASH_VIGNETTE: f32 = 1.6; // vignette weight added at flash = 1
pub const DAMAGE_FLASH_CONTRAST: f32 = 0.35; // contrast added at flash = 1

// Low-health state
pub const LOW_HEALTH_THRESHOLD: f32 = 0.25; // fraction of max health
pub const LOW_HEALTH_PULSE_HZ: f32 = 1.4;
pub const LOW_HEALTH_PULSE_VIGNETTE: f32 = 0.5;

// Kill streak
pub const KILL_STREAK_BLOOM_STEP: f32 = 0.04; // bloom weight per streak kill
pub const KILL_STREAK_BLOOM_MAX: f32 = 0.3;
pub const KILL_STREAK_CONTRAST_STEP: f32 = 0.015;
pub const KILL_STREAK_CONTRAST_MAX: f32 = 0.12;

// Movement-gated boosts
pub const SLIDE_CHROMATIC_BOOST: f32 = 18.0; // extra aberration amount while sliding
pub const SPRINT_MOTION_BLUR_STRENGTH: f32 = 0.45;
pub const COMBAT_DESATURATION: f32 = 0.22;

// Short transients
pub const HIT_CONFIRM_SECONDS: f32 = 0.12;
pub const HIT_CONFIRM_SHARPEN: f32 = 0.25;
pub const HIT_CONFIRM_EXPOSURE: f32 = 0.1;
pub const WEAPON_SHAKE_CHROMATIC: f32 = 12.0; // aberration amount at shake = 1

// Parameter ceilings (clamp targets for composed values)
pub const BLOOM_WEIGHT_MAX: f32 = 2.0;
pub const VIGNETTE_WEIGHT_MAX: f32 = 4.0;
pub const CHROMATIC_AMOUNT_MAX: f32 = 60.0;
pub const GRAIN_INTENSITY_MAX: f32 = 1.0;

// Music director
pub const CROSSFADE_SECONDS: f32 = 1.5;
pub const DISPOSE_GRACE_SECONDS: f32 = 0.2; // gap between fade-out end and teardown
pub const TEMPO_RAMP_SECONDS: f32 = 2.0;
pub const LAYER_RAMP_SECONDS: f32 = 1.2;
pub const SET_VOLUME_RAMP_SECONDS: f32 = 0.1;
pub const STINGER_LIFETIME_SECONDS: f32 = 4.0;

pub const MENU_STATE_GAIN: f32 = 0.8;
pub const EXPLORATION_STATE_GAIN: f32 = 0.45;
pub const COMBAT_STATE_GAIN: f32 = 0.9;
pub const BOSS_STATE_GAIN: f32 = 1.0;
pub const DEFAULT_MASTER_VOLUME: f32 = 0.7;

pub const MENU_BPM: f32 = 84.0;
pub const COMBAT_BPM_LOW: f32 = 110.0;
pub const COMBAT_BPM_MEDIUM: f32 = 130.0;
pub const COMBAT_BPM_HIGH: f32 = 150.0;
pub const BOSS_BPM: f32 = 160.0;
