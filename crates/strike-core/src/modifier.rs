//! Transient modifiers: time-bounded adjustments layered on top of base
//! effect parameters. Final applied value = base + sum of active modifiers,
//! clamped to the effect's valid range by the composer in `postfx`.

use crate::constants::*;

/// Decaying flash with max-merge retrigger. Retriggering before the decay
/// completes takes the max of current and new magnitude, never the sum, so
/// rapid hits cannot stack into runaway flashing.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecayingFlash {
    magnitude: f32,
    decay_per_sec: f32,
}

impl DecayingFlash {
    pub fn trigger(&mut self, intensity: f32, decay_seconds: f32) {
        let intensity = intensity.clamp(0.0, 1.0);
        self.magnitude = self.magnitude.max(intensity);
        if decay_seconds > 0.0 {
            self.decay_per_sec = 1.0 / decay_seconds;
        } else {
            self.magnitude = 0.0;
        }
    }

    pub fn advance(&mut self, dt: f32) {
        if self.magnitude > 0.0 {
            self.magnitude = (self.magnitude - self.decay_per_sec * dt).max(0.0);
        }
    }

    pub fn magnitude(&self) -> f32 {
        self.magnitude
    }

    pub fn active(&self) -> bool {
        self.magnitude > 0.0
    }
}

/// Peak-then-decay boost for explosions; magnitude is not bounded to 0..1,
/// the composed parameter clamp bounds the result instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecayingBoost {
    magnitude: f32,
    decay_per_sec: f32,
}

impl DecayingBoost {
    pub fn trigger(&mut self, peak: f32, decay_seconds: f32) {
        let peak = peak.max(0.0);
        self.magnitude = self.magnitude.max(peak);
        if decay_seconds > 0.0 {
            self.decay_per_sec = peak / decay_seconds;
        } else {
            self.magnitude = 0.0;
        }
    }

    pub fn advance(&mut self, dt: f32) {
        if self.magnitude > 0.0 {
            self.magnitude = (self.magnitude - self.decay_per_sec * dt).max(0.0);
        }
    }

    pub fn magnitude(&self) -> f32 {
        self.magnitude
    }
}

/// Fixed-duration boost that holds its amount and expires on its own.
#[derive(Clone, Copy, Debug)]
pub struct TimedBoost {
    pub amount: f32,
    remaining: f32,
}

impl TimedBoost {
    pub fn new(amount: f32, duration_sec: f32) -> Self {
        Self {
            amount,
            remaining: duration_sec.max(0.0),
        }
    }

    /// Returns false once expired.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining > 0.0
    }
}

/// Single short confirmation pulse: rises instantly, fades over the pulse
/// window. Re-triggering restarts the window.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConfirmPulse {
    remaining: f32,
}

impl ConfirmPulse {
    pub fn trigger(&mut self) {
        self.remaining = HIT_CONFIRM_SECONDS;
    }

    pub fn advance(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
    }

    /// 1 at trigger, linear to 0 at expiry.
    pub fn value(&self) -> f32 {
        if self.remaining <= 0.0 {
            0.0
        } else {
            self.remaining / HIT_CONFIRM_SECONDS
        }
    }
}

/// Sinusoidal pulse active while health sits below the low-health threshold.
/// Independent of the damage flash; phase only advances while active so the
/// pulse always starts from zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct LowHealthPulse {
    active: bool,
    phase: f32,
}

impl LowHealthPulse {
    pub fn set_active(&mut self, active: bool) {
        if active && !self.active {
            self.phase = 0.0;
        }
        self.active = active;
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn advance(&mut self, dt: f32) {
        if self.active {
            self.phase += dt * LOW_HEALTH_PULSE_HZ * std::f32::consts::TAU;
        }
    }

    /// 0..1 oscillation, zero while inactive.
    pub fn value(&self) -> f32 {
        if self.active {
            0.5 - 0.5 * self.phase.cos()
        } else {
            0.0
        }
    }
}

/// Kill-streak boost: monotone in streak count, capped, reset at zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct KillStreakBoost {
    streak: u32,
}

impl KillStreakBoost {
    pub fn set_streak(&mut self, count: u32) {
        self.streak = count;
    }

    pub fn bloom_boost(&self) -> f32 {
        (self.streak as f32 * KILL_STREAK_BLOOM_STEP).min(KILL_STREAK_BLOOM_MAX)
    }

    pub fn contrast_boost(&self) -> f32 {
        (self.streak as f32 * KILL_STREAK_CONTRAST_STEP).min(KILL_STREAK_CONTRAST_MAX)
    }
}
