//! Damped transition between the scattered and assembled states.
//!
//! Progress moves toward its target with exponential damping:
//!
//! ```text
//! progress += (target - progress) * (1 - exp(-dt / time_constant))
//! ```
//!
//! The per-frame factors multiply, so the same wall-clock duration yields the
//! same progress no matter how it is split into frames. The factor lies in
//! `[0, 1]`, so progress can approach the target but never pass it.

use crate::config;
use crate::error::ConfigError;

/// Distance from the target below which a transition counts as settled.
pub const SETTLE_EPSILON: f32 = 1e-3;

/// The two states the toggle can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Target {
    #[default]
    Scattered,
    Assembled,
}

impl Target {
    /// Progress value this target pulls toward.
    #[inline]
    pub fn value(self) -> f32 {
        match self {
            Target::Scattered => 0.0,
            Target::Assembled => 1.0,
        }
    }

    /// The other state.
    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            Target::Scattered => Target::Assembled,
            Target::Assembled => Target::Scattered,
        }
    }
}

impl From<bool> for Target {
    /// `true` requests the assembled state.
    fn from(assembled: bool) -> Self {
        if assembled {
            Target::Assembled
        } else {
            Target::Scattered
        }
    }
}

/// Advance `current` toward `target` by one frame of `dt` seconds.
///
/// `dt` of zero, negative or NaN leaves `current` unchanged. A huge `dt`
/// lands on `target`. `time_constant` must be positive; callers validate it
/// once up front.
#[inline]
pub fn damp(current: f32, target: f32, time_constant: f32, dt: f32) -> f32 {
    if dt.is_nan() || dt <= 0.0 {
        return current;
    }
    let factor = -(-dt / time_constant).exp_m1();
    if factor >= 1.0 {
        return target;
    }
    current + (target - current) * factor
}

/// Progress, target and time constant of one transition.
///
/// Owned by whoever drives frames and handed by reference to the evaluators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionState {
    progress: f32,
    target: Target,
    time_constant: f32,
}

impl TransitionState {
    /// Start at rest in the scattered state.
    pub fn new(time_constant: f32) -> Result<Self, ConfigError> {
        config::validate_time_constant(time_constant)?;
        Ok(Self {
            progress: 0.0,
            target: Target::Scattered,
            time_constant,
        })
    }

    /// Start at rest in `target`.
    pub fn at_rest(target: Target, time_constant: f32) -> Result<Self, ConfigError> {
        let mut state = Self::new(time_constant)?;
        state.target = target;
        state.progress = target.value();
        Ok(state)
    }

    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    #[inline]
    pub fn target(&self) -> Target {
        self.target
    }

    #[inline]
    pub fn time_constant(&self) -> f32 {
        self.time_constant
    }

    /// Request a new target. Progress continues from where it is.
    pub fn set_target(&mut self, target: Target) {
        if self.target != target {
            tracing::debug!(?target, progress = self.progress, "Transition target changed");
            self.target = target;
        }
    }

    /// Flip the target and return the new one.
    pub fn toggle(&mut self) -> Target {
        self.set_target(self.target.toggled());
        self.target
    }

    /// Advance by one frame. Returns `true` while not yet settled.
    ///
    /// Once progress comes within [`SETTLE_EPSILON`] of the target it snaps
    /// onto the target, so a settled transition sits exactly at 0 or 1.
    pub fn advance(&mut self, dt: f32) -> bool {
        let target = self.target.value();
        let next = damp(self.progress, target, self.time_constant, dt).clamp(0.0, 1.0);
        self.progress = if (target - next).abs() <= SETTLE_EPSILON {
            target
        } else {
            next
        };
        !self.is_settled()
    }

    /// Whether progress is within [`SETTLE_EPSILON`] of the target.
    pub fn is_settled(&self) -> bool {
        (self.target.value() - self.progress).abs() <= SETTLE_EPSILON
    }
}
