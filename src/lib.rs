//! Cosmo Pong - simulation core for a neon-cosmic 3D pong arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (motion, collisions, AI, power-ups, match state)
//! - `config`: Data-driven game tunables with safe fallbacks
//! - `match_history`: Finished-match records handed to the persistence layer
//!
//! Rendering, DOM/UI, audio playback, the store, and the multiplayer layer are
//! host concerns. The host drives `sim::tick` once per frame and drains the
//! event queue to update displays, trigger sound cues, and persist results.

pub mod config;
pub mod match_history;
pub mod sim;

pub use config::GameConfig;
pub use match_history::{MatchHistory, MatchRecord};

/// Game configuration constants (defaults; `GameConfig` makes them tunable)
pub mod consts {
    /// Field dimensions. X is the scoring axis, Y is paddle travel,
    /// Z is cosmetic depth.
    pub const FIELD_WIDTH: f32 = 100.0;
    pub const FIELD_HEIGHT: f32 = 60.0;
    pub const FIELD_DEPTH: f32 = 10.0;

    /// Paddle defaults - height is the Y extent the ball must meet
    pub const PADDLE_WIDTH: f32 = 2.0;
    pub const PADDLE_HEIGHT: f32 = 12.0;
    pub const PADDLE_DEPTH: f32 = 2.0;
    /// Gap between a paddle face and its goal line
    pub const PADDLE_MARGIN: f32 = 3.0;
    pub const PADDLE_SPEED: f32 = 40.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 1.2;
    pub const BASE_BALL_SPEED: f32 = 35.0;
    /// Flat speed gain per paddle return
    pub const BALL_SPEED_INCREMENT: f32 = 1.5;
    /// Rally speed cap as a multiple of the base speed
    pub const MAX_BALL_SPEED_FACTOR: f32 = 2.2;

    /// First side to reach this many points wins the match
    pub const MAX_POINTS: u32 = 5;

    /// Largest delta a single tick will integrate (inactive-tab gap guard)
    pub const MAX_DT: f32 = 0.1;
    /// Gap between a point being scored and the next serve
    pub const POINT_TRANSITION_SECS: f32 = 1.0;

    /// Stuck-ball watchdog: per-axis movement epsilon and the number of
    /// consecutive motionless ticks tolerated before a forced reset
    pub const STUCK_EPSILON: f32 = 0.001;
    pub const STUCK_TICKS: u32 = 60;

    /// Power-up pickup cadence and shelf life
    pub const POWER_UP_FREQUENCY_SECS: f32 = 10.0;
    pub const PICKUP_LIFETIME_SECS: f32 = 12.0;
    pub const PICKUP_RADIUS: f32 = 2.0;
}

/// Clamp a raw input axis to [-1, 1], treating non-finite values as centered
#[inline]
pub fn clamp_axis(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Fold a predicted Y coordinate back into the playable band, accounting for
/// at most one wall bounce
#[inline]
pub fn reflect_into_band(y: f32, limit: f32) -> f32 {
    if y > limit {
        2.0 * limit - y
    } else if y < -limit {
        -2.0 * limit - y
    } else {
        y
    }
}
