//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - Timers are absolute deadlines on the sim clock, checked once per tick
//! - No rendering or platform dependencies

pub mod ai;
pub mod motion;
pub mod powerups;
pub mod state;
pub mod tick;

pub use motion::GoalCrossing;
pub use state::{
    ActivePowerUp, Ball, GameEvent, MatchPhase, MatchState, Obstacle, Paddle, Pickup, PowerUpKind,
    Side,
};
pub use tick::{TickInput, tick};
