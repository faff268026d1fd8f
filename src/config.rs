//! Game configuration and tunables
//!
//! A read-only snapshot the simulation consumes each tick. Persisted
//! separately from match results in LocalStorage on web builds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::PowerUpKind;

/// Numeric tunables for a match
///
/// Every field falls back to its documented default when missing from a
/// stored snapshot; [`GameConfig::sanitized`] additionally replaces values a
/// corrupted snapshot (or a hostile host) could feed in, so a bad config can
/// degrade a match but never break the tick loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub field_width: f32,
    pub field_height: f32,
    pub field_depth: f32,

    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_depth: f32,
    /// Gap between a paddle face and its goal line
    pub paddle_margin: f32,
    pub paddle_speed: f32,

    pub ball_radius: f32,
    pub base_ball_speed: f32,
    pub ball_speed_increment: f32,
    pub max_ball_speed_factor: f32,

    pub max_points: u32,

    pub left_is_ai: bool,
    pub right_is_ai: bool,
    /// AI skill on a 0-1 scale, per side
    pub left_difficulty: f32,
    pub right_difficulty: f32,

    /// Seconds between power-up pickup spawns
    pub power_up_frequency: f32,
    pub power_up_duration_factor: f32,
    pub power_up_strength_factor: f32,
    /// Optional per-type spawn weights; types absent from the map never
    /// spawn, an empty/missing map means uniform
    pub per_type_spawn_chance: Option<BTreeMap<PowerUpKind, f32>>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,
            field_depth: FIELD_DEPTH,
            paddle_width: PADDLE_WIDTH,
            paddle_height: PADDLE_HEIGHT,
            paddle_depth: PADDLE_DEPTH,
            paddle_margin: PADDLE_MARGIN,
            paddle_speed: PADDLE_SPEED,
            ball_radius: BALL_RADIUS,
            base_ball_speed: BASE_BALL_SPEED,
            ball_speed_increment: BALL_SPEED_INCREMENT,
            max_ball_speed_factor: MAX_BALL_SPEED_FACTOR,
            max_points: MAX_POINTS,
            left_is_ai: false,
            right_is_ai: true,
            left_difficulty: 0.7,
            right_difficulty: 0.7,
            power_up_frequency: POWER_UP_FREQUENCY_SECS,
            power_up_duration_factor: 1.0,
            power_up_strength_factor: 1.0,
            per_type_spawn_chance: None,
        }
    }
}

/// Replace `value` with `fallback` unless it is finite and inside `[lo, hi]`
fn checked(value: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
    if value.is_finite() && (lo..=hi).contains(&value) {
        value
    } else {
        fallback
    }
}

impl GameConfig {
    /// Return a copy with every out-of-range or non-finite value replaced by
    /// its default
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        let mut cfg = self.clone();
        cfg.field_width = checked(cfg.field_width, 10.0, 10_000.0, d.field_width);
        cfg.field_height = checked(cfg.field_height, 10.0, 10_000.0, d.field_height);
        cfg.field_depth = checked(cfg.field_depth, 0.0, 10_000.0, d.field_depth);
        cfg.paddle_width = checked(cfg.paddle_width, 0.1, cfg.field_width, d.paddle_width);
        cfg.paddle_height = checked(cfg.paddle_height, 0.1, cfg.field_height, d.paddle_height);
        cfg.paddle_depth = checked(cfg.paddle_depth, 0.0, 1_000.0, d.paddle_depth);
        cfg.paddle_margin = checked(cfg.paddle_margin, 0.0, cfg.field_width / 4.0, d.paddle_margin);
        cfg.paddle_speed = checked(cfg.paddle_speed, 0.1, 10_000.0, d.paddle_speed);
        cfg.ball_radius = checked(cfg.ball_radius, 0.1, cfg.field_height / 4.0, d.ball_radius);
        cfg.base_ball_speed = checked(cfg.base_ball_speed, 0.1, 10_000.0, d.base_ball_speed);
        cfg.ball_speed_increment =
            checked(cfg.ball_speed_increment, 0.0, 1_000.0, d.ball_speed_increment);
        cfg.max_ball_speed_factor =
            checked(cfg.max_ball_speed_factor, 1.0, 100.0, d.max_ball_speed_factor);
        if cfg.max_points == 0 || cfg.max_points > 1_000 {
            cfg.max_points = d.max_points;
        }
        cfg.left_difficulty = checked(cfg.left_difficulty, 0.0, 1.0, d.left_difficulty);
        cfg.right_difficulty = checked(cfg.right_difficulty, 0.0, 1.0, d.right_difficulty);
        cfg.power_up_frequency =
            checked(cfg.power_up_frequency, 0.5, 3_600.0, d.power_up_frequency);
        cfg.power_up_duration_factor =
            checked(cfg.power_up_duration_factor, 0.1, 10.0, d.power_up_duration_factor);
        cfg.power_up_strength_factor =
            checked(cfg.power_up_strength_factor, 0.1, 10.0, d.power_up_strength_factor);
        if let Some(weights) = &mut cfg.per_type_spawn_chance {
            weights.retain(|_, w| w.is_finite() && *w > 0.0);
            if weights.is_empty() {
                cfg.per_type_spawn_chance = None;
            }
        }
        cfg
    }

    pub fn half_width(&self) -> f32 {
        self.field_width / 2.0
    }

    pub fn half_height(&self) -> f32 {
        self.field_height / 2.0
    }

    /// X coordinate of a paddle's center line
    pub fn paddle_x(&self, side: crate::sim::Side) -> f32 {
        side.sign() * (self.half_width() - self.paddle_margin)
    }

    /// Hard ceiling on the rally speed
    pub fn max_ball_speed(&self) -> f32 {
        self.base_ball_speed * self.max_ball_speed_factor
    }

    pub fn is_ai(&self, side: crate::sim::Side) -> bool {
        match side {
            crate::sim::Side::Left => self.left_is_ai,
            crate::sim::Side::Right => self.right_is_ai,
        }
    }

    pub fn difficulty(&self, side: crate::sim::Side) -> f32 {
        match side {
            crate::sim::Side::Left => self.left_difficulty,
            crate::sim::Side::Right => self.right_difficulty,
        }
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "cosmo_pong_config";

    /// Load the stored config (WASM only); any parse failure falls back to
    /// defaults
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(cfg) = serde_json::from_str::<GameConfig>(&json) {
                    log::info!("Loaded config from LocalStorage");
                    return cfg.sanitized();
                }
                log::warn!("Stored config unreadable, using defaults");
            }
        }

        log::info!("Using default config");
        Self::default()
    }

    /// Save the config to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Config saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_json() {
        let cfg = GameConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: GameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: GameConfig = serde_json::from_str(r#"{"maxPoints": 11}"#).unwrap();
        assert_eq!(cfg.max_points, 11);
        assert_eq!(cfg.field_width, FIELD_WIDTH);
        assert_eq!(cfg.paddle_speed, PADDLE_SPEED);
    }

    #[test]
    fn sanitized_rejects_non_finite_and_out_of_range() {
        let mut cfg = GameConfig::default();
        cfg.field_width = f32::NAN;
        cfg.paddle_speed = -5.0;
        cfg.left_difficulty = 3.0;
        cfg.max_points = 0;
        let clean = cfg.sanitized();
        assert_eq!(clean.field_width, FIELD_WIDTH);
        assert_eq!(clean.paddle_speed, PADDLE_SPEED);
        assert_eq!(clean.left_difficulty, GameConfig::default().left_difficulty);
        assert_eq!(clean.max_points, MAX_POINTS);
    }

    #[test]
    fn sanitized_drops_bad_spawn_weights() {
        let mut weights = BTreeMap::new();
        weights.insert(PowerUpKind::Freeze, f32::NAN);
        weights.insert(PowerUpKind::Speed, -1.0);
        let cfg = GameConfig {
            per_type_spawn_chance: Some(weights),
            ..Default::default()
        };
        assert!(cfg.sanitized().per_type_spawn_chance.is_none());
    }
}
