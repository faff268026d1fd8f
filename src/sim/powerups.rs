//! Power-up lifecycle: spawn, acquisition, timed expiry
//!
//! Effects never overwrite baseline attributes. A paddle's effective speed or
//! height is recomputed from its base value and the active set every time it
//! is needed, so removing an effect restores the baseline exactly, with no
//! drift, regardless of what else expired in between.

use glam::Vec3;
use rand::Rng;

use crate::GameConfig;
use crate::consts::{PICKUP_LIFETIME_SECS, PICKUP_RADIUS};

use super::state::{GameEvent, MatchState, Obstacle, Paddle, Pickup, PowerUpKind, Side};

/// Unscaled effect duration in seconds
pub fn base_duration(kind: PowerUpKind) -> f32 {
    match kind {
        PowerUpKind::Speed => 8.0,
        PowerUpKind::BallSpeed => 8.0,
        PowerUpKind::Shrink => 10.0,
        PowerUpKind::Shield => 15.0,
        PowerUpKind::Magnet => 6.0,
        PowerUpKind::Giant => 10.0,
        PowerUpKind::Ghost => 5.0,
        PowerUpKind::MultiBall => 12.0,
        PowerUpKind::Freeze => 3.0,
        PowerUpKind::Gravity => 8.0,
        PowerUpKind::TimeSlow => 6.0,
        PowerUpKind::Teleport => 1.5,
        PowerUpKind::SuperShot => 10.0,
        PowerUpKind::Mirror => 7.0,
        PowerUpKind::Obstacle => 12.0,
    }
}

/// Unscaled effect strength: a multiplier for attribute effects, an
/// acceleration for field effects, 1.0 for markers
fn base_magnitude(kind: PowerUpKind) -> f32 {
    match kind {
        PowerUpKind::Speed => 1.5,
        PowerUpKind::BallSpeed => 1.4,
        PowerUpKind::Shrink => 0.6,
        PowerUpKind::Giant => 1.6,
        PowerUpKind::TimeSlow => 0.6,
        PowerUpKind::Magnet => 25.0,
        PowerUpKind::Gravity => 20.0,
        _ => 1.0,
    }
}

/// Scale a magnitude away from neutral by the configured strength factor
pub fn scaled_magnitude(kind: PowerUpKind, strength: f32) -> f32 {
    let base = base_magnitude(kind);
    match kind {
        PowerUpKind::Speed | PowerUpKind::BallSpeed | PowerUpKind::Giant => {
            1.0 + (base - 1.0) * strength
        }
        PowerUpKind::Shrink | PowerUpKind::TimeSlow => (1.0 - (1.0 - base) * strength).max(0.1),
        PowerUpKind::Magnet | PowerUpKind::Gravity => base * strength,
        _ => base,
    }
}

/// Paddle movement rate with active effects folded in
pub fn effective_speed(paddle: &Paddle, now: f32) -> f32 {
    let mut speed = paddle.speed;
    if let Some(pu) = paddle.power_up(PowerUpKind::Speed, now) {
        speed *= pu.magnitude;
    }
    speed
}

/// Paddle Y extent with own giant and opposing shrink folded in
pub fn effective_height(paddle: &Paddle, opponent: &Paddle, now: f32) -> f32 {
    let mut height = paddle.height;
    if let Some(pu) = paddle.power_up(PowerUpKind::Giant, now) {
        height *= pu.magnitude;
    }
    if let Some(pu) = opponent.power_up(PowerUpKind::Shrink, now) {
        height *= pu.magnitude;
    }
    height
}

/// Rally speed multiplier from ballSpeed effects on either side
pub fn ball_speed_multiplier(paddles: &[Paddle; 2], now: f32) -> f32 {
    paddles
        .iter()
        .filter_map(|p| p.power_up(PowerUpKind::BallSpeed, now))
        .map(|pu| pu.magnitude)
        .product()
}

/// Ball time dilation from timeSlow effects on either side
pub fn time_scale(paddles: &[Paddle; 2], now: f32) -> f32 {
    paddles
        .iter()
        .filter_map(|p| p.power_up(PowerUpKind::TimeSlow, now))
        .map(|pu| pu.magnitude)
        .product()
}

/// Whether the ball phases through `side`'s paddle (the opponent holds ghost)
pub fn ball_ghosts_through(paddles: &[Paddle; 2], side: Side, now: f32) -> bool {
    paddles[side.opponent().index()].has_power_up(PowerUpKind::Ghost, now)
}

/// Advance the power-up subsystem by one tick: expire effects, cull stale
/// pickups, collect touched ones, and spawn the next opportunity
pub fn update(state: &mut MatchState, config: &GameConfig) {
    expire(state);

    let now = state.now;
    state.pickups.retain(|p| p.expires_at > now);

    // Balls collect pickups for the side that last touched them
    let mut collected: Vec<(u32, Side, PowerUpKind)> = Vec::new();
    for pickup in &state.pickups {
        for ball in &state.balls {
            let dx = ball.pos.x - pickup.pos.x;
            let dy = ball.pos.y - pickup.pos.y;
            let reach = PICKUP_RADIUS + config.ball_radius;
            if dx * dx + dy * dy <= reach * reach {
                if let Some(side) = ball.last_hit_by {
                    collected.push((pickup.id, side, pickup.kind));
                    break;
                }
            }
        }
    }
    for (pickup_id, side, kind) in collected {
        state.pickups.retain(|p| p.id != pickup_id);
        apply(state, side, kind, config);
    }

    if state.now >= state.next_pickup_at {
        spawn_pickup(state, config);
        state.next_pickup_at = state.now + config.power_up_frequency;
    }
}

/// Place a new pickup in the middle 60% of the field
fn spawn_pickup(state: &mut MatchState, config: &GameConfig) {
    let kind = pick_kind(state, config);
    let x = state.rng.random_range(-0.3..0.3) * config.field_width;
    let y_span = config.half_height() - PICKUP_RADIUS * 2.0;
    let y = state.rng.random_range(-y_span..y_span);
    let id = state.next_entity_id();
    state.pickups.push(Pickup {
        id,
        kind,
        pos: Vec3::new(x, y, 0.0),
        expires_at: state.now + PICKUP_LIFETIME_SECS,
    });
    state.emit(GameEvent::PickupSpawned { kind });
}

/// Choose a kind by configured weight, uniform when no weights are set
fn pick_kind(state: &mut MatchState, config: &GameConfig) -> PowerUpKind {
    if let Some(weights) = &config.per_type_spawn_chance {
        let total: f32 = weights.values().sum();
        if total > 0.0 {
            let mut roll = state.rng.random_range(0.0..total);
            for (kind, weight) in weights {
                roll -= weight;
                if roll <= 0.0 {
                    return *kind;
                }
            }
        }
    }
    let idx = state.rng.random_range(0..PowerUpKind::ALL.len());
    PowerUpKind::ALL[idx]
}

/// Grant `kind` to `side`: refresh the active set and run the one-shot part
/// of the effect
pub fn apply(state: &mut MatchState, side: Side, kind: PowerUpKind, config: &GameConfig) {
    let duration = base_duration(kind) * config.power_up_duration_factor;
    let magnitude = scaled_magnitude(kind, config.power_up_strength_factor);
    let until = state.now + duration;

    match kind {
        PowerUpKind::Freeze => {
            state.paddle_mut(side.opponent()).frozen_until = until;
        }
        PowerUpKind::MultiBall => {
            spawn_clone_balls(state);
        }
        PowerUpKind::Teleport => {
            let y_span = config.half_height() - config.ball_radius;
            let y = state.rng.random_range(-y_span..y_span);
            if let Some(ball) = state.primary_ball_mut() {
                ball.pos.y = y;
            }
        }
        PowerUpKind::Obstacle => {
            let x = state.rng.random_range(-0.25..0.25) * config.field_width;
            let y_span = config.half_height() * 0.6;
            let y = state.rng.random_range(-y_span..y_span);
            let id = state.next_entity_id();
            let half = Vec3::new(1.5, 4.0, config.field_depth / 2.0);
            state.obstacles.push(Obstacle {
                id,
                owner: side,
                pos: Vec3::new(x, y, 0.0),
                half,
                until,
            });
        }
        _ => {}
    }

    state.paddle_mut(side).activate(kind, until, magnitude);
    state.emit(GameEvent::PowerUpActivated { side, kind });
    log::debug!("{:?} activated {:?} until {:.2}", side, kind, until);
}

/// Spawn two clones of the primary ball, deflected half a radian either way
fn spawn_clone_balls(state: &mut MatchState) {
    let Some(primary) = state.primary_ball().cloned() else {
        return;
    };
    for angle in [0.5f32, -0.5] {
        let (sin, cos) = angle.sin_cos();
        let vel = Vec3::new(
            primary.vel.x * cos - primary.vel.y * sin,
            primary.vel.x * sin + primary.vel.y * cos,
            primary.vel.z,
        );
        let id = state.next_entity_id();
        let mut ball = super::state::Ball::new(id);
        ball.pos = primary.pos;
        ball.vel = vel;
        ball.speed = primary.speed;
        ball.clone = true;
        ball.last_hit_by = primary.last_hit_by;
        ball.last_pos = primary.pos;
        state.balls.push(ball);
    }
}

/// Remove effects whose deadline passed and undo their one-shot parts
fn expire(state: &mut MatchState) {
    let now = state.now;
    let mut expired: Vec<(Side, PowerUpKind)> = Vec::new();
    for paddle in &mut state.paddles {
        for pu in &paddle.active_power_ups {
            if pu.until <= now {
                expired.push((paddle.side, pu.kind));
            }
        }
        paddle.active_power_ups.retain(|pu| pu.until > now);
    }

    for &(side, kind) in &expired {
        match kind {
            PowerUpKind::Obstacle => {
                state.obstacles.retain(|o| o.owner != side);
            }
            PowerUpKind::MultiBall => {
                let still_active = state
                    .paddles
                    .iter()
                    .any(|p| p.has_power_up(PowerUpKind::MultiBall, now));
                if !still_active {
                    state.balls.retain(|b| !b.clone);
                }
            }
            _ => {}
        }
        state.emit(GameEvent::PowerUpExpired { side, kind });
    }

    // Obstacles carry their own deadline too, in case the owning entry was
    // consumed early
    state.obstacles.retain(|o| o.until > now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::MatchPhase;

    fn setup() -> (MatchState, GameConfig) {
        let config = GameConfig::default();
        let mut state = MatchState::new(42, &config);
        state.phase = MatchPhase::Playing;
        state.reset_for_match(&config);
        if let Some(ball) = state.primary_ball_mut() {
            ball.vel = Vec3::new(30.0, 5.0, 0.0);
        }
        (state, config)
    }

    #[test]
    fn attribute_effects_revert_exactly_on_expiry() {
        let (mut state, config) = setup();
        let base_speed = state.paddle(Side::Left).speed;
        let base_height = state.paddle(Side::Right).height;

        apply(&mut state, Side::Left, PowerUpKind::Speed, &config);
        apply(&mut state, Side::Left, PowerUpKind::Shrink, &config);
        let (left, right) = state.both_paddles_mut();
        let now = 0.0;
        assert!(effective_speed(left, now) > base_speed);
        assert!(effective_height(right, left, now) < base_height);

        // Jump past every deadline and expire
        state.now = 1_000.0;
        update(&mut state, &config);

        let (left, right) = state.both_paddles_mut();
        let now = 1_000.0;
        assert_eq!(effective_speed(left, now), base_speed);
        assert_eq!(effective_height(right, left, now), base_height);
    }

    #[test]
    fn every_kind_round_trips_to_baseline() {
        for kind in PowerUpKind::ALL {
            let (mut state, config) = setup();
            let speed_before = effective_speed(state.paddle(Side::Left), state.now);
            let height_before = effective_height(
                state.paddle(Side::Left),
                state.paddle(Side::Right),
                state.now,
            );
            let mult_before = ball_speed_multiplier(&state.paddles, state.now);

            apply(&mut state, Side::Left, kind, &config);
            state.now = 1_000.0;
            update(&mut state, &config);

            let now = state.now;
            assert!(
                (effective_speed(state.paddle(Side::Left), now) - speed_before).abs() < 1e-6,
                "speed drifted after {kind:?}"
            );
            assert!(
                (effective_height(state.paddle(Side::Left), state.paddle(Side::Right), now)
                    - height_before)
                    .abs()
                    < 1e-6,
                "height drifted after {kind:?}"
            );
            assert!(
                (ball_speed_multiplier(&state.paddles, now) - mult_before).abs() < 1e-6,
                "ball speed multiplier drifted after {kind:?}"
            );
            assert!(state.paddles.iter().all(|p| p.active_power_ups.is_empty()));
        }
    }

    #[test]
    fn freeze_locks_the_opponent() {
        let (mut state, config) = setup();
        apply(&mut state, Side::Left, PowerUpKind::Freeze, &config);
        assert!(state.paddle(Side::Right).is_frozen(state.now + 0.1));
        assert!(!state.paddle(Side::Left).is_frozen(state.now + 0.1));
        assert!(!state.paddle(Side::Right).is_frozen(state.now + 100.0));
    }

    #[test]
    fn multi_ball_spawns_clones_and_expiry_removes_them() {
        let (mut state, config) = setup();
        apply(&mut state, Side::Left, PowerUpKind::MultiBall, &config);
        assert_eq!(state.balls.len(), 3);
        assert_eq!(state.balls.iter().filter(|b| b.clone).count(), 2);

        state.now = 1_000.0;
        update(&mut state, &config);
        assert_eq!(state.balls.len(), 1);
        assert!(!state.balls[0].clone);
    }

    #[test]
    fn obstacle_spawns_a_bumper_owned_by_the_activating_side() {
        let (mut state, config) = setup();
        apply(&mut state, Side::Right, PowerUpKind::Obstacle, &config);
        assert_eq!(state.obstacles.len(), 1);
        assert_eq!(state.obstacles[0].owner, Side::Right);

        state.now = 1_000.0;
        update(&mut state, &config);
        assert!(state.obstacles.is_empty());
    }

    #[test]
    fn expiry_emits_events() {
        let (mut state, config) = setup();
        apply(&mut state, Side::Left, PowerUpKind::Ghost, &config);
        state.drain_events();

        state.now = 1_000.0;
        update(&mut state, &config);
        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::PowerUpExpired {
                side: Side::Left,
                kind: PowerUpKind::Ghost
            }
        )));
    }

    #[test]
    fn pickups_credit_the_last_hitter() {
        let (mut state, config) = setup();
        let ball_pos = Vec3::new(5.0, 5.0, 0.0);
        if let Some(ball) = state.primary_ball_mut() {
            ball.pos = ball_pos;
            ball.last_hit_by = Some(Side::Right);
        }
        let id = state.next_entity_id();
        state.pickups.push(Pickup {
            id,
            kind: PowerUpKind::Giant,
            pos: ball_pos,
            expires_at: state.now + 10.0,
        });

        update(&mut state, &config);
        assert!(state.pickups.is_empty());
        assert!(
            state
                .paddle(Side::Right)
                .has_power_up(PowerUpKind::Giant, state.now)
        );
    }

    #[test]
    fn untouched_ball_leaves_pickups_in_place() {
        let (mut state, config) = setup();
        let ball_pos = Vec3::new(5.0, 5.0, 0.0);
        if let Some(ball) = state.primary_ball_mut() {
            ball.pos = ball_pos;
            ball.last_hit_by = None;
        }
        let id = state.next_entity_id();
        state.pickups.push(Pickup {
            id,
            kind: PowerUpKind::Giant,
            pos: ball_pos,
            expires_at: state.now + 10.0,
        });

        update(&mut state, &config);
        assert_eq!(state.pickups.len(), 1);
    }

    #[test]
    fn spawn_cadence_follows_the_configured_frequency() {
        let (mut state, config) = setup();
        state.pickups.clear();
        state.next_pickup_at = state.now;
        update(&mut state, &config);
        assert_eq!(state.pickups.len(), 1);
        assert!((state.next_pickup_at - (state.now + config.power_up_frequency)).abs() < 1e-6);
    }

    #[test]
    fn weighted_spawn_only_picks_configured_kinds() {
        let (mut state, mut config) = setup();
        let mut weights = std::collections::BTreeMap::new();
        weights.insert(PowerUpKind::Freeze, 1.0);
        config.per_type_spawn_chance = Some(weights);

        for _ in 0..20 {
            state.pickups.clear();
            state.next_pickup_at = state.now;
            update(&mut state, &config);
            assert_eq!(state.pickups[0].kind, PowerUpKind::Freeze);
        }
    }

    #[test]
    fn strength_factor_scales_away_from_neutral() {
        assert!(scaled_magnitude(PowerUpKind::Speed, 2.0) > scaled_magnitude(PowerUpKind::Speed, 1.0));
        assert!(scaled_magnitude(PowerUpKind::Shrink, 2.0) < scaled_magnitude(PowerUpKind::Shrink, 1.0));
        // A reducer can never invert
        assert!(scaled_magnitude(PowerUpKind::Shrink, 10.0) >= 0.1);
    }
}
