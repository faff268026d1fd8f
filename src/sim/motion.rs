//! Collision and motion engine
//!
//! Advances paddles and balls by one tick: integration, wall and bumper
//! bounces, paddle contacts with angle deflection and rally acceleration,
//! and goal-line crossing detection. Crossings are reported to the match
//! state machine, never resolved here.

use std::f32::consts::FRAC_PI_4;

use glam::Vec3;

use crate::GameConfig;
use crate::consts::{STUCK_EPSILON, STUCK_TICKS};

use super::powerups;
use super::state::{Ball, GameEvent, MatchState, Obstacle, PowerUpKind, Side};

/// Maximum deflection angle a paddle edge imparts (~45 degrees)
const MAX_DEFLECTION: f32 = 0.785;
/// Share of the paddle's own motion transferred to the ball
const PADDLE_INFLUENCE: f32 = 0.3;

/// A ball crossed a goal line this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalCrossing {
    pub ball_id: u32,
    pub scorer: Side,
}

/// Move paddles along their free axis and clamp to the playable band
///
/// Runs in `Playing` and `PointTransition`; the commanded direction has
/// already been set from input or AI.
pub fn step_paddles(state: &mut MatchState, config: &GameConfig, dt: f32) {
    let now = state.now;
    let heights = [
        powerups::effective_height(&state.paddles[0], &state.paddles[1], now),
        powerups::effective_height(&state.paddles[1], &state.paddles[0], now),
    ];
    // Mirror on the opponent inverts this paddle's controls
    let mirrored = [
        state.paddles[1].has_power_up(PowerUpKind::Mirror, now),
        state.paddles[0].has_power_up(PowerUpKind::Mirror, now),
    ];

    for (idx, paddle) in state.paddles.iter_mut().enumerate() {
        let mut dir = crate::clamp_axis(paddle.dir);
        if paddle.is_frozen(now) {
            dir = 0.0;
        } else if mirrored[idx] {
            dir = -dir;
        }

        let speed = powerups::effective_speed(paddle, now);
        let limit = (config.half_height() - heights[idx] / 2.0).max(0.0);
        let new_y = (paddle.pos.y + dir * speed * dt).clamp(-limit, limit);
        if new_y.is_finite() {
            paddle.pos.y = new_y;
        } else {
            log::error!("rejected non-finite position for {:?} paddle", paddle.side);
        }
    }
}

/// Integrate balls and resolve contacts; returns goal crossings for the
/// match state machine. `Playing` only.
pub fn step_balls(state: &mut MatchState, config: &GameConfig, dt: f32) -> Vec<GoalCrossing> {
    let now = state.now;
    let MatchState {
        paddles,
        balls,
        obstacles,
        events,
        ..
    } = state;

    let time_scale = powerups::time_scale(paddles, now);
    let speed_mult = powerups::ball_speed_multiplier(paddles, now);
    let gravity: f32 = paddles
        .iter()
        .filter_map(|p| p.power_up(PowerUpKind::Gravity, now))
        .map(|pu| pu.magnitude)
        .sum();
    let magnet_pulls: Vec<(Side, f32, f32)> = paddles
        .iter()
        .filter_map(|p| {
            p.power_up(PowerUpKind::Magnet, now)
                .map(|pu| (p.side, pu.magnitude, p.pos.y))
        })
        .collect();
    let heights = [
        powerups::effective_height(&paddles[0], &paddles[1], now),
        powerups::effective_height(&paddles[1], &paddles[0], now),
    ];

    let mut crossings = Vec::new();

    for ball in balls.iter_mut() {
        // Goal lines are evaluated on the position the previous tick left
        // behind, the way the original frame loop does: a ball past the
        // line always scores before anything can move it back. A shield on
        // the defender bounces the ball back into play once instead.
        if ball.pos.x <= -config.half_width() {
            if paddles[Side::Left.index()].has_power_up(PowerUpKind::Shield, now) {
                paddles[Side::Left.index()].consume(PowerUpKind::Shield);
                ball.vel.x = ball.vel.x.abs();
                ball.pos.x = -config.half_width() + config.ball_radius;
                events.push(GameEvent::PowerUpExpired {
                    side: Side::Left,
                    kind: PowerUpKind::Shield,
                });
            } else {
                crossings.push(GoalCrossing {
                    ball_id: ball.id,
                    scorer: Side::Right,
                });
                continue;
            }
        } else if ball.pos.x >= config.half_width() {
            if paddles[Side::Right.index()].has_power_up(PowerUpKind::Shield, now) {
                paddles[Side::Right.index()].consume(PowerUpKind::Shield);
                ball.vel.x = -ball.vel.x.abs();
                ball.pos.x = config.half_width() - config.ball_radius;
                events.push(GameEvent::PowerUpExpired {
                    side: Side::Right,
                    kind: PowerUpKind::Shield,
                });
            } else {
                crossings.push(GoalCrossing {
                    ball_id: ball.id,
                    scorer: Side::Left,
                });
                continue;
            }
        }

        let prev_pos = ball.pos;
        let prev_vel = ball.vel;
        let prev_speed = ball.speed;
        let dtb = dt * time_scale;

        // Field effects steer, then renormalization keeps the rally pace:
        // gravity and magnets bend the path without changing its speed
        if gravity > 0.0 {
            ball.vel.y -= gravity * dtb;
        }
        for &(side, magnitude, paddle_y) in &magnet_pulls {
            if ball.vel.x * side.sign() > 0.0 {
                let dy = paddle_y - ball.pos.y;
                ball.vel.y += dy.clamp(-1.0, 1.0) * magnitude * dtb;
            }
        }
        let target_speed = ball.speed * speed_mult;
        if ball.vel.length_squared() > 0.0 && target_speed > 0.0 {
            ball.vel = ball.vel.normalize() * target_speed;
        }

        ball.pos += ball.vel * dtb;

        // Wall bounce on the Y extents; clamp prevents escape and sticking
        let wall = config.half_height() - config.ball_radius;
        if ball.pos.y >= wall {
            ball.pos.y = wall;
            ball.vel.y = -ball.vel.y.abs();
            events.push(GameEvent::WallBounce);
        } else if ball.pos.y <= -wall {
            ball.pos.y = -wall;
            ball.vel.y = ball.vel.y.abs();
            events.push(GameEvent::WallBounce);
        }

        for obstacle in obstacles.iter() {
            if resolve_obstacle(ball, obstacle, config.ball_radius) {
                events.push(GameEvent::WallBounce);
            }
        }

        // Paddle contacts
        for side in Side::BOTH {
            // Ghost on the opponent lets the ball phase through this paddle
            if powerups::ball_ghosts_through(paddles, side, now) {
                continue;
            }
            // Only bounce balls moving toward the paddle
            if ball.vel.x * side.sign() <= 0.0 {
                continue;
            }

            let idx = side.index();
            let paddle_x = paddles[idx].pos.x;
            let paddle_y = paddles[idx].pos.y;
            let paddle_dir = paddles[idx].dir;
            let paddle_speed = powerups::effective_speed(&paddles[idx], now);
            let half_h = heights[idx] / 2.0;
            let half_w = config.paddle_width / 2.0;

            // Positive comparisons so a corrupted (NaN) coordinate can
            // never register as a hit
            let dx = (ball.pos.x - paddle_x).abs();
            let dy = (ball.pos.y - paddle_y).abs();
            if !(dx < half_w + config.ball_radius && dy < half_h + config.ball_radius) {
                continue;
            }

            // Rally acceleration, capped
            ball.speed = (ball.speed + config.ball_speed_increment).min(config.max_ball_speed());

            let away = -side.sign();
            if paddles[idx].has_power_up(PowerUpKind::SuperShot, now) {
                // Flat return at the cap; the shot is consumed by use
                ball.speed = config.max_ball_speed();
                ball.vel = Vec3::new(away * ball.speed * speed_mult, 0.0, 0.0);
                paddles[idx].consume(PowerUpKind::SuperShot);
                events.push(GameEvent::PowerUpExpired {
                    side,
                    kind: PowerUpKind::SuperShot,
                });
            } else {
                // Deflect by contact offset, plus a share of paddle motion
                let hit_rel = ((ball.pos.y - paddle_y) / half_h).clamp(-1.0, 1.0);
                let new_speed = ball.speed * speed_mult;
                let y_deflection = hit_rel * MAX_DEFLECTION * new_speed;
                let influence = paddle_dir * paddle_speed * PADDLE_INFLUENCE;
                let vel = Vec3::new(away * new_speed, y_deflection + influence, 0.0);
                ball.vel = vel.normalize() * new_speed;
            }

            // Push out of the paddle volume
            ball.pos.x = paddle_x + away * (half_w + config.ball_radius);
            ball.last_hit_by = Some(side);
            events.push(GameEvent::PaddleHit { side });
            break;
        }

        // Anything non-finite keeps the prior valid state
        if !ball.pos.is_finite() || !ball.vel.is_finite() || !ball.speed.is_finite() {
            log::error!("rejected non-finite state for ball {}", ball.id);
            ball.pos = prev_pos;
            ball.vel = prev_vel;
            ball.speed = prev_speed;
        }

        watchdog(ball, config, events);
    }

    crossings
}

/// Stuck-ball watchdog: a ball that has not moved on either relevant axis
/// for more than the threshold is forced back into play with a known-good
/// diagonal. Recoverable by design; logged, never fatal.
fn watchdog(ball: &mut Ball, config: &GameConfig, events: &mut Vec<GameEvent>) {
    let moved_x = (ball.pos.x - ball.last_pos.x).abs() >= STUCK_EPSILON;
    let moved_y = (ball.pos.y - ball.last_pos.y).abs() >= STUCK_EPSILON;
    if moved_x || moved_y {
        ball.stuck_ticks = 0;
    } else {
        ball.stuck_ticks += 1;
        if ball.stuck_ticks > STUCK_TICKS {
            log::warn!(
                "ball {} motionless for {} ticks, forcing reset",
                ball.id,
                ball.stuck_ticks
            );
            let speed = config.base_ball_speed;
            ball.pos = Vec3::ZERO;
            ball.vel = Vec3::new(FRAC_PI_4.cos() * speed, FRAC_PI_4.sin() * speed, 0.0);
            ball.speed = speed;
            ball.stuck_ticks = 0;
            events.push(GameEvent::BallRecovered);
        }
    }
    ball.last_pos = ball.pos;
}

/// Reflect a ball off a bumper along the axis of least penetration
fn resolve_obstacle(ball: &mut Ball, obstacle: &Obstacle, radius: f32) -> bool {
    let dx = ball.pos.x - obstacle.pos.x;
    let dy = ball.pos.y - obstacle.pos.y;
    let pen_x = obstacle.half.x + radius - dx.abs();
    let pen_y = obstacle.half.y + radius - dy.abs();
    if pen_x <= 0.0 || pen_y <= 0.0 {
        return false;
    }

    if pen_x < pen_y {
        ball.vel.x = ball.vel.x.abs() * dx.signum();
        ball.pos.x = obstacle.pos.x + dx.signum() * (obstacle.half.x + radius);
    } else {
        ball.vel.y = ball.vel.y.abs() * dy.signum();
        ball.pos.y = obstacle.pos.y + dy.signum() * (obstacle.half.y + radius);
    }
    true
}
