//! Match state machine and the per-frame tick
//!
//! The tick owns all entity state for the duration of a frame: inputs and AI
//! set paddle intents, the power-up manager runs its lifecycle, the motion
//! engine integrates and reports goal crossings, and the state machine
//! resolves them into points, transitions, and events for the host.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use rand::Rng;

use crate::GameConfig;
use crate::clamp_axis;
use crate::consts::{MAX_DT, POINT_TRANSITION_SECS};

use super::state::{GameEvent, MatchPhase, MatchState, Side};
use super::{ai, motion, powerups};

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Human paddle axes in [-1, 1]; ignored for AI-driven paddles
    pub left_axis: f32,
    pub right_axis: f32,
    /// Start a match from the menu, or a rematch from the result screen
    pub start: bool,
    /// Pause toggle (only honored during play)
    pub pause: bool,
    /// Abandon the match and return to the menu
    pub to_menu: bool,
}

/// Advance the match by one frame
///
/// `dt` is wall-clock seconds since the previous tick. Malformed deltas skip
/// the tick without mutating anything; oversized deltas (inactive tab) are
/// clamped to [`MAX_DT`].
pub fn tick(state: &mut MatchState, input: &TickInput, config: &GameConfig, dt: f32) {
    if !dt.is_finite() || dt <= 0.0 {
        return;
    }
    let dt = dt.min(MAX_DT);

    if input.to_menu && state.phase != MatchPhase::Menu {
        log::info!("returning to menu");
        state.phase = MatchPhase::Menu;
        return;
    }

    match state.phase {
        MatchPhase::Menu => {
            if input.start {
                start_match(state, config);
            }
        }

        MatchPhase::Paused => {
            // The sim clock is frozen here, so every stored deadline keeps
            // its remaining duration until play resumes
            if input.pause {
                log::info!("resumed");
                state.phase = MatchPhase::Playing;
            }
        }

        MatchPhase::Finished => {
            if input.start {
                start_match(state, config);
            }
        }

        MatchPhase::Playing => {
            if input.pause {
                log::info!("paused");
                state.phase = MatchPhase::Paused;
                return;
            }

            state.now += dt;
            apply_inputs(state, input);
            ai::drive_paddles(state, config);
            powerups::update(state, config);
            motion::step_paddles(state, config, dt);
            let crossings = motion::step_balls(state, config, dt);

            // One point per tick; the transition resets every ball anyway
            if let Some(crossing) = crossings.first() {
                score_point(state, crossing.scorer, config);
            }
        }

        MatchPhase::PointTransition => {
            state.now += dt;
            // Paddles keep repositioning and effects keep aging during the
            // gap; balls stay parked
            apply_inputs(state, input);
            ai::drive_paddles(state, config);
            powerups::update(state, config);
            motion::step_paddles(state, config, dt);

            if state.now >= state.point_resume_at {
                serve(state, config);
                state.phase = MatchPhase::Playing;
            }
        }
    }

    state.normalize_order();
}

/// Copy human input axes onto their paddles
fn apply_inputs(state: &mut MatchState, input: &TickInput) {
    let (left, right) = state.both_paddles_mut();
    if !left.is_ai {
        left.dir = clamp_axis(input.left_axis);
    }
    if !right.is_ai {
        right.dir = clamp_axis(input.right_axis);
    }
}

/// Reset everything and launch the first serve
fn start_match(state: &mut MatchState, config: &GameConfig) {
    state.reset_for_match(config);
    for side in Side::BOTH {
        state.emit(GameEvent::ScoreChanged { side, score: 0 });
    }
    serve(state, config);
    state.phase = MatchPhase::Playing;
    log::info!("match started, first to {}", config.max_points);
}

/// Relaunch the primary ball from center with a randomized angle and
/// direction, rally speed back at base
fn serve(state: &mut MatchState, config: &GameConfig) {
    let angle = (state.rng.random::<f32>() - 0.5) * FRAC_PI_2;
    let toward: f32 = if state.rng.random::<bool>() { 1.0 } else { -1.0 };
    let base = config.base_ball_speed;
    if let Some(ball) = state.primary_ball_mut() {
        ball.pos = Vec3::ZERO;
        ball.vel = Vec3::new(angle.cos() * base * toward, angle.sin() * base / 2.0, 0.0);
        ball.speed = base;
        ball.last_hit_by = None;
        ball.stuck_ticks = 0;
        ball.last_pos = ball.pos;
    }
}

/// Resolve a goal crossing into a point, a transition, or the end of the
/// match
fn score_point(state: &mut MatchState, scorer: Side, config: &GameConfig) {
    let score = {
        let paddle = state.paddle_mut(scorer);
        paddle.score += 1;
        paddle.score
    };
    state.emit(GameEvent::PointScored { side: scorer });
    state.emit(GameEvent::ScoreChanged {
        side: scorer,
        score,
    });
    log::info!("{:?} scores, {}", scorer, score);

    // Clones never survive a point
    state.balls.retain(|b| !b.clone);
    let base = config.base_ball_speed;
    if let Some(ball) = state.primary_ball_mut() {
        ball.park(base);
    }

    if score >= config.max_points {
        state.winner = Some(scorer);
        state.phase = MatchPhase::Finished;
        state.emit(GameEvent::MatchFinished { winner: scorer });
        log::info!("match finished, {:?} wins", scorer);
    } else {
        state.point_resume_at = state.now + POINT_TRANSITION_SECS;
        state.phase = MatchPhase::PointTransition;
    }
}
