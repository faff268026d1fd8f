//! AI paddle control
//!
//! Emulates a human opponent rather than an aimbot: replans on a cadence
//! instead of every tick, aims at a linear extrapolation of the ball
//! (accounting for at most one wall bounce), and misjudges more as
//! difficulty drops. At difficulty 1.0 the prediction is exact and no
//! randomness is consumed.

use rand::Rng;

use crate::{GameConfig, reflect_into_band};

use super::state::MatchState;

/// Replan cadence across the difficulty range: 0.45 s at difficulty 0,
/// 0.10 s at difficulty 1
const REPLAN_MAX: f32 = 0.45;
const REPLAN_SPAN: f32 = 0.35;

/// Set the commanded direction for every AI paddle
pub fn drive_paddles(state: &mut MatchState, config: &GameConfig) {
    let now = state.now;
    let MatchState {
        paddles,
        balls,
        rng,
        ..
    } = state;

    for paddle in paddles.iter_mut() {
        if !paddle.is_ai {
            continue;
        }
        if paddle.is_frozen(now) {
            paddle.dir = 0.0;
            continue;
        }

        let side = paddle.side;
        // Most urgent incoming ball: the one reaching this paddle soonest
        let incoming = balls
            .iter()
            .filter(|b| b.vel.x * side.sign() > 0.0)
            .min_by(|a, b| {
                let ta = (paddle.pos.x - a.pos.x) / a.vel.x;
                let tb = (paddle.pos.x - b.pos.x) / b.vel.x;
                ta.partial_cmp(&tb).unwrap_or(std::cmp::Ordering::Equal)
            });

        let Some(ball) = incoming else {
            // Defensive idle: drift back toward center while no ball is
            // heading this way
            paddle.ai_target = 0.0;
            paddle.dir = steer(paddle.pos.y, 0.0, dead_zone(paddle.difficulty)) * 0.5;
            continue;
        };

        if now >= paddle.ai_replan_at {
            let t = ((paddle.pos.x - ball.pos.x) / ball.vel.x).max(0.0);
            let limit = config.half_height() - config.ball_radius;
            let predicted = reflect_into_band(ball.pos.y + ball.vel.y * t, limit);

            let error_amp = (1.0 - paddle.difficulty) * config.field_height * 0.25;
            let error = if error_amp > 0.0 {
                rng.random_range(-1.0..1.0) * error_amp
            } else {
                0.0
            };
            paddle.ai_target = predicted + error;

            let mut period = REPLAN_MAX - REPLAN_SPAN * paddle.difficulty;
            if paddle.difficulty < 1.0 {
                period += rng.random_range(0.0..0.1) * (1.0 - paddle.difficulty);
            }
            paddle.ai_replan_at = now + period;
        }

        paddle.dir = steer(paddle.pos.y, paddle.ai_target, dead_zone(paddle.difficulty));
    }
}

/// Distance the target must exceed before the paddle bothers to move;
/// sloppier at low difficulty
fn dead_zone(difficulty: f32) -> f32 {
    0.5 + (1.0 - difficulty.clamp(0.0, 1.0)) * 2.5
}

fn steer(y: f32, target: f32, dead_zone: f32) -> f32 {
    let delta = target - y;
    if delta.abs() <= dead_zone {
        0.0
    } else {
        delta.signum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{MatchPhase, Side};
    use glam::Vec3;

    fn setup(difficulty: f32) -> (MatchState, GameConfig) {
        let config = GameConfig {
            left_is_ai: true,
            right_is_ai: true,
            left_difficulty: difficulty,
            right_difficulty: difficulty,
            ..Default::default()
        };
        let mut state = MatchState::new(11, &config);
        state.phase = MatchPhase::Playing;
        state.reset_for_match(&config);
        (state, config)
    }

    fn aim_ball_at(state: &mut MatchState, pos: Vec3, vel: Vec3) {
        let ball = state.primary_ball_mut().unwrap();
        ball.pos = pos;
        ball.vel = vel;
        ball.speed = vel.length();
    }

    #[test]
    fn perfect_ai_predicts_the_exact_intercept() {
        let (mut state, config) = setup(1.0);
        // Straight shot at the right paddle, no bounce involved
        aim_ball_at(&mut state, Vec3::new(0.0, 4.0, 0.0), Vec3::new(40.0, 8.0, 0.0));

        drive_paddles(&mut state, &config);

        let paddle = state.paddle(Side::Right);
        let t = (paddle.pos.x - 0.0) / 40.0;
        let expected = 4.0 + 8.0 * t;
        assert!(
            (paddle.ai_target - expected).abs() < 1e-4,
            "no error offset at difficulty 1.0"
        );
        assert_eq!(paddle.dir, 1.0, "target is above, so the paddle moves up");
    }

    #[test]
    fn prediction_folds_one_wall_bounce() {
        let (mut state, config) = setup(1.0);
        // Steep shot that must clip the top wall before arriving
        aim_ball_at(&mut state, Vec3::new(0.0, 20.0, 0.0), Vec3::new(30.0, 30.0, 0.0));

        drive_paddles(&mut state, &config);

        let paddle = state.paddle(Side::Right);
        let t = paddle.pos.x / 30.0;
        let raw = 20.0 + 30.0 * t;
        let limit = config.half_height() - config.ball_radius;
        assert!(raw > limit, "test setup must overshoot the wall");
        let expected = 2.0 * limit - raw;
        assert!((paddle.ai_target - expected).abs() < 1e-4);
    }

    #[test]
    fn replan_waits_for_the_cadence() {
        let (mut state, config) = setup(1.0);
        aim_ball_at(&mut state, Vec3::new(0.0, 0.0, 0.0), Vec3::new(40.0, 5.0, 0.0));
        drive_paddles(&mut state, &config);
        let first_target = state.paddle(Side::Right).ai_target;

        // Ball shifts but the cadence has not elapsed
        aim_ball_at(&mut state, Vec3::new(0.0, -10.0, 0.0), Vec3::new(40.0, -5.0, 0.0));
        state.now += 0.05;
        drive_paddles(&mut state, &config);
        assert_eq!(state.paddle(Side::Right).ai_target, first_target);

        // Past the deadline the plan refreshes
        state.now += 0.1;
        drive_paddles(&mut state, &config);
        assert_ne!(state.paddle(Side::Right).ai_target, first_target);
    }

    #[test]
    fn dead_zone_suppresses_twitching() {
        let (mut state, config) = setup(1.0);
        aim_ball_at(&mut state, Vec3::new(0.0, 0.3, 0.0), Vec3::new(40.0, 0.0, 0.0));

        drive_paddles(&mut state, &config);
        assert_eq!(
            state.paddle(Side::Right).dir,
            0.0,
            "targets inside the dead zone do not move the paddle"
        );
    }

    #[test]
    fn frozen_ai_does_not_act() {
        let (mut state, config) = setup(1.0);
        aim_ball_at(&mut state, Vec3::new(0.0, 20.0, 0.0), Vec3::new(40.0, 0.0, 0.0));
        let frozen_until = state.now + 5.0;
        state.paddle_mut(Side::Right).frozen_until = frozen_until;

        drive_paddles(&mut state, &config);
        assert_eq!(state.paddle(Side::Right).dir, 0.0);
    }

    #[test]
    fn idles_toward_center_when_ball_moves_away() {
        let (mut state, config) = setup(1.0);
        aim_ball_at(&mut state, Vec3::new(0.0, 0.0, 0.0), Vec3::new(40.0, 0.0, 0.0));
        state.paddle_mut(Side::Left).pos.y = 15.0;

        drive_paddles(&mut state, &config);
        let paddle = state.paddle(Side::Left);
        assert_eq!(paddle.dir, -0.5, "defensive drift runs at half input");
    }

    #[test]
    fn low_difficulty_error_stays_within_its_amplitude() {
        for seed_offset in 0..10u64 {
            let config = GameConfig {
                right_is_ai: true,
                right_difficulty: 0.2,
                ..Default::default()
            };
            let mut state = MatchState::new(100 + seed_offset, &config);
            state.phase = MatchPhase::Playing;
            state.reset_for_match(&config);
            aim_ball_at(&mut state, Vec3::new(0.0, 0.0, 0.0), Vec3::new(40.0, 0.0, 0.0));

            drive_paddles(&mut state, &config);

            let paddle = state.paddle(Side::Right);
            let t = paddle.pos.x / 40.0;
            let predicted = 0.0 + 0.0 * t;
            let amp = (1.0 - 0.2) * config.field_height * 0.25;
            assert!((paddle.ai_target - predicted).abs() <= amp + 1e-4);
        }
    }

    #[test]
    fn human_paddles_are_left_alone() {
        let config = GameConfig {
            left_is_ai: false,
            right_is_ai: true,
            ..Default::default()
        };
        let mut state = MatchState::new(5, &config);
        state.phase = MatchPhase::Playing;
        state.reset_for_match(&config);
        state.paddle_mut(Side::Left).dir = 0.77;

        drive_paddles(&mut state, &config);
        assert_eq!(state.paddle(Side::Left).dir, 0.77);
    }
}
