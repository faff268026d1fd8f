//! Match state and core simulation types
//!
//! All state the simulation mutates lives here. Everything is plain data:
//! the tick owns the whole struct for the duration of a frame and the host
//! reads snapshots between ticks.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::GameConfig;

/// Which goal line a paddle defends
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn opponent(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Sign of this side's goal line on the X axis
    pub fn sign(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// Current phase of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchPhase {
    /// Attract screen; nothing simulates
    Menu,
    /// Active gameplay
    Playing,
    /// Gameplay suspended; the sim clock is frozen so every stored deadline
    /// keeps its remaining duration across the pause
    Paused,
    /// Brief gap between a point and the next serve
    PointTransition,
    /// Match decided
    Finished,
}

/// The fixed power-up roster
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum PowerUpKind {
    /// Own paddle moves faster
    Speed,
    /// Ball travels faster while held
    BallSpeed,
    /// Opponent's paddle gets shorter
    Shrink,
    /// One goal against the holder bounces back instead of scoring
    Shield,
    /// Incoming balls curve toward the holder's paddle
    Magnet,
    /// Own paddle gets taller
    Giant,
    /// Ball phases through the opponent's paddle
    Ghost,
    /// Two extra balls join the rally
    MultiBall,
    /// Opponent's controls lock up briefly
    Freeze,
    /// Balls sag toward the floor wall
    Gravity,
    /// Ball time runs slower
    TimeSlow,
    /// Ball jumps to a random lateral position
    Teleport,
    /// Next return from the holder's paddle is a flat, max-speed shot
    SuperShot,
    /// Opponent's controls invert
    Mirror,
    /// A bumper appears in midfield
    Obstacle,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 15] = [
        PowerUpKind::Speed,
        PowerUpKind::BallSpeed,
        PowerUpKind::Shrink,
        PowerUpKind::Shield,
        PowerUpKind::Magnet,
        PowerUpKind::Giant,
        PowerUpKind::Ghost,
        PowerUpKind::MultiBall,
        PowerUpKind::Freeze,
        PowerUpKind::Gravity,
        PowerUpKind::TimeSlow,
        PowerUpKind::Teleport,
        PowerUpKind::SuperShot,
        PowerUpKind::Mirror,
        PowerUpKind::Obstacle,
    ];
}

/// A timed effect held by one paddle
///
/// Unique by kind within a paddle: re-acquiring a kind refreshes `until` and
/// `magnitude` instead of stacking. Attribute modifiers are recomputed from
/// the active set every use, so expiry restores baselines exactly.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ActivePowerUp {
    pub kind: PowerUpKind,
    /// Sim-time deadline after which the effect is gone
    pub until: f32,
    /// Effect strength; multiplier for attribute effects, acceleration for
    /// field effects, unused for markers
    pub magnitude: f32,
}

impl ActivePowerUp {
    pub fn remaining(&self, now: f32) -> f32 {
        (self.until - now).max(0.0)
    }
}

/// One player's paddle
#[derive(Debug, Clone, Serialize)]
pub struct Paddle {
    pub side: Side,
    /// Only Y moves; X is the fixed defense line, Z is cosmetic
    pub pos: Vec3,
    /// Commanded direction in [-1, 1], from input or AI
    pub dir: f32,
    /// Base movement rate; effective rate also folds in active power-ups
    pub speed: f32,
    /// Base Y extent; effective extent also folds in active power-ups
    pub height: f32,
    pub score: u32,
    pub is_ai: bool,
    /// AI skill on a 0-1 scale
    pub difficulty: f32,
    pub active_power_ups: Vec<ActivePowerUp>,
    /// Control lockout deadline (sim time); 0 when never frozen
    pub frozen_until: f32,
    /// AI working state: current target Y and the next replan deadline
    #[serde(skip)]
    pub ai_target: f32,
    #[serde(skip)]
    pub ai_replan_at: f32,
}

impl Paddle {
    pub fn new(side: Side, config: &GameConfig) -> Self {
        Self {
            side,
            pos: Vec3::new(config.paddle_x(side), 0.0, 0.0),
            dir: 0.0,
            speed: config.paddle_speed,
            height: config.paddle_height,
            score: 0,
            is_ai: config.is_ai(side),
            difficulty: config.difficulty(side),
            active_power_ups: Vec::new(),
            frozen_until: 0.0,
            ai_target: 0.0,
            ai_replan_at: 0.0,
        }
    }

    pub fn is_frozen(&self, now: f32) -> bool {
        self.frozen_until > now
    }

    /// The active effect of `kind`, if it has not expired yet
    pub fn power_up(&self, kind: PowerUpKind, now: f32) -> Option<&ActivePowerUp> {
        self.active_power_ups
            .iter()
            .find(|pu| pu.kind == kind && pu.until > now)
    }

    pub fn has_power_up(&self, kind: PowerUpKind, now: f32) -> bool {
        self.power_up(kind, now).is_some()
    }

    /// Insert or refresh an effect (unique by kind)
    pub fn activate(&mut self, kind: PowerUpKind, until: f32, magnitude: f32) {
        if let Some(existing) = self.active_power_ups.iter_mut().find(|pu| pu.kind == kind) {
            existing.until = until;
            existing.magnitude = magnitude;
        } else {
            self.active_power_ups.push(ActivePowerUp {
                kind,
                until,
                magnitude,
            });
        }
    }

    /// Drop an effect before its deadline (shield consumed, super shot fired)
    pub fn consume(&mut self, kind: PowerUpKind) {
        self.active_power_ups.retain(|pu| pu.kind != kind);
    }

    /// Reset between matches; score and effects go, identity stays
    pub fn reset(&mut self, config: &GameConfig) {
        self.pos = Vec3::new(config.paddle_x(self.side), 0.0, 0.0);
        self.dir = 0.0;
        self.speed = config.paddle_speed;
        self.height = config.paddle_height;
        self.score = 0;
        self.is_ai = config.is_ai(self.side);
        self.difficulty = config.difficulty(self.side);
        self.active_power_ups.clear();
        self.frozen_until = 0.0;
        self.ai_target = 0.0;
        self.ai_replan_at = 0.0;
    }
}

/// A ball entity
#[derive(Debug, Clone, Serialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec3,
    pub vel: Vec3,
    /// Rally magnitude target; grows on paddle hits, resets each point
    pub speed: f32,
    /// Multi-ball clones disappear when the effect ends or a point is scored
    pub clone: bool,
    /// Side whose paddle touched this ball last; credited with pickups
    pub last_hit_by: Option<Side>,
    /// Stuck watchdog bookkeeping
    #[serde(skip)]
    pub stuck_ticks: u32,
    #[serde(skip)]
    pub last_pos: Vec3,
}

impl Ball {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            pos: Vec3::ZERO,
            vel: Vec3::ZERO,
            speed: 0.0,
            clone: false,
            last_hit_by: None,
            stuck_ticks: 0,
            last_pos: Vec3::ZERO,
        }
    }

    /// Park the ball at center with no motion (between points)
    pub fn park(&mut self, base_speed: f32) {
        self.pos = Vec3::ZERO;
        self.vel = Vec3::ZERO;
        self.speed = base_speed;
        self.last_hit_by = None;
        self.stuck_ticks = 0;
        self.last_pos = Vec3::ZERO;
    }
}

/// A spawned power-up waiting on the field to be collected by a ball
#[derive(Debug, Clone, Serialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec3,
    /// Despawn deadline for uncollected pickups
    pub expires_at: f32,
}

/// A midfield bumper spawned by the obstacle power-up
#[derive(Debug, Clone, Serialize)]
pub struct Obstacle {
    pub id: u32,
    pub owner: Side,
    pub pos: Vec3,
    /// Half extents of the AABB
    pub half: Vec3,
    pub until: f32,
}

/// Discrete events the host consumes each frame (score display, sound cues,
/// persistence). The core never waits on the sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    ScoreChanged { side: Side, score: u32 },
    PointScored { side: Side },
    MatchFinished { winner: Side },
    PowerUpActivated { side: Side, kind: PowerUpKind },
    PowerUpExpired { side: Side, kind: PowerUpKind },
    PickupSpawned { kind: PowerUpKind },
    WallBounce,
    PaddleHit { side: Side },
    /// Stuck-ball watchdog fired; recoverable, already logged
    BallRecovered,
}

/// Complete match state
#[derive(Debug, Clone, Serialize)]
pub struct MatchState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Gameplay RNG (serve angles, AI error, pickup spawns)
    #[serde(skip)]
    pub rng: Pcg32,
    pub phase: MatchPhase,
    /// Sim clock in seconds; advances only while the match runs, which is
    /// what keeps timed effects honest across pauses
    pub now: f32,
    pub paddles: [Paddle; 2],
    /// Sorted by id for deterministic iteration
    pub balls: Vec<Ball>,
    pub pickups: Vec<Pickup>,
    pub obstacles: Vec<Obstacle>,
    /// Next pickup spawn deadline
    pub next_pickup_at: f32,
    /// Serve deadline while in `PointTransition`
    pub point_resume_at: f32,
    /// Sim time the current match started (for match duration reporting)
    pub match_started_at: f32,
    pub winner: Option<Side>,
    /// Events accumulated since the host last drained them
    pub events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl MatchState {
    /// Create a fresh state sitting in the menu
    pub fn new(seed: u64, config: &GameConfig) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: MatchPhase::Menu,
            now: 0.0,
            paddles: [Paddle::new(Side::Left, config), Paddle::new(Side::Right, config)],
            balls: Vec::new(),
            pickups: Vec::new(),
            obstacles: Vec::new(),
            next_pickup_at: 0.0,
            point_resume_at: 0.0,
            match_started_at: 0.0,
            winner: None,
            events: Vec::new(),
            next_id: 1,
        };

        let id = state.next_entity_id();
        let mut ball = Ball::new(id);
        ball.park(config.base_ball_speed);
        state.balls.push(ball);

        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn paddle(&self, side: Side) -> &Paddle {
        &self.paddles[side.index()]
    }

    pub fn paddle_mut(&mut self, side: Side) -> &mut Paddle {
        &mut self.paddles[side.index()]
    }

    /// Mutable access to both paddles at once, left first
    pub fn both_paddles_mut(&mut self) -> (&mut Paddle, &mut Paddle) {
        let (left, right) = self.paddles.split_at_mut(1);
        (&mut left[0], &mut right[0])
    }

    /// The original (non-clone) ball
    pub fn primary_ball(&self) -> Option<&Ball> {
        self.balls.iter().find(|b| !b.clone)
    }

    pub fn primary_ball_mut(&mut self) -> Option<&mut Ball> {
        self.balls.iter_mut().find(|b| !b.clone)
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Hand the accumulated events to the host
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Ensure entity collections stay sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.balls.sort_by_key(|b| b.id);
        self.pickups.sort_by_key(|p| p.id);
        self.obstacles.sort_by_key(|o| o.id);
    }

    /// Reset for a new match; keeps the RNG stream running
    pub fn reset_for_match(&mut self, config: &GameConfig) {
        for paddle in &mut self.paddles {
            paddle.reset(config);
        }
        self.balls.clear();
        let id = self.next_entity_id();
        let mut ball = Ball::new(id);
        ball.park(config.base_ball_speed);
        self.balls.push(ball);
        self.pickups.clear();
        self.obstacles.clear();
        self.next_pickup_at = self.now + config.power_up_frequency;
        self.point_resume_at = 0.0;
        self.match_started_at = self.now;
        self.winner = None;
    }
}
