use rand::Rng;
use serde::{Deserialize, Serialize};

use unlock_core::geometry::Rect;

/// Playfield width in logical units.
pub const FIELD_WIDTH: f32 = 520.0;
pub const FIELD_HEIGHT: f32 = 220.0;
/// Y of the ground line; y grows downward.
pub const GROUND_Y: f32 = 175.0;
pub const PLAYER_X: f32 = 80.0;
pub const PLAYER_WIDTH: f32 = 34.0;
pub const PLAYER_HEIGHT: f32 = 38.0;
/// Initial vertical velocity of a jump (negative is up).
pub const JUMP_VELOCITY: f32 = -720.0;
pub const GRAVITY: f32 = 1800.0;
pub const START_SPEED: f32 = 210.0;
/// Speed gained per second of running.
pub const SPEED_RAMP: f32 = 4.0;
pub const OBSTACLE_WIDTH: f32 = 18.0;
pub const OBSTACLE_HEIGHT: f32 = 28.0;
/// Obstacles spawn this far past the right edge.
const SPAWN_OFFSET: f32 = 30.0;
/// Obstacles are dropped once fully this far past the left edge.
const CULL_MARGIN: f32 = 10.0;
/// Spawn interval jitter, as a multiplier range.
const SPAWN_JITTER: std::ops::Range<f32> = 0.55..1.45;
/// Speed at which score accrues at exactly `score_rate`.
const SCORE_REFERENCE_SPEED: f32 = 240.0;
/// Longest frame the simulation will integrate in one step.
pub const MAX_STEP_DT: f32 = 0.033;

/// Tunables that invites may override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerParams {
    pub win_score: f32,
    /// Score per second at the reference speed.
    pub score_rate: f32,
    /// Mean seconds between obstacle spawns.
    pub spawn_every: f32,
    pub start_speed: f32,
    pub speed_ramp: f32,
    pub jump_velocity: f32,
    pub gravity: f32,
}

impl Default for RunnerParams {
    fn default() -> Self {
        Self {
            win_score: 250.0,
            score_rate: 10.0,
            spawn_every: 1.4,
            start_speed: START_SPEED,
            speed_ramp: SPEED_RAMP,
            jump_velocity: JUMP_VELOCITY,
            gravity: GRAVITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Top edge.
    pub y: f32,
    pub vy: f32,
    pub on_ground: bool,
}

impl Player {
    fn standing() -> Self {
        Self {
            y: GROUND_Y - PLAYER_HEIGHT,
            vy: 0.0,
            on_ground: true,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(PLAYER_X, self.y, PLAYER_WIDTH, PLAYER_HEIGHT)
    }

    /// Collision box: trimmed 8 on the left, top and right, 2 at the feet.
    pub fn hitbox(&self) -> Rect {
        self.rect().inset(8.0, 8.0, 8.0, 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Obstacle {
    fn spawn() -> Self {
        Self {
            x: FIELD_WIDTH + SPAWN_OFFSET,
            y: GROUND_Y - OBSTACLE_HEIGHT,
            w: OBSTACLE_WIDTH,
            h: OBSTACLE_HEIGHT,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    pub fn hitbox(&self) -> Rect {
        self.rect().inset(2.0, 2.0, 2.0, 2.0)
    }
}

/// Everything that changes during one run. Reset at run start and advanced
/// by [`step`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerModel {
    /// Seconds since the run started.
    pub t: f32,
    pub speed: f32,
    pub score: f32,
    pub player: Player,
    pub obstacles: Vec<Obstacle>,
    pub spawn_timer: f32,
    /// Interval until the next spawn, rolled when the previous one spawned.
    pub next_spawn: f32,
}

impl RunnerModel {
    pub fn new(params: &RunnerParams, rng: &mut impl Rng) -> Self {
        Self {
            t: 0.0,
            speed: params.start_speed,
            score: 0.0,
            player: Player::standing(),
            obstacles: Vec::new(),
            spawn_timer: 0.0,
            next_spawn: roll_spawn_interval(params, rng),
        }
    }

    /// Start a jump if the player is on the ground.
    pub fn jump(&mut self, params: &RunnerParams) -> bool {
        if !self.player.on_ground {
            return false;
        }
        self.player.on_ground = false;
        self.player.vy = params.jump_velocity;
        true
    }
}

/// What happened during one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepFlags {
    pub collided: bool,
    pub won: bool,
    pub spawned: bool,
}

fn roll_spawn_interval(params: &RunnerParams, rng: &mut impl Rng) -> f32 {
    params.spawn_every * rng.random_range(SPAWN_JITTER)
}

/// Advance one frame. `dt` is clamped to [`MAX_STEP_DT`]. Reaching the win
/// score ends the step before anything moves, so a run never both wins and
/// collides in the same frame.
pub fn step(
    model: &mut RunnerModel,
    params: &RunnerParams,
    dt: f32,
    rng: &mut impl Rng,
) -> StepFlags {
    let dt = dt.clamp(0.0, MAX_STEP_DT);
    let mut flags = StepFlags::default();

    model.t += dt;
    model.speed += params.speed_ramp * dt;
    model.score += params.score_rate * dt * (model.speed / SCORE_REFERENCE_SPEED);
    if model.score >= params.win_score {
        model.score = params.win_score;
        flags.won = true;
        return flags;
    }

    let player = &mut model.player;
    if !player.on_ground {
        player.vy += params.gravity * dt;
        player.y += player.vy * dt;
        let floor = GROUND_Y - PLAYER_HEIGHT;
        if player.y >= floor {
            player.y = floor;
            player.vy = 0.0;
            player.on_ground = true;
        }
    }

    model.spawn_timer += dt;
    if model.spawn_timer > model.next_spawn {
        model.spawn_timer = 0.0;
        model.next_spawn = roll_spawn_interval(params, rng);
        model.obstacles.push(Obstacle::spawn());
        flags.spawned = true;
    }

    let travel = model.speed * dt;
    for obstacle in &mut model.obstacles {
        obstacle.x -= travel;
    }
    model.obstacles.retain(|o| o.x + o.w > -CULL_MARGIN);

    let hitbox = model.player.hitbox();
    flags.collided = model
        .obstacles
        .iter()
        .any(|o| hitbox.intersects(&o.hitbox()));
    flags
}
