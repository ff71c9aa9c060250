pub mod physics;

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use unlock_core::completion::CompletionLatch;
use unlock_core::game_registry::GameTypeId;
use unlock_core::game_trait::{
    GameConfig, GameEvent, GameInput, GameMetadata, GamePhase, GameResult, UnlockGame,
};
use unlock_core::timers::TimerSet;
use unlock_core::unlock_game_boilerplate;

use physics::{RunnerModel, RunnerParams, step};

/// Delay between the end of a run and the completion signal (seconds).
const FINISH_DELAY_SECS: f32 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub params: RunnerParams,
    /// Whether a crash still unlocks the invite.
    pub unlock_on_game_over: bool,
    pub seed: Option<u64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            params: RunnerParams::default(),
            unlock_on_game_over: true,
            seed: None,
        }
    }
}

impl RunnerConfig {
    pub fn from_game_config(config: &GameConfig) -> Self {
        let d = RunnerParams::default();
        let positive = |keys: &[&str], fallback: f32| {
            let v = config.f32_or(keys, fallback);
            if v > 0.0 { v } else { fallback }
        };
        let params = RunnerParams {
            win_score: positive(&["win_score", "winScore"], d.win_score),
            score_rate: positive(&["score_rate", "scoreRate"], d.score_rate),
            spawn_every: positive(&["spawn_every", "spawnEvery"], d.spawn_every),
            start_speed: positive(&["start_speed", "speed"], d.start_speed),
            speed_ramp: config
                .f32_or(&["speed_ramp", "speedRamp"], d.speed_ramp)
                .max(0.0),
            // Upward, so negative
            jump_velocity: -positive(&["jump_speed", "jumpSpeed"], -d.jump_velocity),
            gravity: positive(&["gravity"], d.gravity),
        };
        Self {
            params,
            unlock_on_game_over: config
                .read::<bool>(&["unlock_on_game_over", "unlockOnGameOver"])
                .unwrap_or(true),
            seed: config.u64_opt(&["seed"]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Waiting for the first tap.
    Idle,
    Running,
    Won,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Won,
    GameOver,
}

impl RunOutcome {
    pub fn label(self) -> &'static str {
        match self {
            Self::Won => "won",
            Self::GameOver => "game over",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunnerTimer {
    Finish,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerState {
    pub status: RunStatus,
    pub model: RunnerModel,
    pub best_score: f32,
    pub runs: u32,
    /// Outcome waiting on the finish delay.
    pub outcome: Option<RunOutcome>,
    pub phase: GamePhase,
    pub completion: CompletionLatch,
    pub timers: TimerSet<RunnerTimer>,
}

impl RunnerState {
    fn new(model: RunnerModel) -> Self {
        Self {
            status: RunStatus::Idle,
            model,
            best_score: 0.0,
            runs: 0,
            outcome: None,
            phase: GamePhase::Playing,
            completion: CompletionLatch::new(),
            timers: TimerSet::new(),
        }
    }
}

/// Jump over cacti until the score reaches the win line.
pub struct RunnerGame {
    config: RunnerConfig,
    rng: StdRng,
    state: RunnerState,
    paused: bool,
    torn_down: bool,
}

impl RunnerGame {
    pub fn new() -> Self {
        let config = RunnerConfig::default();
        let mut rng = StdRng::seed_from_u64(rand::random());
        let model = RunnerModel::new(&config.params, &mut rng);
        Self {
            config,
            rng,
            state: RunnerState::new(model),
            paused: false,
            torn_down: false,
        }
    }

    pub fn state(&self) -> &RunnerState {
        &self.state
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    fn start_run(&mut self) {
        self.state.model = RunnerModel::new(&self.config.params, &mut self.rng);
        self.state.status = RunStatus::Running;
        self.state.runs += 1;
        tracing::debug!(run = self.state.runs, "Runner started");
    }

    fn end_run(&mut self, outcome: RunOutcome, events: &mut Vec<GameEvent>) {
        let score = self.state.model.score;
        self.state.best_score = self.state.best_score.max(score);
        self.state.status = match outcome {
            RunOutcome::Won => RunStatus::Won,
            RunOutcome::GameOver => RunStatus::GameOver,
        };
        if outcome == RunOutcome::GameOver {
            events.push(GameEvent::GameOver);
        }
        tracing::debug!(outcome = outcome.label(), score, "Run ended");

        let unlocks = outcome == RunOutcome::Won || self.config.unlock_on_game_over;
        if unlocks && !self.state.completion.has_fired() {
            self.state.outcome = Some(outcome);
            self.state
                .timers
                .schedule(RunnerTimer::Finish, FINISH_DELAY_SECS);
        }
    }

    fn finish(&mut self, events: &mut Vec<GameEvent>) {
        let Some(outcome) = self.state.outcome else {
            return;
        };
        let result = GameResult::new(GameTypeId::Runner, outcome.label())
            .with_meta("outcome", outcome.label())
            .with_meta("score", self.state.model.score.floor() as u64)
            .with_meta("best", self.state.best_score.floor() as u64);
        if let Some(event) = self.state.completion.fire(Some(result)) {
            self.state.phase = GamePhase::Solved;
            events.push(event);
        }
    }
}

impl Default for RunnerGame {
    fn default() -> Self {
        Self::new()
    }
}

impl UnlockGame for RunnerGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Dino runner".to_string(),
            description: "Jump the cacti until the score hits the line.".to_string(),
            estimated_duration: Duration::from_secs(30),
        }
    }

    fn game_type(&self) -> GameTypeId {
        GameTypeId::Runner
    }

    fn init(&mut self, config: &GameConfig) {
        self.config = RunnerConfig::from_game_config(config);
        self.rng = StdRng::seed_from_u64(self.config.seed.unwrap_or_else(rand::random));
        let model = RunnerModel::new(&self.config.params, &mut self.rng);
        self.state = RunnerState::new(model);
        self.paused = false;
        self.torn_down = false;
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.paused {
            return Vec::new();
        }
        let mut events = Vec::new();
        if self.state.status == RunStatus::Running {
            let flags = step(&mut self.state.model, &self.config.params, dt, &mut self.rng);
            events.push(GameEvent::Progress {
                fraction: self.state.model.score / self.config.params.win_score,
            });
            if flags.won {
                self.end_run(RunOutcome::Won, &mut events);
            } else if flags.collided {
                self.end_run(RunOutcome::GameOver, &mut events);
            }
        }
        for timer in self.state.timers.advance(dt) {
            match timer {
                RunnerTimer::Finish => self.finish(&mut events),
            }
        }
        events
    }

    fn apply_input(&mut self, input: &GameInput) -> Vec<GameEvent> {
        // A finished run waiting on its finish delay cannot be replayed
        if self.paused || self.state.phase != GamePhase::Playing || self.state.outcome.is_some() {
            return Vec::new();
        }
        match input {
            GameInput::Tap | GameInput::PointerDown { .. } => match self.state.status {
                RunStatus::Idle | RunStatus::GameOver => self.start_run(),
                RunStatus::Running => {
                    self.state.model.jump(&self.config.params);
                },
                RunStatus::Won => {},
            },
            GameInput::Reset => self.start_run(),
            _ => {},
        }
        Vec::new()
    }

    unlock_game_boilerplate!(state_type: RunnerState);
}
