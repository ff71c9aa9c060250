use std::fmt;

use uuid::Uuid;

use unlock_core::game_registry::GameTypeId;
use unlock_core::game_trait::{GameConfig, GameEvent, GameInput, GamePhase, GameResult, UnlockGame};

use crate::registry::GameRegistryEntry;

/// Caller-owned completion callback. Invoked at most once.
pub type CompletionCallback = Box<dyn FnOnce(Option<GameResult>) + Send>;

/// Identifies one mounted game instance in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A mounted game plus the caller's completion callback.
///
/// The session owns the game for as long as it is mounted. Unmounting tears
/// the game down, after which every call is a logged no-op and the callback
/// can no longer run.
pub struct GameSession {
    id: SessionId,
    game_type: GameTypeId,
    config: GameConfig,
    game: Box<dyn UnlockGame>,
    on_complete: Option<CompletionCallback>,
    completed: bool,
    mounted: bool,
    max_frame_dt: f32,
}

impl GameSession {
    /// Instantiate `entry` with `config` layered over its defaults and
    /// attach `on_complete`.
    pub fn mount(
        entry: &GameRegistryEntry,
        config: GameConfig,
        on_complete: impl FnOnce(Option<GameResult>) + Send + 'static,
    ) -> Self {
        let game = entry.instantiate(&config);
        let session = Self {
            id: SessionId::new(),
            game_type: entry.id,
            config,
            game,
            on_complete: Some(Box::new(on_complete)),
            completed: false,
            mounted: true,
            max_frame_dt: 0.033,
        };
        tracing::debug!(session = %session.id, game = %session.game_type, "Game mounted");
        session
    }

    /// Cap the frame delta handed to the game.
    pub fn with_max_frame_dt(mut self, max_frame_dt: f32) -> Self {
        if max_frame_dt > 0.0 {
            self.max_frame_dt = max_frame_dt;
        }
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn game_type(&self) -> GameTypeId {
        self.game_type
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Whether the callback has been invoked.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn phase(&self) -> GamePhase {
        self.game.phase()
    }

    pub fn tick_rate(&self) -> f32 {
        self.game.tick_rate()
    }

    pub fn pending_timers(&self) -> usize {
        self.game.pending_timers()
    }

    pub fn game(&self) -> &dyn UnlockGame {
        self.game.as_ref()
    }

    /// Advance the game by one frame.
    pub fn tick(&mut self, dt: f32) -> Vec<GameEvent> {
        if !self.mounted {
            tracing::trace!(session = %self.id, "Tick after unmount ignored");
            return Vec::new();
        }
        let dt = dt.clamp(0.0, self.max_frame_dt);
        let events = self.game.update(dt);
        self.dispatch(&events);
        events
    }

    /// Forward one player input.
    pub fn input(&mut self, input: &GameInput) -> Vec<GameEvent> {
        if !self.mounted {
            tracing::trace!(session = %self.id, "Input after unmount ignored");
            return Vec::new();
        }
        let events = self.game.apply_input(input);
        self.dispatch(&events);
        events
    }

    pub fn pause(&mut self) {
        if self.mounted {
            self.game.pause();
        }
    }

    pub fn resume(&mut self) {
        if self.mounted {
            self.game.resume();
        }
    }

    /// Turn the game's completion event into one callback invocation.
    fn dispatch(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::Completed { result } => {
                    if let Some(callback) = self.on_complete.take() {
                        self.completed = true;
                        tracing::info!(
                            session = %self.id,
                            game = %self.game_type,
                            label = result.as_ref().map(|r| r.label.as_str()),
                            "Game completed"
                        );
                        callback(result.clone());
                    } else {
                        tracing::debug!(session = %self.id, "Duplicate completion dropped");
                    }
                },
                GameEvent::Exhausted => {
                    tracing::debug!(session = %self.id, game = %self.game_type, "Game exhausted");
                },
                _ => {},
            }
        }
    }

    /// Tear the game down. Idempotent.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.game.teardown();
        self.mounted = false;
        self.on_complete = None;
        tracing::debug!(session = %self.id, game = %self.game_type, "Game unmounted");
    }

    /// Restart path after exhaustion: tear down and re-initialize the same
    /// game with the same config. A callback that has not fired yet stays
    /// attached; one that has fired is not re-armed.
    pub fn remount(&mut self) {
        self.game.teardown();
        self.game.init(&self.config_with_defaults());
        self.mounted = true;
        tracing::debug!(session = %self.id, game = %self.game_type, "Game remounted");
    }

    fn config_with_defaults(&self) -> GameConfig {
        crate::registry::registry()
            .lookup(self.game_type)
            .default_config
            .merged(&self.config)
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("game_type", &self.game_type)
            .field("mounted", &self.mounted)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}
