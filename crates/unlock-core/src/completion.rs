use serde::{Deserialize, Serialize};

use crate::game_trait::{GameEvent, GameResult};

/// Per-instance guard that lets the completion signal through once.
///
/// Every internal source that can finish a game (pointer handlers, frame
/// ticks, timer expiry) goes through `fire`, so overlapping sources cannot
/// complete the same instance twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionLatch {
    fired: bool,
}

impl CompletionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the `Completed` event the first time, `None` afterwards.
    pub fn fire(&mut self, result: Option<GameResult>) -> Option<GameEvent> {
        if self.fired {
            tracing::trace!("Completion already fired, ignoring");
            return None;
        }
        self.fired = true;
        Some(GameEvent::Completed { result })
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}
