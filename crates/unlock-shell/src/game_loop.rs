use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use unlock_core::game_trait::{GameEvent, GameInput, GameResult};

use crate::error::ShellError;
use crate::session::{GameSession, SessionId};

/// Commands sent from the input side to a running session loop.
#[derive(Debug)]
pub enum SessionCommand {
    Input(GameInput),
    Pause,
    Resume,
    /// Tear the game down and exit the loop.
    Unmount,
}

/// Messages sent from the session loop back to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionBroadcast {
    Event(GameEvent),
    /// The loop has exited; no further messages follow.
    Ended,
}

/// Handle to a session running on its own tokio task.
///
/// Dropping the handle aborts the task, which drops the session and tears
/// the game down.
#[derive(Debug)]
pub struct SessionHandle {
    pub id: SessionId,
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    pub events: mpsc::UnboundedReceiver<SessionBroadcast>,
    join: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn send(&self, command: SessionCommand) -> Result<(), ShellError> {
        self.cmd_tx
            .send(command)
            .map_err(|_| ShellError::SessionClosed(self.id.0))
    }

    pub fn input(&self, input: GameInput) -> Result<(), ShellError> {
        self.send(SessionCommand::Input(input))
    }

    /// Ask the loop to unmount and wait for it to exit.
    pub async fn unmount(mut self) {
        let _ = self.cmd_tx.send(SessionCommand::Unmount);
        if let Some(join) = self.join.take()
            && let Err(e) = join.await
        {
            tracing::warn!(session = %self.id, error = %e, "Session task failed");
        }
    }

    /// Next broadcast, or `None` once the loop is gone.
    pub async fn next_event(&mut self) -> Option<SessionBroadcast> {
        self.events.recv().await
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}

/// Spawn a tick loop for `session` as a tokio task. `tick_rate_hz` of zero
/// uses the game's own preferred rate.
pub fn spawn_session(session: GameSession, tick_rate_hz: f32) -> SessionHandle {
    let id = session.id();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();

    let join = tokio::spawn(async move {
        run_session_loop(session, tick_rate_hz, cmd_rx, broadcast_tx).await;
    });

    SessionHandle {
        id,
        cmd_tx,
        events: broadcast_rx,
        join: Some(join),
    }
}

/// Convenience for hosts that only need the completion result: the
/// returned receiver resolves when the callback fires, and errors if the
/// session is unmounted first.
pub fn completion_channel() -> (
    impl FnOnce(Option<GameResult>) + Send + 'static,
    tokio::sync::oneshot::Receiver<Option<GameResult>>,
) {
    let (tx, rx) = tokio::sync::oneshot::channel();
    let callback = move |result| {
        let _ = tx.send(result);
    };
    (callback, rx)
}

async fn run_session_loop(
    mut session: GameSession,
    tick_rate_hz: f32,
    mut cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
    broadcast_tx: mpsc::UnboundedSender<SessionBroadcast>,
) {
    let tick_rate = if tick_rate_hz > 0.0 {
        tick_rate_hz
    } else {
        session.tick_rate()
    };
    let mut interval = tokio::time::interval(Duration::from_secs_f32(1.0 / tick_rate));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last = tokio::time::Instant::now();

    tracing::info!(session = %session.id(), game = %session.game_type(), tick_rate, "Session loop started");

    let forward = |events: Vec<GameEvent>| {
        for event in events {
            let _ = broadcast_tx.send(SessionBroadcast::Event(event));
        }
    };

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = tokio::time::Instant::now();
                let dt = now.duration_since(last).as_secs_f32();
                last = now;
                forward(session.tick(dt));
            }
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Input(input)) => forward(session.input(&input)),
                    Some(SessionCommand::Pause) => session.pause(),
                    Some(SessionCommand::Resume) => {
                        // Paused time does not count toward the next frame
                        last = tokio::time::Instant::now();
                        session.resume();
                    },
                    Some(SessionCommand::Unmount) | None => break,
                }
            }
        }
    }

    session.unmount();
    let _ = broadcast_tx.send(SessionBroadcast::Ended);
    tracing::info!(session = %session.id(), "Session loop stopped");
}
