use std::sync::{Arc, Mutex};

use unlock_core::game_trait::{GameInput, GameResult};
use unlock_shell::session::GameSession;

pub const DT: f32 = 1.0 / 60.0;

/// Shared log of callback invocations.
pub type Calls = Arc<Mutex<Vec<Option<GameResult>>>>;

/// A completion callback that records every invocation into `Calls`.
pub fn recorder() -> (Calls, impl FnOnce(Option<GameResult>) + Send + 'static) {
    let calls: Calls = Arc::default();
    let sink = Arc::clone(&calls);
    (calls, move |result| sink.lock().unwrap().push(result))
}

pub fn call_count(calls: &Calls) -> usize {
    calls.lock().unwrap().len()
}

/// Apply each input, then tick `ticks_between` frames.
pub fn drive(session: &mut GameSession, script: &[GameInput], ticks_between: usize) {
    for input in script {
        session.input(input);
        for _ in 0..ticks_between {
            session.tick(DT);
        }
    }
}

pub fn ticks(session: &mut GameSession, n: usize) {
    for _ in 0..n {
        session.tick(DT);
    }
}
