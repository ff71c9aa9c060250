pub mod config;
pub mod error;
pub mod game_loop;
pub mod registry;
pub mod result_store;
pub mod session;

use tracing_subscriber::EnvFilter;

use config::{LogFormat, ShellConfig};
use error::ShellError;
use registry::registry;
use session::GameSession;
use unlock_core::game_registry::GameTypeId;
use unlock_core::game_trait::{GameConfig, GameResult};

/// Install the global tracing subscriber. `RUST_LOG` controls filtering and
/// defaults to `info`.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Mount the game stored on an invite record.
///
/// `raw_game` is the stored identifier, resolved leniently. `stored_config`
/// is the invite's JSON config. Shell-level overrides from `[games.<id>]`
/// sit between the registry defaults and the stored config.
pub fn mount_invite_game(
    shell: &ShellConfig,
    raw_game: Option<&str>,
    stored_config: &serde_json::Value,
    on_complete: impl FnOnce(Option<GameResult>) + Send + 'static,
) -> GameSession {
    let id = GameTypeId::resolve(raw_game);
    let config = shell
        .game_overrides(id)
        .merged(&GameConfig::from_json(stored_config));
    GameSession::mount(registry().lookup(id), config, on_complete)
        .with_max_frame_dt(shell.max_frame_dt)
}

/// Strict variant for authoring surfaces: an unknown id is an error instead
/// of a fallback.
pub fn parse_game_id(raw: &str) -> Result<GameTypeId, ShellError> {
    Ok(raw.parse::<GameTypeId>()?)
}
