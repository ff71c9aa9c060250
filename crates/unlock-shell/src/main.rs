use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use unlock_core::game_trait::GameInput;
use unlock_shell::config::ShellConfig;
use unlock_shell::error::ShellError;
use unlock_shell::game_loop::{SessionBroadcast, completion_channel, spawn_session};
use unlock_shell::registry::registry;
use unlock_shell::result_store::ResultStore;
use unlock_shell::{init_tracing, mount_invite_game, parse_game_id};

/// How long a session keeps running after stdin closes, so that pending
/// timers (a spinning wheel, a reveal delay) can still finish.
const DRAIN_AFTER_EOF: Duration = Duration::from_secs(10);

const USAGE: &str = "unlock-shell list | play <game> [--config=<json>] [--invite=<id>] | result <invite>";

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ShellConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("unlock-shell: {e}");
            return ExitCode::FAILURE;
        },
    };
    init_tracing(config.log_format);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&config, &args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "unlock-shell failed");
            eprintln!("unlock-shell: {e}");
            ExitCode::FAILURE
        },
    }
}

async fn run(config: &ShellConfig, args: &[String]) -> Result<(), ShellError> {
    match args.first().map(String::as_str) {
        Some("list") => {
            for entry in registry().entries() {
                print_json(entry)?;
            }
            Ok(())
        },
        Some("play") => play(config, &args[1..]).await,
        Some("result") => {
            let invite = args
                .get(1)
                .ok_or_else(|| ShellError::Usage(USAGE.to_string()))?;
            let store = open_store(config)?;
            match store.get(invite) {
                Some(result) => print_json(result),
                None => {
                    tracing::info!(invite = %invite, "No stored result");
                    Ok(())
                },
            }
        },
        _ => Err(ShellError::Usage(USAGE.to_string())),
    }
}

fn open_store(config: &ShellConfig) -> Result<ResultStore, ShellError> {
    Ok(match &config.results_path {
        Some(path) => ResultStore::open(path)?,
        None => ResultStore::in_memory(),
    })
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter().find_map(|a| a.strip_prefix(name))
}

/// Run one game, reading `GameInput` JSON lines from stdin and writing
/// `GameEvent` JSON lines to stdout.
async fn play(config: &ShellConfig, args: &[String]) -> Result<(), ShellError> {
    let raw_game = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .ok_or_else(|| ShellError::Usage(USAGE.to_string()))?;
    let game_id = parse_game_id(raw_game)?;
    let stored = match flag(args, "--config=") {
        Some(raw) => serde_json::from_str(raw).map_err(ShellError::GameConfig)?,
        None => serde_json::Value::Null,
    };
    let invite = flag(args, "--invite=").unwrap_or("local").to_string();
    let mut store = open_store(config)?;

    let (callback, mut done_rx) = completion_channel();
    let session = mount_invite_game(config, Some(game_id.as_str()), &stored, callback);
    let mut handle = spawn_session(session, config.tick_rate_hz);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0usize;
    let mut drain_deadline: Option<tokio::time::Instant> = None;

    let result = loop {
        tokio::select! {
            line = lines.next_line(), if drain_deadline.is_none() => {
                match line? {
                    Some(line) => {
                        line_no += 1;
                        if line.trim().is_empty() {
                            continue;
                        }
                        let input: GameInput = serde_json::from_str(&line)
                            .map_err(|source| ShellError::Input { line: line_no, source })?;
                        handle.input(input)?;
                    },
                    None => {
                        tracing::debug!("stdin closed, draining session");
                        drain_deadline = Some(tokio::time::Instant::now() + DRAIN_AFTER_EOF);
                    },
                }
            }
            Some(msg) = handle.events.recv() => {
                match msg {
                    SessionBroadcast::Event(event) => print_json(&event)?,
                    SessionBroadcast::Ended => break None,
                }
            }
            done = &mut done_rx => break done.ok().flatten(),
            _ = tokio::time::sleep_until(drain_deadline.unwrap_or_else(tokio::time::Instant::now)),
                if drain_deadline.is_some() => {
                tracing::info!(game = %game_id, "Session did not complete before stdin closed");
                break None;
            }
        }
    };

    // Events produced in the completing frame are queued behind the callback
    while let Ok(SessionBroadcast::Event(event)) = handle.events.try_recv() {
        print_json(&event)?;
    }
    handle.unmount().await;

    if let Some(result) = result {
        store.save(&invite, result)?;
    }
    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<(), ShellError> {
    let line = serde_json::to_string(value).map_err(ShellError::Encode)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}")?;
    stdout.flush()?;
    Ok(())
}
