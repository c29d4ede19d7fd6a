//! Wayfinder: replays a recorded MUD session through the mapper core.
//!
//! Loads `config.ron`, applies CLI overrides, loads an optional RON map, and
//! feeds the transcript to a [`Session`], printing what the user would see
//! and what would have been sent to the server.
//!
//! Run with: `cargo run -p wayfinder-app -- session.txt --map map.ron`

mod replay;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use thiserror::Error;
use tracing::info;
use wayfinder_config::{CliArgs, Config, ConfigError};
use wayfinder_core::{CoreEvent, Session, SessionError};
use wayfinder_movement::{InMemoryMap, MapError};

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("map: {0}")]
    Map(#[from] MapError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("cannot read transcript {path}: {source}")]
    Transcript {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn print_event(event: &CoreEvent) {
    match event {
        CoreEvent::SendToUser { text, go_ahead } => {
            if *go_ahead {
                println!("{text}");
            } else {
                print!("{text}");
            }
        }
        CoreEvent::SendToServer(text) => println!("[send] {text}"),
        CoreEvent::PositionDesync { expected, actual } => {
            println!("[desync] expected {expected}, server says {actual}");
        }
        CoreEvent::MoveFailed { direction } => println!("[move failed] {direction}"),
        CoreEvent::DoorStateChanged {
            direction,
            exit_flags,
            door_flags,
        } => {
            tracing::debug!(%direction, ?exit_flags, ?door_flags, "door state changed");
        }
        CoreEvent::RoomObserved(room) => {
            tracing::debug!(name = %room.name, synthesized = room.synthesized, "room");
        }
        CoreEvent::PromptObserved(prompt) => {
            tracing::debug!(text = %prompt.text, "prompt");
        }
    }
}

fn run(args: CliArgs) -> Result<(), AppError> {
    // Config from disk when a config directory is known, then CLI overrides.
    let config_dir = args.config.clone().or_else(Config::default_dir);
    let mut config = match &config_dir {
        Some(dir) => Config::load_or_create(dir)?,
        None => Config::default(),
    };
    config.apply_cli_overrides(&args);
    config.validate()?;

    wayfinder_log::init_logging(config_dir.as_deref(), cfg!(debug_assertions), Some(&config));
    info!("Wayfinder replay: {}", args.transcript.display());

    let map = match &args.map {
        Some(path) => InMemoryMap::load(path)?,
        None => InMemoryMap::new(),
    };
    info!("Map: {} rooms", map.len());

    let transcript =
        std::fs::read_to_string(&args.transcript).map_err(|source| AppError::Transcript {
            path: args.transcript.clone(),
            source,
        })?;
    let steps = replay::parse_transcript(&transcript);

    let start = Instant::now();
    let mut session = Session::new(&config, Arc::new(map), start)?;
    session.subscribe(print_event);

    let elapsed = replay::replay(&mut session, &steps, start);
    info!(
        "Replayed {} steps over {:.1}s of virtual time",
        steps.len(),
        elapsed.as_secs_f64()
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("wayfinder: {err}");
            ExitCode::FAILURE
        }
    }
}
