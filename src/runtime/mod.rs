//! The `encore` shell: argument handling, startup, and the event loop that
//! serializes user commands and engine messages.

use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use crate::app::AppContext;
use crate::audio::RodioEngine;
use crate::logging;
use crate::search::UnavailableProvider;

mod command;
mod event_loop;
mod settings;
mod startup;

pub use command::{Command, EnqueueTarget, parse};
pub use event_loop::{Flow, RuntimeMsg, Shell};


#[derive(Debug, Parser)]
#[command(name = "encore")]
#[command(about = "Playlist-driven music player")]
#[command(version)]
pub struct Cli {
    /// Config file to read instead of the XDG default
    #[arg(long, env = "ENCORE_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding saved playlists and settings
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Keep everything in memory; nothing is read or saved
    #[arg(long)]
    pub ephemeral: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

pub fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = settings::load_settings(cli.config.as_deref());
    settings::apply_overrides(&mut settings, cli.data_dir.as_deref());

    if cli.print_config {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    // Keep the guard alive until exit so buffered log lines are flushed.
    let _log_guard = match settings.log_dir() {
        Some(dir) => match logging::init(&settings.logging, &dir) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("encore: logging disabled, cannot use {}: {e}", dir.display());
                None
            }
        },
        None => None,
    };

    let storage = startup::open_storage(&settings, cli.ephemeral);
    let queue = startup::build_queue(&settings);

    let (tx, rx) = mpsc::channel::<RuntimeMsg>();
    let engine_tx = tx.clone();
    let engine = RodioEngine::spawn(settings.audio.clone(), move |msg| {
        let _ = engine_tx.send(RuntimeMsg::Engine(msg));
    });

    let (ctx, outcome) = AppContext::open(engine, storage, queue);
    let playlists = ctx.store().len();
    let mut shell = Shell::new(ctx, settings.clone(), Box::new(UnavailableProvider));

    let mut out = io::stdout().lock();
    startup::greet(&mut out, &outcome, playlists)?;
    startup::spawn_stdin_reader(tx);

    event_loop::run(&mut shell, &rx, &mut out)?;

    info!("shutting down");
    let fade_out = Duration::from_millis(settings.audio.quit_fade_out_ms);
    shell.ctx_mut().engine_mut().quit_softly(fade_out);
    Ok(())
}
