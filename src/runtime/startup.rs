use std::io::{self, BufRead, Write};
use std::sync::mpsc::Sender;
use std::thread;

use tracing::{debug, info, warn};

use crate::config;
use crate::persist::{FileStore, KeyValueStore, LoadOutcome, MemoryStore};
use crate::queue::QueueModel;

use super::event_loop::RuntimeMsg;

/// Pick the backing store: the data directory, or memory for ephemeral
/// sessions and when no data directory can be determined.
pub fn open_storage(settings: &config::Settings, ephemeral: bool) -> Box<dyn KeyValueStore> {
    if ephemeral {
        info!("ephemeral session, nothing will be saved");
        return Box::new(MemoryStore::new());
    }
    match settings.data_dir() {
        Some(dir) => {
            info!(dir = %dir.display(), "using data directory");
            Box::new(FileStore::new(dir))
        }
        None => {
            warn!("no data directory (HOME unset?), settings will not be saved");
            Box::new(MemoryStore::new())
        }
    }
}

pub fn build_queue(settings: &config::Settings) -> QueueModel {
    let mut queue = QueueModel::new();
    queue.set_policy(settings.playback.shuffle_policy.into());
    queue
}

/// Forward stdin lines until EOF or until the receiver goes away.
pub fn spawn_stdin_reader(tx: Sender<RuntimeMsg>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(RuntimeMsg::Line(line)).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    debug!(error = %e, "stdin read failed");
                    break;
                }
            }
        }
        let _ = tx.send(RuntimeMsg::Eof);
    })
}

pub fn greet<W: Write>(out: &mut W, outcome: &LoadOutcome, playlists: usize) -> io::Result<()> {
    match outcome {
        LoadOutcome::Missing => writeln!(out, "encore: no saved data, starting fresh")?,
        LoadOutcome::Corrupt => {
            writeln!(out, "encore: saved data was unreadable, starting fresh")?
        }
        LoadOutcome::Migrated { from } => writeln!(
            out,
            "encore: upgraded saved data from version {from}, {playlists} playlists"
        )?,
        LoadOutcome::Loaded => writeln!(out, "encore: {playlists} playlists")?,
    }
    writeln!(out, "type `help` for commands")
}
