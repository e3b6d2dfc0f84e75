use std::io::{self, Write};
use std::path::Path;
use std::sync::mpsc::Receiver;

use tracing::{debug, warn};

use crate::app::{AppContext, AppNotice};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::library::display::{display_from_fields, format_time};
use crate::library::{PlaylistId, Track, ingest};
use crate::playback::{AudioEngine, EngineMessage, PlaybackNotice, PlaybackState};
use crate::search::{SearchHit, SearchProvider};

use super::command::{self, Command, EnqueueTarget};

/// Everything the runtime loop reacts to, funneled through one channel.
#[derive(Debug)]
pub enum RuntimeMsg {
    Line(String),
    /// Standard input closed.
    Eof,
    Engine(EngineMessage),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// State the shell keeps across commands.
pub struct Shell<E: AudioEngine> {
    ctx: AppContext<E>,
    settings: Settings,
    remote: Box<dyn SearchProvider>,
    last_hits: Vec<SearchHit>,
    playback_notices: Receiver<PlaybackNotice>,
    app_notices: Receiver<AppNotice>,
}

impl<E: AudioEngine> Shell<E> {
    pub fn new(
        mut ctx: AppContext<E>,
        settings: Settings,
        remote: Box<dyn SearchProvider>,
    ) -> Self {
        let playback_notices = ctx.subscribe_playback();
        let app_notices = ctx.subscribe();
        Self {
            ctx,
            settings,
            remote,
            last_hits: Vec::new(),
            playback_notices,
            app_notices,
        }
    }

    pub fn ctx(&self) -> &AppContext<E> {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut AppContext<E> {
        &mut self.ctx
    }

    pub fn last_hits(&self) -> &[SearchHit] {
        &self.last_hits
    }

    /// Parse and run one line; errors are printed, not returned.
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        let result = command::parse(line).and_then(|cmd| match cmd {
            Some(cmd) => self.execute(cmd, out),
            None => Ok(Flow::Continue),
        });
        match result {
            Ok(flow) => Ok(flow),
            Err(Error::Io(e)) => Err(e),
            Err(e) => {
                writeln!(out, "error: {e}")?;
                Ok(Flow::Continue)
            }
        }
    }

    pub fn handle_engine(&mut self, msg: EngineMessage) {
        if let Err(e) = self.ctx.handle_engine_message(msg) {
            warn!(error = %e, "engine message could not be applied");
        }
    }

    /// Print pending notifications from the controller and the context.
    pub fn drain_notices<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let notices: Vec<PlaybackNotice> = self.playback_notices.try_iter().collect();
        for notice in notices {
            match notice {
                PlaybackNotice::TrackChanged(_) => {
                    if let Some(track) = self.ctx.session().current_track() {
                        writeln!(out, "-- now playing: {}", self.describe(track))?;
                    }
                }
                PlaybackNotice::StateChanged(
                    state @ (PlaybackState::Paused | PlaybackState::Ended),
                ) => {
                    writeln!(out, "-- {state}")?;
                }
                PlaybackNotice::Failed(detail) => {
                    writeln!(out, "-- playback error: {detail}")?;
                }
                other => debug!(?other, "notice"),
            }
        }
        for notice in self.app_notices.try_iter() {
            match notice {
                AppNotice::SaveFailed(detail) => {
                    writeln!(out, "-- could not save settings: {detail}")?;
                }
            }
        }
        Ok(())
    }

    fn describe(&self, track: &Track) -> String {
        display_from_fields(
            track,
            &self.settings.ui.track_fields,
            &self.settings.ui.track_separator,
        )
    }

    fn playlist_id(&self, selector: &str) -> Result<PlaylistId> {
        self.ctx
            .store()
            .resolve(selector)
            .map(|p| p.id().clone())
            .ok_or_else(|| Error::playlist_not_found(selector))
    }

    fn execute<W: Write>(&mut self, cmd: Command, out: &mut W) -> Result<Flow> {
        match cmd {
            Command::Playlists => self.print_playlists(out)?,
            Command::Create(name) => {
                let playlist = self.ctx.create_playlist(name.as_deref());
                writeln!(out, "created {} [{}]", playlist.name(), playlist.id())?;
            }
            Command::Rename { playlist, name } => {
                let id = self.playlist_id(&playlist)?;
                self.ctx.rename_playlist(&id, &name)?;
                writeln!(out, "renamed to {}", name.trim())?;
            }
            Command::Delete(playlist) => {
                let id = self.playlist_id(&playlist)?;
                self.ctx.delete_playlist(&id);
                writeln!(out, "deleted {id}")?;
            }
            Command::Show(playlist) => self.print_playlist(&playlist, out)?,
            Command::Add { playlist, source } => {
                let id = self.playlist_id(&playlist)?;
                let track = if source.contains("://") && !source.starts_with("file://") {
                    match ingest::track_from_url(&source)? {
                        Some(track) => track,
                        None => {
                            writeln!(out, "YouTube links are not supported yet")?;
                            return Ok(Flow::Continue);
                        }
                    }
                } else {
                    let path = source.strip_prefix("file://").unwrap_or(&source);
                    ingest::track_from_path(Path::new(path), &self.settings.library)?
                };
                let label = self.describe(&track);
                self.ctx.add_track(&id, track)?;
                writeln!(out, "added {label}")?;
            }
            Command::Import { playlist, dir } => {
                let id = self.playlist_id(&playlist)?;
                let added = self
                    .ctx
                    .import_directory(&id, &dir, &self.settings.library)?;
                writeln!(out, "imported {added} tracks")?;
            }
            Command::Remove { playlist, index } => {
                let id = self.playlist_id(&playlist)?;
                let track = self.ctx.remove_track_at(&id, index)?;
                writeln!(out, "removed {}", self.describe(&track))?;
            }
            Command::Play { playlist, index } => {
                let id = self.playlist_id(&playlist)?;
                self.ctx.play_playlist(&id, index)?;
            }
            Command::PlayResults { index } => {
                if self.last_hits.is_empty() {
                    return Err(Error::InvalidArgument("no search results".into()));
                }
                let tracks = self.last_hits.iter().map(|h| h.track.clone()).collect();
                self.ctx.play_tracks(tracks, index)?;
            }
            Command::Queue => self.print_queue(out)?,
            Command::Enqueue(target) => {
                let track = self.enqueue_target(target)?;
                writeln!(out, "queued {}", self.describe(&track))?;
                self.ctx.enqueue(track);
            }
            Command::Jump(index) => self.ctx.jump_to(index)?,
            Command::Toggle => self.ctx.play_pause()?,
            Command::Pause => self.ctx.pause(),
            Command::Next => self.ctx.next()?,
            Command::Prev => self.ctx.previous()?,
            Command::Stop => {
                self.ctx.stop();
                writeln!(out, "stopped")?;
            }
            Command::Seek(seconds) => {
                let at = self.ctx.seek(seconds)?;
                writeln!(out, "at {}", format_time(at))?;
            }
            Command::Forward(step) => {
                let step = step.unwrap_or_else(|| self.seek_step());
                let at = self.ctx.seek_by(step)?;
                writeln!(out, "at {}", format_time(at))?;
            }
            Command::Back(step) => {
                let step = step.unwrap_or_else(|| self.seek_step());
                let at = self.ctx.seek_by(-step)?;
                writeln!(out, "at {}", format_time(at))?;
            }
            Command::Volume(level) => {
                let applied = match level {
                    Some(level) => self.ctx.set_volume(level),
                    None => self.ctx.session().volume_percent(),
                };
                writeln!(out, "volume {applied}%")?;
            }
            Command::Shuffle(enabled) => {
                let enabled = match enabled {
                    Some(enabled) => {
                        self.ctx.set_shuffle(enabled);
                        enabled
                    }
                    None => self.ctx.toggle_shuffle(),
                };
                writeln!(out, "shuffle {}", on_off(enabled))?;
            }
            Command::Repeat(mode) => {
                let mode = match mode {
                    Some(mode) => {
                        self.ctx.set_repeat_mode(mode);
                        mode
                    }
                    None => self.ctx.cycle_repeat_mode(),
                };
                writeln!(out, "repeat {mode}")?;
            }
            Command::Theme(theme) => {
                if let Some(theme) = theme {
                    self.ctx.set_theme(theme);
                }
                writeln!(out, "theme {}", self.ctx.theme())?;
            }
            Command::Search { source, query } => {
                self.last_hits = self.ctx.search(source, &query, self.remote.as_ref())?;
                self.print_hits(out)?;
            }
            Command::Status => self.print_status(out)?,
            Command::ClearAll => {
                self.ctx.clear_all()?;
                self.last_hits.clear();
                writeln!(out, "all data cleared")?;
            }
            Command::Help => writeln!(out, "{}", command::HELP)?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn seek_step(&self) -> f64 {
        self.settings.playback.seek_step_seconds as f64
    }

    fn enqueue_target(&self, target: EnqueueTarget) -> Result<Track> {
        match target {
            EnqueueTarget::Hit(index) => self
                .last_hits
                .get(index)
                .map(|h| h.track.clone())
                .ok_or(Error::InvalidIndex {
                    index,
                    len: self.last_hits.len(),
                }),
            EnqueueTarget::Track { playlist, index } => {
                let playlist = self
                    .ctx
                    .store()
                    .resolve(&playlist)
                    .ok_or_else(|| Error::playlist_not_found(playlist.as_str()))?;
                playlist
                    .tracks()
                    .get(index)
                    .cloned()
                    .ok_or(Error::InvalidIndex {
                        index,
                        len: playlist.len(),
                    })
            }
        }
    }

    fn print_playlists<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let playlists = self.ctx.store().all();
        if playlists.is_empty() {
            return writeln!(out, "no playlists");
        }
        for (i, p) in playlists.iter().enumerate() {
            writeln!(
                out,
                "{:>3}. {} ({} tracks, {}) [{}]",
                i + 1,
                p.name(),
                p.len(),
                format_time(p.total_seconds()),
                p.id()
            )?;
        }
        Ok(())
    }

    fn print_playlist<W: Write>(&self, selector: &str, out: &mut W) -> Result<()> {
        let playlist = self
            .ctx
            .store()
            .resolve(selector)
            .ok_or_else(|| Error::playlist_not_found(selector))?;
        writeln!(out, "{} [{}]", playlist.name(), playlist.id())?;
        if playlist.is_empty() {
            writeln!(out, "  (empty)")?;
        }
        for (i, track) in playlist.tracks().iter().enumerate() {
            writeln!(
                out,
                "{:>3}. {}  {}",
                i + 1,
                self.describe(track),
                format_time(track.duration_seconds())
            )?;
        }
        Ok(())
    }

    fn print_queue<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let queue = self.ctx.queue();
        writeln!(
            out,
            "queue: {} tracks, shuffle {}, repeat {}",
            queue.len(),
            on_off(queue.shuffle_enabled()),
            queue.repeat_mode()
        )?;
        for (i, track) in queue.tracks().iter().enumerate() {
            let marker = if queue.cursor() == Some(i) { '>' } else { ' ' };
            writeln!(out, "{marker}{:>3}. {}", i + 1, self.describe(track))?;
        }
        Ok(())
    }

    fn print_hits<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.last_hits.is_empty() {
            return writeln!(out, "no results");
        }
        for (i, hit) in self.last_hits.iter().enumerate() {
            match &hit.origin {
                Some(origin) => writeln!(
                    out,
                    "{:>3}. {} ({})",
                    i + 1,
                    self.describe(&hit.track),
                    origin.playlist_name
                )?,
                None => writeln!(out, "{:>3}. {}", i + 1, self.describe(&hit.track))?,
            }
        }
        Ok(())
    }

    fn print_status<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let session = self.ctx.session();
        writeln!(out, "state: {}", session.state())?;
        if let Some(track) = session.current_track() {
            writeln!(out, "track: {}", self.describe(track))?;
            writeln!(
                out,
                "time: {} / {}",
                format_time(session.position_seconds()),
                format_time(session.duration_seconds())
            )?;
        }
        writeln!(
            out,
            "volume: {}%  shuffle: {}  repeat: {}  theme: {}",
            session.volume_percent(),
            on_off(self.ctx.queue().shuffle_enabled()),
            self.ctx.queue().repeat_mode(),
            self.ctx.theme()
        )
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

/// Serve messages until `quit`, end of input, or every sender is gone.
pub fn run<E: AudioEngine, W: Write>(
    shell: &mut Shell<E>,
    rx: &Receiver<RuntimeMsg>,
    out: &mut W,
) -> io::Result<()> {
    while let Ok(msg) = rx.recv() {
        let flow = match msg {
            RuntimeMsg::Line(line) => shell.handle_line(&line, out)?,
            RuntimeMsg::Eof => Flow::Quit,
            RuntimeMsg::Engine(msg) => {
                shell.handle_engine(msg);
                Flow::Continue
            }
        };
        shell.drain_notices(out)?;
        out.flush()?;
        if flow == Flow::Quit {
            break;
        }
    }
    Ok(())
}
