//! Line-oriented shell commands.
//!
//! Indices typed by the user are 1-based; they are converted to 0-based
//! here so nothing downstream has to care.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::persist::ThemePreference;
use crate::queue::RepeatMode;
use crate::search::SearchSource;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Playlists,
    Create(Option<String>),
    Rename { playlist: String, name: String },
    Delete(String),
    Show(String),
    /// Add a local file or a URL to a playlist.
    Add { playlist: String, source: String },
    Import { playlist: String, dir: PathBuf },
    Remove { playlist: String, index: usize },
    Play { playlist: String, index: usize },
    /// Replace the queue with the last search results.
    PlayResults { index: usize },
    Queue,
    Enqueue(EnqueueTarget),
    Jump(usize),
    Toggle,
    Pause,
    Next,
    Prev,
    Stop,
    Seek(f64),
    Forward(Option<f64>),
    Back(Option<f64>),
    Volume(Option<i64>),
    /// `None` toggles.
    Shuffle(Option<bool>),
    /// `None` cycles.
    Repeat(Option<RepeatMode>),
    Theme(Option<ThemePreference>),
    Search { source: SearchSource, query: String },
    Status,
    ClearAll,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnqueueTarget {
    /// A hit from the last search.
    Hit(usize),
    Track { playlist: String, index: usize },
}

pub const HELP: &str = "\
playlists                      list playlists
create [name]                  create a playlist
rename <pl> <name>             rename a playlist
delete <pl>                    delete a playlist
show <pl>                      list a playlist's tracks
add <pl> <path|url>            add a file or direct audio URL
import <pl> <dir>              add every audio file under a directory
remove <pl> <n>                remove the n-th track
play <pl> [n]                  play a playlist from track n
results [n]                    play the last search results from hit n
queue                          show the queue
enqueue <hit> | <pl> <n>       append a search hit or playlist track
jump <n>                       play the n-th queued track
toggle | pause | stop          control playback
next | prev                    skip in the queue
seek <secs|m:ss>               seek to a position
forward [secs] | back [secs]   seek relative to the position
volume [0-100]                 show or set the volume
shuffle [on|off]               set or toggle shuffle
repeat [off|one|all]           set or cycle the repeat mode
theme [auto|light|dark]        show or set the theme preference
search [local|remote|url] <q>  search playlists, a provider, or a URL
status                         show what is playing
clear-all                      forget every playlist and setting
help | quit";

/// Parse one input line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = split_first(line);
    let rest_opt = Some(rest).filter(|r| !r.is_empty());

    let cmd = match verb.to_ascii_lowercase().as_str() {
        "playlists" | "ls" => Command::Playlists,
        "create" | "new" => Command::Create(rest_opt.map(str::to_string)),
        "rename" => {
            let (playlist, name) = two_args(rest, "rename <pl> <name>")?;
            Command::Rename { playlist, name }
        }
        "delete" | "rm" => Command::Delete(one_arg(rest, "delete <pl>")?),
        "show" => Command::Show(one_arg(rest, "show <pl>")?),
        "add" => {
            let (playlist, source) = two_args(rest, "add <pl> <path|url>")?;
            Command::Add { playlist, source }
        }
        "import" => {
            let (playlist, dir) = two_args(rest, "import <pl> <dir>")?;
            Command::Import {
                playlist,
                dir: PathBuf::from(dir),
            }
        }
        "remove" => {
            let (playlist, n) = two_args(rest, "remove <pl> <n>")?;
            Command::Remove {
                playlist,
                index: position(&n)?,
            }
        }
        "play" => {
            let (playlist, n) = split_first(rest);
            if playlist.is_empty() {
                return Err(usage("play <pl> [n]"));
            }
            let index = match n {
                "" => 0,
                n => position(n)?,
            };
            Command::Play {
                playlist: playlist.to_string(),
                index,
            }
        }
        "results" => Command::PlayResults {
            index: rest_opt.map(position).transpose()?.unwrap_or(0),
        },
        "queue" | "q" => Command::Queue,
        "enqueue" => {
            let (first, second) = split_first(rest);
            let target = match (first, second) {
                ("", _) => return Err(usage("enqueue <hit> | <pl> <n>")),
                (hit, "") => EnqueueTarget::Hit(position(hit)?),
                (playlist, n) => EnqueueTarget::Track {
                    playlist: playlist.to_string(),
                    index: position(n)?,
                },
            };
            Command::Enqueue(target)
        }
        "jump" => Command::Jump(position(&one_arg(rest, "jump <n>")?)?),
        "toggle" | "p" => Command::Toggle,
        "pause" => Command::Pause,
        "next" | "n" => Command::Next,
        "prev" | "previous" => Command::Prev,
        "stop" => Command::Stop,
        "seek" => Command::Seek(timestamp(&one_arg(rest, "seek <secs|m:ss>")?)?),
        "forward" | "ff" => Command::Forward(rest_opt.map(timestamp).transpose()?),
        "back" | "rew" => Command::Back(rest_opt.map(timestamp).transpose()?),
        "volume" | "vol" => Command::Volume(
            rest_opt
                .map(|v| {
                    v.parse::<i64>()
                        .map_err(|_| Error::InvalidArgument(format!("not a volume: {v}")))
                })
                .transpose()?,
        ),
        "shuffle" => Command::Shuffle(rest_opt.map(on_off).transpose()?),
        "repeat" => Command::Repeat(rest_opt.map(str::parse).transpose()?),
        "theme" => Command::Theme(rest_opt.map(str::parse).transpose()?),
        "search" | "find" => {
            let (first, tail) = split_first(rest);
            match first.parse::<SearchSource>() {
                Ok(source) => Command::Search {
                    source,
                    query: tail.to_string(),
                },
                Err(_) => Command::Search {
                    source: SearchSource::Local,
                    query: rest.to_string(),
                },
            }
        }
        "status" | "st" => Command::Status,
        "clear-all" => Command::ClearAll,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => {
            return Err(Error::InvalidArgument(format!(
                "unknown command: {other} (try `help`)"
            )));
        }
    };
    Ok(Some(cmd))
}

fn split_first(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (s, ""),
    }
}

fn usage(text: &str) -> Error {
    Error::InvalidArgument(format!("usage: {text}"))
}

fn one_arg(rest: &str, text: &str) -> Result<String> {
    if rest.is_empty() {
        Err(usage(text))
    } else {
        Ok(rest.to_string())
    }
}

/// First word, then everything after it (which may contain spaces).
fn two_args(rest: &str, text: &str) -> Result<(String, String)> {
    match split_first(rest) {
        (head, tail) if !head.is_empty() && !tail.is_empty() => {
            Ok((head.to_string(), tail.to_string()))
        }
        _ => Err(usage(text)),
    }
}

/// 1-based user position to 0-based index.
fn position(s: &str) -> Result<usize> {
    s.trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(|| Error::InvalidArgument(format!("expected a position from 1: {s}")))
}

/// Seconds (`90`, `12.5`) or `m:ss` (`1:30`).
fn timestamp(s: &str) -> Result<f64> {
    let s = s.trim();
    let bad = || Error::InvalidArgument(format!("not a time: {s}"));
    let seconds = match s.split_once(':') {
        Some((m, sec)) => {
            let m = m.parse::<u64>().map_err(|_| bad())?;
            let sec = sec.parse::<f64>().map_err(|_| bad())?;
            if !(0.0..60.0).contains(&sec) {
                return Err(bad());
            }
            m as f64 * 60.0 + sec
        }
        None => s.parse::<f64>().map_err(|_| bad())?,
    };
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(seconds)
    } else {
        Err(bad())
    }
}

fn on_off(s: &str) -> Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(Error::InvalidArgument(format!("expected on or off: {other}"))),
    }
}
