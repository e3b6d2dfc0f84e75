//! encore: a playlist-driven music player.
//!
//! Playlists live in a `store`, the play order in a `queue`, and the
//! `playback` controller drives an `AudioEngine` (the rodio-backed one in
//! `audio`). `app::AppContext` wires them together and persists state
//! through `persist`.

pub mod app;
pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod library;
pub mod logging;
pub mod persist;
pub mod playback;
pub mod queue;
pub mod runtime;
pub mod search;
pub mod store;

pub use error::{Error, Result};
