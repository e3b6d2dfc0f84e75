//! Application module: the orchestrating context the runtime drives.
//!
//! `AppContext` lives in `app::context` and composes the playlist store,
//! the queue and the playback controller, persisting after every change.

mod context;

pub use context::*;

#[cfg(test)]
mod tests;
