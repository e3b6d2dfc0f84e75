//! Durable user settings: the versioned blob and where it is kept.
//!
//! The codec never fails on load: a missing or unreadable blob yields the
//! defaults, and older schemas are migrated forward before decoding.

mod codec;
mod storage;

pub use codec::{
    CURRENT_SCHEMA_VERSION, DEFAULT_VOLUME_PERCENT, LoadOutcome, PersistedSettings, SETTINGS_KEY,
    ThemePreference, decode, deserialize, serialize,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
