//! Track and playlist value types, plus ingestion of files and URLs.
//!
//! `model` holds the fixed-shape records, `ingest` turns raw file names,
//! directories and URLs into tracks, and `display` formats them for output.

pub mod display;
pub mod ingest;
mod model;

pub use model::*;
