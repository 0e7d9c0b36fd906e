//! # wavmix
//!
//! Streaming WAV mixing engine for interactive applications.
//!
//! **Purpose:** Play short one-shot effects and long streamed music tracks
//! concurrently without stalling the host's main loop. One-shots are
//! fire-and-forget voices reclaimed in the background; music plays on a
//! fixed set of seekable streaming slots, each cycling a small ring of
//! buffers refilled from disk by a 200 Hz maintenance thread.
//!
//! **Architecture:** asset catalog + one-shot voice pool + streaming
//! players + maintenance thread, all behind an explicitly constructed
//! [`Engine`]. Audio hardware sits behind the [`device::AudioDevice`]
//! facade; a fully in-memory backend ([`device::sim::SimDevice`]) is
//! included for tests and headless hosts.

pub mod catalog;
pub mod config;
pub mod device;
pub mod engine;
pub mod error;
pub mod wav;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Error, Result};
pub use wav::SampleFormat;
