//! Engine configuration
//!
//! Plain configuration struct handed to [`Engine::new`](crate::Engine::new).
//! The host application decides where these values come from; the engine
//! never reads config files itself.

use std::path::PathBuf;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory scanned for one-shot effect files
    pub effects_dir: PathBuf,

    /// Directory scanned for streamable music files
    pub music_dir: PathBuf,

    /// Listener gain applied at startup (0.0-1.0)
    pub initial_gain: f32,

    /// Maintenance loop cadence in iterations per second
    pub tick_rate_hz: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            effects_dir: PathBuf::from("assets/sfx"),
            music_dir: PathBuf::from("assets/music"),
            initial_gain: 0.25,
            tick_rate_hz: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.effects_dir, PathBuf::from("assets/sfx"));
        assert_eq!(config.music_dir, PathBuf::from("assets/music"));
        assert_eq!(config.initial_gain, 0.25);
        assert_eq!(config.tick_rate_hz, 200);
    }
}
