use crate::error::{QuarryError, Result};
use crate::types::{GameMode, WorldBounds};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Largest horizontal extent, in blocks, a world may declare.
const MAX_HORIZONTAL: i32 = 4096;
/// Dimension height limit of the client, minus the two boundary sections.
const MAX_HEIGHT: i32 = 4064 - 32;

/// Largest packet, before compression, that fits in one frame.
pub const MAX_PACKET_LENGTH: usize = 2 * 1024 * 1024;
/// One block section: 15-bit direct palette plus a single-value biome palette.
const SECTION_BYTES: usize = 8200;
/// One full light array and its length prefix.
const LIGHT_ARRAY_BYTES: usize = 2050;
/// Column coordinates, heightmap and light masks, rounded up.
const COLUMN_OVERHEAD: usize = 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub motd: String,
    pub max_players: u32,
    /// One of debug, info, warning, error, fatal.
    pub log_level: String,
    /// Frames at least this long are zlib-compressed; negative disables compression.
    pub compression_threshold: i32,
    /// Overrides the view distance derived from the world extent.
    pub view_distance: Option<i32>,
    pub simulation_distance: i32,
    pub game_mode: GameMode,
    pub full_bright: bool,
    pub tick_interval_ms: u64,
    pub keep_alive_interval_secs: u64,
    pub keep_alive_timeout_secs: u64,
    pub banned_names: Vec<String>,
    pub world: WorldConfig,
    pub pacing: PacingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: i32,
    pub height: i32,
    pub depth: i32,
    /// Accepted for compatibility with world files; generation ignores it.
    pub seed: i64,
}

/// Suspension points inside the join sequence.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub handshake_ms: u64,
    pub stream_ms: u64,
    pub per_column_ms: u64,
    pub teleport_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_owned(),
            port: 25565,
            motd: "A Quarry server".to_owned(),
            max_players: 20,
            log_level: "info".to_owned(),
            compression_threshold: 256,
            view_distance: None,
            simulation_distance: 8,
            game_mode: GameMode::Creative,
            full_bright: true,
            tick_interval_ms: 50,
            keep_alive_interval_secs: 10,
            keep_alive_timeout_secs: 30,
            banned_names: Vec::new(),
            world: WorldConfig::default(),
            pacing: PacingConfig::default(),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 64,
            depth: 128,
            seed: 0,
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            handshake_ms: 50,
            stream_ms: 50,
            per_column_ms: 2,
            teleport_ms: 50,
        }
    }
}

impl PacingConfig {
    pub fn handshake(&self) -> Duration {
        Duration::from_millis(self.handshake_ms)
    }

    pub fn stream(&self) -> Duration {
        Duration::from_millis(self.stream_ms)
    }

    pub fn per_column(&self) -> Duration {
        Duration::from_millis(self.per_column_ms)
    }

    pub fn teleport(&self) -> Duration {
        Duration::from_millis(self.teleport_ms)
    }
}

impl WorldConfig {
    pub fn bounds(&self) -> WorldBounds {
        WorldBounds::new(self.width, self.height, self.depth)
    }

    /// Upper bound on one chunk column packet, boundary sections included.
    /// Light spans one more section below and above the block sections.
    pub fn column_packet_len(&self, full_bright: bool) -> usize {
        let sections = (self.height.max(0) as usize).div_ceil(16) + 2;
        let light = if full_bright {
            (sections + 2) * LIGHT_ARRAY_BYTES
        } else {
            0
        };
        sections * SECTION_BYTES + light + COLUMN_OVERHEAD
    }
}

impl ServerConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            QuarryError::ConfigError(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let config: ServerConfig = serde_json::from_str(contents)
            .map_err(|e| QuarryError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let pacing = &self.pacing;
        if pacing.handshake_ms == 0
            || pacing.stream_ms == 0
            || pacing.per_column_ms == 0
            || pacing.teleport_ms == 0
        {
            return Err(QuarryError::ConfigError(
                "pacing delays must be nonzero".to_owned(),
            ));
        }

        let world = &self.world;
        if world.width <= 0 || world.height <= 0 || world.depth <= 0 {
            return Err(QuarryError::ConfigError(
                "world dimensions must be positive".to_owned(),
            ));
        }
        if world.width > MAX_HORIZONTAL || world.depth > MAX_HORIZONTAL {
            return Err(QuarryError::ConfigError(format!(
                "world width and depth are limited to {}",
                MAX_HORIZONTAL
            )));
        }
        if world.height > MAX_HEIGHT {
            return Err(QuarryError::ConfigError(format!(
                "world height is limited to {}",
                MAX_HEIGHT
            )));
        }
        let column = world.column_packet_len(self.full_bright);
        if column > MAX_PACKET_LENGTH {
            return Err(QuarryError::ConfigError(format!(
                "a world {} blocks high needs chunk packets of up to {} bytes, over the {} byte limit",
                world.height, column, MAX_PACKET_LENGTH
            )));
        }

        if self.tick_interval_ms == 0 {
            return Err(QuarryError::ConfigError(
                "tick interval must be nonzero".to_owned(),
            ));
        }
        if self.keep_alive_timeout_secs <= self.keep_alive_interval_secs {
            return Err(QuarryError::ConfigError(
                "keep-alive timeout must exceed the keep-alive interval".to_owned(),
            ));
        }
        if !(2..=32).contains(&self.simulation_distance) {
            return Err(QuarryError::ConfigError(
                "simulation distance must be within 2..=32".to_owned(),
            ));
        }

        Ok(())
    }

    pub fn compression(&self) -> Option<usize> {
        (self.compression_threshold >= 0).then_some(self.compression_threshold as usize)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_secs(self.keep_alive_interval_secs)
    }

    pub fn keep_alive_timeout(&self) -> Duration {
        Duration::from_secs(self.keep_alive_timeout_secs)
    }
}
