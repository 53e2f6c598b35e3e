//! Config file discovery and the world/roster wiring behind a server.

use crate::auth::OfflineAuthenticator;
use quarry_common::config::ServerConfig;
use quarry_common::Result;
use quarry_logger::log::log;
use quarry_logger::severity::LogSeverity::{self, Info, Warning};
use quarry_protocol::session::ServerContext;
use quarry_world::{FlatWorld, Lobby};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const CONFIG_ENV: &str = "QUARRY_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "quarry.json";

/// The first CLI argument wins, then `QUARRY_CONFIG`, then `quarry.json`
/// when it exists. `None` means built-in defaults.
pub fn config_path(arg: Option<String>, env: Option<String>) -> Option<PathBuf> {
    arg.or(env).map(PathBuf::from).or_else(|| {
        let default = Path::new(DEFAULT_CONFIG_FILE);
        default.exists().then(|| default.to_path_buf())
    })
}

pub fn load_config(path: Option<&Path>) -> Result<ServerConfig> {
    match path {
        Some(path) => {
            log(format!("Loading config from {}", path.display()), Info);
            ServerConfig::from_file(path)
        }
        None => {
            log("No config file, using defaults".to_owned(), Info);
            Ok(ServerConfig::default())
        }
    }
}

/// Parses the configured log level, falling back to Info.
pub fn log_level(config: &ServerConfig) -> LogSeverity {
    config.log_level.parse().unwrap_or_else(|err| {
        log(format!("{}, using INFO", err), Warning);
        LogSeverity::Info
    })
}

/// Generates the world and builds the shared context sessions run against.
pub fn build_context(config: ServerConfig) -> Arc<ServerContext> {
    let world = Arc::new(FlatWorld::generate(config.world.bounds(), config.world.seed));
    let lobby = Arc::new(Lobby::new(world.clone()));
    let auth = Arc::new(OfflineAuthenticator::new(&config, lobby.clone()));
    Arc::new(ServerContext::new(config, world, lobby, auth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use quarry_common::QuarryError;

    #[test]
    fn test_argument_beats_environment() {
        assert_eq!(
            config_path(Some("a.json".to_owned()), Some("b.json".to_owned())),
            Some(PathBuf::from("a.json"))
        );
        assert_eq!(
            config_path(None, Some("b.json".to_owned())),
            Some(PathBuf::from("b.json"))
        );
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_config(Some(Path::new("/nonexistent/quarry.json")));
        assert_matches!(result, Err(QuarryError::ConfigError(_)));
    }

    #[test]
    fn test_defaults_without_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config.port, 25565);
    }

    #[test]
    fn test_log_level_fallback() {
        let mut config = ServerConfig::default();
        config.log_level = "debug".to_owned();
        assert_eq!(log_level(&config), LogSeverity::Debug);
        config.log_level = "loud".to_owned();
        assert_eq!(log_level(&config), LogSeverity::Info);
    }

    #[test]
    fn test_context_layout_follows_world() {
        let mut config = ServerConfig::default();
        config.world.width = 32;
        config.world.height = 16;
        config.world.depth = 48;
        let context = build_context(config);
        assert_eq!(context.layout.columns_x(), -1..=2);
        assert_eq!(context.layout.columns_z(), -1..=3);
    }
}
