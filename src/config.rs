//! Configuration loading and management

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Overrides the directory sound assets are read from
pub const ASSETS_ENV: &str = "PATTERN_TRAINER_ASSETS";

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Directory holding `short.aac`, `long.aac` and `background.aac`
    pub assets_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME").context("HOME is not set")?;
        let data_dir = PathBuf::from(&home)
            .join(".local")
            .join("share")
            .join("pattern-trainer");

        let assets_dir = std::env::var_os(ASSETS_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("assets"));

        Ok(Self::with_dirs(data_dir, assets_dir))
    }

    fn with_dirs(data_dir: PathBuf, assets_dir: PathBuf) -> Self {
        let socket_path = data_dir.join("trainer.sock");

        Self {
            socket_path,
            data_dir,
            assets_dir,
        }
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_load() {
        let config = Config::load().unwrap();
        assert!(config.socket_path.to_string_lossy().contains("pattern-trainer"));
        assert!(config.socket_path.starts_with(&config.data_dir));
    }

    #[test]
    fn test_socket_lives_in_data_dir() {
        let config = Config::with_dirs(PathBuf::from("/tmp/pt"), PathBuf::from("/opt/sounds"));
        assert_eq!(config.socket_path, PathBuf::from("/tmp/pt/trainer.sock"));
        assert_eq!(config.assets_dir, PathBuf::from("/opt/sounds"));
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_dirs(dir.path().join("data"), dir.path().join("assets"));
        config.ensure_dirs().unwrap();
        assert!(config.data_dir.is_dir());
    }
}
