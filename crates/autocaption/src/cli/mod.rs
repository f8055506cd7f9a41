//! Command implementations.

pub mod caption;
pub mod config;
pub mod serve;
pub mod types;

use std::path::Path;

use autocaption_core::Config;

/// Load configuration for a command.
///
/// An explicit `--config` path must load cleanly. The default location falls
/// back to built-in defaults with a warning when the file is broken.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        return Config::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()));
    }

    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `autocaption config path`."
            );
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9100\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_invalid_explicit_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[caption]\nmin_length = 300\nmax_length = 200\n").unwrap();

        assert!(load_config(Some(&path)).is_err());
    }
}
