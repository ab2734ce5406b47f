//! Configuration Loader
//!
//! Handles loading and merging client configuration from multiple sources.
//! Later sources override earlier ones: defaults, then JSON files, then
//! `DIAMOND_*` environment variables.

use crate::config::settings::DiamondConfig;
use crate::error::{DiamondError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable pointing at an explicit config file
pub const CONFIG_PATH_ENV: &str = "DIAMOND_CONFIG_PATH";

/// Partial configuration from one source
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverlay {
    endpoint: Option<String>,
    access_key: Option<String>,
    secret_key: Option<String>,
    ram_role_name: Option<String>,
    namespace: Option<String>,
    data_id: Option<String>,
    groups: Option<String>,
    server_port: Option<u16>,
    ram_metadata_url: Option<String>,
    timeout_secs: Option<u64>,
}

/// Configuration loader with support for multiple sources
///
/// Precedence, lowest to highest: built-in defaults,
/// `~/.diamond-pull/config.json`, `<config_dir>/diamond-pull/config.json`,
/// `./diamond.json`, the file named by `DIAMOND_CONFIG_PATH`, then `DIAMOND_*`
/// environment variables. [`ConfigLoader::from_path`] replaces the file
/// search with the one given path; environment variables still win.
pub struct ConfigLoader {
    config: DiamondConfig,
}

impl ConfigLoader {
    /// Create a new config loader and load from default locations
    pub fn new() -> Result<Self> {
        let mut loader = Self {
            config: DiamondConfig::default(),
        };

        loader.load_from_default_paths()?;
        loader.apply_env_from(|key| std::env::var(key).ok())?;

        Ok(loader)
    }

    /// Create a loader with a specific config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut loader = Self {
            config: DiamondConfig::default(),
        };

        loader.load_from_file(path)?;
        loader.apply_env_from(|key| std::env::var(key).ok())?;

        Ok(loader)
    }

    /// Load configuration from default paths
    fn load_from_default_paths(&mut self) -> Result<()> {
        for path in Self::get_config_paths() {
            if path.exists() {
                self.load_from_file(&path)?;
            }
        }

        Ok(())
    }

    /// Get list of config paths to check, lowest precedence first
    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. Home directory
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".diamond-pull").join("config.json"));
        }

        // 2. User config directory
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("diamond-pull").join("config.json"));
        }

        // 3. Current directory
        paths.push(PathBuf::from("diamond.json"));

        // 4. Environment variable
        if let Ok(custom_path) = std::env::var(CONFIG_PATH_ENV) {
            paths.push(PathBuf::from(custom_path));
        }

        paths
    }

    /// Load configuration from a specific file
    fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DiamondError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let overlay: ConfigOverlay = serde_json::from_str(&content).map_err(|e| {
            DiamondError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        self.merge(overlay);
        Ok(())
    }

    /// Override fields from `DIAMOND_*` variables resolved through `lookup`
    fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let parse_num = |key: &str, value: String| {
            value.parse::<u64>().map_err(|e| {
                DiamondError::Config(format!("Invalid value for {}: '{}' ({})", key, value, e))
            })
        };

        let server_port = match lookup("DIAMOND_SERVER_PORT") {
            Some(value) => {
                let port = parse_num("DIAMOND_SERVER_PORT", value)?;
                Some(u16::try_from(port).map_err(|_| {
                    DiamondError::Config(format!("DIAMOND_SERVER_PORT out of range: {}", port))
                })?)
            }
            None => None,
        };
        let timeout_secs = lookup("DIAMOND_TIMEOUT_SECS")
            .map(|value| parse_num("DIAMOND_TIMEOUT_SECS", value))
            .transpose()?;

        self.merge(ConfigOverlay {
            endpoint: lookup("DIAMOND_ENDPOINT"),
            access_key: lookup("DIAMOND_ACCESS_KEY"),
            secret_key: lookup("DIAMOND_SECRET_KEY"),
            ram_role_name: lookup("DIAMOND_RAM_ROLE_NAME"),
            namespace: lookup("DIAMOND_NAMESPACE"),
            data_id: lookup("DIAMOND_DATA_ID"),
            groups: lookup("DIAMOND_GROUPS"),
            server_port,
            ram_metadata_url: lookup("DIAMOND_RAM_METADATA_URL"),
            timeout_secs,
        });
        Ok(())
    }

    /// Merge a partial config into this one (set fields override)
    fn merge(&mut self, overlay: ConfigOverlay) {
        let config = &mut self.config;

        if let Some(endpoint) = overlay.endpoint {
            config.endpoint = endpoint;
        }
        if overlay.access_key.is_some() {
            config.access_key = overlay.access_key;
        }
        if overlay.secret_key.is_some() {
            config.secret_key = overlay.secret_key;
        }
        if overlay.ram_role_name.is_some() {
            config.ram_role_name = overlay.ram_role_name;
        }
        if let Some(namespace) = overlay.namespace {
            config.namespace = namespace;
        }
        if let Some(data_id) = overlay.data_id {
            config.data_id = data_id;
        }
        if overlay.groups.is_some() {
            config.groups = overlay.groups;
        }
        if let Some(port) = overlay.server_port {
            config.server_port = port;
        }
        if let Some(url) = overlay.ram_metadata_url {
            config.ram_metadata_url = url;
        }
        if let Some(timeout) = overlay.timeout_secs {
            config.timeout_secs = timeout;
        }
    }

    /// Configuration merged so far, without consuming the loader
    pub fn config(&self) -> &DiamondConfig {
        &self.config
    }

    /// Take ownership of the configuration
    pub fn into_config(self) -> DiamondConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn empty_loader() -> ConfigLoader {
        ConfigLoader {
            config: DiamondConfig::default(),
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
                "endpoint": "cfg.example.com",
                "ram_role_name": "app-role",
                "namespace": "ns",
                "data_id": "app.json",
                "groups": "g1,g2",
                "server_port": 9090
            }}"#
        )
        .unwrap();

        let mut loader = empty_loader();
        loader.load_from_file(file.path()).unwrap();

        let config = loader.config();
        assert_eq!(config.endpoint, "cfg.example.com");
        assert_eq!(config.ram_role_name(), Some("app-role"));
        assert_eq!(config.server_port, 9090);
        assert_eq!(config.timeout_secs, crate::config::DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "endpoint": 42 }}"#).unwrap();

        let mut loader = empty_loader();
        let err = loader.load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, DiamondError::Config(_)));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "endpont": "typo.example.com" }}"#).unwrap();

        let mut loader = empty_loader();
        assert!(loader.load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_later_sources_override() {
        let mut loader = empty_loader();
        loader.merge(ConfigOverlay {
            endpoint: Some("first.example.com".to_string()),
            namespace: Some("ns".to_string()),
            ..Default::default()
        });
        loader.merge(ConfigOverlay {
            endpoint: Some("second.example.com".to_string()),
            ..Default::default()
        });

        assert_eq!(loader.config().endpoint, "second.example.com");
        assert_eq!(loader.config().namespace, "ns");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DIAMOND_ENDPOINT", "env.example.com"),
            ("DIAMOND_ACCESS_KEY", "AK"),
            ("DIAMOND_SECRET_KEY", "SK"),
            ("DIAMOND_GROUPS", "a,b"),
            ("DIAMOND_SERVER_PORT", "8081"),
        ]
        .into_iter()
        .collect();

        let mut loader = empty_loader();
        loader
            .apply_env_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        let config = loader.config();
        assert_eq!(config.endpoint, "env.example.com");
        assert_eq!(config.access_key(), Some("AK"));
        assert_eq!(config.group_names(), vec!["a", "b"]);
        assert_eq!(config.server_port, 8081);
    }

    #[test]
    fn test_env_wins_over_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{ "endpoint": "file.example.com", "namespace": "file-ns" }}"#
        )
        .unwrap();

        let mut loader = empty_loader();
        loader.load_from_file(file.path()).unwrap();
        loader
            .apply_env_from(|key| (key == "DIAMOND_ENDPOINT").then(|| "env.example.com".into()))
            .unwrap();

        assert_eq!(loader.config().endpoint, "env.example.com");
        assert_eq!(loader.config().namespace, "file-ns");
    }

    #[test]
    fn test_local_file_outranks_user_dirs() {
        let paths = ConfigLoader::get_config_paths();
        let local = paths
            .iter()
            .position(|p| p == Path::new("diamond.json"))
            .unwrap();

        for user_path in paths[..local].iter() {
            assert!(user_path.ends_with("config.json"));
        }
        assert!(paths[local + 1..].len() <= 1);
    }

    #[test]
    fn test_invalid_env_number() {
        let mut loader = empty_loader();
        let err = loader
            .apply_env_from(|key| (key == "DIAMOND_SERVER_PORT").then(|| "99999".to_string()))
            .unwrap_err();
        assert!(matches!(err, DiamondError::Config(_)));
    }
}
