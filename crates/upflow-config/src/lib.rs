pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const CONFIG_PATH_ENV: &str = "UPFLOW_CONFIG_PATH";
pub const LOCATION_ENV: &str = "UPFLOW_LOCATION";
pub const USERNAME_ENV: &str = "UPFLOW_USERNAME";

/// User configuration
///
/// Every field is optional; unset fields fall back to what the platform
/// account reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Location for new resources
    pub location: Option<String>,

    /// Name used when deriving group and registry names
    pub username: Option<String>,

    /// Default tracing filter, e.g. `info` or `upflow_core=debug`
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration, then apply environment overrides.
    ///
    /// Search order:
    /// 1. `UPFLOW_CONFIG_PATH` (direct path)
    /// 2. `~/.config/upflow/config.yaml`
    ///
    /// A missing file yields the default configuration.
    pub fn load() -> Result<Self> {
        let mut config = match find_config_file() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    fn apply_env(&mut self) {
        if let Some(location) = non_empty_env(LOCATION_ENV) {
            self.location = Some(location);
        }
        if let Some(username) = non_empty_env(USERNAME_ENV) {
            self.username = Some(username);
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Upflow's configuration directory, e.g. `~/.config/upflow`.
/// The directory may not exist.
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(config_dir.join("upflow"))
}

/// Locate the configuration file, if there is one
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Some(path);
        }
    }

    let global = get_config_dir().ok()?.join(CONFIG_FILE_NAME);
    global.exists().then_some(global)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    fn clear_env() {
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
            std::env::remove_var(LOCATION_ENV);
            std::env::remove_var(USERNAME_ENV);
        }
    }

    /// `dirs` honours `XDG_CONFIG_HOME` on Linux only
    #[cfg(target_os = "linux")]
    #[test]
    #[serial]
    fn test_global_config_file() {
        clear_env();
        let previous = std::env::var_os("XDG_CONFIG_HOME");
        let temp_dir = tempfile::tempdir().unwrap();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }

        let config_dir = get_config_dir().unwrap();
        assert_eq!(config_dir, temp_dir.path().join("upflow"));
        assert!(!config_dir.exists());
        assert_eq!(find_config_file(), None);
        assert_eq!(Config::load().unwrap(), Config::default());

        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(CONFIG_FILE_NAME), "username: mito\n").unwrap();
        assert_eq!(find_config_file(), Some(config_dir.join(CONFIG_FILE_NAME)));
        assert_eq!(Config::load().unwrap().username.as_deref(), Some("mito"));

        unsafe {
            match previous {
                Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
                None => std::env::remove_var("XDG_CONFIG_HOME"),
            }
        }
    }

    #[test]
    fn test_parse_partial_yaml() {
        let config = Config::from_yaml("location: westeurope\n").unwrap();
        assert_eq!(config.location.as_deref(), Some("westeurope"));
        assert_eq!(config.username, None);

        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    #[serial]
    fn test_load_from_env_path() {
        clear_env();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("custom.yaml");
        fs::write(&path, "location: japaneast\nusername: mito\nlog_level: debug\n").unwrap();

        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, path.to_str().unwrap());
        }

        let config = Config::load().unwrap();
        assert_eq!(config.location.as_deref(), Some("japaneast"));
        assert_eq!(config.username.as_deref(), Some("mito"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "location: japaneast\n").unwrap();

        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, path.to_str().unwrap());
            std::env::set_var(LOCATION_ENV, "eastus2");
            std::env::set_var(USERNAME_ENV, "ci-bot");
        }

        let config = Config::load().unwrap();
        assert_eq!(config.location.as_deref(), Some("eastus2"));
        assert_eq!(config.username.as_deref(), Some("ci-bot"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_yaml_is_reported() {
        clear_env();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "location: [unclosed\n").unwrap();

        match Config::from_file(&path) {
            Err(ConfigError::Parse { path: p, .. }) => assert!(p.ends_with("config.yaml")),
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }
}
