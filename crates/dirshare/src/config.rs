//! Persisted user preferences.
//!
//! The configuration lives in a single JSON file. On first run the file is
//! seeded from the bundled template; afterwards every mutation is flushed to
//! disk before the mutating call returns.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, error, info};

use crate::error::ConfigError;
use crate::recency::RecencyList;

/// Default configuration shipped with the binary.
pub const DEFAULT_TEMPLATE: &str = include_str!("../assets/configs.json");

/// Port used when neither the environment nor the config file sets one.
pub const DEFAULT_PORT: u16 = 8080;

/// Config file name inside the application config directory.
pub const CONFIG_FILE_NAME: &str = "configs.json";

/// Dirshare configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
    /// Preferred listen port
    #[serde(default = "default_port", deserialize_with = "deserialize_port")]
    pub port: u16,

    /// UI theme preference
    #[serde(default)]
    pub theme: Theme,

    /// Directories served recently, most recent first
    #[serde(default)]
    pub recently_opened: RecencyList,

    /// Update notification bookkeeping, owned by the update checker
    #[serde(default)]
    pub update_status: UpdateStatus,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            port: default_port(),
            theme: Theme::default(),
            recently_opened: RecencyList::default(),
            update_status: UpdateStatus::default(),
        }
    }
}

impl Configuration {
    /// The bundled defaults, falling back to compiled defaults if the template is unusable.
    pub fn bundled() -> Self {
        serde_json::from_str(DEFAULT_TEMPLATE).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl FromStr for Theme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Theme::System),
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(ConfigError::InvalidTheme(s.to_string())),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Theme::System => "system",
            Theme::Light => "light",
            Theme::Dark => "dark",
        };
        f.write_str(name)
    }
}

/// Version-alert state kept on behalf of the update checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateStatus {
    #[serde(default)]
    pub current_version: String,
    #[serde(default)]
    pub last_alerted_version: String,
    #[serde(default)]
    pub alert_count: u32,
}

impl Default for UpdateStatus {
    fn default() -> Self {
        Self {
            current_version: env!("CARGO_PKG_VERSION").to_string(),
            last_alerted_version: env!("CARGO_PKG_VERSION").to_string(),
            alert_count: 0,
        }
    }
}

/// Parse user-supplied port text.
///
/// Only plain decimal digits in `1..=65535` are accepted.
pub fn parse_port(input: &str) -> Result<u16, ConfigError> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConfigError::InvalidPort(input.to_string()));
    }
    match input.parse::<u16>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidPort(input.to_string())),
        Ok(port) => Ok(port),
    }
}

/// Older config files store the port as a string.
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPort {
        Number(u64),
        Text(String),
    }

    let invalid = |shown: String| serde::de::Error::custom(format!("invalid port {shown:?}"));
    match RawPort::deserialize(deserializer)? {
        RawPort::Number(n) => match u16::try_from(n) {
            Ok(port) if port != 0 => Ok(port),
            _ => Err(invalid(n.to_string())),
        },
        RawPort::Text(text) => parse_port(&text).map_err(|_| invalid(text)),
    }
}

/// Default location of the config file for the current user.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dirshare")
        .join(CONFIG_FILE_NAME)
}

/// The configuration file plus its in-memory copy.
///
/// The in-memory copy is authoritative: a failed save is reported to the
/// caller but the mutation is kept.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    config: Configuration,
}

impl ConfigStore {
    /// Open the config file, seeding it from the bundled template when missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();

        if !path.exists() {
            info!("Creating {} from bundled defaults", path.display());
            atomic_write(&path, DEFAULT_TEMPLATE.as_bytes())?;
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config: Configuration =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;

        debug!("Loaded configuration from {}", path.display());
        Ok(Self { path, config })
    }

    /// Use the bundled defaults in memory, still saving to `path` on change.
    pub fn with_defaults(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Configuration::bundled(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Apply `change` in memory, then flush the whole configuration to disk.
    pub fn update<F>(&mut self, change: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Configuration),
    {
        change(&mut self.config);
        self.save()
    }

    /// Write the in-memory configuration to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let content = serde_json::to_vec_pretty(&self.config)?;
        atomic_write(&self.path, &content)
    }
}

/// Write via a sibling temp file and rename so a crash never leaves a torn file.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), ConfigError> {
    let write_error = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, content).map_err(|e| {
        error!("Failed to write {}: {}", tmp_path.display(), e);
        write_error(e)
    })?;

    std::fs::rename(&tmp_path, path).map_err(|e| {
        error!(
            "Failed to move {} to {}: {}",
            tmp_path.display(),
            path.display(),
            e
        );
        let _ = std::fs::remove_file(&tmp_path);
        write_error(e)
    })
}
