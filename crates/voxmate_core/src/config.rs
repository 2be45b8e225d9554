//! Startup configuration read from the environment.
//!
//! # Responsibility
//! - Resolve display names, directories, API keys and disabled features once.
//!
//! # Invariants
//! - Every directory in [`AssistantConfig`] is absolute.
//! - Blank environment values count as unset.

use crate::capability::{parse_capability, Capability, CapabilityError};
use crate::logging::default_log_level;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = ".voxmate";

/// Configuration failure.
#[derive(Debug)]
pub enum ConfigError {
    /// No home directory and a directory without an explicit override.
    MissingHome,
    /// A directory value is relative.
    RelativePath { key: &'static str, value: PathBuf },
    /// A directory could not be created or is not writable.
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },
    /// `VOXMATE_DISABLED_FEATURES` names an unknown capability.
    Capability(CapabilityError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHome => write!(
                f,
                "cannot resolve home directory; set VOXMATE_DATA_DIR, VOXMATE_LOG_DIR, VOXMATE_MUSIC_DIR and VOXMATE_SCREENSHOT_DIR"
            ),
            Self::RelativePath { key, value } => {
                write!(f, "{key} must be an absolute path, got `{}`", value.display())
            }
            Self::Directory { path, source } => {
                write!(f, "directory `{}` is not usable: {source}", path.display())
            }
            Self::Capability(err) => write!(f, "VOXMATE_DISABLED_FEATURES: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Directory { source, .. } => Some(source),
            Self::Capability(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CapabilityError> for ConfigError {
    fn from(value: CapabilityError) -> Self {
        Self::Capability(value)
    }
}

/// Resolved startup configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    pub user_name: String,
    pub bot_name: String,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub music_dir: PathBuf,
    pub screenshot_dir: PathBuf,
    pub openweather_app_id: Option<String>,
    pub news_api_key: Option<String>,
    pub tmdb_api_key: Option<String>,
    pub disabled: BTreeSet<Capability>,
}

impl AssistantConfig {
    /// Reads the process environment and the platform home directory.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), dirs::home_dir())
    }

    /// Builds the config from any key lookup. `home` roots every directory
    /// the lookup does not override.
    pub fn from_lookup<F>(lookup: F, home: Option<PathBuf>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let app_root = home.map(|home| home.join(APP_DIR_NAME));
        let dir = |key: &'static str, default_leaf: &str| -> Result<PathBuf, ConfigError> {
            let path = match get(key) {
                Some(value) => PathBuf::from(value),
                None => app_root
                    .as_ref()
                    .map(|root| root.join(default_leaf))
                    .ok_or(ConfigError::MissingHome)?,
            };
            if !path.is_absolute() {
                return Err(ConfigError::RelativePath { key, value: path });
            }
            Ok(path)
        };

        let disabled = match get("VOXMATE_DISABLED_FEATURES") {
            Some(raw) => raw
                .split(',')
                .filter(|part| !part.trim().is_empty())
                .map(parse_capability)
                .collect::<Result<BTreeSet<_>, _>>()?,
            None => BTreeSet::new(),
        };

        Ok(Self {
            user_name: get("USER").unwrap_or_else(|| "User".to_string()),
            bot_name: get("BOTNAME").unwrap_or_else(|| "Assistant".to_string()),
            data_dir: dir("VOXMATE_DATA_DIR", "data")?,
            log_dir: dir("VOXMATE_LOG_DIR", "logs")?,
            log_level: get("VOXMATE_LOG_LEVEL").unwrap_or_else(|| default_log_level().to_string()),
            music_dir: dir("VOXMATE_MUSIC_DIR", "music")?,
            screenshot_dir: dir("VOXMATE_SCREENSHOT_DIR", "screenshots")?,
            openweather_app_id: get("OPENWEATHER_APP_ID"),
            news_api_key: get("NEWS_API_KEY"),
            tmdb_api_key: get("TMDB_API_KEY"),
            disabled,
        })
    }

    /// Config rooted at `root`, with no API keys. Used by tests and `say`.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            user_name: "User".to_string(),
            bot_name: "Assistant".to_string(),
            data_dir: root.join("data"),
            log_dir: root.join("logs"),
            log_level: default_log_level().to_string(),
            music_dir: root.join("music"),
            screenshot_dir: root.join("screenshots"),
            openweather_app_id: None,
            news_api_key: None,
            tmdb_api_key: None,
            disabled: BTreeSet::new(),
        }
    }

    /// Creates the data and log directories and checks the data directory is
    /// writable. These are the launcher's mandatory dependencies.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        for (key, path) in [("data_dir", &self.data_dir), ("log_dir", &self.log_dir)] {
            if !path.is_absolute() {
                return Err(ConfigError::RelativePath {
                    key,
                    value: path.clone(),
                });
            }
            std::fs::create_dir_all(path).map_err(|source| ConfigError::Directory {
                path: path.clone(),
                source,
            })?;
        }

        let probe = self.data_dir.join(".write_probe");
        std::fs::write(&probe, b"ok").map_err(|source| ConfigError::Directory {
            path: self.data_dir.clone(),
            source,
        })?;
        let _ = std::fs::remove_file(&probe);
        Ok(())
    }
}
