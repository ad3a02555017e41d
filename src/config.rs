//! Ambient on-disk configuration: the handful of knobs the CLI persists
//! between runs (default padding proportion).
//!
//! Mirrors the teacher's `config.rs` shape (TOML file under the OS config
//! dir, overridable by an env var, atomic write via `tempfile`) but without
//! the profile CRUD / schema-migration machinery the teacher needed for
//! many named password-generation profiles — Covert only ever has one
//! config document.

use std::env;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use dirs::config_dir;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

const CONFIG_ENV: &str = "COVERT_CONFIG";
const APP_DIR: &str = "covert";
const CONFIG_FILE_NAME: &str = "config.toml";
const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug)]
pub enum ConfigError {
    ConfigDirUnavailable,
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
    UnsupportedSchemaVersion(u32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ConfigDirUnavailable => write!(f, "unable to determine configuration directory"),
            ConfigError::Io(err) => write!(f, "filesystem error: {err}"),
            ConfigError::Parse(err) => write!(f, "failed to parse config: {err}"),
            ConfigError::Serialize(err) => write!(f, "failed to serialize config: {err}"),
            ConfigError::UnsupportedSchemaVersion(version) => write!(f, "config schema version '{version}' is not supported"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Serialize(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CovertConfig {
    schema_version: u32,
    pub default_pad: f64,
}

impl Default for CovertConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            default_pad: crate::container::archive::DEFAULT_PAD_PROPORTION,
        }
    }
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    let mut dir = config_dir().ok_or(ConfigError::ConfigDirUnavailable)?;
    dir.push(APP_DIR);
    fs::create_dir_all(&dir).map_err(ConfigError::Io)?;
    dir.push(CONFIG_FILE_NAME);
    Ok(dir)
}

pub fn load() -> Result<CovertConfig, ConfigError> {
    load_from(&config_path()?)
}

fn load_from(path: &Path) -> Result<CovertConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let config: CovertConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
            if config.schema_version > CURRENT_SCHEMA_VERSION {
                return Err(ConfigError::UnsupportedSchemaVersion(config.schema_version));
            }
            Ok(config)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(CovertConfig::default()),
        Err(err) => Err(ConfigError::Io(err)),
    }
}

pub fn save(config: &CovertConfig) -> Result<(), ConfigError> {
    save_to(&config_path()?, config)
}

fn save_to(path: &Path, config: &CovertConfig) -> Result<(), ConfigError> {
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    if !parent.exists() {
        fs::create_dir_all(&parent).map_err(ConfigError::Io)?;
    }

    let toml = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;
    let mut temp = NamedTempFile::new_in(&parent).map_err(ConfigError::Io)?;
    temp.write_all(toml.as_bytes()).map_err(ConfigError::Io)?;
    temp.flush().map_err(ConfigError::Io)?;
    temp.persist(path).map_err(|err| ConfigError::Io(err.error))?;
    Ok(())
}
