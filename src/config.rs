use crate::errors::{FileOperation, IoError};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV_VAR: &str = "UECLI_CONFIG";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("I/O error within config domain")]
    #[diagnostic(code(uecli::config::io))]
    Io(#[from] IoError),

    #[error("Unable to parse toml file at '{path}': {source}")]
    #[diagnostic(code(uecli::config::parse_toml), help("Review toml file"))]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unable to serialize config for '{path}'")]
    #[diagnostic(code(uecli::config::serialize_toml))]
    SerializeToml {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },

    #[error("Could not determine a configuration directory for this platform")]
    #[diagnostic(
        code(uecli::config::no_config_dir),
        help("Pass --config <FILE> or set the UECLI_CONFIG environment variable")
    )]
    NoConfigDir,
}

/// User settings shared by every subcommand.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Root of the Unreal Engine install.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_path: Option<PathBuf>,
    /// Folders searched when a project is referenced by name.
    #[serde(default)]
    pub project_paths: Vec<PathBuf>,
}
impl Config {
    /// Resolves where the config file lives: `$UECLI_CONFIG` first, then the
    /// platform config directory.
    pub fn default_location() -> Result<PathBuf, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Ok(PathBuf::from(path));
        }

        dirs::config_dir()
            .map(|dir| dir.join("uecli").join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Loads the config at `path`. A missing file yields the default config.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|error| IoError::new(FileOperation::Read, path.to_path_buf(), error))?;

        toml::from_str(&content).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        let content =
            toml::to_string_pretty(self).map_err(|source| ConfigError::SerializeToml {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|error| IoError::new(FileOperation::Mkdir, parent.to_path_buf(), error))?;
        }

        fs::write(path, content)
            .map_err(|error| IoError::new(FileOperation::Write, path.to_path_buf(), error))?;

        Ok(())
    }

    /// True when an Unreal Engine install is configured and present on disk.
    pub fn is_ready(&self) -> bool {
        self.engine_path
            .as_deref()
            .map(Path::is_dir)
            .unwrap_or(false)
    }
}
