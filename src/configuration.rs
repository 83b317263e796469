//! Read-only user configuration.
//!
//! Settings come from `~/.config/orbit/config.toml` when it exists, overlaid by `ORBIT_*`
//! environment variables (`ORBIT_PRIVILEGE_COMMAND=sudo`, `ORBIT_DISABLED_SOURCES=Snap,DNF`).
//! Orbit never writes the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use derive_builder::Builder;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use crate::data::SourceKind;
use crate::errors::Result;
use crate::sources::DEFAULT_PRIVILEGE_COMMAND;
use crate::Exportable;

const ENV_PREFIX: &str = "ORBIT";
const LIST_KEYS: [&str; 2] = ["disabled_sources", "appimage_scan_dirs"];

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Builder, Validate)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct OrbitConfig {
    pub auto_update_check: bool,
    /// Seconds between background update checks.
    #[validate(range(min = 60, message = "update_check_interval must be at least 60 seconds"))]
    pub update_check_interval: u64,
    pub preferred_source: SourceKind,
    /// Directories searched (non-recursively) for AppImage files.
    pub appimage_scan_dirs: Vec<PathBuf>,
    pub backup_location: PathBuf,
    pub show_notifications: bool,
    pub log_level: String,
    /// Program used to run system-wide changes as root.
    #[validate(length(min = 1, message = "privilege_command must not be empty"))]
    pub privilege_command: String,
    /// Upper bound for a single tool invocation. Unset means wait indefinitely.
    #[validate(range(min = 1, message = "command_timeout_secs must be at least 1"))]
    pub command_timeout_secs: Option<u64>,
    /// Sources that are never registered.
    pub disabled_sources: Vec<SourceKind>,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        let home = home_dir();
        OrbitConfig {
            auto_update_check: true,
            update_check_interval: 86_400,
            preferred_source: SourceKind::Flatpak,
            appimage_scan_dirs: vec![
                home.join("Applications"),
                home.join(".local/bin"),
                PathBuf::from("/opt"),
            ],
            backup_location: home.join("Documents").join("orbit_backups"),
            show_notifications: true,
            log_level: "WARN".to_string(),
            privilege_command: DEFAULT_PRIVILEGE_COMMAND.to_string(),
            command_timeout_secs: None,
            disabled_sources: Vec::new(),
        }
    }
}

impl Exportable for OrbitConfig {}

impl OrbitConfig {
    /// `~/.config/orbit/config.toml`, or `None` when no home directory can be resolved.
    pub fn default_path() -> Option<PathBuf> {
        BaseDirs::new().map(|dirs| dirs.config_dir().join("orbit").join("config.toml"))
    }

    /// Loads the default file (if any) plus the environment.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::load_layered(None, ENV_PREFIX),
        }
    }

    /// Loads `file` (optional on disk) plus the environment.
    pub fn load_from(file: &Path) -> Result<Self> {
        Self::load_layered(Some(file), ENV_PREFIX)
    }

    fn load_layered(file: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            debug!("Loading config from: {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        let mut env = Environment::with_prefix(env_prefix)
            .try_parsing(true)
            .list_separator(",");
        for key in LIST_KEYS {
            env = env.with_list_parse_key(key);
        }

        let mut config: OrbitConfig = builder.add_source(env).build()?.try_deserialize()?;
        config.expand_paths();
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document, without consulting the environment.
    pub fn load_from_str(toml: &str) -> Result<Self> {
        let mut config: OrbitConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.expand_paths();
        config.validate()?;
        Ok(config)
    }

    fn expand_paths(&mut self) {
        for dir in &mut self.appimage_scan_dirs {
            *dir = expand_home(dir);
        }
        self.backup_location = expand_home(&self.backup_location);
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    pub fn is_source_enabled(&self, source: SourceKind) -> bool {
        !self.disabled_sources.contains(&source)
    }
}

fn home_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Replaces a leading `~` with the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home_dir().join(rest),
        Err(_) => path.to_path_buf(),
    }
}
