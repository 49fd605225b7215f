use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::autosave::DEFAULT_AUTOSAVE_DELAY;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub storage: Option<StorageConfig>,
    pub notifications: Option<NotificationsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_path: Option<String>,
    pub autosave_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub filter: Option<String>,
}

/// Fully resolved settings, after flags, environment and config files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_path: Option<PathBuf>,
    pub autosave_delay: Duration,
    pub notifications: bool,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
            notifications: true,
            log_filter: "warn".to_string(),
        }
    }
}

/// Platform config directory path: `<config_dir>/sitconnect/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sitconnect").join("config.toml"))
}

/// Default store location: `<data_dir>/sitconnect/sitconnect.db`.
pub fn default_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("sitconnect").join("sitconnect.db"))
}

/// Load config by cascading CWD `.sitconnect.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".sitconnect.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        storage: Some(StorageConfig {
            data_path: overlay
                .storage
                .as_ref()
                .and_then(|s| s.data_path.clone())
                .or_else(|| base.storage.as_ref().and_then(|s| s.data_path.clone())),
            autosave_delay_ms: overlay
                .storage
                .as_ref()
                .and_then(|s| s.autosave_delay_ms)
                .or_else(|| base.storage.as_ref().and_then(|s| s.autosave_delay_ms)),
        }),
        notifications: Some(NotificationsConfig {
            enabled: overlay
                .notifications
                .as_ref()
                .and_then(|n| n.enabled)
                .or_else(|| base.notifications.as_ref().and_then(|n| n.enabled)),
        }),
        logging: Some(LoggingConfig {
            filter: overlay
                .logging
                .as_ref()
                .and_then(|l| l.filter.clone())
                .or_else(|| base.logging.as_ref().and_then(|l| l.filter.clone())),
        }),
    }
}

/// Save a config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, String> {
    let path = config_path().ok_or_else(|| "Could not determine config directory".to_string())?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(&path, content).map_err(|e| format!("Failed to write config: {}", e))?;
    Ok(path)
}

/// Apply the values that are `Some` in the file config onto `settings`.
/// Empty strings count as unset.
pub fn apply_to_settings(file_cfg: &ConfigFile, settings: &mut Settings) {
    if let Some(storage) = &file_cfg.storage {
        if let Some(ref path) = storage.data_path {
            if !path.is_empty() {
                settings.data_path = Some(PathBuf::from(path));
            }
        }
        if let Some(ms) = storage.autosave_delay_ms {
            settings.autosave_delay = Duration::from_millis(ms);
        }
    }
    if let Some(n) = &file_cfg.notifications {
        if let Some(enabled) = n.enabled {
            settings.notifications = enabled;
        }
    }
    if let Some(l) = &file_cfg.logging {
        if let Some(ref filter) = l.filter {
            if !filter.is_empty() {
                settings.log_filter = filter.clone();
            }
        }
    }
}

/// Convert resolved `Settings` into a `ConfigFile` for saving.
pub fn from_settings(settings: &Settings) -> ConfigFile {
    ConfigFile {
        storage: Some(StorageConfig {
            data_path: settings
                .data_path
                .as_ref()
                .map(|p| p.display().to_string()),
            autosave_delay_ms: Some(settings.autosave_delay.as_millis() as u64),
        }),
        notifications: Some(NotificationsConfig {
            enabled: Some(settings.notifications),
        }),
        logging: Some(LoggingConfig {
            filter: Some(settings.log_filter.clone()),
        }),
    }
}

/// Apply `SITCONNECT_DATA_PATH` and `SITCONNECT_AUTOSAVE_MS` from the environment.
pub fn apply_env(settings: &mut Settings) {
    apply_env_from(settings, |key| std::env::var(key).ok());
}

fn apply_env_from(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(path) = var("SITCONNECT_DATA_PATH").filter(|p| !p.is_empty()) {
        settings.data_path = Some(PathBuf::from(path));
    }
    if let Some(ms) = var("SITCONNECT_AUTOSAVE_MS").and_then(|v| v.parse().ok()) {
        settings.autosave_delay = Duration::from_millis(ms);
    }
}
