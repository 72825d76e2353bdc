use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const CONFIG_FILE_NAME: &str = "config.json";
const ENV_API_URL: &str = "REWORD_API_URL";
const ENV_DEFAULT_PROJECT: &str = "REWORD_DEFAULT_PROJECT";
const ENV_TIMEOUT_SECS: &str = "REWORD_TIMEOUT_SECS";

/// Effective settings after layering flag > environment > file > defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub default_project: Option<String>,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn load(api_url_override: Option<String>) -> AppResult<Self> {
        let stored = StoredConfig::load()?;
        Self::resolve(stored, |name| env::var(name).ok(), api_url_override)
    }

    fn resolve(
        stored: StoredConfig,
        lookup: impl Fn(&str) -> Option<String>,
        api_url_override: Option<String>,
    ) -> AppResult<Self> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let api_url = non_empty(api_url_override)
            .or_else(|| non_empty(lookup(ENV_API_URL)))
            .or_else(|| non_empty(stored.api_url))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let default_project =
            non_empty(lookup(ENV_DEFAULT_PROJECT)).or_else(|| non_empty(stored.default_project));

        let timeout_secs = match non_empty(lookup(ENV_TIMEOUT_SECS)) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                AppError::Configuration(format!(
                    "{ENV_TIMEOUT_SECS} must be a whole number of seconds, got '{raw}'"
                ))
            })?,
            None => stored.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(AppError::Configuration(
                "request timeout must be at least one second".to_string(),
            ));
        }

        Ok(Self {
            api_url,
            default_project,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// What `reword config init` writes to disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        Self::load_from(&config_file_path()?)
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(&config_file_path()?)
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                AppError::Configuration(format!("invalid config file {}: {err}", path.display()))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to encode config: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    ProjectDirs::from("", "", "reword")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| {
            AppError::Configuration("unable to determine a home directory".to_string())
        })
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}
