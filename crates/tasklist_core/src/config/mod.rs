use crate::error::AppError;
use crate::storage::json_store::app_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKLIST_CONFIG_PATH";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// ANSI styling for list rows. Empty codes mean plain output.
#[derive(Debug, Clone)]
pub struct Palette {
    pub pending: &'static str,
    pub done: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn paint(&self, text: &str, done: bool) -> String {
        let code = if done { self.done } else { self.pending };
        if code.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", code, text, self.reset)
        }
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match theme.map(canonical_theme_name).as_deref() {
        Some("noir") => Palette {
            pending: "\x1b[38;5;208m",
            done: "\x1b[9;38;5;244m",
            reset: "\x1b[0m",
        },
        Some("solarized") => Palette {
            pending: "\x1b[38;5;108m",
            done: "\x1b[9;38;5;246m",
            reset: "\x1b[0m",
        },
        _ => Palette {
            pending: "",
            done: "",
            reset: "",
        },
    }
}

/// Lowercases, collapses separators to `_`, and maps aliases
/// (`light`, `vanilla` -> `default`; `dark`, `dark_mode` -> `noir`).
pub fn canonical_theme_name(raw: &str) -> String {
    let cleaned = raw
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_");

    match cleaned.as_str() {
        "" | "vanilla" | "light" => "default".to_string(),
        "dark" | "dark_mode" | "darkmode" => "noir".to_string(),
        _ => cleaned,
    }
}

pub fn normalize_log_level(raw: &str) -> Option<&'static str> {
    let lowered = raw.trim().to_ascii_lowercase();
    let lowered = if lowered == "warning" { "warn".to_string() } else { lowered };
    LOG_LEVELS.iter().copied().find(|level| *level == lowered)
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Config {
    pub fn log_level(&self) -> &'static str {
        self.log_level
            .as_deref()
            .and_then(normalize_log_level)
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub log_level: Option<String>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(app_dir()?.join(CONFIG_FILE_NAME))
}

/// Loads the config file, substituting defaults when it is missing or
/// unusable. Only the unusable case reports an error.
pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let mut config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;

    config.theme = config.theme.map(|name| canonical_theme_name(&name));
    if let Some(level) = config.log_level.as_deref() {
        let normalized = normalize_log_level(level).ok_or_else(|| {
            AppError::invalid_data(format!(
                "unknown log_level '{}' in {}",
                level,
                path.display()
            ))
        })?;
        config.log_level = Some(normalized.to_string());
    }

    Ok(config)
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme.as_deref() {
        merged.theme = Some(canonical_theme_name(theme));
    }
    if let Some(level) = overrides.log_level.as_deref().and_then(normalize_log_level) {
        merged.log_level = Some(level.to_string());
    }
    merged
}
