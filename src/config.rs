//! Configuration: `.env` loading, the settings file, and API key lookup.
//!
//! Sources, highest priority first:
//!   1. Environment variables (`GEMINI_API_KEY`, `GEMINI_MODEL`, ...),
//!      optionally seeded from `.env.local` / `.env`
//!   2. `~/.config/overthinkr/settings.json`
//!   3. Built-in defaults
//!
//! The API key may also come from the OS keychain. Whatever the source,
//! the result is an explicit [`GeminiConfig`] handed to the client.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";

const API_KEY_ENV: &str = "GEMINI_API_KEY";
const KEYRING_SERVICE: &str = "overthinkr";
const KEYRING_USER: &str = "gemini";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No Gemini API key configured. Set GEMINI_API_KEY or run `overthinkr key set <KEY>`.")]
    MissingApiKey,

    #[error("Keyring error: {0}")]
    Keyring(String),

    #[error("Failed to write settings file '{path}': {detail}")]
    SettingsWrite { path: PathBuf, detail: String },
}

/// User-editable settings persisted as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub model: String,
    pub endpoint: String,
    pub ocr_language: String,
    /// Explicit tesseract binary; `None` searches `PATH`.
    pub tesseract_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            ocr_language: DEFAULT_OCR_LANGUAGE.to_string(),
            tesseract_path: None,
        }
    }
}

impl Settings {
    /// Load from the default settings file, then apply env overrides.
    pub fn load() -> Self {
        let mut settings = Self::load_from(&settings_path());
        settings.apply_env();
        settings
    }

    /// Load from `path`. Missing or invalid files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("[CONFIG] Ignoring invalid {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Persist to `path`, creating the parent directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |detail: String| ConfigError::SettingsWrite {
            path: path.to_path_buf(),
            detail,
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| write_err(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| write_err(e.to_string()))?;
        log::info!("[CONFIG] Saved settings to {}", path.display());
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Some(model) = non_empty_env("GEMINI_MODEL") {
            self.model = model;
        }
        if let Some(endpoint) = non_empty_env("GEMINI_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(lang) = non_empty_env("OCR_LANGUAGE") {
            self.ocr_language = lang;
        }
        if let Some(path) = non_empty_env("TESSERACT_PATH") {
            self.tesseract_path = Some(PathBuf::from(path));
        }
    }
}

/// Everything the analysis client needs, passed in at construction.
#[derive(Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &format_args!("<{} chars>", self.api_key.len()))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Build from settings plus a resolved API key.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let api_key = resolve_api_key().ok_or(ConfigError::MissingApiKey)?;
        Ok(Self {
            api_key,
            model: settings.model.clone(),
            endpoint: settings.endpoint.clone(),
        })
    }

    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

/// Directory holding Overthinkr's settings.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("overthinkr")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Load `.env.local`, falling back to `.env`, from the working directory.
///
/// Variables already set in the environment are not overwritten. Returns
/// the file that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    for env_file in [".env.local", ".env"] {
        let path = Path::new(env_file);
        if path.exists() {
            match dotenvy::from_path(path) {
                Ok(_) => return Some(path.to_path_buf()),
                Err(e) => {
                    eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e);
                    return None;
                }
            }
        }
    }
    None
}

/// Find the Gemini API key: env var first, then the OS keychain.
pub fn resolve_api_key() -> Option<String> {
    if let Some(key) = non_empty_env(API_KEY_ENV) {
        return Some(key);
    }

    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER).ok()?;
    match entry.get_password() {
        Ok(key) if !key.is_empty() => {
            log::info!("[CONFIG] Loaded Gemini key from OS keychain");
            Some(key)
        }
        _ => None,
    }
}

/// Store the Gemini API key in the OS keychain.
pub fn save_api_key(api_key: &str) -> Result<(), ConfigError> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(ConfigError::MissingApiKey);
    }
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)
        .map_err(|e| ConfigError::Keyring(e.to_string()))?;
    entry
        .set_password(api_key)
        .map_err(|e| ConfigError::Keyring(e.to_string()))?;
    log::info!("[CONFIG] Gemini key saved to OS keychain");
    Ok(())
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
