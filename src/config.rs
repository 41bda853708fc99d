use crate::error::{Result, SubtransError};
use crate::translate::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub source_language: String,
    pub target_language: String,
    pub preserve_formatting: bool,
    pub max_retries: u32,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            source_language: "en".to_string(),
            target_language: "ko".to_string(),
            preserve_formatting: true,
            max_retries: 0,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Config file, then environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_file_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Read a config file; a missing file gives the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        match toml::from_str::<Config>(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!("Ignoring malformed config file {:?}: {}", path, e);
                Ok(Self::default())
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.gemini_api_key = Some(key);
        }
        if let Ok(model) = std::env::var("SUBTRANS_MODEL") {
            self.model = model;
        }
        if let Ok(base) = std::env::var("SUBTRANS_API_BASE") {
            self.api_base = base;
        }
        if let Ok(retries) = std::env::var("SUBTRANS_MAX_RETRIES") {
            if let Ok(r) = retries.parse() {
                self.max_retries = r;
            }
        }
    }

    /// Write to the default config location.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path().ok_or_else(|| {
            SubtransError::Config("No config directory available on this system".to_string())
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let toml_content = toml::to_string_pretty(self)
            .map_err(|e| SubtransError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, toml_content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        match self.gemini_api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(SubtransError::Config(
                    "GEMINI_API_KEY not set. Get one at https://aistudio.google.com/apikey"
                        .to_string(),
                ))
            }
        }

        if self.model.trim().is_empty() {
            return Err(SubtransError::Config("Model name must not be empty".to_string()));
        }

        if self.api_base.trim().is_empty() {
            return Err(SubtransError::Config("API base URL must not be empty".to_string()));
        }

        Ok(())
    }

    pub fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("subtrans").join("config.toml"))
    }
}
