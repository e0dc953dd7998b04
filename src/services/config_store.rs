// Configuration Storage Service
// JSON config under the platform config dir: API keys and base-URL
// overrides for both upstream services.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Config-file keys for the two upstream services.
pub const DETECTOR_SERVICE: &str = "detector";
pub const HUMANIZER_SERVICE: &str = "humanizer";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub version: String,
    #[serde(default)]
    pub services: HashMap<String, ServiceConfig>,
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
    /// Humanization options applied when the caller supplies none.
    #[serde(default)]
    pub humanize_defaults: Option<crate::models::HumanizeOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    pub base_url: Option<String>,
}

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("veritext"))
    }

    fn ensure_dir(&self) -> Result<(), String> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| format!("Failed to create config dir: {}", e))
    }

    /// Load configuration from file
    pub fn load(&self) -> Result<AppConfig, String> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)
            .map_err(|e| format!("Failed to read config: {}", e))?;

        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig) -> Result<(), String> {
        self.ensure_dir()?;

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&self.config_file, content)
            .map_err(|e| format!("Failed to write config: {}", e))
    }

    /// Get service API key from config file
    pub fn get_api_key(&self, service: &str) -> Result<Option<String>, String> {
        let config = self.load()?;
        Ok(config.api_keys.get(service).cloned())
    }

    /// Store service API key in config file
    pub fn set_api_key(&self, service: &str, key: &str) -> Result<(), String> {
        let mut config = self.load()?;
        config.api_keys.insert(service.to_string(), key.to_string());
        self.save(&config)
    }

    /// Delete service API key from config file
    pub fn delete_api_key(&self, service: &str) -> Result<(), String> {
        let mut config = self.load()?;
        config.api_keys.remove(service);
        self.save(&config)
    }

    /// Get service base URL from config file
    pub fn get_base_url(&self, service: &str) -> Result<Option<String>, String> {
        let config = self.load()?;
        Ok(config.services.get(service).and_then(|s| s.base_url.clone()))
    }

    /// Set service base URL in config file
    pub fn set_base_url(&self, service: &str, url: &str) -> Result<(), String> {
        let mut config = self.load()?;
        let service_config = config.services.entry(service.to_string()).or_default();
        service_config.base_url = Some(url.to_string());
        self.save(&config)
    }
}

/// Load the config from the default location, falling back to defaults
/// when no file exists or it cannot be read.
pub fn load_or_default() -> AppConfig {
    ConfigStore::default_config_dir()
        .map(ConfigStore::new)
        .and_then(|store| store.load().ok())
        .unwrap_or_default()
}

/// Resolve a service base URL: environment variables first, then the
/// config file. `None` means the client falls back to its built-in URL.
pub fn resolve_base_url(service: &str) -> Option<String> {
    let env_key = match service {
        DETECTOR_SERVICE => "VERITEXT_DETECTOR_URL",
        HUMANIZER_SERVICE => "VERITEXT_HUMANIZER_URL",
        _ => return None,
    };

    if let Ok(val) = env::var(env_key) {
        let v = val.trim();
        if !v.is_empty() {
            return Some(v.to_string());
        }
    }

    if let Some(config_dir) = ConfigStore::default_config_dir() {
        let store = ConfigStore::new(config_dir);
        if let Ok(Some(url)) = store.get_base_url(service) {
            return Some(url);
        }
    }

    None
}

/// Resolve an API key: environment variables first, then the config file.
pub fn resolve_api_key(service: &str) -> Option<String> {
    let env_keys = match service {
        DETECTOR_SERVICE => vec!["GPTZERO_API_KEY", "VERITEXT_DETECTOR_API_KEY"],
        HUMANIZER_SERVICE => vec!["UNDETECTABLE_API_KEY", "VERITEXT_HUMANIZER_API_KEY"],
        _ => vec![],
    };

    for key in env_keys {
        if let Ok(val) = env::var(key) {
            let v = val.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }

    if let Some(config_dir) = ConfigStore::default_config_dir() {
        let store = ConfigStore::new(config_dir);
        if let Ok(Some(key)) = store.get_api_key(service) {
            return Some(key);
        }
    }

    None
}
