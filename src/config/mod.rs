// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for Pinakotheke

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Where galleries live on disk
    #[serde(default)]
    pub storage: StorageConfig,

    /// Tag inference engine
    #[serde(default)]
    pub ai_engine: EngineConfig,

    /// Web API settings
    #[serde(default)]
    pub web: WebConfig,

    /// Static credential set
    #[serde(default = "default_users")]
    pub users: Vec<Credential>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_storage_root")]
    pub root: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    /// Disable to run without any tag inference
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_engine_url")]
    pub url: String,
    #[serde(default = "default_vision_model")]
    pub model: String,
    #[serde(default = "default_tag_prompt")]
    pub prompt: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// Largest accepted upload request, in MiB
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

// Default value functions
fn default_true() -> bool { true }
fn default_storage_root() -> String { "galleries".to_string() }
fn default_engine_url() -> String { "http://localhost:11434".to_string() }
fn default_vision_model() -> String { "moondream".to_string() }
fn default_timeout() -> u64 { 60 }
fn default_web_host() -> String { "127.0.0.1".to_string() }
fn default_web_port() -> u16 { 8080 }
fn default_max_upload_mb() -> usize { 50 }

fn default_tag_prompt() -> String {
    "List up to 10 short tags describing the content of this image. \
     Return ONLY the tags, comma separated.".to_string()
}

fn default_users() -> Vec<Credential> {
    vec![Credential {
        username: "admin".to_string(),
        password: "12345678".to_string(),
    }]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            ai_engine: EngineConfig::default(),
            web: WebConfig::default(),
            users: default_users(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_engine_url(),
            model: default_vision_model(),
            prompt: default_tag_prompt(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

impl WebConfig {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::GalleryError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = AppConfig::load(&tmp.path().join("config.json")).unwrap();
        assert_eq!(config.storage.root, "galleries");
        assert_eq!(config.users, default_users());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{ "web": { "port": 9000 }, "ai_engine": { "enabled": false } }"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.web.port, 9000);
        assert_eq!(config.web.host, "127.0.0.1");
        assert_eq!(config.web.max_upload_mb, 50);
        assert_eq!(config.web.max_upload_bytes(), 50 * 1024 * 1024);
        assert!(!config.ai_engine.enabled);
        assert_eq!(config.ai_engine.model, "moondream");
        assert_eq!(config.users.len(), 1);
    }

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        let mut config = AppConfig::default();
        config.storage.root = "/srv/photos".to_string();
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap().storage.root, "/srv/photos");
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(crate::GalleryError::Config(_))));
    }
}
