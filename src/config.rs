use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub openai_api_key: Option<String>,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    #[serde(default = "default_llm_timeout")]
    pub llm_timeout_secs: u64,

    pub auth_secret: Option<String>,

    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: u64,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_server_url")]
    pub server_url: String,

    pub auth_token: Option<String>,

    /// Also require `type` and `targetUsers` on analysis requests.
    #[serde(default)]
    pub require_classification: bool,

    /// Seed the roadmap checklist from the stored completion flags.
    #[serde(default)]
    pub restore_roadmap_status: bool,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vibebuild");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("ideas.db").to_string_lossy().to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_token_ttl() -> u64 {
    24
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_server_url() -> String {
    "http://127.0.0.1:3000/".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            openai_api_key: None,
            openai_model: default_openai_model(),
            openai_base_url: default_openai_base_url(),
            llm_timeout_secs: default_llm_timeout(),
            auth_secret: None,
            token_ttl_hours: default_token_ttl(),
            bind_addr: default_bind_addr(),
            server_url: default_server_url(),
            auth_token: None,
            require_classification: false,
            restore_roadmap_status: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Reads the file at `path`, writing a default one first if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vibebuild")
            .join("config.toml")
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("VIBEBUILD_DB_PATH") {
            self.db_path = v;
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.openai_api_key = Some(v);
        }
        if let Some(v) = get("VIBEBUILD_AUTH_SECRET") {
            self.auth_secret = Some(v);
        }
        if let Some(v) = get("VIBEBUILD_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = get("VIBEBUILD_SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = get("VIBEBUILD_TOKEN") {
            self.auth_token = Some(v);
        }
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config(
                    "openai_api_key is not set (config.toml or OPENAI_API_KEY)".to_string(),
                )
            })
    }

    pub fn require_auth_secret(&self) -> Result<&str> {
        self.auth_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config(
                    "auth_secret is not set (config.toml or VIBEBUILD_AUTH_SECRET)".to_string(),
                )
            })
    }
}
