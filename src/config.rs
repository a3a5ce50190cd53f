use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable consulted when the config file carries no key.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API key for Groq
    pub groq_api_key: Option<String>,

    /// Model used for completions
    pub model: String,

    /// Base URL of the OpenAI-compatible completion endpoint
    pub api_base_url: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            groq_api_key: None,
            model: "llama-3.3-70b-versatile".to_string(),
            api_base_url: "https://api.groq.com/openai/v1".to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl Config {
    /// Directory holding the config file and logs.
    pub fn askme_home() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".askme"))
    }

    /// Load configuration from ~/.askme/config.toml, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self> {
        let askme_home = Self::askme_home()?;
        fs::create_dir_all(&askme_home).context("Failed to create .askme directory")?;
        Self::load_from(&askme_home.join("config.toml"))
    }

    fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Config::default())
        }
    }

    /// Get API key from config or environment
    pub fn api_key(&self) -> Option<String> {
        self.groq_api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
    }
}
