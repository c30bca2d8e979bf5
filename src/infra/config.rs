// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub stripe: StripeConfig,

    #[serde(default)]
    pub users: UsersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Optional shared secret required from the gateway on every RPC route.
    pub auth_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend selector: "fs" or "memory".
    pub backend: String,
    /// Root directory for the fs backend.
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "fs".into(),
            root: "./data".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Object-store prefix holding model.json / weights.bin / metadata.json.
    pub artifact_prefix: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_prefix: "ai-models/plant-disease-model".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeConfig {
    /// Secret key; the STRIPE_SECRET_KEY env var takes precedence.
    pub secret_key: Option<String>,
    pub api_base: String,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            api_base: "https://api.stripe.com".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsersConfig {
    /// Base URL of the user-record document store. Empty means the in-memory
    /// store (development only).
    pub base_url: Option<String>,
    /// Bearer token for the document store; USERS_API_TOKEN env overrides.
    pub api_token: Option<String>,
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("leafmarket.toml");
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Secrets can come from the environment instead of the config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("STRIPE_SECRET_KEY") {
            if !key.is_empty() {
                self.stripe.secret_key = Some(key);
            }
        }
        if let Ok(token) = std::env::var("USERS_API_TOKEN") {
            if !token.is_empty() {
                self.users.api_token = Some(token);
            }
        }
    }
}
