use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Runtime configuration: where the remote services live and where the
/// local sync database is kept.
///
/// The gateway fronts the user, course and activity services; the AI
/// service is independent and reachable at its own base address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gateway_url: String,
    pub ai_url: String,
    pub store_path: PathBuf,
    /// Bearer token for the gateway. Usually absent here and picked up
    /// from the local store after `login`.
    pub token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_url: "http://localhost:8080/api".to_string(),
            ai_url: "http://127.0.0.1:8001".to_string(),
            store_path: PathBuf::from("./lms-sync.db"),
            token: None,
        }
    }
}

impl Config {
    /// Load from a toml file if it exists, then apply env overrides
    /// (`LMS_GATEWAY_URL`, `LMS_AI_URL`, `LMS_STORE_PATH`, `LMS_TOKEN`).
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = if path.as_ref().exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        if let Ok(url) = dotenvy::var("LMS_GATEWAY_URL") {
            config.gateway_url = url;
        }
        if let Ok(url) = dotenvy::var("LMS_AI_URL") {
            config.ai_url = url;
        }
        if let Ok(path) = dotenvy::var("LMS_STORE_PATH") {
            config.store_path = PathBuf::from(path);
        }
        if let Ok(token) = dotenvy::var("LMS_TOKEN") {
            config.token = Some(token);
        }
        Ok(config)
    }

    /// Connection url for the local store, creating the file on first use.
    pub fn store_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.store_path.display())
    }
}
