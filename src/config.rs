use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{AppError, Result};

/// Default location of the provider configuration, relative to the working directory
pub const DEFAULT_CONFIG_SOURCE: &str = "firebase_config.json";

/// Directory holding logs and the persisted session
pub const STATE_DIR: &str = ".subfetch";

fn default_identity_toolkit_url() -> String {
    "https://identitytoolkit.googleapis.com/v1".to_string()
}

fn default_secure_token_url() -> String {
    "https://securetoken.googleapis.com/v1".to_string()
}

fn default_persist_session() -> bool {
    true
}

fn default_session_file() -> PathBuf {
    PathBuf::from(STATE_DIR).join("session.json")
}

fn default_functions_host() -> String {
    "cloudfunctions.net".to_string()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Provider configuration as published for the web app (`firebase_config.json`).
///
/// Only `apiKey` and the two cloud function fields are used at runtime; the rest
/// are carried so the same file works for the browser SDK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub auth_domain: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub storage_bucket: String,
    #[serde(default)]
    pub messaging_sender_id: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_id: Option<String>,
    /// Deployment region of `runTranscript`, e.g. `europe-west1`
    pub cloud_function_region: String,
    /// Project hosting `runTranscript`
    pub cloud_function_project: String,
}

/// Where the provider configuration is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Url(String),
}

impl ConfigSource {
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            ConfigSource::Url(source.to_string())
        } else {
            ConfigSource::File(PathBuf::from(source))
        }
    }
}

impl Default for ConfigSource {
    fn default() -> Self {
        ConfigSource::File(PathBuf::from(DEFAULT_CONFIG_SOURCE))
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Url(url) => write!(f, "{}", url),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Read and parse the provider configuration. Any failure is `ConfigUnavailable`.
    pub async fn load(source: &ConfigSource) -> Result<FirebaseConfig> {
        debug!("Loading provider configuration from {}", source);

        let body = match source {
            ConfigSource::File(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                AppError::ConfigUnavailable(format!("Failed to read {}: {}", path.display(), e))
            })?,
            ConfigSource::Url(url) => Self::fetch(url).await?,
        };

        let config: FirebaseConfig = serde_json::from_str(&body).map_err(|e| {
            AppError::ConfigUnavailable(format!("Failed to parse {}: {}", source, e))
        })?;

        info!("Loaded provider configuration for project '{}'", config.project_id);
        Ok(config)
    }

    async fn fetch(url: &str) -> Result<String> {
        let response = reqwest::get(url)
            .await
            .map_err(|e| AppError::ConfigUnavailable(format!("Failed to fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(AppError::ConfigUnavailable(format!(
                "Failed to fetch {}: status {}",
                url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::ConfigUnavailable(format!("Failed to read {}: {}", url, e)))
    }
}

/// Application settings (`settings.toml`). Every field has a default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub identity: IdentitySettings,
    #[serde(default)]
    pub functions: FunctionsSettings,
    #[serde(default)]
    pub ui: UiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySettings {
    /// Identity Toolkit REST base, without trailing slash
    #[serde(default = "default_identity_toolkit_url")]
    pub identity_toolkit_url: String,
    /// Secure Token REST base, without trailing slash
    #[serde(default = "default_secure_token_url")]
    pub secure_token_url: String,
    /// Keep the signed-in session across runs
    #[serde(default = "default_persist_session")]
    pub persist_session: bool,
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionsSettings {
    /// Host suffix of deployed cloud functions
    #[serde(default = "default_functions_host")]
    pub host: String,
    /// Replaces `https://{region}-{project}.{host}` entirely, e.g. for the emulator
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    /// Where downloaded `.sbv` files are written
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            identity_toolkit_url: default_identity_toolkit_url(),
            secure_token_url: default_secure_token_url(),
            persist_session: default_persist_session(),
            session_file: default_session_file(),
        }
    }
}

impl Default for FunctionsSettings {
    fn default() -> Self {
        Self {
            host: default_functions_host(),
            base_url: None,
        }
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
        }
    }
}

impl Settings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Settings(format!("Failed to read settings file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Settings(format!("Failed to parse settings file: {}", e)))
    }
}
