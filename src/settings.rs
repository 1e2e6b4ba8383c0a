use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PennyError, Result};

pub const DEFAULT_DEPLOYMENT_ID: &str = "8501cbef-e303-421f-946e-5a1e9e4b0a71";
pub const DEFAULT_AUTH_URL: &str = "https://auth.quiltt.io/v1/users/session";
pub const DEFAULT_API_URL: &str = "https://api.quiltt.io/v1/graphql";

/// Where one-time passcodes are read from during login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboxSettings {
    /// Ask on the terminal.
    Prompt,
    /// Poll a local maildir kept in sync with the mailbox.
    Maildir { path: String },
}

impl Default for InboxSettings {
    fn default() -> Self {
        Self::Prompt
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_deployment_id")]
    pub deployment_id: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub inbox: InboxSettings,
    #[serde(default = "default_passcode_sender")]
    pub passcode_sender: String,
    #[serde(default = "default_passcode_subject")]
    pub passcode_subject: String,
    #[serde(default = "default_true")]
    pub sort_after_sync: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_deployment_id() -> String {
    DEFAULT_DEPLOYMENT_ID.to_string()
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_passcode_sender() -> String {
    "support@quiltt.io".to_string()
}

fn default_passcode_subject() -> String {
    "Your Quiltt Hub passcode".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            email: String::new(),
            deployment_id: default_deployment_id(),
            auth_url: default_auth_url(),
            api_url: default_api_url(),
            inbox: InboxSettings::default(),
            passcode_sender: default_passcode_sender(),
            passcode_subject: default_passcode_subject(),
            sort_after_sync: true,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("penny.db")
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("penny")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("penny")
}

/// Load settings, falling back to defaults when the file is absent.
/// A file that exists but does not parse is an error rather than a silent reset.
pub fn load_settings() -> Result<Settings> {
    let path = settings_path();
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(&path)?;
    serde_json::from_str(&content)
        .map_err(|e| PennyError::Settings(format!("{}: {e}", path.display())))
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| PennyError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
