use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Keys accepted by `kobopress config set`.
pub const VALID_DEFAULT_KEYS: &[&str] = &["output", "no-upload", "verbose", "cookie"];

const CONFIG_FILE: &str = "config.json";

/// Stored defaults applied to every conversion unless overridden by flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserDefaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_upload: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
}

/// Dropbox OAuth credentials and the token pair issued against them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropboxTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry as Unix milliseconds.
    pub expires_at: u64,
    pub app_key: String,
    pub app_secret: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ConfigFile {
    defaults: UserDefaults,
    #[serde(skip_serializing_if = "Option::is_none")]
    dropbox: Option<DropboxTokens>,
}

/// The directory holding `config.json`.
///
/// `KOBOPRESS_CONFIG_DIR` overrides the platform config location, which
/// keeps tests and scripted runs away from the real user config.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("KOBOPRESS_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("kobopress")
}

/// Current time as Unix milliseconds, matching the stored expiry field.
pub fn now_millis() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

fn load_from(dir: &Path) -> ConfigFile {
    let Ok(raw) = fs::read_to_string(dir.join(CONFIG_FILE)) else {
        return ConfigFile::default();
    };
    serde_json::from_str(&raw).unwrap_or_default()
}

fn save_to(dir: &Path, config: &ConfigFile) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let raw = serde_json::to_string_pretty(config)?;
    let path = dir.join(CONFIG_FILE);
    fs::write(&path, raw).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn user_defaults() -> UserDefaults {
    load_from(&config_dir()).defaults
}

pub fn save_user_defaults(defaults: UserDefaults) -> Result<()> {
    let dir = config_dir();
    let mut config = load_from(&dir);
    config.defaults = defaults;
    save_to(&dir, &config)
}

pub fn dropbox_tokens() -> Option<DropboxTokens> {
    load_from(&config_dir()).dropbox
}

pub fn save_dropbox_tokens(tokens: DropboxTokens) -> Result<()> {
    let dir = config_dir();
    let mut config = load_from(&dir);
    config.dropbox = Some(tokens);
    save_to(&dir, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_from(tmp.path());
        assert!(config.defaults.output.is_none());
        assert!(config.dropbox.is_none());
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let config = ConfigFile {
            defaults: UserDefaults {
                no_upload: Some(true),
                cookie: Some("auth_token=abc".to_string()),
                ..Default::default()
            },
            dropbox: Some(DropboxTokens {
                access_token: "at".to_string(),
                refresh_token: "rt".to_string(),
                expires_at: 1000,
                app_key: "key".to_string(),
                app_secret: "secret".to_string(),
            }),
        };

        save_to(tmp.path(), &config).unwrap();
        let reloaded = load_from(tmp.path());

        assert_eq!(reloaded.defaults.no_upload, Some(true));
        assert_eq!(reloaded.defaults.cookie.as_deref(), Some("auth_token=abc"));
        assert_eq!(reloaded.dropbox.unwrap().refresh_token, "rt");
    }

    #[test]
    fn test_file_uses_camel_case_keys() {
        let tmp = TempDir::new().unwrap();
        let config = ConfigFile {
            defaults: UserDefaults { no_upload: Some(false), ..Default::default() },
            dropbox: None,
        };

        save_to(tmp.path(), &config).unwrap();
        let raw = fs::read_to_string(tmp.path().join(CONFIG_FILE)).unwrap();

        assert!(raw.contains("\"noUpload\""));
        assert!(!raw.contains("no_upload"));
    }

    #[test]
    fn test_corrupt_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "not json{").unwrap();
        let config = load_from(tmp.path());
        assert!(config.defaults.verbose.is_none());
    }
}
