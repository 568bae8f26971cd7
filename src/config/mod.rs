use crate::core::error::BooperError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.twitch.tv/helix";
pub const DEFAULT_DELAY_MS: u64 = 2000;

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

/// What a dispatch run does after a chat message fails to send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Report the failed line and move on.
    #[default]
    Continue,
    /// Stop the run after the failed line.
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub oauth_token: Option<String>,
    /// Login of the account issuing commands.
    #[serde(default)]
    pub login: Option<String>,
    /// Cached Helix id of `login`; resolved on demand when absent.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Channel commands are sent to unless overridden on the command line.
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default)]
    pub on_send_failure: FailurePolicy,
    #[serde(default)]
    pub api_base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: None,
            oauth_token: None,
            login: None,
            user_id: None,
            channel: None,
            delay_ms: DEFAULT_DELAY_MS,
            on_send_failure: FailurePolicy::Continue,
            api_base_url: None,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Config {
    fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sbooper")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    pub fn history_path() -> PathBuf {
        Self::config_dir().join("input_history.txt")
    }

    pub fn load() -> Result<Config, BooperError> {
        Self::load_from(&Self::config_path())
    }

    /// Reads the config at `path`, writing a default one if it does not exist yet.
    pub fn load_from(path: &Path) -> Result<Config, BooperError> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config = serde_yml::from_str::<Config>(&contents)
                .map_err(|e| BooperError::Config(format!("Parse {}: {}", path.display(), e)))?;
            return Ok(config);
        }

        let config = Config::default();
        if let Err(e) = config.save_to(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not write default config");
        }
        Ok(config)
    }

    pub fn save(&self) -> Result<(), BooperError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), BooperError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let yaml_content = serde_yml::to_string(self)?;
        fs::write(path, yaml_content)?;
        Ok(())
    }

    pub fn api_base_url(&self) -> &str {
        non_empty(&self.api_base_url).unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Updates a single field by its YAML key, as used by `sbooper config set`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), BooperError> {
        let optional = || {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        match key {
            "client_id" => self.client_id = optional(),
            "oauth_token" => {
                self.oauth_token = optional().map(|t| {
                    t.strip_prefix("oauth:").map(str::to_string).unwrap_or(t)
                })
            }
            "login" => {
                self.login = optional().map(|l| l.to_lowercase());
                // A different account invalidates the cached id.
                self.user_id = None;
            }
            "user_id" => self.user_id = optional(),
            "channel" => self.channel = optional().map(|c| c.to_lowercase()),
            "delay_ms" => {
                self.delay_ms = value.trim().parse().map_err(|_| {
                    BooperError::Config(format!("delay_ms must be a number, got '{}'", value))
                })?
            }
            "on_send_failure" => {
                self.on_send_failure =
                    FailurePolicy::from_str(value.trim(), true).map_err(|_| {
                        BooperError::Config(format!(
                            "on_send_failure must be 'continue' or 'abort', got '{}'",
                            value
                        ))
                    })?
            }
            "api_base_url" => self.api_base_url = optional(),
            _ => return Err(BooperError::Config(format!("Unknown config key: {}", key))),
        }
        Ok(())
    }

    /// Checks that everything a dispatch run needs is present.
    pub fn validate_for_dispatch(&self, channel: &str) -> Result<(), BooperError> {
        if channel.trim().is_empty() {
            return Err(BooperError::Config(
                "No channel selected; pass --channel or set 'channel'".to_string(),
            ));
        }
        self.credentials()?;
        if non_empty(&self.login).is_none() && non_empty(&self.user_id).is_none() {
            return Err(BooperError::Config(
                "Moderator account unknown; set 'login' in the config".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns `(client_id, oauth_token)` or an error naming the missing one.
    pub fn credentials(&self) -> Result<(String, String), BooperError> {
        let client_id = non_empty(&self.client_id).ok_or_else(|| {
            BooperError::Config("Missing 'client_id' in the config".to_string())
        })?;
        let token = non_empty(&self.oauth_token).ok_or_else(|| {
            BooperError::Config("Missing 'oauth_token' in the config".to_string())
        })?;
        Ok((client_id.to_string(), token.to_string()))
    }

    /// Renders the config with the token masked.
    pub fn redacted(&self) -> Config {
        let mut shown = self.clone();
        if let Some(token) = non_empty(&self.oauth_token) {
            let visible: String = token.chars().take(4).collect();
            shown.oauth_token = Some(format!("{}****", visible));
        }
        shown
    }
}
