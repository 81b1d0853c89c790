//! Application configuration management.
//!
//! Configuration is a JSON file holding the proxy list, the accounts and an
//! optional chat-bot token, plus timing knobs that default to the upstream
//! extension's behaviour. Lookup order is an explicit path, `./config.json`,
//! then `~/.config/dawnpulse/config.json`.
//!
//! Any load or validation error is fatal at startup.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::Endpoints;
use crate::auth::{AuthMode, Credential};
use crate::keepalive::LoopTiming;

/// Application name used for the config directory path
const APP_NAME: &str = "dawnpulse";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Outbound proxies, assigned to accounts round-robin. Empty means direct.
    #[serde(default)]
    pub proxies: Vec<String>,

    pub accounts: Vec<Credential>,

    /// Default auth mode; accounts may override it
    #[serde(default)]
    pub auth_mode: AuthMode,

    /// Telegram bot token; the bot only runs when this is set
    #[serde(default)]
    pub bot_token: Option<String>,

    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,

    #[serde(default = "default_reauth_after_secs")]
    pub reauth_after_secs: u64,

    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Give up on an account after this many consecutive failed logins.
    /// Unset retries forever.
    #[serde(default)]
    pub max_auth_retries: Option<u32>,

    #[serde(default)]
    pub endpoints: Endpoints,
}

fn default_ping_interval_secs() -> u64 {
    3 * 60
}

fn default_reauth_after_secs() -> u64 {
    2 * 60 * 60
}

fn default_retry_delay_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load, apply env overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_json(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.override_from_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// `./config.json` when present, otherwise the per-user config directory
    fn default_path() -> Result<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Ok(local);
        }
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Override selected settings from environment variables
    pub fn override_from_env(&mut self) {
        if let Ok(token) = env::var("DAWN_BOT_TOKEN") {
            if !token.trim().is_empty() {
                self.bot_token = Some(token);
            }
        }
        if let Ok(mode) = env::var("DAWN_AUTH_MODE") {
            if let Some(mode) = AuthMode::parse(&mode) {
                self.auth_mode = mode;
            }
        }
        if let Ok(interval) = env::var("DAWN_PING_INTERVAL_SECS") {
            if let Ok(secs) = interval.parse() {
                self.ping_interval_secs = secs;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.accounts.is_empty() {
            bail!("No accounts configured");
        }
        for (i, account) in self.accounts.iter().enumerate() {
            if account.email.trim().is_empty() {
                bail!("Account #{} has an empty email", i + 1);
            }
            if account.secret.trim().is_empty() {
                bail!("Account {} has an empty secret", account.email);
            }
        }
        for proxy in &self.proxies {
            reqwest::Proxy::all(proxy.as_str())
                .with_context(|| format!("Invalid proxy URL: {}", proxy))?;
        }
        if self.ping_interval_secs == 0 {
            bail!("pingIntervalSecs must be greater than zero");
        }
        if self.retry_delay_secs == 0 {
            bail!("retryDelaySecs must be greater than zero");
        }
        if self.request_timeout_secs == 0 {
            bail!("requestTimeoutSecs must be greater than zero");
        }
        if self.max_auth_retries == Some(0) {
            bail!("maxAuthRetries must be at least 1; omit it to retry forever");
        }
        Ok(())
    }

    /// Proxy for the account at `index`, by round-robin over the list
    pub fn proxy_for(&self, index: usize) -> Option<&str> {
        if self.proxies.is_empty() {
            None
        } else {
            Some(self.proxies[index % self.proxies.len()].as_str())
        }
    }

    pub fn timing(&self) -> LoopTiming {
        LoopTiming {
            ping_interval: Duration::from_secs(self.ping_interval_secs),
            reauth_after: Duration::from_secs(self.reauth_after_secs),
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            max_auth_retries: self.max_auth_retries,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
