use std::fmt;

use serde::{Deserialize, Serialize};

/// How an account's secret is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Secret is a password exchanged for a bearer token, refreshed when stale
    #[default]
    Login,
    /// Secret is the bearer token itself; never re-authenticates
    Token,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Token => "token",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "login" | "password" => Some(Self::Login),
            "token" | "bearer" => Some(Self::Token),
            _ => None,
        }
    }
}

/// One configured account. Immutable after load.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
    pub email: String,
    #[serde(alias = "password", alias = "token")]
    pub secret: String,
    /// Overrides the global auth mode for this account
    #[serde(default, rename = "authMode", skip_serializing_if = "Option::is_none")]
    pub auth_mode: Option<AuthMode>,
}

impl Credential {
    pub fn new(email: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            secret: secret.into(),
            auth_mode: None,
        }
    }

    pub fn with_mode(mut self, mode: AuthMode) -> Self {
        self.auth_mode = Some(mode);
        self
    }

    /// Effective mode given the global default
    pub fn mode(&self, default: AuthMode) -> AuthMode {
        self.auth_mode.unwrap_or(default)
    }
}

// Keep secrets out of logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("secret", &"<redacted>")
            .field("auth_mode", &self.auth_mode)
            .finish()
    }
}
