//! API client for the rewards extension backend.
//!
//! `DawnClient` makes the three calls the keep-alive loop needs. It
//! impersonates the browser extension (origin, user agent, fetch metadata)
//! and does not verify TLS certificates, matching what the extension does.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use futures::future::BoxFuture;
use reqwest::{header, Client, Proxy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::Credential;
use crate::models::{parse_points, KeepAliveRequest, LoginRequest, LoginResponse, PointBreakdown};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

const LOGIN_URL: &str = "https://www.aeropres.in/chromeapi/dawn/v1/user/login";

const KEEP_ALIVE_URL: &str = "https://www.aeropres.in/chromeapi/dawn/v1/userreward/keepalive";

const GET_POINT_URL: &str = "https://www.aeropres.in/api/atom/v1/userreferral/getpoint";

/// Origin of the browser extension
const EXTENSION_ORIGIN: &str = "chrome-extension://fpdkjdnhkakefebpekbdhillbhonfjjp";

/// Desktop Chrome user agent the extension runs under
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36";

/// Maximum length of a logged response body
const MAX_LOGGED_BODY_LENGTH: usize = 300;

/// Endpoint URLs. Overridable in config for staging or mirrors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    #[serde(default = "default_login_url")]
    pub login_url: String,
    #[serde(default = "default_keep_alive_url")]
    pub keep_alive_url: String,
    #[serde(default = "default_get_point_url")]
    pub get_point_url: String,
}

fn default_login_url() -> String {
    LOGIN_URL.to_string()
}

fn default_keep_alive_url() -> String {
    KEEP_ALIVE_URL.to_string()
}

fn default_get_point_url() -> String {
    GET_POINT_URL.to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            keep_alive_url: default_keep_alive_url(),
            get_point_url: default_get_point_url(),
        }
    }
}

/// The calls an account loop makes. Implemented by `DawnClient`; tests
/// substitute scripted fakes.
pub trait RewardsApi: Send + Sync {
    /// Exchange a credential for a bearer token
    fn login<'a>(&'a self, credential: &'a Credential) -> BoxFuture<'a, Result<String>>;

    /// Heartbeat; returns the raw response body for logging
    fn keep_alive<'a>(&'a self, email: &'a str, token: &'a str) -> BoxFuture<'a, Result<String>>;

    fn get_points<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<PointBreakdown>>;
}

/// HTTP client bound to one proxy.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct DawnClient {
    client: Client,
    endpoints: Endpoints,
}

impl DawnClient {
    /// Create a client, optionally routed through `proxy`
    pub fn new(proxy: Option<&str>, timeout: Duration, endpoints: Endpoints) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .default_headers(Self::default_headers())
            .danger_accept_invalid_certs(true);

        match proxy {
            Some(url) => {
                let proxy = Proxy::all(url).with_context(|| format!("Invalid proxy URL: {}", url))?;
                builder = builder.proxy(proxy);
                debug!(proxy = url, "HTTP client using proxy");
            }
            // Direct means direct, even when HTTP_PROXY is set
            None => builder = builder.no_proxy(),
        }

        Ok(Self {
            client: builder.build().context("Failed to build HTTP client")?,
            endpoints,
        })
    }

    /// Headers sent with every request
    fn default_headers() -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
        headers.insert(header::ORIGIN, header::HeaderValue::from_static(EXTENSION_ORIGIN));
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("*/*"));
        headers.insert(header::ACCEPT_LANGUAGE, header::HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert("priority", header::HeaderValue::from_static("u=1, i"));
        headers.insert("sec-fetch-dest", header::HeaderValue::from_static("empty"));
        headers.insert("sec-fetch-mode", header::HeaderValue::from_static("cors"));
        headers.insert("sec-fetch-site", header::HeaderValue::from_static("cross-site"));
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));
        headers
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    pub async fn authenticate(&self, credential: &Credential) -> Result<String> {
        let body = LoginRequest::new(&credential.email, &credential.secret, Local::now());

        let response = self
            .client
            .post(&self.endpoints.login_url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::from)
            .context("Failed to send login request")?;

        let response = Self::check_response(response).await?;

        let text = response.text().await.context("Failed to read login response body")?;
        let login: LoginResponse = serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!(
                "unexpected login payload ({}): {}",
                e,
                crate::utils::truncate_body(&text, MAX_LOGGED_BODY_LENGTH)
            ))
        })?;

        match login.token() {
            Some(token) => {
                debug!(server = login.servername.as_deref().unwrap_or("unknown"), "Login accepted");
                Ok(token.to_string())
            }
            None => Err(ApiError::rejected(&login.message).into()),
        }
    }

    pub async fn send_keep_alive(&self, email: &str, token: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoints.keep_alive_url)
            .bearer_auth(token)
            .json(&KeepAliveRequest::new(email))
            .send()
            .await
            .map_err(ApiError::from)
            .context("Failed to send keep-alive request")?;

        let response = Self::check_response(response).await?;
        let text = response.text().await.context("Failed to read keep-alive response body")?;
        Ok(crate::utils::truncate_body(&text, MAX_LOGGED_BODY_LENGTH))
    }

    pub async fn fetch_points(&self, token: &str) -> Result<PointBreakdown> {
        let response = self
            .client
            .get(&self.endpoints.get_point_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(ApiError::from)
            .context("Failed to send get-point request")?;

        let response = Self::check_response(response).await?;
        let text = response.text().await.context("Failed to read get-point response body")?;
        Ok(parse_points(&text)?)
    }
}

impl RewardsApi for DawnClient {
    fn login<'a>(&'a self, credential: &'a Credential) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.authenticate(credential))
    }

    fn keep_alive<'a>(&'a self, email: &'a str, token: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.send_keep_alive(email, token))
    }

    fn get_points<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<PointBreakdown>> {
        Box::pin(self.fetch_points(token))
    }
}
