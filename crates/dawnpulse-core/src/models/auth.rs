use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Extension id the upstream API expects in keep-alive bodies and the origin header
pub const EXTENSION_ID: &str = "fpdkjdnhkakefebpekbdhillbhonfjjp";

/// Extension version reported to the API
pub const EXTENSION_VERSION: &str = "1.0.6";

/// Format of `logindata.datetime`
const LOGIN_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub logindata: LoginData,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginData {
    #[serde(rename = "_v")]
    pub version: String,
    pub datetime: String,
}

impl LoginRequest {
    pub fn new<Tz: TimeZone>(username: &str, password: &str, now: DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            logindata: LoginData {
                version: EXTENSION_VERSION.to_string(),
                datetime: now.format(LOGIN_DATETIME_FORMAT).to_string(),
            },
        }
    }
}

/// Login response. Only the fields we consume are modelled; the API also
/// returns profile and wallet details which are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<LoginResponseData>,
    #[serde(default)]
    pub servername: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponseData {
    #[serde(default)]
    pub token: String,
}

impl LoginResponse {
    /// Token if the login succeeded, `None` for a rejected or token-less response
    pub fn token(&self) -> Option<&str> {
        if !self.status {
            return None;
        }
        self.data
            .as_ref()
            .map(|d| d.token.as_str())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KeepAliveRequest {
    pub username: String,
    pub extensionid: String,
    pub numberoftabs: u32,
    #[serde(rename = "_v")]
    pub version: String,
}

impl KeepAliveRequest {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            extensionid: EXTENSION_ID.to_string(),
            numberoftabs: 0,
            version: EXTENSION_VERSION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_login_request_wire_shape() {
        let now = Utc.with_ymd_and_hms(2024, 8, 1, 9, 5, 7).unwrap();
        let req = LoginRequest::new("a@b.c", "hunter2", now);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "username": "a@b.c",
                "password": "hunter2",
                "logindata": {"_v": "1.0.6", "datetime": "2024-08-01 09:05:07"}
            })
        );
    }

    #[test]
    fn test_keep_alive_wire_shape() {
        let json = serde_json::to_value(KeepAliveRequest::new("a@b.c")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "username": "a@b.c",
                "extensionid": "fpdkjdnhkakefebpekbdhillbhonfjjp",
                "numberoftabs": 0,
                "_v": "1.0.6"
            })
        );
    }

    #[test]
    fn test_login_response_token() {
        let json = r#"{"status":true,"message":"ok","data":{"token":"abc","user_id":"u1","_id":"x","wallet":{"active":true}},"servername":"s1"}"#;
        let resp: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.token(), Some("abc"));
        assert_eq!(resp.servername.as_deref(), Some("s1"));

        let rejected: LoginResponse =
            serde_json::from_str(r#"{"status":false,"message":"Invalid credentials"}"#).unwrap();
        assert_eq!(rejected.token(), None);

        let empty: LoginResponse =
            serde_json::from_str(r#"{"status":true,"data":{"token":""}}"#).unwrap();
        assert_eq!(empty.token(), None);
    }
}
