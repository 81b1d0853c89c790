use std::time::Duration;

use tokio::time::Instant;

use super::AuthMode;

/// Session state owned by a single account loop.
///
/// Replaced wholesale on every re-authentication; never shared.
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
    mode: AuthMode,
    authenticated_at: Instant,
}

impl Session {
    pub fn new(token: String, mode: AuthMode) -> Self {
        Self {
            token,
            mode,
            authenticated_at: Instant::now(),
        }
    }

    /// Bearer token for authenticated requests
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn age(&self) -> Duration {
        self.authenticated_at.elapsed()
    }

    /// True when the token should be refreshed before the next call.
    /// Stored tokens never go stale.
    pub fn is_stale(&self, threshold: Duration) -> bool {
        match self.mode {
            AuthMode::Login => self.age() > threshold,
            AuthMode::Token => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_login_session_goes_stale() {
        let threshold = Duration::from_secs(2 * 60 * 60);
        let session = Session::new("abc".to_string(), AuthMode::Login);
        assert!(!session.is_stale(threshold));

        tokio::time::advance(threshold).await;
        // Strictly greater than the threshold
        assert!(!session.is_stale(threshold));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(session.is_stale(threshold));
        assert_eq!(session.token(), "abc");
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_session_never_stale() {
        let session = Session::new("abc".to_string(), AuthMode::Token);
        tokio::time::advance(Duration::from_secs(365 * 24 * 60 * 60)).await;
        assert!(!session.is_stale(Duration::from_secs(1)));
    }
}
