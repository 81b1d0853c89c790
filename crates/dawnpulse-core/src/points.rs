//! On-demand point aggregation across every configured account.
//!
//! Used by the chat bot and the `points` CLI command. Individual failures
//! degrade to an error line; the aggregate always completes.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::api::{DawnClient, RewardsApi};
use crate::auth::{AuthMode, Credential};
use crate::config::Config;
use crate::utils::{format_points, truncate_body};

/// Longest error reason shown in a summary line
const MAX_REASON_LENGTH: usize = 120;

/// Point total (or failure reason) for one account
#[derive(Debug, Clone)]
pub struct AccountPoints {
    pub email: String,
    pub total: Result<f64, String>,
}

#[derive(Clone)]
pub struct PointAggregator {
    api: Arc<dyn RewardsApi>,
    accounts: Arc<Vec<Credential>>,
    default_mode: AuthMode,
}

impl PointAggregator {
    pub fn new(api: Arc<dyn RewardsApi>, accounts: Vec<Credential>, default_mode: AuthMode) -> Self {
        Self {
            api,
            accounts: Arc::new(accounts),
            default_mode,
        }
    }

    /// Aggregator over every configured account, routed through the first proxy
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = DawnClient::new(config.proxy_for(0), config.request_timeout(), config.endpoints.clone())?;
        Ok(Self::new(Arc::new(client), config.accounts.clone(), config.auth_mode))
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Query every account concurrently, preserving config order
    pub async fn collect(&self) -> Vec<AccountPoints> {
        let lookups = self.accounts.iter().map(|credential| async move {
            let total = self
                .fetch_total(credential)
                .await
                .map_err(|e| format!("{:#}", e));
            if let Err(ref reason) = total {
                warn!(acc = %credential.email, error = %reason, "Point lookup failed");
            }
            AccountPoints {
                email: credential.email.clone(),
                total,
            }
        });
        join_all(lookups).await
    }

    async fn fetch_total(&self, credential: &Credential) -> Result<f64> {
        let token = match credential.mode(self.default_mode) {
            AuthMode::Token => credential.secret.clone(),
            AuthMode::Login => self.api.login(credential).await?,
        };
        let breakdown = self.api.get_points(&token).await?;
        debug!(acc = %credential.email, total = breakdown.total(), "Fetched point breakdown");
        Ok(breakdown.total())
    }

    /// Collect and render in one step
    pub async fn summary(&self) -> String {
        render_summary(&self.collect().await)
    }
}

/// One header line stating the account count, then exactly one line per account
pub fn render_summary(results: &[AccountPoints]) -> String {
    let sum: f64 = results.iter().filter_map(|r| r.total.as_ref().ok()).sum();
    let failed = results.iter().filter(|r| r.total.is_err()).count();

    let mut out = format!(
        "Total accounts: {} | Sum: {}",
        results.len(),
        format_points(sum)
    );
    if failed > 0 {
        out.push_str(&format!(" | Failed: {}", failed));
    }

    for (i, result) in results.iter().enumerate() {
        let value = match &result.total {
            Ok(total) => format_points(*total),
            Err(reason) => format!("error ({})", truncate_body(&single_line(reason), MAX_REASON_LENGTH)),
        };
        out.push_str(&format!("\n{}. {}: {}", i + 1, result.email, value));
    }
    out
}

/// Collapse newlines and runs of whitespace so one account stays on one line
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeApi};

    fn accounts() -> Vec<Credential> {
        vec![
            Credential::new("a@b.c", "pw"),
            Credential::new("d@e.f", "pw"),
            Credential::new("g@h.i", "stored").with_mode(AuthMode::Token),
        ]
    }

    #[tokio::test]
    async fn test_summary_has_one_line_per_account() {
        let api = Arc::new(FakeApi::new().failing_points_for("d@e.f"));
        let aggregator = PointAggregator::new(api.clone(), accounts(), AuthMode::Login);

        let summary = aggregator.summary().await;
        let lines: Vec<&str> = summary.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Total accounts: 3 | Sum: 2,469 points | Failed: 1");
        assert_eq!(lines[1], "1. a@b.c: 1,234.500 points");
        assert!(lines[2].starts_with("2. d@e.f: error (Rejected by API: points unavailable"));
        assert_eq!(lines[3], "3. g@h.i: 1,234.500 points");
        assert_eq!(lines.iter().filter(|l| l.contains(": error (")).count(), 1);
    }

    #[tokio::test]
    async fn test_token_accounts_skip_login() {
        let api = Arc::new(FakeApi::new());
        let aggregator = PointAggregator::new(api.clone(), accounts(), AuthMode::Login);
        aggregator.collect().await;

        assert_eq!(api.count(|c| matches!(c, Call::Login { .. })), 2);
        assert_eq!(api.count(|c| matches!(c, Call::GetPoints { token } if token == "stored")), 1);
    }

    #[tokio::test]
    async fn test_login_failure_degrades_to_error_line() {
        let api = Arc::new(FakeApi::new().with_logins(vec![Err("Invalid credentials")]));
        let aggregator = PointAggregator::new(
            api,
            vec![Credential::new("a@b.c", "wrong")],
            AuthMode::Login,
        );

        let results = aggregator.collect().await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].total, Err("Rejected by API: Invalid credentials".to_string()));
    }

    #[test]
    fn test_render_all_failed() {
        let results = vec![
            AccountPoints { email: "a@b.c".to_string(), total: Err("timeout".to_string()) },
            AccountPoints { email: "d@e.f".to_string(), total: Err("x".repeat(500)) },
        ];
        let summary = render_summary(&results);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Total accounts: 2 | Sum: 0 points | Failed: 2");
        assert_eq!(lines[1], "1. a@b.c: error (timeout)");
        assert!(lines[2].contains("truncated"));
    }

    #[tokio::test]
    async fn test_multiline_error_body_stays_on_one_line() {
        struct GatewayDown;

        impl RewardsApi for GatewayDown {
            fn login<'a>(&'a self, _: &'a Credential) -> futures::future::BoxFuture<'a, Result<String>> {
                Box::pin(async { Ok("tok".to_string()) })
            }

            fn keep_alive<'a>(&'a self, _: &'a str, _: &'a str) -> futures::future::BoxFuture<'a, Result<String>> {
                Box::pin(async { Ok(String::new()) })
            }

            fn get_points<'a>(&'a self, _: &'a str) -> futures::future::BoxFuture<'a, Result<crate::models::PointBreakdown>> {
                Box::pin(async {
                    Err(crate::api::ApiError::from_status(
                        reqwest::StatusCode::BAD_GATEWAY,
                        "<html>\n<body>502 Bad Gateway</body>\n</html>",
                    )
                    .into())
                })
            }
        }

        let aggregator = PointAggregator::new(
            Arc::new(GatewayDown),
            vec![Credential::new("a@b.c", "pw"), Credential::new("d@e.f", "pw")],
            AuthMode::Login,
        );
        let summary = aggregator.summary().await;
        let lines: Vec<&str> = summary.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "1. a@b.c: error (Server error: <html> <body>502 Bad Gateway</body> </html>)"
        );
        assert!(lines[2].starts_with("2. d@e.f: error (Server error:"));
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("a\n  b\r\n\tc "), "a b c");
        assert_eq!(single_line(""), "");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_summary(&[]), "Total accounts: 0 | Sum: 0 points");
    }
}
