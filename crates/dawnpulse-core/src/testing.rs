//! Scripted `RewardsApi` fake shared by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use futures::future::{self, BoxFuture, FutureExt};
use tokio::time::Instant;

use crate::api::{ApiError, RewardsApi};
use crate::auth::Credential;
use crate::models::PointBreakdown;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Login { email: String },
    KeepAlive { email: String, token: String },
    GetPoints { token: String },
}

#[derive(Default)]
pub struct FakeApi {
    /// Login outcomes consumed in order; once empty every login succeeds
    login_script: Mutex<VecDeque<Result<String, String>>>,
    fail_keep_alive: bool,
    fail_points: bool,
    /// Accounts whose point lookups fail
    point_failures: Vec<String>,
    calls: Mutex<Vec<(Instant, Call)>>,
}

pub fn breakdown(reward: f64) -> PointBreakdown {
    PointBreakdown {
        reward,
        registration: 0.0,
        sign_in: 0.0,
        twitter: 0.0,
        discord: 0.0,
        telegram: 0.0,
        referral_commission: 0.0,
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logins(self, script: Vec<Result<&str, &str>>) -> Self {
        *self.login_script.lock().unwrap() = script
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        self
    }

    pub fn failing_periodic_calls(mut self) -> Self {
        self.fail_keep_alive = true;
        self.fail_points = true;
        self
    }

    pub fn failing_points_for(mut self, email: &str) -> Self {
        self.point_failures.push(email.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn login_times(&self) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, c)| matches!(c, Call::Login { .. }))
            .map(|(at, _)| *at)
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|(_, c)| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((Instant::now(), call));
    }
}

impl RewardsApi for FakeApi {
    fn login<'a>(&'a self, credential: &'a Credential) -> BoxFuture<'a, Result<String>> {
        self.record(Call::Login { email: credential.email.clone() });
        let outcome = self
            .login_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("token-{}", credential.email)));
        let result = outcome.map_err(|msg| anyhow!(ApiError::rejected(&msg)));
        future::ready(result).boxed()
    }

    fn keep_alive<'a>(&'a self, email: &'a str, token: &'a str) -> BoxFuture<'a, Result<String>> {
        self.record(Call::KeepAlive { email: email.to_string(), token: token.to_string() });
        let result = if self.fail_keep_alive {
            Err(anyhow!(ApiError::ServerError("keep-alive down".to_string())))
        } else {
            Ok(r#"{"status":true}"#.to_string())
        };
        future::ready(result).boxed()
    }

    fn get_points<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<PointBreakdown>> {
        self.record(Call::GetPoints { token: token.to_string() });
        let failing_account = self
            .point_failures
            .iter()
            .any(|email| token == format!("token-{}", email) || token == email.as_str());
        let result = if self.fail_points || failing_account {
            Err(anyhow!(ApiError::rejected("points unavailable")))
        } else {
            Ok(breakdown(1234.5))
        };
        future::ready(result).boxed()
    }
}
