use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::api::RewardsApi;
use crate::auth::{AuthMode, Credential, Session};
use crate::utils::format_points;

/// Fixed timers for an account loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    /// Pause between keep-alive rounds
    pub ping_interval: Duration,
    /// Session age after which a login-mode account re-authenticates
    pub reauth_after: Duration,
    /// Pause before starting over after a failed login
    pub retry_delay: Duration,
    /// Consecutive failed logins before giving up; `None` retries forever
    pub max_auth_retries: Option<u32>,
}

impl Default for LoopTiming {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(3 * 60),
            reauth_after: Duration::from_secs(2 * 60 * 60),
            retry_delay: Duration::from_secs(60),
            max_auth_retries: None,
        }
    }
}

/// Progress notifications from a running loop
#[derive(Debug, Clone, PartialEq)]
pub enum AccountEvent {
    Authenticated { index: usize },
    AuthFailed { index: usize, attempt: u32 },
    KeepAlive { index: usize, ok: bool },
    Points { index: usize, ok: bool, total: Option<f64> },
    GaveUp { index: usize },
}

/// What to do after a failed login
enum AfterFailure {
    Restart,
    GiveUp,
}

/// Keeps one account's session alive.
///
/// `Unauthenticated -> Active` on login, `Active -> Active` every
/// `ping_interval`, `Active -> Unauthenticated` once the session is stale,
/// and any failed login waits `retry_delay` and starts over from scratch.
pub struct AccountLoop {
    index: usize,
    credential: Credential,
    mode: AuthMode,
    api: Arc<dyn RewardsApi>,
    timing: LoopTiming,
    events: Option<mpsc::UnboundedSender<AccountEvent>>,
}

impl AccountLoop {
    pub fn new(
        index: usize,
        credential: Credential,
        default_mode: AuthMode,
        api: Arc<dyn RewardsApi>,
        timing: LoopTiming,
    ) -> Self {
        let mode = credential.mode(default_mode);
        Self {
            index,
            credential,
            mode,
            api,
            timing,
            events: None,
        }
    }

    /// Report progress to `tx` as well as the log
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<AccountEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn email(&self) -> &str {
        &self.credential.email
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Run until `shutdown` flips to true (or its sender goes away), or
    /// until the retry cap is hit.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tokio::select! {
            _ = self.run_forever() => {}
            _ = shutdown.wait_for(|stop| *stop) => {
                debug!("Shutdown requested, stopping account loop");
            }
        }
    }

    async fn run_forever(&self) {
        let mut failures: u32 = 0;

        'restart: loop {
            let mut session = match self.authenticate().await {
                Ok(session) => session,
                Err(e) => match self.on_auth_failure(&mut failures, e).await {
                    AfterFailure::Restart => continue 'restart,
                    AfterFailure::GiveUp => return,
                },
            };
            failures = 0;

            loop {
                if session.is_stale(self.timing.reauth_after) {
                    info!(age_secs = session.age().as_secs(), "Session is stale, logging in again");
                    session = match self.authenticate().await {
                        Ok(session) => session,
                        Err(e) => match self.on_auth_failure(&mut failures, e).await {
                            AfterFailure::Restart => continue 'restart,
                            AfterFailure::GiveUp => return,
                        },
                    };
                }

                self.ping(&session).await;
                tokio::time::sleep(self.timing.ping_interval).await;
            }
        }
    }

    async fn authenticate(&self) -> Result<Session> {
        let session = match self.mode {
            AuthMode::Token => Session::new(self.credential.secret.clone(), AuthMode::Token),
            AuthMode::Login => {
                let token = self.api.login(&self.credential).await?;
                Session::new(token, AuthMode::Login)
            }
        };
        info!(mode = self.mode.as_str(), "Authenticated");
        self.emit(AccountEvent::Authenticated { index: self.index });
        Ok(session)
    }

    async fn on_auth_failure(&self, failures: &mut u32, err: anyhow::Error) -> AfterFailure {
        *failures += 1;
        self.emit(AccountEvent::AuthFailed { index: self.index, attempt: *failures });

        if let Some(max) = self.timing.max_auth_retries {
            if *failures >= max {
                error!(error = %format!("{:#}", err), attempts = *failures, "Login error, giving up on account");
                self.emit(AccountEvent::GaveUp { index: self.index });
                return AfterFailure::GiveUp;
            }
        }

        error!(
            error = %format!("{:#}", err),
            attempt = *failures,
            retry_in_secs = self.timing.retry_delay.as_secs(),
            "Login error"
        );
        tokio::time::sleep(self.timing.retry_delay).await;
        AfterFailure::Restart
    }

    /// One keep-alive round. Failures are logged and never stop the loop.
    async fn ping(&self, session: &Session) {
        match self.api.keep_alive(&self.credential.email, session.token()).await {
            Ok(body) => {
                info!(res = %body, "Keep alive success");
                self.emit(AccountEvent::KeepAlive { index: self.index, ok: true });
            }
            Err(e) => {
                error!(error = %format!("{:#}", e), "Keep alive error");
                self.emit(AccountEvent::KeepAlive { index: self.index, ok: false });
            }
        }

        match self.api.get_points(session.token()).await {
            Ok(breakdown) => {
                let total = breakdown.total();
                info!(total = %format_points(total), "Get point success");
                self.emit(AccountEvent::Points { index: self.index, ok: true, total: Some(total) });
            }
            Err(e) => {
                error!(error = %format!("{:#}", e), "Get point error");
                self.emit(AccountEvent::Points { index: self.index, ok: false, total: None });
            }
        }
    }

    fn emit(&self, event: AccountEvent) {
        if let Some(ref tx) = self.events {
            if tx.send(event).is_err() {
                warn!("Account event receiver dropped");
            }
        }
    }
}
