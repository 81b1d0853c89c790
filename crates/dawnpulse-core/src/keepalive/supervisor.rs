use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, info_span, warn, Instrument};

use crate::api::{DawnClient, RewardsApi};
use crate::config::Config;

use super::AccountLoop;

/// Owns every account loop and the signal that stops them.
pub struct Supervisor {
    tasks: JoinSet<()>,
    shutdown: watch::Sender<bool>,
}

impl Supervisor {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            tasks: JoinSet::new(),
            shutdown,
        }
    }

    /// Start one loop per configured account, each with its own client
    /// bound to its round-robin proxy.
    pub fn launch(config: &Config) -> Result<Self> {
        let mut supervisor = Self::new();
        let timing = config.timing();

        for (index, credential) in config.accounts.iter().enumerate() {
            let proxy = config.proxy_for(index);
            let client = DawnClient::new(proxy, config.request_timeout(), config.endpoints.clone())?;
            let api: Arc<dyn RewardsApi> = Arc::new(client);
            let account = AccountLoop::new(index, credential.clone(), config.auth_mode, api, timing);
            supervisor.spawn(account, proxy);
        }

        info!(accounts = supervisor.len(), proxies = config.proxies.len(), "Launched account loops");
        Ok(supervisor)
    }

    /// Run `account` on its own task, logging under an `account` span
    pub fn spawn(&mut self, account: AccountLoop, proxy: Option<&str>) {
        let span = info_span!(
            "account",
            idx = account.index(),
            acc = %account.email(),
            proxy = proxy.unwrap_or("direct")
        );
        let shutdown = self.shutdown.subscribe();
        self.tasks.spawn(account.run(shutdown).instrument(span));
    }

    /// Receiver that flips to `true` when shutdown begins
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Signal every loop to stop and wait for all of them
    pub async fn shutdown(mut self) {
        info!(accounts = self.tasks.len(), "Stopping account loops");
        self.shutdown.send_replace(true);
        self.join_all().await;
    }

    /// Wait for loops to finish on their own (retry caps) or via shutdown
    pub async fn join_all(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Account loop task failed");
            }
        }
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}
