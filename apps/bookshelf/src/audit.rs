//! Best-effort audit trail of user actions.
//!
//! Recording is two-phase: the event is first written locally as a structured
//! `tracing` event, then queued for forwarding to the accounts service's
//! `/api/v1/logs` endpoint. Forwarding runs on a background worker; its
//! failures are logged and dropped and never reach the caller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::AppError;
use crate::upstream::expect_success;

const QUEUE_CAPACITY: usize = 1024;
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

/// Wire shape accepted by the accounts service log endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub user_id: i64,
    pub service: String,
    pub action: String,
    pub status: Outcome,
    pub details: Option<String>,
}

/// Cheap, cloneable handle created once per process.
#[derive(Clone)]
pub struct AuditLog {
    service: &'static str,
    queue: Option<mpsc::Sender<AuditEvent>>,
    pending: Arc<AtomicUsize>,
}

/// Owns the forwarding task. Call [`AuditWorker::shutdown`] after every
/// [`AuditLog`] clone has been dropped to flush what is still queued.
pub struct AuditWorker {
    handle: JoinHandle<()>,
    pending: Arc<AtomicUsize>,
}

impl AuditLog {
    /// Local-only sink: events go to the tracing subscriber and nowhere else.
    pub fn local(service: &'static str) -> Self {
        Self {
            service,
            queue: None,
            pending: Arc::default(),
        }
    }

    /// Sink that also forwards events to `{shared_service_url}/api/v1/logs`.
    pub fn forwarding(
        service: &'static str,
        client: Client,
        shared_service_url: &str,
    ) -> (Self, AuditWorker) {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let pending = Arc::new(AtomicUsize::new(0));
        let url = format!("{shared_service_url}/api/v1/logs");
        let handle = tokio::spawn(forward_loop(client, url, rx, pending.clone()));
        (
            Self {
                service,
                queue: Some(tx),
                pending: pending.clone(),
            },
            AuditWorker { handle, pending },
        )
    }

    /// Forwarding sink when `AUDIT_FORWARDING` is on, local-only otherwise.
    pub fn from_config(
        service: &'static str,
        client: &Client,
        config: &Config,
    ) -> (Self, Option<AuditWorker>) {
        if config.audit_forwarding {
            let (log, worker) =
                Self::forwarding(service, client.clone(), &config.shared_service_url);
            (log, Some(worker))
        } else {
            (Self::local(service), None)
        }
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    pub fn success(&self, user_id: i64, action: impl Into<String>, details: impl Into<String>) {
        self.record(user_id, action, Outcome::Success, Some(details.into()));
    }

    pub fn failure(&self, user_id: i64, action: impl Into<String>, details: impl Into<String>) {
        self.record(user_id, action, Outcome::Failure, Some(details.into()));
    }

    /// Records the outcome of one handled request: success with `details`
    /// computed from the value, or failure with the error text.
    pub fn record_result<T>(
        &self,
        user_id: i64,
        action: &str,
        result: &Result<T, AppError>,
        details: impl FnOnce(&T) -> String,
    ) {
        match result {
            Ok(value) => self.success(user_id, action, details(value)),
            Err(e) => self.failure(user_id, action, e.to_string()),
        }
    }

    /// Records an action outcome. Never blocks on I/O and never fails.
    pub fn record(
        &self,
        user_id: i64,
        action: impl Into<String>,
        status: Outcome,
        details: Option<String>,
    ) {
        let event = AuditEvent {
            user_id,
            service: self.service.to_string(),
            action: action.into(),
            status,
            details,
        };

        let details = event.details.as_deref().unwrap_or("");
        match status {
            Outcome::Success => info!(
                service = self.service,
                user_id,
                action = %event.action,
                status = status.as_str(),
                "{details}"
            ),
            Outcome::Failure => warn!(
                service = self.service,
                user_id,
                action = %event.action,
                status = status.as_str(),
                "{details}"
            ),
        }

        if let Some(queue) = &self.queue {
            match queue.try_send(event) {
                Ok(()) => {
                    self.pending.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => warn!("Dropping audit event, forward queue unavailable: {e}"),
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn with_queue(service: &'static str, queue: mpsc::Sender<AuditEvent>) -> Self {
        Self {
            service,
            queue: Some(queue),
            pending: Arc::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }
}

impl AuditWorker {
    /// Waits for the queue to drain once every sender is gone. Gives up after
    /// the drain timeout and drops whatever is still queued.
    pub async fn shutdown(self) {
        self.shutdown_within(DRAIN_TIMEOUT).await;
    }

    async fn shutdown_within(mut self, limit: Duration) {
        match tokio::time::timeout(limit, &mut self.handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Audit worker ended abnormally: {e}"),
            Err(_) => {
                self.handle.abort();
                warn!(
                    "Audit drain timed out after {}s, dropped {} queued events",
                    limit.as_secs(),
                    self.pending.load(Ordering::Relaxed)
                );
            }
        }
    }
}

async fn forward_loop(
    client: Client,
    url: String,
    mut rx: mpsc::Receiver<AuditEvent>,
    pending: Arc<AtomicUsize>,
) {
    while let Some(event) = rx.recv().await {
        let sent = client.post(&url).json(&event).send().await;
        let result = match sent {
            Ok(response) => expect_success("accounts service", response)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        pending.fetch_sub(1, Ordering::Relaxed);
        if let Err(e) = result {
            warn!("Failed to forward audit event '{}': {e}", event.action);
        }
    }
    info!("Audit forward queue drained");
}
