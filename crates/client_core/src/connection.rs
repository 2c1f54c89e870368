use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use shared::{error::ProtocolError, protocol::ServerMessage};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    backoff::{Backoff, BackoffPolicy},
    error::ConnectionError,
    transport::{Connector, Frame},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
        }
    }
}

/// Receiver of everything a connection produces, called from the session task.
///
/// Implementations must not block; they run between two reads of the socket.
pub trait ConnectionHandler: Send + Sync {
    fn on_status(&self, status: ConnectionStatus);
    fn on_message(&self, message: ServerMessage);
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionDiagnostics {
    pub status: ConnectionStatus,
    pub endpoint: Option<String>,
    pub torn_down: bool,
    pub consecutive_failures: u32,
    pub pending_reconnect: Option<Duration>,
    pub connections_established: u64,
    pub malformed_frames: u64,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl Default for ConnectionDiagnostics {
    fn default() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            endpoint: None,
            torn_down: false,
            consecutive_failures: 0,
            pending_reconnect: None,
            connections_established: 0,
            malformed_frames: 0,
            last_message_at: None,
        }
    }
}

type SharedDiagnostics = Arc<Mutex<ConnectionDiagnostics>>;

fn lock(diagnostics: &SharedDiagnostics) -> MutexGuard<'_, ConnectionDiagnostics> {
    diagnostics.lock().unwrap_or_else(PoisonError::into_inner)
}

// Sole owner of the reconnect timer. `close` joins the task.
struct Session {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    handler: Arc<dyn ConnectionHandler>,
    policy: BackoffPolicy,
    shutdown: CancellationToken,
    session: Option<Session>,
    diagnostics: SharedDiagnostics,
}

impl ConnectionManager {
    pub fn new(
        connector: Arc<dyn Connector>,
        handler: Arc<dyn ConnectionHandler>,
        policy: BackoffPolicy,
    ) -> Self {
        Self {
            connector,
            handler,
            policy,
            shutdown: CancellationToken::new(),
            session: None,
            diagnostics: Arc::new(Mutex::new(ConnectionDiagnostics::default())),
        }
    }

    pub async fn open(&mut self, endpoint: Url) -> Result<(), ConnectionError> {
        if self.shutdown.is_cancelled() {
            return Err(ConnectionError::TornDown);
        }
        self.stop_session().await;

        {
            let mut diagnostics = lock(&self.diagnostics);
            diagnostics.endpoint = Some(endpoint.to_string());
            diagnostics.pending_reconnect = None;
            diagnostics.consecutive_failures = 0;
        }

        let cancel = self.shutdown.child_token();
        let ctx = SessionContext {
            cancel: cancel.clone(),
            handler: Arc::clone(&self.handler),
            diagnostics: Arc::clone(&self.diagnostics),
        };
        ctx.set_status(ConnectionStatus::Connecting);
        info!(endpoint = %endpoint, "connection: opening");

        let task = tokio::spawn(run_session(
            ctx,
            Arc::clone(&self.connector),
            endpoint,
            self.policy,
        ));
        self.session = Some(Session { cancel, task });
        Ok(())
    }

    pub async fn close(&mut self) {
        let already_closed = self.shutdown.is_cancelled();
        self.shutdown.cancel();
        self.stop_session().await;

        let mut diagnostics = lock(&self.diagnostics);
        diagnostics.torn_down = true;
        diagnostics.pending_reconnect = None;
        if !already_closed {
            info!(endpoint = ?diagnostics.endpoint, "connection: torn down");
        }
    }

    pub fn status(&self) -> ConnectionDiagnostics {
        lock(&self.diagnostics).clone()
    }

    pub fn is_torn_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    async fn stop_session(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.cancel.cancel();
        if let Err(err) = session.task.await {
            if err.is_panic() {
                warn!("connection: session task panicked: {err}");
            }
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        // The session task notices at its next await and never calls back again.
        self.shutdown.cancel();
    }
}

struct SessionContext {
    cancel: CancellationToken,
    handler: Arc<dyn ConnectionHandler>,
    diagnostics: SharedDiagnostics,
}

impl SessionContext {
    fn is_live(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    fn set_status(&self, status: ConnectionStatus) {
        if !self.is_live() {
            return;
        }
        {
            let mut diagnostics = lock(&self.diagnostics);
            if diagnostics.status == status {
                return;
            }
            diagnostics.status = status;
            match status {
                ConnectionStatus::Connected => {
                    diagnostics.consecutive_failures = 0;
                    diagnostics.connections_established += 1;
                }
                ConnectionStatus::Disconnected => diagnostics.consecutive_failures += 1,
                ConnectionStatus::Connecting => {}
            }
        }
        self.handler.on_status(status);
    }

    fn set_pending_reconnect(&self, delay: Option<Duration>) {
        lock(&self.diagnostics).pending_reconnect = delay;
    }

    fn deliver(&self, decoded: Result<ServerMessage, ProtocolError>, raw: &str) {
        if !self.is_live() {
            return;
        }
        match decoded {
            Ok(message) => {
                lock(&self.diagnostics).last_message_at = Some(Utc::now());
                debug!(kind = message.kind(), "connection: message received");
                self.handler.on_message(message);
            }
            Err(err) => {
                lock(&self.diagnostics).malformed_frames += 1;
                warn!(
                    frame = %ProtocolError::preview(raw),
                    "connection: dropping malformed frame: {err}"
                );
            }
        }
    }
}

async fn run_session(
    ctx: SessionContext,
    connector: Arc<dyn Connector>,
    endpoint: Url,
    policy: BackoffPolicy,
) {
    let mut backoff = Backoff::new(policy);
    let mut first_attempt = true;

    loop {
        if !first_attempt {
            ctx.set_status(ConnectionStatus::Connecting);
        }
        first_attempt = false;

        let attempt = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return,
            attempt = connector.connect(&endpoint) => attempt,
        };

        match attempt {
            Ok(mut frames) => {
                if !ctx.is_live() {
                    return;
                }
                backoff.reset();
                ctx.set_status(ConnectionStatus::Connected);
                info!(endpoint = %endpoint, "connection: established");

                let loss = loop {
                    let next = tokio::select! {
                        biased;
                        _ = ctx.cancel.cancelled() => return,
                        next = frames.next() => next,
                    };
                    match next {
                        Some(Ok(Frame::Text(text))) => {
                            ctx.deliver(ServerMessage::from_json(&text), &text);
                        }
                        Some(Ok(Frame::Binary(bytes))) => {
                            ctx.deliver(
                                ServerMessage::from_slice(&bytes),
                                &String::from_utf8_lossy(&bytes),
                            );
                        }
                        Some(Ok(Frame::Close(reason))) => {
                            break format!("closed by peer ({})", reason.unwrap_or_default());
                        }
                        Some(Err(err)) => break err.to_string(),
                        None => break "stream ended".to_string(),
                    }
                };
                warn!(endpoint = %endpoint, "connection: lost: {loss}");
            }
            Err(err) => warn!(endpoint = %endpoint, "connection: attempt failed: {err}"),
        }

        if !ctx.is_live() {
            return;
        }
        ctx.set_status(ConnectionStatus::Disconnected);

        let delay = backoff.next_delay();
        ctx.set_pending_reconnect(Some(delay));
        info!(
            endpoint = %endpoint,
            ?delay,
            "connection: reconnect scheduled"
        );
        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
        ctx.set_pending_reconnect(None);
    }
}

#[cfg(test)]
#[path = "tests/connection_tests.rs"]
mod tests;
