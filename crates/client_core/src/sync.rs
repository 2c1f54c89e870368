use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::protocol::ServerMessage;
use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::{
    collection::StepCollection,
    config::ClientConfig,
    connection::{ConnectionDiagnostics, ConnectionHandler, ConnectionManager, ConnectionStatus},
    error::ConnectionError,
    projection::{project, StepView},
    reconcile::{reconcile_with_outcome, Reconciled},
    transport::{Connector, WebSocketConnector},
};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct SyncSnapshot {
    pub status: ConnectionStatus,
    pub steps: Arc<StepCollection>,
    pub revision: u64,
}

impl SyncSnapshot {
    pub fn view(&self) -> StepView {
        project(&self.steps)
    }
}

#[derive(Debug, Clone)]
pub enum SyncEvent {
    StatusChanged {
        status: ConnectionStatus,
    },
    StepsReconciled {
        revision: u64,
        outcome: Reconciled,
        steps: Arc<StepCollection>,
    },
}

struct SyncInner {
    status: ConnectionStatus,
    steps: Arc<StepCollection>,
    revision: u64,
}

impl SyncInner {
    fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            status: self.status,
            steps: Arc::clone(&self.steps),
            revision: self.revision,
        }
    }
}

struct SyncState {
    inner: Mutex<SyncInner>,
    snapshots: watch::Sender<SyncSnapshot>,
    events: broadcast::Sender<SyncEvent>,
}

impl SyncState {
    fn new() -> Self {
        let inner = SyncInner {
            status: ConnectionStatus::Disconnected,
            steps: Arc::new(StepCollection::new()),
            revision: 0,
        };
        let (snapshots, _) = watch::channel(inner.snapshot());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Mutex::new(inner),
            snapshots,
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SyncInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Called with the state lock held so publication order matches apply order.
    fn publish(&self, inner: &SyncInner, event: SyncEvent) {
        self.snapshots.send_replace(inner.snapshot());
        let _ = self.events.send(event);
    }
}

impl ConnectionHandler for SyncState {
    fn on_status(&self, status: ConnectionStatus) {
        let mut inner = self.lock();
        inner.status = status;
        self.publish(&inner, SyncEvent::StatusChanged { status });
    }

    fn on_message(&self, message: ServerMessage) {
        let mut inner = self.lock();
        let collection = Arc::unwrap_or_clone(std::mem::take(&mut inner.steps));
        let (next, outcome) = reconcile_with_outcome(collection, message);
        inner.steps = Arc::new(next);

        if outcome == Reconciled::Unchanged {
            debug!(revision = inner.revision, "sync: message changed nothing");
            return;
        }
        inner.revision += 1;
        debug!(
            revision = inner.revision,
            steps = inner.steps.len(),
            ?outcome,
            "sync: steps reconciled"
        );
        let event = SyncEvent::StepsReconciled {
            revision: inner.revision,
            outcome,
            steps: Arc::clone(&inner.steps),
        };
        self.publish(&inner, event);
    }
}

pub struct SyncClient {
    state: Arc<SyncState>,
    manager: ConnectionManager,
}

impl SyncClient {
    pub async fn start(config: ClientConfig) -> Result<Self, ConnectionError> {
        Self::start_with_connector(config, Arc::new(WebSocketConnector)).await
    }

    pub async fn start_with_connector(
        config: ClientConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, ConnectionError> {
        let state = Arc::new(SyncState::new());
        let handler: Arc<dyn ConnectionHandler> = state.clone();
        let mut manager = ConnectionManager::new(connector, handler, config.backoff);
        manager.open(config.endpoint).await?;
        Ok(Self { state, manager })
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.state.snapshots.borrow().clone()
    }

    pub fn view(&self) -> StepView {
        self.snapshot().view()
    }

    /// Latest snapshot, skipping intermediate states a slow reader missed.
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.state.snapshots.subscribe()
    }

    /// Every status transition and collection change, in order.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.state.events.subscribe()
    }

    pub fn connection(&self) -> ConnectionDiagnostics {
        self.manager.status()
    }

    pub async fn shutdown(&mut self) {
        self.manager.close().await;
    }
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
