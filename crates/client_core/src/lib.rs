pub mod backoff;
pub mod collection;
pub mod config;
pub mod connection;
pub mod error;
pub mod projection;
pub mod reconcile;
pub mod sync;
pub mod transport;

pub use backoff::{Backoff, BackoffPolicy};
pub use collection::StepCollection;
pub use config::ClientConfig;
pub use connection::{ConnectionDiagnostics, ConnectionHandler, ConnectionManager, ConnectionStatus};
pub use projection::{project, PhaseGroup, StatusCounts, StepView};
pub use reconcile::{reconcile, reconcile_with_outcome, Reconciled};
pub use sync::{SyncClient, SyncEvent, SyncSnapshot};
pub use transport::{Connector, Frame, FrameStream, WebSocketConnector};
