//! SkyWatch dashboard orchestration
//!
//! Keeps a [`ClientState`] fresh for the selected city: joined fetch
//! cycles, a cancellable refresh timer, alert resolution with
//! reconciliation, and backend connection status.

pub mod connection;
pub mod orchestrator;
mod reconciler;
pub mod scheduler;
pub mod state;

pub use connection::{CheckStatus, ConnectionMonitor, ConnectionStatus, ServiceCheck};
pub use orchestrator::{Dashboard, DashboardOptions, DEFAULT_REFRESH_INTERVAL};
pub use scheduler::RefreshSchedule;
pub use state::{ClientState, FETCH_ERROR_MESSAGE};
