//! Client side of the Repository Service for TUF REST API.
//!
//! [`ApiClient`] is the single gateway to the backend. The other modules add
//! typed operations on top of it: bootstrap status, task triggers and the
//! task poller, and the startup auth-mode probe.

pub mod auth_mode;
pub mod bootstrap;
pub mod client;
pub mod task;

pub use auth_mode::AuthMode;
pub use bootstrap::BootstrapStatus;
pub use client::{ApiClient, BackendResponse, RequestOptions};
pub use task::{TaskCompletion, TaskPoller, POLL_INTERVAL};
