pub mod gate;
pub mod routes;
pub mod templates;

pub use routes::create_router;

use crate::api::{ApiClient, TaskPoller};
use crate::config::ResolvedConfig;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Application state for web handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ResolvedConfig>,
    pub client: ApiClient,
    pub poller: TaskPoller,
    /// Cancelled on server shutdown; task waits hang child tokens off it
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Arc<ResolvedConfig>, client: ApiClient, shutdown: CancellationToken) -> Self {
        let poller = TaskPoller::new(client.clone());
        Self {
            config,
            client,
            poller,
            shutdown,
        }
    }

    pub fn with_poller(mut self, poller: TaskPoller) -> Self {
        self.poller = poller;
        self
    }
}
