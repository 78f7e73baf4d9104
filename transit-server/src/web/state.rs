//! Application state for the web layer.

use std::sync::Arc;

use crate::planner::PlannerConfig;
use crate::store::InMemoryStore;

/// Shared application state.
///
/// The store is immutable and shared; planners are built per request so
/// no search state crosses between concurrent requests.
#[derive(Clone)]
pub struct AppState {
    /// Loaded schedule data
    pub store: Arc<InMemoryStore>,

    /// Planner configuration
    pub config: Arc<PlannerConfig>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(store: InMemoryStore, config: PlannerConfig) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }
}
