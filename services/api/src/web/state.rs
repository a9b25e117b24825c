//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use postcraft_core::ports::DatabaseService;
use postcraft_core::workflow::Workflow;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// The workflow controller owns the service ports; the database port is also
/// held directly for the auth handlers and dashboard reads that sit outside
/// the upload/analyze/generate workflow.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub workflow: Workflow,
}
