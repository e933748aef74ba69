pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::processing::TriageProcessor;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<TriageProcessor>,
    pub started_at: std::time::Instant,
}

impl AppState {
    pub fn new(processor: Arc<TriageProcessor>) -> Self {
        Self {
            processor,
            started_at: std::time::Instant::now(),
        }
    }
}
