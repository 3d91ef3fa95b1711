//! Application state

use quizme_core::{AccessGate, CorsPolicy, QuizStore};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Access gate in front of the quiz store
    pub gate: Arc<AccessGate>,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create state over `store` with the given CORS policy
    pub fn new(store: Arc<dyn QuizStore>, cors: CorsPolicy) -> Self {
        Self {
            gate: Arc::new(AccessGate::with_policy(store, cors)),
            start_time: Instant::now(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
