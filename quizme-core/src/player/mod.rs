//! Single-player quiz session: state machine, timers and completion stats

pub mod driver;
pub mod session;
pub mod stats;

pub use driver::{Command, Event, PlayerDriver, TaskHandle, Update};
pub use session::{Advance, Correctness, LoadError, Player, Session, UNAVAILABLE_MESSAGE};
pub use stats::{format_elapsed, CompletionStats, PerformanceTier};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing configuration for the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Period of the elapsed-time counter
    pub tick_interval: Duration,
    /// Feedback delay between checking an answer and advancing
    pub advance_delay: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            tick_interval: Duration::from_secs(1),
            advance_delay: Duration::from_millis(1_500),
        }
    }
}
