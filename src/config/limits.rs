//! Queue sizing configuration.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Events that may wait for the roster task before senders block (default: 1024).
    #[serde(default = "default_event_queue")]
    pub event_queue: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            event_queue: default_event_queue(),
        }
    }
}

fn default_event_queue() -> usize {
    1024
}
