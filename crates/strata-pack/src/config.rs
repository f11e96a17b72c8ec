use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the package decode pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecodeConfig {
    /// Maximum wall-clock time an `open` call waits for the background
    /// decode to deliver its data. Elapsing is a terminal failure for
    /// that part, not a retryable condition.
    pub open_timeout: Duration,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            open_timeout: Duration::from_secs(30),
        }
    }
}
