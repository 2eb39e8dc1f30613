//! Shared service state
//!
//! The engine is pure and the service keeps no per-request data, so the
//! shared state is just the configured analyzer plus what the health
//! endpoints report.

use std::time::Instant;

use crate::config::ServerConfig;
use crate::stats::Analyzer;

/// State shared by every handler. Immutable after startup; cloning the
/// `Arc` wrapper is all the synchronization concurrent requests need.
pub struct ServiceState {
    pub analyzer: Analyzer,
    pub config: ServerConfig,
    pub started_at: Instant,
}

impl ServiceState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            analyzer: Analyzer::new(config.alpha, config.barnard_grid_steps),
            config,
            started_at: Instant::now(),
        }
    }

    /// Seconds since the server started, for the health endpoint.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_carries_configured_alpha() {
        let mut config = ServerConfig::default();
        config.alpha = 0.01;
        let state = ServiceState::new(config);
        assert_eq!(state.analyzer.alpha(), 0.01);
    }
}
