//! Router Configuration - Centralized route definitions
//!
//! This module builds the Axum router using handlers from the submodules.
//! Every route is public: the calculator serves anonymous clients, and
//! the health/metrics routes must stay reachable for probes and scraping.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::state::ServiceState;
use super::{calculate, health};

/// Application state type alias
pub type AppState = Arc<ServiceState>;

/// Build the complete router
///
/// Note: This function does NOT apply CORS or concurrency layers.
/// The caller (main.rs) applies those as needed.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // =================================================================
        // HEALTH & KUBERNETES PROBES
        // =================================================================
        .route("/health", get(health::health))
        .route("/health/live", get(health::health_live))
        .route("/health/ready", get(health::health_ready))
        // =================================================================
        // METRICS (PROMETHEUS)
        // =================================================================
        .route("/metrics", get(health::metrics_endpoint))
        // =================================================================
        // ANALYSIS
        // =================================================================
        .route("/api/calculate", post(calculate::calculate))
        // =================================================================
        // STATE
        // =================================================================
        .with_state(state)
}
