//! API Request/Response Types
//!
//! All HTTP API request and response structures for the splitstat server.

use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH & INFRASTRUCTURE
// =============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

// =============================================================================
// CALCULATE API
// =============================================================================

/// The analysis request: four non-negative integers. Negative or
/// fractional JSON numbers are rejected by deserialization before the
/// engine sees them.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CalculateRequest {
    pub control_size: u64,
    pub control_conversions: u64,
    pub variation_size: u64,
    pub variation_conversions: u64,
}
