//! HTTP API Handlers - Modular organization of the REST API
//!
//! Each submodule handles a specific domain of functionality.

// Core modules
pub mod router;
pub mod state;
pub mod types;

// Analysis endpoint
pub mod calculate;

// Health and observability
pub mod health;

// Re-export commonly used items
pub use router::{build_router, AppState};
pub use state::ServiceState;
pub use types::*;
