//! Configuration management for splitstat
//!
//! All configurable parameters in one place with environment variable
//! overrides. Follows the principle: sensible defaults, configurable in
//! production.

use std::env;

use tracing::info;

use crate::constants::{
    BARNARD_GRID_MAX, BARNARD_GRID_MIN, BARNARD_GRID_STEPS, DEFAULT_ALPHA,
};

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Allowed origins (empty = allow all)
    pub allowed_origins: Vec<String>,
    /// Allowed HTTP methods
    pub allowed_methods: Vec<String>,
    /// Allowed headers
    pub allowed_headers: Vec<String>,
    /// Max age for preflight cache (seconds)
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(), // Empty = allow all origins
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "OPTIONS".to_string(),
            ],
            allowed_headers: vec!["Content-Type".to_string()],
            max_age_seconds: 86400, // 24 hours
        }
    }
}

impl CorsConfig {
    /// Load from environment variables with production safety checks
    ///
    /// In production mode (SPLITSTAT_ENV=production), warns if CORS
    /// origins are not configured, so a deployment does not end up
    /// permissive by accident.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(origins) = env::var("SPLITSTAT_CORS_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(methods) = env::var("SPLITSTAT_CORS_METHODS") {
            config.allowed_methods = methods
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(headers) = env::var("SPLITSTAT_CORS_HEADERS") {
            config.allowed_headers = headers
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(val) = env::var("SPLITSTAT_CORS_MAX_AGE") {
            if let Ok(n) = val.parse() {
                config.max_age_seconds = n;
            }
        }

        let is_production = env::var("SPLITSTAT_ENV")
            .map(|v| {
                let v = v.to_lowercase();
                v == "production" || v == "prod"
            })
            .unwrap_or(false);

        if is_production && config.allowed_origins.is_empty() {
            tracing::warn!(
                "PRODUCTION WARNING: CORS allows all origins. Set SPLITSTAT_CORS_ORIGINS for security."
            );
        }

        config
    }

    /// Convert to tower-http CorsLayer
    pub fn to_layer(&self) -> tower_http::cors::CorsLayer {
        use tower_http::cors::{AllowOrigin, Any, CorsLayer};

        let mut layer = CorsLayer::new();

        if self.allowed_origins.is_empty() {
            // Intentionally permissive - no origins configured
            layer = layer.allow_origin(Any);
        } else {
            let mut valid_origins = Vec::new();
            let mut invalid_origins = Vec::new();

            for origin_str in &self.allowed_origins {
                match origin_str.parse::<axum::http::HeaderValue>() {
                    Ok(origin) => valid_origins.push(origin),
                    Err(_) => invalid_origins.push(origin_str.clone()),
                }
            }

            for invalid in &invalid_origins {
                tracing::warn!("CORS: Invalid origin '{}' - skipping", invalid);
            }

            if valid_origins.is_empty() {
                // All configured origins failed to parse - reject all
                // cross-origin requests instead of falling back to
                // permissive.
                tracing::error!(
                    "CORS: All {} configured origin(s) failed to parse. \
                     Rejecting all cross-origin requests. Fix SPLITSTAT_CORS_ORIGINS.",
                    self.allowed_origins.len()
                );
                layer =
                    layer.allow_origin(AllowOrigin::list(Vec::<axum::http::HeaderValue>::new()));
            } else {
                if !invalid_origins.is_empty() {
                    tracing::info!(
                        "CORS: Using {} valid origin(s), {} invalid skipped",
                        valid_origins.len(),
                        invalid_origins.len()
                    );
                }
                layer = layer.allow_origin(AllowOrigin::list(valid_origins));
            }
        }

        let methods: Vec<axum::http::Method> = self
            .allowed_methods
            .iter()
            .filter_map(|m| m.parse().ok())
            .collect();
        if methods.is_empty() {
            layer = layer.allow_methods(Any);
        } else {
            layer = layer.allow_methods(methods);
        }

        let headers: Vec<axum::http::HeaderName> = self
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        if headers.is_empty() {
            layer = layer.allow_headers(Any);
        } else {
            layer = layer.allow_headers(headers);
        }

        layer.max_age(std::time::Duration::from_secs(self.max_age_seconds))
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Two-sided significance level for the verdict and every interval
    pub alpha: f64,
    /// Nuisance-parameter grid resolution for Barnard's exact test
    pub barnard_grid_steps: usize,
    /// Maximum concurrent in-flight requests
    pub max_concurrent_requests: usize,
    /// CORS settings
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            alpha: DEFAULT_ALPHA,
            barnard_grid_steps: BARNARD_GRID_STEPS,
            max_concurrent_requests: 64,
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from environment variables, clamping every knob to its safe
    /// range. Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = env::var("SPLITSTAT_PORT") {
            if let Ok(port) = val.parse() {
                config.port = port;
            }
        }

        if let Ok(val) = env::var("SPLITSTAT_ALPHA") {
            if let Ok(alpha) = val.parse::<f64>() {
                // Alpha outside (0, 0.5] produces nonsense intervals.
                config.alpha = alpha.clamp(0.001, 0.5);
            }
        }

        if let Ok(val) = env::var("SPLITSTAT_BARNARD_GRID") {
            if let Ok(steps) = val.parse::<usize>() {
                config.barnard_grid_steps = steps.clamp(BARNARD_GRID_MIN, BARNARD_GRID_MAX);
            }
        }

        if let Ok(val) = env::var("SPLITSTAT_MAX_CONCURRENT") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_concurrent_requests = n.max(1);
            }
        }

        config.cors = CorsConfig::from_env();

        info!(
            port = config.port,
            alpha = config.alpha,
            barnard_grid_steps = config.barnard_grid_steps,
            max_concurrent = config.max_concurrent_requests,
            "server configuration loaded"
        );

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.alpha, DEFAULT_ALPHA);
        assert_eq!(config.barnard_grid_steps, BARNARD_GRID_STEPS);
        assert!(config.max_concurrent_requests >= 1);
    }

    #[test]
    fn cors_defaults_are_permissive() {
        let cors = CorsConfig::default();
        assert!(cors.allowed_origins.is_empty());
        assert!(cors.allowed_methods.contains(&"POST".to_string()));
    }
}
