//! HTTP request tracking middleware for observability

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use std::time::Instant;

/// Middleware to track HTTP request latency and counts
pub async fn track_metrics(req: Request, next: Next) -> Result<Response, StatusCode> {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    // Normalize path to avoid high cardinality from mistyped URLs
    let normalized_path = normalize_path(&path);

    crate::metrics::HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &normalized_path, &status])
        .observe(duration);

    crate::metrics::HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &normalized_path, &status])
        .inc();

    Ok(response)
}

/// Collapse numeric path segments so arbitrary client typos cannot mint
/// unbounded label values.
fn normalize_path(path: &str) -> String {
    let mut normalized = Vec::new();

    for part in path.split('/') {
        if part.is_empty() {
            continue;
        }

        if part.chars().all(|c| c.is_numeric()) {
            normalized.push("{id}");
        } else {
            normalized.push(part);
        }
    }

    format!("/{}", normalized.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/api/calculate"), "/api/calculate");
        assert_eq!(normalize_path("/health"), "/health");
        assert_eq!(normalize_path("/api/12345"), "/api/{id}");
    }
}
