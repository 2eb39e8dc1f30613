//! Analysis Handler
//!
//! The single computational endpoint: four counts in, the full
//! significance aggregate out.

use axum::{extract::State, response::Json};
use tracing::info;

use super::router::AppState;
use super::types::CalculateRequest;
use crate::errors::AppError;
use crate::metrics;
use crate::stats::AbTestResult;

/// POST /api/calculate - Run the statistical analysis
///
/// Validation failures surface as 400s naming the offending field; a
/// fault inside one hypothesis test degrades that test to an undefined
/// result without failing the request.
pub async fn calculate(
    State(state): State<AppState>,
    Json(req): Json<CalculateRequest>,
) -> Result<Json<AbTestResult>, AppError> {
    let result = state.analyzer.analyze(
        req.control_size,
        req.control_conversions,
        req.variation_size,
        req.variation_conversions,
    );

    match result {
        Ok(result) => {
            metrics::ANALYSES_TOTAL
                .with_label_values(&["assembled"])
                .inc();
            info!(
                control_size = req.control_size,
                variation_size = req.variation_size,
                significant = result.results.is_significant,
                "analysis assembled"
            );
            Ok(Json(result))
        }
        Err(e) => {
            metrics::ANALYSES_TOTAL
                .with_label_values(&["rejected"])
                .inc();
            Err(e)
        }
    }
}
