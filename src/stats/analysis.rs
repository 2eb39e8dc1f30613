//! Result assembly: the staged pipeline from four raw counts to the
//! immutable response aggregate.
//!
//! The pipeline walks Validating -> Estimating -> Testing -> Scoring ->
//! Assembled; Rejected is reachable only from Validating and surfaces as
//! a client error naming the offending field. A fault inside one
//! hypothesis test degrades that test to an undefined result instead of
//! aborting the rest of the suite.

use serde::Serialize;
use tracing::{debug, warn};

use crate::constants::{BARNARD_GRID_STEPS, DEFAULT_ALPHA};
use crate::errors::{AppError, Result, ValidationErrorExt};
use crate::metrics;
use crate::validation;

use super::effect::{effect_size, required_sample_size, EffectSize};
use super::hypothesis::{
    barnard_exact_test, chi_square_test, fisher_exact_test, g_test, z_test, BarnardExactResult,
    ChiSquareResult, FisherExactResult, GTestResult, ZTestResult,
};
use super::proportion::{
    estimate_difference, estimate_proportion, DifferenceEstimate, GroupSample, ProportionEstimate,
};

/// Pipeline stages, in order. `Rejected` is terminal and only reachable
/// from `Validating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Validating,
    Estimating,
    Testing,
    Scoring,
    Assembled,
    Rejected,
}

/// The closed set of hypothesis-test results, one record per test.
#[derive(Debug, Clone, Serialize)]
pub struct StatisticalTests {
    pub z_test: ZTestResult,
    pub chi_square: ChiSquareResult,
    pub fishers_exact: FisherExactResult,
    pub barnards_exact: BarnardExactResult,
    pub g_test: GTestResult,
}

/// Significance verdict and the retest recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub is_significant: bool,
    /// Percent, e.g. 95.
    pub confidence_level: f64,
    /// Per-group size for an adequately powered retest; 0 when the
    /// result is already significant or the observed effect is exactly 0.
    pub recommended_sample_size: u64,
}

/// The full analysis aggregate. Assembled once per request, never
/// mutated afterwards, and carrying no identity beyond its inputs:
/// identical requests produce byte-identical serializations.
#[derive(Debug, Clone, Serialize)]
pub struct AbTestResult {
    pub control: ProportionEstimate,
    pub variation: ProportionEstimate,
    pub difference: DifferenceEstimate,
    pub statistical_tests: StatisticalTests,
    pub effect_size: EffectSize,
    pub results: Verdict,
}

/// Stateless analysis engine. Holds only the configured significance
/// level and the Barnard grid resolution; safe to share across any
/// number of concurrent requests.
#[derive(Debug, Clone, Copy)]
pub struct Analyzer {
    alpha: f64,
    confidence_level: f64,
    barnard_grid_steps: usize,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA, BARNARD_GRID_STEPS)
    }
}

impl Analyzer {
    pub fn new(alpha: f64, barnard_grid_steps: usize) -> Self {
        Self {
            alpha,
            confidence_level: 1.0 - alpha,
            barnard_grid_steps,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Run the full pipeline over the four request integers.
    pub fn analyze(
        &self,
        control_size: u64,
        control_conversions: u64,
        variation_size: u64,
        variation_conversions: u64,
    ) -> Result<AbTestResult> {
        let _timer = metrics::Timer::new(metrics::ANALYSIS_DURATION.clone());

        debug!(stage = ?Stage::Validating, control_size, variation_size, "analysis started");
        let (control, variation) = match self.validate(
            control_size,
            control_conversions,
            variation_size,
            variation_conversions,
        ) {
            Ok(groups) => groups,
            Err(e) => {
                debug!(stage = ?Stage::Rejected, error = %e, "analysis rejected");
                return Err(e);
            }
        };

        debug!(stage = ?Stage::Estimating, "computing proportion estimates");
        let control_estimate = estimate_proportion(control, self.confidence_level)
            .map_err(|e| AppError::ComputationFault(e.to_string()))?;
        let variation_estimate = estimate_proportion(variation, self.confidence_level)
            .map_err(|e| AppError::ComputationFault(e.to_string()))?;
        let difference = estimate_difference(control, variation, self.confidence_level)
            .map_err(|e| AppError::ComputationFault(e.to_string()))?;

        debug!(stage = ?Stage::Testing, "running hypothesis tests");
        let statistical_tests = StatisticalTests {
            z_test: run_test("z_test", || z_test(control, variation), ZTestResult::failed),
            chi_square: run_test(
                "chi_square",
                || chi_square_test(control, variation),
                ChiSquareResult::failed,
            ),
            fishers_exact: run_test(
                "fishers_exact",
                || fisher_exact_test(control, variation),
                FisherExactResult::failed,
            ),
            barnards_exact: run_test(
                "barnards_exact",
                || barnard_exact_test(control, variation, self.barnard_grid_steps),
                BarnardExactResult::failed,
            ),
            g_test: run_test("g_test", || g_test(control, variation), GTestResult::failed),
        };

        debug!(stage = ?Stage::Scoring, "computing effect size and verdict");
        let effect = effect_size(control_estimate.rate, variation_estimate.rate);

        // The verdict follows the z-test; an undefined z-test p-value can
        // never claim significance.
        let is_significant = statistical_tests
            .z_test
            .p_value
            .map(|p| p <= self.alpha)
            .unwrap_or(false);

        let recommended_sample_size = if is_significant {
            0
        } else {
            required_sample_size(effect.cohens_h, self.alpha)
                .map_err(|e| AppError::ComputationFault(e.to_string()))?
        };

        let results = Verdict {
            is_significant,
            confidence_level: self.confidence_level * 100.0,
            recommended_sample_size,
        };

        debug!(stage = ?Stage::Assembled, significant = is_significant, "analysis complete");
        Ok(AbTestResult {
            control: control_estimate,
            variation: variation_estimate,
            difference,
            statistical_tests,
            effect_size: effect,
            results,
        })
    }

    fn validate(
        &self,
        control_size: u64,
        control_conversions: u64,
        variation_size: u64,
        variation_conversions: u64,
    ) -> Result<(GroupSample, GroupSample)> {
        validation::validate_sample_size(control_size).map_validation_err("control_size")?;
        validation::validate_conversions(control_conversions, control_size)
            .map_validation_err("control_conversions")?;
        validation::validate_sample_size(variation_size).map_validation_err("variation_size")?;
        validation::validate_conversions(variation_conversions, variation_size)
            .map_validation_err("variation_conversions")?;

        Ok((
            GroupSample::new(control_size, control_conversions),
            GroupSample::new(variation_size, variation_conversions),
        ))
    }
}

/// Run one hypothesis test, degrading a fault to the record's undefined
/// form so the other tests still report.
fn run_test<T>(
    name: &'static str,
    run: impl FnOnce() -> anyhow::Result<T>,
    failed: impl FnOnce(&str) -> T,
) -> T {
    match run() {
        Ok(result) => result,
        Err(e) => {
            warn!(test = name, error = %e, "test failed; reporting undefined result");
            metrics::TEST_FAILURES_TOTAL.with_label_values(&[name]).inc();
            failed(&e.to_string())
        }
    }
}
