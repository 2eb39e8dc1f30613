//! Single-proportion and two-proportion estimators.
//!
//! Per-group confidence intervals use the Wilson score interval, which
//! stays inside [0, 1] and behaves at small n or rates near the
//! boundaries. The interval on the *difference* deliberately keeps the
//! simpler independent-sample normal approximation: the two CI families
//! serve different response fields and are documented as asymmetric
//! rather than unified.

use anyhow::{anyhow, Result};
use serde::Serialize;

use super::numeric::normal_inverse_cdf;

/// One experiment arm: how many subjects saw it and how many converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSample {
    pub size: u64,
    pub conversions: u64,
}

impl GroupSample {
    pub fn new(size: u64, conversions: u64) -> Self {
        Self { size, conversions }
    }

    /// Observed conversion rate. Zero-size groups never reach this point
    /// (rejected during validation), but the guard keeps the function total.
    pub fn rate(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            self.conversions as f64 / self.size as f64
        }
    }
}

/// Point estimate and Wilson score interval for one group.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProportionEstimate {
    pub sample_size: u64,
    pub conversions: u64,
    #[serde(rename = "conversion_rate")]
    pub rate: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

/// Wilson score interval for a binomial proportion.
///
/// `confidence_level` is the two-sided coverage, e.g. 0.95.
pub fn estimate_proportion(
    sample: GroupSample,
    confidence_level: f64,
) -> Result<ProportionEstimate> {
    if sample.size < 1 {
        return Err(anyhow!("sample size must be at least 1"));
    }
    if sample.conversions > sample.size {
        return Err(anyhow!(
            "conversions {} exceed sample size {}",
            sample.conversions,
            sample.size
        ));
    }

    let n = sample.size as f64;
    let rate = sample.rate();
    let z = normal_inverse_cdf(1.0 - (1.0 - confidence_level) / 2.0)?;
    let z2 = z * z;

    let denom = 1.0 + z2 / n;
    let center = (rate + z2 / (2.0 * n)) / denom;
    let halfwidth = z * (rate * (1.0 - rate) / n + z2 / (4.0 * n * n)).sqrt() / denom;

    Ok(ProportionEstimate {
        sample_size: sample.size,
        conversions: sample.conversions,
        rate,
        ci_lower: (center - halfwidth).max(0.0),
        ci_upper: (center + halfwidth).min(1.0),
    })
}

/// Absolute and relative difference between the two arms, with a normal-
/// approximation interval on the absolute difference.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DifferenceEstimate {
    /// `rate_variation - rate_control`.
    pub absolute: f64,
    /// Percent change relative to control. `None` (serialized as null)
    /// when the control rate is 0 and the ratio is undefined.
    pub relative: Option<f64>,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

/// Two-proportion difference with independent-sample standard error:
/// `se = sqrt(p1(1-p1)/n1 + p2(1-p2)/n2)`, interval `diff +/- z * se`.
pub fn estimate_difference(
    control: GroupSample,
    variation: GroupSample,
    confidence_level: f64,
) -> Result<DifferenceEstimate> {
    if control.size < 1 || variation.size < 1 {
        return Err(anyhow!("both sample sizes must be at least 1"));
    }

    let p1 = control.rate();
    let p2 = variation.rate();
    let n1 = control.size as f64;
    let n2 = variation.size as f64;

    let absolute = p2 - p1;
    let relative = if p1 > 0.0 {
        Some(absolute / p1 * 100.0)
    } else {
        None
    };

    let z = normal_inverse_cdf(1.0 - (1.0 - confidence_level) / 2.0)?;
    let se = (p1 * (1.0 - p1) / n1 + p2 * (1.0 - p2) / n2).sqrt();
    let margin = z * se;

    Ok(DifferenceEstimate {
        absolute,
        relative,
        ci_lower: absolute - margin,
        ci_upper: absolute + margin,
    })
}
