//! Effect size (Cohen's h) and the power-based retest recommendation.

use anyhow::Result;
use serde::Serialize;

use crate::constants::{
    EFFECT_LARGE_THRESHOLD, EFFECT_MEDIUM_THRESHOLD, EFFECT_SMALL_THRESHOLD, TARGET_POWER,
};

use super::numeric::normal_inverse_cdf;

/// Qualitative reading of |h|.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectInterpretation {
    Negligible,
    Small,
    Medium,
    Large,
}

impl std::fmt::Display for EffectInterpretation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Negligible => write!(f, "negligible"),
            Self::Small => write!(f, "small"),
            Self::Medium => write!(f, "medium"),
            Self::Large => write!(f, "large"),
        }
    }
}

/// Arcsine-transform effect size for the difference between two
/// proportions, with its qualitative interpretation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EffectSize {
    pub cohens_h: f64,
    pub interpretation: EffectInterpretation,
}

/// `h = 2 asin(sqrt(p2)) - 2 asin(sqrt(p1))`; sign follows the direction
/// of the change (positive when the variation converts better).
pub fn cohens_h(rate_control: f64, rate_variation: f64) -> f64 {
    2.0 * rate_variation.sqrt().asin() - 2.0 * rate_control.sqrt().asin()
}

/// Threshold convention: |h| < 0.2 negligible, < 0.5 small, < 0.8
/// medium, otherwise large.
pub fn interpret(h: f64) -> EffectInterpretation {
    let magnitude = h.abs();
    if magnitude < EFFECT_SMALL_THRESHOLD {
        EffectInterpretation::Negligible
    } else if magnitude < EFFECT_MEDIUM_THRESHOLD {
        EffectInterpretation::Small
    } else if magnitude < EFFECT_LARGE_THRESHOLD {
        EffectInterpretation::Medium
    } else {
        EffectInterpretation::Large
    }
}

pub fn effect_size(rate_control: f64, rate_variation: f64) -> EffectSize {
    let h = cohens_h(rate_control, rate_variation);
    EffectSize {
        cohens_h: h,
        interpretation: interpret(h),
    }
}

/// Per-group sample size for a two-sided z-test at `alpha` to reach 80%
/// power against the observed effect:
/// `n = ((z_{alpha/2} + z_{0.80}) / h)^2`, rounded up.
///
/// Returns 0 when `h = 0`: there is no detectable effect to power
/// against, and reporting 0 beats dividing by zero.
pub fn required_sample_size(h: f64, alpha: f64) -> Result<u64> {
    if h == 0.0 {
        return Ok(0);
    }

    let z_alpha = normal_inverse_cdf(1.0 - alpha / 2.0)?;
    let z_beta = normal_inverse_cdf(TARGET_POWER)?;
    let n = ((z_alpha + z_beta) / h).powi(2);

    Ok(n.ceil() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn h_sign_matches_rate_direction() {
        assert!(cohens_h(0.10, 0.15) > 0.0);
        assert!(cohens_h(0.15, 0.10) < 0.0);
        assert_eq!(cohens_h(0.25, 0.25), 0.0);
    }

    #[test]
    fn h_negates_under_group_swap() {
        let forward = cohens_h(0.10, 0.30);
        let backward = cohens_h(0.30, 0.10);
        assert!((forward + backward).abs() < 1e-12);
    }

    #[test]
    fn h_known_value() {
        // 2(asin sqrt(0.15) - asin sqrt(0.10)) = 0.1519 to four places.
        let h = cohens_h(0.10, 0.15);
        assert!((h - 0.1519).abs() < 1e-3, "h = {h}");
    }

    #[test]
    fn interpretation_boundaries() {
        assert_eq!(interpret(0.0), EffectInterpretation::Negligible);
        assert_eq!(interpret(0.19), EffectInterpretation::Negligible);
        assert_eq!(interpret(0.2), EffectInterpretation::Small);
        assert_eq!(interpret(-0.3), EffectInterpretation::Small);
        assert_eq!(interpret(0.5), EffectInterpretation::Medium);
        assert_eq!(interpret(-0.79), EffectInterpretation::Medium);
        assert_eq!(interpret(0.8), EffectInterpretation::Large);
        assert_eq!(interpret(-2.0), EffectInterpretation::Large);
    }

    #[test]
    fn sample_size_inverts_the_effect() {
        // (1.959964 + 0.841621)^2 / h^2 with h for 10% -> 15%.
        let h = cohens_h(0.10, 0.15);
        let n = required_sample_size(h, 0.05).unwrap();
        assert!((340..=342).contains(&n), "n = {n}");
    }

    #[test]
    fn smaller_effects_need_more_samples() {
        let big = required_sample_size(cohens_h(0.10, 0.20), 0.05).unwrap();
        let small = required_sample_size(cohens_h(0.10, 0.11), 0.05).unwrap();
        assert!(small > big);
    }

    #[test]
    fn zero_effect_reports_zero() {
        assert_eq!(required_sample_size(0.0, 0.05).unwrap(), 0);
    }

    #[test]
    fn interpretation_serializes_lowercase() {
        let json = serde_json::to_string(&EffectInterpretation::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }
}
