//! The five-test hypothesis suite.
//!
//! Every test consumes the same pair of [`GroupSample`]s and produces its
//! own result record; the set is closed and enumerable, so each test gets
//! a concrete struct rather than open-ended dispatch. All p-values are
//! two-sided.
//!
//! Numeric degeneracies (zero pooled variance, empty contingency margins,
//! zero cells in an odds ratio) resolve to defined sentinels inside the
//! test that hit them; they never abort the suite. Genuine computation
//! faults surface as errors and are converted to an "undefined" result by
//! the assembler via each record's `failed` constructor.

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::constants::{BARNARD_MAX_TABLES, FISHER_RELATIVE_TOLERANCE, SCORE_TOLERANCE};

use super::numeric::{ln_binomial_coefficient, normal_cdf};
use super::proportion::GroupSample;

// =============================================================================
// RESULT RECORDS
// =============================================================================

/// Two-proportion z-test outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ZTestResult {
    pub z_score: Option<f64>,
    pub p_value: Option<f64>,
    pub test_name: String,
    pub description: String,
}

impl ZTestResult {
    fn name() -> String {
        "Two-Proportion Z-Test".to_string()
    }

    pub fn failed(reason: &str) -> Self {
        Self {
            z_score: None,
            p_value: None,
            test_name: Self::name(),
            description: format!("Error: {reason}"),
        }
    }
}

/// Chi-square (Yates-corrected) outcome, with Cramér's V as its effect size.
#[derive(Debug, Clone, Serialize)]
pub struct ChiSquareResult {
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub degrees_of_freedom: Option<u32>,
    pub cramers_v: Option<f64>,
    pub test_name: String,
    pub description: String,
}

impl ChiSquareResult {
    fn name() -> String {
        "Chi-Square Test (with Yates' correction)".to_string()
    }

    pub fn failed(reason: &str) -> Self {
        Self {
            statistic: None,
            p_value: None,
            degrees_of_freedom: None,
            cramers_v: None,
            test_name: Self::name(),
            description: format!("Error: {reason}"),
        }
    }
}

/// Fisher's conditional exact test outcome.
#[derive(Debug, Clone, Serialize)]
pub struct FisherExactResult {
    /// `(c1 * (n2-c2)) / ((n1-c1) * c2)`; `None` when a zero cell makes
    /// the ratio infinite or undefined.
    pub odds_ratio: Option<f64>,
    pub p_value: Option<f64>,
    pub test_name: String,
    pub description: String,
}

impl FisherExactResult {
    fn name() -> String {
        "Fisher's Exact Test".to_string()
    }

    pub fn failed(reason: &str) -> Self {
        Self {
            odds_ratio: None,
            p_value: None,
            test_name: Self::name(),
            description: format!("Error: {reason}"),
        }
    }
}

/// Barnard's unconditional exact test outcome.
#[derive(Debug, Clone, Serialize)]
pub struct BarnardExactResult {
    pub p_value: Option<f64>,
    /// Pooled conversion rate, reported as a diagnostic (not the argmax
    /// of the nuisance search).
    pub pooled_rate: Option<f64>,
    pub test_name: String,
    pub description: String,
}

impl BarnardExactResult {
    fn name() -> String {
        "Barnard's Exact Test".to_string()
    }

    pub fn failed(reason: &str) -> Self {
        Self {
            p_value: None,
            pooled_rate: None,
            test_name: Self::name(),
            description: format!("Error: {reason}"),
        }
    }
}

/// G-test (likelihood-ratio) outcome.
#[derive(Debug, Clone, Serialize)]
pub struct GTestResult {
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub degrees_of_freedom: Option<u32>,
    pub test_name: String,
    pub description: String,
}

impl GTestResult {
    fn name() -> String {
        "G-test (Likelihood Ratio Test)".to_string()
    }

    pub fn failed(reason: &str) -> Self {
        Self {
            statistic: None,
            p_value: None,
            degrees_of_freedom: None,
            test_name: Self::name(),
            description: format!("Error: {reason}"),
        }
    }
}

// =============================================================================
// SHARED PRIMITIVES
// =============================================================================

/// Pooled-variance score statistic for a candidate table
/// `(x1 of n1, x2 of n2)`. Returns 0 when the pooled rate is degenerate
/// (0 or 1), where no direction is distinguishable.
fn pooled_z(x1: u64, n1: u64, x2: u64, n2: u64) -> f64 {
    let n1f = n1 as f64;
    let n2f = n2 as f64;
    let pooled = (x1 + x2) as f64 / (n1f + n2f);
    let se = (pooled * (1.0 - pooled) * (1.0 / n1f + 1.0 / n2f)).sqrt();
    if se == 0.0 {
        0.0
    } else {
        (x2 as f64 / n2f - x1 as f64 / n1f) / se
    }
}

/// Two-sided tail probability for a z statistic; exact 1 at z = 0 so the
/// equal-groups case reports p = 1 rather than 1 - epsilon from the erf
/// approximation.
fn two_sided_p(z: f64) -> f64 {
    if z == 0.0 {
        1.0
    } else {
        (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0)
    }
}

/// Chi-square(df=1) upper tail via the square-root normal equivalence.
fn chi2_df1_sf(statistic: f64) -> f64 {
    if statistic <= 0.0 {
        1.0
    } else {
        (2.0 * (1.0 - normal_cdf(statistic.sqrt()))).clamp(0.0, 1.0)
    }
}

fn logaddexp(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
    hi + (lo - hi).exp().ln_1p()
}

// =============================================================================
// Z-TEST
// =============================================================================

/// Two-proportion z-test with pooled variance.
///
/// `se = 0` (all conversions or none across both arms) is a defined
/// degeneracy: z = 0, p = 1.
pub fn z_test(control: GroupSample, variation: GroupSample) -> Result<ZTestResult> {
    let z = pooled_z(
        control.conversions,
        control.size,
        variation.conversions,
        variation.size,
    );
    let p = two_sided_p(z);

    Ok(ZTestResult {
        z_score: Some(z),
        p_value: Some(p),
        test_name: ZTestResult::name(),
        description: "Asymptotic comparison of two conversion rates using the pooled standard error"
            .to_string(),
    })
}

// =============================================================================
// CHI-SQUARE (YATES)
// =============================================================================

/// Chi-square test on the 2x2 contingency table with Yates' continuity
/// correction, df = 1, plus Cramér's V.
///
/// When a margin is empty (no conversions at all, or no failures at
/// all), observed equals expected and the statistic is 0 by definition.
pub fn chi_square_test(control: GroupSample, variation: GroupSample) -> Result<ChiSquareResult> {
    let observed = [
        [control.conversions as f64, (control.size - control.conversions) as f64],
        [
            variation.conversions as f64,
            (variation.size - variation.conversions) as f64,
        ],
    ];

    let row = [control.size as f64, variation.size as f64];
    let col = [
        observed[0][0] + observed[1][0],
        observed[0][1] + observed[1][1],
    ];
    let total = row[0] + row[1];

    let description = "Test for independence with continuity correction".to_string();

    if col[0] == 0.0 || col[1] == 0.0 {
        // A zero margin fixes the table completely; no association is
        // measurable.
        return Ok(ChiSquareResult {
            statistic: Some(0.0),
            p_value: Some(1.0),
            degrees_of_freedom: Some(1),
            cramers_v: Some(0.0),
            test_name: ChiSquareResult::name(),
            description,
        });
    }

    let mut statistic = 0.0;
    for (i, row_total) in row.iter().enumerate() {
        for (j, col_total) in col.iter().enumerate() {
            let expected = row_total * col_total / total;
            let corrected = ((observed[i][j] - expected).abs() - 0.5).max(0.0);
            statistic += corrected * corrected / expected;
        }
    }

    Ok(ChiSquareResult {
        statistic: Some(statistic),
        p_value: Some(chi2_df1_sf(statistic)),
        degrees_of_freedom: Some(1),
        cramers_v: Some((statistic / total).sqrt()),
        test_name: ChiSquareResult::name(),
        description,
    })
}

// =============================================================================
// FISHER'S EXACT
// =============================================================================

/// Fisher's conditional exact test: fixed margins, two-sided p-value as
/// the sum of hypergeometric probabilities no greater than the observed
/// table's.
pub fn fisher_exact_test(control: GroupSample, variation: GroupSample) -> Result<FisherExactResult> {
    let n1 = control.size;
    let n2 = variation.size;
    let c1 = control.conversions;
    let c2 = variation.conversions;
    let total = n1 + n2;
    let successes = c1 + c2;

    // Support of the hypergeometric: x control conversions consistent
    // with both margins.
    let lo = successes.saturating_sub(n2);
    let hi = successes.min(n1);

    let ln_total_choose = ln_binomial_coefficient(total, successes)?;
    let ln_prob = |x: u64| -> Result<f64> {
        Ok(ln_binomial_coefficient(n1, x)? + ln_binomial_coefficient(n2, successes - x)?
            - ln_total_choose)
    };

    let ln_observed = ln_prob(c1)?;
    let cutoff = ln_observed + FISHER_RELATIVE_TOLERANCE;

    let mut p = 0.0;
    for x in lo..=hi {
        let lp = ln_prob(x)?;
        if lp <= cutoff {
            p += lp.exp();
        }
    }

    // Odds ratio with zero-cell handling: a zero denominator product
    // makes the ratio infinite (or undefined when the numerator is zero
    // too) and is reported as null.
    let ad = (c1 as f64) * ((n2 - c2) as f64);
    let bc = ((n1 - c1) as f64) * (c2 as f64);
    let odds_ratio = if bc == 0.0 { None } else { Some(ad / bc) };

    Ok(FisherExactResult {
        odds_ratio,
        p_value: Some(p.min(1.0)),
        test_name: FisherExactResult::name(),
        description: "Exact test for independence in 2x2 tables".to_string(),
    })
}

// =============================================================================
// BARNARD'S EXACT
// =============================================================================

/// Barnard's unconditional exact test.
///
/// Margins are not fixed: for every candidate table at least as extreme
/// as the observed one (score-statistic ordering), the probability under
/// `Binomial(n1, pi) x Binomial(n2, pi)` is summed, and the reported
/// p-value is the supremum of that sum over a bounded grid of the
/// nuisance parameter `pi` in (0, 1).
///
/// The table scan is `O(n1 * n2)`; tables larger than
/// [`BARNARD_MAX_TABLES`] are refused so one request cannot exceed its
/// latency budget. The grid bound trades a resolution-sized understatement
/// of the supremum for a fixed worst-case cost.
pub fn barnard_exact_test(
    control: GroupSample,
    variation: GroupSample,
    grid_steps: usize,
) -> Result<BarnardExactResult> {
    let n1 = control.size;
    let n2 = variation.size;

    let table_count = (n1 + 1).saturating_mul(n2 + 1);
    if table_count > BARNARD_MAX_TABLES {
        return Err(anyhow!(
            "table space too large for the unconditional test: {} candidate tables (max {})",
            table_count,
            BARNARD_MAX_TABLES
        ));
    }
    if grid_steps == 0 {
        return Err(anyhow!("nuisance grid must have at least one step"));
    }

    let total = n1 + n2;
    let pooled_rate = (control.conversions + variation.conversions) as f64 / total as f64;

    let z_observed = pooled_z(control.conversions, n1, variation.conversions, n2).abs();

    // Log binomial coefficient rows for both margins.
    let ln_c1: Vec<f64> = (0..=n1)
        .map(|k| ln_binomial_coefficient(n1, k))
        .collect::<Result<_>>()?;
    let ln_c2: Vec<f64> = (0..=n2)
        .map(|k| ln_binomial_coefficient(n2, k))
        .collect::<Result<_>>()?;

    // Group the extreme region by total successes s = x1 + x2: the joint
    // probability of a table under pi factors as
    //   exp(lnC(n1,x1) + lnC(n2,x2) + s ln pi + (N-s) ln(1-pi)),
    // so one log-sum-exp bucket per s reduces the per-grid-point cost
    // from O(n1 * n2) to O(n1 + n2).
    let mut bucket = vec![f64::NEG_INFINITY; (total + 1) as usize];
    for x1 in 0..=n1 {
        for x2 in 0..=n2 {
            let z = pooled_z(x1, n1, x2, n2).abs();
            if z >= z_observed - SCORE_TOLERANCE {
                let s = (x1 + x2) as usize;
                let ln_coeff = ln_c1[x1 as usize] + ln_c2[x2 as usize];
                bucket[s] = logaddexp(bucket[s], ln_coeff);
            }
        }
    }

    let mut supremum = 0.0_f64;
    let steps = grid_steps as f64;
    for i in 1..=grid_steps {
        let pi = i as f64 / (steps + 1.0);
        let ln_pi = pi.ln();
        let ln_one_minus_pi = (1.0 - pi).ln();

        let mut p = 0.0;
        for (s, &ln_coeff) in bucket.iter().enumerate() {
            if ln_coeff == f64::NEG_INFINITY {
                continue;
            }
            let s = s as f64;
            p += (ln_coeff + s * ln_pi + (total as f64 - s) * ln_one_minus_pi).exp();
        }
        supremum = supremum.max(p);
    }

    Ok(BarnardExactResult {
        p_value: Some(supremum.min(1.0)),
        pooled_rate: Some(pooled_rate),
        test_name: BarnardExactResult::name(),
        description: "Unconditional exact test for 2x2 tables".to_string(),
    })
}

// =============================================================================
// G-TEST
// =============================================================================

/// G-test (likelihood-ratio): `G = 2 * sum O * ln(O/E)` over the four
/// contingency cells, df = 1. Cells with `O = 0` contribute 0 (the
/// `x ln x -> 0` convention); an empty margin therefore yields G = 0.
pub fn g_test(control: GroupSample, variation: GroupSample) -> Result<GTestResult> {
    let observed = [
        [control.conversions as f64, (control.size - control.conversions) as f64],
        [
            variation.conversions as f64,
            (variation.size - variation.conversions) as f64,
        ],
    ];

    let row = [control.size as f64, variation.size as f64];
    let col = [
        observed[0][0] + observed[1][0],
        observed[0][1] + observed[1][1],
    ];
    let total = row[0] + row[1];

    let mut sum = 0.0;
    for (i, row_total) in row.iter().enumerate() {
        for (j, col_total) in col.iter().enumerate() {
            let o = observed[i][j];
            let e = row_total * col_total / total;
            if o > 0.0 && e > 0.0 {
                sum += o * (o / e).ln();
            }
        }
    }

    let statistic = (2.0 * sum).max(0.0);

    Ok(GTestResult {
        statistic: Some(statistic),
        p_value: Some(chi2_df1_sf(statistic)),
        degrees_of_freedom: Some(1),
        test_name: GTestResult::name(),
        description: "Test for independence using likelihood ratios".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BARNARD_GRID_STEPS;

    fn sample(size: u64, conversions: u64) -> GroupSample {
        GroupSample::new(size, conversions)
    }

    #[test]
    fn z_test_identical_groups_is_null_result() {
        let r = z_test(sample(500, 60), sample(500, 60)).unwrap();
        assert_eq!(r.z_score, Some(0.0));
        assert_eq!(r.p_value, Some(1.0));
    }

    #[test]
    fn z_test_zero_variance_is_defined() {
        // No conversions anywhere: pooled rate 0, se 0.
        let r = z_test(sample(1000, 0), sample(1000, 0)).unwrap();
        assert_eq!(r.z_score, Some(0.0));
        assert_eq!(r.p_value, Some(1.0));
        // All conversions everywhere: pooled rate 1, se 0.
        let r = z_test(sample(50, 50), sample(80, 80)).unwrap();
        assert_eq!(r.p_value, Some(1.0));
    }

    #[test]
    fn z_test_detects_large_sample_difference() {
        let r = z_test(sample(1000, 100), sample(1000, 150)).unwrap();
        let z = r.z_score.unwrap();
        assert!((z - 3.38).abs() < 0.01, "z = {z}");
        assert!(r.p_value.unwrap() < 0.01);
    }

    #[test]
    fn z_test_swapping_groups_negates_z() {
        let ab = z_test(sample(400, 40), sample(600, 90)).unwrap();
        let ba = z_test(sample(600, 90), sample(400, 40)).unwrap();
        assert!((ab.z_score.unwrap() + ba.z_score.unwrap()).abs() < 1e-12);
        assert!((ab.p_value.unwrap() - ba.p_value.unwrap()).abs() < 1e-12);
    }

    #[test]
    fn chi_square_known_value() {
        let r = chi_square_test(sample(1000, 100), sample(1000, 150)).unwrap();
        let statistic = r.statistic.unwrap();
        // Yates-corrected by hand: 2 * (24.5^2/125 + 24.5^2/875).
        assert!((statistic - 10.9760).abs() < 1e-3, "chi2 = {statistic}");
        assert!(r.p_value.unwrap() < 0.01);
        assert_eq!(r.degrees_of_freedom, Some(1));
        let v = r.cramers_v.unwrap();
        assert!((v - (statistic / 2000.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn chi_square_symmetric_under_group_swap() {
        let ab = chi_square_test(sample(300, 33), sample(700, 91)).unwrap();
        let ba = chi_square_test(sample(700, 91), sample(300, 33)).unwrap();
        assert!((ab.statistic.unwrap() - ba.statistic.unwrap()).abs() < 1e-12);
    }

    #[test]
    fn chi_square_empty_margin_is_degenerate() {
        let r = chi_square_test(sample(1000, 0), sample(1000, 0)).unwrap();
        assert_eq!(r.statistic, Some(0.0));
        assert_eq!(r.p_value, Some(1.0));
        assert_eq!(r.cramers_v, Some(0.0));
    }

    #[test]
    fn fisher_enumerable_table() {
        // Margins force support {0..5}; only x=5 and x=0 are as rare as
        // observed, each with probability 1/C(10,5) = 1/252.
        let r = fisher_exact_test(sample(5, 5), sample(5, 0)).unwrap();
        assert!((r.p_value.unwrap() - 2.0 / 252.0).abs() < 1e-9);
        // b = 0 cell: infinite odds ratio reported as null.
        assert!(r.odds_ratio.is_none());
    }

    #[test]
    fn fisher_balanced_table_is_insignificant() {
        let r = fisher_exact_test(sample(50, 5), sample(50, 6)).unwrap();
        let p = r.p_value.unwrap();
        assert!((0.0..=1.0).contains(&p));
        assert!(p > 0.7, "near-identical small samples, got p = {p}");
        let or = r.odds_ratio.unwrap();
        // (5 * 44) / (45 * 6)
        assert!((or - 220.0 / 270.0).abs() < 1e-9);
    }

    #[test]
    fn fisher_zero_cell_odds_ratio_is_zero() {
        let r = fisher_exact_test(sample(10, 0), sample(10, 4)).unwrap();
        assert_eq!(r.odds_ratio, Some(0.0));
    }

    #[test]
    fn barnard_equal_groups_is_one() {
        let r = barnard_exact_test(sample(40, 8), sample(40, 8), BARNARD_GRID_STEPS).unwrap();
        let p = r.p_value.unwrap();
        assert!((p - 1.0).abs() < 1e-6, "p = {p}");
        assert!((r.pooled_rate.unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn barnard_p_value_in_range_and_tracks_fisher() {
        let control = sample(50, 5);
        let variation = sample(50, 6);
        let barnard = barnard_exact_test(control, variation, BARNARD_GRID_STEPS)
            .unwrap()
            .p_value
            .unwrap();
        let fisher = fisher_exact_test(control, variation).unwrap().p_value.unwrap();
        assert!((0.0..=1.0).contains(&barnard));
        // The unconditional test is at least as powerful as the
        // conditional one; within grid tolerance its p-value cannot
        // exceed Fisher's.
        assert!(barnard <= fisher + 5e-3, "barnard {barnard} vs fisher {fisher}");
    }

    #[test]
    fn barnard_detects_clear_difference() {
        let r = barnard_exact_test(sample(100, 10), sample(100, 30), BARNARD_GRID_STEPS).unwrap();
        assert!(r.p_value.unwrap() < 0.01);
    }

    #[test]
    fn barnard_refuses_oversized_table_scan() {
        let err = barnard_exact_test(sample(6_000, 10), sample(6_000, 20), BARNARD_GRID_STEPS);
        assert!(err.is_err());
    }

    #[test]
    fn g_test_known_value() {
        let r = g_test(sample(1000, 100), sample(1000, 150)).unwrap();
        let g = r.statistic.unwrap();
        assert!((g - 11.50).abs() < 0.05, "G = {g}");
        assert!(r.p_value.unwrap() < 0.01);
        assert_eq!(r.degrees_of_freedom, Some(1));
    }

    #[test]
    fn g_test_zero_cells_contribute_nothing() {
        let r = g_test(sample(1000, 0), sample(1000, 0)).unwrap();
        assert_eq!(r.statistic, Some(0.0));
        assert_eq!(r.p_value, Some(1.0));
    }

    #[test]
    fn g_test_close_to_uncorrected_chi_square_at_scale() {
        // At large n the likelihood-ratio and Pearson statistics converge;
        // the Yates-corrected statistic is systematically a little smaller.
        let g = g_test(sample(5000, 500), sample(5000, 560))
            .unwrap()
            .statistic
            .unwrap();
        let chi = chi_square_test(sample(5000, 500), sample(5000, 560))
            .unwrap()
            .statistic
            .unwrap();
        assert!((g - chi).abs() / g < 0.1, "G = {g}, chi2 = {chi}");
    }

    #[test]
    fn failed_records_carry_error_description() {
        let r = BarnardExactResult::failed("table space too large");
        assert!(r.p_value.is_none());
        assert!(r.description.starts_with("Error:"));
    }
}
