//! Documented constants for the analysis engine
//!
//! All tunable numeric parameters in one place with justification for
//! their values. Centralizing constants prevents magic numbers and makes
//! tuning easier.

// =============================================================================
// SIGNIFICANCE DEFAULTS
// =============================================================================

/// Default significance level (two-sided alpha).
///
/// 0.05 is the conventional threshold for conversion experiments and is
/// what the published results of this calculator have always used. It is
/// overridable per deployment via `SPLITSTAT_ALPHA`.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Default confidence level for every interval in the response.
///
/// Kept as `1 - DEFAULT_ALPHA` so the significance verdict and the
/// intervals always tell the same story.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 1.0 - DEFAULT_ALPHA;

/// Target power for the retest sample-size recommendation.
///
/// 80% is the standard planning convention: a four-to-one trade between
/// missed effects and false alarms at alpha = 0.05.
pub const TARGET_POWER: f64 = 0.80;

// =============================================================================
// EFFECT SIZE INTERPRETATION (Cohen's h)
// =============================================================================

/// |h| below this is negligible; at or above it, small.
pub const EFFECT_SMALL_THRESHOLD: f64 = 0.2;

/// |h| at or above this is medium.
pub const EFFECT_MEDIUM_THRESHOLD: f64 = 0.5;

/// |h| at or above this is large.
pub const EFFECT_LARGE_THRESHOLD: f64 = 0.8;

// =============================================================================
// BARNARD'S EXACT TEST BOUNDS
// =============================================================================

/// Number of evenly spaced interior points scanned for the nuisance
/// parameter pi in (0, 1).
///
/// 1000 steps bounds the supremum error by the grid resolution while
/// keeping the scan cost fixed and predictable. Overridable via
/// `SPLITSTAT_BARNARD_GRID` within [`BARNARD_GRID_MIN`, `BARNARD_GRID_MAX`].
pub const BARNARD_GRID_STEPS: usize = 1000;

/// Lower clamp for the configurable grid resolution.
pub const BARNARD_GRID_MIN: usize = 100;

/// Upper clamp for the configurable grid resolution.
pub const BARNARD_GRID_MAX: usize = 10_000;

/// Upper bound on the (n1+1) * (n2+1) candidate-table scan.
///
/// The unconditional test enumerates every possible 2x2 table once. At
/// 25 million tables (roughly 5000 per group) the scan stays well under
/// a second; beyond it the test reports itself as unavailable rather
/// than blowing the request latency budget. The other four tests are
/// closed-form and unaffected.
pub const BARNARD_MAX_TABLES: u64 = 25_000_000;

/// Tolerance when comparing a candidate table's score statistic against
/// the observed one, so ties are not dropped to float rounding.
pub const SCORE_TOLERANCE: f64 = 1e-7;

// =============================================================================
// FISHER'S EXACT TEST
// =============================================================================

/// Relative tolerance when summing tables "no more probable than
/// observed". Absorbs float noise in the log-space hypergeometric terms;
/// the same slack conventionally used by scipy and R.
pub const FISHER_RELATIVE_TOLERANCE: f64 = 1e-7;
