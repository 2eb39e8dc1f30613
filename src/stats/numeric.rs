//! Numeric primitives shared by every statistical test.
//!
//! Log-space combinatorics keep binomial terms finite for sample sizes in
//! the thousands, and the normal CDF / inverse-CDF pair supplies the tail
//! probabilities and interval multipliers used by the asymptotic tests.
//!
//! All functions are pure. Arguments outside the documented domain produce
//! an error instead of a NaN that would poison downstream arithmetic.

use anyhow::{anyhow, Result};

/// Lanczos series coefficients for the log-gamma approximation.
const LANCZOS_COEFFS: [f64; 6] = [
    76.18009172947146,
    -86.50532032941677,
    24.01409824083091,
    -1.231739572450155,
    0.1208650973866179e-2,
    -0.5395239384953e-5,
];

/// Natural log of the gamma function, valid for `x > 0`.
///
/// Lanczos approximation, accurate to ~1e-10 over the range used here.
pub fn ln_gamma(x: f64) -> Result<f64> {
    if !(x > 0.0) {
        return Err(anyhow!("ln_gamma domain error: x must be positive, got {x}"));
    }

    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();

    let mut ser = 1.000000000190015;
    for (i, &coeff) in LANCZOS_COEFFS.iter().enumerate() {
        ser += coeff / (x + 1.0 + i as f64);
    }

    Ok(-tmp + (2.5066282746310005 * ser / x).ln())
}

/// `ln C(n, k)` via log-gamma, stable where the coefficient itself would
/// overflow (n in the thousands).
pub fn ln_binomial_coefficient(n: u64, k: u64) -> Result<f64> {
    if k > n {
        return Err(anyhow!(
            "ln_binomial_coefficient domain error: k={k} exceeds n={n}"
        ));
    }

    let n = n as f64;
    let k = k as f64;
    Ok(ln_gamma(n + 1.0)? - ln_gamma(k + 1.0)? - ln_gamma(n - k + 1.0)?)
}

/// Binomial probability mass `P(X = k)` for `X ~ Binomial(n, p)`.
pub fn binomial_pmf(n: u64, k: u64, p: f64) -> Result<f64> {
    if k > n {
        return Err(anyhow!("binomial_pmf domain error: k={k} exceeds n={n}"));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(anyhow!("binomial_pmf domain error: p={p} outside [0, 1]"));
    }

    // Degenerate success probabilities concentrate all mass at one point.
    if p == 0.0 {
        return Ok(if k == 0 { 1.0 } else { 0.0 });
    }
    if p == 1.0 {
        return Ok(if k == n { 1.0 } else { 0.0 });
    }

    let ln_coeff = ln_binomial_coefficient(n, k)?;
    let k = k as f64;
    let n = n as f64;
    Ok((ln_coeff + k * p.ln() + (n - k) * (1.0 - p).ln()).exp())
}

/// Binomial cumulative probability `P(X <= k)` for `X ~ Binomial(n, p)`.
pub fn binomial_cdf(n: u64, k: u64, p: f64) -> Result<f64> {
    if k > n {
        return Err(anyhow!("binomial_cdf domain error: k={k} exceeds n={n}"));
    }

    let mut total = 0.0;
    for j in 0..=k {
        total += binomial_pmf(n, j, p)?;
    }
    Ok(total.min(1.0))
}

/// Error function approximation (Abramowitz & Stegun 7.1.26, max error ~1.5e-7).
pub fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}

/// Standard normal CDF via the error function.
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Inverse standard normal CDF (Acklam's rational approximation).
///
/// Valid for `p` strictly inside (0, 1); the tails use a separate
/// rational form below/above the 0.02425 breakpoints.
pub fn normal_inverse_cdf(p: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(anyhow!(
            "normal_inverse_cdf domain error: p={p} outside (0, 1)"
        ));
    }

    let a = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    let b = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    let c = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    let d = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];

    let p_low = 0.02425;
    let p_high = 1.0 - p_low;

    let z = if p < p_low {
        let q = (-2.0 * p.ln()).sqrt();
        (((((c[0] * q + c[1]) * q + c[2]) * q + c[3]) * q + c[4]) * q + c[5])
            / ((((d[0] * q + d[1]) * q + d[2]) * q + d[3]) * q + 1.0)
    } else if p <= p_high {
        let q = p - 0.5;
        let r = q * q;
        (((((a[0] * r + a[1]) * r + a[2]) * r + a[3]) * r + a[4]) * r + a[5]) * q
            / (((((b[0] * r + b[1]) * r + b[2]) * r + b[3]) * r + b[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((c[0] * q + c[1]) * q + c[2]) * q + c[3]) * q + c[4]) * q + c[5])
            / ((((d[0] * q + d[1]) * q + d[2]) * q + d[3]) * q + 1.0)
    };

    Ok(z)
}
