//! Input validation for the analysis request
//! Bounds every integer before it reaches the engine, so the exact tests
//! cannot be driven into unbounded table scans.

use anyhow::{anyhow, Result};

/// Largest accepted per-group sample size.
///
/// Ten million subjects per arm is far beyond any experiment this service
/// sees, and together with the Barnard table budget it caps the cost of a
/// single request.
pub const MAX_GROUP_SIZE: u64 = 10_000_000;

/// Validate one group's sample size.
pub fn validate_sample_size(size: u64) -> Result<()> {
    if size < 1 {
        return Err(anyhow!("sample size must be at least 1"));
    }

    if size > MAX_GROUP_SIZE {
        return Err(anyhow!(
            "sample size too large: {size} (max: {MAX_GROUP_SIZE})"
        ));
    }

    Ok(())
}

/// Validate one group's conversion count against its sample size.
///
/// Negative counts cannot reach this point: the wire type is unsigned and
/// the deserializer rejects them.
pub fn validate_conversions(conversions: u64, size: u64) -> Result<()> {
    if conversions > size {
        return Err(anyhow!(
            "conversion count {conversions} exceeds sample size {size}"
        ));
    }

    Ok(())
}
