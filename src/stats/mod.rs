//! Statistical engine for two-sample conversion-rate experiments.
//!
//! Leaf-first: [`numeric`] holds the shared primitives, [`proportion`]
//! the per-group and difference estimators, [`hypothesis`] the five-test
//! suite, [`effect`] the effect-size and power math, and [`analysis`]
//! the assembler that turns four integers into one response aggregate.
//!
//! Everything here is a pure function of its inputs; there is no shared
//! mutable state, so concurrent requests need no coordination.

pub mod analysis;
pub mod effect;
pub mod hypothesis;
pub mod numeric;
pub mod proportion;

pub use analysis::{AbTestResult, Analyzer, StatisticalTests, Verdict};
pub use effect::{EffectInterpretation, EffectSize};
pub use proportion::{DifferenceEstimate, GroupSample, ProportionEstimate};
