//! Process capability analysis.
//!
//! Computes capability indices from a measurement series alone, using the
//! observed extremes in place of specification limits.
//!
//! # Indices
//!
//! - **Cp**, **Pp**: observed range over six sample standard deviations
//! - **Cpk**, **Ppk**: nearer extreme's distance from the mean over three
//!   sample standard deviations
//!
//! # References
//!
//! - Montgomery (2019), *Introduction to Statistical Quality Control*, 8th ed.

mod indices;

pub use indices::{cp, cpk, pp, ppk, round3, CapabilityIndices, CapabilityReport, SeriesSummary};
