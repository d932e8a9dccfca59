//! Capability indices (Cp, Cpk, Pp, Ppk) from the observed spread.
//!
//! No specification limits are taken as input. The observed range
//! `max - min` stands in for the tolerance width and the observed extremes
//! stand in for LSL/USL:
//!
//! ```text
//! Cp  = Pp  = (max - min) / (6 * s)
//! Cpk = Ppk = min((mean - min) / (3 * s), (max - mean) / (3 * s))
//! ```
//!
//! where `s` is the sample standard deviation (n - 1 denominator). No
//! within/overall variance split is made, so the short-term and long-term
//! indices are identical.
//!
//! # References
//!
//! - Montgomery (2019), *Introduction to Statistical Quality Control*, 8th ed.,
//!   Chapter 8 (textbook definitions with USL/LSL).
//! - Kane (1986), "Process Capability Indices", *Journal of Quality Technology*
//!   18(1), pp. 41--52.

use serde::Serialize;
use u_numflow::stats;

use crate::error::AnalysisError;

/// Location and spread of a measurement series.
///
/// Construction enforces the invariant every index relies on: at least two
/// values and a strictly positive sample standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesSummary {
    /// Number of measurements.
    pub n: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std_dev: f64,
    /// Smallest measurement.
    pub min: f64,
    /// Largest measurement.
    pub max: f64,
}

impl SeriesSummary {
    /// Summarizes `values`.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::EmptyOrDegenerateSeries`] if `values` has fewer than
    /// two elements, contains non-finite values, or has zero spread.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_capability::capability::SeriesSummary;
    ///
    /// let s = SeriesSummary::of(&[1.0, 2.0, 3.0]).unwrap();
    /// assert!((s.mean - 2.0).abs() < 1e-12);
    /// assert!((s.std_dev - 1.0).abs() < 1e-12);
    ///
    /// assert!(SeriesSummary::of(&[5.0, 5.0, 5.0, 5.0]).is_err());
    /// ```
    pub fn of(values: &[f64]) -> Result<Self, AnalysisError> {
        let degenerate = |std_dev| AnalysisError::EmptyOrDegenerateSeries {
            len: values.len(),
            std_dev,
        };

        let mean = stats::mean(values).ok_or_else(|| degenerate(None))?;
        let std_dev = stats::std_dev(values).ok_or_else(|| degenerate(None))?;
        let min = values
            .iter()
            .cloned()
            .reduce(f64::min)
            .ok_or_else(|| degenerate(None))?;
        let max = values
            .iter()
            .cloned()
            .reduce(f64::max)
            .ok_or_else(|| degenerate(None))?;

        // Equal extremes mean zero variance even if rounding left a tiny s.
        if max <= min || !std_dev.is_finite() || std_dev <= 0.0 {
            return Err(degenerate(Some(std_dev)));
        }

        Ok(Self {
            n: values.len(),
            mean,
            std_dev,
            min,
            max,
        })
    }
}

/// Cp = (max - min) / (6 * s).
pub fn cp(s: &SeriesSummary) -> f64 {
    (s.max - s.min) / (6.0 * s.std_dev)
}

/// Cpk = min((mean - min) / (3 * s), (max - mean) / (3 * s)).
pub fn cpk(s: &SeriesSummary) -> f64 {
    let lower = (s.mean - s.min) / (3.0 * s.std_dev);
    let upper = (s.max - s.mean) / (3.0 * s.std_dev);
    lower.min(upper)
}

/// Pp, computed with the same formula as [`cp`].
pub fn pp(s: &SeriesSummary) -> f64 {
    (s.max - s.min) / (6.0 * s.std_dev)
}

/// Ppk, computed with the same formula as [`cpk`].
pub fn ppk(s: &SeriesSummary) -> f64 {
    let lower = (s.mean - s.min) / (3.0 * s.std_dev);
    let upper = (s.max - s.mean) / (3.0 * s.std_dev);
    lower.min(upper)
}

/// Rounds to 3 decimal places, ties away from zero.
///
/// ```
/// use u_capability::capability::round3;
///
/// assert_eq!(round3(1.23456), 1.235);
/// assert_eq!(round3(-0.0004), -0.0);
/// ```
pub fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Unrounded capability indices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapabilityIndices {
    pub cp: f64,
    pub cpk: f64,
    pub pp: f64,
    pub ppk: f64,
    /// Summary the indices were computed from.
    pub summary: SeriesSummary,
}

impl CapabilityIndices {
    /// Computes all four indices for `values`.
    ///
    /// # Errors
    ///
    /// See [`SeriesSummary::of`].
    pub fn compute(values: &[f64]) -> Result<Self, AnalysisError> {
        let summary = SeriesSummary::of(values)?;
        Ok(Self::from_summary(summary))
    }

    /// Computes all four indices from an existing summary.
    pub fn from_summary(summary: SeriesSummary) -> Self {
        Self {
            cp: cp(&summary),
            cpk: cpk(&summary),
            pp: pp(&summary),
            ppk: ppk(&summary),
            summary,
        }
    }

    /// Rounds every index to 3 decimal places.
    pub fn report(&self) -> CapabilityReport {
        CapabilityReport {
            cp: round3(self.cp),
            cpk: round3(self.cpk),
            pp: round3(self.pp),
            ppk: round3(self.ppk),
            indices: *self,
        }
    }
}

/// Capability indices rounded for output.
///
/// Serializes as `{"Cp": .., "Cpk": .., "Pp": .., "Ppk": ..}`; the unrounded
/// [`CapabilityIndices`] are kept alongside but not serialized.
///
/// # Examples
///
/// ```
/// use u_capability::capability::CapabilityReport;
///
/// let values = [10.0, 12.0, 9.0, 11.0, 13.0, 10.0, 12.0, 9.0, 11.0, 13.0];
/// let report = CapabilityReport::compute(&values).unwrap();
/// assert_eq!(report.cp, 0.447);
/// assert_eq!(report.cp, report.pp);
/// assert_eq!(report.cpk, report.ppk);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapabilityReport {
    #[serde(rename = "Cp")]
    pub cp: f64,
    #[serde(rename = "Cpk")]
    pub cpk: f64,
    #[serde(rename = "Pp")]
    pub pp: f64,
    #[serde(rename = "Ppk")]
    pub ppk: f64,
    #[serde(skip)]
    pub indices: CapabilityIndices,
}

impl CapabilityReport {
    /// Computes and rounds the indices for `values`.
    ///
    /// # Errors
    ///
    /// See [`SeriesSummary::of`].
    pub fn compute(values: &[f64]) -> Result<Self, AnalysisError> {
        Ok(CapabilityIndices::compute(values)?.report())
    }
}
