//! Core control chart types.
//!
//! A chart is an ordered series of plotted statistics plus, when the factor
//! tables cover the configuration, Shewhart control limits.
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.
//! - ASTM E2587 — Standard Practice for Use of Control Charts

use serde::Serialize;

/// Control limits for a chart.
///
/// # Invariants
///
/// - `lcl <= cl <= ucl`
/// - All values are finite
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlLimits {
    /// Upper control limit (UCL = CL + 3 sigma).
    pub ucl: f64,
    /// Center line (process mean or average range).
    pub cl: f64,
    /// Lower control limit (LCL = CL - 3 sigma).
    pub lcl: f64,
}

impl ControlLimits {
    /// Limits symmetric about `cl`.
    pub fn around(cl: f64, half_width: f64) -> Self {
        Self {
            ucl: cl + half_width,
            cl,
            lcl: cl - half_width,
        }
    }
}

/// Statistics plotted on one chart, in sequence order.
///
/// Point `i` is drawn at x = `i`; the series never reorders or drops values
/// it was built from.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChartSeries {
    values: Vec<f64>,
    limits: Option<ControlLimits>,
}

impl ChartSeries {
    /// Series without control limits.
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            limits: None,
        }
    }

    /// Attaches control limits.
    pub fn with_limits(mut self, limits: Option<ControlLimits>) -> Self {
        self.limits = limits;
        self
    }

    /// Plotted values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Control limits, if computed.
    pub fn limits(&self) -> Option<ControlLimits> {
        self.limits
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
