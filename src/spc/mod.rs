//! Statistical Process Control (SPC) chart series.
//!
//! Turns a measurement series into the statistics plotted on variables
//! control charts.
//!
//! # Charts
//!
//! - [`XBarRChart`] — subgroup means and ranges over fixed-size subgroups
//! - [`IndividualMRChart`] — individual observations and moving ranges
//! - [`ShewhartFactors`] — A2/D3/D4 limit factors by subgroup size
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.
//! - ASTM E2587 — Standard Practice for Use of Control Charts

mod chart;
mod variables;

pub use chart::{ChartSeries, ControlLimits};
pub use variables::{
    moving_ranges, subgroup_means, subgroup_ranges, subgroups, IndividualMRChart, ShewhartFactors,
    XBarRChart,
};
