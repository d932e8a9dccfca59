//! # u-capability
//!
//! Process capability indices and SPC chart rendering for a single series
//! of measurements.
//!
//! One analysis run takes an ordered list of measurements, computes the
//! rounded capability indices (Cp, Cpk, Pp, Ppk), renders five PNG charts,
//! and writes them to a keyed [`ArtifactStore`] where they replace the
//! charts of any previous run.
//!
//! ## Modules
//!
//! - [`analyzer`] — The analysis run and its response body
//! - [`capability`] — Capability indices from range-based bounds
//! - [`spc`] — X̄-R and I-MR chart series with control limits
//! - [`distribution`] — Histogram binning and kernel density estimation
//! - [`chart`] — PNG rendering of the five charts
//! - [`store`] — Keyed artifact storage (memory, directory)
//! - [`ingest`] — CSV / spreadsheet column extraction
//! - [`config`] — TOML configuration
//! - [`error`] — Error types
//!
//! ## Quick start
//!
//! ```
//! use u_capability::analyze;
//!
//! let values = [10.0, 12.0, 9.0, 11.0, 13.0, 10.0, 12.0, 9.0, 11.0, 13.0];
//! let outcome = analyze(&values, 5).unwrap();
//! assert_eq!(outcome.report.cp, 0.447);
//! assert!(outcome.charts.contains_key("histogram"));
//! ```
//!
//! ## Index definitions
//!
//! The bounds are taken from the data itself (USL = max, LSL = min), so the
//! indices describe how the observed range compares to the sample spread.
//! Cp and Pp share one formula, as do Cpk and Ppk.

pub mod analyzer;
pub mod capability;
pub mod chart;
pub mod config;
pub mod distribution;
pub mod error;
pub mod ingest;
pub mod spc;
pub mod store;

pub use analyzer::{analyze, AnalysisOutcome, CapabilityAnalyzer, DEFAULT_SUBGROUP_SIZE};
pub use capability::CapabilityReport;
pub use chart::ChartKind;
pub use config::AnalyzerConfig;
pub use error::{AnalysisError, ConfigError};
pub use ingest::{MeasurementSeries, Upload};
pub use store::{ArtifactStore, DirStore, MemoryStore};
