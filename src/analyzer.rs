//! The capability analyzer: statistics plus charts in one synchronous run.
//!
//! A run validates the series, computes the capability report, renders all
//! five charts, and writes them to the injected [`ArtifactStore`]. A run
//! either completes fully or returns an error; the report is never returned
//! without its charts.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::capability::{CapabilityIndices, CapabilityReport};
use crate::chart::{self, ChartKind};
use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, ConfigError};
use crate::ingest::{self, Upload};
use crate::store::{ArtifactStore, MemoryStore};

/// Default subgroup size for the X̄ and R charts.
pub const DEFAULT_SUBGROUP_SIZE: usize = 5;

/// Result of a successful analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    /// Rounded capability indices.
    pub report: CapabilityReport,
    /// PNG bytes keyed by logical chart name.
    pub charts: BTreeMap<String, Vec<u8>>,
}

impl AnalysisOutcome {
    /// Retrieval path for each chart: `name -> "/plot/<name>"`.
    pub fn chart_paths(&self) -> BTreeMap<String, String> {
        self.charts
            .keys()
            .map(|name| (name.clone(), format!("/plot/{name}")))
            .collect()
    }

    /// Success response body: rounded indices followed by chart paths.
    ///
    /// ```
    /// use u_capability::analyze;
    ///
    /// let values = [10.0, 12.0, 9.0, 11.0, 13.0, 10.0, 12.0, 9.0, 11.0, 13.0];
    /// let body = analyze(&values, 5).unwrap().response_json();
    /// assert_eq!(body["Cp"], 0.447);
    /// assert_eq!(body["i_chart"], "/plot/i_chart");
    /// ```
    pub fn response_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("Cp".into(), Value::from(self.report.cp));
        body.insert("Cpk".into(), Value::from(self.report.cpk));
        body.insert("Pp".into(), Value::from(self.report.pp));
        body.insert("Ppk".into(), Value::from(self.report.ppk));
        for kind in ChartKind::ALL {
            if self.charts.contains_key(kind.name()) {
                body.insert(kind.name().into(), Value::from(format!("/plot/{}", kind.name())));
            }
        }
        Value::Object(body)
    }
}

/// Computes capability statistics and SPC charts for measurement series.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use u_capability::{AnalyzerConfig, CapabilityAnalyzer, MemoryStore};
///
/// let store = Arc::new(MemoryStore::new());
/// let analyzer = CapabilityAnalyzer::new(AnalyzerConfig::default()).with_store(store.clone());
///
/// let values = [10.0, 12.0, 9.0, 11.0, 13.0, 10.0, 12.0, 9.0, 11.0, 13.0];
/// let outcome = analyzer.analyze(&values).unwrap();
/// assert_eq!(outcome.report.cpk, 0.447);
/// assert_eq!(store.names().len(), 5);
/// assert!(analyzer.chart("histogram").unwrap().is_some());
/// ```
pub struct CapabilityAnalyzer {
    config: AnalyzerConfig,
    store: Arc<dyn ArtifactStore>,
}

impl CapabilityAnalyzer {
    /// Creates an analyzer writing to a fresh in-memory store.
    ///
    /// The config is validated on each run; use [`try_new`](Self::try_new)
    /// to reject a bad config up front.
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// Creates an analyzer after validating `config`.
    pub fn try_new(config: AnalyzerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Replaces the artifact store.
    pub fn with_store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.store = store;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// Analyzes `values` with the configured subgroup size.
    pub fn analyze(&self, values: &[f64]) -> Result<AnalysisOutcome, AnalysisError> {
        self.analyze_with_subgroup(values, self.config.subgroup_size)
    }

    /// Analyzes `values`, partitioning X̄/R subgroups of `subgroup_size`.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::Config`] if the analyzer config is out of range
    /// - [`AnalysisError::InvalidSubgroupSize`] if `subgroup_size` is 0
    /// - [`AnalysisError::EmptyOrDegenerateSeries`] if `values` has fewer
    ///   than two elements or zero spread
    /// - [`AnalysisError::Render`] / [`AnalysisError::Io`] if rendering or
    ///   storing a chart fails
    #[tracing::instrument(level = "debug", skip(self, values), fields(n = values.len()))]
    pub fn analyze_with_subgroup(
        &self,
        values: &[f64],
        subgroup_size: usize,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        self.config.validate()?;
        let k = NonZeroUsize::new(subgroup_size)
            .ok_or(AnalysisError::InvalidSubgroupSize(subgroup_size))?;

        let indices = CapabilityIndices::compute(values)?;
        tracing::debug!(
            mean = indices.summary.mean,
            std_dev = indices.summary.std_dev,
            "computed series summary"
        );
        let report = indices.report();

        let artifacts = chart::render_all(values, k, &self.config.render_options())?;

        let mut charts = BTreeMap::new();
        for artifact in artifacts {
            self.store.put(artifact.name(), artifact.png.clone())?;
            charts.insert(artifact.name().to_string(), artifact.png);
        }

        tracing::info!(
            n = values.len(),
            subgroup_size,
            cp = report.cp,
            cpk = report.cpk,
            "capability analysis complete"
        );
        Ok(AnalysisOutcome { report, charts })
    }

    /// Extracts the configured column from an upload and analyzes it.
    pub fn analyze_upload(&self, upload: Option<&Upload>) -> Result<AnalysisOutcome, AnalysisError> {
        let series = ingest::read_upload(upload, &self.config.column)?;
        self.analyze(series.values())
    }

    /// Latest stored chart under a logical name, `None` if not yet generated.
    ///
    /// Names other than the five chart kinds are `None` and never reach the
    /// store.
    pub fn chart(&self, name: &str) -> Result<Option<Vec<u8>>, AnalysisError> {
        match ChartKind::from_name(name) {
            Some(kind) => self.store.get(kind.name()),
            None => Ok(None),
        }
    }
}

impl Default for CapabilityAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

/// Analyzes `values` with default settings and an in-memory store.
///
/// # Examples
///
/// ```
/// use u_capability::{analyze, AnalysisError};
///
/// let outcome = analyze(&[10.0, 12.0, 9.0, 11.0, 13.0], 5).unwrap();
/// assert_eq!(outcome.charts.len(), 5);
///
/// let err = analyze(&[5.0, 5.0, 5.0, 5.0], 5).unwrap_err();
/// assert!(matches!(err, AnalysisError::EmptyOrDegenerateSeries { .. }));
/// ```
pub fn analyze(values: &[f64], subgroup_size: usize) -> Result<AnalysisOutcome, AnalysisError> {
    CapabilityAnalyzer::default().analyze_with_subgroup(values, subgroup_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DirStore;

    const WORKED: [f64; 10] = [10.0, 12.0, 9.0, 11.0, 13.0, 10.0, 12.0, 9.0, 11.0, 13.0];

    fn small_analyzer() -> CapabilityAnalyzer {
        CapabilityAnalyzer::new(AnalyzerConfig {
            width: 120,
            height: 80,
            ..AnalyzerConfig::default()
        })
    }

    #[test]
    fn worked_example_outcome() {
        let outcome = small_analyzer().analyze(&WORKED).unwrap();
        assert_eq!(outcome.report.cp, 0.447);
        assert_eq!(outcome.report.cpk, 0.447);
        assert_eq!(outcome.report.pp, 0.447);
        assert_eq!(outcome.report.ppk, 0.447);
        let names: Vec<_> = outcome.charts.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            ["histogram", "i_chart", "moving_range_chart", "r_chart", "xbar_chart"]
        );
    }

    #[test]
    fn response_json_shape() {
        let body = small_analyzer().analyze(&WORKED).unwrap().response_json();
        assert_eq!(
            body,
            serde_json::json!({
                "Cp": 0.447,
                "Cpk": 0.447,
                "Pp": 0.447,
                "Ppk": 0.447,
                "histogram": "/plot/histogram",
                "xbar_chart": "/plot/xbar_chart",
                "r_chart": "/plot/r_chart",
                "moving_range_chart": "/plot/moving_range_chart",
                "i_chart": "/plot/i_chart",
            })
        );
    }

    #[test]
    fn chart_paths() {
        let outcome = small_analyzer().analyze(&WORKED).unwrap();
        let paths = outcome.chart_paths();
        assert_eq!(paths["r_chart"], "/plot/r_chart");
        assert_eq!(paths.len(), 5);
    }

    #[test]
    fn charts_are_stored_and_overwritten() {
        let store = Arc::new(MemoryStore::new());
        let analyzer = small_analyzer().with_store(store.clone());
        assert_eq!(analyzer.chart("i_chart").unwrap(), None);

        let first = analyzer.analyze(&WORKED).unwrap();
        assert_eq!(store.names().len(), 5);
        assert_eq!(
            analyzer.chart("i_chart").unwrap().as_deref(),
            Some(first.charts["i_chart"].as_slice())
        );

        let second = analyzer
            .analyze(&[1.0, 4.0, 2.0, 8.0, 5.0, 7.0])
            .unwrap();
        assert_eq!(store.names().len(), 5);
        assert_eq!(
            analyzer.chart("i_chart").unwrap().as_deref(),
            Some(second.charts["i_chart"].as_slice())
        );
        assert_ne!(first.charts["i_chart"], second.charts["i_chart"]);
    }

    #[test]
    fn degenerate_series_fails_without_storing() {
        let store = Arc::new(MemoryStore::new());
        let analyzer = small_analyzer().with_store(store.clone());
        for values in [&[][..], &[5.0][..], &[5.0, 5.0, 5.0, 5.0][..]] {
            let err = analyzer.analyze(values).unwrap_err();
            assert!(
                matches!(err, AnalysisError::EmptyOrDegenerateSeries { .. }),
                "{err:?}"
            );
        }
        assert!(store.names().is_empty());
    }

    #[test]
    fn zero_subgroup_size_is_rejected() {
        let err = small_analyzer().analyze_with_subgroup(&WORKED, 0).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidSubgroupSize(0)));
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn upload_missing_column() {
        let upload = Upload::new("data.csv", "Value\n1\n2\n");
        let err = small_analyzer().analyze_upload(Some(&upload)).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingColumn { .. }));
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn upload_without_file() {
        let err = small_analyzer().analyze_upload(None).unwrap_err();
        assert!(matches!(err, AnalysisError::NoFileProvided));
    }

    #[test]
    fn upload_uses_configured_column() {
        let analyzer = CapabilityAnalyzer::new(AnalyzerConfig {
            column: "Diameter".into(),
            width: 100,
            height: 80,
            ..AnalyzerConfig::default()
        });
        let csv = "Diameter\n10\n12\n9\n11\n13\n10\n12\n9\n11\n13\n";
        let outcome = analyzer
            .analyze_upload(Some(&Upload::new("d.csv", csv)))
            .unwrap();
        assert_eq!(outcome.report.cp, 0.447);
    }

    #[test]
    fn try_new_rejects_invalid_config() {
        let config = AnalyzerConfig {
            histogram_bins: 0,
            ..AnalyzerConfig::default()
        };
        let err = CapabilityAnalyzer::try_new(config).err().unwrap();
        assert!(matches!(&err, ConfigError::Invalid { field, .. } if field == "histogram_bins"));
        assert!(CapabilityAnalyzer::try_new(AnalyzerConfig::default()).is_ok());
    }

    #[test]
    fn invalid_config_is_not_reported_as_bad_input() {
        let store = Arc::new(MemoryStore::new());
        let analyzer = CapabilityAnalyzer::new(AnalyzerConfig {
            histogram_bins: 0,
            ..AnalyzerConfig::default()
        })
        .with_store(store.clone());
        let err = analyzer.analyze(&WORKED).unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)), "{err:?}");
        assert_eq!(err.http_status(), 500);
        assert!(store.names().is_empty());
    }

    #[test]
    fn chart_lookup_is_limited_to_chart_names() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("uploads");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(dir.path().join("secret.png"), b"outside").unwrap();

        let analyzer = small_analyzer().with_store(Arc::new(DirStore::new(root.clone())));
        assert_eq!(analyzer.chart("../secret").unwrap(), None);
        assert_eq!(analyzer.chart("not_a_chart").unwrap(), None);

        analyzer.analyze(&WORKED).unwrap();
        assert!(analyzer.chart("xbar_chart").unwrap().is_some());
        assert_eq!(analyzer.chart("../secret").unwrap(), None);
    }
}
