//! Error types for capability analysis.
//!
//! Every failure an analysis run can hit is a variant of [`AnalysisError`].
//! Input problems map to an HTTP-equivalent 400, backend failures to 500.

use thiserror::Error;

/// Errors returned by ingestion, analysis, rendering, and artifact storage.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No upload was supplied, or it had no filename.
    #[error("no file uploaded")]
    NoFileProvided,

    /// The input could not be parsed as a table.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The table has no column with the requested name.
    #[error("column '{column}' not found in file")]
    MissingColumn {
        /// Name of the column that was looked up.
        column: String,
    },

    /// Fewer than two measurements, or all measurements are equal.
    ///
    /// Every capability index divides by the sample standard deviation, so
    /// these series have no defined result.
    #[error("measurement series is empty or has zero variance ({len} values)")]
    EmptyOrDegenerateSeries {
        /// Number of measurements in the series.
        len: usize,
        /// Sample standard deviation, `None` when undefined (n < 2).
        std_dev: Option<f64>,
    },

    /// Subgroup size must be at least 1.
    #[error("subgroup size must be at least 1, got {0}")]
    InvalidSubgroupSize(usize),

    /// The plotting or PNG encoding backend failed.
    #[error("chart rendering failed: {0}")]
    Render(String),

    /// The analyzer was built with an out-of-range configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Reading input or writing an artifact failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// HTTP-equivalent status code for this failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_capability::AnalysisError;
    ///
    /// let err = AnalysisError::MissingColumn { column: "Measurement".into() };
    /// assert_eq!(err.http_status(), 400);
    /// assert_eq!(AnalysisError::Render("backend".into()).http_status(), 500);
    /// ```
    pub fn http_status(&self) -> u16 {
        match self {
            AnalysisError::NoFileProvided
            | AnalysisError::MalformedInput(_)
            | AnalysisError::MissingColumn { .. }
            | AnalysisError::EmptyOrDegenerateSeries { .. }
            | AnalysisError::InvalidSubgroupSize(_) => 400,
            AnalysisError::Config(_) | AnalysisError::Render(_) | AnalysisError::Io(_) => 500,
        }
    }

    /// Failure response body: `{"error": "<message>"}`.
    pub fn to_response_json(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }
}

/// Errors raised while loading an [`AnalyzerConfig`](crate::config::AnalyzerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config {path}: {message}")]
    Parse { path: String, message: String },

    /// A value is out of range.
    #[error("invalid config value for {field}: {message}")]
    Invalid { field: String, message: String },
}
