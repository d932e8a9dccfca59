//! SPC chart artifacts.
//!
//! Five charts are produced for every analysis, each under a stable logical
//! name that callers use to retrieve it later:
//!
//! | Kind | Name | Plots |
//! |------|------|-------|
//! | [`ChartKind::Histogram`] | `histogram` | 20-bin histogram with KDE overlay |
//! | [`ChartKind::XBar`] | `xbar_chart` | subgroup means |
//! | [`ChartKind::Range`] | `r_chart` | subgroup ranges |
//! | [`ChartKind::MovingRange`] | `moving_range_chart` | \|x_i - x_{i-1}\| |
//! | [`ChartKind::Individuals`] | `i_chart` | raw measurements |
//!
//! Each chart is a pure function of the measurements and, for the subgroup
//! charts, the subgroup size.

mod render;

use std::fmt;
use std::num::NonZeroUsize;

use serde::Serialize;

use crate::distribution::BandwidthMethod;
use crate::error::AnalysisError;
use crate::spc::{IndividualMRChart, XBarRChart};

/// The five charts of a capability analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Histogram,
    XBar,
    Range,
    MovingRange,
    Individuals,
}

impl ChartKind {
    /// All kinds, in rendering order.
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Histogram,
        ChartKind::XBar,
        ChartKind::Range,
        ChartKind::MovingRange,
        ChartKind::Individuals,
    ];

    /// Stable logical name used as the artifact key.
    pub fn name(self) -> &'static str {
        match self {
            ChartKind::Histogram => "histogram",
            ChartKind::XBar => "xbar_chart",
            ChartKind::Range => "r_chart",
            ChartKind::MovingRange => "moving_range_chart",
            ChartKind::Individuals => "i_chart",
        }
    }

    /// Chart caption.
    pub fn title(self) -> &'static str {
        match self {
            ChartKind::Histogram => "Histogram with KDE",
            ChartKind::XBar => "X̄ Chart",
            ChartKind::Range => "R Chart",
            ChartKind::MovingRange => "Moving Range Chart",
            ChartKind::Individuals => "I-Chart",
        }
    }

    /// Resolves a logical name back to its kind.
    ///
    /// ```
    /// use u_capability::chart::ChartKind;
    ///
    /// assert_eq!(ChartKind::from_name("r_chart"), Some(ChartKind::Range));
    /// assert_eq!(ChartKind::from_name("pie_chart"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A rendered chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartArtifact {
    pub kind: ChartKind,
    /// PNG-encoded image.
    pub png: Vec<u8>,
}

impl ChartArtifact {
    /// Logical name of the chart.
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Raster size and histogram settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Number of histogram bins.
    pub histogram_bins: usize,
    /// Number of KDE evaluation points.
    pub kde_points: usize,
    /// KDE bandwidth rule.
    pub bandwidth: BandwidthMethod,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
            histogram_bins: 20,
            kde_points: 200,
            bandwidth: BandwidthMethod::ScottFactor,
        }
    }
}

/// Renders every chart for `values`.
///
/// The subgroup size only affects the X̄ and R charts.
///
/// # Errors
///
/// [`AnalysisError::EmptyOrDegenerateSeries`] if the histogram cannot be
/// binned, [`AnalysisError::Render`] if the backend fails.
pub fn render_all(
    values: &[f64],
    subgroup_size: NonZeroUsize,
    options: &RenderOptions,
) -> Result<Vec<ChartArtifact>, AnalysisError> {
    let xbar_r = XBarRChart::from_values(values, subgroup_size);
    let imr = IndividualMRChart::from_values(values);

    ChartKind::ALL
        .into_iter()
        .map(|kind| -> Result<ChartArtifact, AnalysisError> {
            let png = match kind {
                ChartKind::Histogram => render::histogram(kind.title(), values, options)?,
                ChartKind::XBar => render::line_chart(kind.title(), xbar_r.xbar(), options)?,
                ChartKind::Range => render::line_chart(kind.title(), xbar_r.r(), options)?,
                ChartKind::MovingRange => {
                    render::line_chart(kind.title(), imr.moving_range(), options)?
                }
                ChartKind::Individuals => {
                    render::line_chart(kind.title(), imr.individuals(), options)?
                }
            };
            tracing::debug!(chart = kind.name(), bytes = png.len(), "rendered chart");
            Ok(ChartArtifact { kind, png })
        })
        .collect()
}
