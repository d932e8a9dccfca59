//! Histogram and density estimates for the histogram chart.
//!
//! [`Histogram::equal_width`] counts a series into a fixed number of bins
//! spanning its observed range. [`Kde`] fits a Gaussian kernel density to the
//! same series so it can be overlaid on the bars, scaled to counts.
//!
//! # Examples
//!
//! ```
//! use u_capability::distribution::{BandwidthMethod, Histogram, Kde};
//!
//! let data = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let hist = Histogram::equal_width(&data, 4).unwrap();
//! assert_eq!(hist.total(), 5);
//!
//! let kde = Kde::fit(&data, BandwidthMethod::ScottFactor).unwrap();
//! let curve = kde.curve(64, 0.0).scaled(hist.count_scale());
//! assert_eq!(curve.x[0], 1.0);
//! ```
//!
//! # References
//!
//! - Scott, D.W. (1992). *Multivariate Density Estimation*. Wiley.
//! - Silverman, B.W. (1986). *Density Estimation for Statistics and Data Analysis*.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use u_numflow::stats;

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// Equal-width frequency histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    edges: Vec<f64>,
    counts: Vec<usize>,
}

impl Histogram {
    /// Counts `data` into `n_bins` equal-width bins over `[min, max]`.
    ///
    /// Each bin holds `[lo, hi)`; the last bin is closed so the maximum is
    /// counted. Returns `None` for empty input, non-finite values, a
    /// zero-width range, or `n_bins == 0`.
    ///
    /// ```
    /// use u_capability::distribution::Histogram;
    ///
    /// let data = [1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0];
    /// let hist = Histogram::equal_width(&data, 20).unwrap();
    /// assert_eq!(hist.edges().len(), 21);
    /// assert_eq!(hist.counts()[19], 1);
    /// ```
    pub fn equal_width(data: &[f64], n_bins: usize) -> Option<Self> {
        if n_bins == 0 || data.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let (lo, hi) = extent(data)?;
        let width = (hi - lo) / n_bins as f64;
        if width <= 0.0 {
            return None;
        }

        let mut counts = vec![0_usize; n_bins];
        for &x in data {
            let idx = ((x - lo) / width) as usize;
            counts[idx.min(n_bins - 1)] += 1;
        }
        let edges = (0..=n_bins).map(|i| lo + width * i as f64).collect();
        Some(Self { edges, counts })
    }

    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    /// Bin boundaries, `n_bins + 1` entries.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn bin_width(&self) -> f64 {
        self.edges[1] - self.edges[0]
    }

    /// Number of observations counted.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// `(lo, hi)` of the covered range.
    pub fn range(&self) -> (f64, f64) {
        (self.edges[0], self.edges[self.edges.len() - 1])
    }

    /// Factor mapping a probability density onto this histogram's count
    /// axis: `n * bin_width`.
    pub fn count_scale(&self) -> f64 {
        self.total() as f64 * self.bin_width()
    }

    /// `(lo, hi, count)` per bin.
    pub fn bars(&self) -> impl Iterator<Item = (f64, f64, usize)> + Clone + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(e, &c)| (e[0], e[1], c))
    }
}

fn extent(data: &[f64]) -> Option<(f64, f64)> {
    let lo = data.iter().copied().reduce(f64::min)?;
    let hi = data.iter().copied().reduce(f64::max)?;
    Some((lo, hi))
}

// ---------------------------------------------------------------------------
// Kernel density
// ---------------------------------------------------------------------------

/// Rule for choosing the kernel bandwidth `h`.
///
/// Deserializes from `"scott_factor"`, `"scott"`, `"silverman"` or
/// `{ manual = <h> }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BandwidthMethod {
    /// h = σ·n^(-1/5), the `gaussian_kde` default.
    #[default]
    ScottFactor,
    /// h = 1.06·σ·n^(-1/5).
    Scott,
    /// h = 0.9·min(σ, IQR/1.34)·n^(-1/5).
    Silverman,
    /// Fixed bandwidth.
    Manual(f64),
}

impl BandwidthMethod {
    /// Bandwidth for `data`, `None` if it is undefined (n < 2, non-finite
    /// values, zero spread, or a non-positive manual value).
    pub fn bandwidth(self, data: &[f64]) -> Option<f64> {
        if data.len() < 2 || data.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let sample_sd = || stats::std_dev(data).filter(|&sd| sd > 0.0);
        let shrink = (data.len() as f64).powf(-0.2);
        let h = match self {
            BandwidthMethod::Manual(h) => return (h.is_finite() && h > 0.0).then_some(h),
            BandwidthMethod::ScottFactor => sample_sd()? * shrink,
            BandwidthMethod::Scott => 1.06 * sample_sd()? * shrink,
            BandwidthMethod::Silverman => {
                let sd = sample_sd()?;
                let iqr = stats::quantile(data, 0.75)? - stats::quantile(data, 0.25)?;
                let spread = if iqr > 0.0 { sd.min(iqr / 1.34) } else { sd };
                0.9 * spread * shrink
            }
        };
        Some(h)
    }
}

/// A Gaussian kernel density fitted to a sample.
///
/// f̂(x) = 1/(n·h) · Σ φ((x − xᵢ)/h), with φ the standard normal pdf.
#[derive(Debug, Clone)]
pub struct Kde<'a> {
    data: &'a [f64],
    bandwidth: f64,
}

impl<'a> Kde<'a> {
    /// Fits a density to `data`; `None` when the bandwidth is undefined.
    pub fn fit(data: &'a [f64], method: BandwidthMethod) -> Option<Self> {
        let bandwidth = method.bandwidth(data)?;
        Some(Self { data, bandwidth })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Density at `x`.
    pub fn density_at(&self, x: f64) -> f64 {
        let norm = 1.0 / ((2.0 * PI).sqrt() * self.bandwidth * self.data.len() as f64);
        let sum: f64 = self
            .data
            .iter()
            .map(|&xi| {
                let u = (x - xi) / self.bandwidth;
                (-0.5 * u * u).exp()
            })
            .sum();
        sum * norm
    }

    /// Evaluates the density on `n_points` evenly spaced points spanning
    /// `[min − cut·h, max + cut·h]`.
    ///
    /// `cut = 0` keeps the curve inside the data range, as the histogram
    /// overlay does. `n_points` is clamped to at least 2 and a negative or
    /// non-finite `cut` is treated as 0.
    ///
    /// ```
    /// use u_capability::distribution::{BandwidthMethod, Kde};
    ///
    /// let data = [1.0, 1.1, 1.2, 2.0, 2.1, 2.2, 5.0];
    /// let curve = Kde::fit(&data, BandwidthMethod::Silverman).unwrap().curve(512, 3.0);
    /// let dx = curve.x[1] - curve.x[0];
    /// let area: f64 = curve.y.iter().sum::<f64>() * dx;
    /// assert!((area - 1.0).abs() < 0.05);
    /// ```
    pub fn curve(&self, n_points: usize, cut: f64) -> DensityCurve {
        let n_points = n_points.max(2);
        let cut = if cut.is_finite() { cut.max(0.0) } else { 0.0 };
        let (lo, hi) = extent(self.data).unwrap_or((0.0, 0.0));
        let start = lo - cut * self.bandwidth;
        let step = (hi + cut * self.bandwidth - start) / (n_points - 1) as f64;

        let x: Vec<f64> = (0..n_points).map(|i| start + step * i as f64).collect();
        let y = x.iter().map(|&xi| self.density_at(xi)).collect();
        DensityCurve { x, y }
    }
}

/// Sampled density curve.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityCurve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl DensityCurve {
    /// Multiplies every ordinate by `factor`.
    pub fn scaled(mut self, factor: f64) -> Self {
        self.y.iter_mut().for_each(|y| *y *= factor);
        self
    }

    pub fn max_y(&self) -> f64 {
        self.y.iter().copied().fold(0.0, f64::max)
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKED: [f64; 10] = [10.0, 12.0, 9.0, 11.0, 13.0, 10.0, 12.0, 9.0, 11.0, 13.0];

    #[test]
    fn equal_width_over_ramp() {
        let data: Vec<f64> = (0..100).map(f64::from).collect();
        let hist = Histogram::equal_width(&data, 20).unwrap();
        assert_eq!(hist.n_bins(), 20);
        assert!((hist.bin_width() - 4.95).abs() < 1e-12);
        assert_eq!(hist.total(), 100);
        assert_eq!(hist.range().0, 0.0);
        assert!((hist.range().1 - 99.0).abs() < 1e-9);
    }

    #[test]
    fn worked_example_bins() {
        // range 4, width 0.2: 9 -> 0, 10 -> 5, 11 -> 10, 12 -> 15, 13 -> 19
        let hist = Histogram::equal_width(&WORKED, 20).unwrap();
        let occupied: Vec<(usize, usize)> = hist
            .counts()
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, c)| c > 0)
            .collect();
        assert_eq!(occupied, [(0, 2), (5, 2), (10, 2), (15, 2), (19, 2)]);
        assert_eq!(hist.max_count(), 2);
        assert!((hist.count_scale() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn bars_match_counts() {
        let hist = Histogram::equal_width(&[0.0, 1.0, 1.0, 4.0], 4).unwrap();
        let bars: Vec<_> = hist.bars().collect();
        assert_eq!(
            bars,
            [(0.0, 1.0, 1), (1.0, 2.0, 2), (2.0, 3.0, 0), (3.0, 4.0, 1)]
        );
    }

    #[test]
    fn histogram_rejects_degenerate() {
        assert!(Histogram::equal_width(&[], 20).is_none());
        assert!(Histogram::equal_width(&[5.0, 5.0, 5.0], 20).is_none());
        assert!(Histogram::equal_width(&[1.0, 2.0], 0).is_none());
        assert!(Histogram::equal_width(&[1.0, f64::NAN], 20).is_none());
    }

    #[test]
    fn bandwidth_rules() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let expected = 2.5_f64.sqrt() * 5.0_f64.powf(-0.2);
        let h = BandwidthMethod::ScottFactor.bandwidth(&data).unwrap();
        assert!((h - expected).abs() < 1e-12);
        let scott = BandwidthMethod::Scott.bandwidth(&data).unwrap();
        assert!((scott - 1.06 * h).abs() < 1e-12);
        assert!(BandwidthMethod::Silverman.bandwidth(&data).unwrap() < scott);
    }

    #[test]
    fn manual_bandwidth() {
        assert_eq!(BandwidthMethod::Manual(0.5).bandwidth(&[1.0, 2.0]), Some(0.5));
        assert_eq!(BandwidthMethod::Manual(0.0).bandwidth(&[1.0, 2.0]), None);
        assert_eq!(BandwidthMethod::Manual(f64::NAN).bandwidth(&[1.0, 2.0]), None);
        assert_eq!(BandwidthMethod::Manual(0.5).bandwidth(&[1.0]), None);
    }

    #[test]
    fn zero_cut_stays_in_range() {
        let data = [1.0, 2.0, 4.0, 8.0];
        let curve = Kde::fit(&data, BandwidthMethod::ScottFactor)
            .unwrap()
            .curve(50, 0.0);
        assert_eq!(curve.x.len(), 50);
        assert_eq!(curve.x[0], 1.0);
        assert!((curve.x[49] - 8.0).abs() < 1e-9);
    }

    #[test]
    fn symmetric_sample_peaks_at_center() {
        let data = [-2.0, -1.0, 0.0, 1.0, 2.0];
        let kde = Kde::fit(&data, BandwidthMethod::Silverman).unwrap();
        assert!(kde.density_at(0.0) > kde.density_at(1.0));
        assert!((kde.density_at(1.5) - kde.density_at(-1.5)).abs() < 1e-12);
    }

    #[test]
    fn scaled_curve_on_count_axis() {
        let hist = Histogram::equal_width(&WORKED, 20).unwrap();
        let kde = Kde::fit(&WORKED, BandwidthMethod::ScottFactor).unwrap();
        let density = kde.curve(100, 0.0);
        let counts = density.clone().scaled(hist.count_scale());
        assert!((counts.max_y() - density.max_y() * 2.0).abs() < 1e-12);
        assert_eq!(counts.points().count(), 100);
    }

    #[test]
    fn kde_rejects_degenerate() {
        assert!(Kde::fit(&[1.0], BandwidthMethod::ScottFactor).is_none());
        assert!(Kde::fit(&[3.0, 3.0, 3.0], BandwidthMethod::ScottFactor).is_none());
        assert!(Kde::fit(&[1.0, f64::INFINITY], BandwidthMethod::ScottFactor).is_none());
    }

    #[test]
    fn curve_clamps_arguments() {
        let kde = Kde::fit(&[1.0, 2.0], BandwidthMethod::ScottFactor).unwrap();
        let curve = kde.curve(1, -3.0);
        assert_eq!(curve.x, [1.0, 2.0]);
    }

    #[test]
    fn bandwidth_method_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            method: BandwidthMethod,
        }
        let w: Wrapper = toml::from_str(r#"method = "silverman""#).unwrap();
        assert_eq!(w.method, BandwidthMethod::Silverman);
        let w: Wrapper = toml::from_str("method = { manual = 0.25 }").unwrap();
        assert_eq!(w.method, BandwidthMethod::Manual(0.25));
    }
}
