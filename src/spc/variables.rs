//! X̄-R and I-MR series for a measurement sequence.
//!
//! The X̄ and R charts summarize consecutive, non-overlapping subgroups of a
//! fixed size. Values left over after the last full subgroup are not
//! plotted. The individuals and moving-range charts plot every value and
//! every neighbor difference.
//!
//! Limit factors are tabulated for subgroup sizes 2 through 10 (ASTM E2587).
//! Other sizes still produce points, only without limits.
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed., ch. 6.
//! - ASTM E2587, Standard Practice for Use of Control Charts in SPC.

use std::num::NonZeroUsize;
use std::slice::ChunksExact;

use u_numflow::stats;

use super::chart::{ChartSeries, ControlLimits};

// ---------------------------------------------------------------------------
// Factors
// ---------------------------------------------------------------------------

/// Range-based limit factors for one subgroup size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShewhartFactors {
    /// X̄ half-width per unit R̄.
    pub a2: f64,
    /// R chart lower limit per unit R̄.
    pub d3: f64,
    /// R chart upper limit per unit R̄.
    pub d4: f64,
}

const fn f(a2: f64, d3: f64, d4: f64) -> ShewhartFactors {
    ShewhartFactors { a2, d3, d4 }
}

// k = 2..=10
const FACTORS: [ShewhartFactors; 9] = [
    f(1.880, 0.0, 3.267),
    f(1.023, 0.0, 2.575),
    f(0.729, 0.0, 2.282),
    f(0.577, 0.0, 2.114),
    f(0.483, 0.0, 2.004),
    f(0.419, 0.076, 1.924),
    f(0.373, 0.136, 1.864),
    f(0.337, 0.184, 1.816),
    f(0.308, 0.223, 1.777),
];

/// 3 / d2 for moving ranges of span 2.
const E2: f64 = 2.660;

impl ShewhartFactors {
    /// Factors for subgroups of `k`, `None` outside 2..=10.
    ///
    /// ```
    /// use std::num::NonZeroUsize;
    /// use u_capability::spc::ShewhartFactors;
    ///
    /// let five = ShewhartFactors::for_subgroup(NonZeroUsize::new(5).unwrap()).unwrap();
    /// assert_eq!(five.a2, 0.577);
    /// assert!(ShewhartFactors::for_subgroup(NonZeroUsize::new(11).unwrap()).is_none());
    /// ```
    pub fn for_subgroup(k: NonZeroUsize) -> Option<Self> {
        k.get().checked_sub(2).and_then(|i| FACTORS.get(i)).copied()
    }

    /// Limits for the X̄ chart around the grand mean.
    pub fn xbar_limits(&self, grand_mean: f64, r_bar: f64) -> ControlLimits {
        ControlLimits::around(grand_mean, self.a2 * r_bar)
    }

    /// Limits for the R chart.
    pub fn range_limits(&self, r_bar: f64) -> ControlLimits {
        ControlLimits {
            ucl: self.d4 * r_bar,
            cl: r_bar,
            lcl: self.d3 * r_bar,
        }
    }
}

// ---------------------------------------------------------------------------
// Series statistics
// ---------------------------------------------------------------------------

/// Full subgroups of `size` consecutive values.
pub fn subgroups(values: &[f64], size: NonZeroUsize) -> ChunksExact<'_, f64> {
    values.chunks_exact(size.get())
}

/// Mean of every full subgroup.
///
/// ```
/// use std::num::NonZeroUsize;
/// use u_capability::spc::subgroup_means;
///
/// let k = NonZeroUsize::new(2).unwrap();
/// assert_eq!(subgroup_means(&[1.0, 3.0, 5.0, 7.0, 100.0], k), vec![2.0, 6.0]);
/// ```
pub fn subgroup_means(values: &[f64], size: NonZeroUsize) -> Vec<f64> {
    subgroups(values, size)
        .map(|group| group.iter().sum::<f64>() / group.len() as f64)
        .collect()
}

/// Spread (max − min) of every full subgroup.
pub fn subgroup_ranges(values: &[f64], size: NonZeroUsize) -> Vec<f64> {
    subgroups(values, size)
        .map(|group| {
            let (lo, hi) = group
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                });
            hi - lo
        })
        .collect()
}

/// |xᵢ − xᵢ₋₁| for i = 1..n.
///
/// ```
/// use u_capability::spc::moving_ranges;
///
/// assert_eq!(moving_ranges(&[10.0, 12.0, 9.0]), vec![2.0, 3.0]);
/// assert!(moving_ranges(&[10.0]).is_empty());
/// ```
pub fn moving_ranges(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|pair| (pair[1] - pair[0]).abs()).collect()
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// Subgroup means (X̄) and subgroup ranges (R).
///
/// With X̿ the mean of the subgroup means and R̄ the mean range:
/// X̄ limits are X̿ ± A2·R̄, R limits are D3·R̄ and D4·R̄.
///
/// ```
/// use std::num::NonZeroUsize;
/// use u_capability::spc::XBarRChart;
///
/// let values = [10.0, 12.0, 9.0, 11.0, 13.0, 10.0, 12.0, 9.0, 11.0, 13.0, 42.0];
/// let chart = XBarRChart::from_values(&values, NonZeroUsize::new(5).unwrap());
///
/// assert_eq!(chart.xbar().values(), &[11.0, 11.0]);
/// assert_eq!(chart.r().values(), &[4.0, 4.0]);
/// ```
#[derive(Debug, Clone)]
pub struct XBarRChart {
    subgroup_size: NonZeroUsize,
    xbar: ChartSeries,
    r: ChartSeries,
}

impl XBarRChart {
    pub fn from_values(values: &[f64], subgroup_size: NonZeroUsize) -> Self {
        let means = subgroup_means(values, subgroup_size);
        let ranges = subgroup_ranges(values, subgroup_size);

        let limits = ShewhartFactors::for_subgroup(subgroup_size).and_then(|factors| {
            let grand_mean = stats::mean(&means)?;
            let r_bar = stats::mean(&ranges)?;
            Some((
                factors.xbar_limits(grand_mean, r_bar),
                factors.range_limits(r_bar),
            ))
        });

        Self {
            subgroup_size,
            xbar: ChartSeries::new(means).with_limits(limits.map(|(x, _)| x)),
            r: ChartSeries::new(ranges).with_limits(limits.map(|(_, r)| r)),
        }
    }

    pub fn subgroup_size(&self) -> NonZeroUsize {
        self.subgroup_size
    }

    pub fn xbar(&self) -> &ChartSeries {
        &self.xbar
    }

    pub fn r(&self) -> &ChartSeries {
        &self.r
    }
}

/// Individual values (I) and moving ranges (MR).
///
/// I limits are x̄ ± E2·MR̄; MR limits are 0 and D4·MR̄ with D4 for span 2.
/// Both need at least two values.
#[derive(Debug, Clone)]
pub struct IndividualMRChart {
    individuals: ChartSeries,
    moving_range: ChartSeries,
}

impl IndividualMRChart {
    pub fn from_values(values: &[f64]) -> Self {
        let mr = moving_ranges(values);

        let limits = stats::mean(values).zip(stats::mean(&mr)).map(|(x_bar, mr_bar)| {
            let span_two = FACTORS[0];
            (
                ControlLimits::around(x_bar, E2 * mr_bar),
                span_two.range_limits(mr_bar),
            )
        });

        Self {
            individuals: ChartSeries::new(values.to_vec()).with_limits(limits.map(|(i, _)| i)),
            moving_range: ChartSeries::new(mr).with_limits(limits.map(|(_, m)| m)),
        }
    }

    pub fn individuals(&self) -> &ChartSeries {
        &self.individuals
    }

    pub fn moving_range(&self) -> &ChartSeries {
        &self.moving_range
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn subgroup_count_is_floor(
            data in proptest::collection::vec(-1e3_f64..1e3, 0..=80),
            size in 1_usize..=12,
        ) {
            let size = NonZeroUsize::new(size).unwrap();
            let expected = data.len() / size.get();
            prop_assert_eq!(subgroup_means(&data, size).len(), expected);
            prop_assert_eq!(subgroup_ranges(&data, size).len(), expected);
        }

        #[test]
        fn moving_range_count_is_n_minus_one(
            data in proptest::collection::vec(-1e3_f64..1e3, 1..=80)
        ) {
            let mr = moving_ranges(&data);
            prop_assert_eq!(mr.len(), data.len() - 1);
            prop_assert!(mr.iter().all(|&v| v >= 0.0));
        }

        #[test]
        fn limits_are_ordered(
            data in proptest::collection::vec(-1e3_f64..1e3, 10..=80),
            size in 2_usize..=10,
        ) {
            let chart = XBarRChart::from_values(&data, NonZeroUsize::new(size).unwrap());
            for l in [chart.xbar().limits(), chart.r().limits()].into_iter().flatten() {
                prop_assert!(l.lcl <= l.cl && l.cl <= l.ucl);
            }
        }
    }
}
