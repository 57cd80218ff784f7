//! Area and percentage statistics from frequency tables
//!
//! `area_ha = pixel_count * cell_area_m2 / 10000`
//! `percent = pixel_count / denominator * 100`
//!
//! The percent-of-total denominator is the pixel count of the whole table;
//! the percent-of-subset denominator only counts rows selected by a caller
//! supplied predicate. A zero denominator is an error, never NaN or zero.

use covershift_core::{Error, FrequencyTable, Result, StatRow};
use serde::{Deserialize, Serialize};

use super::labels::Labels;

/// Square meters in a hectare
pub const M2_PER_HECTARE: f64 = 10_000.0;

/// Cell area of 30 m NLCD pixels
pub const NLCD_CELL_AREA_M2: f64 = 900.0;

/// Parameters for statistics aggregation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsParams {
    /// Ground area of one pixel in square meters
    pub cell_area_m2: f64,
}

impl Default for StatsParams {
    fn default() -> Self {
        Self {
            cell_area_m2: NLCD_CELL_AREA_M2,
        }
    }
}

impl StatsParams {
    pub fn validate(&self) -> Result<()> {
        if !self.cell_area_m2.is_finite() || self.cell_area_m2 <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "cell_area_m2",
                value: self.cell_area_m2.to_string(),
                reason: "must be a positive, finite area".into(),
            });
        }
        Ok(())
    }
}

/// Hectares covered by `pixel_count` cells
pub fn area_hectares(pixel_count: u64, cell_area_m2: f64) -> f64 {
    pixel_count as f64 * cell_area_m2 / M2_PER_HECTARE
}

/// Percentage of `count` in `denominator`; `what` names the quantity in errors
pub fn percent(count: u64, denominator: u64, what: &str) -> Result<f64> {
    if denominator == 0 {
        return Err(Error::ZeroDenominator { what: what.to_string() });
    }
    Ok(count as f64 / denominator as f64 * 100.0)
}

/// Unlabeled statistics for every row of `freq`.
///
/// `subset` selects the rows that form the percent-of-subset denominator
/// (for the six-class summary, outcome classes 1–3: the start-set area in
/// time 1). Rows outside the subset get `None`.
///
/// # Example
/// ```ignore
/// let freq = FrequencyTable::from_pairs(&[(1, 10), (2, 30), (3, 60)])?;
/// let rows = compute_stats(&freq, StatsParams::default(), None)?;
/// assert_eq!(rows[1].percent_of_total, 30.0);
/// ```
pub fn compute_stats(
    freq: &FrequencyTable,
    params: StatsParams,
    subset: Option<&dyn Fn(i64) -> bool>,
) -> Result<Vec<StatRow>> {
    aggregate(freq, params, subset, |_| Ok(String::new()))
}

/// Statistics with each row labeled from `labels`.
///
/// A value with no label is a lookup error: the table that should cover the
/// raster does not.
pub fn compute_labeled_stats(
    freq: &FrequencyTable,
    params: StatsParams,
    subset: Option<&dyn Fn(i64) -> bool>,
    labels: &dyn Labels,
) -> Result<Vec<StatRow>> {
    aggregate(freq, params, subset, |v| labels.require(v).map(str::to_string))
}

fn aggregate(
    freq: &FrequencyTable,
    params: StatsParams,
    subset: Option<&dyn Fn(i64) -> bool>,
    label: impl Fn(i64) -> Result<String>,
) -> Result<Vec<StatRow>> {
    params.validate()?;

    let total = freq.total();
    let subset_total = subset.map(|keep| {
        freq.iter()
            .filter(|r| keep(r.code))
            .map(|r| r.pixel_count)
            .sum::<u64>()
    });

    freq.iter()
        .map(|r| {
            let percent_of_subset = match (subset, subset_total) {
                (Some(keep), Some(denominator)) if keep(r.code) => {
                    Some(percent(r.pixel_count, denominator, "percent of subset")?)
                }
                (Some(_), Some(0)) => {
                    return Err(Error::ZeroDenominator {
                        what: "percent of subset".into(),
                    })
                }
                _ => None,
            };
            Ok(StatRow {
                value: r.code,
                label: label(r.code)?,
                pixel_count: r.pixel_count,
                area_ha: area_hectares(r.pixel_count, params.cell_area_m2),
                percent_of_total: percent(r.pixel_count, total, "percent of total")?,
                percent_of_subset,
            })
        })
        .collect()
}
