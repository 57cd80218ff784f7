//! Land-cover amounts over a time series
//!
//! Tabulates, for each cover value, the percent, hectares and acres in every
//! year, and the change between the earliest and the latest year. All tables
//! are expected to cover the same extent, so the percent denominator is the
//! pixel count of the first table given.

use std::collections::{BTreeMap, BTreeSet};

use covershift_core::{CoverSchema, Error, FrequencyTable, Result};
use serde::{Deserialize, Serialize};

use super::stats::{area_hectares, percent, StatsParams};

/// Square meters in an international acre
pub const M2_PER_ACRE: f64 = 4_046.856_422_4;

/// Cover amount of one value in one year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearCover {
    pub pixel_count: u64,
    pub percent: f64,
    pub area_ha: f64,
    pub area_ac: f64,
}

/// One cover value across all years
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverSummaryRow {
    pub value: i64,
    pub name: Option<String>,
    pub years: BTreeMap<i32, YearCover>,
    /// Hectares in the latest year minus hectares in the earliest year
    pub change_ha: f64,
    pub change_ac: f64,
    /// Change relative to the earliest year, `None` when the value was absent
    /// then
    pub change_perc: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverSummary {
    pub start_year: i32,
    pub end_year: i32,
    pub rows: Vec<CoverSummaryRow>,
}

/// Summarize cover amounts for `(year, frequency table)` pairs.
///
/// Values missing from a year count as zero pixels in that year. Names come
/// from `schema` when one is given.
pub fn cover_summary(
    tables: &[(i32, FrequencyTable)],
    params: StatsParams,
    schema: Option<CoverSchema>,
) -> Result<CoverSummary> {
    params.validate()?;
    let Some((_, first)) = tables.first() else {
        return Err(Error::InvalidParameter {
            name: "tables",
            value: "[]".into(),
            reason: "at least one year is required".into(),
        });
    };

    let mut years = BTreeSet::new();
    for (year, _) in tables {
        if !years.insert(*year) {
            return Err(Error::InvalidParameter {
                name: "year",
                value: year.to_string(),
                reason: "listed more than once".into(),
            });
        }
    }
    // Non-empty: checked above.
    let (Some(&start_year), Some(&end_year)) = (years.first(), years.last()) else {
        return Err(Error::Other("no years".into()));
    };

    let denominator = first.total();
    let values: BTreeSet<i64> = tables.iter().flat_map(|(_, t)| t.codes()).collect();

    let mut rows = Vec::with_capacity(values.len());
    for value in values {
        let mut per_year = BTreeMap::new();
        for (year, table) in tables {
            let count = table.get(value).unwrap_or(0);
            let ha = area_hectares(count, params.cell_area_m2);
            per_year.insert(
                *year,
                YearCover {
                    pixel_count: count,
                    percent: percent(count, denominator, "percent cover")?,
                    area_ha: ha,
                    area_ac: count as f64 * params.cell_area_m2 / M2_PER_ACRE,
                },
            );
        }

        let start = per_year[&start_year];
        let end = per_year[&end_year];
        let change_perc = if start.pixel_count == 0 {
            None
        } else {
            Some(100.0 * (end.area_ha - start.area_ha) / start.area_ha)
        };

        rows.push(CoverSummaryRow {
            value,
            name: schema.and_then(|s| s.name(value)).map(str::to_string),
            years: per_year,
            change_ha: end.area_ha - start.area_ha,
            change_ac: end.area_ac - start.area_ac,
            change_perc,
        });
    }

    Ok(CoverSummary {
        start_year,
        end_year,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table(pairs: &[(i64, u64)]) -> FrequencyTable {
        FrequencyTable::from_pairs(pairs).unwrap()
    }

    #[test]
    fn test_two_year_summary() {
        let tables = vec![
            (2001, table(&[(2, 100), (4, 900)])),
            (2021, table(&[(2, 250), (4, 750)])),
        ];
        let s = cover_summary(&tables, StatsParams::default(), Some(CoverSchema::General)).unwrap();

        assert_eq!((s.start_year, s.end_year), (2001, 2021));
        let dev = s.rows.iter().find(|r| r.value == 2).unwrap();
        assert_eq!(dev.name.as_deref(), Some("Developed"));
        assert_relative_eq!(dev.years[&2001].area_ha, 9.0, epsilon = 1e-9);
        assert_relative_eq!(dev.years[&2021].percent, 25.0, epsilon = 1e-9);
        assert_relative_eq!(dev.change_ha, 13.5, epsilon = 1e-9);
        assert_relative_eq!(dev.change_perc.unwrap(), 150.0, epsilon = 1e-9);
        // 100 NLCD pixels are 22.239... acres
        assert_relative_eq!(dev.years[&2001].area_ac, 22.239484, epsilon = 1e-5);
    }

    #[test]
    fn test_years_sorted_regardless_of_input_order() {
        let tables = vec![
            (2011, table(&[(4, 10)])),
            (2001, table(&[(4, 20)])),
        ];
        let s = cover_summary(&tables, StatsParams::default(), None).unwrap();
        assert_eq!((s.start_year, s.end_year), (2001, 2011));
        // Denominator is the first table given (2011)
        assert_relative_eq!(s.rows[0].years[&2001].percent, 200.0, epsilon = 1e-9);
        assert_relative_eq!(s.rows[0].change_perc.unwrap(), -50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_value_absent_in_start_year() {
        let tables = vec![
            (2001, table(&[(4, 10)])),
            (2021, table(&[(4, 8), (6, 2)])),
        ];
        let s = cover_summary(&tables, StatsParams::default(), None).unwrap();
        let harvested = s.rows.iter().find(|r| r.value == 6).unwrap();
        assert_eq!(harvested.years[&2001].pixel_count, 0);
        assert!(harvested.change_perc.is_none());
        assert!(harvested.change_ha > 0.0);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(cover_summary(&[], StatsParams::default(), None).is_err());

        let dup = vec![(2001, table(&[(4, 1)])), (2001, table(&[(4, 1)]))];
        assert!(matches!(
            cover_summary(&dup, StatsParams::default(), None),
            Err(Error::InvalidParameter { name: "year", .. })
        ));

        let empty = vec![(2001, table(&[(4, 0)]))];
        assert!(matches!(
            cover_summary(&empty, StatsParams::default(), None),
            Err(Error::ZeroDenominator { .. })
        ));
    }
}
