//! Interface to the raster engine
//!
//! Rasterization, masking, reclassification and table persistence belong to
//! an external engine. The change products only talk to it through
//! [`RasterEngine`], treating every call as synchronous, possibly slow and
//! failable. Implementations report their own failures as
//! [`Error::Engine`](crate::Error::Engine).

use std::collections::BTreeMap;

use crate::category::{Category, TimeSlice};
use crate::code::{CodeEncoder, CombinedCode};
use crate::error::Result;
use crate::table::{AttributeRow, AttributeTable, FieldValue, FrequencyTable, StatRow, COUNT_FIELD};

/// Old raster value → new raster value
pub type ReclassMap = BTreeMap<CombinedCode, i64>;

/// Operations the change products need from a raster/table engine
pub trait RasterEngine {
    /// Identifies a raster or table dataset
    type Handle: Clone + PartialEq + std::fmt::Debug;

    /// Whether a dataset exists. Used to re-verify outputs, since a failed
    /// call may leave a partially written dataset behind.
    fn exists(&self, handle: &Self::Handle) -> bool;

    /// Delete a dataset, if it exists
    fn remove(&mut self, handle: &Self::Handle) -> Result<()>;

    /// Value/name attribute table of a classification raster, tagged with `slice`
    fn categories(&self, raster: &Self::Handle, slice: TimeSlice) -> Result<Vec<Category>>;

    /// Per-value pixel counts
    fn frequency_table(&self, raster: &Self::Handle) -> Result<FrequencyTable>;

    /// Ground area of one cell, in square meters
    fn cell_area(&self, raster: &Self::Handle) -> Result<f64>;

    /// Write a raster whose cells are `encoder.encode(start, end)`, and build
    /// its attribute table
    fn combine(
        &mut self,
        start: &Self::Handle,
        end: &Self::Handle,
        encoder: &CodeEncoder,
        output: &Self::Handle,
    ) -> Result<()>;

    /// Write a raster whose cells are `mapping[value]`, and rebuild its
    /// attribute table
    fn apply_reclass(
        &mut self,
        raster: &Self::Handle,
        mapping: &ReclassMap,
        output: &Self::Handle,
    ) -> Result<()>;

    /// Current attribute table of a raster or table dataset
    fn attribute_table(&self, handle: &Self::Handle) -> Result<AttributeTable>;

    /// Replace the attribute table of a raster, or create a standalone table
    fn write_table(&mut self, table: &AttributeTable, output: &Self::Handle) -> Result<()>;

    /// Copy `fields` from `source` onto `table` by key
    fn join_fields(
        &mut self,
        table: &Self::Handle,
        key_field: &str,
        source: &AttributeTable,
        source_key_field: &str,
        fields: &[&str],
    ) -> Result<()>;

    /// Persist statistics rows as a standalone table
    fn write_stats(&mut self, rows: &[StatRow], output: &Self::Handle) -> Result<()> {
        self.write_table(&stats_to_table(rows), output)
    }
}

/// Render statistics rows with the summary table's column names
pub fn stats_to_table(rows: &[StatRow]) -> AttributeTable {
    let mut table = AttributeTable::new();
    for r in rows {
        let mut row = AttributeRow::new(r.value);
        row.fields.insert("label".into(), FieldValue::Text(r.label.clone()));
        row.fields.insert(COUNT_FIELD.into(), FieldValue::Int(r.pixel_count as i64));
        row.fields.insert("area_ha".into(), FieldValue::Float(r.area_ha));
        row.fields.insert("perc_total".into(), FieldValue::Float(r.percent_of_total));
        if let Some(p) = r.percent_of_subset {
            row.fields.insert("perc_of_subset".into(), FieldValue::Float(p));
        }
        table.push(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_to_table_columns() {
        let rows = vec![
            StatRow {
                value: 1,
                label: "Natural in both time periods".into(),
                pixel_count: 10,
                area_ha: 0.9,
                percent_of_total: 10.0,
                percent_of_subset: Some(25.0),
            },
            StatRow {
                value: 0,
                label: "not Natural in either time period".into(),
                pixel_count: 90,
                area_ha: 8.1,
                percent_of_total: 90.0,
                percent_of_subset: None,
            },
        ];
        let t = stats_to_table(&rows);
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(1, "perc_of_subset"), Some(&FieldValue::Float(25.0)));
        assert!(t.get(0, "perc_of_subset").is_none());
        assert_eq!(t.get(0, COUNT_FIELD), Some(&FieldValue::Int(90)));
    }
}
