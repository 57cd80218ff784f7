//! In-memory raster engine
//!
//! Named datasets of `Raster<i32>` plus attribute tables. Category rasters
//! carry their names in a `CoverClass` column, the way land-cover rasters are
//! delivered; derived rasters get a plain `Value`/`Count` table.

use std::collections::HashMap;

use covershift_core::table::COUNT_FIELD;
use covershift_core::{
    AttributeRow, AttributeTable, Category, CategoryEntry, CodeEncoder, Error, FieldValue,
    FrequencyRow, FrequencyTable, Raster, RasterElement, RasterEngine, ReclassMap, Result,
    TimeSlice,
};
use ndarray::Array2;
use tracing::debug;

use crate::maybe_rayon::*;

/// Column holding the category name of a classification raster
pub const COVER_CLASS_FIELD: &str = "CoverClass";

#[derive(Debug, Clone)]
struct Dataset {
    raster: Option<Raster<i32>>,
    table: AttributeTable,
}

/// Reference [`RasterEngine`] over in-memory rasters and tables
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    datasets: HashMap<String, Dataset>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a classification raster with its value/name legend.
    ///
    /// Pixel counts come from the raster; legend entries that never occur get
    /// a count of zero so the legend stays complete.
    pub fn add_classification(
        &mut self,
        name: impl Into<String>,
        raster: Raster<i32>,
        legend: &[CategoryEntry],
    ) -> Result<()> {
        let counts = raster.value_counts();
        if let Some(&v) = counts.keys().find(|v| !legend.iter().any(|e| e.value == **v)) {
            return Err(Error::Engine(format!(
                "raster value {} is missing from the legend",
                v
            )));
        }

        let mut table = AttributeTable::new();
        for e in legend {
            let mut row = AttributeRow::new(e.value);
            row.fields.insert(
                COUNT_FIELD.into(),
                FieldValue::Int(counts.get(&e.value).copied().unwrap_or(0) as i64),
            );
            row.fields
                .insert(COVER_CLASS_FIELD.into(), FieldValue::Text(e.name.clone()));
            table.push(row);
        }

        self.datasets.insert(
            name.into(),
            Dataset {
                raster: Some(raster),
                table,
            },
        );
        Ok(())
    }

    /// Register a raster with a freshly built `Value`/`Count` table
    pub fn add_raster(&mut self, name: impl Into<String>, raster: Raster<i32>) -> Result<()> {
        let table = AttributeTable::from_frequencies(&counts_table(&raster)?);
        self.datasets.insert(
            name.into(),
            Dataset {
                raster: Some(raster),
                table,
            },
        );
        Ok(())
    }

    pub fn raster(&self, name: &str) -> Option<&Raster<i32>> {
        self.datasets.get(name).and_then(|d| d.raster.as_ref())
    }

    fn dataset(&self, name: &str) -> Result<&Dataset> {
        self.datasets
            .get(name)
            .ok_or_else(|| Error::Engine(format!("dataset '{}' does not exist", name)))
    }

    fn raster_of(&self, name: &str) -> Result<&Raster<i32>> {
        self.dataset(name)?
            .raster
            .as_ref()
            .ok_or_else(|| Error::Engine(format!("dataset '{}' is a table, not a raster", name)))
    }

    fn store_raster(&mut self, name: &str, raster: Raster<i32>) -> Result<()> {
        let table = AttributeTable::from_frequencies(&counts_table(&raster)?);
        debug!("{}: {} values", name, table.len());
        self.datasets.insert(
            name.to_string(),
            Dataset {
                raster: Some(raster),
                table,
            },
        );
        Ok(())
    }
}

fn counts_table(raster: &Raster<i32>) -> Result<FrequencyTable> {
    FrequencyTable::from_rows(
        raster
            .value_counts()
            .into_iter()
            .map(|(v, n)| FrequencyRow::new(v, n))
            .collect(),
    )
}

/// Apply `f` to every data cell, leaving no-data cells as no-data
fn map_cells<F>(raster: &Raster<i32>, f: F) -> Result<Raster<i32>>
where
    F: Fn(usize, usize, i64) -> Result<Option<i64>> + Sync,
{
    let (rows, cols) = raster.shape();
    let nodata = i32::default_nodata();

    let data: Vec<Vec<i32>> = (0..rows)
        .into_par_iter()
        .map(|row| -> Result<Vec<i32>> {
            let mut row_data = vec![nodata; cols];
            for (col, cell) in row_data.iter_mut().enumerate() {
                let Some(v) = raster.class_at(row, col)? else {
                    continue;
                };
                if let Some(out) = f(row, col, v)? {
                    *cell = i32::from_class(out).ok_or(Error::CodeOutOfRange {
                        code: out,
                        limit: i32::MAX as i64,
                    })?;
                }
            }
            Ok(row_data)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut output = raster.with_same_meta::<i32>(rows, cols);
    output.set_nodata(Some(nodata));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), data.concat())
        .map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

impl RasterEngine for MemoryEngine {
    type Handle = String;

    fn exists(&self, handle: &String) -> bool {
        self.datasets.contains_key(handle)
    }

    fn remove(&mut self, handle: &String) -> Result<()> {
        self.datasets.remove(handle);
        Ok(())
    }

    fn categories(&self, raster: &String, slice: TimeSlice) -> Result<Vec<Category>> {
        let table = &self.dataset(raster)?.table;
        table
            .rows()
            .iter()
            .map(|r| {
                let name = r
                    .get(COVER_CLASS_FIELD)
                    .and_then(FieldValue::as_text)
                    .ok_or_else(|| Error::MissingField {
                        field: COVER_CLASS_FIELD.into(),
                        table: raster.clone(),
                    })?;
                Ok(Category::new(r.value, name, slice))
            })
            .collect()
    }

    fn frequency_table(&self, raster: &String) -> Result<FrequencyTable> {
        self.dataset(raster)?.table.frequencies()
    }

    fn cell_area(&self, raster: &String) -> Result<f64> {
        Ok(self.raster_of(raster)?.cell_area())
    }

    fn combine(
        &mut self,
        start: &String,
        end: &String,
        encoder: &CodeEncoder,
        output: &String,
    ) -> Result<()> {
        let a = self.raster_of(start)?;
        let b = self.raster_of(end)?;
        if a.shape() != b.shape() {
            return Err(Error::SizeMismatch {
                er: a.rows(),
                ec: a.cols(),
                ar: b.rows(),
                ac: b.cols(),
            });
        }

        let combined = map_cells(a, |row, col, s| match b.class_at(row, col)? {
            Some(e) => encoder.encode(s, e).map(Some),
            None => Ok(None),
        })?;
        self.store_raster(output, combined)
    }

    fn apply_reclass(
        &mut self,
        raster: &String,
        mapping: &ReclassMap,
        output: &String,
    ) -> Result<()> {
        let src = self.raster_of(raster)?;
        let reclassed = map_cells(src, |_, _, v| {
            mapping.get(&v).copied().map(Some).ok_or(Error::UnmappedCode {
                code: v,
                table: "reclass",
            })
        })?;
        self.store_raster(output, reclassed)
    }

    fn attribute_table(&self, handle: &String) -> Result<AttributeTable> {
        Ok(self.dataset(handle)?.table.clone())
    }

    fn write_table(&mut self, table: &AttributeTable, output: &String) -> Result<()> {
        match self.datasets.get_mut(output) {
            Some(d) => d.table = table.clone(),
            None => {
                self.datasets.insert(
                    output.clone(),
                    Dataset {
                        raster: None,
                        table: table.clone(),
                    },
                );
            }
        }
        Ok(())
    }

    fn join_fields(
        &mut self,
        table: &String,
        key_field: &str,
        source: &AttributeTable,
        source_key_field: &str,
        fields: &[&str],
    ) -> Result<()> {
        let d = self
            .datasets
            .get_mut(table)
            .ok_or_else(|| Error::Engine(format!("dataset '{}' does not exist", table)))?;
        d.table.join(key_field, source, source_key_field, fields)
    }
}
