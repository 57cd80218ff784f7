//! Tabular data exchanged with the raster engine
//!
//! - [`FrequencyTable`]: raster value → pixel count
//! - [`StatRow`]: derived area and percentage statistics for one value
//! - [`AttributeTable`]: a raster attribute table keyed by `Value`

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::code::CombinedCode;
use crate::error::{Error, Result};

/// Name of the key column of every attribute table
pub const VALUE_FIELD: &str = "Value";
/// Name of the pixel count column
pub const COUNT_FIELD: &str = "Count";

/// Pixel count of one raster value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyRow {
    #[serde(alias = "Value")]
    pub code: CombinedCode,
    #[serde(alias = "Count")]
    pub pixel_count: u64,
}

impl FrequencyRow {
    pub fn new(code: CombinedCode, pixel_count: u64) -> Self {
        Self { code, pixel_count }
    }
}

/// Per-value pixel counts of a raster, with unique codes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FrequencyTable {
    rows: Vec<FrequencyRow>,
}

impl FrequencyTable {
    /// Build a table, rejecting repeated codes
    pub fn from_rows(rows: Vec<FrequencyRow>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(rows.len());
        for r in &rows {
            if !seen.insert(r.code) {
                return Err(Error::DuplicateCode { code: r.code });
            }
        }
        Ok(Self { rows })
    }

    /// Build a table from `(code, count)` pairs
    pub fn from_pairs(pairs: &[(CombinedCode, u64)]) -> Result<Self> {
        Self::from_rows(pairs.iter().map(|&(c, n)| FrequencyRow::new(c, n)).collect())
    }

    pub fn rows(&self) -> &[FrequencyRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrequencyRow> {
        self.rows.iter()
    }

    pub fn codes(&self) -> impl Iterator<Item = CombinedCode> + '_ {
        self.rows.iter().map(|r| r.code)
    }

    /// Pixel count for `code`, if present
    pub fn get(&self, code: CombinedCode) -> Option<u64> {
        self.rows.iter().find(|r| r.code == code).map(|r| r.pixel_count)
    }

    /// Sum of all pixel counts
    pub fn total(&self) -> u64 {
        self.rows.iter().map(|r| r.pixel_count).sum()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'de> Deserialize<'de> for FrequencyTable {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let rows = Vec::<FrequencyRow>::deserialize(d)?;
        FrequencyTable::from_rows(rows).map_err(serde::de::Error::custom)
    }
}

/// Area and percentage statistics of one raster value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRow {
    /// Combined code or outcome class
    pub value: i64,
    pub label: String,
    pub pixel_count: u64,
    pub area_ha: f64,
    pub percent_of_total: f64,
    /// Percentage relative to the rows selected by the subset filter, `None`
    /// for rows outside the subset or when no filter was given
    pub percent_of_subset: Option<f64>,
}

/// A cell of an attribute table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

/// One row of an attribute table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRow {
    #[serde(rename = "Value")]
    pub value: i64,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl AttributeRow {
    pub fn new(value: i64) -> Self {
        Self {
            value,
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Integer key of this row for `field`; `Value` addresses the row key itself
    fn key(&self, field: &str) -> Option<i64> {
        if field == VALUE_FIELD {
            Some(self.value)
        } else {
            self.fields.get(field).and_then(FieldValue::as_int)
        }
    }
}

/// A raster attribute table: one row per raster value
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct AttributeTable {
    rows: Vec<AttributeRow>,
    /// Row value → position in `rows`
    #[serde(skip)]
    index: HashMap<i64, usize>,
}

impl PartialEq for AttributeTable {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
    }
}

impl<'de> Deserialize<'de> for AttributeTable {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let rows = Vec::<AttributeRow>::deserialize(d)?;
        let mut table = AttributeTable::new();
        for row in rows {
            table.push(row);
        }
        Ok(table)
    }
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute table holding `Value` and `Count` for every frequency row
    pub fn from_frequencies(freq: &FrequencyTable) -> Self {
        let mut table = Self::new();
        for r in freq.iter() {
            let mut row = AttributeRow::new(r.code);
            row.fields
                .insert(COUNT_FIELD.to_string(), FieldValue::Int(r.pixel_count as i64));
            table.push(row);
        }
        table
    }

    pub fn rows(&self) -> &[AttributeRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append `row`, or replace the existing row with the same value
    pub fn push(&mut self, row: AttributeRow) {
        match self.index.get(&row.value) {
            Some(&i) => self.rows[i] = row,
            None => {
                self.index.insert(row.value, self.rows.len());
                self.rows.push(row);
            }
        }
    }

    pub fn row(&self, value: i64) -> Option<&AttributeRow> {
        self.index.get(&value).map(|&i| &self.rows[i])
    }

    /// Set `field` on the row keyed by `value`, creating the row if needed
    pub fn set(&mut self, value: i64, field: &str, v: impl Into<FieldValue>) {
        let idx = match self.index.get(&value) {
            Some(&i) => i,
            None => {
                self.index.insert(value, self.rows.len());
                self.rows.push(AttributeRow::new(value));
                self.rows.len() - 1
            }
        };
        self.rows[idx].fields.insert(field.to_string(), v.into());
    }

    pub fn get(&self, value: i64, field: &str) -> Option<&FieldValue> {
        self.row(value).and_then(|r| r.get(field))
    }

    /// Copy `fields` from `source` onto this table, matching this table's
    /// `key_field` against the source's `source_key_field`.
    ///
    /// When several source rows share a key the last one wins. Rows without a
    /// match are left unchanged.
    pub fn join(
        &mut self,
        key_field: &str,
        source: &AttributeTable,
        source_key_field: &str,
        fields: &[&str],
    ) -> Result<()> {
        let mut by_key: HashMap<i64, &AttributeRow> = HashMap::new();
        for r in &source.rows {
            if let Some(k) = r.key(source_key_field) {
                by_key.insert(k, r);
            }
        }
        if !source.is_empty() && by_key.is_empty() {
            return Err(Error::MissingField {
                field: source_key_field.to_string(),
                table: "join source".into(),
            });
        }

        for row in &mut self.rows {
            let Some(src) = row.key(key_field).and_then(|k| by_key.get(&k)) else {
                continue;
            };
            for &f in fields {
                let v = src.get(f).ok_or_else(|| Error::MissingField {
                    field: f.to_string(),
                    table: "join source".into(),
                })?;
                row.fields.insert(f.to_string(), v.clone());
            }
        }
        Ok(())
    }

    /// Pixel counts from the `Count` column
    pub fn frequencies(&self) -> Result<FrequencyTable> {
        let rows = self
            .rows
            .iter()
            .map(|r| {
                let count = r
                    .get(COUNT_FIELD)
                    .and_then(FieldValue::as_int)
                    .ok_or_else(|| Error::MissingField {
                        field: COUNT_FIELD.to_string(),
                        table: format!("row {}", r.value),
                    })?;
                let count = u64::try_from(count).map_err(|_| Error::NegativeCount {
                    value: r.value,
                    count,
                })?;
                Ok(FrequencyRow::new(r.value, count))
            })
            .collect::<Result<Vec<_>>>()?;
        FrequencyTable::from_rows(rows)
    }
}
