//! Categories of a classified raster and their per-time-slice registry

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::CoverSchema;

/// Which of the two classifications a category belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlice {
    Start,
    End,
}

impl fmt::Display for TimeSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeSlice::Start => f.write_str("start"),
            TimeSlice::End => f.write_str("end"),
        }
    }
}

/// A named class of a categorical raster at one time slice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub value: i64,
    pub name: String,
    pub slice: TimeSlice,
}

impl Category {
    pub fn new(value: i64, name: impl Into<String>, slice: TimeSlice) -> Self {
        Self {
            value,
            name: name.into(),
            slice,
        }
    }
}

/// Value/name pair as read from a raster attribute table, before it is
/// assigned to a time slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    #[serde(alias = "Value")]
    pub value: i64,
    #[serde(alias = "CoverClass", alias = "Name")]
    pub name: String,
}

/// Holds the value → name mapping of both time slices.
///
/// Values are unique within a slice; the registry is built once per run and
/// never modified by the classification engines.
#[derive(Debug, Clone, Default)]
pub struct CategoryRegistry {
    start: BTreeMap<i64, String>,
    end: BTreeMap<i64, String>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from the attribute tables of both rasters
    pub fn from_entries(start: &[CategoryEntry], end: &[CategoryEntry]) -> Result<Self> {
        let mut registry = Self::new();
        for e in start {
            registry.insert(Category::new(e.value, e.name.clone(), TimeSlice::Start))?;
        }
        for e in end {
            registry.insert(Category::new(e.value, e.name.clone(), TimeSlice::End))?;
        }
        Ok(registry)
    }

    /// Build a registry that uses the same built-in legend for both slices
    pub fn from_schema(schema: CoverSchema) -> Self {
        let names: BTreeMap<i64, String> = schema
            .legend()
            .iter()
            .map(|&(v, n)| (v, n.to_string()))
            .collect();
        Self {
            start: names.clone(),
            end: names,
        }
    }

    /// Register a category. Fails if its value is already present in its slice.
    pub fn insert(&mut self, category: Category) -> Result<()> {
        let map = self.slice_mut(category.slice);
        if map.contains_key(&category.value) {
            return Err(Error::DuplicateCategory {
                value: category.value,
                slice: category.slice,
            });
        }
        map.insert(category.value, category.name);
        Ok(())
    }

    /// Display name of `value` in `slice`
    pub fn name(&self, slice: TimeSlice, value: i64) -> Result<&str> {
        self.slice(slice)
            .get(&value)
            .map(String::as_str)
            .ok_or(Error::UnknownCategory { value, slice })
    }

    pub fn contains(&self, slice: TimeSlice, value: i64) -> bool {
        self.slice(slice).contains_key(&value)
    }

    /// Categories of one slice in ascending value order
    pub fn categories(&self, slice: TimeSlice) -> Vec<Category> {
        self.slice(slice)
            .iter()
            .map(|(&value, name)| Category::new(value, name.clone(), slice))
            .collect()
    }

    /// Largest value registered in either slice
    pub fn max_value(&self) -> Option<i64> {
        let s = self.start.keys().next_back().copied();
        let e = self.end.keys().next_back().copied();
        s.max(e)
    }

    pub fn len(&self, slice: TimeSlice) -> usize {
        self.slice(slice).len()
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.end.is_empty()
    }

    fn slice(&self, slice: TimeSlice) -> &BTreeMap<i64, String> {
        match slice {
            TimeSlice::Start => &self.start,
            TimeSlice::End => &self.end,
        }
    }

    fn slice_mut(&mut self, slice: TimeSlice) -> &mut BTreeMap<i64, String> {
        match slice {
            TimeSlice::Start => &mut self.start,
            TimeSlice::End => &mut self.end,
        }
    }
}
