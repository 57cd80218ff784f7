//! Label lookup for statistics rows

use std::collections::BTreeMap;

use covershift_core::{Error, Result};

/// Anything that can name a raster value (combined code or outcome class)
pub trait Labels {
    /// Label of `value`, `None` when the table has no entry for it
    fn label_for(&self, value: i64) -> Option<&str>;

    /// Table name reported in lookup errors
    fn table_name(&self) -> &'static str;

    /// Label of `value`, or a lookup error naming the missing code
    fn require(&self, value: i64) -> Result<&str> {
        self.label_for(value).ok_or(Error::UnmappedCode {
            code: value,
            table: self.table_name(),
        })
    }
}

/// Plain value → label table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelTable {
    name: &'static str,
    labels: BTreeMap<i64, String>,
}

impl LabelTable {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            labels: BTreeMap::new(),
        }
    }

    /// Set the label of `value`, replacing any earlier one
    pub fn insert(&mut self, value: i64, label: impl Into<String>) {
        self.labels.insert(value, label.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> {
        self.labels.iter().map(|(&v, l)| (v, l.as_str()))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Labels for LabelTable {
    fn label_for(&self, value: i64) -> Option<&str> {
        self.labels.get(&value).map(String::as_str)
    }

    fn table_name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_reports_missing_code() {
        let mut t = LabelTable::new("outcome");
        t.insert(1, "Forest in both time periods");
        assert_eq!(t.require(1).unwrap(), "Forest in both time periods");

        let err = t.require(7).unwrap_err();
        assert!(matches!(err, Error::UnmappedCode { code: 7, table: "outcome" }));
    }
}
