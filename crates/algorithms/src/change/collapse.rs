//! Target collapse ("to/from") classification
//!
//! Re-centers the transition space on one target class instead of a
//! start/end pair. The target set may hold several category values; its first
//! value is the canonical target used in renumbered codes:
//!
//! ```text
//! target → target     1
//! target → X          target * BASE + X
//! X → target          X * BASE + target
//! neither             0
//! ```
//!
//! Transitions out of and into the target are kept apart (4 → 2 is 402,
//! 2 → 4 is 204), but every target member collapses onto the canonical value,
//! so 41 → 21 and 42 → 21 share one code when the target is {41, 42}.

use std::collections::HashMap;

use covershift_core::{
    Algorithm, AttributeRow, AttributeTable, CombinedCode, Error, FieldValue, ReclassMap, Result,
};
use serde::{Deserialize, Serialize};

use super::labels::{LabelTable, Labels};
use super::transition::TransitionTable;

/// Collapsed code of transitions that stay in the target
pub const COLLAPSED_RETAINED: i64 = 1;
/// Collapsed code of transitions that never touch the target
pub const COLLAPSED_NEITHER: i64 = 0;

/// Parameters for the target collapse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapseParams {
    /// Target category values; the first one is canonical
    pub target_set: Vec<i64>,
    /// Display name of the target
    pub target_name: String,
}

impl Default for CollapseParams {
    fn default() -> Self {
        Self {
            target_set: Vec::new(),
            target_name: "target".into(),
        }
    }
}

impl CollapseParams {
    pub fn new(target_set: impl IntoIterator<Item = i64>, target_name: impl Into<String>) -> Self {
        Self {
            target_set: target_set.into_iter().collect(),
            target_name: target_name.into(),
        }
    }

    /// The value that stands for the whole target set in renumbered codes
    pub fn canonical(&self) -> Result<i64> {
        self.target_set.first().copied().ok_or(Error::EmptySet("target_set"))
    }

    fn contains(&self, value: i64) -> bool {
        self.target_set.contains(&value)
    }
}

/// One original transition with its collapsed code and display metadata.
///
/// The side of the transition that is in the target is rewritten to the
/// canonical value and the target name; the registry itself is untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct CollapseRow {
    pub code: CombinedCode,
    pub collapsed: i64,
    pub label: String,
    pub start_value: i64,
    pub start_name: String,
    pub end_value: i64,
    pub end_name: String,
}

/// Original combined code → collapsed code and label
#[derive(Debug, Clone, Default)]
pub struct CollapseJoinTable {
    rows: Vec<CollapseRow>,
    index: HashMap<CombinedCode, usize>,
    collapsed_labels: LabelTable,
}

impl CollapseJoinTable {
    pub fn rows(&self) -> &[CollapseRow] {
        &self.rows
    }

    pub fn get(&self, code: CombinedCode) -> Option<&CollapseRow> {
        self.index.get(&code).map(|&i| &self.rows[i])
    }

    pub fn lookup(&self, code: CombinedCode) -> Result<&CollapseRow> {
        self.get(code).ok_or(Error::UnmappedCode {
            code,
            table: self.table_name(),
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn reclass_map(&self) -> ReclassMap {
        self.rows.iter().map(|r| (r.code, r.collapsed)).collect()
    }

    /// Labels keyed by collapsed code.
    ///
    /// Rows are unioned by collapsed code in table order and a later row
    /// overwrites an earlier one, the same outcome as a key join against
    /// [`to_attribute_table`](Self::to_attribute_table).
    pub fn collapsed_labels(&self) -> &LabelTable {
        &self.collapsed_labels
    }

    /// The join table as attribute rows keyed by original code, with the
    /// collapsed code in `reclass`
    pub fn to_attribute_table(&self) -> AttributeTable {
        let mut table = AttributeTable::new();
        for r in &self.rows {
            let mut row = AttributeRow::new(r.code);
            let f = &mut row.fields;
            f.insert("start_class".into(), FieldValue::Int(r.start_value));
            f.insert("start_class_name".into(), FieldValue::Text(r.start_name.clone()));
            f.insert("end_class".into(), FieldValue::Int(r.end_value));
            f.insert("end_class_name".into(), FieldValue::Text(r.end_name.clone()));
            f.insert(RECLASS_FIELD.into(), FieldValue::Int(r.collapsed));
            f.insert(CHANGE_TYPE_FIELD.into(), FieldValue::Text(r.label.clone()));
            table.push(row);
        }
        table
    }
}

impl Labels for CollapseJoinTable {
    fn label_for(&self, value: i64) -> Option<&str> {
        self.get(value).map(|r| r.label.as_str())
    }

    fn table_name(&self) -> &'static str {
        "collapse"
    }
}

/// Join key column holding the collapsed code
pub const RECLASS_FIELD: &str = "reclass";
/// Column holding the transition label
pub const CHANGE_TYPE_FIELD: &str = "change_type";

/// Collapse every transition of `table` around the target set
pub fn collapse_classification(
    table: &TransitionTable,
    params: &CollapseParams,
) -> Result<CollapseJoinTable> {
    let target = params.canonical()?;
    let encoder = table.encoder();
    for &v in &params.target_set {
        encoder.encode(v, 0)?;
    }
    let name = params.target_name.as_str();

    let mut rows = Vec::with_capacity(table.len());
    let mut index = HashMap::with_capacity(table.len());
    let mut collapsed_labels = LabelTable::new("collapsed");

    for t in table.iter() {
        let sc = t.start.value;
        let ec = t.end.value;

        let row = match (params.contains(sc), params.contains(ec)) {
            (true, true) => CollapseRow {
                code: t.code,
                collapsed: COLLAPSED_RETAINED,
                label: format!("{} both time periods", name),
                start_value: sc,
                start_name: t.start.name.clone(),
                end_value: ec,
                end_name: t.end.name.clone(),
            },
            (true, false) => CollapseRow {
                code: t.code,
                collapsed: encoder.encode(target, ec)?,
                label: format!("{} to {}", name, t.end.name),
                start_value: target,
                start_name: name.to_string(),
                end_value: ec,
                end_name: t.end.name.clone(),
            },
            (false, true) => CollapseRow {
                code: t.code,
                collapsed: encoder.encode(sc, target)?,
                label: format!("{} to {}", t.start.name, name),
                start_value: sc,
                start_name: t.start.name.clone(),
                end_value: target,
                end_name: name.to_string(),
            },
            (false, false) => CollapseRow {
                code: t.code,
                collapsed: COLLAPSED_NEITHER,
                label: format!("Not {} either time period", name),
                start_value: sc,
                start_name: t.start.name.clone(),
                end_value: ec,
                end_name: t.end.name.clone(),
            },
        };

        collapsed_labels.insert(row.collapsed, row.label.clone());
        index.insert(row.code, rows.len());
        rows.push(row);
    }

    Ok(CollapseJoinTable {
        rows,
        index,
        collapsed_labels,
    })
}

/// Target collapse over a transition table
#[derive(Debug, Clone, Default)]
pub struct TargetCollapse;

impl Algorithm for TargetCollapse {
    type Input = TransitionTable;
    type Output = CollapseJoinTable;
    type Params = CollapseParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Target collapse"
    }

    fn description(&self) -> &'static str {
        "Renumber transitions into and out of one target class"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        collapse_classification(&input, &params)
    }
}
