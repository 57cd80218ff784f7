//! Transition table over the category cross product
//!
//! Every (start, end) pair that can be formed from the categories of the two
//! classifications gets one row, whether or not it occurs in the data. The
//! table is therefore exhaustive for any combined raster built from those
//! classifications, and later reclassification never meets an unmapped code.

use std::collections::{HashMap, HashSet};

use covershift_core::{
    Category, CategoryRegistry, CodeEncoder, CombinedCode, Error, Result, TimeSlice,
};

use super::labels::Labels;

/// Label of transitions whose start and end values are equal
pub const NO_CHANGE: &str = "No change";

/// One (start, end) category pair and its combined code
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRow {
    pub code: CombinedCode,
    pub start: Category,
    pub end: Category,
    /// `start.value != end.value`
    pub changed: bool,
    /// "No change" or "<start name> to <end name>"
    pub change_type: String,
}

impl TransitionRow {
    fn new(code: CombinedCode, start: &Category, end: &Category) -> Self {
        let changed = start.value != end.value;
        let change_type = if changed {
            format!("{} to {}", start.name, end.name)
        } else {
            NO_CHANGE.to_string()
        };
        Self {
            code,
            start: start.clone(),
            end: end.clone(),
            changed,
            change_type,
        }
    }
}

/// Rows in start-major, end-minor order, indexed by combined code
#[derive(Debug, Clone)]
pub struct TransitionTable {
    encoder: CodeEncoder,
    rows: Vec<TransitionRow>,
    index: HashMap<CombinedCode, usize>,
}

impl TransitionTable {
    pub fn encoder(&self) -> &CodeEncoder {
        &self.encoder
    }

    pub fn rows(&self) -> &[TransitionRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransitionRow> {
        self.rows.iter()
    }

    pub fn codes(&self) -> impl Iterator<Item = CombinedCode> + '_ {
        self.rows.iter().map(|r| r.code)
    }

    pub fn get(&self, code: CombinedCode) -> Option<&TransitionRow> {
        self.index.get(&code).map(|&i| &self.rows[i])
    }

    /// Row for `code`, or a lookup error when the cross product never
    /// produced it
    pub fn lookup(&self, code: CombinedCode) -> Result<&TransitionRow> {
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
}

impl Labels for TransitionTable {
    fn label_for(&self, value: i64) -> Option<&str> {
        self.get(value).map(|r| r.change_type.as_str())
    }

    fn table_name(&self) -> &'static str {
        "transition"
    }
}

/// Build the transition table for the full cross product of `start` and `end`.
///
/// Category values must be unique within each list and encodable with
/// `encoder`.
///
/// # Example
/// ```ignore
/// let start = registry.categories(TimeSlice::Start);
/// let end = registry.categories(TimeSlice::End);
/// let table = build_transition_table(&start, &end, &CodeEncoder::default())?;
/// assert_eq!(table.len(), start.len() * end.len());
/// ```
pub fn build_transition_table(
    start: &[Category],
    end: &[Category],
    encoder: &CodeEncoder,
) -> Result<TransitionTable> {
    check_unique(start, TimeSlice::Start)?;
    check_unique(end, TimeSlice::End)?;

    let mut rows = Vec::with_capacity(start.len() * end.len());
    let mut index = HashMap::with_capacity(start.len() * end.len());

    for s in start {
        for e in end {
            let code = encoder.encode(s.value, e.value)?;
            index.insert(code, rows.len());
            rows.push(TransitionRow::new(code, s, e));
        }
    }

    Ok(TransitionTable {
        encoder: *encoder,
        rows,
        index,
    })
}

/// Build the transition table from both slices of a registry, choosing the
/// encoder base from the largest registered value
pub fn transition_table_from_registry(registry: &CategoryRegistry) -> Result<TransitionTable> {
    let encoder = CodeEncoder::for_categories(registry.max_value().unwrap_or(0))?;
    build_transition_table(
        &registry.categories(TimeSlice::Start),
        &registry.categories(TimeSlice::End),
        &encoder,
    )
}

fn check_unique(categories: &[Category], slice: TimeSlice) -> Result<()> {
    let mut seen = HashSet::with_capacity(categories.len());
    for c in categories {
        if !seen.insert(c.value) {
            return Err(Error::DuplicateCategory { value: c.value, slice });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use covershift_core::CoverSchema;

    fn cats(slice: TimeSlice, entries: &[(i64, &str)]) -> Vec<Category> {
        entries.iter().map(|&(v, n)| Category::new(v, n, slice)).collect()
    }

    #[test]
    fn test_cross_product_size_and_unique_codes() {
        let start = cats(TimeSlice::Start, &[(2, "Developed"), (4, "Natural"), (9, "Other")]);
        let end = cats(TimeSlice::End, &[(2, "Developed"), (4, "Natural")]);
        let table = build_transition_table(&start, &end, &CodeEncoder::default()).unwrap();

        assert_eq!(table.len(), 6);
        let codes: HashSet<_> = table.codes().collect();
        assert_eq!(codes.len(), 6);
    }

    #[test]
    fn test_start_major_order() {
        let start = cats(TimeSlice::Start, &[(4, "Natural"), (2, "Developed")]);
        let end = cats(TimeSlice::End, &[(1, "Open Water"), (4, "Natural")]);
        let table = build_transition_table(&start, &end, &CodeEncoder::default()).unwrap();

        let codes: Vec<_> = table.codes().collect();
        assert_eq!(codes, vec![401, 404, 201, 204]);
    }

    #[test]
    fn test_change_labels() {
        let start = cats(TimeSlice::Start, &[(41, "Deciduous Forest")]);
        let end = cats(
            TimeSlice::End,
            &[(41, "Deciduous Forest"), (22, "Developed, Low Intensity")],
        );
        let table = build_transition_table(&start, &end, &CodeEncoder::default()).unwrap();

        let same = table.lookup(4141).unwrap();
        assert!(!same.changed);
        assert_eq!(same.change_type, NO_CHANGE);

        let dev = table.lookup(4122).unwrap();
        assert!(dev.changed);
        assert_eq!(dev.change_type, "Deciduous Forest to Developed, Low Intensity");
        assert_eq!(dev.start.value, 41);
        assert_eq!(dev.end.name, "Developed, Low Intensity");
    }

    #[test]
    fn test_unmapped_code_is_lookup_error() {
        let start = cats(TimeSlice::Start, &[(4, "Natural")]);
        let end = cats(TimeSlice::End, &[(4, "Natural")]);
        let table = build_transition_table(&start, &end, &CodeEncoder::default()).unwrap();

        let err = table.lookup(402).unwrap_err();
        assert!(matches!(err, Error::UnmappedCode { code: 402, .. }));
    }

    #[test]
    fn test_rejects_duplicate_and_out_of_range_values() {
        let start = cats(TimeSlice::Start, &[(4, "Natural"), (4, "Natural again")]);
        let end = cats(TimeSlice::End, &[(4, "Natural")]);
        assert!(matches!(
            build_transition_table(&start, &end, &CodeEncoder::default()),
            Err(Error::DuplicateCategory { value: 4, .. })
        ));

        let start = cats(TimeSlice::Start, &[(120, "Too big")]);
        assert!(matches!(
            build_transition_table(&start, &end, &CodeEncoder::default()),
            Err(Error::ValueOutOfRange { value: 120, base: 100 })
        ));
    }

    #[test]
    fn test_registry_nlcd_cross_product() {
        let registry = CategoryRegistry::from_schema(CoverSchema::Nlcd);
        let table = transition_table_from_registry(&registry).unwrap();
        let n = CoverSchema::Nlcd.legend().len();
        assert_eq!(table.len(), n * n);
        assert_eq!(table.encoder().base(), 100);
    }

    #[test]
    fn test_registry_value_too_large_is_domain_error() {
        let mut registry = CategoryRegistry::new();
        registry
            .insert(Category::new(5_000_000_000, "Huge", TimeSlice::Start))
            .unwrap();
        registry.insert(Category::new(1, "Small", TimeSlice::End)).unwrap();

        let err = transition_table_from_registry(&registry).unwrap_err();
        assert_eq!(err.kind(), covershift_core::ErrorKind::Domain);
    }
}
