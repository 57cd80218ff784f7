//! Value remaps: NLCD → general legend, and reclassification of frequency
//! tables
//!
//! The NLCD remap collapses the NLCD legend (barren land already split into 31
//! natural and 32 anthropogenic) into the general legend:
//!
//! | general | NLCD |
//! |---|---|
//! | 1 Open Water | 11 |
//! | 2 Developed | 21, 22, 23, 24, 32 |
//! | 3 Agriculture | 81, 82 |
//! | 4 Natural | 31, 41, 42, 43, 90, 95 |
//! | 5 Successional | 52, 56, 71 |
//! | 6 Harvested/Disturbed | 75 |
//!
//! NLCD 0 (unclassified) becomes no-data.

use std::collections::BTreeMap;

use covershift_core::{Error, FrequencyRow, FrequencyTable, ReclassMap, Result};

/// Value remap where a target of `None` means no-data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueRemap {
    map: BTreeMap<i64, Option<i64>>,
}

const NLCD_TO_GENERAL: &[(i64, Option<i64>)] = &[
    (0, None),
    (11, Some(1)),
    (21, Some(2)),
    (22, Some(2)),
    (23, Some(2)),
    (24, Some(2)),
    (31, Some(4)),
    (32, Some(2)),
    (41, Some(4)),
    (42, Some(4)),
    (43, Some(4)),
    (52, Some(5)),
    (56, Some(5)),
    (71, Some(5)),
    (75, Some(6)),
    (81, Some(3)),
    (82, Some(3)),
    (90, Some(4)),
    (95, Some(4)),
];

impl ValueRemap {
    pub fn from_pairs(pairs: &[(i64, Option<i64>)]) -> Self {
        Self {
            map: pairs.iter().copied().collect(),
        }
    }

    /// The NLCD → general legend remap
    pub fn nlcd_to_general() -> Self {
        Self::from_pairs(NLCD_TO_GENERAL)
    }

    /// New value for `value`; `Ok(None)` is no-data.
    ///
    /// A value the remap does not mention is a lookup error.
    pub fn apply(&self, value: i64) -> Result<Option<i64>> {
        self.map.get(&value).copied().ok_or(Error::UnmappedCode {
            code: value,
            table: "value remap",
        })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Frequency table of the remapped raster.
///
/// Counts of source values that land on the same target are summed; no-data
/// targets are dropped. Output rows are in ascending value order.
pub fn remap_frequencies(freq: &FrequencyTable, remap: &ValueRemap) -> Result<FrequencyTable> {
    merge_counts(freq, |v| remap.apply(v))
}

/// Frequency table of `freq` after reclassification with `mapping`, without
/// touching the raster.
///
/// Matches the attribute table the raster engine rebuilds after
/// `apply_reclass`; an unmapped value is a lookup error.
pub fn reclass_frequencies(freq: &FrequencyTable, mapping: &ReclassMap) -> Result<FrequencyTable> {
    merge_counts(freq, |v| {
        mapping.get(&v).copied().map(Some).ok_or(Error::UnmappedCode {
            code: v,
            table: "reclass",
        })
    })
}

fn merge_counts(
    freq: &FrequencyTable,
    target: impl Fn(i64) -> Result<Option<i64>>,
) -> Result<FrequencyTable> {
    let mut merged: BTreeMap<i64, u64> = BTreeMap::new();
    for r in freq.iter() {
        if let Some(t) = target(r.code)? {
            *merged.entry(t).or_insert(0) += r.pixel_count;
        }
    }
    FrequencyTable::from_rows(
        merged
            .into_iter()
            .map(|(code, n)| FrequencyRow::new(code, n))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use covershift_core::CoverSchema;

    #[test]
    fn test_nlcd_to_general_values() {
        let remap = ValueRemap::nlcd_to_general();
        assert_eq!(remap.apply(32).unwrap(), Some(2));
        assert_eq!(remap.apply(31).unwrap(), Some(4));
        assert_eq!(remap.apply(56).unwrap(), Some(5));
        assert_eq!(remap.apply(75).unwrap(), Some(6));
        assert_eq!(remap.apply(0).unwrap(), None);
    }

    #[test]
    fn test_remap_covers_nlcd_legend() {
        let remap = ValueRemap::nlcd_to_general();
        for &(v, _) in CoverSchema::Nlcd.legend() {
            let target = remap.apply(v).unwrap();
            if let Some(t) = target {
                assert!(
                    CoverSchema::General.name(t).is_some(),
                    "{} → {} not in general legend",
                    v,
                    t
                );
            }
        }
    }

    #[test]
    fn test_unknown_value_is_lookup_error() {
        let err = ValueRemap::nlcd_to_general().apply(12).unwrap_err();
        assert!(matches!(err, Error::UnmappedCode { code: 12, .. }));
    }

    #[test]
    fn test_remap_frequencies_merges_counts() {
        let freq =
            FrequencyTable::from_pairs(&[(0, 99), (21, 5), (22, 7), (41, 10), (90, 2), (11, 1)])
                .unwrap();
        let general = remap_frequencies(&freq, &ValueRemap::nlcd_to_general()).unwrap();

        assert_eq!(general.get(2), Some(12));
        assert_eq!(general.get(4), Some(12));
        assert_eq!(general.get(1), Some(1));
        assert_eq!(general.get(0), None);
        assert_eq!(general.total(), 25);
        let codes: Vec<_> = general.codes().collect();
        assert_eq!(codes, vec![1, 2, 4]);
    }

    #[test]
    fn test_reclass_frequencies() {
        let freq = FrequencyTable::from_pairs(&[(404, 4), (402, 3), (904, 1), (909, 2)]).unwrap();
        let mut map = ReclassMap::new();
        map.insert(404, 1);
        map.insert(402, 402);
        map.insert(904, 904);
        map.insert(909, 0);

        let out = reclass_frequencies(&freq, &map).unwrap();
        assert_eq!(out.codes().collect::<Vec<_>>(), vec![0, 1, 402, 904]);
        assert_eq!(out.total(), freq.total());

        map.remove(&909);
        assert!(matches!(
            reclass_frequencies(&freq, &map),
            Err(Error::UnmappedCode { code: 909, .. })
        ));
    }
}
