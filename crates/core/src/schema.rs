//! Built-in land-cover legends
//!
//! - **NLCD**: National Land Cover Database codes, with barren land split
//!   into natural (31) and anthropogenic (32) and the derived successional
//!   (56) and harvested (75) classes
//! - **General**: the collapsed legend used for state-wide summaries

use serde::{Deserialize, Serialize};

/// A named value → class-name legend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverSchema {
    Nlcd,
    General,
}

const NLCD_LEGEND: &[(i64, &str)] = &[
    (0, "Unclassified"),
    (11, "Open Water"),
    (21, "Developed, Open Space"),
    (22, "Developed, Low Intensity"),
    (23, "Developed, Medium Intensity"),
    (24, "Developed, High Intensity"),
    (31, "Barren, Natural"),
    (32, "Barren, Anthropogenic"),
    (41, "Deciduous Forest"),
    (42, "Evergreen Forest"),
    (43, "Mixed Forest"),
    (52, "Shrub/Scrub"),
    (56, "Shrub/Scrub successional"),
    (71, "Herbaceous"),
    (75, "Harvested/Disturbed"),
    (81, "Hay/Pasture"),
    (82, "Cultivated Crops"),
    (90, "Woody Wetlands"),
    (95, "Emergent Herbaceous Wetlands"),
];

const GENERAL_LEGEND: &[(i64, &str)] = &[
    (0, "Undefined"),
    (1, "Open Water"),
    (2, "Developed"),
    (3, "Agriculture"),
    (4, "Natural"),
    (5, "Successional"),
    (6, "Harvested/Disturbed"),
];

impl CoverSchema {
    /// Value/name pairs in ascending value order
    pub fn legend(self) -> &'static [(i64, &'static str)] {
        match self {
            CoverSchema::Nlcd => NLCD_LEGEND,
            CoverSchema::General => GENERAL_LEGEND,
        }
    }

    /// Class name for `value`, if the legend defines one
    pub fn name(self, value: i64) -> Option<&'static str> {
        self.legend()
            .iter()
            .find(|(v, _)| *v == value)
            .map(|(_, n)| *n)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "nlcd" => Some(CoverSchema::Nlcd),
            "general" | "gen" => Some(CoverSchema::General),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nlcd_names() {
        assert_eq!(CoverSchema::Nlcd.name(42), Some("Evergreen Forest"));
        assert_eq!(CoverSchema::Nlcd.name(12), None);
    }

    #[test]
    fn test_legends_sorted_and_unique() {
        for schema in [CoverSchema::Nlcd, CoverSchema::General] {
            let values: Vec<i64> = schema.legend().iter().map(|(v, _)| *v).collect();
            assert!(values.windows(2).all(|w| w[0] < w[1]), "{:?} not sorted", schema);
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!(CoverSchema::parse("Gen"), Some(CoverSchema::General));
        assert_eq!(CoverSchema::parse("NLCD"), Some(CoverSchema::Nlcd));
        assert_eq!(CoverSchema::parse("anderson"), None);
    }
}
