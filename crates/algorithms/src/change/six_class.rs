//! Six-class change summary
//!
//! Classifies every combined code relative to a start set (the class of
//! interest in time 1) and an end set (the target class in time 2):
//!
//! ```text
//! 0  neither period in the start set
//! 1  start set in both periods
//! 2  start set → end set
//! 3  start set → any other class
//! 4  end set → start set
//! 5  other class → start set   (only when `backwards`; otherwise merged into 4)
//! ```
//!
//! The predicates overlap, so they are evaluated top-down and the first match
//! wins. The order is part of the contract.

use std::collections::{BTreeMap, BTreeSet};

use covershift_core::{Algorithm, CodeEncoder, CombinedCode, Error, ReclassMap, Result};
use serde::{Deserialize, Serialize};

use super::labels::{LabelTable, Labels};
use super::transition::TransitionTable;

/// Outcome classes of the six-class scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeClass {
    Neither = 0,
    Retained = 1,
    StartToEnd = 2,
    StartToOther = 3,
    EndToStart = 4,
    OtherToStart = 5,
}

impl ChangeClass {
    pub const ALL: [ChangeClass; 6] = [
        ChangeClass::Neither,
        ChangeClass::Retained,
        ChangeClass::StartToEnd,
        ChangeClass::StartToOther,
        ChangeClass::EndToStart,
        ChangeClass::OtherToStart,
    ];

    /// Raster value of this class
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Whether the class describes pixels that were in the start set in time 1
    pub fn in_start_set(self) -> bool {
        matches!(
            self,
            ChangeClass::Retained | ChangeClass::StartToEnd | ChangeClass::StartToOther
        )
    }

    /// Human-readable label.
    ///
    /// Class 4 reads differently depending on `backwards`: with it, 4 is
    /// strictly "end set to start set"; without it, class 5 is folded into 4
    /// and the label describes any non-start class moving into the start set.
    pub fn label(self, start_name: &str, end_name: &str, backwards: bool) -> String {
        match self {
            ChangeClass::Neither => format!("not {} in either time period", start_name),
            ChangeClass::Retained => format!("{} in both time periods", start_name),
            ChangeClass::StartToEnd => format!("{} to {}", start_name, end_name),
            ChangeClass::StartToOther => format!("{} to non-{} class", start_name, end_name),
            ChangeClass::EndToStart if backwards => format!("{} to {}", end_name, start_name),
            ChangeClass::EndToStart => format!("non-{} class to {}", start_name, start_name),
            ChangeClass::OtherToStart => format!("non-{} class to {}", end_name, start_name),
        }
    }
}

/// Parameters for the six-class summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SixClassParams {
    /// Category values of the class of interest in time 1
    pub start_set: BTreeSet<i64>,
    /// Category values of the target class in time 2
    pub end_set: BTreeSet<i64>,
    pub start_name: String,
    pub end_name: String,
    /// Keep "other class → start set" (5) apart from "end set → start set" (4)
    #[serde(default)]
    pub backwards: bool,
}

impl Default for SixClassParams {
    fn default() -> Self {
        Self {
            start_set: BTreeSet::new(),
            end_set: BTreeSet::new(),
            start_name: "start".into(),
            end_name: "end".into(),
            backwards: false,
        }
    }
}

impl SixClassParams {
    pub fn new(
        start_set: impl IntoIterator<Item = i64>,
        start_name: impl Into<String>,
        end_set: impl IntoIterator<Item = i64>,
        end_name: impl Into<String>,
        backwards: bool,
    ) -> Self {
        Self {
            start_set: start_set.into_iter().collect(),
            end_set: end_set.into_iter().collect(),
            start_name: start_name.into(),
            end_name: end_name.into(),
            backwards,
        }
    }

    /// Both sets must be non-empty, disjoint and encodable
    pub fn validate(&self, encoder: &CodeEncoder) -> Result<()> {
        if self.start_set.is_empty() {
            return Err(Error::EmptySet("start_set"));
        }
        if self.end_set.is_empty() {
            return Err(Error::EmptySet("end_set"));
        }
        if let Some(&v) = self.start_set.intersection(&self.end_set).next() {
            return Err(Error::OverlappingSets { value: v });
        }
        for &v in self.start_set.iter().chain(&self.end_set) {
            encoder.encode(v, 0)?;
        }
        Ok(())
    }

    fn label(&self, class: ChangeClass) -> String {
        class.label(&self.start_name, &self.end_name, self.backwards)
    }
}

/// Set membership of one (start, end) pair
struct Membership {
    sc_start: bool,
    sc_end: bool,
    ec_start: bool,
    ec_end: bool,
}

impl Membership {
    fn of(sc: i64, ec: i64, params: &SixClassParams) -> Self {
        Self {
            sc_start: params.start_set.contains(&sc),
            sc_end: params.end_set.contains(&sc),
            ec_start: params.start_set.contains(&ec),
            ec_end: params.end_set.contains(&ec),
        }
    }

    fn sc_other(&self) -> bool {
        !self.sc_start && !self.sc_end
    }

    fn ec_other(&self) -> bool {
        !self.ec_start && !self.ec_end
    }
}

struct Rule {
    matches: fn(&Membership) -> bool,
    outcome: fn(bool) -> ChangeClass,
}

/// Evaluated in order; anything unmatched is [`ChangeClass::Neither`]
const RULES: [Rule; 5] = [
    Rule {
        matches: |m| m.sc_start && m.ec_start,
        outcome: |_| ChangeClass::Retained,
    },
    Rule {
        matches: |m| m.sc_start && m.ec_end,
        outcome: |_| ChangeClass::StartToEnd,
    },
    Rule {
        matches: |m| m.sc_start && m.ec_other(),
        outcome: |_| ChangeClass::StartToOther,
    },
    Rule {
        matches: |m| m.sc_end && m.ec_start,
        outcome: |_| ChangeClass::EndToStart,
    },
    Rule {
        matches: |m| m.sc_other() && m.ec_start,
        outcome: |backwards| {
            if backwards {
                ChangeClass::OtherToStart
            } else {
                ChangeClass::EndToStart
            }
        },
    },
];

/// Outcome class of a single (start, end) pair
pub fn classify_pair(start: i64, end: i64, params: &SixClassParams) -> ChangeClass {
    let m = Membership::of(start, end, params);
    RULES
        .iter()
        .find(|r| (r.matches)(&m))
        .map(|r| (r.outcome)(params.backwards))
        .unwrap_or(ChangeClass::Neither)
}

/// Outcome class and label of one combined code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedCode {
    pub outcome: i64,
    pub label: String,
}

/// Combined code → outcome class, built once per parameter set
#[derive(Debug, Clone, Default)]
pub struct Classification {
    entries: BTreeMap<CombinedCode, ClassifiedCode>,
    outcome_labels: LabelTable,
}

impl Classification {
    pub fn get(&self, code: CombinedCode) -> Option<&ClassifiedCode> {
        self.entries.get(&code)
    }

    /// Entry for `code`, or a lookup error if the classification never saw it
    pub fn lookup(&self, code: CombinedCode) -> Result<&ClassifiedCode> {
        self.get(code).ok_or(Error::UnmappedCode {
            code,
            table: self.table_name(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (CombinedCode, &ClassifiedCode)> {
        self.entries.iter().map(|(&c, e)| (c, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mapping handed to the raster engine's reclassification
    pub fn reclass_map(&self) -> ReclassMap {
        self.entries.iter().map(|(&c, e)| (c, e.outcome)).collect()
    }

    /// Labels keyed by outcome class, for the reclassified raster
    pub fn outcome_labels(&self) -> &LabelTable {
        &self.outcome_labels
    }
}

impl Labels for Classification {
    fn label_for(&self, value: i64) -> Option<&str> {
        self.get(value).map(|e| e.label.as_str())
    }

    fn table_name(&self) -> &'static str {
        "six-class"
    }
}

/// Classify each combined code in `codes`.
///
/// Every decodable code lands in exactly one of the six classes.
pub fn six_class_classification(
    codes: impl IntoIterator<Item = CombinedCode>,
    encoder: &CodeEncoder,
    params: &SixClassParams,
) -> Result<Classification> {
    params.validate(encoder)?;

    let mut outcome_labels = LabelTable::new("six-class outcome");
    for class in ChangeClass::ALL {
        if class == ChangeClass::OtherToStart && !params.backwards {
            continue;
        }
        outcome_labels.insert(class.code(), params.label(class));
    }

    let mut entries = BTreeMap::new();
    for code in codes {
        let (sc, ec) = encoder.decode(code)?;
        let class = classify_pair(sc, ec, params);
        entries.insert(
            code,
            ClassifiedCode {
                outcome: class.code(),
                label: params.label(class),
            },
        );
    }

    Ok(Classification {
        entries,
        outcome_labels,
    })
}

/// Six-class summary over a transition table
#[derive(Debug, Clone, Default)]
pub struct SixClassChange;

impl Algorithm for SixClassChange {
    type Input = TransitionTable;
    type Output = Classification;
    type Params = SixClassParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Six-class change"
    }

    fn description(&self) -> &'static str {
        "Classify transitions relative to a start set and an end set of categories"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        six_class_classification(input.codes(), input.encoder(), &params)
    }
}
