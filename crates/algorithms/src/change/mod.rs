//! Land-cover change classification
//!
//! - [`transition`]: the exhaustive transition table over two category lists
//! - [`six_class`]: start set / end set outcome classes
//! - [`collapse`]: renumbering around one target class
//! - [`stats`]: area and percentage statistics
//! - [`general`]: NLCD → general legend remap
//! - [`summary`]: cover amounts over a time series
//! - [`product`]: the above persisted through a raster engine

pub mod collapse;
pub mod general;
pub mod labels;
pub mod product;
pub mod six_class;
pub mod stats;
pub mod summary;
pub mod transition;

pub use collapse::{
    collapse_classification, CollapseJoinTable, CollapseParams, CollapseRow, TargetCollapse,
    COLLAPSED_NEITHER, COLLAPSED_RETAINED,
};
pub use general::{reclass_frequencies, remap_frequencies, ValueRemap};
pub use labels::{LabelTable, Labels};
pub use product::{
    change_product, collapse_product, engine_stats_params, six_class_product,
    summary_table_product, ChangeProduct,
};
pub use six_class::{
    classify_pair, six_class_classification, ChangeClass, Classification, ClassifiedCode,
    SixClassChange, SixClassParams,
};
pub use stats::{area_hectares, compute_labeled_stats, compute_stats, StatsParams};
pub use summary::{cover_summary, CoverSummary, CoverSummaryRow, YearCover};
pub use transition::{
    build_transition_table, transition_table_from_registry, TransitionRow, TransitionTable,
    NO_CHANGE,
};
