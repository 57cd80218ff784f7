//! # covershift algorithms
//!
//! Transition classification and area statistics for land-cover change.
//!
//! ## Modules
//!
//! - **change**: transition tables, six-class and target-collapse
//!   classification, statistics, general remap, time-series summary, and the
//!   products written through a raster engine
//! - **engine**: an in-memory raster engine

pub mod change;
pub mod engine;
pub(crate) mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::change::{
        build_transition_table, change_product, collapse_classification, collapse_product,
        compute_labeled_stats, compute_stats, cover_summary, remap_frequencies,
        six_class_classification, six_class_product, ChangeClass, CollapseParams, Labels,
        SixClassParams, StatsParams, TransitionTable, ValueRemap,
    };
    pub use crate::engine::MemoryEngine;
    pub use covershift_core::prelude::*;
}
