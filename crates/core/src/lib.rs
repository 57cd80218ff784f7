//! # covershift core
//!
//! Core types for summarizing land-cover change between two categorical
//! classifications.
//!
//! This crate provides:
//! - `Raster<T>`: categorical raster grid with its `GeoTransform`
//! - `Category` / `CategoryRegistry`: value → name tables per time slice
//! - `CoverSchema`: built-in NLCD and general legends
//! - `CodeEncoder`: packing of (start, end) pairs into combined codes
//! - Frequency, statistics and attribute tables
//! - `RasterEngine`: the interface to the external raster engine
//! - Algorithm trait for consistent API

pub mod category;
pub mod code;
pub mod engine;
pub mod error;
pub mod raster;
pub mod schema;
pub mod table;

pub use category::{Category, CategoryEntry, CategoryRegistry, TimeSlice};
pub use code::{CodeEncoder, CombinedCode, DEFAULT_BASE};
pub use engine::{RasterEngine, ReclassMap};
pub use error::{Error, ErrorKind, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use schema::CoverSchema;
pub use table::{AttributeRow, AttributeTable, FieldValue, FrequencyRow, FrequencyTable, StatRow};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::category::{Category, CategoryRegistry, TimeSlice};
    pub use crate::code::{CodeEncoder, CombinedCode};
    pub use crate::engine::RasterEngine;
    pub use crate::error::{Error, Result};
    pub use crate::table::{FrequencyTable, StatRow};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in covershift.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(
        &self,
        input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
