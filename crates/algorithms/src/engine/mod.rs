//! Raster engine implementations

mod memory;

pub use memory::{MemoryEngine, COVER_CLASS_FIELD};
