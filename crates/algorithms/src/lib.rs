//! # Silva Algorithms
//!
//! Geometry primitives, the in-memory engine and the forest influence
//! workflows built on them.
//!
//! ## Modules
//!
//! - **vector**: buffer, clip/erase, dissolve, area
//! - **conversion**: rasterize points, raster to points, resample, mask
//! - **engine**: `MemoryEngine`, a [`GeometryEngine`](silva_core::GeometryEngine)
//!   over in-memory layers
//! - **influence**: the forest influence pipeline
//! - **overmature**: immediate overmature share around proposed blocks

pub mod conversion;
pub mod engine;
pub mod influence;
pub(crate) mod maybe_rayon;
pub mod overmature;
pub mod vector;

pub use engine::MemoryEngine;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::engine::{Layer, MemoryEngine};
    pub use crate::influence::{
        estimate, run_forest_influence, CrownSource, CutblockContext, InfluenceParams, InputPaths,
    };
    pub use crate::overmature::{immediate_overmature, OvermatureParams, OvermatureResult};
    pub use silva_core::prelude::*;
}
