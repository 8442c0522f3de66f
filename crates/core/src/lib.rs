//! # Silva Core
//!
//! Core types, traits and I/O for the Silva forest influence estimator.
//!
//! This crate provides:
//! - `Raster<T>`: Generic georeferenced raster grid
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `CRS`: Coordinate Reference System handling
//! - `Feature` / `FeatureCollection`: vector layers with attributes
//! - `GeometryEngine`: the seam between the influence pipeline and whatever
//!   performs buffering, clipping, erasing and raster conversion
//! - `ScratchWorkspace`: per-run artifact namespace
//! - `Area`, `AreaTotals` and the report record handed to renderers
//! - I/O for GeoTIFF rasters and GeoJSON vectors

pub mod area;
pub mod crs;
pub mod engine;
pub mod error;
pub mod io;
pub mod raster;
pub mod report;
pub mod vector;
pub mod workspace;

pub use area::{Area, AreaTotals, InfluenceThreshold};
pub use crs::CRS;
pub use engine::{BufferDistance, BufferSide, GeometryEngine, LayerHandle, LayerKind, ResampleMethod};
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use report::{rows_without_influence, ForestInfluenceResult, ReportRecord};
pub use vector::{AttributeValue, Feature, FeatureCollection};
pub use workspace::{ScratchGuard, ScratchWorkspace};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::area::{Area, AreaTotals, InfluenceThreshold};
    pub use crate::crs::CRS;
    pub use crate::engine::{
        BufferDistance, BufferSide, GeometryEngine, LayerHandle, LayerKind, ResampleMethod,
    };
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::vector::{AttributeValue, Feature, FeatureCollection};
    pub use crate::workspace::{ScratchGuard, ScratchWorkspace};
}
