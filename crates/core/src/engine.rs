//! The geometry/raster engine seam.
//!
//! The influence pipeline never touches geometry payloads. It holds
//! [`LayerHandle`]s and asks a [`GeometryEngine`] to derive new layers from
//! them. Every producing call names its output artifact explicitly; callers
//! take those names from a [`ScratchWorkspace`](crate::ScratchWorkspace) so
//! concurrent runs never share intermediates.

use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Geometry kind of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Polygon,
    Point,
    Raster,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LayerKind::Polygon => "polygon",
            LayerKind::Point => "point",
            LayerKind::Raster => "raster",
        })
    }
}

/// Opaque reference to a dataset owned by an engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerHandle {
    name: String,
    kind: LayerKind,
}

impl LayerHandle {
    pub fn new(name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Fail unless this handle refers to a layer of the given kind.
    pub fn expect_kind(&self, expected: LayerKind) -> Result<&Self> {
        if self.kind == expected {
            Ok(self)
        } else {
            Err(Error::LayerKindMismatch {
                name: self.name.clone(),
                expected: expected.to_string(),
                actual: self.kind.to_string(),
            })
        }
    }
}

impl fmt::Display for LayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

/// Buffer radius: one constant for every feature, or read per feature.
#[derive(Debug, Clone, PartialEq)]
pub enum BufferDistance {
    Constant(f64),
    Field(String),
}

impl BufferDistance {
    pub fn field(name: impl Into<String>) -> Self {
        BufferDistance::Field(name.into())
    }
}

/// Which side of the input the buffer covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferSide {
    /// Input geometry plus the buffer ring
    #[default]
    Full,
    /// Only the ring outside the dissolved polygon layer, so no feature's
    /// ring covers another feature of the same layer. Points buffer fully.
    OutsideOnly,
}

/// Raster resampling kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleMethod {
    Nearest,
    #[default]
    Bilinear,
}

/// Primitive operations the influence pipeline relies on.
///
/// Implementations own every layer payload. All calls block until the
/// result exists; failures are reported as [`Error`] and never retried by
/// callers.
pub trait GeometryEngine {
    /// Whether `path` names a dataset the engine can open
    fn exists(&self, path: &str) -> bool;

    /// Register an existing dataset and return its handle
    fn open(&self, path: &str) -> Result<LayerHandle>;

    /// Set difference: parts of `layer` not covered by `eraser`
    fn erase(&self, layer: &LayerHandle, eraser: &LayerHandle, out: &str) -> Result<LayerHandle>;

    /// Set intersection of `layer` with `boundary`
    fn clip(&self, layer: &LayerHandle, boundary: &LayerHandle, out: &str) -> Result<LayerHandle>;

    /// Buffer each feature of `layer`
    fn buffer(
        &self,
        layer: &LayerHandle,
        distance: &BufferDistance,
        side: BufferSide,
        out: &str,
    ) -> Result<LayerHandle>;

    /// Dissolved geometric union of polygon layers
    fn union(&self, layers: &[&LayerHandle], out: &str) -> Result<LayerHandle>;

    /// Resample a raster onto a grid of `cell_size`
    fn resample(
        &self,
        raster: &LayerHandle,
        cell_size: f64,
        method: ResampleMethod,
        out: &str,
    ) -> Result<LayerHandle>;

    /// One point per valid cell, carrying the cell value in `value_field`
    fn raster_to_points(&self, raster: &LayerHandle, value_field: &str, out: &str) -> Result<LayerHandle>;

    /// Rasterize points by `value_field` at `cell_size`
    fn point_to_raster(
        &self,
        points: &LayerHandle,
        value_field: &str,
        cell_size: f64,
        out: &str,
    ) -> Result<LayerHandle>;

    /// Copy of `layer` with numeric attribute `target = map(source)`
    fn derive_field(
        &self,
        layer: &LayerHandle,
        source: &str,
        target: &str,
        map: &dyn Fn(f64) -> f64,
        out: &str,
    ) -> Result<LayerHandle>;

    /// Sum of absolute polygon areas
    fn area_of(&self, layer: &LayerHandle) -> Result<f64>;

    /// Sum of absolute polygon areas over features matching `predicate`
    fn area_where(&self, layer: &LayerHandle, predicate: &dyn Fn(&Feature) -> bool) -> Result<f64>;

    /// Feature count
    fn count(&self, layer: &LayerHandle) -> Result<usize>;

    /// Values of `field`, in feature order; missing values are `Null`
    fn values(&self, layer: &LayerHandle, field: &str) -> Result<Vec<AttributeValue>>;

    /// Duplicate a layer under a new name
    fn copy(&self, layer: &LayerHandle, out: &str) -> Result<LayerHandle>;

    /// Drop every artifact whose name starts with `prefix`; returns how many
    fn release(&self, prefix: &str) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_kind() {
        let chm = LayerHandle::new("chm", LayerKind::Raster);
        assert!(chm.expect_kind(LayerKind::Raster).is_ok());

        let err = chm.expect_kind(LayerKind::Polygon).unwrap_err();
        assert_eq!(err.to_string(), "Layer 'chm' is a raster layer, expected polygon");
    }

    #[test]
    fn test_handle_display() {
        let trees = LayerHandle::new("scratch/run/chm_points", LayerKind::Point);
        assert_eq!(trees.to_string(), "scratch/run/chm_points (point)");
    }
}
