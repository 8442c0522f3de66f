//! Layer payloads held by the in-memory engine

use silva_core::raster::Raster;
use silva_core::{Error, FeatureCollection, LayerKind, Result, CRS};

/// A stored dataset
#[derive(Debug, Clone)]
pub enum Layer {
    Polygons(FeatureCollection),
    Points(FeatureCollection),
    Raster(Raster<f64>),
}

impl Layer {
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Polygons(_) => LayerKind::Polygon,
            Layer::Points(_) => LayerKind::Point,
            Layer::Raster(_) => LayerKind::Raster,
        }
    }

    pub fn crs(&self) -> Option<&CRS> {
        match self {
            Layer::Polygons(fc) | Layer::Points(fc) => fc.crs.as_ref(),
            Layer::Raster(r) => r.crs(),
        }
    }

    /// Features of a polygon or point layer
    pub fn features(&self, name: &str) -> Result<&FeatureCollection> {
        match self {
            Layer::Polygons(fc) | Layer::Points(fc) => Ok(fc),
            Layer::Raster(_) => Err(self.mismatch(name, "vector")),
        }
    }

    /// Features of a polygon layer
    pub fn polygons(&self, name: &str) -> Result<&FeatureCollection> {
        match self {
            Layer::Polygons(fc) => Ok(fc),
            _ => Err(self.mismatch(name, "polygon")),
        }
    }

    /// Features of a point layer
    pub fn points(&self, name: &str) -> Result<&FeatureCollection> {
        match self {
            Layer::Points(fc) => Ok(fc),
            _ => Err(self.mismatch(name, "point")),
        }
    }

    pub fn raster(&self, name: &str) -> Result<&Raster<f64>> {
        match self {
            Layer::Raster(r) => Ok(r),
            _ => Err(self.mismatch(name, "raster")),
        }
    }

    fn mismatch(&self, name: &str, expected: &str) -> Error {
        Error::LayerKindMismatch {
            name: name.to_string(),
            expected: expected.to_string(),
            actual: self.kind().to_string(),
        }
    }
}

impl From<FeatureCollection> for Layer {
    /// Point or polygon layer, by the collection's first geometry
    fn from(fc: FeatureCollection) -> Self {
        match fc.kind() {
            LayerKind::Point => Layer::Points(fc),
            _ => Layer::Polygons(fc),
        }
    }
}

impl From<Raster<f64>> for Layer {
    fn from(raster: Raster<f64>) -> Self {
        Layer::Raster(raster)
    }
}
