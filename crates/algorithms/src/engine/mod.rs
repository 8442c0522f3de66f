//! In-memory geometry engine
//!
//! [`MemoryEngine`] implements [`GeometryEngine`] over layers held in a
//! name-keyed map. Datasets are loaded from GeoJSON and GeoTIFF files on
//! `open`; every derived layer lives in memory under the output name the
//! caller chose, until `release` drops its prefix.

mod layer;

pub use layer::Layer;

use crate::conversion::{
    mask_raster, raster_to_points, rasterize_points, resample, MaskMode, RasterizeParams, ResampleParams,
    ValuePoint,
};
use crate::maybe_rayon::*;
use crate::vector::{
    buffer_outside_of, buffer_point, buffer_polygons, clip_polygons, dissolve, erase_polygons, point_covered,
    total_area, BufferParams,
};
use geo::{Geometry, MultiPolygon, Point, Polygon};
use silva_core::crs::ensure_compatible;
use silva_core::io::{read_geojson, read_geotiff, write_geojson, write_geotiff, DatasetFormat};
use silva_core::raster::Raster;
use silva_core::{
    AttributeValue, BufferDistance, BufferSide, Error, Feature, FeatureCollection, GeometryEngine, LayerHandle,
    ResampleMethod, Result,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

/// Attribute holding the radius each buffer polygon was built with
pub const BUFFER_DISTANCE_FIELD: &str = "BUFF_DIST";

/// Attribute numbering points produced from raster cells, starting at 1
pub const POINT_ID_FIELD: &str = "pointid";

#[derive(Debug, Clone, Copy)]
enum Overlay {
    Clip,
    Erase,
}

/// Geometry engine holding every layer in memory
#[derive(Debug)]
pub struct MemoryEngine {
    layers: RwLock<HashMap<String, Layer>>,
    segments: usize,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            layers: RwLock::new(HashMap::new()),
            segments: BufferParams::default().segments,
        }
    }

    /// Number of segments used to approximate point buffers
    pub fn with_segments(mut self, segments: usize) -> Self {
        self.segments = segments.max(4);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Layer>> {
        self.layers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Layer>> {
        self.layers.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a layer under `name`, replacing any previous one
    pub fn insert(&self, name: impl Into<String>, layer: impl Into<Layer>) -> LayerHandle {
        let name = name.into();
        let layer = layer.into();
        let handle = LayerHandle::new(name.clone(), layer.kind());
        self.write().insert(name, layer);
        handle
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Names of all stored layers, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of a stored layer
    pub fn layer(&self, handle: &LayerHandle) -> Result<Layer> {
        self.with_layer(handle, |layer| Ok(layer.clone()))
    }

    /// Copy of a stored vector layer's features
    pub fn features(&self, handle: &LayerHandle) -> Result<FeatureCollection> {
        self.with_layer(handle, |layer| layer.features(handle.name()).cloned())
    }

    /// Copy of a stored raster
    pub fn raster(&self, handle: &LayerHandle) -> Result<Raster<f64>> {
        self.with_layer(handle, |layer| layer.raster(handle.name()).cloned())
    }

    /// Write a stored layer to disk: vectors as GeoJSON, rasters as GeoTIFF
    pub fn save(&self, handle: &LayerHandle, path: &Path) -> Result<()> {
        self.with_layer(handle, |layer| match layer {
            Layer::Polygons(fc) | Layer::Points(fc) => write_geojson(fc, path),
            Layer::Raster(r) => write_geotiff(r, path, None),
        })?;
        debug!("Saved {} to {}", handle, path.display());
        Ok(())
    }

    fn with_layer<R>(&self, handle: &LayerHandle, f: impl FnOnce(&Layer) -> Result<R>) -> Result<R> {
        let layers = self.read();
        let layer = layers
            .get(handle.name())
            .ok_or_else(|| Error::LayerNotFound(handle.name().to_string()))?;
        f(layer)
    }

    fn with_pair<R>(
        &self,
        a: &LayerHandle,
        b: &LayerHandle,
        f: impl FnOnce(&Layer, &Layer) -> Result<R>,
    ) -> Result<R> {
        let layers = self.read();
        let get = |h: &LayerHandle| {
            layers
                .get(h.name())
                .ok_or_else(|| Error::LayerNotFound(h.name().to_string()))
        };
        let (la, lb) = (get(a)?, get(b)?);
        ensure_compatible(la.crs(), lb.crs())?;
        f(la, lb)
    }

    fn store(&self, operation: &'static str, out: &str, layer: Layer) -> Result<LayerHandle> {
        if out.trim().is_empty() {
            return Err(Error::engine(operation, "output name is empty"));
        }
        let handle = LayerHandle::new(out, layer.kind());
        debug!("{} -> {}", operation, handle);
        self.write().insert(out.to_string(), layer);
        Ok(handle)
    }

    fn overlay(&self, op: Overlay, layer: &LayerHandle, mask: &LayerHandle, out: &str) -> Result<LayerHandle> {
        let operation = match op {
            Overlay::Clip => "clip",
            Overlay::Erase => "erase",
        };
        let result = self.with_pair(layer, mask, |subject, mask_layer| {
            let mask_polys = mask_layer.polygons(mask.name())?.polygons();
            let mask_polys = dissolve(mask_polys.iter());
            overlay_layer(subject, &mask_polys, op)
        })?;
        self.store(operation, out, result)
    }
}

fn overlay_layer(subject: &Layer, mask: &MultiPolygon<f64>, op: Overlay) -> Result<Layer> {
    match subject {
        Layer::Raster(r) => {
            let mode = match op {
                Overlay::Clip => MaskMode::KeepInside,
                Overlay::Erase => MaskMode::KeepOutside,
            };
            mask_raster(r, mask, mode).map(Layer::Raster)
        }
        Layer::Polygons(fc) => {
            let mut out = FeatureCollection::with_crs(fc.crs.clone());
            for feature in fc.iter() {
                let Some(polys) = feature.polygons() else { continue };
                let kept = match op {
                    Overlay::Clip => clip_polygons(&polys, mask),
                    Overlay::Erase => erase_polygons(&polys, mask),
                };
                if !kept.0.is_empty() {
                    out.push(Feature {
                        geometry: Some(Geometry::MultiPolygon(kept)),
                        properties: feature.properties.clone(),
                    });
                }
            }
            Ok(Layer::Polygons(out))
        }
        Layer::Points(fc) => {
            let keep_covered = matches!(op, Overlay::Clip);
            let features = fc
                .iter()
                .filter(|f| f.point().is_some_and(|p| point_covered(&p, mask) == keep_covered))
                .cloned()
                .collect();
            Ok(Layer::Points(FeatureCollection {
                features,
                crs: fc.crs.clone(),
            }))
        }
    }
}

fn buffer_distance(feature: &Feature, index: usize, distance: &BufferDistance) -> Result<f64> {
    let d = match distance {
        BufferDistance::Constant(d) => *d,
        BufferDistance::Field(name) => feature.number(name).ok_or_else(|| {
            Error::engine("buffer", format!("feature {} has no numeric '{}' value", index, name))
        })?,
    };
    if !d.is_finite() {
        return Err(Error::engine("buffer", format!("feature {} has buffer distance {}", index, d)));
    }
    Ok(d)
}

fn buffered_feature(feature: &Feature, polygons: MultiPolygon<f64>, distance: f64) -> Option<Feature> {
    if polygons.0.is_empty() {
        return None;
    }
    let mut buffered = Feature {
        geometry: Some(Geometry::MultiPolygon(polygons)),
        properties: feature.properties.clone(),
    };
    buffered.set_property(BUFFER_DISTANCE_FIELD, AttributeValue::Float(distance));
    Some(buffered)
}

impl GeometryEngine for MemoryEngine {
    fn exists(&self, path: &str) -> bool {
        let path = path.trim();
        if path.is_empty() {
            return false;
        }
        self.contains(path) || (Path::new(path).is_file() && DatasetFormat::from_path(Path::new(path)).is_some())
    }

    fn open(&self, path: &str) -> Result<LayerHandle> {
        let path = path.trim();
        if let Some(kind) = self.read().get(path).map(Layer::kind) {
            return Ok(LayerHandle::new(path, kind));
        }
        let layer = match DatasetFormat::from_path(Path::new(path)) {
            Some(DatasetFormat::GeoTiff) => Layer::Raster(read_geotiff::<f64, _>(path)?),
            Some(DatasetFormat::GeoJson) => Layer::from(read_geojson(path)?),
            None => return Err(Error::engine("open", format!("unrecognized dataset format: '{}'", path))),
        };
        self.store("open", path, layer)
    }

    fn erase(&self, layer: &LayerHandle, eraser: &LayerHandle, out: &str) -> Result<LayerHandle> {
        self.overlay(Overlay::Erase, layer, eraser, out)
    }

    fn clip(&self, layer: &LayerHandle, boundary: &LayerHandle, out: &str) -> Result<LayerHandle> {
        self.overlay(Overlay::Clip, layer, boundary, out)
    }

    fn buffer(&self, layer: &LayerHandle, distance: &BufferDistance, side: BufferSide, out: &str) -> Result<LayerHandle> {
        let segments = self.segments;
        let result = self.with_layer(layer, |input| {
            let features = match input {
                Layer::Points(fc) => fc
                    .features
                    .par_iter()
                    .enumerate()
                    .map(|(i, feature)| {
                        let Some(point) = feature.point() else { return Ok(None) };
                        let d = buffer_distance(feature, i, distance)?;
                        if d < 0.0 {
                            return Err(Error::engine(
                                "buffer",
                                format!("negative buffer distance {} on point feature {}", d, i),
                            ));
                        }
                        if d == 0.0 {
                            return Ok(None);
                        }
                        let circle = buffer_point(&point, &BufferParams { distance: d, segments });
                        Ok(buffered_feature(feature, MultiPolygon::new(vec![circle]), d))
                    })
                    .collect::<Result<Vec<_>>>()?,
                Layer::Polygons(fc) => {
                    // Rings exclude the whole dissolved layer, not only their own feature
                    let footprint = match side {
                        BufferSide::OutsideOnly => Some(dissolve(fc.polygons().0.iter())),
                        BufferSide::Full => None,
                    };
                    fc.features
                        .par_iter()
                        .enumerate()
                        .map(|(i, feature)| {
                            let Some(polys) = feature.polygons() else { return Ok(None) };
                            let d = buffer_distance(feature, i, distance)?;
                            let grown = match &footprint {
                                Some(footprint) => buffer_outside_of(&polys, d, footprint),
                                None => buffer_polygons(&polys, d, BufferSide::Full),
                            };
                            Ok(buffered_feature(feature, grown, d))
                        })
                        .collect::<Result<Vec<_>>>()?
                }
                Layer::Raster(_) => {
                    return Err(Error::LayerKindMismatch {
                        name: layer.name().to_string(),
                        expected: "polygon or point".into(),
                        actual: input.kind().to_string(),
                    })
                }
            };
            Ok(Layer::Polygons(FeatureCollection {
                features: features.into_iter().flatten().collect(),
                crs: input.crs().cloned(),
            }))
        })?;
        self.store("buffer", out, result)
    }

    fn union(&self, layers: &[&LayerHandle], out: &str) -> Result<LayerHandle> {
        let Some(first) = layers.first() else {
            return Err(Error::engine("union", "no input layers"));
        };
        let merged = {
            let stored = self.read();
            let mut crs = None;
            let mut parts: Vec<Polygon<f64>> = Vec::new();
            for handle in layers {
                let layer = stored
                    .get(handle.name())
                    .ok_or_else(|| Error::LayerNotFound(handle.name().to_string()))?;
                let fc = layer.polygons(handle.name())?;
                if handle.name() == first.name() {
                    crs = fc.crs.clone();
                }
                ensure_compatible(crs.as_ref(), fc.crs.as_ref())?;
                parts.extend(fc.polygons().0);
            }
            let mut fc = FeatureCollection::with_crs(crs);
            let dissolved = dissolve(parts.iter());
            if !dissolved.0.is_empty() {
                fc.push(Feature::new(dissolved));
            }
            fc
        };
        self.store("union", out, Layer::Polygons(merged))
    }

    fn resample(&self, raster: &LayerHandle, cell_size: f64, method: ResampleMethod, out: &str) -> Result<LayerHandle> {
        let result = self.with_layer(raster, |layer| {
            resample(layer.raster(raster.name())?, ResampleParams { cell_size, method })
        })?;
        self.store("resample", out, Layer::Raster(result))
    }

    fn raster_to_points(&self, raster: &LayerHandle, value_field: &str, out: &str) -> Result<LayerHandle> {
        let points = self.with_layer(raster, |layer| {
            let grid = layer.raster(raster.name())?;
            let features = raster_to_points(grid)
                .into_iter()
                .enumerate()
                .map(|(i, p)| {
                    Feature::new(Point::new(p.x, p.y))
                        .with_property(value_field, p.value)
                        .with_property(POINT_ID_FIELD, AttributeValue::Int(i as i64 + 1))
                })
                .collect();
            Ok(FeatureCollection {
                features,
                crs: grid.crs().cloned(),
            })
        })?;
        self.store("raster_to_points", out, Layer::Points(points))
    }

    fn point_to_raster(&self, points: &LayerHandle, value_field: &str, cell_size: f64, out: &str) -> Result<LayerHandle> {
        let grid = self.with_layer(points, |layer| {
            let fc = layer.points(points.name())?;
            let samples: Vec<ValuePoint> = fc
                .iter()
                .filter_map(|f| {
                    let p = f.point()?;
                    Some(ValuePoint::new(p.x(), p.y(), f.number(value_field)?))
                })
                .collect();
            let skipped = fc.len() - samples.len();
            if skipped > 0 {
                warn!("{}: {} points without a numeric '{}' were skipped", points.name(), skipped, value_field);
            }
            let mut grid = rasterize_points(&samples, &RasterizeParams { cell_size })?;
            grid.set_crs(fc.crs.clone());
            Ok(grid)
        })?;
        self.store("point_to_raster", out, Layer::Raster(grid))
    }

    fn derive_field(
        &self,
        layer: &LayerHandle,
        source: &str,
        target: &str,
        map: &dyn Fn(f64) -> f64,
        out: &str,
    ) -> Result<LayerHandle> {
        let derived = self.with_layer(layer, |input| {
            let mut fc = input.features(layer.name())?.clone();
            for (i, feature) in fc.features.iter_mut().enumerate() {
                let value = feature.number(source).ok_or_else(|| {
                    Error::engine("derive_field", format!("feature {} has no numeric '{}' value", i, source))
                })?;
                feature.set_property(target, AttributeValue::Float(map(value)));
            }
            Ok(match input {
                Layer::Points(_) => Layer::Points(fc),
                _ => Layer::Polygons(fc),
            })
        })?;
        self.store("derive_field", out, derived)
    }

    fn area_of(&self, layer: &LayerHandle) -> Result<f64> {
        self.area_where(layer, &|_| true)
    }

    fn area_where(&self, layer: &LayerHandle, predicate: &dyn Fn(&Feature) -> bool) -> Result<f64> {
        self.with_layer(layer, |input| {
            let fc = input.polygons(layer.name())?;
            Ok(total_area(
                fc.iter().filter(|f| predicate(f)).filter_map(|f| f.geometry.as_ref()),
            ))
        })
    }

    fn count(&self, layer: &LayerHandle) -> Result<usize> {
        self.with_layer(layer, |input| {
            Ok(match input {
                Layer::Polygons(fc) | Layer::Points(fc) => fc.len(),
                Layer::Raster(r) => r.valid_cells().count(),
            })
        })
    }

    fn values(&self, layer: &LayerHandle, field: &str) -> Result<Vec<AttributeValue>> {
        self.with_layer(layer, |input| {
            Ok(input
                .features(layer.name())?
                .iter()
                .map(|f| f.get_property(field).cloned().unwrap_or(AttributeValue::Null))
                .collect())
        })
    }

    fn copy(&self, layer: &LayerHandle, out: &str) -> Result<LayerHandle> {
        let copied = self.layer(layer)?;
        self.store("copy", out, copied)
    }

    fn release(&self, prefix: &str) -> Result<usize> {
        if prefix.is_empty() {
            return Err(Error::engine("release", "refusing to release with an empty prefix"));
        }
        let mut layers = self.write();
        let before = layers.len();
        layers.retain(|name, _| !name.starts_with(prefix));
        Ok(before - layers.len())
    }
}
