//! Vector features and attribute tables

use crate::crs::CRS;
use crate::engine::LayerKind;
use geo_types::{Geometry, MultiPolygon, Point};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Numeric view of the value; strings that parse as numbers count.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(i) => Some(*i as f64),
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::String(s) => s.trim().parse().ok(),
            AttributeValue::Null | AttributeValue::Bool(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => Ok(()),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::String(s) => f.write_str(s),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    pub properties: HashMap<String, AttributeValue>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: Some(geometry.into()),
            properties: HashMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set_property(key, value.into());
        self
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    /// Numeric attribute, `None` when missing or not numeric
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get_property(key).and_then(AttributeValue::as_f64)
    }

    /// Polygonal part of the geometry, if any
    pub fn polygons(&self) -> Option<MultiPolygon<f64>> {
        match self.geometry.as_ref()? {
            Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
            Geometry::MultiPolygon(mp) => Some(mp.clone()),
            Geometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
            _ => None,
        }
    }

    /// Point geometry, if this is a point feature
    pub fn point(&self) -> Option<Point<f64>> {
        match self.geometry.as_ref()? {
            Geometry::Point(p) => Some(*p),
            _ => None,
        }
    }
}

/// Collection of features sharing one CRS
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    pub crs: Option<CRS>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty collection inheriting another collection's CRS
    pub fn with_crs(crs: Option<CRS>) -> Self {
        Self {
            features: Vec::new(),
            crs,
        }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Layer kind inferred from the first feature with a geometry.
    ///
    /// Empty collections default to polygon layers.
    pub fn kind(&self) -> LayerKind {
        self.features
            .iter()
            .find_map(|f| f.geometry.as_ref())
            .map(|g| match g {
                Geometry::Point(_) | Geometry::MultiPoint(_) => LayerKind::Point,
                _ => LayerKind::Polygon,
            })
            .unwrap_or(LayerKind::Polygon)
    }

    /// All polygonal geometry in the collection, flattened
    pub fn polygons(&self) -> MultiPolygon<f64> {
        MultiPolygon::new(
            self.features
                .iter()
                .filter_map(Feature::polygons)
                .flat_map(|mp| mp.0)
                .collect(),
        )
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
            crs: None,
        }
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;

    #[test]
    fn test_attribute_numbers() {
        assert_eq!(AttributeValue::Int(4).as_f64(), Some(4.0));
        assert_eq!(AttributeValue::from(" 12.5 ").as_f64(), Some(12.5));
        assert_eq!(AttributeValue::Null.as_f64(), None);
        assert_eq!(AttributeValue::from("CWH").to_string(), "CWH");
    }

    #[test]
    fn test_collection_kind() {
        let points: FeatureCollection = vec![Feature::new(Point::new(1.0, 2.0))].into_iter().collect();
        assert_eq!(points.kind(), LayerKind::Point);

        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let polys: FeatureCollection = vec![Feature::new(square)].into_iter().collect();
        assert_eq!(polys.kind(), LayerKind::Polygon);
        assert_eq!(polys.polygons().0.len(), 1);

        assert_eq!(FeatureCollection::new().kind(), LayerKind::Polygon);
    }

    #[test]
    fn test_feature_number() {
        let tree = Feature::new(Point::new(0.0, 0.0)).with_property("RASTERVALU", 21.0);
        assert_eq!(tree.number("RASTERVALU"), Some(21.0));
        assert_eq!(tree.number("missing"), None);
    }
}
