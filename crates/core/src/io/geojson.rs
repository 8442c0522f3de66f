//! GeoJSON vector I/O
//!
//! Reads `FeatureCollection` and single `Feature` documents, including the
//! legacy named `crs` member that desktop GIS exports still write.
//! Coordinates beyond x/y are ignored.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};
use geo_types::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

type Position = Vec<f64>;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum Document {
    FeatureCollection {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        crs: Option<NamedCrs>,
        features: Vec<RawFeature>,
    },
    Feature(RawFeature),
}

#[derive(Debug, Serialize, Deserialize)]
struct NamedCrs {
    #[serde(rename = "type")]
    kind: String,
    properties: NamedCrsProperties,
}

#[derive(Debug, Serialize, Deserialize)]
struct NamedCrsProperties {
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawFeature {
    #[serde(rename = "type", default = "feature_tag")]
    kind: String,
    geometry: Option<RawGeometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

fn feature_tag() -> String {
    "Feature".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum RawGeometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

fn coord(p: &Position) -> Result<Coord<f64>> {
    match p.as_slice() {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(Error::Other(format!("GeoJSON position needs at least 2 values, got {}", p.len()))),
    }
}

fn line(ps: &[Position]) -> Result<LineString<f64>> {
    ps.iter().map(coord).collect::<Result<Vec<_>>>().map(LineString::new)
}

fn polygon(rings: &[Vec<Position>]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|r| line(r));
    let exterior = rings
        .next()
        .transpose()?
        .ok_or_else(|| Error::Other("GeoJSON polygon has no exterior ring".into()))?;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

impl RawGeometry {
    fn to_geo(&self) -> Result<Geometry<f64>> {
        Ok(match self {
            RawGeometry::Point(p) => Geometry::Point(Point::from(coord(p)?)),
            RawGeometry::MultiPoint(ps) => Geometry::MultiPoint(MultiPoint::new(
                ps.iter().map(|p| coord(p).map(Point::from)).collect::<Result<_>>()?,
            )),
            RawGeometry::LineString(ps) => Geometry::LineString(line(ps)?),
            RawGeometry::MultiLineString(ls) => Geometry::MultiLineString(MultiLineString::new(
                ls.iter().map(|l| line(l)).collect::<Result<_>>()?,
            )),
            RawGeometry::Polygon(rings) => Geometry::Polygon(polygon(rings)?),
            RawGeometry::MultiPolygon(polys) => Geometry::MultiPolygon(MultiPolygon::new(
                polys.iter().map(|p| polygon(p)).collect::<Result<_>>()?,
            )),
        })
    }

    fn from_geo(geom: &Geometry<f64>) -> Option<Self> {
        fn pos(c: &Coord<f64>) -> Position {
            vec![c.x, c.y]
        }
        fn ring(ls: &LineString<f64>) -> Vec<Position> {
            ls.coords().map(pos).collect()
        }
        fn rings(p: &Polygon<f64>) -> Vec<Vec<Position>> {
            std::iter::once(p.exterior()).chain(p.interiors()).map(ring).collect()
        }

        Some(match geom {
            Geometry::Point(p) => RawGeometry::Point(pos(&p.0)),
            Geometry::MultiPoint(mp) => RawGeometry::MultiPoint(mp.iter().map(|p| pos(&p.0)).collect()),
            Geometry::LineString(ls) => RawGeometry::LineString(ring(ls)),
            Geometry::MultiLineString(mls) => RawGeometry::MultiLineString(mls.iter().map(ring).collect()),
            Geometry::Polygon(p) => RawGeometry::Polygon(rings(p)),
            Geometry::MultiPolygon(mp) => RawGeometry::MultiPolygon(mp.iter().map(rings).collect()),
            Geometry::Rect(r) => RawGeometry::Polygon(rings(&r.to_polygon())),
            _ => return None,
        })
    }
}

fn attribute(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => AttributeValue::String(s),
        other => AttributeValue::String(other.to_string()),
    }
}

fn json_value(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Int(i) => Value::from(*i),
        AttributeValue::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
        AttributeValue::String(s) => Value::String(s.clone()),
    }
}

fn convert_feature(raw: RawFeature) -> Result<Feature> {
    let geometry = raw.geometry.as_ref().map(RawGeometry::to_geo).transpose()?;
    let properties: HashMap<String, AttributeValue> = raw
        .properties
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, attribute(v)))
        .collect();
    Ok(Feature { geometry, properties })
}

/// Parse a GeoJSON document
pub fn read_geojson_str(text: &str) -> Result<FeatureCollection> {
    match serde_json::from_str::<Document>(text)? {
        Document::FeatureCollection { crs, features } => Ok(FeatureCollection {
            features: features.into_iter().map(convert_feature).collect::<Result<_>>()?,
            crs: crs.map(|c| CRS::parse(&c.properties.name)),
        }),
        Document::Feature(raw) => Ok(FeatureCollection {
            features: vec![convert_feature(raw)?],
            crs: None,
        }),
    }
}

/// Read a GeoJSON file
pub fn read_geojson<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let text = std::fs::read_to_string(path.as_ref())?;
    read_geojson_str(&text)
}

/// Serialize a collection as a GeoJSON FeatureCollection
pub fn to_geojson_string(collection: &FeatureCollection) -> Result<String> {
    let features = collection
        .iter()
        .map(|f| RawFeature {
            kind: feature_tag(),
            geometry: f.geometry.as_ref().and_then(RawGeometry::from_geo),
            properties: Some(f.properties.iter().map(|(k, v)| (k.clone(), json_value(v))).collect()),
        })
        .collect();
    let crs = collection.crs.as_ref().and_then(CRS::epsg).map(|code| NamedCrs {
        kind: "name".into(),
        properties: NamedCrsProperties {
            name: format!("urn:ogc:def:crs:EPSG::{}", code),
        },
    });
    Ok(serde_json::to_string(&Document::FeatureCollection { crs, features })?)
}

/// Write a collection to a GeoJSON file
pub fn write_geojson<P: AsRef<Path>>(collection: &FeatureCollection, path: P) -> Result<()> {
    std::fs::write(path.as_ref(), to_geojson_string(collection)?)?;
    Ok(())
}
