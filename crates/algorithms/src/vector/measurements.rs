//! Geometric measurements

use geo::{Area as GeoArea, Geometry};

/// Unsigned planar area of a geometry.
///
/// Non-polygonal geometry has zero area. Units are CRS units squared, so
/// project to a metric CRS for square metres.
pub fn area(geom: &Geometry<f64>) -> f64 {
    match geom {
        Geometry::Polygon(p) => p.unsigned_area(),
        Geometry::MultiPolygon(mp) => mp.unsigned_area(),
        Geometry::Rect(r) => r.unsigned_area(),
        Geometry::GeometryCollection(gc) => gc.0.iter().map(area).sum(),
        _ => 0.0,
    }
}

/// Summed area of several geometries
pub fn total_area<'a>(geoms: impl IntoIterator<Item = &'a Geometry<f64>>) -> f64 {
    geoms.into_iter().map(area).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, GeometryCollection, LineString, Point};

    #[test]
    fn test_area_with_hole() {
        let block = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 2.0, y: 2.0), (x: 4.0, y: 2.0), (x: 4.0, y: 4.0), (x: 2.0, y: 4.0)]],
        );
        assert!((area(&Geometry::Polygon(block)) - 96.0).abs() < 1e-10);
    }

    #[test]
    fn test_area_non_polygon() {
        let line = Geometry::LineString(LineString::from(vec![(0.0, 0.0), (10.0, 10.0)]));
        assert_eq!(area(&line), 0.0);
        assert_eq!(area(&Geometry::Point(Point::new(1.0, 1.0))), 0.0);
    }

    #[test]
    fn test_total_area() {
        let tri = Geometry::Polygon(polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 5.0, y: 10.0)]);
        let gc = Geometry::GeometryCollection(GeometryCollection::new_from(vec![tri.clone(), tri.clone()]));
        assert!((total_area([&tri, &gc]) - 150.0).abs() < 1e-10);
    }
}
