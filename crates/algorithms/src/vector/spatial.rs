//! Envelopes and dissolve

use geo::{unary_union, BoundingRect, Geometry, MultiPolygon, Polygon, Rect};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Smallest box covering both
    pub fn merge(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}

/// Compute the bounding box of a geometry
pub fn bounding_box(geom: &Geometry<f64>) -> Option<BoundingBox> {
    geom.bounding_rect().map(BoundingBox::from)
}

/// Merge polygons into one dissolved multipolygon.
///
/// Overlapping and touching parts become single polygons, so summed area
/// counts every location once.
pub fn dissolve<'a>(polygons: impl IntoIterator<Item = &'a Polygon<f64>>) -> MultiPolygon<f64> {
    unary_union(polygons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
    }

    #[test]
    fn test_bounding_box() {
        let bb = bounding_box(&Geometry::Polygon(rect(0.0, 0.0, 10.0, 5.0))).unwrap();
        assert_eq!(bb, BoundingBox::new(0.0, 0.0, 10.0, 5.0));
        assert!(bb.contains_point(10.0, 5.0));
        assert!(!bb.contains_point(10.1, 5.0));
    }

    #[test]
    fn test_bounding_box_intersects_and_merge() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.merge(&c), BoundingBox::new(0.0, 0.0, 30.0, 30.0));
    }

    #[test]
    fn test_dissolve_counts_overlap_once() {
        let polys = [rect(0.0, 0.0, 10.0, 10.0), rect(5.0, 0.0, 15.0, 10.0), rect(30.0, 0.0, 31.0, 1.0)];
        let merged = dissolve(&polys);
        assert_eq!(merged.0.len(), 2);
        assert!((merged.unsigned_area() - 151.0).abs() < 1e-4);
    }

    #[test]
    fn test_dissolve_nothing() {
        let merged = dissolve(std::iter::empty());
        assert!(merged.0.is_empty());
    }
}
