//! Polygon overlay: clip and erase
//!
//! Both run an envelope test first and skip the boolean operation when the
//! inputs cannot overlap.

use geo::{BooleanOps, BoundingRect, Intersects, MultiPolygon, Point};

use super::spatial::BoundingBox;

fn envelopes_overlap(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
    match (a.bounding_rect(), b.bounding_rect()) {
        (Some(a), Some(b)) => BoundingBox::from(a).intersects(&BoundingBox::from(b)),
        _ => false,
    }
}

/// Parts of `subject` inside `boundary`
pub fn clip_polygons(subject: &MultiPolygon<f64>, boundary: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    if !envelopes_overlap(subject, boundary) {
        return MultiPolygon::new(vec![]);
    }
    subject.intersection(boundary)
}

/// Parts of `subject` outside `eraser`
pub fn erase_polygons(subject: &MultiPolygon<f64>, eraser: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    if !envelopes_overlap(subject, eraser) {
        return subject.clone();
    }
    subject.difference(eraser)
}

/// Whether a point lies inside or on the boundary of `polygons`
pub fn point_covered(point: &Point<f64>, polygons: &MultiPolygon<f64>) -> bool {
    polygons.intersects(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
        ]])
    }

    #[test]
    fn test_clip_overlap() {
        let clipped = clip_polygons(&rect(0.0, 0.0, 10.0, 10.0), &rect(5.0, 5.0, 15.0, 15.0));
        assert!((clipped.unsigned_area() - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_clip_disjoint_is_empty() {
        let clipped = clip_polygons(&rect(0.0, 0.0, 1.0, 1.0), &rect(5.0, 5.0, 6.0, 6.0));
        assert!(clipped.0.is_empty());
    }

    #[test]
    fn test_erase() {
        let erased = erase_polygons(&rect(0.0, 0.0, 100.0, 100.0), &rect(0.0, 0.0, 10.0, 100.0));
        assert!((erased.unsigned_area() - 9000.0).abs() < 1e-3);

        let untouched = erase_polygons(&rect(0.0, 0.0, 1.0, 1.0), &rect(5.0, 5.0, 6.0, 6.0));
        assert_eq!(untouched, rect(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_point_covered_includes_boundary() {
        let block = rect(0.0, 0.0, 10.0, 10.0);
        assert!(point_covered(&Point::new(5.0, 5.0), &block));
        assert!(point_covered(&Point::new(10.0, 5.0), &block));
        assert!(!point_covered(&Point::new(10.5, 5.0), &block));
    }
}
