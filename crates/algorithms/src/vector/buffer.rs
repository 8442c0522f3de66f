//! Buffer operations
//!
//! Points become regular polygons approximating a circle. Polygons are
//! offset with round joins; the outside-only variant keeps just the ring
//! between the input boundary and the offset line.

use geo::{BooleanOps, Buffer, LineString, MultiPolygon, Point, Polygon};
use silva_core::BufferSide;
use std::f64::consts::PI;

/// Parameters for point buffers
#[derive(Debug, Clone)]
pub struct BufferParams {
    /// Buffer radius
    pub distance: f64,
    /// Number of segments approximating the circle (default: 64)
    pub segments: usize,
}

impl Default for BufferParams {
    fn default() -> Self {
        Self {
            distance: 1.0,
            segments: 64,
        }
    }
}

/// Create a circular buffer around a point.
///
/// The circle is inscribed: vertices lie on the true circle, so the
/// polygon area is slightly below `π r²` (about 0.16% at 64 segments).
pub fn buffer_point(point: &Point<f64>, params: &BufferParams) -> Polygon<f64> {
    let n = params.segments.max(4);
    let r = params.distance.abs();
    let (cx, cy) = (point.x(), point.y());

    let mut coords: Vec<(f64, f64)> = (0..n)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / n as f64;
            (cx + r * angle.cos(), cy + r * angle.sin())
        })
        .collect();
    coords.push(coords[0]);

    Polygon::new(LineString::from(coords), vec![])
}

/// Buffer a polygon set by `distance` (negative shrinks).
///
/// With [`BufferSide::OutsideOnly`] the input itself is removed from the
/// result, leaving the ring around it. For a negative distance that ring is
/// empty.
pub fn buffer_polygons(polygons: &MultiPolygon<f64>, distance: f64, side: BufferSide) -> MultiPolygon<f64> {
    match side {
        BufferSide::Full => grow(polygons, distance),
        BufferSide::OutsideOnly => buffer_outside_of(polygons, distance, polygons),
    }
}

/// Ring of `polygons` grown by `distance`, minus all of `footprint`.
///
/// `footprint` is the dissolved layer the polygons belong to, so a ring
/// never covers a neighbouring feature of the same layer.
pub fn buffer_outside_of(
    polygons: &MultiPolygon<f64>,
    distance: f64,
    footprint: &MultiPolygon<f64>,
) -> MultiPolygon<f64> {
    grow(polygons, distance).difference(footprint)
}

fn grow(polygons: &MultiPolygon<f64>, distance: f64) -> MultiPolygon<f64> {
    if polygons.0.is_empty() {
        MultiPolygon::new(vec![])
    } else if distance == 0.0 {
        polygons.clone()
    } else {
        polygons.buffer(distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area};

    fn square(size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: size, y: 0.0),
            (x: size, y: size),
            (x: 0.0, y: size),
        ]])
    }

    #[test]
    fn test_buffer_point_circle() {
        let polygon = buffer_point(&Point::new(0.0, 0.0), &BufferParams { distance: 10.0, segments: 64 });

        let expected_area = PI * 100.0;
        let error = (polygon.unsigned_area() - expected_area).abs() / expected_area;
        assert!(error < 0.01, "Circle area error {:.2}%", error * 100.0);
        // Closed ring
        assert_eq!(polygon.exterior().0.len(), 65);
    }

    #[test]
    fn test_buffer_point_negative_radius_uses_magnitude() {
        let a = buffer_point(&Point::new(3.0, 3.0), &BufferParams { distance: -2.0, segments: 32 });
        let b = buffer_point(&Point::new(3.0, 3.0), &BufferParams { distance: 2.0, segments: 32 });
        assert_eq!(a, b);
    }

    #[test]
    fn test_buffer_polygon_full() {
        let grown = buffer_polygons(&square(10.0), 5.0, BufferSide::Full);
        // square + edge strips + rounded corners
        let expected = 100.0 + 4.0 * 50.0 + PI * 25.0;
        assert!((grown.unsigned_area() - expected).abs() / expected < 0.01);
    }

    #[test]
    fn test_buffer_polygon_outside_only() {
        let ring = buffer_polygons(&square(10.0), 5.0, BufferSide::OutsideOnly);
        let expected = 4.0 * 50.0 + PI * 25.0;
        assert!((ring.unsigned_area() - expected).abs() / expected < 0.01);
    }

    #[test]
    fn test_buffer_polygon_inset() {
        let inset = buffer_polygons(&square(10.0), -2.0, BufferSide::Full);
        assert!((inset.unsigned_area() - 36.0).abs() < 0.5);

        let ring = buffer_polygons(&square(10.0), -2.0, BufferSide::OutsideOnly);
        assert!(ring.unsigned_area() < 1e-6);
    }

    #[test]
    fn test_buffer_empty_input() {
        let empty = MultiPolygon::<f64>::new(vec![]);
        assert!(buffer_polygons(&empty, 10.0, BufferSide::Full).0.is_empty());
    }

    #[test]
    fn test_buffer_outside_of_excludes_neighbours() {
        let west = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0), (x: 50.0, y: 0.0), (x: 50.0, y: 100.0), (x: 0.0, y: 100.0),
        ]]);
        let block = square(100.0);

        // West half's own ring spills over the east half
        let own = buffer_polygons(&west, 20.0, BufferSide::OutsideOnly);
        assert!(own.unsigned_area() > 50.0 * 100.0);

        let ring = buffer_outside_of(&west, 20.0, &block);
        assert!(ring.intersection(&block).unsigned_area() < 1e-6);
        // west, north and south strips plus four quarter circles; nothing inside the block
        let expected = 20.0 * 100.0 + 2.0 * 20.0 * 50.0 + PI * 400.0;
        assert!((ring.unsigned_area() - expected).abs() / expected < 0.01);
    }
}
