//! Vector geometry primitives
//!
//! The polygon and point operations behind the in-memory engine:
//! - Buffer: circles around points, offset rings around polygons
//! - Overlay: clip (intersection) and erase (difference)
//! - Dissolve: merge overlapping polygons into one multipolygon
//! - Area: planar area in CRS units squared

mod buffer;
mod clip;
mod measurements;
mod spatial;

pub use buffer::{buffer_outside_of, buffer_point, buffer_polygons, BufferParams};
pub use clip::{clip_polygons, erase_polygons, point_covered};
pub use measurements::{area, total_area};
pub use spatial::{bounding_box, dissolve, BoundingBox};
