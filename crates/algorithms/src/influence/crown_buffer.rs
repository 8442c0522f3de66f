//! Crown buffers from a generalized height raster

use silva_core::{BufferDistance, BufferSide, GeometryEngine, LayerHandle, Result, ScratchWorkspace};

pub const STAGE: &str = "crown_buffer";

/// Attribute the cell value lands in when the raster becomes points
pub const POINT_VALUE_FIELD: &str = "grid_code";

/// Attribute holding the clamped buffer radius
pub const HEIGHT_FIELD: &str = "Height";

/// Heights below zero (and NaN) become zero; a zero radius yields no buffer.
pub fn clamp_height(value: f64) -> f64 {
    if value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Buffer every cell centre by its height, dissolve, clip to the net area
pub fn build<E: GeometryEngine + ?Sized>(
    engine: &E,
    generalized: &LayerHandle,
    net_area: &LayerHandle,
    ws: &ScratchWorkspace,
) -> Result<LayerHandle> {
    let points = engine.raster_to_points(generalized, POINT_VALUE_FIELD, &ws.artifact("crown_points"))?;
    let heights = engine.derive_field(
        &points,
        POINT_VALUE_FIELD,
        HEIGHT_FIELD,
        &clamp_height,
        &ws.artifact("crown_heights"),
    )?;
    let crowns = engine.buffer(
        &heights,
        &BufferDistance::field(HEIGHT_FIELD),
        BufferSide::Full,
        &ws.artifact("crown_buffers"),
    )?;
    let merged = engine.union(&[&crowns], &ws.artifact("crown_union"))?;
    engine.clip(&merged, net_area, &ws.artifact("forest_influence"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_height() {
        assert_eq!(clamp_height(-3.0), 0.0);
        assert_eq!(clamp_height(0.0), 0.0);
        assert_eq!(clamp_height(17.25), 17.25);
        assert_eq!(clamp_height(f64::NAN), 0.0);
        assert_eq!(clamp_height(-0.0).to_bits(), 0.0_f64.to_bits());
    }
}
