//! Forest influence estimation
//!
//! Derives the net harvestable area of a cutblock and the polygon covered
//! by crown buffers of the surrounding timber, then reports what share of
//! the net area that polygon covers.
//!
//! Stages, each consuming the artifacts of the previous one:
//! 1. [`registry`]: resolve input layers into a [`CutblockContext`]
//! 2. [`net_area`]: boundary minus non-merchantable minus retention
//! 3. [`crown_source`]: generalized height raster from trees or a CHM
//! 4. [`crown_buffer`]: height-radius buffers clipped to the net area
//! 5. [`single_tree`]: optional single-tree buffers
//! 6. [`aggregate`]: area totals, percentage and threshold
//! 7. [`report`]: the final result
//!
//! All geometry work goes through a [`GeometryEngine`](silva_core::GeometryEngine).

pub mod aggregate;
pub mod crown_buffer;
pub mod crown_source;
pub mod net_area;
mod pipeline;
pub mod registry;
pub mod report;
pub mod single_tree;

pub use crown_source::CrownSource;
pub use pipeline::{estimate, run_forest_influence};
pub use registry::{CutblockContext, InputPaths, LayerRegistry};

use serde::{Deserialize, Serialize};
use silva_core::{Error, ResampleMethod, Result};

/// Tunable constants of the influence pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluenceParams {
    /// Boundary attribute holding the block identifier
    pub block_id_field: String,
    /// Tree layer attribute with tree heights
    pub tree_height_field: String,
    /// Single-tree attribute with the buffer radius
    pub single_tree_radius_field: String,
    /// Cell size of rasterized and resampled height grids
    pub cell_size: f64,
    pub resample_method: ResampleMethod,
    /// Width of the ring around the boundary that tree heights are read from
    pub tree_zone_width: f64,
    /// Signed buffer applied to the boundary before the CHM ring; negative shrinks
    pub chm_inset: f64,
    /// Width of the CHM ring, measured from the inset boundary
    pub chm_zone_width: f64,
}

impl Default for InfluenceParams {
    fn default() -> Self {
        Self {
            block_id_field: "SubSettingName".into(),
            tree_height_field: "RASTERVALU".into(),
            single_tree_radius_field: "RASTERVALU".into(),
            cell_size: 5.0,
            resample_method: ResampleMethod::Bilinear,
            tree_zone_width: 100.0,
            chm_inset: -4.0,
            chm_zone_width: 96.0,
        }
    }
}

impl InfluenceParams {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("cell_size", self.cell_size),
            ("tree_zone_width", self.tree_zone_width),
            ("chm_zone_width", self.chm_zone_width),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidParameter {
                    name,
                    value: value.to_string(),
                    reason: "must be a positive number".into(),
                });
            }
        }
        if !self.chm_inset.is_finite() {
            return Err(Error::InvalidParameter {
                name: "chm_inset",
                value: self.chm_inset.to_string(),
                reason: "must be finite".into(),
            });
        }
        Ok(())
    }
}
