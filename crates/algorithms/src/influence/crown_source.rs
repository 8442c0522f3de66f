//! Generalized height raster around the cutblock
//!
//! Two sources can describe the timber next to a block: a point layer of
//! measured trees, or a canopy height model. Either way the result is a
//! height raster on the configured cell size, restricted to a ring around
//! the boundary and with foreign cutblocks cut out.

use silva_core::{BufferDistance, BufferSide, GeometryEngine, LayerHandle, Result};
use std::fmt;
use tracing::debug;

use super::{CutblockContext, InfluenceParams};

pub const STAGE: &str = "crown_source";

/// Where crown heights come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrownSource {
    /// Point layer of trees with a height attribute
    TreeLayer(LayerHandle),
    /// Canopy height model raster
    CanopyHeight(LayerHandle),
}

impl CrownSource {
    /// The tree layer wins; the CHM is only used without one.
    pub fn select(tree_layer: Option<&LayerHandle>, chm: Option<&LayerHandle>) -> Option<Self> {
        match (tree_layer, chm) {
            (Some(trees), _) => Some(CrownSource::TreeLayer(trees.clone())),
            (None, Some(chm)) => Some(CrownSource::CanopyHeight(chm.clone())),
            (None, None) => None,
        }
    }

    pub fn layer(&self) -> &LayerHandle {
        match self {
            CrownSource::TreeLayer(h) | CrownSource::CanopyHeight(h) => h,
        }
    }

    /// Build the generalized height raster for this source
    pub fn generalize<E: GeometryEngine + ?Sized>(
        &self,
        engine: &E,
        ctx: &CutblockContext,
        params: &InfluenceParams,
    ) -> Result<LayerHandle> {
        let ws = &ctx.workspace;
        let zoned = match self {
            CrownSource::TreeLayer(trees) => {
                let raster = engine.point_to_raster(
                    trees,
                    &params.tree_height_field,
                    params.cell_size,
                    &ws.artifact("tree_height_raster"),
                )?;
                let ring = engine.buffer(
                    &ctx.boundary,
                    &BufferDistance::Constant(params.tree_zone_width),
                    BufferSide::OutsideOnly,
                    &ws.artifact("tree_zone_ring"),
                )?;
                let zone = engine.union(&[&ring], &ws.artifact("tree_zone"))?;
                let clipped = engine.clip(&raster, &zone, &ws.artifact("tree_height_zone"))?;
                match &ctx.adjacent_cutblocks {
                    Some(adjacent) => engine.erase(&clipped, adjacent, &ws.artifact("tree_height_open"))?,
                    None => clipped,
                }
            }
            CrownSource::CanopyHeight(chm) => {
                let inset = engine.buffer(
                    &ctx.boundary,
                    &BufferDistance::Constant(params.chm_inset),
                    BufferSide::Full,
                    &ws.artifact("chm_inset"),
                )?;
                let ring = engine.buffer(
                    &inset,
                    &BufferDistance::Constant(params.chm_zone_width),
                    BufferSide::OutsideOnly,
                    &ws.artifact("chm_zone_ring"),
                )?;
                let mut zone = engine.union(&[&ring], &ws.artifact("chm_zone"))?;
                if let Some(adjacent) = &ctx.adjacent_cutblocks {
                    let foreign = engine.erase(adjacent, &ctx.boundary, &ws.artifact("foreign_cutblocks"))?;
                    zone = engine.erase(&zone, &foreign, &ws.artifact("chm_zone_open"))?;
                }
                engine.clip(chm, &zone, &ws.artifact("chm_zone_raster"))?
            }
        };

        let generalized = engine.resample(
            &zoned,
            params.cell_size,
            params.resample_method,
            &ws.artifact("generalized_height"),
        )?;
        debug!("Generalized height raster from {}: {}", self, generalized);
        Ok(generalized)
    }
}

impl fmt::Display for CrownSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrownSource::TreeLayer(h) => write!(f, "tree layer {}", h.name()),
            CrownSource::CanopyHeight(h) => write!(f, "canopy height model {}", h.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silva_core::LayerKind;

    #[test]
    fn test_select_prefers_tree_layer() {
        let trees = LayerHandle::new("trees", LayerKind::Point);
        let chm = LayerHandle::new("chm", LayerKind::Raster);

        assert_eq!(
            CrownSource::select(Some(&trees), Some(&chm)),
            Some(CrownSource::TreeLayer(trees.clone()))
        );
        assert_eq!(CrownSource::select(None, Some(&chm)), Some(CrownSource::CanopyHeight(chm)));
        assert_eq!(CrownSource::select(None, None), None);
        assert_eq!(CrownSource::TreeLayer(trees).to_string(), "tree layer trees");
    }
}
