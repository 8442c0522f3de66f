//! Single trees left standing inside the block

use silva_core::{BufferDistance, BufferSide, GeometryEngine, LayerHandle, Result};
use tracing::{debug, info};

use super::{CutblockContext, InfluenceParams};

pub const STAGE: &str = "single_tree";

/// Influence polygon after single trees were merged in
#[derive(Debug, Clone, PartialEq)]
pub struct Augmented {
    pub influence: Option<LayerHandle>,
    pub single_tree_count: usize,
}

/// Add buffers around the single trees inside the boundary.
///
/// Without a single-tree layer, or with no trees inside the block, the
/// influence polygon is returned unchanged.
///
/// The buffers are not clipped to the net area, so they may cover retention
/// or non-merchantable ground and push the percentage above 100.
pub fn augment<E: GeometryEngine + ?Sized>(
    engine: &E,
    ctx: &CutblockContext,
    influence: Option<LayerHandle>,
    params: &InfluenceParams,
) -> Result<Augmented> {
    let Some(trees) = &ctx.single_trees else {
        debug!("No single tree layer");
        return Ok(Augmented {
            influence,
            single_tree_count: 0,
        });
    };

    let ws = &ctx.workspace;
    let inside = engine.clip(trees, &ctx.boundary, &ws.artifact("single_trees_in_block"))?;
    let count = engine.count(&inside)?;
    info!("{} single trees inside the block", count);
    if count == 0 {
        return Ok(Augmented {
            influence,
            single_tree_count: 0,
        });
    }

    let buffers = engine.buffer(
        &inside,
        &BufferDistance::field(params.single_tree_radius_field.as_str()),
        BufferSide::Full,
        &ws.artifact("single_tree_buffers"),
    )?;
    let out = ws.artifact("influence_with_single_trees");
    let merged = match &influence {
        Some(crowns) => engine.union(&[crowns, &buffers], &out)?,
        None => engine.union(&[&buffers], &out)?,
    };

    Ok(Augmented {
        influence: Some(merged),
        single_tree_count: count,
    })
}
