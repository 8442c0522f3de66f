//! Net harvestable area

use silva_core::{GeometryEngine, LayerHandle, Result};
use tracing::debug;

use super::CutblockContext;

pub const STAGE: &str = "net_area";

/// Boundary minus non-merchantable minus retention.
///
/// Two sequential erases equal one erase by the union of both layers, so
/// ground that is both retention and non-merchantable is removed once.
pub fn compute<E: GeometryEngine + ?Sized>(engine: &E, ctx: &CutblockContext) -> Result<LayerHandle> {
    let ws = &ctx.workspace;
    let merch = engine.erase(&ctx.boundary, &ctx.non_merch, &ws.artifact("boundary_without_non_merch"))?;
    let net = engine.erase(&merch, &ctx.retention, &ws.artifact("net_harvestable_area"))?;
    debug!("Net harvestable area layer: {}", net);
    Ok(net)
}
