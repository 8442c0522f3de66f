//! Stage orchestration

use silva_core::{ForestInfluenceResult, GeometryEngine, Result, ScratchWorkspace};
use tracing::{debug, info, warn};

use super::{
    aggregate, crown_buffer, crown_source, net_area, registry, report, single_tree, CrownSource, CutblockContext,
    InfluenceParams, InputPaths,
};

/// Name of the persisted influence polygon under the run's results prefix
pub const RESULT_LAYER: &str = "forest_influence";

/// Resolve the inputs named in `paths` and estimate forest influence
pub fn run_forest_influence<E: GeometryEngine + ?Sized>(
    engine: &E,
    paths: &InputPaths,
    workspace: ScratchWorkspace,
    params: &InfluenceParams,
) -> Result<ForestInfluenceResult> {
    params.validate()?;
    let ctx = CutblockContext::resolve(engine, paths, workspace, &params.block_id_field)
        .map_err(|e| e.in_stage(registry::STAGE))?;
    estimate(engine, &ctx, params)
}

/// Run every stage for an already resolved context.
///
/// Intermediate artifacts live under the context's scratch prefix and are
/// released when this returns, on success or failure. The influence
/// polygon, if any, is first copied to `results/<run-id>/forest_influence`.
pub fn estimate<E: GeometryEngine + ?Sized>(
    engine: &E,
    ctx: &CutblockContext,
    params: &InfluenceParams,
) -> Result<ForestInfluenceResult> {
    params.validate()?;
    let ws = &ctx.workspace;
    let guard = ws.guard(engine);
    info!("Estimating forest influence for block {} (run {})", ctx.block_id, ws.run_id());

    let net = net_area::compute(engine, ctx).map_err(|e| e.in_stage(net_area::STAGE))?;
    info!("Net harvestable area determined");

    let influence = match CrownSource::select(ctx.tree_layer.as_ref(), ctx.chm.as_ref()) {
        Some(source) => {
            info!("Crown heights from {}", source);
            let generalized = source
                .generalize(engine, ctx, params)
                .map_err(|e| e.in_stage(crown_source::STAGE))?;
            let polygon = crown_buffer::build(engine, &generalized, &net, ws)
                .map_err(|e| e.in_stage(crown_buffer::STAGE))?;
            info!("Forest influence polygon built");
            Some(polygon)
        }
        None => {
            warn!("Neither a tree layer nor a canopy height model is available; forest influence is 0");
            None
        }
    };

    let augmented =
        single_tree::augment(engine, ctx, influence, params).map_err(|e| e.in_stage(single_tree::STAGE))?;

    let totals = aggregate::totals(
        engine,
        &net,
        augmented.influence.as_ref(),
        &ctx.retention,
        &ctx.non_merch,
    )
    .map_err(|e| e.in_stage(aggregate::STAGE))?;
    let (percent, threshold) = aggregate::classify(&totals)
        .map_err(|e| e.for_block(&ctx.block_id, augmented.single_tree_count))?;
    info!(
        "Net area {}, influence {} ({:.2}%): {}",
        totals.net_harvestable,
        totals.forest_influence,
        percent,
        threshold.message()
    );

    let influence_layer = augmented
        .influence
        .as_ref()
        .map(|layer| engine.copy(layer, &ws.result(RESULT_LAYER)))
        .transpose()
        .map_err(|e| e.in_stage(report::STAGE))?;

    let result = report::assemble(
        ctx.block_id.clone(),
        totals,
        percent,
        threshold,
        augmented.single_tree_count,
        influence_layer,
    );

    match guard.release() {
        Ok(n) => debug!("Released {} scratch artifacts", n),
        Err(e) => warn!("Scratch artifacts were not released: {}", e),
    }
    Ok(result)
}
