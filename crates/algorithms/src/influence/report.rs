//! Final result assembly

use silva_core::{AreaTotals, ForestInfluenceResult, InfluenceThreshold, LayerHandle};

pub const STAGE: &str = "report";

/// Package the measured values; performs no computation
pub fn assemble(
    block_id: String,
    totals: AreaTotals,
    influence_percent: f64,
    threshold: InfluenceThreshold,
    single_tree_count: usize,
    influence_layer: Option<LayerHandle>,
) -> ForestInfluenceResult {
    ForestInfluenceResult {
        block_id,
        totals,
        influence_percent,
        threshold,
        single_tree_count,
        influence_layer,
    }
}
