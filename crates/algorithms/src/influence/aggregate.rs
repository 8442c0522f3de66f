//! Area totals and the threshold test

use silva_core::{Area, AreaTotals, GeometryEngine, InfluenceThreshold, LayerHandle, Result};

pub const STAGE: &str = "aggregate";

/// Measure the four reported areas. A missing influence layer counts as 0.
pub fn totals<E: GeometryEngine + ?Sized>(
    engine: &E,
    net_area: &LayerHandle,
    influence: Option<&LayerHandle>,
    retention: &LayerHandle,
    non_merch: &LayerHandle,
) -> Result<AreaTotals> {
    let measure = |layer: &LayerHandle| engine.area_of(layer).and_then(Area::new);
    Ok(AreaTotals {
        net_harvestable: measure(net_area)?,
        forest_influence: influence.map(measure).transpose()?.unwrap_or(Area::ZERO),
        retention: measure(retention)?,
        non_merch: measure(non_merch)?,
    })
}

/// Influence percentage and its classification.
///
/// A zero net area fails with `DivisionByZero` carrying `totals`.
pub fn classify(totals: &AreaTotals) -> Result<(f64, InfluenceThreshold)> {
    let percent = totals.influence_percent()?;
    Ok((percent, InfluenceThreshold::classify(percent)))
}
