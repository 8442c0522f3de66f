//! Immediate overmature share around proposed blocks
//!
//! Measures how much of the vegetation within a fixed distance of a set
//! of proposed blocks is old enough to count as overmature for its
//! biogeoclimatic zone.

use serde::{Deserialize, Serialize};
use silva_core::{
    Area, AttributeValue, BufferDistance, BufferSide, Error, Feature, GeometryEngine, LayerHandle, LayerKind,
    Result, ScratchWorkspace,
};
use tracing::{debug, info};

/// Minimum stand age, exclusive, for a zone to count as overmature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeRule {
    pub zone: String,
    pub older_than: f64,
}

impl AgeRule {
    pub fn new(zone: impl Into<String>, older_than: f64) -> Self {
        Self {
            zone: zone.into(),
            older_than,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OvermatureParams {
    pub block_id_field: String,
    pub zone_field: String,
    pub age_field: String,
    /// Distance around the blocks that vegetation is sampled from
    pub ring_width: f64,
    pub rules: Vec<AgeRule>,
}

impl Default for OvermatureParams {
    fn default() -> Self {
        Self {
            block_id_field: "SubSettingName".into(),
            zone_field: "BGC_ZONE".into(),
            age_field: "PROJ_AGE".into(),
            ring_width: 2000.0,
            rules: vec![AgeRule::new("CWH", 80.0), AgeRule::new("MH", 120.0)],
        }
    }
}

impl OvermatureParams {
    /// Whether a vegetation polygon is overmature under these rules
    pub fn is_overmature(&self, feature: &Feature) -> bool {
        let zone = feature.get_property(&self.zone_field).and_then(AttributeValue::as_str);
        let age = feature.number(&self.age_field);
        match (zone, age) {
            (Some(zone), Some(age)) => self.rules.iter().any(|r| r.zone == zone.trim() && age > r.older_than),
            _ => false,
        }
    }
}

/// Result of one overmature assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvermatureResult {
    #[serde(rename = "Block_ID")]
    pub block_ids: String,
    #[serde(rename = "Total_Area")]
    pub total_area: Area,
    #[serde(rename = "Overmature_Area")]
    pub overmature_area: Area,
    #[serde(rename = "Immediate_OM")]
    pub percent: f64,
}

/// Share of vegetation area within `params.ring_width` of the blocks that
/// is overmature, in percent.
///
/// Fails with `DivisionByZero` when no vegetation falls inside the ring.
pub fn immediate_overmature<E: GeometryEngine + ?Sized>(
    engine: &E,
    blocks: &LayerHandle,
    vegetation: &LayerHandle,
    workspace: &ScratchWorkspace,
    params: &OvermatureParams,
) -> Result<OvermatureResult> {
    if !(params.ring_width.is_finite() && params.ring_width > 0.0) {
        return Err(Error::InvalidParameter {
            name: "ring_width",
            value: params.ring_width.to_string(),
            reason: "must be a positive number".into(),
        });
    }
    blocks.expect_kind(LayerKind::Polygon)?;
    vegetation.expect_kind(LayerKind::Polygon)?;
    let _guard = workspace.guard(engine);

    let block_ids = engine
        .values(blocks, &params.block_id_field)?
        .iter()
        .filter(|v| !v.is_null())
        .map(AttributeValue::to_string)
        .collect::<Vec<_>>()
        .join(";");
    info!("Assessing immediate overmature around {}", block_ids);

    let ring = engine.buffer(
        blocks,
        &BufferDistance::Constant(params.ring_width),
        BufferSide::OutsideOnly,
        &workspace.artifact("overmature_ring"),
    )?;
    let zone = engine.union(&[&ring], &workspace.artifact("overmature_zone"))?;
    let sampled = engine.clip(vegetation, &zone, &workspace.artifact("overmature_vegetation"))?;

    let total_area = Area::new(engine.area_of(&sampled)?)?;
    let overmature_area = Area::new(engine.area_where(&sampled, &|f| params.is_overmature(f))?)?;
    debug!("Vegetation {} of which overmature {}", total_area, overmature_area);

    let percent = overmature_area.percent_of(total_area, "vegetation area around the blocks")?;
    info!("Immediate overmature value is {:.2}%", percent);

    Ok(OvermatureResult {
        block_ids,
        total_area,
        overmature_area,
        percent,
    })
}
