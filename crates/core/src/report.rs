//! Forest influence result and the flat report record

use crate::area::{AreaTotals, InfluenceThreshold};
use crate::engine::LayerHandle;
use serde::{Deserialize, Serialize};

/// Outcome of one forest influence run
#[derive(Debug, Clone, PartialEq)]
pub struct ForestInfluenceResult {
    pub block_id: String,
    pub totals: AreaTotals,
    pub influence_percent: f64,
    pub threshold: InfluenceThreshold,
    pub single_tree_count: usize,
    /// Final influence polygon; `None` when neither a tree layer nor a
    /// canopy height model was available
    pub influence_layer: Option<LayerHandle>,
}

impl ForestInfluenceResult {
    /// True iff the influence percentage is strictly above 50
    pub fn threshold_flag(&self) -> bool {
        self.threshold.is_exceeded()
    }

    /// Flatten into the record consumed by report renderers
    pub fn to_record(&self, map_image: Option<String>) -> ReportRecord {
        ReportRecord {
            block_id: self.block_id.clone(),
            gross_area: self.totals.gross().value(),
            retention_area: self.totals.retention.value(),
            non_merch_area: self.totals.non_merch.value(),
            harvestable_area: self.totals.net_harvestable.value(),
            single_tree_count: self.single_tree_count,
            forest_influence_area: self.totals.forest_influence.value(),
            influence_percent: self.influence_percent,
            threshold_message: self.threshold.message().to_string(),
            map_image,
        }
    }
}

/// Report record with the field names renderers expect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    #[serde(rename = "Block ID")]
    pub block_id: String,
    #[serde(rename = "Block gross area")]
    pub gross_area: f64,
    #[serde(rename = "Retention area")]
    pub retention_area: f64,
    #[serde(rename = "Non merch/non forest area")]
    pub non_merch_area: f64,
    #[serde(rename = "Harvestable area")]
    pub harvestable_area: f64,
    #[serde(rename = "Number of single trees")]
    pub single_tree_count: usize,
    #[serde(rename = "Area of Forest Influence")]
    pub forest_influence_area: f64,
    #[serde(rename = "Percent harvestable area covered by Forest Influence")]
    pub influence_percent: f64,
    #[serde(rename = "Forest Influence Threshold Message")]
    pub threshold_message: String,
    #[serde(rename = "Map Image")]
    pub map_image: Option<String>,
}

impl ReportRecord {
    /// `(label, value)` rows in report order, for plain-text output
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Block ID", self.block_id.clone()),
            ("Block gross area", format!("{:.2}", self.gross_area)),
            ("Retention area", format!("{:.2}", self.retention_area)),
            ("Non merch/non forest area", format!("{:.2}", self.non_merch_area)),
            ("Harvestable area", format!("{:.2}", self.harvestable_area)),
            ("Number of single trees", self.single_tree_count.to_string()),
            ("Area of Forest Influence", format!("{:.2}", self.forest_influence_area)),
            (
                "Percent harvestable area covered by Forest Influence",
                format!("{:.2}", self.influence_percent),
            ),
            ("Forest Influence Threshold Message", self.threshold_message.clone()),
            ("Map Image", self.map_image.clone().unwrap_or_default()),
        ]
    }
}

/// Rows that stay valid when the influence percentage is undefined
pub fn rows_without_influence(
    block_id: Option<&str>,
    single_tree_count: Option<usize>,
    totals: &AreaTotals,
) -> Vec<(&'static str, String)> {
    let mut rows = Vec::with_capacity(6);
    if let Some(id) = block_id {
        rows.push(("Block ID", id.to_string()));
    }
    rows.push(("Block gross area", format!("{:.2}", totals.gross().value())));
    rows.push(("Retention area", format!("{:.2}", totals.retention.value())));
    rows.push(("Non merch/non forest area", format!("{:.2}", totals.non_merch.value())));
    rows.push(("Harvestable area", format!("{:.2}", totals.net_harvestable.value())));
    if let Some(count) = single_tree_count {
        rows.push(("Number of single trees", count.to_string()));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::Area;

    fn sample() -> ForestInfluenceResult {
        ForestInfluenceResult {
            block_id: "RB-101".into(),
            totals: AreaTotals {
                net_harvestable: Area::new(8500.0).unwrap(),
                forest_influence: Area::new(4250.0).unwrap(),
                retention: Area::new(500.0).unwrap(),
                non_merch: Area::new(1000.0).unwrap(),
            },
            influence_percent: 50.0,
            threshold: InfluenceThreshold::classify(50.0),
            single_tree_count: 3,
            influence_layer: None,
        }
    }

    #[test]
    fn test_record_fields() {
        let record = sample().to_record(Some("influence.geojson".into()));
        assert_eq!(record.gross_area, 10_000.0);
        assert_eq!(record.threshold_message, "Forest influence is less than 50%");
        assert!(!sample().threshold_flag());
    }

    #[test]
    fn test_record_serializes_report_labels() {
        let json = serde_json::to_value(sample().to_record(None)).unwrap();
        let obj = json.as_object().unwrap();
        for key in [
            "Block ID",
            "Block gross area",
            "Retention area",
            "Non merch/non forest area",
            "Harvestable area",
            "Number of single trees",
            "Area of Forest Influence",
            "Percent harvestable area covered by Forest Influence",
            "Forest Influence Threshold Message",
            "Map Image",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj.len(), 10);
        assert_eq!(obj["Number of single trees"], 3);
    }

    #[test]
    fn test_rows_without_influence() {
        let totals = AreaTotals {
            non_merch: Area::new(1000.0).unwrap(),
            ..Default::default()
        };
        let rows = rows_without_influence(Some("RB-9"), Some(2), &totals);
        let labels: Vec<_> = rows.iter().map(|(label, _)| *label).collect();
        assert_eq!(
            labels,
            [
                "Block ID",
                "Block gross area",
                "Retention area",
                "Non merch/non forest area",
                "Harvestable area",
                "Number of single trees",
            ]
        );
        assert_eq!(rows[0].1, "RB-9");
        assert_eq!(rows[1].1, "1000.00");
        assert_eq!(rows[5].1, "2");

        assert_eq!(rows_without_influence(None, None, &totals).len(), 4);
    }
}
