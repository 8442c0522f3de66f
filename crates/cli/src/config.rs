//! TOML run files
//!
//! ```toml
//! workspace = "runs/rb-101"
//!
//! [inputs]
//! cutblock = "data/cutblock.geojson"
//! retention = "data/retention.geojson"
//! non_merch = "data/non_merch.geojson"
//! chm = "data/chm.tif"
//!
//! [influence]
//! cell_size = 5.0
//! resample_method = "bilinear"
//!
//! [overmature]
//! ring_width = 2000.0
//! ```
//!
//! Every section is optional. Command line flags override values read here.

use anyhow::{Context, Result};
use serde::Deserialize;
use silva_algorithms::influence::{InfluenceParams, InputPaths};
use silva_algorithms::overmature::OvermatureParams;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Directory receiving reports and exported layers
    pub workspace: Option<PathBuf>,
    pub inputs: InputPaths,
    /// Vegetation inventory for the overmature assessment
    pub vegetation: Option<String>,
    pub influence: InfluenceParams,
    pub overmature: OvermatureParams,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read run file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid run file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Replace `slot` with `value` when a flag was given
pub fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}
