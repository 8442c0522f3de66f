//! Reading and writing layers on disk
//!
//! - GeoTIFF rasters (canopy height models, generalized height grids)
//! - GeoJSON vectors (cutblocks, retention, trees, results)

mod geojson;
mod geotiff;

pub use geojson::{read_geojson, read_geojson_str, to_geojson_string, write_geojson};
pub use geotiff::{read_geotiff, write_geotiff, GeoTiffOptions};

use std::path::Path;

/// On-disk dataset formats recognized by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    GeoTiff,
    GeoJson,
}

impl DatasetFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "tif" | "tiff" => Some(DatasetFormat::GeoTiff),
            "geojson" | "json" => Some(DatasetFormat::GeoJson),
            _ => None,
        }
    }
}
