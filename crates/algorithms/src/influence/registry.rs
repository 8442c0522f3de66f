//! Input layer resolution
//!
//! Optional layers that are unset, blank or missing resolve to `None`.
//! The three required layers are probed before anything is opened, so a
//! missing one aborts the run before the engine does any work.

use serde::{Deserialize, Serialize};
use silva_core::{Error, GeometryEngine, LayerHandle, LayerKind, Result, ScratchWorkspace};
use std::path::Path;
use tracing::{debug, warn};

/// Stage name reported for resolution failures
pub const STAGE: &str = "layer_registry";

/// Dataset paths for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    pub cutblock: String,
    pub retention: String,
    pub non_merch: String,
    pub tree_layer: Option<String>,
    pub chm: Option<String>,
    pub adjacent_cutblocks: Option<String>,
    pub single_trees: Option<String>,
}

/// Existence probe and opener over an engine
pub struct LayerRegistry<'e, E: GeometryEngine + ?Sized> {
    engine: &'e E,
}

impl<'e, E: GeometryEngine + ?Sized> LayerRegistry<'e, E> {
    pub fn new(engine: &'e E) -> Self {
        Self { engine }
    }

    /// Whether `path` is set, non-blank and known to the engine
    pub fn is_present(&self, path: Option<&str>) -> bool {
        path.map(str::trim)
            .filter(|p| !p.is_empty())
            .is_some_and(|p| self.engine.exists(p))
    }

    /// Open `path` if present; absence is not an error
    pub fn resolve(&self, path: Option<&str>) -> Result<Option<LayerHandle>> {
        if !self.is_present(path) {
            return Ok(None);
        }
        let path = path.map(str::trim).unwrap_or_default();
        self.engine.open(path).map(Some)
    }

    fn optional(&self, role: &str, path: Option<&str>, kind: LayerKind) -> Result<Option<LayerHandle>> {
        let handle = self.resolve(path)?;
        if let Some(h) = &handle {
            h.expect_kind(kind)?;
        }
        debug!(
            "{} layer: {}",
            role,
            handle.as_ref().map_or_else(|| "absent".to_string(), |h| h.to_string())
        );
        Ok(handle)
    }
}

/// Everything one run needs, resolved once
#[derive(Debug, Clone)]
pub struct CutblockContext {
    pub block_id: String,
    pub boundary: LayerHandle,
    pub retention: LayerHandle,
    pub non_merch: LayerHandle,
    pub tree_layer: Option<LayerHandle>,
    pub chm: Option<LayerHandle>,
    pub adjacent_cutblocks: Option<LayerHandle>,
    pub single_trees: Option<LayerHandle>,
    pub workspace: ScratchWorkspace,
}

impl CutblockContext {
    /// Resolve every input layer and read the block identifier.
    ///
    /// Raises `MissingRequiredLayer` for an absent boundary, retention or
    /// non-merchantable layer before opening any layer.
    pub fn resolve<E: GeometryEngine + ?Sized>(
        engine: &E,
        paths: &InputPaths,
        workspace: ScratchWorkspace,
        block_id_field: &str,
    ) -> Result<Self> {
        let registry = LayerRegistry::new(engine);

        let required = [
            ("boundary", paths.cutblock.as_str()),
            ("retention", paths.retention.as_str()),
            ("non-merchantable", paths.non_merch.as_str()),
        ];
        for (role, path) in required {
            if !registry.is_present(Some(path)) {
                return Err(Error::MissingRequiredLayer {
                    role,
                    path: path.to_string(),
                });
            }
        }

        let open_required = |role: &'static str, path: &str| -> Result<LayerHandle> {
            let handle = registry
                .resolve(Some(path))
                .map_err(|e| e.in_stage(STAGE))?
                .ok_or_else(|| Error::MissingRequiredLayer {
                    role,
                    path: path.to_string(),
                })?;
            handle.expect_kind(LayerKind::Polygon).map_err(|e| e.in_stage(STAGE))?;
            Ok(handle)
        };
        let boundary = open_required("boundary", &paths.cutblock)?;
        let retention = open_required("retention", &paths.retention)?;
        let non_merch = open_required("non-merchantable", &paths.non_merch)?;

        let optional = |role: &str, path: &Option<String>, kind: LayerKind| {
            registry
                .optional(role, path.as_deref(), kind)
                .map_err(|e| e.in_stage(STAGE))
        };
        let tree_layer = optional("tree", &paths.tree_layer, LayerKind::Point)?;
        let chm = optional("canopy height", &paths.chm, LayerKind::Raster)?;
        let adjacent_cutblocks = optional("adjacent cutblocks", &paths.adjacent_cutblocks, LayerKind::Polygon)?;
        let single_trees = optional("single tree", &paths.single_trees, LayerKind::Point)?;

        let block_id = read_block_id(engine, &boundary, block_id_field, &paths.cutblock)
            .map_err(|e| e.in_stage(STAGE))?;
        debug!("Block id: {}", block_id);

        Ok(Self {
            block_id,
            boundary,
            retention,
            non_merch,
            tree_layer,
            chm,
            adjacent_cutblocks,
            single_trees,
            workspace,
        })
    }
}

/// First non-empty value of `field` in the boundary layer, or the file stem
fn read_block_id<E: GeometryEngine + ?Sized>(
    engine: &E,
    boundary: &LayerHandle,
    field: &str,
    path: &str,
) -> Result<String> {
    let first = engine
        .values(boundary, field)?
        .into_iter()
        .find(|v| !v.is_null())
        .map(|v| v.to_string())
        .filter(|s| !s.trim().is_empty());

    Ok(first.unwrap_or_else(|| {
        let stem = Path::new(path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(path)
            .to_string();
        warn!("Boundary has no '{}' value; using '{}' as block id", field, stem);
        stem
    }))
}
