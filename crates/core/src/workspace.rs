//! Per-run scratch namespaces.
//!
//! Every pipeline run owns a `ScratchWorkspace` with a fresh run id.
//! Intermediate artifact names are prefixed with `scratch/<run-id>/`, and a
//! [`ScratchGuard`] releases that prefix from the engine when the run ends,
//! whether it succeeded or not.

use crate::engine::GeometryEngine;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Scratch namespace and output directory for one run
#[derive(Debug, Clone)]
pub struct ScratchWorkspace {
    root: PathBuf,
    run_id: Uuid,
}

impl ScratchWorkspace {
    /// Workspace rooted at `root` with a new run id. Does not touch the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            run_id: Uuid::new_v4(),
        }
    }

    /// Like [`ScratchWorkspace::new`], creating `root` if it does not exist
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let ws = Self::new(root);
        if !ws.root.exists() {
            std::fs::create_dir_all(&ws.root)?;
            debug!("Created workspace directory {}", ws.root.display());
        }
        Ok(ws)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Prefix shared by all intermediate artifacts of this run
    pub fn scratch_prefix(&self) -> String {
        format!("scratch/{}/", self.run_id)
    }

    /// Name for an intermediate artifact
    pub fn artifact(&self, name: &str) -> String {
        format!("{}{}", self.scratch_prefix(), name)
    }

    /// Name for an artifact that must outlive the run
    pub fn result(&self, name: &str) -> String {
        format!("results/{}/{}", self.run_id, name)
    }

    /// Guard that releases this run's scratch artifacts when dropped
    pub fn guard<'e, E: GeometryEngine + ?Sized>(&self, engine: &'e E) -> ScratchGuard<'e, E> {
        ScratchGuard {
            engine,
            prefix: self.scratch_prefix(),
            released: false,
        }
    }
}

/// Releases a scratch namespace from its engine on drop
pub struct ScratchGuard<'e, E: GeometryEngine + ?Sized> {
    engine: &'e E,
    prefix: String,
    released: bool,
}

impl<E: GeometryEngine + ?Sized> ScratchGuard<'_, E> {
    /// Release now and report the outcome instead of logging it from `Drop`
    pub fn release(mut self) -> Result<usize> {
        self.released = true;
        self.engine.release(&self.prefix)
    }
}

impl<E: GeometryEngine + ?Sized> Drop for ScratchGuard<'_, E> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match self.engine.release(&self.prefix) {
            Ok(n) => debug!("Released {} scratch artifacts under {}", n, self.prefix),
            Err(e) => warn!("Failed to release scratch namespace {}: {}", self.prefix, e),
        }
    }
}

impl<E: GeometryEngine + ?Sized> std::fmt::Debug for ScratchGuard<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchGuard")
            .field("prefix", &self.prefix)
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_get_distinct_namespaces() {
        let a = ScratchWorkspace::new("/tmp/ws");
        let b = ScratchWorkspace::new("/tmp/ws");
        assert_ne!(a.run_id(), b.run_id());
        assert_ne!(a.artifact("net_harvestable_area"), b.artifact("net_harvestable_area"));
    }

    #[test]
    fn test_artifact_naming() {
        let ws = ScratchWorkspace::new("/tmp/ws");
        let name = ws.artifact("chm_points");
        assert!(name.starts_with(&ws.scratch_prefix()));
        assert!(name.ends_with("/chm_points"));
        assert!(!ws.result("forest_influence").starts_with("scratch/"));
    }

    #[test]
    fn test_create_makes_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("nested").join("ws");
        let ws = ScratchWorkspace::create(&root).unwrap();
        assert!(ws.root().is_dir());
    }
}
