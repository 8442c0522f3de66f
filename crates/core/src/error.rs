//! Error types for Silva

use crate::area::AreaTotals;
use thiserror::Error;

/// Main error type for Silva operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A boundary, retention or non-merchantable layer could not be resolved.
    #[error("Required {role} layer is missing: '{path}'")]
    MissingRequiredLayer { role: &'static str, path: String },

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Layer '{name}' is a {actual} layer, expected {expected}")]
    LayerKindMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// A primitive failed inside the geometry engine.
    #[error("{operation} failed: {reason}")]
    Engine {
        operation: &'static str,
        reason: String,
    },

    /// An engine failure, tagged with the pipeline stage that issued the call.
    #[error("Geometry operation failed during {stage}: {source}")]
    GeometryOperation {
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// A zero-valued area was used as a divisor.
    ///
    /// `totals`, `block_id` and `single_tree_count` hold whatever was
    /// already known, so the remaining fields can still be reported.
    #[error("Division by zero: {quantity} is 0")]
    DivisionByZero {
        quantity: &'static str,
        totals: Option<Box<AreaTotals>>,
        block_id: Option<String>,
        single_tree_count: Option<usize>,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for an engine primitive failure.
    pub fn engine(operation: &'static str, reason: impl Into<String>) -> Self {
        Error::Engine {
            operation,
            reason: reason.into(),
        }
    }

    /// Tag this error with the pipeline stage it surfaced in.
    ///
    /// Errors that already carry a stage, and errors that are not engine
    /// failures (`MissingRequiredLayer`, `DivisionByZero`), pass through
    /// unchanged.
    pub fn in_stage(self, stage: &'static str) -> Self {
        match self {
            Error::GeometryOperation { .. }
            | Error::MissingRequiredLayer { .. }
            | Error::DivisionByZero { .. } => self,
            other => Error::GeometryOperation {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Attach the block id and single-tree count to a `DivisionByZero`.
    /// Other errors pass through unchanged.
    pub fn for_block(self, block_id: &str, single_tree_count: usize) -> Self {
        match self {
            Error::DivisionByZero { quantity, totals, .. } => Error::DivisionByZero {
                quantity,
                totals,
                block_id: Some(block_id.to_string()),
                single_tree_count: Some(single_tree_count),
            },
            other => other,
        }
    }

    /// Name of the failing stage, if this is a staged engine failure.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            Error::GeometryOperation { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

/// Result type alias for Silva operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_stage_wraps_engine_failures() {
        let err = Error::engine("erase", "self-intersecting ring").in_stage("net_area");
        assert_eq!(err.stage(), Some("net_area"));
        assert_eq!(
            err.to_string(),
            "Geometry operation failed during net_area: erase failed: self-intersecting ring"
        );
    }

    #[test]
    fn test_in_stage_keeps_first_stage() {
        let err = Error::engine("clip", "bad").in_stage("crown_source").in_stage("pipeline");
        assert_eq!(err.stage(), Some("crown_source"));
    }

    #[test]
    fn test_in_stage_leaves_domain_errors_alone() {
        let err = Error::DivisionByZero {
            quantity: "net harvestable area",
            totals: None,
            block_id: None,
            single_tree_count: None,
        }
        .in_stage("aggregate");
        assert!(matches!(err, Error::DivisionByZero { .. }));
        assert_eq!(err.stage(), None);
    }

    #[test]
    fn test_for_block_fills_division_by_zero() {
        let err = Error::DivisionByZero {
            quantity: "net harvestable area",
            totals: None,
            block_id: None,
            single_tree_count: None,
        }
        .for_block("RB-7", 2);
        match err {
            Error::DivisionByZero {
                block_id, single_tree_count, ..
            } => {
                assert_eq!(block_id.as_deref(), Some("RB-7"));
                assert_eq!(single_tree_count, Some(2));
            }
            other => panic!("expected DivisionByZero, got {:?}", other),
        }

        let other = Error::engine("clip", "bad").for_block("RB-7", 2);
        assert!(matches!(other, Error::Engine { .. }));
    }
}
