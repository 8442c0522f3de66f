//! Coordinate Reference System handling
//!
//! Layers only need enough CRS information to refuse overlays between
//! incompatible datasets. Forestry inputs are normally in a projected,
//! metre-based system such as BC Albers (EPSG:3005).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT or free-form name when no EPSG code is known
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
        }
    }

    /// NAD83 / BC Albers (EPSG:3005)
    pub fn bc_albers() -> Self {
        Self::from_epsg(3005)
    }

    /// Parse the names found in GeoJSON `crs` members and config files.
    ///
    /// Accepts `EPSG:3005`, `urn:ogc:def:crs:EPSG::3005` and bare codes.
    /// Anything else is kept verbatim as WKT/name text.
    pub fn parse(name: &str) -> Self {
        let trimmed = name.trim();
        let code = trimmed
            .rsplit(':')
            .next()
            .filter(|_| {
                let upper = trimmed.to_ascii_uppercase();
                upper.starts_with("EPSG:") || upper.contains(":EPSG:") || !trimmed.contains(':')
            })
            .and_then(|tail| tail.parse::<u32>().ok());

        match code {
            Some(code) => Self::from_epsg(code),
            None => Self::from_wkt(trimmed),
        }
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }
        false
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            return format!("WKT:{}", wkt.chars().take(50).collect::<String>());
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

/// Check two optional CRS values for compatibility.
///
/// Unknown CRS on either side is accepted; only two known, differing
/// systems are a mismatch.
pub fn ensure_compatible(a: Option<&CRS>, b: Option<&CRS>) -> crate::Result<()> {
    match (a, b) {
        (Some(a), Some(b)) if !a.is_equivalent(b) => {
            Err(crate::Error::CrsMismatch(a.identifier(), b.identifier()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = CRS::bc_albers();
        assert_eq!(crs.epsg(), Some(3005));
        assert_eq!(crs.identifier(), "EPSG:3005");
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(CRS::parse("EPSG:3005").epsg(), Some(3005));
        assert_eq!(CRS::parse("urn:ogc:def:crs:EPSG::26910").epsg(), Some(26910));
        assert_eq!(CRS::parse("3005").epsg(), Some(3005));
        assert_eq!(CRS::parse("local grid").wkt(), Some("local grid"));
    }

    #[test]
    fn test_ensure_compatible() {
        let albers = CRS::bc_albers();
        let utm = CRS::from_epsg(26910);
        assert!(ensure_compatible(Some(&albers), None).is_ok());
        assert!(ensure_compatible(Some(&albers), Some(&CRS::from_epsg(3005))).is_ok());
        assert!(matches!(
            ensure_compatible(Some(&albers), Some(&utm)),
            Err(crate::Error::CrsMismatch(_, _))
        ));
    }
}
