//! Area measurements and the influence ratio

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// Non-negative area in square map units
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Area(f64);

impl Area {
    pub const ZERO: Area = Area(0.0);

    /// Validate a raw area. Negative, NaN and infinite values are rejected.
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidParameter {
                name: "area",
                value: value.to_string(),
                reason: "areas must be finite and non-negative".into(),
            });
        }
        // -0.0 passes the check above; adding +0.0 normalizes it
        Ok(Area(value + 0.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    /// `self / whole * 100`.
    ///
    /// Fails with `DivisionByZero` naming `quantity` when `whole` is zero.
    pub fn percent_of(self, whole: Area, quantity: &'static str) -> Result<f64> {
        if whole.is_zero() {
            return Err(Error::DivisionByZero {
                quantity,
                totals: None,
                block_id: None,
                single_tree_count: None,
            });
        }
        Ok(self.0 / whole.0 * 100.0)
    }
}

impl Add for Area {
    type Output = Area;

    fn add(self, rhs: Area) -> Area {
        Area(self.0 + rhs.0)
    }
}

impl Sum for Area {
    fn sum<I: Iterator<Item = Area>>(iter: I) -> Area {
        iter.fold(Area::ZERO, Add::add)
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// The four aggregated areas of one cutblock
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AreaTotals {
    pub net_harvestable: Area,
    pub forest_influence: Area,
    pub retention: Area,
    pub non_merch: Area,
}

impl AreaTotals {
    /// Gross block area as reported: net + retention + non-merch
    pub fn gross(&self) -> Area {
        self.net_harvestable + self.retention + self.non_merch
    }

    /// Share of the net harvestable area covered by forest influence, in percent.
    ///
    /// A zero net area raises `DivisionByZero` carrying these totals.
    pub fn influence_percent(&self) -> Result<f64> {
        self.forest_influence
            .percent_of(self.net_harvestable, "net harvestable area")
            .map_err(|e| match e {
                Error::DivisionByZero {
                    quantity,
                    block_id,
                    single_tree_count,
                    ..
                } => Error::DivisionByZero {
                    quantity,
                    totals: Some(Box::new(*self)),
                    block_id,
                    single_tree_count,
                },
                other => other,
            })
    }
}

/// Classification of the influence percentage against the 50% limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfluenceThreshold {
    Exceeded,
    WithinLimit,
}

impl InfluenceThreshold {
    pub const LIMIT_PERCENT: f64 = 50.0;

    /// Strictly greater than the limit exceeds it; exactly 50% does not.
    pub fn classify(percent: f64) -> Self {
        if percent > Self::LIMIT_PERCENT {
            InfluenceThreshold::Exceeded
        } else {
            InfluenceThreshold::WithinLimit
        }
    }

    pub fn is_exceeded(self) -> bool {
        self == InfluenceThreshold::Exceeded
    }

    pub fn message(self) -> &'static str {
        match self {
            InfluenceThreshold::Exceeded => "Forest influence is greater than 50%",
            InfluenceThreshold::WithinLimit => "Forest influence is less than 50%",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_area_rejects_negative_and_nan() {
        assert!(Area::new(-1.0).is_err());
        assert!(Area::new(f64::NAN).is_err());
        assert!(Area::new(f64::INFINITY).is_err());
        assert_eq!(Area::new(-0.0).unwrap().value().to_bits(), 0.0_f64.to_bits());
    }

    #[test]
    fn test_percent_of_zero_raises() {
        let err = Area::new(10.0).unwrap().percent_of(Area::ZERO, "net harvestable area");
        assert!(matches!(err, Err(Error::DivisionByZero { .. })));
    }

    #[test]
    fn test_influence_percent_carries_totals() {
        let totals = AreaTotals {
            net_harvestable: Area::ZERO,
            forest_influence: Area::ZERO,
            retention: Area::new(500.0).unwrap(),
            non_merch: Area::new(1000.0).unwrap(),
        };
        match totals.influence_percent() {
            Err(Error::DivisionByZero { totals: Some(t), .. }) => {
                assert_relative_eq!(t.gross().value(), 1500.0);
            }
            other => panic!("expected DivisionByZero, got {:?}", other),
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        assert_eq!(InfluenceThreshold::classify(50.0), InfluenceThreshold::WithinLimit);
        assert_eq!(InfluenceThreshold::classify(50.0001), InfluenceThreshold::Exceeded);
        assert_eq!(
            InfluenceThreshold::classify(12.0).message(),
            "Forest influence is less than 50%"
        );
        assert_eq!(
            InfluenceThreshold::classify(80.0).message(),
            "Forest influence is greater than 50%"
        );
    }

    #[test]
    fn test_scenario_exactly_half() {
        let totals = AreaTotals {
            net_harvestable: Area::new(8500.0).unwrap(),
            forest_influence: Area::new(4250.0).unwrap(),
            retention: Area::new(500.0).unwrap(),
            non_merch: Area::new(1000.0).unwrap(),
        };
        let pct = totals.influence_percent().unwrap();
        assert_eq!(pct, 50.0);
        assert!(!InfluenceThreshold::classify(pct).is_exceeded());
        assert_relative_eq!(totals.gross().value(), 10_000.0);
    }
}
