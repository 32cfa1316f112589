use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Hull-distance cut (eV/atom) at or below which a material counts as stable.
///
/// Applied independently to true and predicted values. Usually 0.0 or 0.1.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct StabilityThreshold(f64);

impl StabilityThreshold {
    /// Rejects NaN and infinite thresholds.
    pub fn new(value: f64) -> Result<Self, CoreError> {
        if !value.is_finite() {
            return Err(CoreError::InvalidParameter(format!(
                "stability threshold must be finite, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// `true` when `e_above_hull <= threshold`. NaN is never stable.
    #[inline]
    pub fn is_stable(self, e_above_hull: f64) -> bool {
        e_above_hull <= self.0
    }
}

impl Default for StabilityThreshold {
    fn default() -> Self {
        Self(0.0)
    }
}

impl TryFrom<f64> for StabilityThreshold {
    type Error = CoreError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StabilityThreshold> for f64 {
    fn from(t: StabilityThreshold) -> Self {
        t.0
    }
}

impl fmt::Display for StabilityThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} eV/atom", self.0)
    }
}
