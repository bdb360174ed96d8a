//! Display units and conversion from the canonical internal unit (centimeters).

#[cfg(test)]
#[path = "units_test.rs"]
mod units_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A physical length unit the user can display measurements in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Millimeters.
    Mm,
    /// Centimeters (the canonical internal unit).
    #[default]
    Cm,
    /// Meters.
    M,
    /// Inches.
    In,
    /// Feet.
    Ft,
}

impl Unit {
    /// Every unit, in toolbar order.
    pub const ALL: [Self; 5] = [Self::Mm, Self::Cm, Self::M, Self::In, Self::Ft];

    /// Multiplier from centimeters to this unit.
    #[must_use]
    pub fn factor(self) -> f64 {
        match self {
            Self::Mm => 10.0,
            Self::Cm => 1.0,
            Self::M => 0.01,
            Self::In => 0.393_701,
            Self::Ft => 0.032_808_4,
        }
    }

    /// Short suffix shown after a value.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Mm => "mm",
            Self::Cm => "cm",
            Self::M => "m",
            Self::In => "in",
            Self::Ft => "ft",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Returned when a string does not name a known unit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown unit '{0}' (expected mm, cm, m, in or ft)")]
pub struct UnknownUnit(pub String);

impl FromStr for Unit {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|u| u.symbol() == lowered)
            .ok_or_else(|| UnknownUnit(s.to_owned()))
    }
}

/// Convert a length in centimeters to `to`.
#[must_use]
pub fn convert(value_cm: f64, to: Unit) -> f64 {
    value_cm * to.factor()
}

/// Convert an area in square centimeters to square `to`.
#[must_use]
pub fn convert_area(value_cm2: f64, to: Unit) -> f64 {
    let f = to.factor();
    value_cm2 * f * f
}

/// Render `value` with one decimal place and the unit suffix.
///
/// Areas get a squared marker, e.g. `"12.5 cm²"`.
#[must_use]
pub fn format(value: f64, unit: Unit, is_area: bool) -> String {
    if is_area {
        format!("{value:.1} {unit}²")
    } else {
        format!("{value:.1} {unit}")
    }
}
