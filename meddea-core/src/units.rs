//! Unit-tagged scalar quantities.
//!
//! Every physical value that crosses an API boundary carries its [`Unit`].
//! Arithmetic and comparisons only succeed between identical units; there is
//! no implicit conversion.

use std::fmt;

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Units understood by the analysis layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Unit {
    /// Raw analog-to-digital channel.
    Channel,
    /// Calibrated photon energy in keV.
    KiloElectronVolt,
    /// Seconds.
    Second,
    /// Bytes.
    Byte,
    /// Bytes per second.
    BytePerSecond,
    /// Detected counts.
    Count,
}

impl Unit {
    /// Returns true for the two units a spectral axis can carry.
    #[inline]
    #[must_use]
    pub fn is_spectral(self) -> bool {
        matches!(self, Unit::Channel | Unit::KiloElectronVolt)
    }

    /// Short symbol used in labels and CSV headers.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Channel => "chan",
            Unit::KiloElectronVolt => "keV",
            Unit::Second => "s",
            Unit::Byte => "B",
            Unit::BytePerSecond => "B/s",
            Unit::Count => "ct",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A scalar value tagged with its unit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Quantity {
    value: f64,
    unit: Unit,
}

impl Quantity {
    /// Creates a new quantity.
    #[inline]
    #[must_use]
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Quantity in raw channels.
    #[inline]
    #[must_use]
    pub fn channels(value: f64) -> Self {
        Self::new(value, Unit::Channel)
    }

    /// Quantity in keV.
    #[inline]
    #[must_use]
    pub fn kev(value: f64) -> Self {
        Self::new(value, Unit::KiloElectronVolt)
    }

    /// Quantity in seconds.
    #[inline]
    #[must_use]
    pub fn seconds(value: f64) -> Self {
        Self::new(value, Unit::Second)
    }

    /// Quantity in bytes.
    #[inline]
    #[must_use]
    pub fn bytes(value: f64) -> Self {
        Self::new(value, Unit::Byte)
    }

    /// Returns the raw value regardless of unit.
    #[inline]
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns the unit tag.
    #[inline]
    #[must_use]
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Returns the value if it is expressed in `unit`.
    pub fn value_in(&self, unit: Unit) -> Result<f64> {
        if self.unit == unit {
            Ok(self.value)
        } else {
            Err(Error::UnsupportedUnit {
                found: self.unit,
                expected: unit.symbol(),
            })
        }
    }

    /// Adds two quantities of the same unit.
    pub fn checked_add(self, other: Self) -> Result<Self> {
        let rhs = other.value_in(self.unit)?;
        Ok(Self::new(self.value + rhs, self.unit))
    }

    /// Subtracts two quantities of the same unit.
    pub fn checked_sub(self, other: Self) -> Result<Self> {
        let rhs = other.value_in(self.unit)?;
        Ok(Self::new(self.value - rhs, self.unit))
    }

    /// Orders two quantities of the same unit.
    pub fn checked_cmp(&self, other: &Self) -> Result<Option<std::cmp::Ordering>> {
        let rhs = other.value_in(self.unit)?;
        Ok(self.value.partial_cmp(&rhs))
    }

    /// Multiplies the value by a dimensionless factor.
    #[inline]
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.value * factor, self.unit)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_same_unit_arithmetic() {
        let a = Quantity::kev(10.0);
        let b = Quantity::kev(2.5);
        assert_relative_eq!(a.checked_add(b).unwrap().value(), 12.5);
        assert_relative_eq!(a.checked_sub(b).unwrap().value(), 7.5);
        assert_eq!(
            a.checked_cmp(&b).unwrap(),
            Some(std::cmp::Ordering::Greater)
        );
    }

    #[test]
    fn test_mismatched_units_fail() {
        let energy = Quantity::kev(10.0);
        let channel = Quantity::channels(10.0);
        assert!(matches!(
            energy.checked_add(channel),
            Err(Error::UnsupportedUnit {
                found: Unit::Channel,
                ..
            })
        ));
        assert!(energy.checked_cmp(&channel).is_err());
        assert!(Quantity::seconds(1.0).value_in(Unit::Byte).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Quantity::kev(5.0).to_string(), "5 keV");
        assert_eq!(Quantity::channels(128.0).to_string(), "128 chan");
        assert!(Unit::Channel.is_spectral());
        assert!(!Unit::Second.is_spectral());
    }
}
