//! Fixed-precision price and quantity representations.
//!
//! Prices and quantities are stored as integer tick counts so that map keys
//! and equality comparisons never touch binary floating point. Conversion
//! from `f64` happens once, at the boundary, where the value is rounded to
//! the canonical number of decimal places.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Decimal digits carried by the internal price representation.
///
/// Canonicalisation may round to fewer decimals (see
/// [`crate::engine::EngineConfig::price_precision_decimals`]), but the tick
/// scale itself is fixed so that all books in a process agree on key values.
pub const PRICE_STORAGE_DECIMALS: u32 = 4;
const PRICE_SCALE: f64 = 10_000.0;

/// Decimal digits carried by the internal quantity representation
/// (base units, the usual crypto convention).
pub const QUANTITY_STORAGE_DECIMALS: u32 = 8;
const QUANTITY_SCALE: f64 = 100_000_000.0;

/// A canonical price: an integer number of ticks at a fixed scale.
///
/// Ordering and equality operate on the tick count, which makes `Price`
/// suitable as a sorted-map key. Serialized as the decimal `f64` value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(u64);

impl Price {
    /// The zero price.
    pub const ZERO: Price = Price(0);

    /// Canonicalise a raw price: round to `decimals` places (capped at the
    /// storage scale) and convert to ticks.
    ///
    /// Returns `None` for non-finite, negative, or unrepresentably large
    /// input, which callers surface as a validation rejection.
    pub fn canonical(value: f64, decimals: u32) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let factor = 10f64.powi(decimals.min(PRICE_STORAGE_DECIMALS) as i32);
        let rounded = (value * factor).round() / factor;
        let ticks = (rounded * PRICE_SCALE).round();
        if ticks < 0.0 || ticks > u64::MAX as f64 {
            return None;
        }
        Some(Price(ticks as u64))
    }

    /// Construct directly from a tick count.
    pub const fn from_ticks(ticks: u64) -> Self {
        Price(ticks)
    }

    /// The raw tick count.
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// The decimal value this price represents.
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / PRICE_SCALE
    }

    /// True for the zero price.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_f64())
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Price::canonical(value, PRICE_STORAGE_DECIMALS)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid price: {value}")))
    }
}

/// A canonical quantity: an integer number of base units at a fixed scale.
///
/// Serialized as the decimal `f64` value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(u64);

impl Quantity {
    /// The zero quantity.
    pub const ZERO: Quantity = Quantity(0);

    /// Canonicalise a raw quantity into base units.
    ///
    /// Returns `None` for non-finite, negative, or unrepresentably large
    /// input. Note that a zero quantity is representable; positivity is a
    /// separate admission check.
    pub fn canonical(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let units = (value * QUANTITY_SCALE).round();
        if units < 0.0 || units > u64::MAX as f64 {
            return None;
        }
        Some(Quantity(units as u64))
    }

    /// Construct directly from base units.
    pub const fn from_units(units: u64) -> Self {
        Quantity(units)
    }

    /// The raw base-unit count.
    pub const fn units(self) -> u64 {
        self.0
    }

    /// The decimal value this quantity represents.
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / QUANTITY_SCALE
    }

    /// True for the zero quantity.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Saturating addition in base units.
    pub fn saturating_add(self, other: Quantity) -> Quantity {
        Quantity(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction in base units.
    pub fn saturating_sub(self, other: Quantity) -> Quantity {
        Quantity(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_f64())
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Quantity::canonical(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid quantity: {value}")))
    }
}
