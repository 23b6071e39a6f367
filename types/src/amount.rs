//! Reward amount types for USD and tokens.
//!
//! Amounts are represented as fixed-point integers (u128) to avoid floating-point errors.
//! The smallest unit is one micro-unit (10^-6). Sums over any number of claims are exact.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use crate::ValidationError;

/// Number of fractional decimal digits carried by every fixed-point value.
pub const DECIMALS: u32 = 6;

/// Micro-units per whole unit.
pub const MICROS_PER_UNIT: u128 = 1_000_000;

/// Parse a plain decimal string (`"150"`, `"30.5"`) into micro-units.
///
/// Signs, exponents and more than [`DECIMALS`] fractional digits are rejected.
pub(crate) fn parse_micros(input: &str) -> Result<u128, ValidationError> {
    let s = input.trim();
    let invalid = || ValidationError::InvalidDecimal(input.to_string());

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if !frac_part.bytes().all(|b| b.is_ascii_digit()) || (s.contains('.') && frac_part.is_empty())
    {
        return Err(invalid());
    }
    if frac_part.len() > DECIMALS as usize {
        return Err(ValidationError::TooManyDecimals {
            input: input.to_string(),
            max: DECIMALS,
        });
    }

    let overflow = || ValidationError::Overflow(input.to_string());
    let whole: u128 = int_part.parse().map_err(|_| overflow())?;
    let mut frac: u128 = 0;
    for digit in frac_part.bytes() {
        frac = frac * 10 + u128::from(digit - b'0');
    }
    frac *= 10u128.pow(DECIMALS - frac_part.len() as u32);

    whole
        .checked_mul(MICROS_PER_UNIT)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(overflow)
}

/// Write micro-units as the shortest plain decimal string.
pub(crate) fn fmt_micros(micros: u128, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let whole = micros / MICROS_PER_UNIT;
    let frac = micros % MICROS_PER_UNIT;
    if frac == 0 {
        return write!(f, "{whole}");
    }
    let digits = format!("{frac:06}");
    write!(f, "{whole}.{}", digits.trim_end_matches('0'))
}

macro_rules! fixed_point_amount {
    ($(#[$meta:meta])* $name:ident, $unit:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u128);

        impl $name {
            pub const ZERO: Self = Self(0);

            pub fn from_micros(micros: u128) -> Self {
                Self(micros)
            }

            /// Whole units, e.g. `from_units(100)` is exactly 100.
            pub fn from_units(units: u64) -> Self {
                Self(u128::from(units) * MICROS_PER_UNIT)
            }

            pub fn micros(&self) -> u128 {
                self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == 0
            }

            pub fn checked_add(self, other: Self) -> Option<Self> {
                self.0.checked_add(other.0).map(Self)
            }

            pub fn saturating_add(self, other: Self) -> Self {
                Self(self.0.saturating_add(other.0))
            }

            /// Display with the unit suffix, e.g. `"150 USD"`.
            pub fn with_unit(&self) -> String {
                format!("{self} {}", $unit)
            }
        }

        /// Saturating, like [`Self::saturating_add`].
        impl Add for $name {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                self.saturating_add(rhs)
            }
        }

        impl Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold(Self::ZERO, Add::add)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt_micros(self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_micros(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_point_amount!(
    /// A USD reward amount in micro-dollars.
    UsdAmount,
    "USD"
);

fixed_point_amount!(
    /// A token reward amount in micro-tokens.
    TokenAmount,
    "TOKENS"
);
