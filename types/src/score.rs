//! Participant score and leaderboard rank.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::amount::{fmt_micros, parse_micros, MICROS_PER_UNIT};
use crate::ValidationError;

/// A non-negative score, fixed-point with six decimal places.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u128);

impl Score {
    pub const ZERO: Self = Self(0);

    pub fn from_micros(micros: u128) -> Self {
        Self(micros)
    }

    pub fn from_points(points: u64) -> Self {
        Self(u128::from(points) * MICROS_PER_UNIT)
    }

    pub fn micros(&self) -> u128 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl FromStr for Score {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim_start().starts_with('-') {
            return Err(ValidationError::NegativeScore(s.to_string()));
        }
        parse_micros(s).map(Self)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_micros(self.0, f)
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Leaderboard position, 1 = best.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Rank(u32);

impl Rank {
    pub fn new(position: u32) -> Result<Self, ValidationError> {
        if position == 0 {
            return Err(ValidationError::InvalidRank(position.to_string()));
        }
        Ok(Self(position))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Rank {
    type Error = ValidationError;
    fn try_from(position: u32) -> Result<Self, Self::Error> {
        Self::new(position)
    }
}

impl From<Rank> for u32 {
    fn from(rank: Rank) -> u32 {
        rank.0
    }
}

impl FromStr for Rank {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let position: u32 = s
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidRank(s.to_string()))?;
        Self::new(position)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
