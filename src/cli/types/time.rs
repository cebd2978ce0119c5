//! Season types.

use crate::error::{ImportError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type-safe wrapper for Season years
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Season(pub u16);

impl Season {
    pub fn new(year: u16) -> Self {
        Self(year)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl Default for Season {
    fn default() -> Self {
        Self(2025)
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Season {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Inclusive range of seasons, iterated oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonRange {
    pub first: Season,
    pub last: Season,
}

impl SeasonRange {
    /// Build a range; the bounds are swapped if given backwards.
    pub fn new(first: Season, last: Season) -> Self {
        if first <= last {
            Self { first, last }
        } else {
            Self {
                first: last,
                last: first,
            }
        }
    }

    pub fn contains(&self, season: Season) -> bool {
        self.first <= season && season <= self.last
    }

    pub fn len(&self) -> usize {
        (self.last.0 - self.first.0) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Season> {
        (self.first.0..=self.last.0).map(Season)
    }
}

impl fmt::Display for SeasonRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}
