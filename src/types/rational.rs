//! Exact fractions used by Exif rational fields

use std::fmt;
use std::str::FromStr;

use crate::core::error::{MetaError, MetaResult};

/// A numerator/denominator pair
///
/// Unsigned rationals are stored in the same type; the codec checks the
/// sign when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Rational {
    pub numerator: i32,
    pub denominator: i32,
}

impl Rational {
    pub fn new(numerator: i32, denominator: i32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Parse `N/D`, or a bare integer `N` as `N/1`
    pub fn parse(s: &str) -> MetaResult<Self> {
        let s = s.trim();
        let bad = || MetaError::BadValue(format!("Invalid rational: {}", s));
        match s.split_once('/') {
            Some((n, d)) => Ok(Self::new(
                n.trim().parse().map_err(|_| bad())?,
                d.trim().parse().map_err(|_| bad())?,
            )),
            None => Ok(Self::new(s.parse().map_err(|_| bad())?, 1)),
        }
    }

    /// Floating point approximation; a zero denominator yields NaN or infinity
    pub fn to_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl FromStr for Rational {
    type Err = MetaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl From<(i32, i32)> for Rational {
    fn from((numerator, denominator): (i32, i32)) -> Self {
        Self::new(numerator, denominator)
    }
}
