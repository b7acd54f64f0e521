//! Requested push frequency.

use core::fmt;
use core::num::NonZeroU32;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::RateError;

/// Requested telemetry push frequency in Hz.
///
/// Always a whole number of at least 1. Every conversion into a
/// `RefreshRate` validates, so holding one means the value is usable.
///
/// # Example
///
/// ```rust
/// use telewatch_types::{RateError, RefreshRate};
///
/// assert_eq!(RefreshRate::try_from(50).unwrap().get(), 50);
/// assert_eq!(RefreshRate::try_from(0), Err(RateError::BelowMinimum(0)));
/// assert_eq!(RefreshRate::try_from(1.5), Err(RateError::NotAnInteger(1.5)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RefreshRate(NonZeroU32);

impl RefreshRate {
    /// Create a refresh rate from a whole number of Hz.
    pub fn new(hz: u32) -> Result<Self, RateError> {
        NonZeroU32::new(hz).map(Self).ok_or(RateError::BelowMinimum(0))
    }

    /// The rate in Hz.
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for RefreshRate {
    fn default() -> Self {
        Self(NonZeroU32::MIN.saturating_add(9))
    }
}

impl fmt::Display for RefreshRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

impl From<RefreshRate> for u32 {
    fn from(rate: RefreshRate) -> Self {
        rate.get()
    }
}

impl TryFrom<u32> for RefreshRate {
    type Error = RateError;

    fn try_from(hz: u32) -> Result<Self, Self::Error> {
        Self::new(hz)
    }
}

impl TryFrom<u64> for RefreshRate {
    type Error = RateError;

    fn try_from(hz: u64) -> Result<Self, Self::Error> {
        let hz = u32::try_from(hz).map_err(|_| RateError::OutOfRange(hz))?;
        Self::new(hz)
    }
}

impl TryFrom<i64> for RefreshRate {
    type Error = RateError;

    fn try_from(hz: i64) -> Result<Self, Self::Error> {
        if hz < 1 {
            return Err(RateError::BelowMinimum(hz));
        }
        Self::try_from(hz as u64)
    }
}

impl TryFrom<i32> for RefreshRate {
    type Error = RateError;

    fn try_from(hz: i32) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(hz))
    }
}

impl TryFrom<f64> for RefreshRate {
    type Error = RateError;

    fn try_from(hz: f64) -> Result<Self, Self::Error> {
        if !hz.is_finite() || hz.fract() != 0.0 {
            return Err(RateError::NotAnInteger(hz));
        }
        if hz < 1.0 {
            return Err(RateError::BelowMinimum(hz as i64));
        }
        if hz > f64::from(u32::MAX) {
            return Err(RateError::OutOfRange(hz as u64));
        }
        Self::new(hz as u32)
    }
}

impl FromStr for RefreshRate {
    type Err = RateError;

    /// Accepts plain numbers; `"10"` and `"10.0"` are both 10 Hz, `"1.5"` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(hz) = s.parse::<i64>() {
            return Self::try_from(hz);
        }
        match s.parse::<f64>() {
            Ok(hz) => Self::try_from(hz),
            Err(_) => Err(RateError::Unparsable(s.to_string())),
        }
    }
}
