//! Typed numeric ranges used by scenario conditions and tactical rows.
//!
//! An absent bound is unbounded on that side. Scenario conditions use the
//! half-open test `min <= v < max`; tactical rows use the closed test
//! `min <= v <= max`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error inside a single range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RangeError {
    #[error("{bound} bound is not a finite number")]
    NonFiniteBound { bound: &'static str },
    #[error("min {min} is greater than max {max}")]
    Inverted { min: f64, max: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Range {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Range {
    /// Unbounded on both sides.
    pub const OPEN: Range = Range {
        min: None,
        max: None,
    };

    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn at_least(min: f64) -> Self {
        Self::new(Some(min), None)
    }

    pub fn below(max: f64) -> Self {
        Self::new(None, Some(max))
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self::new(Some(min), Some(max))
    }

    pub fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Load-time consistency check: finite bounds and `min <= max`.
    pub fn validate(&self) -> Result<(), RangeError> {
        if self.min.is_some_and(|m| !m.is_finite()) {
            return Err(RangeError::NonFiniteBound { bound: "min" });
        }
        if self.max.is_some_and(|m| !m.is_finite()) {
            return Err(RangeError::NonFiniteBound { bound: "max" });
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(RangeError::Inverted { min, max });
            }
        }
        Ok(())
    }

    /// Half-open membership: `min <= value < max`.
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value < max)
    }

    /// Closed membership: `min <= value <= max`.
    pub fn contains_closed(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "[{min}, {max})"),
            (Some(min), None) => write!(f, "[{min}, +inf)"),
            (None, Some(max)) => write!(f, "(-inf, {max})"),
            (None, None) => f.write_str("(-inf, +inf)"),
        }
    }
}
