//! Confidence scores attached to extracted fields

use serde::{Deserialize, Serialize};
use std::fmt;

/// A trust score in [0.0, 1.0]
///
/// Construction always clamps, so a `Confidence` can never leave the unit
/// interval. NaN collapses to zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Zero confidence: attempted, nothing trustworthy found
    pub const NONE: Confidence = Confidence(0.0);

    /// Full confidence, used for reviewer-supplied values
    pub const CERTAIN: Confidence = Confidence(1.0);

    /// Create a confidence, clamping into [0, 1]
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Raw score
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Product of two scores (stays in range)
    pub fn scaled_by(&self, factor: f64) -> Self {
        Self::new(self.0 * factor)
    }

    /// Whether this score reaches the given floor
    pub fn clears(&self, floor: f64) -> bool {
        self.0 >= floor
    }

    /// Arithmetic mean of a set of scores, zero for an empty set
    pub fn mean<I: IntoIterator<Item = Confidence>>(scores: I) -> Self {
        let (sum, count) = scores
            .into_iter()
            .fold((0.0, 0usize), |(sum, count), c| (sum + c.0, count + 1));
        if count == 0 {
            Self::NONE
        } else {
            Self::new(sum / count as f64)
        }
    }
}

impl From<f64> for Confidence {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
