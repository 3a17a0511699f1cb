//! Occurrence bounds of content-model particles
//!
//! Reference: https://www.w3.org/TR/xmlschema-1/#p

use serde::{Deserialize, Serialize};
use std::fmt;

/// Occurrence bounds for a particle (minOccurs, maxOccurs)
/// None for max means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// Parse `minOccurs` / `maxOccurs` attribute values, defaulting to 1
    pub fn parse(min: Option<&str>, max: Option<&str>) -> Option<Self> {
        let min = match min {
            Some(s) => s.trim().parse::<u32>().ok()?,
            None => 1,
        };

        let max = match max.map(str::trim) {
            Some("unbounded") => None,
            Some(s) => Some(s.parse::<u32>().ok()?),
            None => Some(1),
        };

        if let Some(max) = max {
            if max < min {
                return None;
            }
        }

        Some(Self::new(min, max))
    }

    /// Check if particle can have more than one occurrence
    pub fn is_multiple(&self) -> bool {
        self.max.map_or(true, |max| max > 1)
    }

    /// Check if occurrence count is under the minimum
    pub fn is_missing(&self, count: u32) -> bool {
        count < self.min
    }

    /// Check if occurrence count is at or over the maximum
    pub fn is_over(&self, count: u32) -> bool {
        match self.max {
            Some(max) => count >= max,
            None => false,
        }
    }

    /// Combine with the bounds of an enclosing group
    ///
    /// A particle that may occur twice inside a group that may repeat three
    /// times may occur six times overall.
    pub fn scaled_by(&self, outer: &Occurs) -> Occurs {
        let min = self.min.saturating_mul(outer.min);
        let max = match (self.max, outer.max) {
            (Some(inner), Some(outer)) => Some(inner.saturating_mul(outer)),
            (Some(0), None) | (None, Some(0)) => Some(0),
            _ => None,
        };
        Occurs::new(min, max)
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

impl fmt::Display for Occurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}..unbounded", self.min),
        }
    }
}
