//! Data models for axes, sequence steps, and per-axis settings
//!
//! This module provides:
//! - The fixed axis set of the palletizer (X, Y, Z, T rotation, G gripper)
//! - Sequence steps (absolute position with an optional preceding delay)
//! - Per-axis settings (speed, clamp range, display inversion)

use crate::constants::{
    DEFAULT_MAX_POSITION, DEFAULT_MIN_POSITION, DEFAULT_SPEED, MAX_SPEED, MIN_SPEED,
};
use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the five controlled degrees of freedom
///
/// Ordering follows the wire order used when several axes share a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Horizontal rail
    X,
    /// Horizontal rail, perpendicular to X
    Y,
    /// Vertical lift
    Z,
    /// Rotation
    T,
    /// Gripper
    G,
}

impl Axis {
    /// Every axis, in wire order
    pub const ALL: [Axis; 5] = [Axis::X, Axis::Y, Axis::Z, Axis::T, Axis::G];

    /// Lowercase identifier used on the wire
    pub fn id(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
            Axis::T => 't',
            Axis::G => 'g',
        }
    }

    /// Uppercase label used in messages
    pub fn label(self) -> char {
        self.id().to_ascii_uppercase()
    }

    /// Look up an axis by identifier, ignoring case and surrounding whitespace
    pub fn from_id(id: &str) -> Option<Axis> {
        match id.trim().to_ascii_lowercase().as_str() {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            "t" => Some(Axis::T),
            "g" => Some(Axis::G),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Axis {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Axis::from_id(s).ok_or_else(|| ProtocolError::UnknownAxis {
            axis: s.to_string(),
        })
    }
}

/// One step of an axis within a sequence row
///
/// The delay, when present, is honoured by the device before moving to
/// the position. A step carries at least one of the two fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Step {
    /// Absolute target position
    pub position: Option<i32>,
    /// Delay in milliseconds before the position
    pub delay_ms: Option<u32>,
}

impl Step {
    /// A plain move to an absolute position
    pub fn position(position: i32) -> Self {
        Self {
            position: Some(position),
            delay_ms: None,
        }
    }

    /// A move preceded by a delay
    pub fn delayed(delay_ms: u32, position: i32) -> Self {
        Self {
            position: Some(position),
            delay_ms: Some(delay_ms),
        }
    }

    /// A bare delay with no following move
    pub fn delay(delay_ms: u32) -> Self {
        Self {
            position: None,
            delay_ms: Some(delay_ms),
        }
    }

    /// True when neither field is set
    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.delay_ms.is_none()
    }
}

/// Per-axis settings owned by the controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisSettings {
    /// Motor speed sent with SPEED commands
    pub speed: u32,
    /// Display-only inversion flag
    pub inverted: bool,
    /// Lower clamp bound for jogging
    pub min: i32,
    /// Upper clamp bound for jogging
    pub max: i32,
}

impl Default for AxisSettings {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            inverted: false,
            min: DEFAULT_MIN_POSITION,
            max: DEFAULT_MAX_POSITION,
        }
    }
}

impl AxisSettings {
    /// Clamp a requested position into the configured range
    pub fn clamp(&self, position: i32) -> i32 {
        position.clamp(self.min, self.max.max(self.min))
    }

    /// Value to show for a position, honouring the inversion flag
    pub fn display_position(&self, position: i32) -> i32 {
        if self.inverted {
            position.saturating_neg()
        } else {
            position
        }
    }
}

/// Check a speed against the range accepted by the slaves
pub fn validate_speed(speed: u32) -> Result<u32, ProtocolError> {
    if (MIN_SPEED..=MAX_SPEED).contains(&speed) {
        Ok(speed)
    } else {
        Err(ProtocolError::SpeedOutOfRange {
            speed,
            min: MIN_SPEED,
            max: MAX_SPEED,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_lookup_ignores_case() {
        assert_eq!(Axis::from_id("X"), Some(Axis::X));
        assert_eq!(Axis::from_id(" g "), Some(Axis::G));
        assert_eq!(Axis::from_id("a"), None);
        assert!("q".parse::<Axis>().is_err());
    }

    #[test]
    fn test_axis_display() {
        assert_eq!(Axis::T.to_string(), "t");
        assert_eq!(Axis::T.label(), 'T');
    }

    #[test]
    fn test_clamp_and_display() {
        let settings = AxisSettings {
            min: -100,
            max: 100,
            inverted: true,
            ..AxisSettings::default()
        };
        assert_eq!(settings.clamp(500), 100);
        assert_eq!(settings.clamp(-500), -100);
        assert_eq!(settings.clamp(42), 42);
        assert_eq!(settings.display_position(42), -42);
    }

    #[test]
    fn test_speed_bounds() {
        assert_eq!(validate_speed(100), Ok(100));
        assert_eq!(validate_speed(2000), Ok(2000));
        assert!(validate_speed(99).is_err());
        assert!(validate_speed(2001).is_err());
    }
}
