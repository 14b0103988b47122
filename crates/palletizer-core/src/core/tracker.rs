//! Position tracking for the absolute-positioning protocol
//!
//! Every outgoing axis command names the absolute target of each axis it
//! mentions. The tracker records that target and, since there is no motion
//! model, takes it as the current position straight away.

use super::event::{ControllerEvent, EventDispatcher};
use crate::codec;
use crate::data::Axis;
use std::collections::BTreeMap;

/// Current and target position of every axis
///
/// Both maps always hold exactly the fixed axis set.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    positions: BTreeMap<Axis, i32>,
    target_positions: BTreeMap<Axis, i32>,
    events: EventDispatcher,
}

impl PositionTracker {
    /// Create a tracker with every axis at zero
    pub fn new(events: EventDispatcher) -> Self {
        let zeroed: BTreeMap<Axis, i32> = Axis::ALL.iter().map(|axis| (*axis, 0)).collect();
        Self {
            positions: zeroed.clone(),
            target_positions: zeroed,
            events,
        }
    }

    /// Overwrite the current position of an axis
    pub fn set_position(&mut self, axis: Axis, position: i32) {
        self.positions.insert(axis, position);
        self.events
            .publish(ControllerEvent::PositionChanged { axis, position });
    }

    /// Overwrite the current position of an axis given by identifier
    ///
    /// Returns false for an identifier outside the axis set.
    pub fn set_position_by_id(&mut self, id: &str, position: i32) -> bool {
        match Axis::from_id(id) {
            Some(axis) => {
                self.set_position(axis, position);
                true
            }
            None => false,
        }
    }

    /// Record a commanded target; the axis is taken to be there at once
    pub fn set_target_position(&mut self, axis: Axis, position: i32) {
        self.target_positions.insert(axis, position);
        self.events
            .publish(ControllerEvent::TargetChanged { axis, position });
        self.set_position(axis, position);
    }

    /// Record a commanded target for an axis given by identifier
    ///
    /// Returns false for an identifier outside the axis set.
    pub fn set_target_position_by_id(&mut self, id: &str, position: i32) -> bool {
        match Axis::from_id(id) {
            Some(axis) => {
                self.set_target_position(axis, position);
                true
            }
            None => false,
        }
    }

    /// Zero the position and target of one axis
    pub fn reset_position(&mut self, axis: Axis) {
        self.target_positions.insert(axis, 0);
        self.set_position(axis, 0);
    }

    /// Zero the position and target of every axis
    pub fn reset_all_positions(&mut self) {
        for axis in Axis::ALL {
            self.reset_position(axis);
        }
    }

    /// Run the best-effort decoder over a command and record every target
    ///
    /// Returns true if at least one axis was updated.
    pub fn parse_command(&mut self, command: &str) -> bool {
        let targets = codec::parse_command(command);
        for (axis, position) in &targets {
            self.set_target_position(*axis, *position);
        }
        if targets.is_empty() {
            tracing::debug!("No axis targets in '{}'", command);
        }
        !targets.is_empty()
    }

    /// Current position of an axis
    pub fn get_position(&self, axis: Axis) -> i32 {
        self.positions.get(&axis).copied().unwrap_or(0)
    }

    /// Current position of an axis given by identifier, 0 when unknown
    pub fn position_of(&self, id: &str) -> i32 {
        Axis::from_id(id).map_or(0, |axis| self.get_position(axis))
    }

    /// Last commanded target of an axis
    pub fn get_target_position(&self, axis: Axis) -> i32 {
        self.target_positions.get(&axis).copied().unwrap_or(0)
    }

    /// Copy of every current position
    pub fn get_all_positions(&self) -> BTreeMap<Axis, i32> {
        self.positions.clone()
    }
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new(EventDispatcher::default())
    }
}
