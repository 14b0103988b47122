//! Sequence rows
//!
//! A row holds up to five steps per axis and is sent as one composite
//! command. Rows keep their structured steps; the wire strings are derived.

use palletizer_core::codec::{decode_axis_command, encode_axis_command};
use palletizer_core::constants::{MAX_STEPS_PER_AXIS, ROW_COMMAND_SEPARATOR};
use palletizer_core::{Axis, ProtocolError, Step};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One step of a sequence: per-axis steps sent together
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    steps: BTreeMap<Axis, Vec<Step>>,
}

impl Row {
    /// Build a row from per-axis steps
    ///
    /// Empty steps are ignored, each axis keeps at most five steps, and axes
    /// left without steps are dropped.
    pub fn from_steps(steps: impl IntoIterator<Item = (Axis, Vec<Step>)>) -> Self {
        let steps = steps
            .into_iter()
            .filter_map(|(axis, steps)| {
                let steps: Vec<Step> = steps
                    .into_iter()
                    .filter(|step| !step.is_empty())
                    .take(MAX_STEPS_PER_AXIS)
                    .collect();
                (!steps.is_empty()).then_some((axis, steps))
            })
            .collect();
        Self { steps }
    }

    /// Build a row from per-axis command strings such as `x(100,d500,200)`
    ///
    /// Unlike [`Row::from_steps`], an axis with more than five steps is an
    /// error rather than being cut short.
    pub fn from_commands<I, S>(commands: I) -> Result<Self, ProtocolError>
    where
        I: IntoIterator<Item = (Axis, S)>,
        S: AsRef<str>,
    {
        let mut steps = Vec::new();
        for (axis, command) in commands {
            let command = command.as_ref();
            let (decoded, axis_steps) = decode_axis_command(command)?;
            if decoded != axis {
                return Err(ProtocolError::MalformedCommand {
                    command: command.to_string(),
                    reason: format!("expected axis {}", axis),
                });
            }
            let count = axis_steps.iter().filter(|step| !step.is_empty()).count();
            if count > MAX_STEPS_PER_AXIS {
                return Err(ProtocolError::MalformedCommand {
                    command: command.to_string(),
                    reason: format!(
                        "{} steps, at most {} allowed",
                        count, MAX_STEPS_PER_AXIS
                    ),
                });
            }
            steps.push((axis, axis_steps));
        }
        Ok(Self::from_steps(steps))
    }

    /// Build a row from a composite command such as `x(100), y(200,d500,300)`
    pub fn parse(command: &str) -> Result<Self, ProtocolError> {
        let commands = palletizer_core::split_commands(command)
            .into_iter()
            .map(|part| decode_axis_command(part).map(|(axis, _)| (axis, part)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_commands(commands)
    }

    /// True when no axis has a step
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Axes with at least one step, in wire order
    pub fn axes(&self) -> impl Iterator<Item = Axis> + '_ {
        self.steps.keys().copied()
    }

    /// Steps of one axis
    pub fn steps(&self, axis: Axis) -> Option<&[Step]> {
        self.steps.get(&axis).map(Vec::as_slice)
    }

    /// Command string of one axis
    pub fn axis_command(&self, axis: Axis) -> Option<String> {
        self.steps
            .get(&axis)
            .and_then(|steps| encode_axis_command(axis, steps))
    }

    /// Command string of every axis
    pub fn commands(&self) -> BTreeMap<Axis, String> {
        self.steps
            .iter()
            .filter_map(|(axis, steps)| encode_axis_command(*axis, steps).map(|cmd| (*axis, cmd)))
            .collect()
    }

    /// Composite command sent for the whole row
    pub fn command(&self) -> String {
        self.commands()
            .into_values()
            .collect::<Vec<_>>()
            .join(ROW_COMMAND_SEPARATOR)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.commands())
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        let commands = raw
            .iter()
            .map(|(key, command)| {
                key.parse::<Axis>()
                    .map(|axis| (axis, command.as_str()))
                    .map_err(de::Error::custom)
            })
            .collect::<Result<Vec<_>, D::Error>>()?;
        let row = Row::from_commands(commands).map_err(de::Error::custom)?;
        if row.is_empty() {
            return Err(de::Error::custom("row has no axis commands"));
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_steps_drops_empty_axes_and_caps_steps() {
        let row = Row::from_steps([
            (Axis::X, (1..=7).map(Step::position).collect()),
            (Axis::Y, vec![Step::default()]),
            (Axis::Z, vec![]),
        ]);
        assert_eq!(row.axes().collect::<Vec<_>>(), vec![Axis::X]);
        assert_eq!(row.steps(Axis::X).map(<[Step]>::len), Some(MAX_STEPS_PER_AXIS));
        assert_eq!(row.command(), "x(1,2,3,4,5)");
    }

    #[test]
    fn test_composite_command_in_axis_order() {
        let row = Row::from_steps([
            (Axis::Y, vec![Step::position(200), Step::delayed(500, 300)]),
            (Axis::X, vec![Step::position(100)]),
        ]);
        assert_eq!(row.command(), "x(100), y(200,d500,300)");
        assert_eq!(row.axis_command(Axis::Y).as_deref(), Some("y(200,d500,300)"));
        assert_eq!(row.axis_command(Axis::G), None);
    }

    #[test]
    fn test_edit_round_trip_is_lossless() {
        let row = Row::parse("x(100), y(200,d500,300), z(d250)").unwrap();
        let edited = Row::from_steps(
            row.axes()
                .map(|axis| (axis, row.steps(axis).unwrap_or_default().to_vec())),
        );
        assert_eq!(edited, row);
        assert_eq!(edited.command(), "x(100), y(200,d500,300), z(d250)");
    }

    #[test]
    fn test_from_commands_checks_axis() {
        assert!(Row::from_commands([(Axis::X, "y(100)")]).is_err());
        assert!(Row::from_commands([(Axis::X, "x(1,")]).is_err());
        assert!(Row::parse("x(1), bogus").is_err());
        assert!(Row::from_commands([(Axis::X, "x(1,2,3,4,5,6)")]).is_err());
        assert_eq!(
            Row::from_commands([(Axis::X, "x(1,2,3,4,5)")]).map(|row| row.command()),
            Ok("x(1,2,3,4,5)".to_string())
        );
    }

    #[test]
    fn test_yaml_shape() {
        let row = Row::parse("x(100), y(200,d500,300)").unwrap();
        let yaml = serde_yaml::to_string(&row).unwrap();
        let back: Row = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, row);

        let parsed: Row = serde_yaml::from_str("x: x(5)\n'y': y(d10,6)\n").unwrap();
        assert_eq!(parsed.command(), "x(5), y(d10,6)");
        assert!(serde_yaml::from_str::<Row>("w: w(5)\n").is_err());
        assert!(serde_yaml::from_str::<Row>("{}").is_err());
    }
}
