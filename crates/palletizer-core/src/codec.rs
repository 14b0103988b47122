//! Command codec for the palletizer line protocol
//!
//! Converts between structured axis steps and the textual commands understood
//! by the master controller:
//!
//! ```text
//! axis_cmd   := AXIS "(" step ("," step)* ")"
//! step       := SIGNED_INT | "d" UNSIGNED_INT
//! global_cmd := "START" | "ZERO" | "PAUSE" | "RESUME" | "RESET"
//! speed_cmd  := "SPEED;" AXIS ";" NUMBER | "SPEED;" NUMBER
//! multi_cmd  := axis_cmd ("," axis_cmd)*
//! ```
//!
//! Two decoders are provided. [`parse_command`] is best-effort and is what the
//! position tracker runs over every outgoing command: malformed parts are
//! skipped silently. [`decode_axis_command`] is strict and is used to turn
//! persisted row commands back into steps.

use crate::constants::{FIELD_SEPARATOR, SPEED_KEYWORD};
use crate::data::{validate_speed, Axis, Step};
use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Commands addressed to the master controller as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlobalCommand {
    /// Begin executing the queued motion
    Start,
    /// Declare the current position of every axis as zero
    Zero,
    /// Pause motion
    Pause,
    /// Resume paused motion
    Resume,
    /// Stop everything and reset the slaves
    Reset,
}

impl GlobalCommand {
    /// Every global command
    pub const ALL: [GlobalCommand; 5] = [
        GlobalCommand::Start,
        GlobalCommand::Zero,
        GlobalCommand::Pause,
        GlobalCommand::Resume,
        GlobalCommand::Reset,
    ];

    /// Wire text of the command
    pub fn as_str(self) -> &'static str {
        match self {
            GlobalCommand::Start => "START",
            GlobalCommand::Zero => "ZERO",
            GlobalCommand::Pause => "PAUSE",
            GlobalCommand::Resume => "RESUME",
            GlobalCommand::Reset => "RESET",
        }
    }

    /// Recognise a global command, ignoring case and surrounding whitespace
    pub fn from_wire(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.as_str().eq_ignore_ascii_case(text))
    }
}

impl fmt::Display for GlobalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speed change for one axis or for all of them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedCommand {
    /// Target axis, `None` for every axis
    pub axis: Option<Axis>,
    /// New speed
    pub speed: u32,
}

impl SpeedCommand {
    /// Build a speed command, rejecting speeds the slaves do not accept
    pub fn new(axis: Option<Axis>, speed: u32) -> Result<Self, ProtocolError> {
        Ok(Self {
            axis,
            speed: validate_speed(speed)?,
        })
    }

    /// Wire text, e.g. `SPEED;x;1500` or `SPEED;1500`
    pub fn to_wire(&self) -> String {
        match self.axis {
            Some(axis) => format!(
                "{SPEED_KEYWORD}{FIELD_SEPARATOR}{axis}{FIELD_SEPARATOR}{}",
                self.speed
            ),
            None => format!("{SPEED_KEYWORD}{FIELD_SEPARATOR}{}", self.speed),
        }
    }

    /// Parse a speed command from wire text
    pub fn parse(text: &str) -> Option<Self> {
        let mut fields = text.trim().split(FIELD_SEPARATOR).map(str::trim);
        if !fields.next()?.eq_ignore_ascii_case(SPEED_KEYWORD) {
            return None;
        }
        let rest: Vec<&str> = fields.collect();
        match rest.as_slice() {
            [speed] => Some(Self {
                axis: None,
                speed: speed.parse().ok()?,
            }),
            [axis, speed] => Some(Self {
                axis: Some(Axis::from_id(axis)?),
                speed: speed.parse().ok()?,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for SpeedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// Any command sent to the master controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundCommand {
    /// Global command
    Global(GlobalCommand),
    /// Speed command
    Speed(SpeedCommand),
    /// Single or composite axis command
    Axis(String),
    /// Free-form text typed by the operator
    Raw(String),
}

impl OutboundCommand {
    /// Wire text without the newline terminator
    pub fn to_wire(&self) -> String {
        match self {
            OutboundCommand::Global(cmd) => cmd.as_str().to_string(),
            OutboundCommand::Speed(cmd) => cmd.to_wire(),
            OutboundCommand::Axis(text) | OutboundCommand::Raw(text) => text.clone(),
        }
    }

    /// Whether the position tracker should see this command
    pub fn moves_axes(&self) -> bool {
        matches!(self, OutboundCommand::Axis(_) | OutboundCommand::Raw(_))
    }

    /// Classify free-form operator text
    pub fn classify(text: &str) -> Self {
        if let Some(cmd) = GlobalCommand::from_wire(text) {
            OutboundCommand::Global(cmd)
        } else if let Some(cmd) = SpeedCommand::parse(text) {
            OutboundCommand::Speed(cmd)
        } else {
            OutboundCommand::Raw(text.trim().to_string())
        }
    }
}

impl fmt::Display for OutboundCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// Wire tokens for a list of steps, delays before their positions
pub fn encode_tokens(steps: &[Step]) -> Vec<String> {
    let mut tokens = Vec::with_capacity(steps.len() * 2);
    for step in steps {
        if let Some(delay) = step.delay_ms {
            tokens.push(format!("d{delay}"));
        }
        if let Some(position) = step.position {
            tokens.push(position.to_string());
        }
    }
    tokens
}

/// Encode the steps of one axis, e.g. `x(100,d500,200)`
///
/// Returns `None` when there is nothing to send.
pub fn encode_axis_command(axis: Axis, steps: &[Step]) -> Option<String> {
    let tokens = encode_tokens(steps);
    if tokens.is_empty() {
        return None;
    }
    Some(format!("{}({})", axis, tokens.join(",")))
}

/// Single-position move, e.g. `z(250)`
pub fn jog_command(axis: Axis, position: i32) -> String {
    format!("{axis}({position})")
}

/// Split a composite command on commas outside parentheses
///
/// Parts are trimmed and empty parts dropped. Commas inside `(...)` never
/// split, and neither do commas after an unbalanced `)`.
pub fn split_commands(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;

    for (i, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Best-effort decode of one axis command into its absolute target
///
/// The target is the last position token; delay tokens are skipped. Anything
/// unparseable yields `None`.
pub fn parse_single_command(text: &str) -> Option<(Axis, i32)> {
    if !text.contains(')') {
        return None;
    }
    let open = text.find('(')?;
    let axis = Axis::from_id(&text[..open])?;

    let inner = &text[open + 1..];
    let end = inner.find(['(', ')']).unwrap_or(inner.len());

    let position = inner[..end]
        .split(',')
        .rev()
        .map(str::trim)
        .filter(|token| !token.starts_with('d'))
        .find_map(|token| token.parse::<i32>().ok())?;

    Some((axis, position))
}

/// Best-effort decode of a single or composite command
///
/// Returns one `(axis, target)` per part that could be understood, in order.
pub fn parse_command(text: &str) -> Vec<(Axis, i32)> {
    let targets: Vec<(Axis, i32)> = split_commands(text)
        .into_iter()
        .filter_map(|part| {
            let target = parse_single_command(part);
            if target.is_none() {
                tracing::debug!("Skipping unparseable command part '{}'", part);
            }
            target
        })
        .collect();
    targets
}

/// Strict decode of one axis command into its steps
///
/// A delay token attaches to the position that follows it; a delay with no
/// following position becomes a delay-only step.
pub fn decode_axis_command(text: &str) -> Result<(Axis, Vec<Step>), ProtocolError> {
    let malformed = |reason: &str| ProtocolError::MalformedCommand {
        command: text.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = text.trim();
    let open = trimmed.find('(').ok_or_else(|| malformed("missing '('"))?;
    let axis: Axis = trimmed[..open].parse()?;
    let inner = trimmed[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| malformed("missing closing ')'"))?;
    if inner.contains(['(', ')']) {
        return Err(malformed("nested parentheses"));
    }
    if inner.trim().is_empty() {
        return Err(malformed("no steps"));
    }

    let mut steps = Vec::new();
    let mut pending_delay: Option<u32> = None;

    for token in inner.split(',').map(str::trim) {
        if let Some(delay) = token.strip_prefix('d') {
            let delay = delay
                .parse::<u32>()
                .map_err(|_| malformed(&format!("invalid delay '{token}'")))?;
            if let Some(previous) = pending_delay.replace(delay) {
                steps.push(Step::delay(previous));
            }
        } else {
            let position = token
                .parse::<i32>()
                .map_err(|_| malformed(&format!("invalid position '{token}'")))?;
            steps.push(Step {
                position: Some(position),
                delay_ms: pending_delay.take(),
            });
        }
    }
    if let Some(delay) = pending_delay {
        steps.push(Step::delay(delay));
    }

    Ok((axis, steps))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_position_is_target() {
        assert_eq!(parse_single_command("x(100,200,300)"), Some((Axis::X, 300)));
        assert_eq!(parse_single_command("Y(-5)"), Some((Axis::Y, -5)));
    }

    #[test]
    fn test_trailing_delay_is_ignored() {
        assert_eq!(parse_single_command("x(100,d500)"), Some((Axis::X, 100)));
        assert_eq!(
            parse_single_command("y(200,d500,300)"),
            Some((Axis::Y, 300))
        );
    }

    #[test]
    fn test_malformed_single_commands_are_skipped() {
        assert_eq!(parse_single_command("x(100"), None);
        assert_eq!(parse_single_command("q(100)"), None);
        assert_eq!(parse_single_command("x(abc)"), None);
        assert_eq!(parse_single_command("z(d500)"), None);
        assert_eq!(parse_single_command("START"), None);
    }

    #[test]
    fn test_split_is_depth_aware() {
        assert_eq!(split_commands("x(1,2),y(3,4)"), vec!["x(1,2)", "y(3,4)"]);
        assert_eq!(split_commands("x(1,2,y(3))"), vec!["x(1,2,y(3))"]);
        assert_eq!(
            split_commands("x(100), y(200,d500,300)"),
            vec!["x(100)", "y(200,d500,300)"]
        );
    }

    #[test]
    fn test_parse_composite_command() {
        assert_eq!(
            parse_command("x(100), y(200,d500,300), bogus"),
            vec![(Axis::X, 100), (Axis::Y, 300)]
        );
        assert!(parse_command("").is_empty());
    }

    #[test]
    fn test_encode_steps() {
        let steps = [Step::position(100), Step::delayed(500, 200), Step::delay(50)];
        assert_eq!(
            encode_axis_command(Axis::X, &steps).as_deref(),
            Some("x(100,d500,200,d50)")
        );
        assert_eq!(encode_axis_command(Axis::X, &[]), None);
        assert_eq!(encode_axis_command(Axis::X, &[Step::default()]), None);
    }

    #[test]
    fn test_strict_decode() {
        let (axis, steps) = decode_axis_command("z(d500)").unwrap();
        assert_eq!(axis, Axis::Z);
        assert_eq!(steps, vec![Step::delay(500)]);

        let (_, steps) = decode_axis_command("x(100,d500,200)").unwrap();
        assert_eq!(steps, vec![Step::position(100), Step::delayed(500, 200)]);

        assert!(decode_axis_command("x(1,2").is_err());
        assert!(decode_axis_command("x(1,y(2))").is_err());
        assert!(decode_axis_command("w(1)").is_err());
        assert!(decode_axis_command("x()").is_err());
        assert!(decode_axis_command("x(d-1,2)").is_err());
    }

    #[test]
    fn test_global_and_speed_commands() {
        assert_eq!(GlobalCommand::from_wire(" start "), Some(GlobalCommand::Start));
        assert_eq!(GlobalCommand::from_wire("HOME"), None);

        let speed = SpeedCommand::new(Some(Axis::Z), 1500).unwrap();
        assert_eq!(speed.to_wire(), "SPEED;z;1500");
        assert_eq!(SpeedCommand::parse("SPEED;z;1500"), Some(speed));
        assert_eq!(SpeedCommand::new(None, 800).unwrap().to_wire(), "SPEED;800");
        assert!(SpeedCommand::new(None, 5000).is_err());
    }

    #[test]
    fn test_classify_operator_text() {
        assert_eq!(
            OutboundCommand::classify("pause"),
            OutboundCommand::Global(GlobalCommand::Pause)
        );
        assert!(matches!(
            OutboundCommand::classify("SPEED;1200"),
            OutboundCommand::Speed(_)
        ));
        assert_eq!(
            OutboundCommand::classify(" x(10) "),
            OutboundCommand::Raw("x(10)".to_string())
        );
    }
}
