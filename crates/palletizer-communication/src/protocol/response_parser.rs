//! Response parser for lines received from the master controller
//!
//! The master tags its own status as `[FEEDBACK] <text>` and forwards slave
//! status as `[SLAVE] <axis>;<text>`. The feedback text
//! `ALL_SLAVES_COMPLETED` is the completion handshake that lets a running
//! sequence advance.

use palletizer_core::constants::{
    ALL_SLAVES_COMPLETED, FEEDBACK_PREFIX, FIELD_SEPARATOR, SLAVE_PREFIX,
};
use palletizer_core::Axis;
use std::fmt;

/// One decoded line from the master controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceResponse {
    /// Master-level status text
    Feedback(String),
    /// Every slave finished its current command
    AllSlavesCompleted,
    /// Status forwarded from the slave driving an axis
    Slave {
        /// The reporting axis
        axis: Axis,
        /// Status text
        message: String,
    },
    /// Any other line
    Message(String),
}

impl DeviceResponse {
    /// Whether this is the completion handshake
    pub fn is_completion(&self) -> bool {
        matches!(self, DeviceResponse::AllSlavesCompleted)
    }
}

impl fmt::Display for DeviceResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feedback(text) => write!(f, "{} {}", FEEDBACK_PREFIX, text),
            Self::AllSlavesCompleted => write!(f, "{} {}", FEEDBACK_PREFIX, ALL_SLAVES_COMPLETED),
            Self::Slave { axis, message } => {
                write!(f, "{} {}{}{}", SLAVE_PREFIX, axis, FIELD_SEPARATOR, message)
            }
            Self::Message(text) => write!(f, "{}", text),
        }
    }
}

/// Parse one inbound line
///
/// Returns `None` for blank lines. Slave lines with an unknown axis or no
/// separator are kept as plain messages.
pub fn parse_response(line: &str) -> Option<DeviceResponse> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(feedback) = line.strip_prefix(FEEDBACK_PREFIX) {
        let feedback = feedback.trim();
        if feedback == ALL_SLAVES_COMPLETED {
            return Some(DeviceResponse::AllSlavesCompleted);
        }
        return Some(DeviceResponse::Feedback(feedback.to_string()));
    }

    if let Some(slave) = line.strip_prefix(SLAVE_PREFIX) {
        if let Some((id, message)) = slave.split_once(FIELD_SEPARATOR) {
            if let Some(axis) = Axis::from_id(id) {
                return Some(DeviceResponse::Slave {
                    axis,
                    message: message.trim().to_string(),
                });
            }
        }
        tracing::debug!("Unrecognised slave line '{}'", line);
    }

    Some(DeviceResponse::Message(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_handshake() {
        assert_eq!(
            parse_response("[FEEDBACK] ALL_SLAVES_COMPLETED\r"),
            Some(DeviceResponse::AllSlavesCompleted)
        );
        assert!(parse_response("[FEEDBACK]ALL_SLAVES_COMPLETED")
            .unwrap()
            .is_completion());
    }

    #[test]
    fn test_feedback_text() {
        assert_eq!(
            parse_response("[FEEDBACK] ZERO DONE"),
            Some(DeviceResponse::Feedback("ZERO DONE".to_string()))
        );
        assert_eq!(
            parse_response("[FEEDBACK] NOT ALL_SLAVES_COMPLETED"),
            Some(DeviceResponse::Feedback(
                "NOT ALL_SLAVES_COMPLETED".to_string()
            ))
        );
    }

    #[test]
    fn test_slave_lines() {
        assert_eq!(
            parse_response("[SLAVE] X;POSITION REACHED"),
            Some(DeviceResponse::Slave {
                axis: Axis::X,
                message: "POSITION REACHED".to_string()
            })
        );
        assert_eq!(
            parse_response("[SLAVE] w;hello"),
            Some(DeviceResponse::Message("[SLAVE] w;hello".to_string()))
        );
        assert_eq!(
            parse_response("[SLAVE] x"),
            Some(DeviceResponse::Message("[SLAVE] x".to_string()))
        );
    }

    #[test]
    fn test_other_lines() {
        assert_eq!(parse_response("   "), None);
        assert_eq!(
            parse_response("DONE"),
            Some(DeviceResponse::Message("DONE".to_string()))
        );
    }

    #[test]
    fn test_display() {
        let response = DeviceResponse::Slave {
            axis: Axis::G,
            message: "OPEN".to_string(),
        };
        assert_eq!(response.to_string(), "[SLAVE] g;OPEN");
    }
}
