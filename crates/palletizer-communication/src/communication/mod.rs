//! Serial link to the master controller
//!
//! Provides connection parameters, the serial port seam, newline framing of
//! inbound bytes, and the dedicated I/O worker that owns the port.

pub mod line_buffer;
pub mod serial;
pub mod worker;

use palletizer_core::constants::{
    BAUDRATES, DEFAULT_BAUDRATE, DEFAULT_POLL_INTERVAL_MS, DEFAULT_READ_TIMEOUT_MS,
};
use palletizer_core::ConnectionError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use line_buffer::LineBuffer;
pub use serial::{list_ports, RealSerialPort, SerialPort, SerialPortInfo};
pub use worker::{SerialWorker, WorkerEvent};

/// Parity setting of the serial line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerialParity {
    /// No parity bit
    #[default]
    None,
    /// Even parity
    Even,
    /// Odd parity
    Odd,
}

/// Parameters for opening the serial link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits (5-8)
    pub data_bits: u8,
    /// Stop bits (1-2)
    pub stop_bits: u8,
    /// Parity
    pub parity: SerialParity,
    /// Hardware flow control
    pub flow_control: bool,
    /// Read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Sleep between worker loop iterations in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUDRATE,
            data_bits: 8,
            stop_bits: 1,
            parity: SerialParity::None,
            flow_control: false,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ConnectionParams {
    /// Parameters for a port at the given baud rate, defaults elsewhere
    pub fn serial(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            ..Self::default()
        }
    }

    /// Read timeout as a duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Worker poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Check the parameters before opening a port
    pub fn validate(&self) -> Result<(), ConnectionError> {
        let invalid = |reason: String| Err(ConnectionError::InvalidParameters { reason });

        if self.port.trim().is_empty() {
            return invalid("no port selected".to_string());
        }
        if !BAUDRATES.contains(&self.baud_rate) {
            return invalid(format!("unsupported baud rate {}", self.baud_rate));
        }
        if !(5..=8).contains(&self.data_bits) {
            return invalid(format!("invalid data bits {}", self.data_bits));
        }
        if !(1..=2).contains(&self.stop_bits) {
            return invalid(format!("invalid stop bits {}", self.stop_bits));
        }
        if self.read_timeout_ms == 0 || self.poll_interval_ms == 0 {
            return invalid("timeouts must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_need_a_port() {
        assert!(ConnectionParams::default().validate().is_err());
        assert!(ConnectionParams::serial("/dev/ttyUSB0", 115_200)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_rejects_unsupported_baud() {
        let params = ConnectionParams::serial("/dev/ttyUSB0", 250_000);
        assert!(matches!(
            params.validate(),
            Err(ConnectionError::InvalidParameters { .. })
        ));
    }
}
