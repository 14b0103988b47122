//! Serial port communication implementation
//!
//! Provides low-level serial port operations for the USB/UART link to the
//! palletizer master controller.
//!
//! Supports:
//! - Port enumeration and discovery
//! - Baud rate, parity, and stop bit configuration
//! - Short read timeouts so the worker loop never blocks for long

use super::{ConnectionParams, SerialParity};
use palletizer_core::ConnectionError;
use std::io::{self, Read, Write};

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Arduino Serial Port")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,

    /// USB vendor ID if applicable
    pub vid: Option<u16>,

    /// USB product ID if applicable
    pub pid: Option<u16>,
}

impl SerialPortInfo {
    /// Create a new port info
    pub fn new(port_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            description: description.into(),
            manufacturer: None,
            vid: None,
            pid: None,
        }
    }

    /// Set manufacturer
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Set USB IDs
    pub fn with_usb_ids(mut self, vid: u16, pid: u16) -> Self {
        self.vid = Some(vid);
        self.pid = Some(pid);
        self
    }
}

impl std::fmt::Display for SerialPortInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.port_name)?;
        if !self.description.is_empty() {
            write!(f, " ({})", self.description)?;
        }
        Ok(())
    }
}

/// List serial ports the master controller could be attached to
///
/// Keeps only names matching microcontroller patterns:
/// - Windows: COM*
/// - Linux: /dev/ttyUSB*, /dev/ttyACM*
/// - macOS: /dev/cu.usbserial-*, /dev/cu.usbmodem*
pub fn list_ports() -> Result<Vec<SerialPortInfo>, ConnectionError> {
    let ports = serialport::available_ports().map_err(|e| {
        tracing::error!("Failed to enumerate serial ports: {}", e);
        ConnectionError::Io {
            reason: format!("failed to enumerate ports: {}", e),
        }
    })?;

    Ok(ports
        .iter()
        .filter(|port| is_controller_port(&port.port_name))
        .map(|port| {
            let info = SerialPortInfo::new(&port.port_name, port_description(port));
            match &port.port_type {
                serialport::SerialPortType::UsbPort(usb) => {
                    let info = info.with_usb_ids(usb.vid, usb.pid);
                    match &usb.manufacturer {
                        Some(mfg) => info.with_manufacturer(mfg),
                        None => info,
                    }
                }
                _ => info,
            }
        })
        .collect())
}

fn is_controller_port(port_name: &str) -> bool {
    if let Some(number) = port_name.strip_prefix("COM") {
        return !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
    }

    port_name.starts_with("/dev/ttyUSB")
        || port_name.starts_with("/dev/ttyACM")
        || port_name.starts_with("/dev/cu.usbserial-")
        || port_name.starts_with("/dev/cu.usbmodem")
}

fn port_description(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        serialport::SerialPortType::UsbPort(usb) => format!(
            "USB {} {}",
            usb.manufacturer.as_deref().unwrap_or("Device"),
            usb.product.as_deref().unwrap_or("Serial Port")
        ),
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}

fn to_serialport_parity(parity: SerialParity) -> serialport::Parity {
    match parity {
        SerialParity::None => serialport::Parity::None,
        SerialParity::Even => serialport::Parity::Even,
        SerialParity::Odd => serialport::Parity::Odd,
    }
}

/// Low-level serial port interface
///
/// The I/O worker is the only owner of an implementation once connected.
pub trait SerialPort: Send {
    /// Write data to the port
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Flush buffered output
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Read data from the port
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Number of bytes ready to be read without blocking
    fn bytes_to_read(&mut self) -> io::Result<usize>;

    /// Get the port name
    fn name(&self) -> String;

    /// Close the port
    fn close(&mut self) -> io::Result<()>;
}

/// Real serial port implementation using serialport crate
pub struct RealSerialPort {
    port: Box<dyn serialport::SerialPort>,
    name: String,
}

impl RealSerialPort {
    /// Open a serial port with the given parameters
    pub fn open(params: &ConnectionParams) -> Result<Self, ConnectionError> {
        params.validate()?;

        let data_bits = match params.data_bits {
            5 => serialport::DataBits::Five,
            6 => serialport::DataBits::Six,
            7 => serialport::DataBits::Seven,
            _ => serialport::DataBits::Eight,
        };
        let stop_bits = match params.stop_bits {
            2 => serialport::StopBits::Two,
            _ => serialport::StopBits::One,
        };

        let builder = serialport::new(&params.port, params.baud_rate)
            .timeout(params.read_timeout())
            .data_bits(data_bits)
            .stop_bits(stop_bits)
            .parity(to_serialport_parity(params.parity))
            .flow_control(if params.flow_control {
                serialport::FlowControl::Hardware
            } else {
                serialport::FlowControl::None
            });

        match builder.open() {
            Ok(port) => {
                tracing::info!("Opened {} at {} baud", params.port, params.baud_rate);
                Ok(Self {
                    port,
                    name: params.port.clone(),
                })
            }
            Err(e) => {
                tracing::warn!("Failed to open serial port {}: {}", params.port, e);
                if e.kind() == serialport::ErrorKind::NoDevice {
                    Err(ConnectionError::PortNotFound {
                        port: params.port.clone(),
                    })
                } else {
                    Err(ConnectionError::FailedToOpen {
                        port: params.port.clone(),
                        reason: e.to_string(),
                    })
                }
            }
        }
    }
}

impl SerialPort for RealSerialPort {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.port.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }

    fn bytes_to_read(&mut self) -> io::Result<usize> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(io::Error::from)
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn close(&mut self) -> io::Result<()> {
        // The handle is released when the port is dropped.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_port_patterns() {
        assert!(is_controller_port("COM3"));
        assert!(!is_controller_port("COM"));
        assert!(!is_controller_port("COMX"));
        assert!(is_controller_port("/dev/ttyUSB0"));
        assert!(is_controller_port("/dev/ttyACM1"));
        assert!(is_controller_port("/dev/cu.usbmodem14101"));
        assert!(!is_controller_port("/dev/ttyS0"));
    }

    #[test]
    fn test_open_rejects_invalid_params() {
        let params = ConnectionParams::default();
        assert!(matches!(
            RealSerialPort::open(&params),
            Err(ConnectionError::InvalidParameters { .. })
        ));
    }
}
