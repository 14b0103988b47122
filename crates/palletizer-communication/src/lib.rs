//! # Palletizer Communication
//!
//! Serial link to the palletizer master controller.
//! Provides port discovery, the dedicated I/O worker that owns the port, and
//! parsing of the master's feedback and slave status lines.

pub mod communication;
pub mod protocol;

pub use communication::{
    line_buffer::LineBuffer,
    serial::{list_ports, RealSerialPort, SerialPort, SerialPortInfo},
    worker::{SerialWorker, WorkerEvent},
    ConnectionParams, SerialParity,
};

pub use protocol::{parse_response, DeviceResponse};
