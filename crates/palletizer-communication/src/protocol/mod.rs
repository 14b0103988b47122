//! Master controller protocol responses

pub mod response_parser;

pub use response_parser::{parse_response, DeviceResponse};
