//! Port enumeration on the host running the tests

use palletizer_communication::communication::serial::list_ports;

#[test]
fn test_listed_ports_match_controller_patterns() {
    // Hosts without serial hardware simply list nothing.
    match list_ports() {
        Ok(ports) => {
            for port in ports {
                let name = port.port_name.as_str();
                assert!(
                    name.starts_with("COM")
                        || name.starts_with("/dev/ttyUSB")
                        || name.starts_with("/dev/ttyACM")
                        || name.starts_with("/dev/cu.usb"),
                    "unexpected port {}",
                    name
                );
            }
        }
        Err(e) => {
            // Some CI sandboxes have no udev; enumeration failure is reported, not panicked.
            eprintln!("Port enumeration unavailable: {}", e);
        }
    }
}
