//! Protocol and controller constants

/// Default serial baud rate
pub const DEFAULT_BAUDRATE: u32 = 115_200;

/// Baud rates offered for the master controller link
pub const BAUDRATES: [u32; 5] = [9600, 19200, 38400, 57600, 115_200];

/// Minimum axis speed accepted by the slaves
pub const MIN_SPEED: u32 = 100;

/// Maximum axis speed accepted by the slaves
pub const MAX_SPEED: u32 = 2000;

/// Speed every axis starts with
pub const DEFAULT_SPEED: u32 = 1000;

/// Maximum number of steps an axis may carry within one sequence row
pub const MAX_STEPS_PER_AXIS: usize = 5;

/// Default lower bound of the position clamp range
pub const DEFAULT_MIN_POSITION: i32 = -10_000;

/// Default upper bound of the position clamp range
pub const DEFAULT_MAX_POSITION: i32 = 10_000;

/// Prefix of master-level status lines
pub const FEEDBACK_PREFIX: &str = "[FEEDBACK]";

/// Prefix of per-axis status lines forwarded from a slave
pub const SLAVE_PREFIX: &str = "[SLAVE]";

/// Feedback text signalling that every slave finished its current command
pub const ALL_SLAVES_COMPLETED: &str = "ALL_SLAVES_COMPLETED";

/// Keyword opening a speed command
pub const SPEED_KEYWORD: &str = "SPEED";

/// Separator between the fields of a speed command and of slave lines
pub const FIELD_SEPARATOR: char = ';';

/// Separator placed between per-axis commands of a composite row command
pub const ROW_COMMAND_SEPARATOR: &str = ", ";

/// Read timeout applied to the serial port
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 500;

/// Sleep between two iterations of the serial worker loop
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;
