//! Line-oriented operator console
//!
//! Parses one typed line into a [`ConsoleCommand`] and runs it against a
//! [`Controller`]. Row numbers are one-based, as shown by `rows`.

use crate::controller::Controller;
use palletizer_core::{Axis, Error, GlobalCommand, Result};
use palletizer_sequence::{Row, RunOutcome};
use std::path::PathBuf;

/// Help text listing every console command
pub const HELP: &str = "\
Commands:
  start | zero | pause | resume | reset   global commands
  speed [AXIS] N                          set speed of one axis or all
  jog AXIS N                              move one axis to N
  add x(100), y(200,d500,300)             append a row
  delete N | clear                        remove one row or all rows
  rows                                    list rows
  run | next | stop                       run from row 1, advance, abandon
  row N | axis N AXIS                     run one row, or one axis of a row
  save PATH | load PATH                   write or read a sequence file
  pos                                     show axis positions
  help | quit
Anything else is sent to the master as typed.";

/// One parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Global(GlobalCommand),
    Speed { axis: Option<Axis>, speed: u32 },
    Jog { axis: Axis, position: i32 },
    AddRow(Row),
    DeleteRow(usize),
    ClearRows,
    ListRows,
    RunAll,
    RunNext,
    Stop,
    RunRow(usize),
    RunAxis { row: usize, axis: Axis },
    Save(PathBuf),
    Load(PathBuf),
    Positions,
    Help,
    Quit,
    Raw(String),
}

fn usage(text: &str) -> Error {
    Error::other(format!("Usage: {text}"))
}

fn parse_axis(text: &str) -> Result<Axis> {
    Ok(text.parse::<Axis>()?)
}

fn parse_row_number(text: &str) -> Result<usize> {
    match text.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(Error::other(format!("Invalid row number '{text}'"))),
    }
}

impl ConsoleCommand {
    /// Parse a typed line; `None` for a blank line
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();
        let rest = line[head.len()..].trim();

        if let Some(command) = GlobalCommand::from_wire(line) {
            return Ok(Some(ConsoleCommand::Global(command)));
        }

        let command = match (head.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("speed", [speed]) => ConsoleCommand::Speed {
                axis: None,
                speed: speed.parse().map_err(|_| usage("speed [AXIS] N"))?,
            },
            ("speed", [axis, speed]) => ConsoleCommand::Speed {
                axis: Some(parse_axis(axis)?),
                speed: speed.parse().map_err(|_| usage("speed [AXIS] N"))?,
            },
            ("speed", _) => return Err(usage("speed [AXIS] N")),
            ("jog", [axis, position]) => ConsoleCommand::Jog {
                axis: parse_axis(axis)?,
                position: position.parse().map_err(|_| usage("jog AXIS N"))?,
            },
            ("jog", _) => return Err(usage("jog AXIS N")),
            ("add", _) if !rest.is_empty() => ConsoleCommand::AddRow(Row::parse(rest)?),
            ("add", _) => return Err(usage("add x(100), y(200,d500,300)")),
            ("delete", [row]) => ConsoleCommand::DeleteRow(parse_row_number(row)?),
            ("delete", _) => return Err(usage("delete N")),
            ("clear", []) => ConsoleCommand::ClearRows,
            ("rows", []) => ConsoleCommand::ListRows,
            ("run", []) => ConsoleCommand::RunAll,
            ("next", []) => ConsoleCommand::RunNext,
            ("stop", []) => ConsoleCommand::Stop,
            ("row", [row]) => ConsoleCommand::RunRow(parse_row_number(row)?),
            ("row", _) => return Err(usage("row N")),
            ("axis", [row, axis]) => ConsoleCommand::RunAxis {
                row: parse_row_number(row)?,
                axis: parse_axis(axis)?,
            },
            ("axis", _) => return Err(usage("axis N AXIS")),
            ("save", _) if !rest.is_empty() => ConsoleCommand::Save(PathBuf::from(rest)),
            ("save", _) => return Err(usage("save PATH")),
            ("load", _) if !rest.is_empty() => ConsoleCommand::Load(PathBuf::from(rest)),
            ("load", _) => return Err(usage("load PATH")),
            ("pos", []) => ConsoleCommand::Positions,
            ("help" | "?", []) => ConsoleCommand::Help,
            ("quit" | "exit", []) => ConsoleCommand::Quit,
            _ => ConsoleCommand::Raw(line.to_string()),
        };
        Ok(Some(command))
    }

    /// Run the command, returning text to show the operator
    pub fn execute(self, controller: &mut Controller) -> Result<String> {
        let reply = match self {
            ConsoleCommand::Global(command) => {
                controller.send_global(command)?;
                format!("Sent {command}")
            }
            ConsoleCommand::Speed { axis, speed } => {
                controller.set_speed(axis, speed)?;
                match axis {
                    Some(axis) => format!("Speed of {} set to {speed}", axis.label()),
                    None => format!("Speed of all axes set to {speed}"),
                }
            }
            ConsoleCommand::Jog { axis, position } => {
                let sent = controller.jog(axis, position)?;
                format!("{} -> {sent}", axis.label())
            }
            ConsoleCommand::AddRow(row) => {
                let index = controller.add_row(row)?;
                controller
                    .rows()
                    .row_text(index)
                    .unwrap_or_default()
            }
            ConsoleCommand::DeleteRow(index) => {
                let row = controller.delete_row(index)?;
                format!("Deleted row {}: {}", index + 1, row.command())
            }
            ConsoleCommand::ClearRows => {
                controller.clear_rows();
                "All rows cleared".to_string()
            }
            ConsoleCommand::ListRows => {
                if controller.rows().is_empty() {
                    "No rows".to_string()
                } else {
                    controller.rows().describe().trim_end().to_string()
                }
            }
            ConsoleCommand::RunAll => describe_outcome(&controller.run_all()?),
            ConsoleCommand::RunNext => describe_outcome(&controller.run_next()?),
            ConsoleCommand::Stop => {
                controller.stop_execution();
                "Execution stopped".to_string()
            }
            ConsoleCommand::RunRow(index) => describe_outcome(&controller.run_row(index)?),
            ConsoleCommand::RunAxis { row, axis } => {
                describe_outcome(&controller.run_axis(row, axis)?)
            }
            ConsoleCommand::Save(path) => {
                controller.save_sequence_file(&path)?;
                format!("Saved to {}", path.display())
            }
            ConsoleCommand::Load(path) => {
                let name = controller.load_sequence_file(&path)?;
                format!("Loaded '{}' ({} rows)", name, controller.rows().len())
            }
            ConsoleCommand::Positions => positions(controller),
            ConsoleCommand::Help => HELP.to_string(),
            ConsoleCommand::Quit => String::new(),
            ConsoleCommand::Raw(text) => {
                controller.send_manual(&text)?;
                format!("Sent {text}")
            }
        };
        Ok(reply)
    }
}

fn describe_outcome(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Dispatched { row, commands } => {
            let sent: Vec<String> = commands.iter().map(|c| c.to_wire()).collect();
            format!("Row {}: {}", row + 1, sent.join(" | "))
        }
        RunOutcome::Finished => "Sequence finished".to_string(),
    }
}

fn positions(controller: &Controller) -> String {
    let state = controller.state();
    Axis::ALL
        .iter()
        .map(|axis| format!("{}={}", axis.label(), state.display_position(*axis)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ConsoleCommand {
        ConsoleCommand::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(ConsoleCommand::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_globals_are_case_insensitive() {
        assert_eq!(parse("start"), ConsoleCommand::Global(GlobalCommand::Start));
        assert_eq!(parse("ZERO"), ConsoleCommand::Global(GlobalCommand::Zero));
    }

    #[test]
    fn test_speed_and_jog() {
        assert_eq!(
            parse("speed 1500"),
            ConsoleCommand::Speed {
                axis: None,
                speed: 1500
            }
        );
        assert_eq!(
            parse("speed T 800"),
            ConsoleCommand::Speed {
                axis: Some(Axis::T),
                speed: 800
            }
        );
        assert_eq!(
            parse("jog z -250"),
            ConsoleCommand::Jog {
                axis: Axis::Z,
                position: -250
            }
        );
        assert!(ConsoleCommand::parse("jog w 5").is_err());
        assert!(ConsoleCommand::parse("speed fast").is_err());
    }

    #[test]
    fn test_rows_are_one_based() {
        assert_eq!(parse("row 1"), ConsoleCommand::RunRow(0));
        assert_eq!(
            parse("axis 2 y"),
            ConsoleCommand::RunAxis {
                row: 1,
                axis: Axis::Y
            }
        );
        assert!(ConsoleCommand::parse("row 0").is_err());
    }

    #[test]
    fn test_add_keeps_whole_composite() {
        match parse("add x(100), y(200,d500,300)") {
            ConsoleCommand::AddRow(row) => assert_eq!(row.command(), "x(100), y(200,d500,300)"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(ConsoleCommand::parse("add").is_err());
    }

    #[test]
    fn test_paths_keep_spaces() {
        assert_eq!(
            parse("save my stack.yaml"),
            ConsoleCommand::Save(PathBuf::from("my stack.yaml"))
        );
    }

    #[test]
    fn test_unknown_text_is_raw() {
        assert_eq!(parse("x(100)"), ConsoleCommand::Raw("x(100)".to_string()));
    }

    #[test]
    fn test_positions_line() {
        let mut controller = Controller::new(&crate::AppConfig::default());
        assert_eq!(
            ConsoleCommand::Positions.execute(&mut controller).unwrap(),
            "X=0 Y=0 Z=0 T=0 G=0"
        );
    }
}
