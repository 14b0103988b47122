//! # Palletizer Sequence
//!
//! Sequence rows, the row store, the step-by-step executor driven by the
//! master's completion handshake, and named sequences saved as YAML.

pub mod executor;
pub mod library;
pub mod row;
pub mod store;

pub use executor::{ExecutionCursor, ExecutionState, RunOutcome, SequenceExecutor};
pub use library::{SequenceFile, SequenceLibrary, DEFAULT_SEQUENCE_NAME};
pub use row::Row;
pub use store::RowStore;
