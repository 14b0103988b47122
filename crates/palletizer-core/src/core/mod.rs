//! Controller-side state: events and position tracking

pub mod event;
pub mod tracker;

pub use event::{drain_events, ControllerEvent, EventDispatcher};
pub use tracker::PositionTracker;
