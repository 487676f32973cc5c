//! Event types emitted by the monitor.
//!
//! These events carry state changes to an output sink without depending on
//! any specific output surface.

use crate::MicState;

/// Why an event was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// First observation after startup, establishes the baseline
    Initial,
    /// The state differs from the last reported one
    Transition,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Initial => "initial",
            EventKind::Transition => "transition",
        }
    }
}

/// A reported microphone state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateEvent {
    pub state: MicState,
    pub kind: EventKind,
}

impl StateEvent {
    pub fn new(state: MicState, kind: EventKind) -> Self {
        Self { state, kind }
    }
}
