//! Microphone state types.

/// Marker line printed when the microphone becomes busy.
pub const MARKER_RUNNING: &str = "STATE_RUNNING";

/// Marker line printed when the microphone becomes idle.
pub const MARKER_STOPPED: &str = "STATE_STOPPED";

/// Whether anything on the host is capturing from the microphone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MicState {
    /// No application is capturing
    Idle,
    /// At least one application is capturing
    Active,
}

impl MicState {
    pub fn is_active(self) -> bool {
        matches!(self, MicState::Active)
    }

    /// The machine-parsable marker for this state.
    pub fn marker(self) -> &'static str {
        match self {
            MicState::Active => MARKER_RUNNING,
            MicState::Idle => MARKER_STOPPED,
        }
    }

    /// Classify a line read back from a micwatch output stream.
    ///
    /// Lines are matched on the marker substring so both the text and the
    /// json output formats are understood. Banner and status lines yield
    /// `None`.
    pub fn from_marker_line(line: &str) -> Option<Self> {
        if line.contains(MARKER_RUNNING) {
            Some(MicState::Active)
        } else if line.contains(MARKER_STOPPED) {
            Some(MicState::Idle)
        } else {
            None
        }
    }
}

impl From<bool> for MicState {
    fn from(active: bool) -> Self {
        if active {
            MicState::Active
        } else {
            MicState::Idle
        }
    }
}

impl From<MicState> for bool {
    fn from(state: MicState) -> Self {
        state.is_active()
    }
}
