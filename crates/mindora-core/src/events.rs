use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::breathing::{Phase, SessionState};

/// Every state change of a breathing session produces an Event.
/// The host prints or renders them; nothing else consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionOpened {
        session_type: String,
        /// Whether a saved snapshot was picked up.
        restored: bool,
        state: SessionState,
        at: DateTime<Utc>,
    },
    SessionStarted {
        session_type: String,
        phase: Phase,
        seconds_left_in_phase: u32,
        total_seconds: u32,
        at: DateTime<Utc>,
    },
    SessionPaused {
        phase: Phase,
        seconds_left_in_phase: u32,
        progress_left: u32,
        at: DateTime<Utc>,
    },
    SessionResumed {
        phase: Phase,
        seconds_left_in_phase: u32,
        progress_left: u32,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        phase: Phase,
        seconds_left_in_phase: u32,
        cycles_completed: u32,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        session_type: String,
        duration_seconds: u32,
        cycles_completed: u32,
        at: DateTime<Utc>,
    },
    SessionReset {
        session_type: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        session_type: String,
        state: SessionState,
        phase: Phase,
        phase_label: String,
        seconds_left_in_phase: u32,
        progress_left: u32,
        total_seconds: u32,
        cycles_completed: u32,
        progress_pct: u8,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::SessionOpened { .. } => "session_opened",
            Event::SessionStarted { .. } => "session_started",
            Event::SessionPaused { .. } => "session_paused",
            Event::SessionResumed { .. } => "session_resumed",
            Event::PhaseChanged { .. } => "phase_changed",
            Event::SessionCompleted { .. } => "session_completed",
            Event::SessionReset { .. } => "session_reset",
            Event::StateSnapshot { .. } => "state_snapshot",
        }
    }
}
