//! Defines all outbound events broadcast by the worker.
//!
//! Every live foreground controller receives every event; there is no
//! point-to-point reply and nothing is queued for controllers that are not
//! listening.

use crate::components::phase::{Mode, SessionKind};
use crate::components::session::{Completion, StatusSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An event sent from the worker to its controllers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Event {
    /// A phase began running (by start, auto-start, startNext, or resume).
    PhaseStarted {
        mode: Mode,
        label: String,
        color: String,
    },
    /// Periodic progress while running. Seconds are rounded down.
    Tick { remaining_seconds: u64 },
    /// A phase ran to completion and should be recorded.
    SessionCompleted {
        session_type: SessionKind,
        duration_seconds: u64,
    },
    /// The cycle moved from one phase to the next.
    PhaseCompleted {
        old_mode: Mode,
        new_mode: Mode,
        auto_start: bool,
        completed_duration_seconds: u64,
        completed_work_sessions: u32,
    },
    /// Reply to `getStatus`.
    Status {
        is_running: bool,
        is_paused: bool,
        remaining_seconds: u64,
        mode: Mode,
        completed_work_sessions: u32,
    },
    /// A payload relayed from a fired alarm or an activated notification.
    Relay { message: Value },
}

impl Event {
    pub fn phase_started(mode: Mode) -> Self {
        Event::PhaseStarted {
            mode,
            label: mode.label().to_string(),
            color: mode.accent_color().to_string(),
        }
    }

    pub fn session_completed(completion: &Completion) -> Self {
        Event::SessionCompleted {
            session_type: completion.old_mode.session_kind(),
            duration_seconds: completion.completed_duration_secs,
        }
    }

    pub fn phase_completed(completion: &Completion) -> Self {
        Event::PhaseCompleted {
            old_mode: completion.old_mode,
            new_mode: completion.new_mode,
            auto_start: completion.auto_started,
            completed_duration_seconds: completion.completed_duration_secs,
            completed_work_sessions: completion.completed_work_sessions,
        }
    }

    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Event::PhaseStarted { .. } => "phaseStarted",
            Event::Tick { .. } => "tick",
            Event::SessionCompleted { .. } => "sessionCompleted",
            Event::PhaseCompleted { .. } => "phaseCompleted",
            Event::Status { .. } => "status",
            Event::Relay { .. } => "relay",
        }
    }
}

impl From<StatusSnapshot> for Event {
    fn from(snapshot: StatusSnapshot) -> Self {
        Event::Status {
            is_running: snapshot.is_running,
            is_paused: snapshot.is_paused,
            remaining_seconds: snapshot.remaining_seconds,
            mode: snapshot.mode,
            completed_work_sessions: snapshot.completed_work_sessions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_camel_case_wire_shape() {
        let completion = Completion {
            old_mode: Mode::Work,
            new_mode: Mode::LongBreak,
            completed_duration_secs: 1500,
            completed_work_sessions: 4,
            auto_started: false,
        };
        assert_eq!(
            serde_json::to_value(Event::phase_completed(&completion)).unwrap(),
            json!({
                "type": "phaseCompleted",
                "oldMode": "work",
                "newMode": "long_break",
                "autoStart": false,
                "completedDurationSeconds": 1500,
                "completedWorkSessions": 4
            })
        );
        assert_eq!(
            serde_json::to_value(Event::session_completed(&completion)).unwrap(),
            json!({ "type": "sessionCompleted", "sessionType": "study", "durationSeconds": 1500 })
        );
    }

    #[test]
    fn phase_started_carries_display_hints() {
        assert_eq!(
            serde_json::to_value(Event::phase_started(Mode::ShortBreak)).unwrap(),
            json!({
                "type": "phaseStarted",
                "mode": "short_break",
                "label": "Short Break",
                "color": "#f59e0b"
            })
        );
        assert_eq!(Event::Tick { remaining_seconds: 3 }.name(), "tick");
    }
}
