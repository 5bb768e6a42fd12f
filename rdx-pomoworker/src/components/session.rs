//! A single countdown bound to a phase, anchored to an absolute end time.
//!
//! The session never counts down by itself. Every query takes the current
//! time in epoch milliseconds and recomputes `end_time - now`, so delayed or
//! skipped ticks (device sleep, a stalled runtime) cannot make it drift.
//!
//! ## State Transitions
//!
//! ```text
//!            start                 pause
//!  Stopped ─────────► Running ─────────────► Paused
//!     ▲                │  ▲ │                  │
//!     │   completion   │  │ └── completion ────┘ resume
//!     └─(no auto)──────┘  └─(auto_start)
//!     ▲                                        │
//!     └──────────────── stop (any state) ──────┘
//! ```
//!
//! ## Rounding
//!
//! Displayed seconds are always the *floor* of the remaining milliseconds.
//! A UI therefore shows `0` for up to one second before the completion
//! event arrives. Resuming rounds the paused remainder *up* to a whole
//! second so a pause/resume round trip never shortens a phase.

use crate::components::phase::{next_phase, Mode};
use crate::config::PhaseConfig;
use serde::Serialize;

/// Which of the three mutually exclusive states the session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Stopped,
    Running { end_time_ms: i64 },
    Paused { remaining_ms: u64 },
}

/// The result of recomputing a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session is not running; the tick source should be dropped.
    Idle,
    /// Time is left in the current phase.
    Remaining { seconds: u64 },
    /// The current phase ended on this tick.
    Completed(Completion),
}

/// Describes one finished phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub old_mode: Mode,
    pub new_mode: Mode,
    /// The configured length of the phase that just ended.
    pub completed_duration_secs: u64,
    pub completed_work_sessions: u32,
    /// True when the session has already moved on and is running `new_mode`.
    pub auto_started: bool,
}

/// A point-in-time view of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub is_running: bool,
    pub is_paused: bool,
    pub remaining_seconds: u64,
    pub mode: Mode,
    pub completed_work_sessions: u32,
}

/// The countdown owned by the worker.
#[derive(Debug, Clone)]
pub struct TimerSession {
    config: Option<PhaseConfig>,
    mode: Mode,
    completed_work_sessions: u32,
    state: SessionState,
}

impl Default for TimerSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerSession {
    pub fn new() -> Self {
        Self {
            config: None,
            mode: Mode::Work,
            completed_work_sessions: 0,
            state: SessionState::Stopped,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> Option<&PhaseConfig> {
        self.config.as_ref()
    }

    pub fn completed_work_sessions(&self) -> u32 {
        self.completed_work_sessions
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SessionState::Running { .. })
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, SessionState::Paused { .. })
    }

    /// Milliseconds left in the current phase, never negative.
    pub fn remaining_ms(&self, now_ms: i64) -> u64 {
        match self.state {
            SessionState::Stopped => 0,
            SessionState::Running { end_time_ms } => clamp_ms(end_time_ms - now_ms),
            SessionState::Paused { remaining_ms } => remaining_ms,
        }
    }

    /// Whole seconds left in the current phase, rounded down.
    pub fn remaining_secs(&self, now_ms: i64) -> u64 {
        self.remaining_ms(now_ms) / 1000
    }

    pub fn snapshot(&self, now_ms: i64) -> StatusSnapshot {
        StatusSnapshot {
            is_running: self.is_running(),
            is_paused: self.is_paused(),
            remaining_seconds: self.remaining_secs(now_ms),
            mode: self.mode,
            completed_work_sessions: self.completed_work_sessions,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begins a fresh cycle: work phase, session counter reset to zero.
    pub fn begin(&mut self, config: PhaseConfig, now_ms: i64) {
        self.config = Some(config);
        self.completed_work_sessions = 0;
        self.start(config.duration_secs(Mode::Work), Mode::Work, now_ms);
    }

    /// Runs `mode` for `duration_secs` from `now_ms`, replacing whatever
    /// state the session was in.
    pub fn start(&mut self, duration_secs: u64, mode: Mode, now_ms: i64) {
        let duration_ms = i64::try_from(duration_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
        self.mode = mode;
        self.state = SessionState::Running {
            end_time_ms: now_ms.saturating_add(duration_ms),
        };
    }

    /// Restarts the current phase from its full configured length.
    ///
    /// Returns `false` if no cycle was ever begun.
    pub fn start_current(&mut self, now_ms: i64) -> bool {
        match self.config {
            Some(config) => {
                self.start(config.duration_secs(self.mode), self.mode, now_ms);
                true
            }
            None => false,
        }
    }

    /// Recomputes the remaining time and completes the phase if it is over.
    pub fn tick(&mut self, now_ms: i64) -> TickOutcome {
        let SessionState::Running { end_time_ms } = self.state else {
            return TickOutcome::Idle;
        };
        let remaining_ms = end_time_ms - now_ms;
        if remaining_ms > 0 {
            return TickOutcome::Remaining {
                seconds: clamp_ms(remaining_ms) / 1000,
            };
        }
        match self.complete(now_ms) {
            Some(completion) => TickOutcome::Completed(completion),
            None => TickOutcome::Idle,
        }
    }

    /// Freezes the countdown. Returns the remaining milliseconds if the
    /// session was running with time left.
    ///
    /// A session whose end time has already passed stays running so the
    /// next tick completes it.
    pub fn pause(&mut self, now_ms: i64) -> Option<u64> {
        let SessionState::Running { end_time_ms } = self.state else {
            return None;
        };
        let remaining_ms = clamp_ms(end_time_ms - now_ms);
        if remaining_ms == 0 {
            return None;
        }
        self.state = SessionState::Paused { remaining_ms };
        Some(remaining_ms)
    }

    /// Continues a paused countdown, rounding the remainder up to a whole
    /// second. Returns `false` (and changes nothing) if there was nothing
    /// paused to resume.
    pub fn resume(&mut self, now_ms: i64) -> bool {
        match self.state {
            SessionState::Paused { remaining_ms } if remaining_ms > 0 => {
                self.start(remaining_ms.div_ceil(1000), self.mode, now_ms);
                true
            }
            _ => false,
        }
    }

    /// Clears the countdown. The mode and session counter are kept so a
    /// status query still reports where the cycle stood.
    pub fn stop(&mut self) {
        self.state = SessionState::Stopped;
    }

    /// Forgets everything, including the configuration.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn complete(&mut self, now_ms: i64) -> Option<Completion> {
        let config = self.config?;
        let old_mode = self.mode;
        if old_mode == Mode::Work {
            self.completed_work_sessions += 1;
        }
        let new_mode = next_phase(old_mode, self.completed_work_sessions, &config);

        if config.auto_start {
            self.start(config.duration_secs(new_mode), new_mode, now_ms);
        } else {
            self.mode = new_mode;
            self.state = SessionState::Stopped;
        }

        Some(Completion {
            old_mode,
            new_mode,
            completed_duration_secs: config.duration_secs(old_mode),
            completed_work_sessions: self.completed_work_sessions,
            auto_started: config.auto_start,
        })
    }
}

fn clamp_ms(ms: i64) -> u64 {
    u64::try_from(ms).unwrap_or(0)
}
