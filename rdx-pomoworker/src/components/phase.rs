//! The Pomodoro phase cycle: work, short break, long break.

use crate::config::PhaseConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One segment of the Pomodoro cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

/// How a completed phase is recorded by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Study,
    Break,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Work, Mode::ShortBreak, Mode::LongBreak];

    pub fn is_break(self) -> bool {
        !matches!(self, Mode::Work)
    }

    /// Human-readable status text shown while this phase runs.
    pub fn label(self) -> &'static str {
        match self {
            Mode::Work => "Work",
            Mode::ShortBreak => "Short Break",
            Mode::LongBreak => "Long Break",
        }
    }

    /// Accent colour controllers use for this phase.
    pub fn accent_color(self) -> &'static str {
        match self {
            Mode::Work => "#10B981",
            Mode::ShortBreak => "#f59e0b",
            Mode::LongBreak => "#3b82f6",
        }
    }

    pub fn session_kind(self) -> SessionKind {
        if self.is_break() {
            SessionKind::Break
        } else {
            SessionKind::Study
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Work => "work",
            Mode::ShortBreak => "short_break",
            Mode::LongBreak => "long_break",
        })
    }
}

/// Computes the phase that follows `current`.
///
/// `completed_work_sessions` must already include the work session that is
/// just ending; the counter is bumped by the caller, and only when leaving
/// `Work`. Every `long_break_interval`-th work session is followed by a long
/// break, every other one by a short break. Breaks always lead back to work.
pub fn next_phase(current: Mode, completed_work_sessions: u32, config: &PhaseConfig) -> Mode {
    match current {
        Mode::Work => {
            let interval = config.long_break_interval.max(1);
            if completed_work_sessions > 0 && completed_work_sessions % interval == 0 {
                Mode::LongBreak
            } else {
                Mode::ShortBreak
            }
        }
        Mode::ShortBreak | Mode::LongBreak => Mode::Work,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_interval(long_break_interval: u32) -> PhaseConfig {
        PhaseConfig {
            long_break_interval,
            ..PhaseConfig::default()
        }
    }

    #[test]
    fn every_fourth_work_session_earns_a_long_break() {
        let config = config_with_interval(4);
        let next: Vec<Mode> = (1..=5)
            .map(|completed| next_phase(Mode::Work, completed, &config))
            .collect();
        assert_eq!(
            next,
            vec![
                Mode::ShortBreak,
                Mode::ShortBreak,
                Mode::ShortBreak,
                Mode::LongBreak,
                Mode::ShortBreak,
            ]
        );
    }

    #[test]
    fn interval_of_one_always_gives_long_breaks() {
        let config = config_with_interval(1);
        for completed in 1..10 {
            assert_eq!(next_phase(Mode::Work, completed, &config), Mode::LongBreak);
        }
    }

    #[test]
    fn breaks_return_to_work() {
        let config = PhaseConfig::default();
        assert_eq!(next_phase(Mode::ShortBreak, 3, &config), Mode::Work);
        assert_eq!(next_phase(Mode::LongBreak, 4, &config), Mode::Work);
    }

    #[test]
    fn no_long_break_before_any_work_completed() {
        let config = config_with_interval(4);
        assert_eq!(next_phase(Mode::Work, 0, &config), Mode::ShortBreak);
    }

    #[test]
    fn modes_use_canonical_snake_case() {
        assert_eq!(serde_json::to_string(&Mode::LongBreak).unwrap(), "\"long_break\"");
        assert_eq!(
            serde_json::from_str::<Mode>("\"short_break\"").unwrap(),
            Mode::ShortBreak
        );
        assert!(serde_json::from_str::<Mode>("\"Long Break\"").is_err());
        assert_eq!(Mode::LongBreak.to_string(), "long_break");
    }

    #[test]
    fn labels_and_session_kinds() {
        assert_eq!(Mode::ShortBreak.label(), "Short Break");
        assert_eq!(Mode::Work.accent_color(), "#10B981");
        assert_eq!(Mode::Work.session_kind(), SessionKind::Study);
        assert_eq!(Mode::LongBreak.session_kind(), SessionKind::Break);
    }
}
