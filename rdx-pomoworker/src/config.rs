//! Defines all configuration structures for the worker.
//!
//! `PhaseConfig` travels on the wire with every `start` command, while
//! `WorkerConfig` is loaded once at startup from an optional TOML file and
//! `POMO_`-prefixed environment variables using the `config` crate.

use crate::common::TRANSITION_ALARM_KEY;
use crate::components::phase::Mode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Durations and cycle rules for one Pomodoro run.
///
/// All durations are in seconds. The field names match what foreground
/// controllers send, so this struct is deserialized straight off the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub work: u64,
    pub short_break: u64,
    pub long_break: u64,
    /// Number of completed work sessions per long break. Must be at least 1.
    pub long_break_interval: u32,
    /// Whether the next phase begins on its own when one completes.
    #[serde(default)]
    pub auto_start: bool,
}

/// Reasons a `PhaseConfig` is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("long_break_interval must be at least 1")]
    ZeroLongBreakInterval,

    #[error("duration for {0} must be greater than zero")]
    ZeroDuration(Mode),
}

impl PhaseConfig {
    /// The configured length of `mode`, in whole seconds.
    pub fn duration_secs(&self, mode: Mode) -> u64 {
        match mode {
            Mode::Work => self.work,
            Mode::ShortBreak => self.short_break,
            Mode::LongBreak => self.long_break,
        }
    }

    pub fn duration(&self, mode: Mode) -> Duration {
        Duration::from_secs(self.duration_secs(mode))
    }

    /// Checks the invariants the phase state machine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.long_break_interval == 0 {
            return Err(ConfigError::ZeroLongBreakInterval);
        }
        for mode in Mode::ALL {
            if self.duration_secs(mode) == 0 {
                return Err(ConfigError::ZeroDuration(mode));
            }
        }
        Ok(())
    }
}

/// Settings for the worker process itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Phase settings used by controllers that start without their own.
    pub defaults: PhaseConfig,

    /// Capacity of the outbound event channel.
    pub event_capacity: usize,

    /// Icon applied to notifications that do not name one.
    pub notification_icon: Option<String>,

    /// The alarm key controllers use for phase-transition alarms.
    pub transition_alarm_key: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            defaults: PhaseConfig::default(),
            event_capacity: 256,
            notification_icon: Some("/favicon.ico".to_string()),
            transition_alarm_key: TRANSITION_ALARM_KEY.to_string(),
        }
    }
}

impl WorkerConfig {
    /// Loads the worker settings.
    ///
    /// Sources are layered in order: built-in defaults, then the TOML file at
    /// `path` if given, then `POMO_*` environment variables (nested keys are
    /// separated by `__`, e.g. `POMO_DEFAULTS__WORK=3000`). Every layer may
    /// set any subset of keys; the rest fall through to the layer below.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&WorkerConfig::default())?);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("POMO")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let loaded: WorkerConfig = settings.try_deserialize()?;
        loaded.defaults.validate()?;
        Ok(loaded)
    }
}
