//! Inbound commands from foreground controllers.
//!
//! Messages arrive as JSON objects tagged by `"type"`. They are decoded and
//! validated once, here, into [`Command`]; the router only ever sees
//! well-formed commands and matches on them exhaustively.

use crate::config::{ConfigError, PhaseConfig};
use crate::notify::{Notification, PushNotification};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// A control message from a foreground controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    /// Begin a new cycle with a work phase and a zeroed session counter.
    Start { config: PhaseConfig },
    /// Begin the current phase by hand, e.g. after a completion without auto-start.
    StartNext,
    Stop,
    Pause,
    Resume,
    ScheduleAlarm {
        key: String,
        delay_ms: u64,
        notification: Notification,
        /// Message broadcast to every controller when the alarm fires.
        #[serde(default)]
        relay: Value,
    },
    CancelAlarm { key: String },
    GetStatus,
    /// The user activated a notification (or one of its actions).
    NotificationClick {
        #[serde(default)]
        action: Option<String>,
        #[serde(default)]
        tag: Option<String>,
        #[serde(default)]
        payload: Value,
    },
    /// A message delivered by a remote push service.
    Push { notification: PushNotification },
}

/// Why an inbound message was rejected.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed command: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid phase config: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl Command {
    /// Decodes and validates one JSON message.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        let command: Command = serde_json::from_str(raw)?;
        command.validate()?;
        Ok(command)
    }

    /// Decodes an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let command: Command = serde_json::from_value(value)?;
        command.validate()?;
        Ok(command)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Command::Start { config } => config.validate(),
            _ => Ok(()),
        }
    }

    /// The wire name of this command, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start { .. } => "start",
            Command::StartNext => "startNext",
            Command::Stop => "stop",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::ScheduleAlarm { .. } => "scheduleAlarm",
            Command::CancelAlarm { .. } => "cancelAlarm",
            Command::GetStatus => "getStatus",
            Command::NotificationClick { .. } => "notificationClick",
            Command::Push { .. } => "push",
        }
    }

    pub fn schedule_alarm(
        key: impl Into<String>,
        delay: Duration,
        notification: Notification,
        relay: Value,
    ) -> Self {
        Command::ScheduleAlarm {
            key: key.into(),
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            notification,
            relay,
        }
    }
}
