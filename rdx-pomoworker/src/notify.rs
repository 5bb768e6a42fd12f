//! The boundary to the host's notification surface.
//!
//! The worker only ever asks the surface to show or clear notifications;
//! rendering, icons, and permission prompts belong to the host. Every call
//! is best effort: failures are reported back as [`NotifyError`] and logged
//! by the caller, never propagated into the timer state.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

/// A button offered on a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub id: String,
    pub label: String,
}

/// Everything the host needs to display one system notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Notifications sharing a tag replace each other and are cleared together.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<NotificationAction>,
    /// Opaque data handed back when the user activates the notification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon: None,
            tag: None,
            actions: Vec::new(),
            data: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_action(mut self, id: impl Into<String>, label: impl Into<String>) -> Self {
        self.actions.push(NotificationAction {
            id: id.into(),
            label: label.into(),
        });
        self
    }
}

/// The notification part of a remote push message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNotification {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl PushNotification {
    /// Converts a pushed message into a displayable notification.
    pub fn into_notification(self, icon: Option<String>) -> Notification {
        Notification {
            icon,
            ..Notification::new(self.title, self.body)
        }
    }
}

/// Why the host could not display a notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("notification permission denied")]
    PermissionDenied,

    #[error("notification platform error: {0}")]
    Platform(String),
}

/// The host's notification surface.
pub trait NotificationSurface: Send + Sync {
    fn show(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Removes every displayed notification carrying `tag`.
    fn clear(&self, tag: &str) -> Result<(), NotifyError>;
}

/// A surface that only writes notifications to the log.
///
/// Useful for headless runs where there is nothing to display on.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl NotificationSurface for TracingNotifier {
    fn show(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            title = %notification.title,
            body = %notification.body,
            tag = notification.tag.as_deref().unwrap_or("-"),
            "Notification shown."
        );
        Ok(())
    }

    fn clear(&self, tag: &str) -> Result<(), NotifyError> {
        info!(%tag, "Notifications cleared.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_host_style_notification() {
        let notification: Notification = serde_json::from_value(json!({
            "title": "Break over",
            "body": "Back to work",
            "tag": "pomodoro",
            "actions": [{ "id": "start", "label": "Start" }]
        }))
        .unwrap();

        assert_eq!(
            notification,
            Notification::new("Break over", "Back to work")
                .with_tag("pomodoro")
                .with_action("start", "Start")
        );
    }

    #[test]
    fn push_messages_get_the_default_icon() {
        let push = PushNotification {
            title: "Team focus".to_string(),
            body: "Starts in 5 minutes".to_string(),
        };
        let notification = push.into_notification(Some("/favicon.ico".to_string()));
        assert_eq!(notification.title, "Team focus");
        assert_eq!(notification.icon.as_deref(), Some("/favicon.ico"));
        assert!(notification.actions.is_empty());
    }
}
