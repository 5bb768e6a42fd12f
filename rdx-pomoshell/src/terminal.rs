//! Terminal rendering for events and notifications.

use colored::Colorize;
use pomoworker::prelude::*;

/// Draws notifications inline in the shell instead of on a desktop.
pub struct TerminalNotifier;

impl NotificationSurface for TerminalNotifier {
    fn show(&self, notification: &Notification) -> Result<(), NotifyError> {
        println!(
            "\n{} {} {}",
            "[NOTIFY]".magenta().bold(),
            notification.title.bold(),
            notification.body
        );
        for action in &notification.actions {
            println!("         ({}) {}", action.id.dimmed(), action.label);
        }
        Ok(())
    }

    fn clear(&self, tag: &str) -> Result<(), NotifyError> {
        println!("{} cleared '{}'", "[NOTIFY]".magenta(), tag);
        Ok(())
    }
}

/// Formats one event for display.
pub fn describe(event: &Event) -> String {
    match event {
        Event::PhaseStarted { label, .. } => format!("{} {}", "[PHASE]".green().bold(), label),
        Event::Tick { remaining_seconds } => format!(
            "{} {:02}:{:02}",
            "[TICK]".dimmed(),
            remaining_seconds / 60,
            remaining_seconds % 60
        ),
        Event::SessionCompleted {
            session_type,
            duration_seconds,
        } => format!(
            "{} {:?} session of {}s recorded",
            "[SESSION]".blue(),
            session_type,
            duration_seconds
        ),
        Event::PhaseCompleted {
            old_mode,
            new_mode,
            auto_start,
            completed_work_sessions,
            ..
        } => {
            let next = if *auto_start {
                "starting now".to_string()
            } else {
                "type 'next' to begin".to_string()
            };
            format!(
                "{} {} -> {} ({} sessions done, {})",
                "[DONE]".yellow().bold(),
                old_mode,
                new_mode,
                completed_work_sessions,
                next
            )
        }
        Event::Status {
            is_running,
            is_paused,
            remaining_seconds,
            mode,
            completed_work_sessions,
        } => {
            let state = match (is_running, is_paused) {
                (true, _) => "running".green(),
                (_, true) => "paused".yellow(),
                _ => "stopped".red(),
            };
            format!(
                "{} {} {} {:02}:{:02} left, {} sessions done",
                "[STATUS]".cyan().bold(),
                mode,
                state,
                remaining_seconds / 60,
                remaining_seconds % 60,
                completed_work_sessions
            )
        }
        Event::Relay { message } => format!("{} {}", "[RELAY]".magenta(), message),
    }
}
