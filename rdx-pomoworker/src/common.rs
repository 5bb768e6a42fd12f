//! Contains common, primitive types shared across the worker.
//!
//! Alarm slots are identified by generation-checked keys so that a fire
//! notification for a slot that has since been cancelled or superseded can
//! never be mistaken for a newer alarm occupying the same slot.

use slotmap::new_key_type;

new_key_type! {
    /// Uniquely and safely identifies one scheduled alarm within the registry.
    ///
    /// A new `AlarmId` is produced every time an alarm is scheduled, even when
    /// the caller reuses the same string key. Stale ids are never reused.
    pub struct AlarmId;
}

/// The alarm key controllers use by convention for phase-transition alarms.
pub const TRANSITION_ALARM_KEY: &str = "pomodoro-transition";
