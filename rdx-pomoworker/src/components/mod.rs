//! Contains the building blocks the worker is assembled from.
//!
//! The phase state machine and the timer session are pure logic driven by
//! explicit timestamps; the alarm registry owns the delayed actions. The
//! `PomodoroWorker` owns one of each and drives them from its event loop.

pub mod alarm;
pub mod phase;
pub mod session;
