//! # Pomoworker
//!
//! A background alarm scheduler and phase state machine for Pomodoro-style
//! focus timers.
//!
//! The worker runs in its own task, outliving whichever foreground
//! controllers come and go. Controllers send it commands and receive a
//! broadcast stream of events back.
//!
//! ## Core Concepts
//!
//! - **Wall-clock anchor**: a running phase is stored as an absolute end
//!   time. Each tick recomputes what is left, so the countdown stays right
//!   even if ticks are delayed by device sleep.
//! - **Phase cycle**: work, then a short break, with every
//!   `long_break_interval`-th break being a long one. Phases may advance on
//!   their own (`auto_start`) or wait for the controller.
//! - **Keyed alarms**: deferred "show a notification and relay a message"
//!   actions, at most one per key. Rescheduling a key replaces the old
//!   alarm; cancelling is immediate and idempotent.
//! - **Message protocol**: JSON commands tagged by `"type"` in, JSON events
//!   tagged by `"type"` out, decoded once at the boundary.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use pomoworker::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Create the worker and a handle to it.
//!     let (worker, handle) = PomodoroWorker::new(
//!         WorkerConfig::default(),
//!         Arc::new(WallClock),
//!         Arc::new(TracingNotifier),
//!     );
//!     tokio::spawn(worker.run());
//!
//!     // 2. Subscribe to events before sending commands.
//!     let mut events = handle.subscribe();
//!
//!     // 3. Start a classic 25/5/15 cycle.
//!     handle.send(Command::Start { config: PhaseConfig::default() })?;
//!
//!     while let Ok(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//!     Ok(())
//! }
//! ```

pub const WORKER_NAME: &str = "Pomo Worker";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");


// Declare all the modules in the crate.
pub mod common;
pub mod components;
pub mod config;
pub mod engine;
pub mod events;
pub mod notify;
pub mod protocol;
pub mod time;

/// A prelude module for easy importing of the most common worker types.
pub mod prelude {
    pub use crate::common::{AlarmId, TRANSITION_ALARM_KEY};
    pub use crate::components::phase::Mode;
    pub use crate::config::{PhaseConfig, WorkerConfig};
    pub use crate::engine::{PomodoroWorker, WorkerHandle};
    pub use crate::events::Event;
    pub use crate::notify::{Notification, NotificationSurface, NotifyError, TracingNotifier};
    pub use crate::protocol::Command;
    pub use crate::time::{Clock, RuntimeClock, WallClock};
}

// The classic Pomodoro: 25 minutes of work, 5 minute breaks, a 15 minute
// break after every fourth session.
impl Default for config::PhaseConfig {
    fn default() -> Self {
        Self {
            work: 25 * 60,
            short_break: 5 * 60,
            long_break: 15 * 60,
            long_break_interval: 4,
            auto_start: false,
        }
    }
}
