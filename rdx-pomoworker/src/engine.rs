//! The worker that owns the session and alarms and routes every message.

use crate::common::AlarmId;
use crate::components::alarm::AlarmRegistry;
use crate::components::session::{TickOutcome, TimerSession};
use crate::config::{PhaseConfig, WorkerConfig};
use crate::events::Event;
use crate::notify::{Notification, NotificationSurface};
use crate::protocol::Command;
use crate::time::{self, Clock};
use anyhow::anyhow;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Interval;
use tracing::{debug, info, trace, warn};

/// What an alarm replays when it fires.
#[derive(Debug, Clone)]
pub struct AlarmPayload {
    pub notification: Notification,
    pub relay: Value,
}

/// The background worker.
///
/// The worker exclusively owns the `TimerSession`, the `AlarmRegistry`, and
/// the tick source, and mutates them only from its own event loop, one
/// command or wake-up at a time. Controllers talk to it through cloned
/// [`WorkerHandle`]s. When the last handle is dropped the loop ends and all
/// state is discarded.
pub struct PomodoroWorker {
    config: Arc<WorkerConfig>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationSurface>,
    session: TimerSession,
    alarms: AlarmRegistry<AlarmPayload>,
    ticker: Option<Interval>,
    command_receiver: mpsc::UnboundedReceiver<Command>,
    fired_receiver: mpsc::UnboundedReceiver<AlarmId>,
    event_sender: broadcast::Sender<Event>,
}

/// A cloneable handle for one or more foreground controllers.
#[derive(Clone)]
pub struct WorkerHandle {
    command_sender: mpsc::UnboundedSender<Command>,
    event_sender: broadcast::Sender<Event>,
}

// Core implementation block for internal logic.
impl PomodoroWorker {
    /// Creates a new worker and the first handle to it.
    ///
    /// Nothing runs until [`PomodoroWorker::run`] is awaited (usually on a
    /// spawned task).
    pub fn new(
        config: WorkerConfig,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationSurface>,
    ) -> (Self, WorkerHandle) {
        let (command_sender, command_receiver) = mpsc::unbounded_channel();
        let (fired_sender, fired_receiver) = mpsc::unbounded_channel();
        let (event_sender, _) = broadcast::channel(config.event_capacity.max(1));

        let worker = Self {
            config: Arc::new(config),
            clock,
            notifier,
            session: TimerSession::new(),
            alarms: AlarmRegistry::new(fired_sender),
            ticker: None,
            command_receiver,
            fired_receiver,
            event_sender: event_sender.clone(),
        };
        let handle = WorkerHandle {
            command_sender,
            event_sender,
        };
        (worker, handle)
    }

    /// Runs the event loop until every `WorkerHandle` has been dropped.
    ///
    /// Commands take priority over timer wake-ups, so a `stop` that arrives
    /// before the next tick or alarm always wins.
    pub async fn run(mut self) {
        info!("Pomodoro worker started.");
        loop {
            tokio::select! {
                biased;
                command = self.command_receiver.recv() => match command {
                    Some(command) => self.dispatch(command),
                    None => break,
                },
                Some(id) = self.fired_receiver.recv() => self.fire_alarm(id),
                _ = time::next_tick(&mut self.ticker) => self.on_tick(),
            }
        }
        self.reset();
        info!("Pomodoro worker shut down.");
    }

    /// Returns the worker to its initial state: no session, no alarms.
    pub fn reset(&mut self) {
        self.ticker = None;
        self.session.reset();
        self.alarms.cancel_all();
    }

    #[doc(hidden)]
    fn dispatch(&mut self, command: Command) {
        debug!(command = command.name(), "Command received.");
        match command {
            Command::Start { config } => self.start(config),
            Command::StartNext => self.start_next(),
            Command::Stop => self.stop(),
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::ScheduleAlarm {
                key,
                delay_ms,
                notification,
                relay,
            } => {
                self.alarms.schedule(
                    key,
                    Duration::from_millis(delay_ms),
                    AlarmPayload {
                        notification,
                        relay,
                    },
                );
            }
            Command::CancelAlarm { key } => {
                if !self.alarms.cancel(&key) {
                    trace!(%key, "No pending alarm to cancel.");
                }
            }
            Command::GetStatus => {
                let snapshot = self.session.snapshot(self.clock.now_ms());
                self.emit(snapshot.into());
            }
            Command::NotificationClick {
                action,
                tag,
                payload,
            } => self.notification_clicked(action.as_deref(), tag.as_deref(), payload),
            Command::Push { notification } => {
                let notification =
                    notification.into_notification(self.config.notification_icon.clone());
                if let Err(e) = self.notifier.show(&notification) {
                    warn!(error = %e, "Failed to show pushed notification.");
                }
            }
        }
    }

    #[doc(hidden)]
    fn start(&mut self, config: PhaseConfig) {
        if let Err(e) = config.validate() {
            warn!(error = %e, "Ignoring start with invalid config.");
            return;
        }
        self.session.begin(config, self.clock.now_ms());
        info!(
            work_secs = config.work,
            auto_start = config.auto_start,
            "Pomodoro cycle started."
        );
        self.phase_started();
    }

    #[doc(hidden)]
    fn start_next(&mut self) {
        if self.session.start_current(self.clock.now_ms()) {
            info!(mode = %self.session.mode(), "Next phase started.");
            self.phase_started();
        } else {
            warn!("Ignoring startNext: no cycle has been started.");
        }
    }

    #[doc(hidden)]
    fn stop(&mut self) {
        self.ticker = None;
        self.session.stop();
        let cancelled = self.alarms.cancel_all();
        info!(cancelled_alarms = cancelled, "Pomodoro session stopped.");
    }

    #[doc(hidden)]
    fn pause(&mut self) {
        match self.session.pause(self.clock.now_ms()) {
            Some(remaining_ms) => {
                self.ticker = None;
                info!(remaining_ms, "Pomodoro session paused.");
            }
            None => debug!("Nothing running to pause."),
        }
    }

    #[doc(hidden)]
    fn resume(&mut self) {
        if self.session.resume(self.clock.now_ms()) {
            info!(mode = %self.session.mode(), "Pomodoro session resumed.");
            self.phase_started();
        } else {
            debug!("Nothing paused to resume.");
        }
    }

    /// Announces the running phase, restarts the tick source, and emits the
    /// first tick right away.
    #[doc(hidden)]
    fn phase_started(&mut self) {
        self.emit(Event::phase_started(self.session.mode()));
        self.ticker = Some(time::tick_source());
        self.on_tick();
    }

    #[doc(hidden)]
    fn on_tick(&mut self) {
        match self.session.tick(self.clock.now_ms()) {
            TickOutcome::Idle => self.ticker = None,
            TickOutcome::Remaining { seconds } => {
                trace!(seconds, "Tick.");
                self.emit(Event::Tick {
                    remaining_seconds: seconds,
                });
            }
            TickOutcome::Completed(completion) => {
                self.ticker = None;
                info!(
                    old_mode = %completion.old_mode,
                    new_mode = %completion.new_mode,
                    completed_work_sessions = completion.completed_work_sessions,
                    "Phase completed."
                );
                self.emit(Event::session_completed(&completion));
                self.emit(Event::phase_completed(&completion));
                if completion.auto_started {
                    self.phase_started();
                }
            }
        }
    }

    /// Runs a fired alarm's two side effects. Both are always attempted; a
    /// failed notification does not hold back the relay.
    #[doc(hidden)]
    fn fire_alarm(&mut self, id: AlarmId) {
        let Some((key, payload)) = self.alarms.take_fired(id) else {
            return;
        };
        info!(%key, "Alarm fired.");

        let mut notification = payload.notification;
        if notification.data.is_none() {
            notification.data = Some(payload.relay.clone());
        }
        if notification.icon.is_none() {
            notification.icon = self.config.notification_icon.clone();
        }
        if let Err(e) = self.notifier.show(&notification) {
            warn!(%key, error = %e, "Failed to show alarm notification.");
        }

        self.emit(Event::Relay {
            message: payload.relay,
        });
    }

    #[doc(hidden)]
    fn notification_clicked(&mut self, action: Option<&str>, tag: Option<&str>, payload: Value) {
        info!(action = action.unwrap_or("default"), "Notification activated.");
        if !payload.is_null() {
            self.emit(Event::Relay { message: payload });
        }
        if let Some(tag) = tag {
            if let Err(e) = self.notifier.clear(tag) {
                warn!(%tag, error = %e, "Failed to clear notifications.");
            }
        }
        match action {
            Some("start") | Some("startNext") => self.start_next(),
            Some("stop") => self.stop(),
            _ => {}
        }
    }

    #[doc(hidden)]
    fn emit(&self, event: Event) {
        // No live controller is not an error; the event is simply unobserved.
        if self.event_sender.send(event).is_err() {
            trace!("Event dropped: no controllers listening.");
        }
    }
}

// Public API implementation block.
impl WorkerHandle {
    /// Sends a typed command to the worker.
    pub fn send(&self, command: Command) -> anyhow::Result<()> {
        self.command_sender
            .send(command)
            .map_err(|e| anyhow!("worker is no longer running (dropped {})", e.0.name()))
    }

    /// Decodes a raw JSON message and forwards it.
    ///
    /// Invalid messages are logged and dropped without reaching the worker;
    /// the error is returned so the caller may report it, but nothing is
    /// sent back over the event stream.
    pub fn post_message(&self, raw: &str) -> anyhow::Result<()> {
        match Command::decode(raw) {
            Ok(command) => self.send(command),
            Err(e) => {
                warn!(error = %e, "Ignoring invalid command.");
                Err(e.into())
            }
        }
    }

    /// Subscribes a new controller to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_sender.subscribe()
    }

    /// Returns `true` once the worker's loop has ended.
    pub fn is_closed(&self) -> bool {
        self.command_sender.is_closed()
    }
}
