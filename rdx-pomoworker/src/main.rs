use anyhow::Result;
use pomoworker::prelude::*;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // 2. Load worker settings. The first argument may name a TOML file.
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = WorkerConfig::load(config_path.as_deref())?;
    let alarm_key = config.transition_alarm_key.clone();

    // 3. Create the worker and run it in the background.
    let (worker, handle) = PomodoroWorker::new(config, Arc::new(WallClock), Arc::new(TracingNotifier));
    let worker_task = tokio::spawn(worker.run());

    // 4. Listen the way a foreground page would.
    spawn_event_listener(&handle);

    // 5. Drive a short, fast cycle so every transition is visible quickly.
    let demo = PhaseConfig {
        work: 5,
        short_break: 3,
        long_break: 4,
        long_break_interval: 2,
        auto_start: true,
    };
    handle.send(Command::Start { config: demo })?;
    handle.send(Command::schedule_alarm(
        alarm_key,
        demo.duration(Mode::Work),
        Notification::new("Time for a break", "Work session complete.")
            .with_tag("pomodoro")
            .with_action("stop", "Stop timer"),
        json!({ "type": "transition", "newState": "short_break" }),
    ))?;

    // 6. Run until Ctrl+C, then drop the handle so the worker tears down.
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received.");
    drop(handle);
    worker_task.await?;
    Ok(())
}

/// Spawns a task that logs every event the worker broadcasts.
fn spawn_event_listener(handle: &WorkerHandle) {
    let mut events = handle.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match &event {
                Event::Tick { remaining_seconds } => info!("[TICK] => {}s left", remaining_seconds),
                other => info!("[{}] => {:?}", other.name(), other),
            }
        }
    });
}
