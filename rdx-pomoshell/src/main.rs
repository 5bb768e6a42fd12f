mod terminal;

use anyhow::Result;
use colored::Colorize;
use pomoworker::prelude::*;
use pomoworker::{VERSION as LIB_VERSION, WORKER_NAME};
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use serde_json::json;
use std::borrow::Cow;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use terminal::TerminalNotifier;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct CommandHighlighter;

impl Highlighter for CommandHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            Cow::Owned(format!("{} {}", command.yellow().bold(), rest.yellow()))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    println!("{}", "  pomoshell  -  a foreground controller for the pomodoro worker".cyan());
    println!(
        "{}",
        "-----------------------------------------------------------------".dimmed()
    );
    println!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    println!(
        "{}",
        "-----------------------------------------------------------------".dimmed()
    );
}

/// Spawns the task that prints everything the worker broadcasts.
fn spawn_event_listener(handle: &WorkerHandle, show_ticks: Arc<AtomicBool>) {
    let mut events = handle.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(Event::Tick { .. }) if !show_ticks.load(Ordering::Relaxed) => {}
                Ok(event) => println!("<-- {}", terminal::describe(&event)),
                Err(RecvError::Lagged(skipped)) => {
                    println!("<-- {}", format!("({skipped} events skipped)").dimmed())
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Parses `start [work short long interval auto]`, durations in minutes.
fn parse_start(args: &[&str], defaults: PhaseConfig) -> Result<PhaseConfig, String> {
    let minutes = |index: usize, fallback: u64| -> Result<u64, String> {
        match args.get(index) {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| format!("'{}' is not a whole number of minutes.", raw))?
                .checked_mul(60)
                .ok_or_else(|| format!("'{}' minutes is too long.", raw)),
            None => Ok(fallback),
        }
    };
    let config = PhaseConfig {
        work: minutes(1, defaults.work)?,
        short_break: minutes(2, defaults.short_break)?,
        long_break: minutes(3, defaults.long_break)?,
        long_break_interval: match args.get(4) {
            Some(raw) => raw
                .parse()
                .map_err(|_| format!("'{}' is not a valid interval.", raw))?,
            None => defaults.long_break_interval,
        },
        auto_start: match args.get(5) {
            Some(raw) => matches!(*raw, "auto" | "true" | "yes" | "on"),
            None => defaults.auto_start,
        },
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn print_help() {
    println!("Available commands:");
    println!("  start [W S L N auto]  - Starts a cycle (minutes; N work sessions per long break).");
    println!("  pause | resume        - Freezes or continues the countdown.");
    println!("  stop                  - Stops the session and cancels its alarms.");
    println!("  next                  - Begins the upcoming phase.");
    println!("  status                - Asks the worker for a status snapshot.");
    println!("  alarm <K> <S> <T..>   - Schedules alarm K in S seconds with title T.");
    println!("  cancel <K>            - Cancels alarm K.");
    println!("  send <JSON>           - Posts a raw protocol message.");
    println!("  ticks on|off          - Shows or hides tick events.");
    println!("  exit                  - Quits the shell.");
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let config_path = env::var_os("POMO_CONFIG").map(PathBuf::from);
    let config = WorkerConfig::load(config_path.as_deref())?;
    let defaults = config.defaults;

    let (worker, handle) = PomodoroWorker::new(config, Arc::new(WallClock), Arc::new(TerminalNotifier));
    info!("Spawning {} in the background...", WORKER_NAME);
    let worker_task = tokio::spawn(worker.run());

    let show_ticks = Arc::new(AtomicBool::new(false));
    spawn_event_listener(&handle, show_ticks.clone());

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CommandHighlighter));

    println!("{} is running. Type 'help' for commands or 'exit' to quit.", WORKER_NAME.cyan());

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(_) => {
                println!("Exiting pomoshell...");
                break;
            }
        };
        rl.add_history_entry(line.as_str())?;
        let args = line.split_whitespace().collect::<Vec<_>>();
        let Some(command) = args.first() else {
            continue;
        };

        let sent = match *command {
            "start" => match parse_start(&args, defaults) {
                Ok(config) => handle.send(Command::Start { config }),
                Err(message) => {
                    println!("Error: {}", message);
                    continue;
                }
            },
            "pause" => handle.send(Command::Pause),
            "resume" => handle.send(Command::Resume),
            "stop" => handle.send(Command::Stop),
            "next" => handle.send(Command::StartNext),
            "status" => handle.send(Command::GetStatus),
            "alarm" => {
                let (Some(key), Some(seconds)) = (args.get(1), args.get(2)) else {
                    println!("Usage: alarm <KEY> <SECONDS> <TITLE...>");
                    continue;
                };
                let Ok(seconds) = seconds.parse::<u64>() else {
                    println!("Error: '{}' is not a valid number of seconds.", seconds);
                    continue;
                };
                let title = match args.get(3..) {
                    Some(words) if !words.is_empty() => words.join(" "),
                    _ => format!("Alarm '{}'", key),
                };
                handle.send(Command::schedule_alarm(
                    *key,
                    Duration::from_secs(seconds),
                    Notification::new(title, "").with_tag(*key),
                    json!({ "type": "alarm", "key": key }),
                ))
            }
            "cancel" => match args.get(1) {
                Some(key) => handle.send(Command::CancelAlarm {
                    key: key.to_string(),
                }),
                None => {
                    println!("Usage: cancel <KEY>");
                    continue;
                }
            },
            "send" => {
                let raw = line.trim_start().trim_start_matches("send").trim();
                handle.post_message(raw)
            }
            "ticks" => {
                match args.get(1) {
                    Some(&"on") => show_ticks.store(true, Ordering::Relaxed),
                    Some(&"off") => show_ticks.store(false, Ordering::Relaxed),
                    _ => println!("Usage: ticks on|off"),
                }
                continue;
            }
            "help" => {
                print_help();
                continue;
            }
            "exit" => break,
            _ => {
                println!("Unknown command: '{}'. Type 'help'.", line);
                continue;
            }
        };
        if let Err(e) = sent {
            println!("Error: {}", e);
        }
    }

    drop(handle);
    worker_task.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_uses_defaults_for_missing_arguments() {
        let config = parse_start(&["start", "50"], PhaseConfig::default()).unwrap();
        assert_eq!(config.work, 50 * 60);
        assert_eq!(config.short_break, 5 * 60);
        assert_eq!(config.long_break_interval, 4);
        assert!(!config.auto_start);
    }

    #[test]
    fn start_parses_every_argument() {
        let config =
            parse_start(&["start", "45", "10", "20", "3", "auto"], PhaseConfig::default()).unwrap();
        assert_eq!(
            config,
            PhaseConfig {
                work: 45 * 60,
                short_break: 10 * 60,
                long_break: 20 * 60,
                long_break_interval: 3,
                auto_start: true,
            }
        );
    }

    #[test]
    fn start_rejects_bad_input() {
        assert!(parse_start(&["start", "soon"], PhaseConfig::default()).is_err());
        assert!(parse_start(&["start", "25", "5", "15", "0"], PhaseConfig::default()).is_err());
        assert!(parse_start(&["start", "0"], PhaseConfig::default()).is_err());
    }

    #[test]
    fn start_rejects_minutes_that_overflow() {
        let result = parse_start(&["start", "400000000000000000"], PhaseConfig::default());
        assert_eq!(result, Err("'400000000000000000' minutes is too long.".to_string()));
    }
}
