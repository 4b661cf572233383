//! Optional background tasks: a status-line counter and a recurring
//! announcement. Both write through the shared session.

use std::io::{self, Write};
use std::thread::JoinHandle;
use std::time::Duration;

use conch_console::{Session, TaskBoard, Ticker};
use conch_types::{ShellConfig, TickerConfig};

/// Start every ticker enabled in `config`, registering each on `board`.
pub fn start(
    config: &ShellConfig,
    session: &Session,
    board: &TaskBoard,
) -> io::Result<Vec<JoinHandle<()>>> {
    let mut handles = Vec::new();
    if let Some(ticker) = ticker("status", &config.status) {
        handles.push(ticker.spawn(session.clone(), board, |n, w| {
            writeln!(w, "counter: {n}")
        })?);
    }
    if let Some(ticker) = ticker("timer", &config.timer) {
        handles.push(ticker.spawn(session.clone(), board, |_, w| {
            writeln!(w, "Hello world!")
        })?);
    }
    log::debug!("started {} background task(s)", handles.len());
    Ok(handles)
}

fn ticker(name: &str, config: &TickerConfig) -> Option<Ticker> {
    config
        .enabled
        .then(|| Ticker::new(name, Duration::from_millis(config.interval_ms)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled(interval_ms: u64) -> TickerConfig {
        TickerConfig {
            enabled: true,
            interval_ms,
        }
    }

    #[test]
    fn disabled_by_default() {
        let (session, _) = Session::capture();
        let board = TaskBoard::new();
        let handles = start(&ShellConfig::default(), &session, &board).unwrap();
        assert!(handles.is_empty());
        assert!(board.snapshot().is_empty());
    }

    #[test]
    fn enabled_tickers_register() {
        let config = ShellConfig {
            status: enabled(60_000),
            timer: enabled(120_000),
            ..ShellConfig::default()
        };
        let (session, out) = Session::capture();
        let board = TaskBoard::new();
        let handles = start(&config, &session, &board).unwrap();
        assert_eq!(handles.len(), 2);

        let tasks = board.snapshot();
        let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["status", "timer"]);
        assert_eq!(tasks[1].interval, Duration::from_secs(120));
        assert_eq!(tasks[0].ticks, 0);
        assert!(out.contents().is_empty());
    }
}
