//! Long-running background tasks that write to the shared session.
//!
//! A ticker wakes at a fixed interval and runs its body inside
//! [`Session::print_above`], so its output never splits a line written by
//! the foreground loop and an open prompt is redrawn below it. Tickers run until the process exits unless started
//! with a tick limit.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::session::Session;

/// Snapshot of one background task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatus {
    pub name: String,
    pub interval: Duration,
    pub ticks: u64,
    pub failures: u64,
}

/// Registry of running background tasks, shared with `ttop`.
#[derive(Debug, Clone, Default)]
pub struct TaskBoard {
    tasks: Arc<Mutex<Vec<TaskStatus>>>,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, name: &str, interval: Duration) -> usize {
        let mut tasks = self.tasks.lock().unwrap_or_else(|p| p.into_inner());
        tasks.push(TaskStatus {
            name: name.to_string(),
            interval,
            ticks: 0,
            failures: 0,
        });
        tasks.len() - 1
    }

    fn record(&self, id: usize, ok: bool) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(task) = tasks.get_mut(id) {
            task.ticks += 1;
            if !ok {
                task.failures += 1;
            }
        }
    }

    /// Current state of every task, in start order.
    pub fn snapshot(&self) -> Vec<TaskStatus> {
        self.tasks
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

/// A periodic background task.
#[derive(Debug, Clone)]
pub struct Ticker {
    name: String,
    interval: Duration,
    limit: Option<u64>,
}

impl Ticker {
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            interval,
            limit: None,
        }
    }

    /// Stop after `ticks` iterations instead of running forever.
    pub fn limit(mut self, ticks: u64) -> Self {
        self.limit = Some(ticks);
        self
    }

    /// Start the task on its own thread.
    ///
    /// `body` receives the 1-based tick count and the locked output target.
    /// A failing tick is logged and counted; the task keeps running.
    pub fn spawn<F>(self, session: Session, board: &TaskBoard, mut body: F) -> io::Result<JoinHandle<()>>
    where
        F: FnMut(u64, &mut dyn Write) -> io::Result<()> + Send + 'static,
    {
        let id = board.register(&self.name, self.interval);
        let board = board.clone();
        thread::Builder::new()
            .name(format!("ticker-{}", self.name))
            .spawn(move || {
                let mut tick = 0u64;
                loop {
                    if self.limit.is_some_and(|limit| tick >= limit) {
                        break;
                    }
                    thread::sleep(self.interval);
                    tick += 1;
                    let result = session.print_above(|w| body(tick, w));
                    if let Err(e) = &result {
                        log::warn!("ticker '{}' tick {tick} failed: {e}", self.name);
                    }
                    board.record(id, result.is_ok());
                }
                log::debug!("ticker '{}' finished after {tick} ticks", self.name);
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limited_ticker_runs_and_records() {
        let (session, out) = Session::capture();
        let board = TaskBoard::new();
        let handle = Ticker::new("status", Duration::from_millis(1))
            .limit(3)
            .spawn(session, &board, |n, w| writeln!(w, "counter: {n}"))
            .unwrap();
        handle.join().unwrap();
        assert_eq!(out.contents(), "counter: 1\ncounter: 2\ncounter: 3\n");
        let tasks = board.snapshot();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "status");
        assert_eq!(tasks[0].ticks, 3);
        assert_eq!(tasks[0].failures, 0);
    }

    #[test]
    fn tick_prints_above_open_prompt() {
        let (session, out) = Session::capture();
        session.show_prompt("prompt> ").unwrap();
        let board = TaskBoard::new();
        let handle = Ticker::new("status", Duration::from_millis(1))
            .limit(1)
            .spawn(session, &board, |n, w| writeln!(w, "counter: {n}"))
            .unwrap();
        handle.join().unwrap();
        assert_eq!(out.contents(), "prompt> \r\x1b[Kcounter: 1\nprompt> ");
    }

    #[test]
    fn failing_tick_keeps_running() {
        let (session, _) = Session::capture();
        let board = TaskBoard::new();
        let handle = Ticker::new("flaky", Duration::from_millis(1))
            .limit(2)
            .spawn(session, &board, |n, _| {
                if n == 1 {
                    Err(io::Error::other("tick failed"))
                } else {
                    Ok(())
                }
            })
            .unwrap();
        handle.join().unwrap();
        let tasks = board.snapshot();
        assert_eq!(tasks[0].ticks, 2);
        assert_eq!(tasks[0].failures, 1);
    }

    #[test]
    fn concurrent_tickers_keep_lines_whole() {
        let (session, out) = Session::capture();
        let board = TaskBoard::new();
        let a = Ticker::new("a", Duration::from_millis(1))
            .limit(20)
            .spawn(session.clone(), &board, |n, w| {
                write!(w, "a:")?;
                writeln!(w, "{n}")
            })
            .unwrap();
        let b = Ticker::new("b", Duration::from_millis(1))
            .limit(20)
            .spawn(session.clone(), &board, |n, w| {
                write!(w, "b:")?;
                writeln!(w, "{n}")
            })
            .unwrap();
        for _ in 0..20 {
            session.write_line("fg:line").unwrap();
        }
        a.join().unwrap();
        b.join().unwrap();
        let text = out.contents();
        assert_eq!(text.lines().count(), 60);
        for line in text.lines() {
            let (who, rest) = line.split_once(':').unwrap();
            assert!(matches!(who, "a" | "b" | "fg"), "{line}");
            assert!(!rest.contains(':'), "{line}");
        }
        assert_eq!(board.snapshot().len(), 2);
    }
}
