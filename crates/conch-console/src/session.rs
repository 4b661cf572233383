//! Shared output target.
//!
//! The foreground loop and every background task write through the same
//! [`Session`]. A write/flush/redraw sequence must run inside
//! [`Session::critical`] so lines from different writers never interleave.
//! Background writers use [`Session::print_above`], which also keeps an open
//! prompt intact by printing above it and redrawing it.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use conch_types::Result;

type Sink = Box<dyn Write + Send>;

/// Clears the cursor's line: carriage return, then erase to end of line.
const CLEAR_LINE: &str = "\r\x1b[K";

struct Target {
    out: Sink,
    /// Prompt currently open on the last line, if any.
    prompt: Option<String>,
}

/// Handle to the shared terminal/output target.
///
/// Cloning the handle shares the same target; it never duplicates it.
#[derive(Clone)]
pub struct Session {
    target: Arc<Mutex<Target>>,
}

impl Session {
    /// Wrap an output target.
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            target: Arc::new(Mutex::new(Target {
                out: Box::new(out),
                prompt: None,
            })),
        }
    }

    /// Session writing to the process's stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Session writing into an in-memory buffer, plus a reader for it.
    pub fn capture() -> (Self, Capture) {
        let capture = Capture::default();
        (Self::new(capture.clone()), capture)
    }

    /// Run `f` with exclusive access to the output target.
    pub fn critical<R>(&self, f: impl FnOnce(&mut dyn Write) -> io::Result<R>) -> Result<R> {
        let mut target = self.lock();
        Ok(f(&mut *target.out)?)
    }

    /// Write text without a trailing newline.
    pub fn write_str(&self, text: &str) -> Result<()> {
        self.critical(|w| w.write_all(text.as_bytes()))
    }

    /// Write one line and flush it.
    pub fn write_line(&self, text: &str) -> Result<()> {
        self.critical(|w| {
            writeln!(w, "{text}")?;
            w.flush()
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.critical(|w| w.flush())
    }

    /// Write `prompt` and leave it open: output from [`Session::print_above`]
    /// redraws it until [`Session::end_prompt`].
    pub fn show_prompt(&self, prompt: &str) -> Result<()> {
        let mut target = self.lock();
        target.out.write_all(prompt.as_bytes())?;
        target.out.flush()?;
        target.prompt = Some(prompt.to_string());
        Ok(())
    }

    /// The open prompt has been answered.
    pub fn end_prompt(&self) {
        self.lock().prompt = None;
    }

    /// Run `f` on a line of its own above any open prompt, then redraw the
    /// prompt. Background tasks write through this.
    pub fn print_above<R>(&self, f: impl FnOnce(&mut dyn Write) -> io::Result<R>) -> Result<R> {
        let mut target = self.lock();
        let Target { out, prompt } = &mut *target;
        if prompt.is_some() {
            out.write_all(CLEAR_LINE.as_bytes())?;
        }
        let result = f(&mut **out)?;
        if let Some(prompt) = prompt {
            out.write_all(prompt.as_bytes())?;
        }
        out.flush()?;
        Ok(result)
    }

    // A writer that panicked mid-sequence leaves at worst a torn line; the
    // target itself is still usable.
    fn lock(&self) -> MutexGuard<'_, Target> {
        self.target
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// In-memory output buffer created by [`Session::capture`].
#[derive(Clone, Default)]
pub struct Capture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(|p| p.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Drain the buffer, returning what it held.
    pub fn take(&self) -> String {
        let mut buf = self.buf.lock().unwrap_or_else(|p| p.into_inner());
        let text = String::from_utf8_lossy(&buf).into_owned();
        buf.clear();
        text
    }
}

impl Write for Capture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self.buf.lock().unwrap_or_else(|p| p.into_inner());
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
