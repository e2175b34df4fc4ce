//! Line input from the terminal.
//!
//! Every read of the run (the opening prompt and the approval answer) goes
//! through one [`TerminalInput`], so piped input is consumed line by line
//! from a single buffer. Each line is read on a detached OS thread and
//! raced against Ctrl-C; an abandoned read never holds up runtime shutdown.

use std::io::{self, BufRead};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

/// Outcome of reading one line
#[derive(Debug)]
pub enum LineRead {
    /// A line with its trailing newline removed
    Line(String),
    /// Input is closed
    Eof,
    /// Ctrl-C arrived first
    Interrupted,
    Failed(io::Error),
}

enum Source {
    /// Process stdin, which keeps its own process-wide buffer
    Stdin,
    Reader(Box<dyn BufRead + Send>),
}

impl Source {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        match self {
            Self::Stdin => io::stdin().read_line(buf),
            Self::Reader(reader) => reader.read_line(buf),
        }
    }
}

/// Shared handle to the line source; clones read from the same buffer.
#[derive(Clone)]
pub struct TerminalInput {
    source: Arc<Mutex<Source>>,
}

impl std::fmt::Debug for TerminalInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalInput").finish_non_exhaustive()
    }
}

impl TerminalInput {
    pub fn stdin() -> Self {
        Self {
            source: Arc::new(Mutex::new(Source::Stdin)),
        }
    }

    /// Read lines from any buffered reader instead of stdin
    pub fn from_reader(reader: impl BufRead + Send + 'static) -> Self {
        Self {
            source: Arc::new(Mutex::new(Source::Reader(Box::new(reader)))),
        }
    }

    /// Read the next line, giving up early on Ctrl-C.
    pub async fn read_line(&self) -> LineRead {
        let (tx, rx) = oneshot::channel();
        let source = Arc::clone(&self.source);

        let spawned = std::thread::Builder::new()
            .name("huddle-stdin".to_string())
            .spawn(move || {
                let mut line = String::new();
                let read = source.lock().read_line(&mut line).map(|n| (n, line));
                let _ = tx.send(read);
            });
        if let Err(e) = spawned {
            return LineRead::Failed(e);
        }

        tokio::select! {
            read = rx => match read {
                Ok(Ok((0, _))) => LineRead::Eof,
                Ok(Ok((_, line))) => LineRead::Line(line.trim_end_matches(['\r', '\n']).to_string()),
                Ok(Err(e)) => LineRead::Failed(e),
                Err(_) => LineRead::Failed(io::Error::new(
                    io::ErrorKind::Other,
                    "input reader stopped",
                )),
            },
            _ = tokio::signal::ctrl_c() => {
                debug!("Line read interrupted");
                LineRead::Interrupted
            }
        }
    }
}
