use std::sync::{Arc, Mutex, PoisonError};

use crate::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    Stderr,
}

impl From<Level> for ConsoleStream {
    fn from(level: Level) -> Self {
        match level {
            Level::Debug | Level::Info => Self::Stdout,
            Level::Warn | Level::Error => Self::Stderr,
        }
    }
}

/// Where the stub logger writes its lines.
pub trait ConsoleSink: Send + Sync {
    fn write_line(&self, stream: ConsoleStream, line: &str);
}

/// The process stdout / stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct StdConsole;

impl ConsoleSink for StdConsole {
    fn write_line(&self, stream: ConsoleStream, line: &str) {
        match stream {
            ConsoleStream::Stdout => println!("{line}"),
            ConsoleStream::Stderr => eprintln!("{line}"),
        }
    }
}

/// Keeps every line in memory; clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryConsole {
    lines: Arc<Mutex<Vec<(ConsoleStream, String)>>>,
}

impl MemoryConsole {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(ConsoleStream, String)> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stream(&self, stream: ConsoleStream) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(s, _)| *s == stream)
            .map(|(_, line)| line)
            .collect()
    }
}

impl ConsoleSink for MemoryConsole {
    fn write_line(&self, stream: ConsoleStream, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((stream, line.to_owned()));
    }
}
