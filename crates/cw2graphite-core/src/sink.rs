use std::io::{self, Write};
use std::sync::Mutex;
use tracing::error;

/// Destination for formatted lines. Each line must land whole.
pub trait LineSink: Send + Sync {
    fn write_lines(&self, lines: &[String]);
}

#[derive(Debug, Default)]
pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn write_lines(&self, lines: &[String]) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for line in lines {
            if let Err(err) = writeln!(out, "{line}") {
                error!("writing to stdout failed: {err}");
                return;
            }
        }
        if let Err(err) = out.flush() {
            error!("flushing stdout failed: {err}");
        }
    }
}

/// Collects lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl LineSink for MemorySink {
    fn write_lines(&self, lines: &[String]) {
        if let Ok(mut buf) = self.lines.lock() {
            buf.extend_from_slice(lines);
        }
    }
}
