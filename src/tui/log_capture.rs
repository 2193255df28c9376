//! Log capture for TUI mode
//!
//! While ratatui owns the alternate screen, tracing output must not hit
//! stderr. This module provides a small ring buffer implementing
//! `MakeWriter`; the app polls the newest line into the status bar, which
//! keeps swallowed storage failures observable.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

/// How many captured lines to retain.
const CAPACITY: usize = 200;

/// Shared ring buffer of captured log lines.
#[derive(Clone, Default)]
pub struct LogBuffer {
    inner: Arc<Mutex<VecDeque<String>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, line: String) {
        let mut lines = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if lines.len() >= CAPACITY {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Most recently captured line, if any.
    pub fn latest(&self) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .back()
            .cloned()
    }
}

/// Accumulates written bytes and pushes each complete line to the buffer.
pub struct LineWriter {
    buffer: LogBuffer,
    pending: Vec<u8>,
}

impl Write for LineWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.pending.extend_from_slice(buf);
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.buffer
                .push(String::from_utf8_lossy(&line[..line.len() - 1]).into_owned());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.pending.is_empty() {
            let line = String::from_utf8_lossy(&self.pending).into_owned();
            self.buffer.push(line);
            self.pending.clear();
        }
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        let _ = Write::flush(self);
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter {
            buffer: self.clone(),
            pending: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_returns_newest_line() {
        let buffer = LogBuffer::new();
        assert!(buffer.latest().is_none());

        let mut writer = buffer.make_writer();
        write!(writer, "first\nsecond\n").unwrap();
        assert_eq!(buffer.latest().as_deref(), Some("second"));
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let buffer = LogBuffer::new();
        for i in 0..CAPACITY + 10 {
            buffer.push(format!("line {}", i));
        }
        let lines = buffer.inner.lock().unwrap();
        assert_eq!(lines.len(), CAPACITY);
        assert_eq!(lines.front().unwrap(), "line 10");
    }

    #[test]
    fn test_partial_line_flushes_on_drop() {
        let buffer = LogBuffer::new();
        {
            let mut writer = buffer.make_writer();
            write!(writer, "partial").unwrap();
            assert!(buffer.latest().is_none());
        }
        assert_eq!(buffer.latest().as_deref(), Some("partial"));
    }
}
