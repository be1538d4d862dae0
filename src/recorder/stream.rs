// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::io;
use std::io::Write;
use std::sync::Arc;

use crate::DefaultTrap;
use crate::Error;
use crate::LogEntry;
use crate::Queue;
use crate::Trap;
use crate::format::Formatter;
use crate::format::TextFormatter;
use crate::recorder::Recorder;
use crate::recorder::needs_newline;

/// A recorder that prints formatted entries to stdout.
///
/// # Examples
///
/// ```
/// use logwell::format::PayloadFormatter;
/// use logwell::recorder::Stdout;
///
/// let recorder = Stdout::default().with_formatter(PayloadFormatter::default());
/// ```
#[derive(Debug)]
pub struct Stdout {
    formatters: Vec<Box<dyn Formatter>>,
    queue: Queue,
    trap: Arc<dyn Trap>,
}

impl Default for Stdout {
    fn default() -> Self {
        Self {
            formatters: vec![Box::new(TextFormatter::default())],
            queue: Queue::new("logwell-stdout"),
            trap: Arc::new(DefaultTrap::default()),
        }
    }
}

impl Stdout {
    /// Replace the formatters with a single formatter.
    pub fn with_formatter(mut self, formatter: impl Into<Box<dyn Formatter>>) -> Self {
        self.formatters = vec![formatter.into()];
        self
    }

    /// Append a fallback formatter, consulted when the previous ones decline.
    pub fn or_formatter(mut self, formatter: impl Into<Box<dyn Formatter>>) -> Self {
        self.formatters.push(formatter.into());
        self
    }

    /// Set the trap for write failures and panicking formatters.
    pub fn with_trap(mut self, trap: impl Trap) -> Self {
        let trap: Arc<dyn Trap> = Arc::new(trap);
        self.queue = Queue::with_trap(self.queue.label().to_owned(), trap.clone());
        self.trap = trap;
        self
    }
}

impl Recorder for Stdout {
    fn formatters(&self) -> &[Box<dyn Formatter>] {
        &self.formatters
    }

    fn queue(&self) -> &Queue {
        &self.queue
    }

    fn record(&self, message: &str, _: &LogEntry, _: &Queue, synchronous: bool) {
        if let Err(err) = write_message(io::stdout().lock(), message, synchronous) {
            let err = Error::new("failed to write stdout").with_source(err);
            self.trap.trap(&err);
        }
    }

    fn flush(&self) {
        flush_or_trap(io::stdout(), "stdout", self.trap.as_ref());
    }
}

/// A recorder that prints formatted entries to stderr.
#[derive(Debug)]
pub struct Stderr {
    formatters: Vec<Box<dyn Formatter>>,
    queue: Queue,
    trap: Arc<dyn Trap>,
}

impl Default for Stderr {
    fn default() -> Self {
        Self {
            formatters: vec![Box::new(TextFormatter::default())],
            queue: Queue::new("logwell-stderr"),
            trap: Arc::new(DefaultTrap::default()),
        }
    }
}

impl Stderr {
    /// Replace the formatters with a single formatter.
    pub fn with_formatter(mut self, formatter: impl Into<Box<dyn Formatter>>) -> Self {
        self.formatters = vec![formatter.into()];
        self
    }

    /// Append a fallback formatter, consulted when the previous ones decline.
    pub fn or_formatter(mut self, formatter: impl Into<Box<dyn Formatter>>) -> Self {
        self.formatters.push(formatter.into());
        self
    }

    /// Set the trap for write failures and panicking formatters.
    pub fn with_trap(mut self, trap: impl Trap) -> Self {
        let trap: Arc<dyn Trap> = Arc::new(trap);
        self.queue = Queue::with_trap(self.queue.label().to_owned(), trap.clone());
        self.trap = trap;
        self
    }
}

impl Recorder for Stderr {
    fn formatters(&self) -> &[Box<dyn Formatter>] {
        &self.formatters
    }

    fn queue(&self) -> &Queue {
        &self.queue
    }

    fn record(&self, message: &str, _: &LogEntry, _: &Queue, synchronous: bool) {
        if let Err(err) = write_message(io::stderr().lock(), message, synchronous) {
            let err = Error::new("failed to write stderr").with_source(err);
            self.trap.trap(&err);
        }
    }

    fn flush(&self) {
        flush_or_trap(io::stderr(), "stderr", self.trap.as_ref());
    }
}

/// Write one message, adding a newline unless it already ends in one.
///
/// A synchronous caller is waiting for the output, so flush right away.
fn write_message(mut writer: impl Write, message: &str, synchronous: bool) -> io::Result<()> {
    writer.write_all(message.as_bytes())?;
    if needs_newline(message) {
        writer.write_all(b"\n")?;
    }
    if synchronous {
        writer.flush()?;
    }
    Ok(())
}

fn flush_or_trap(mut writer: impl Write, stream: &str, trap: &dyn Trap) {
    if let Err(err) = writer.flush() {
        let err = Error::new(format!("failed to flush {stream}")).with_source(err);
        trap.trap(&err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Severity;
    use crate::format::CustomFormatter;
    use crate::recorder::format_and_record;
    use crate::trap::CollectingTrap;

    #[derive(Debug)]
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn test_write_message_terminates_lines() {
        let mut out: Vec<u8> = vec![];
        write_message(&mut out, "one", false).unwrap();
        write_message(&mut out, "two\n", true).unwrap();
        write_message(&mut out, "", false).unwrap();
        assert_eq!(out, b"one\ntwo\n\n");
    }

    #[test]
    fn test_default_formatters() {
        assert_eq!(Stdout::default().formatters().len(), 1);
        let stderr = Stderr::default()
            .with_formatter(crate::format::PayloadFormatter::default())
            .or_formatter(TextFormatter::default());
        assert_eq!(stderr.formatters().len(), 2);
        assert_eq!(stderr.queue().label(), "logwell-stderr");
    }

    #[test]
    fn test_flush_failure_goes_to_trap() {
        let trap = CollectingTrap::default();
        flush_or_trap(BrokenPipe, "stdout", &trap);
        flush_or_trap(Vec::<u8>::new(), "stdout", &trap);

        let trapped = trap.messages();
        assert_eq!(trapped.len(), 1);
        assert!(trapped[0].starts_with("failed to flush stdout"), "{}", trapped[0]);
    }

    #[test]
    fn test_write_failure_is_reported() {
        let err = write_message(BrokenPipe, "line", true).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_formatter_panic_goes_to_trap() {
        let trap = Arc::new(CollectingTrap::default());
        let recorder = Arc::new(
            Stderr::default()
                .with_formatter(CustomFormatter::new(|_| panic!("bad formatter")))
                .with_trap(trap.clone()),
        );
        assert_eq!(recorder.queue().label(), "logwell-stderr");

        let entry = LogEntry::message(Severity::Info, "ignored");
        let task_recorder = recorder.clone();
        recorder
            .queue()
            .exec_sync(move || format_and_record(task_recorder.as_ref(), &entry, true));
        // the trap runs on the worker after the panicked task releases us
        recorder.queue().barrier();

        let trapped = trap.messages();
        assert_eq!(trapped.len(), 1);
        assert!(trapped[0].contains("bad formatter"), "{}", trapped[0]);
    }
}
