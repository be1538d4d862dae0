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

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::DefaultTrap;
use crate::Error;
use crate::LogEntry;
use crate::Queue;
use crate::Trap;
use crate::format::Formatter;
use crate::format::TextFormatter;
use crate::recorder::Recorder;
use crate::recorder::needs_newline;

/// A file opened for append, one formatted line per write.
#[derive(Debug)]
pub(crate) struct LogFile {
    path: PathBuf,
    file: File,
}

impl LogFile {
    pub(crate) fn open(path: impl Into<PathBuf>) -> Result<LogFile, Error> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| {
                Error::new("failed to open log file")
                    .with_context("path", path.display())
                    .with_source(err)
            })?;
        Ok(LogFile { path, file })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Append the message, terminate it with a newline unless it already ends in one, and flush.
    pub(crate) fn write_line(&mut self, message: &str) -> io::Result<()> {
        self.file.write_all(message.as_bytes())?;
        if needs_newline(message) {
            self.file.write_all(b"\n")?;
        }
        self.file.flush()
    }

    pub(crate) fn len(&self) -> io::Result<u64> {
        self.file.metadata().map(|metadata| metadata.len())
    }
}

/// A recorder that appends formatted entries to a single file.
///
/// The file is never rotated or truncated; use a
/// [`RotatingFileRecorder`](crate::recorder::RotatingFileRecorder) for that.
#[derive(Debug)]
pub struct FileRecorder {
    file: Mutex<LogFile>,
    formatters: Vec<Box<dyn Formatter>>,
    queue: Queue,
    trap: Arc<dyn Trap>,
}

impl FileRecorder {
    /// Open (or create) the file at `path` for append.
    ///
    /// The recorder uses a [`TextFormatter`] unless formatters are set with
    /// [`with_formatter`](FileRecorder::with_formatter).
    ///
    /// # Errors
    ///
    /// Return an error if the file cannot be opened for append.
    pub fn new(path: impl AsRef<Path>) -> Result<FileRecorder, Error> {
        let file = LogFile::open(path.as_ref())?;
        let label = format!("logwell-file:{}", path.as_ref().display());
        Ok(FileRecorder {
            file: Mutex::new(file),
            formatters: vec![Box::new(TextFormatter::default())],
            queue: Queue::new(label),
            trap: Arc::new(DefaultTrap::default()),
        })
    }

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
    ///
    /// Default to [`DefaultTrap`].
    pub fn with_trap(mut self, trap: impl Trap) -> Self {
        let trap: Arc<dyn Trap> = Arc::new(trap);
        self.queue = Queue::with_trap(self.queue.label().to_owned(), trap.clone());
        self.trap = trap;
        self
    }

    /// The path of the file.
    pub fn path(&self) -> PathBuf {
        self.file().path().to_path_buf()
    }

    fn file(&self) -> MutexGuard<'_, LogFile> {
        self.file.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Recorder for FileRecorder {
    fn formatters(&self) -> &[Box<dyn Formatter>] {
        &self.formatters
    }

    fn queue(&self) -> &Queue {
        &self.queue
    }

    fn record(&self, message: &str, _: &LogEntry, _: &Queue, _: bool) {
        let mut file = self.file();
        if let Err(err) = file.write_line(message) {
            let err = Error::new("failed to write log file")
                .with_context("path", file.path().display())
                .with_source(err);
            self.trap.trap(&err);
        }
    }
}
