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

//! A bridge to forward logs from the `log` crate to a [`LogReceptacle`].

use std::sync::Arc;

use crate::LogEntry;
use crate::LogReceptacle;
use crate::Severity;

/// A [`log::Log`] implementation feeding a [`LogReceptacle`].
///
/// Records become [`Payload::Message`](crate::Payload::Message) entries. The record's module
/// path is used as the calling stack frame.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use logwell::LogConfiguration;
/// use logwell::LogReceptacle;
/// use logwell::bridge::LogBridge;
/// use logwell::recorder::Stderr;
///
/// let receptacle = Arc::new(LogReceptacle::new([LogConfiguration::builder()
///     .recorder(Stderr::default())
///     .build()]));
///
/// if let Err(err) = LogBridge::new(receptacle).apply() {
///     eprintln!("failed to set logger: {err}");
/// }
/// log::info!("This is an info message.");
/// ```
#[derive(Debug, Clone)]
pub struct LogBridge {
    receptacle: Arc<LogReceptacle>,
}

impl LogBridge {
    /// Create a bridge forwarding to `receptacle`.
    pub fn new(receptacle: Arc<LogReceptacle>) -> LogBridge {
        LogBridge { receptacle }
    }

    /// The receptacle records are forwarded to.
    pub fn receptacle(&self) -> &Arc<LogReceptacle> {
        &self.receptacle
    }

    /// Install the bridge as the `log` crate's global logger.
    ///
    /// The global maximum level is set from the receptacle's minimum severity.
    ///
    /// # Errors
    ///
    /// Return an error if the `log` crate's global logger has already been set.
    pub fn apply(self) -> Result<(), log::SetLoggerError> {
        let max_level = log::LevelFilter::from(self.receptacle.minimum_severity());
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.receptacle.accepts(Severity::from(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.receptacle.log(entry_from_record(record));
    }

    fn flush(&self) {
        self.receptacle.flush();
    }
}

fn entry_from_record(record: &log::Record) -> LogEntry {
    let mut builder = LogEntry::builder(record.level().into(), record.args().to_string())
        .target(record.target().to_owned())
        .line(record.line().unwrap_or(0));

    // optional static fields
    builder = if let Some(file) = record.file_static() {
        builder.file(file)
    } else {
        builder.file(record.file().unwrap_or_default().to_owned())
    };
    builder = if let Some(module_path) = record.module_path_static() {
        builder.stack_frame(module_path)
    } else {
        builder.stack_frame(record.module_path().unwrap_or_default().to_owned())
    };

    builder.build()
}
