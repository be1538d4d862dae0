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

//! Log entries and their payload.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use jiff::Timestamp;

use crate::Severity;

/// The payload carried by a [`LogEntry`].
#[derive(Clone, Debug)]
pub enum Payload {
    /// A trace call; carries no data of its own.
    Trace,
    /// A text message.
    Message(String),
    /// An arbitrary value, or `None`.
    Value(Option<PayloadValue>),
}

impl Payload {
    /// Wrap an arbitrary value as a payload.
    pub fn value<T: fmt::Debug + Send + Sync + 'static>(value: T) -> Payload {
        Payload::Value(Some(PayloadValue::new(value)))
    }
}

/// An arbitrary value logged as a payload, along with the name of its type.
#[derive(Clone)]
pub struct PayloadValue {
    type_name: &'static str,
    value: Arc<dyn fmt::Debug + Send + Sync>,
}

impl PayloadValue {
    /// Wrap a value, remembering its type name.
    pub fn new<T: fmt::Debug + Send + Sync + 'static>(value: T) -> PayloadValue {
        PayloadValue {
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    /// The name of the wrapped value's type, as given by [`std::any::type_name`].
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The wrapped value.
    pub fn value(&self) -> &(dyn fmt::Debug + Send + Sync) {
        self.value.as_ref()
    }
}

impl fmt::Debug for PayloadValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.value, f)
    }
}

impl From<String> for Payload {
    fn from(message: String) -> Self {
        Payload::Message(message)
    }
}

impl From<&str> for Payload {
    fn from(message: &str) -> Self {
        Payload::Message(message.to_owned())
    }
}

/// One log event.
///
/// Entries are created once per log call and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct LogEntry {
    payload: Payload,
    severity: Severity,
    target: Cow<'static, str>,
    calling_file_path: Cow<'static, str>,
    calling_file_line: u32,
    calling_stack_frame: Cow<'static, str>,
    calling_thread_id: u64,
    timestamp: Timestamp,
    process: &'static ProcessIdentification,
}

impl LogEntry {
    /// Create a builder for an entry with the given severity and payload.
    pub fn builder(severity: Severity, payload: impl Into<Payload>) -> LogEntryBuilder {
        LogEntryBuilder::new(severity, payload.into())
    }

    /// Create an entry carrying a text message, with empty call-site metadata.
    pub fn message(severity: Severity, message: impl Into<String>) -> LogEntry {
        LogEntry::builder(severity, Payload::Message(message.into())).build()
    }

    /// The payload of the entry.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// The severity of the entry.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// The target of the entry, usually the module path of the caller.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The path of the source file that issued the log request.
    pub fn calling_file_path(&self) -> &str {
        &self.calling_file_path
    }

    /// The last component of [`calling_file_path`](LogEntry::calling_file_path).
    pub fn calling_file_name(&self) -> &str {
        let path = self.calling_file_path();
        path.rsplit(['/', '\\']).next().unwrap_or(path)
    }

    /// The line within the source file at which the log request was issued.
    pub fn calling_file_line(&self) -> u32 {
        self.calling_file_line
    }

    /// The signature of the caller that issued the log request.
    pub fn calling_stack_frame(&self) -> &str {
        &self.calling_stack_frame
    }

    /// An identifier of the calling thread.
    ///
    /// It identifies the thread only during its lifetime; never use it as a long-lived key.
    pub fn calling_thread_id(&self) -> u64 {
        self.calling_thread_id
    }

    /// The time at which the entry was created.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// The ID of the current process.
    pub fn process_id(&self) -> u32 {
        self.process.process_id
    }

    /// The name of the current process.
    pub fn process_name(&self) -> &str {
        &self.process.process_name
    }
}

/// Builder for [`LogEntry`].
#[derive(Debug)]
pub struct LogEntryBuilder {
    entry: LogEntry,
}

impl LogEntryBuilder {
    fn new(severity: Severity, payload: Payload) -> Self {
        LogEntryBuilder {
            entry: LogEntry {
                payload,
                severity,
                target: Cow::Borrowed(""),
                calling_file_path: Cow::Borrowed(""),
                calling_file_line: 0,
                calling_stack_frame: Cow::Borrowed(""),
                calling_thread_id: current_thread_id(),
                timestamp: Timestamp::now(),
                process: ProcessIdentification::current(),
            },
        }
    }

    /// Set [`target`](LogEntry::target).
    pub fn target(mut self, target: impl Into<Cow<'static, str>>) -> Self {
        self.entry.target = target.into();
        self
    }

    /// Set [`calling_file_path`](LogEntry::calling_file_path).
    pub fn file(mut self, file: impl Into<Cow<'static, str>>) -> Self {
        self.entry.calling_file_path = file.into();
        self
    }

    /// Set [`calling_file_line`](LogEntry::calling_file_line).
    pub fn line(mut self, line: u32) -> Self {
        self.entry.calling_file_line = line;
        self
    }

    /// Set [`calling_stack_frame`](LogEntry::calling_stack_frame).
    pub fn stack_frame(mut self, frame: impl Into<Cow<'static, str>>) -> Self {
        self.entry.calling_stack_frame = frame.into();
        self
    }

    /// Set [`timestamp`](LogEntry::timestamp). Defaults to the time the builder was created.
    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.entry.timestamp = timestamp;
        self
    }

    /// Override [`calling_thread_id`](LogEntry::calling_thread_id).
    pub fn thread_id(mut self, thread_id: u64) -> Self {
        self.entry.calling_thread_id = thread_id;
        self
    }

    /// Invoke the builder and return a `LogEntry`.
    pub fn build(self) -> LogEntry {
        self.entry
    }
}

#[derive(Debug)]
struct ProcessIdentification {
    process_id: u32,
    process_name: String,
}

impl ProcessIdentification {
    fn current() -> &'static ProcessIdentification {
        static CURRENT: OnceLock<ProcessIdentification> = OnceLock::new();
        CURRENT.get_or_init(|| {
            let process_name = std::env::current_exe()
                .ok()
                .and_then(|path| {
                    path.file_stem()
                        .map(|stem| stem.to_string_lossy().into_owned())
                })
                .unwrap_or_default();

            ProcessIdentification {
                process_id: std::process::id(),
                process_name,
            }
        })
    }
}

fn current_thread_id() -> u64 {
    static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

    thread_local! {
        static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
    }

    THREAD_ID.with(|id| *id)
}
