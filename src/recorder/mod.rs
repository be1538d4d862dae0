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

//! Recorders that write formatted log entries to their destination.

use std::fmt;

use crate::LogEntry;
use crate::Queue;
use crate::format::Formatter;
use crate::format::first_formatted;

pub use self::buffered::Buffer;
pub use self::buffered::BufferedRecorder;
pub use self::buffered::BufferedRecorderBuilder;
pub use self::buffered::ClearCallback;
pub use self::buffered::RecordCallback;
pub use self::callback::CallbackHandle;
pub use self::callback::CallbackRegistry;
pub use self::file::FileRecorder;
pub use self::rotating::RotatingFileRecorder;
pub use self::rotating::RotatingFileRecorderBuilder;
pub use self::stream::Stderr;
pub use self::stream::Stdout;

mod buffered;
mod callback;
mod file;
mod rotating;
mod stream;

/// A sink that records formatted log entries.
///
/// The receptacle runs a recorder's formatter chain and its `record` call on the recorder's own
/// [`Queue`], so `record` is never invoked concurrently with itself and sees entries in
/// submission order. `record` is only invoked when one of the formatters produced a string.
///
/// Recording failures must not be returned or propagated; report them to a
/// [`Trap`](crate::Trap) and carry on.
pub trait Recorder: fmt::Debug + Send + Sync + 'static {
    /// The formatters consulted, in order, to produce the message passed to `record`.
    fn formatters(&self) -> &[Box<dyn Formatter>];

    /// The queue on which `record` is invoked.
    fn queue(&self) -> &Queue;

    /// Record a formatted message.
    ///
    /// * `message` is the output of the first formatter that did not decline.
    /// * `entry` is the entry the message was produced from.
    /// * `current_queue` is the queue the call runs on.
    /// * `synchronous` tells whether the logging caller is blocked waiting for this call.
    fn record(&self, message: &str, entry: &LogEntry, current_queue: &Queue, synchronous: bool);

    /// Flush any buffered output.
    ///
    /// Default to a no-op.
    fn flush(&self) {}
}

/// Format the entry with the recorder's formatter chain and record the winning message.
///
/// Must run on the recorder's queue.
pub(crate) fn format_and_record(recorder: &dyn Recorder, entry: &LogEntry, synchronous: bool) {
    if let Some(message) = first_formatted(recorder.formatters(), entry) {
        recorder.record(&message, entry, recorder.queue(), synchronous);
    }
}

/// Whether the formatted message needs a trailing newline.
pub(crate) fn needs_newline(message: &str) -> bool {
    !message.ends_with(['\n', '\r'])
}
