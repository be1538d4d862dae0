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

//! Formatters turning log entries into text.

use std::fmt;

use crate::LogEntry;

pub use self::concat::ConcatenatingFormatter;
pub use self::custom::CustomFormatter;
pub use self::payload::PayloadFormatter;
pub use self::text::TextFormatter;

mod concat;
mod custom;
mod payload;
mod text;

/// A formatter converts a log entry into a string.
///
/// Returning `None` means the formatter declines to format the entry. A recorder consults its
/// formatters in order and records the first non-`None` result; if every formatter declines, the
/// recorder is not invoked for that entry.
///
/// Formatters may be invoked from any thread and must produce the same output when called twice
/// on the same entry.
pub trait Formatter: fmt::Debug + Send + Sync + 'static {
    /// Format the entry, or decline with `None`.
    fn format(&self, entry: &LogEntry) -> Option<String>;
}

impl<T: Formatter> From<T> for Box<dyn Formatter> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// Run a formatter chain: the first formatter that does not decline wins.
pub(crate) fn first_formatted(formatters: &[Box<dyn Formatter>], entry: &LogEntry) -> Option<String> {
    formatters.iter().find_map(|formatter| formatter.format(entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Payload;
    use crate::Severity;

    #[test]
    fn test_first_non_declining_formatter_wins() {
        let formatters: Vec<Box<dyn Formatter>> = vec![
            CustomFormatter::new(|_: &LogEntry| None).into(),
            CustomFormatter::new(|_: &LogEntry| Some("second".to_string())).into(),
            CustomFormatter::new(|_: &LogEntry| Some("third".to_string())).into(),
        ];
        let entry = LogEntry::message(Severity::Info, "m");
        assert_eq!(first_formatted(&formatters, &entry).as_deref(), Some("second"));
    }

    #[test]
    fn test_all_decline() {
        let formatters: Vec<Box<dyn Formatter>> =
            vec![CustomFormatter::new(|_: &LogEntry| None).into()];
        let entry = LogEntry::builder(Severity::Info, Payload::Trace).build();
        assert_eq!(first_formatted(&formatters, &entry), None);
        assert_eq!(first_formatted(&[], &entry), None);
    }
}
