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

use crate::LogEntry;
use crate::Payload;
use crate::format::Formatter;

/// A formatter rendering only the payload of an entry.
///
/// * `Trace` renders the calling stack frame.
/// * `Message` renders the message text.
/// * `Value` renders `= Type: {value:?}`, or `= None` for an absent value.
///
/// Each payload kind can be switched off, in which case the formatter declines entries of that
/// kind so that a later formatter in the chain may take over.
#[derive(Debug, Clone)]
pub struct PayloadFormatter {
    trace: bool,
    message: bool,
    value: bool,
}

impl Default for PayloadFormatter {
    fn default() -> Self {
        Self {
            trace: true,
            message: true,
            value: true,
        }
    }
}

impl PayloadFormatter {
    /// Only format `Trace` payloads.
    pub fn trace_only() -> Self {
        Self {
            trace: true,
            message: false,
            value: false,
        }
    }

    /// Only format `Message` payloads.
    pub fn message_only() -> Self {
        Self {
            trace: false,
            message: true,
            value: false,
        }
    }

    /// Only format `Value` payloads.
    pub fn value_only() -> Self {
        Self {
            trace: false,
            message: false,
            value: true,
        }
    }
}

impl Formatter for PayloadFormatter {
    fn format(&self, entry: &LogEntry) -> Option<String> {
        match entry.payload() {
            Payload::Trace if self.trace => Some(entry.calling_stack_frame().to_string()),
            Payload::Message(message) if self.message => Some(message.clone()),
            Payload::Value(Some(value)) if self.value => {
                Some(format!("= {}: {value:?}", value.type_name()))
            }
            Payload::Value(None) if self.value => Some("= None".to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Severity;

    #[test]
    fn test_each_payload_kind() {
        let formatter = PayloadFormatter::default();

        let trace = LogEntry::builder(Severity::Debug, Payload::Trace)
            .stack_frame("app::main")
            .build();
        assert_eq!(formatter.format(&trace).as_deref(), Some("app::main"));

        let message = LogEntry::message(Severity::Info, "hello");
        assert_eq!(formatter.format(&message).as_deref(), Some("hello"));

        let value = LogEntry::builder(Severity::Info, Payload::value(vec![1, 2])).build();
        assert_eq!(
            formatter.format(&value),
            Some(format!("= {}: [1, 2]", std::any::type_name::<Vec<i32>>()))
        );

        let none = LogEntry::builder(Severity::Info, Payload::Value(None)).build();
        assert_eq!(formatter.format(&none).as_deref(), Some("= None"));
    }

    #[test]
    fn test_declines_disabled_kinds() {
        let entry = LogEntry::message(Severity::Info, "hello");
        assert_eq!(PayloadFormatter::trace_only().format(&entry), None);
        assert_eq!(PayloadFormatter::value_only().format(&entry), None);
        assert!(PayloadFormatter::message_only().format(&entry).is_some());
    }
}
