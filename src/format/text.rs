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

use std::fmt::Write;

use jiff::tz::TimeZone;

use crate::LogEntry;
use crate::format::Formatter;
use crate::format::PayloadFormatter;

/// A formatter that renders an entry as one human-readable line.
///
/// Output format:
///
/// ```text
/// 2024-08-11 22:44:57.172 +08:00 | Error   | 00000001 | main.rs:51 - Hello error!
/// 2024-08-11 22:44:57.172 +08:00 | Warning | 00000001 | main.rs:52 - Hello warning!
/// 2024-08-11 22:44:57.172 +08:00 | Info    | 00000002 | main.rs:53 - Hello info!
/// ```
///
/// The columns are the timestamp, the severity, the calling thread id in hexadecimal, the call
/// site, and the payload as rendered by [`PayloadFormatter`].
///
/// The timestamp is rendered in the system time zone unless one is set with
/// [`time_zone`](TextFormatter::time_zone).
#[derive(Debug, Clone)]
pub struct TextFormatter {
    tz: Option<TimeZone>,
    show_thread: bool,
    show_call_site: bool,
    payload: PayloadFormatter,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            tz: None,
            show_thread: true,
            show_call_site: true,
            payload: PayloadFormatter::default(),
        }
    }
}

impl TextFormatter {
    /// Render timestamps in the given time zone.
    pub fn time_zone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }

    /// Whether to include the calling thread id column.
    pub fn show_thread(mut self, show: bool) -> Self {
        self.show_thread = show;
        self
    }

    /// Whether to include the call site column.
    pub fn show_call_site(mut self, show: bool) -> Self {
        self.show_call_site = show;
        self
    }
}

impl Formatter for TextFormatter {
    fn format(&self, entry: &LogEntry) -> Option<String> {
        let payload = self.payload.format(entry)?;

        let tz = self.tz.clone().unwrap_or_else(TimeZone::system);
        let time = entry
            .timestamp()
            .to_zoned(tz)
            .strftime("%Y-%m-%d %H:%M:%S.%3f %:z");
        let severity = entry.severity();

        let mut text = String::new();
        // SAFETY: write to a string always succeeds
        write!(&mut text, "{time} | {severity:<7}").unwrap();
        if self.show_thread {
            write!(&mut text, " | {:08X}", entry.calling_thread_id()).unwrap();
        }
        if self.show_call_site {
            let file = entry.calling_file_name();
            let line = entry.calling_file_line();
            write!(&mut text, " | {file}:{line}").unwrap();
        }
        write!(&mut text, " - {payload}").unwrap();

        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use jiff::Timestamp;

    use super::*;
    use crate::Severity;

    #[test]
    fn test_text_line() {
        let entry = LogEntry::builder(Severity::Warning, "disk almost full")
            .file("src/storage/mod.rs")
            .line(7)
            .thread_id(0x2a)
            .timestamp(Timestamp::from_str("2024-08-10T12:34:56.789Z").unwrap())
            .build();

        let formatter = TextFormatter::default().time_zone(TimeZone::UTC);
        assert_eq!(
            formatter.format(&entry).unwrap(),
            "2024-08-10 12:34:56.789 +00:00 | Warning | 0000002A | mod.rs:7 - disk almost full"
        );

        let formatter = formatter.show_thread(false).show_call_site(false);
        assert_eq!(
            formatter.format(&entry).unwrap(),
            "2024-08-10 12:34:56.789 +00:00 | Warning - disk almost full"
        );
    }
}
