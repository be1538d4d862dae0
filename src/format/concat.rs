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
use crate::format::Formatter;

/// A formatter joining the output of several formatters.
///
/// Declining sub-formatters contribute nothing. The concatenation itself declines only when every
/// sub-formatter declines, or, with [`hard_fail`](ConcatenatingFormatter::hard_fail), as soon
/// as any sub-formatter declines.
///
/// # Examples
///
/// ```
/// use logwell::format::ConcatenatingFormatter;
/// use logwell::format::CustomFormatter;
/// use logwell::format::PayloadFormatter;
///
/// let formatter = ConcatenatingFormatter::new()
///     .formatter(CustomFormatter::new(|e| Some(format!("{} ", e.severity()))))
///     .formatter(PayloadFormatter::default());
/// ```
#[derive(Debug, Default)]
pub struct ConcatenatingFormatter {
    formatters: Vec<Box<dyn Formatter>>,
    hard_fail: bool,
}

impl ConcatenatingFormatter {
    /// Create an empty concatenation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a formatter to the concatenation.
    pub fn formatter(mut self, formatter: impl Into<Box<dyn Formatter>>) -> Self {
        self.formatters.push(formatter.into());
        self
    }

    /// Decline as soon as any sub-formatter declines.
    pub fn hard_fail(mut self, hard_fail: bool) -> Self {
        self.hard_fail = hard_fail;
        self
    }
}

impl Formatter for ConcatenatingFormatter {
    fn format(&self, entry: &LogEntry) -> Option<String> {
        let mut text = String::new();
        let mut any = false;

        for formatter in &self.formatters {
            match formatter.format(entry) {
                Some(part) => {
                    text.push_str(&part);
                    any = true;
                }
                None if self.hard_fail => return None,
                None => {}
            }
        }

        any.then_some(text)
    }
}
