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

use std::fmt;

use crate::LogEntry;
use crate::format::Formatter;

/// A formatter that you can pass the custom format function.
///
/// # Examples
///
/// ```
/// use logwell::LogEntry;
/// use logwell::format::CustomFormatter;
///
/// let formatter = CustomFormatter::new(|entry: &LogEntry| {
///     Some(format!("[{}] {}", entry.severity(), entry.target()))
/// });
/// ```
pub struct CustomFormatter {
    f: Box<dyn Fn(&LogEntry) -> Option<String> + Send + Sync + 'static>,
}

impl fmt::Debug for CustomFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomFormatter {{ ... }}")
    }
}

impl CustomFormatter {
    /// Create a new custom formatter.
    pub fn new(formatter: impl Fn(&LogEntry) -> Option<String> + Send + Sync + 'static) -> Self {
        CustomFormatter {
            f: Box::new(formatter),
        }
    }
}

impl Formatter for CustomFormatter {
    fn format(&self, entry: &LogEntry) -> Option<String> {
        (self.f)(entry)
    }
}
