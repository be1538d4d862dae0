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
use crate::filter::Filter;

/// A filter that you can pass the custom filter function.
///
/// The custom filter function accepts [`&LogEntry`][LogEntry] and returns whether the entry
/// should be recorded. For example:
///
/// ```rust
/// use logwell::LogEntry;
/// use logwell::filter::CustomFilter;
///
/// let filter = CustomFilter::new(|entry: &LogEntry| entry.target().starts_with("my_crate"));
/// ```
pub struct CustomFilter {
    f: Box<dyn Fn(&LogEntry) -> bool + Send + Sync + 'static>,
}

impl fmt::Debug for CustomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomFilter {{ ... }}")
    }
}

impl CustomFilter {
    /// Create a new custom filter.
    pub fn new(filter: impl Fn(&LogEntry) -> bool + Send + Sync + 'static) -> Self {
        CustomFilter {
            f: Box::new(filter),
        }
    }
}

impl Filter for CustomFilter {
    fn should_record(&self, entry: &LogEntry) -> bool {
        (self.f)(entry)
    }
}
