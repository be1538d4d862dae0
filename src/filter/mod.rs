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

//! Filters that can veto the recording of a log entry.

use std::fmt;

use crate::LogEntry;

pub use self::custom::CustomFilter;
pub use self::env::EnvFilter;
pub use self::env::EnvFilterBuilder;
pub use self::level::SeverityFilter;

mod custom;
mod env;
mod level;

/// A predicate over log entries.
///
/// A configuration records an entry only if every one of its filters returns `true`; the first
/// filter returning `false` vetoes the entry and the remaining filters are not consulted.
///
/// Filters may be invoked from any thread and must not rely on thread-local state.
pub trait Filter: fmt::Debug + Send + Sync + 'static {
    /// Whether the entry should be recorded.
    fn should_record(&self, entry: &LogEntry) -> bool;
}

impl<T: Filter> From<T> for Box<dyn Filter> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// Whether the entry passes every filter, short-circuiting on the first veto.
pub(crate) fn passes_all(filters: &[Box<dyn Filter>], entry: &LogEntry) -> bool {
    filters.iter().all(|filter| filter.should_record(entry))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::Severity;

    #[test]
    fn test_short_circuit_on_first_veto() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = {
            let calls = calls.clone();
            CustomFilter::new(move |_: &LogEntry| {
                calls.fetch_add(1, Ordering::SeqCst);
                true
            })
        };

        let filters: Vec<Box<dyn Filter>> = vec![
            CustomFilter::new(|_: &LogEntry| false).into(),
            counted.into(),
        ];

        let entry = LogEntry::message(Severity::Error, "vetoed");
        assert!(!passes_all(&filters, &entry));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_all_accept() {
        let filters: Vec<Box<dyn Filter>> = vec![
            SeverityFilter::new(Severity::Debug).into(),
            CustomFilter::new(|entry: &LogEntry| entry.target().is_empty()).into(),
        ];

        assert!(passes_all(&filters, &LogEntry::message(Severity::Info, "ok")));
        assert!(!passes_all(&filters, &LogEntry::message(Severity::Verbose, "too low")));
        assert!(passes_all(&[], &LogEntry::message(Severity::Verbose, "no filters")));
    }
}
