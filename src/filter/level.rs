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
use crate::Severity;
use crate::filter::Filter;

/// A filter that rejects any entry less severe than the specified severity.
///
/// If the filter is set to `Info`, it will allow `Info`, `Warning`, and `Error` entries.
#[derive(Debug, Clone, Copy)]
pub struct SeverityFilter(Severity);

impl SeverityFilter {
    /// Create a new filter with the given minimum severity.
    pub fn new(severity: Severity) -> Self {
        SeverityFilter(severity)
    }

    /// The minimum severity accepted by this filter.
    pub fn severity(&self) -> Severity {
        self.0
    }
}

impl Filter for SeverityFilter {
    fn should_record(&self, entry: &LogEntry) -> bool {
        entry.severity() >= self.0
    }
}

impl From<Severity> for SeverityFilter {
    fn from(severity: Severity) -> Self {
        SeverityFilter(severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_semantics() {
        for (i, threshold) in Severity::ALL.iter().enumerate() {
            let filter = SeverityFilter::new(*threshold);
            for (j, severity) in Severity::ALL.iter().enumerate() {
                let entry = LogEntry::message(*severity, "m");
                assert_eq!(filter.should_record(&entry), j >= i, "{severity} vs {threshold}");
            }
        }
    }
}
