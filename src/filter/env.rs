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

//! Provides [`env_filter`](https://crates.io/crates/env_filter) based filter for log entries.

use std::borrow::Cow;

pub use env_filter::Builder as EnvFilterBuilder;

use crate::LogEntry;
use crate::filter::Filter;

/// The default environment variable for filtering logs.
pub const DEFAULT_FILTER_ENV: &str = "RUST_LOG";

/// A filter consists of one or more comma-separated directives which match on the entry's
/// target and severity.
///
/// Each directive may have a corresponding maximum verbosity. `trace` maps to
/// [`Verbose`](crate::Severity::Verbose) and `warn` to [`Warning`](crate::Severity::Warning).
///
/// The directive syntax is similar to that of [`env_logger`](https://crates.io/crates/env_logger)'s.
/// Read more from [the `env_logger` documentation](https://docs.rs/env_logger/#enabling-logging)
#[derive(Debug)]
pub struct EnvFilter(env_filter::Filter);

impl EnvFilter {
    /// Initializes the filter from the [EnvFilterBuilder].
    pub fn new(mut builder: EnvFilterBuilder) -> Self {
        EnvFilter(builder.build())
    }

    /// Initializes the filter from directives.
    ///
    /// # Examples
    ///
    /// ```
    /// use logwell::filter::EnvFilter;
    /// let filter = EnvFilter::from_directives("info,my_crate::db=debug");
    /// ```
    pub fn from_directives(directives: &str) -> Self {
        let mut builder = EnvFilterBuilder::new();
        builder.parse(directives);
        EnvFilter::new(builder)
    }

    /// Initializes the filter from the environment using default variable name `RUST_LOG`.
    ///
    /// # Examples
    ///
    /// ```
    /// use logwell::filter::EnvFilter;
    /// let filter = EnvFilter::from_default_env();
    /// ```
    pub fn from_default_env() -> Self {
        EnvFilter::from_env(DEFAULT_FILTER_ENV)
    }

    /// Initializes the filter from the environment using default variable name `RUST_LOG`.
    /// If the variable is not set, the default value will be used.
    pub fn from_default_env_or<'a, V>(default: V) -> Self
    where
        V: Into<Cow<'a, str>>,
    {
        EnvFilter::from_env_or(DEFAULT_FILTER_ENV, default)
    }

    /// Initializes the filter from the environment using specific variable name.
    ///
    /// # Examples
    ///
    /// ```
    /// use logwell::filter::EnvFilter;
    /// let filter = EnvFilter::from_env("MY_LOG");
    /// ```
    pub fn from_env<'a, E>(name: E) -> Self
    where
        E: Into<Cow<'a, str>>,
    {
        let mut builder = EnvFilterBuilder::new();
        let name = name.into();
        if let Ok(s) = std::env::var(&*name) {
            builder.parse(&s);
        }
        EnvFilter::new(builder)
    }

    /// Initializes the filter from the environment using specific variable name.
    /// If the variable is not set, the default value will be used.
    pub fn from_env_or<'a, 'b, E, V>(name: E, default: V) -> Self
    where
        E: Into<Cow<'a, str>>,
        V: Into<Cow<'b, str>>,
    {
        let mut builder = EnvFilterBuilder::new();
        let name = name.into();
        let default = default.into();
        if let Ok(s) = std::env::var(&*name) {
            builder.parse(&s);
        } else {
            builder.parse(&default);
        }
        EnvFilter::new(builder)
    }
}

impl Filter for EnvFilter {
    fn should_record(&self, entry: &LogEntry) -> bool {
        let metadata = log::MetadataBuilder::new()
            .level(entry.severity().into())
            .target(entry.target())
            .build();
        self.0.enabled(&metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Severity;

    fn entry(severity: Severity, target: &'static str) -> LogEntry {
        LogEntry::builder(severity, "m").target(target).build()
    }

    #[test]
    fn test_directives_match_target_and_severity() {
        let filter = EnvFilter::from_directives("warn,app::db=debug");

        assert!(filter.should_record(&entry(Severity::Warning, "app::web")));
        assert!(!filter.should_record(&entry(Severity::Info, "app::web")));
        assert!(filter.should_record(&entry(Severity::Debug, "app::db")));
        assert!(!filter.should_record(&entry(Severity::Verbose, "app::db")));
    }

    #[test]
    fn test_trace_directive_accepts_verbose() {
        let filter = EnvFilter::from_directives("trace");
        assert!(filter.should_record(&entry(Severity::Verbose, "anything")));
    }
}
