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

//! Log configurations: which entries go to which recorders, and how.

use std::sync::Arc;

use crate::Severity;
use crate::filter::Filter;
use crate::recorder::Recorder;

/// A minimum severity, a filter chain, and the recorders that receive matching entries.
///
/// Configurations may nest. A [`LogReceptacle`](crate::LogReceptacle) flattens them once at
/// construction; see [`flatten`](LogConfiguration::flatten).
///
/// # Examples
///
/// ```
/// use logwell::LogConfiguration;
/// use logwell::Severity;
/// use logwell::recorder::Stderr;
///
/// let config = LogConfiguration::builder()
///     .minimum_severity(Severity::Warning)
///     .recorder(Stderr::default())
///     .synchronous(true)
///     .build();
/// assert_eq!(config.recorders().len(), 1);
/// ```
#[derive(Debug)]
pub struct LogConfiguration {
    minimum_severity: Severity,
    filters: Vec<Box<dyn Filter>>,
    recorders: Vec<Arc<dyn Recorder>>,
    synchronous: bool,
    configurations: Vec<LogConfiguration>,
}

impl LogConfiguration {
    /// Create a builder with a minimum severity of [`Severity::Info`].
    pub fn builder() -> LogConfigurationBuilder {
        LogConfigurationBuilder::default()
    }

    /// The least severe entry this configuration accepts.
    pub fn minimum_severity(&self) -> Severity {
        self.minimum_severity
    }

    /// The filters an entry must all pass.
    pub fn filters(&self) -> &[Box<dyn Filter>] {
        &self.filters
    }

    /// The recorders receiving the entries that pass.
    pub fn recorders(&self) -> &[Arc<dyn Recorder>] {
        &self.recorders
    }

    /// Whether logging calls wait for this configuration's recorders.
    pub fn is_synchronous(&self) -> bool {
        self.synchronous
    }

    /// The nested configurations.
    pub fn configurations(&self) -> &[LogConfiguration] {
        &self.configurations
    }

    /// Whether an entry of `severity` is eligible for this configuration.
    pub fn accepts(&self, severity: Severity) -> bool {
        severity >= self.minimum_severity
    }

    /// Flatten this configuration and its nested configurations, depth first.
    ///
    /// A configuration without recorders can never record anything, so it is left out; its
    /// nested configurations are still included. Flattened configurations carry no nested
    /// configurations, so flattening the result again yields it unchanged.
    pub fn flatten(mut self) -> Vec<LogConfiguration> {
        let nested = std::mem::take(&mut self.configurations);

        let mut flattened = vec![];
        if !self.recorders.is_empty() {
            flattened.push(self);
        }
        for config in nested {
            flattened.extend(config.flatten());
        }
        flattened
    }
}

/// A builder to configure and create a [`LogConfiguration`].
#[derive(Debug)]
pub struct LogConfigurationBuilder {
    minimum_severity: Severity,
    filters: Vec<Box<dyn Filter>>,
    recorders: Vec<Arc<dyn Recorder>>,
    synchronous: bool,
    configurations: Vec<LogConfiguration>,
}

impl Default for LogConfigurationBuilder {
    fn default() -> Self {
        Self {
            minimum_severity: Severity::Info,
            filters: vec![],
            recorders: vec![],
            synchronous: false,
            configurations: vec![],
        }
    }
}

impl LogConfigurationBuilder {
    /// Set the least severe entry the configuration accepts.
    #[must_use]
    pub fn minimum_severity(mut self, severity: Severity) -> Self {
        self.minimum_severity = severity;
        self
    }

    /// Add a filter. An entry is recorded only if every filter accepts it.
    #[must_use]
    pub fn filter(mut self, filter: impl Into<Box<dyn Filter>>) -> Self {
        self.filters.push(filter.into());
        self
    }

    /// Add a recorder.
    #[must_use]
    pub fn recorder(mut self, recorder: impl Recorder) -> Self {
        self.recorders.push(Arc::new(recorder));
        self
    }

    /// Add a recorder the caller keeps a handle to, e.g. to inspect a
    /// [`BufferedRecorder`](crate::recorder::BufferedRecorder) later.
    #[must_use]
    pub fn shared_recorder<R: Recorder>(mut self, recorder: Arc<R>) -> Self {
        self.recorders.push(recorder);
        self
    }

    /// Make logging calls wait until this configuration's recorders are done.
    ///
    /// Default to false.
    #[must_use]
    pub fn synchronous(mut self, synchronous: bool) -> Self {
        self.synchronous = synchronous;
        self
    }

    /// Add a nested configuration.
    #[must_use]
    pub fn configuration(mut self, config: LogConfiguration) -> Self {
        self.configurations.push(config);
        self
    }

    /// Build the [`LogConfiguration`].
    pub fn build(self) -> LogConfiguration {
        LogConfiguration {
            minimum_severity: self.minimum_severity,
            filters: self.filters,
            recorders: self.recorders,
            synchronous: self.synchronous,
            configurations: self.configurations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::BufferedRecorder;

    fn with_recorder(severity: Severity) -> LogConfigurationBuilder {
        LogConfiguration::builder()
            .minimum_severity(severity)
            .recorder(BufferedRecorder::messages().build())
    }

    #[test]
    fn test_flatten_prunes_recorderless_configurations() {
        let config = LogConfiguration::builder()
            .configuration(with_recorder(Severity::Debug).build())
            .configuration(
                LogConfiguration::builder()
                    .configuration(with_recorder(Severity::Warning).build())
                    .build(),
            )
            .build();

        let flattened = config.flatten();
        let severities: Vec<_> = flattened.iter().map(|c| c.minimum_severity()).collect();
        assert_eq!(severities, vec![Severity::Debug, Severity::Warning]);
        assert!(flattened.iter().all(|c| c.configurations().is_empty()));
    }

    #[test]
    fn test_flatten_is_depth_first_and_idempotent() {
        let config = with_recorder(Severity::Verbose)
            .configuration(
                with_recorder(Severity::Debug)
                    .configuration(with_recorder(Severity::Info).build())
                    .build(),
            )
            .configuration(with_recorder(Severity::Error).build())
            .build();

        let flattened = config.flatten();
        let once: Vec<_> = flattened.iter().map(|c| c.minimum_severity()).collect();
        assert_eq!(
            once,
            vec![
                Severity::Verbose,
                Severity::Debug,
                Severity::Info,
                Severity::Error
            ]
        );

        let twice: Vec<_> = flattened
            .into_iter()
            .flat_map(LogConfiguration::flatten)
            .map(|c| c.minimum_severity())
            .collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_accepts_threshold() {
        let config = with_recorder(Severity::Warning).build();
        assert!(!config.accepts(Severity::Info));
        assert!(config.accepts(Severity::Warning));
        assert!(config.accepts(Severity::Error));
        assert!(!config.is_synchronous());
    }
}
