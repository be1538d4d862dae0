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

//! The dispatcher fanning log entries out to recorders.

use std::sync::Arc;

use crate::DefaultTrap;
use crate::LogConfiguration;
use crate::LogEntry;
use crate::Queue;
use crate::Severity;
use crate::Trap;
use crate::filter::passes_all;
use crate::recorder::format_and_record;

/// Accepts log entries and dispatches them to the recorders of every matching configuration.
///
/// The configurations are flattened once at construction and never change afterwards.
///
/// For each entry, the configurations whose minimum severity the entry meets are selected.
/// Asynchronous configurations are dispatched first, without waiting; synchronous ones are
/// dispatched next, and [`log`](LogReceptacle::log) returns only once their recorders are done.
/// Filtering runs on the receptacle's own queue, recording on each recorder's queue.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use logwell::LogConfiguration;
/// use logwell::LogEntry;
/// use logwell::LogReceptacle;
/// use logwell::Severity;
/// use logwell::recorder::BufferedRecorder;
///
/// let buffer = Arc::new(BufferedRecorder::messages().build());
/// let receptacle = LogReceptacle::new([LogConfiguration::builder()
///     .minimum_severity(Severity::Debug)
///     .shared_recorder(buffer.clone())
///     .synchronous(true)
///     .build()]);
///
/// receptacle.log(LogEntry::message(Severity::Info, "hello"));
/// assert_eq!(buffer.buffer().len(), 1);
/// ```
#[derive(Debug)]
pub struct LogReceptacle {
    configurations: Vec<Arc<LogConfiguration>>,
    minimum_severity: Severity,
    accept_queue: Queue,
}

impl LogReceptacle {
    /// Create a receptacle for the given configurations.
    pub fn new(configurations: impl IntoIterator<Item = LogConfiguration>) -> LogReceptacle {
        LogReceptacle::with_trap(configurations, DefaultTrap::default())
    }

    /// Create a receptacle reporting panicking filters to `trap`.
    pub fn with_trap(
        configurations: impl IntoIterator<Item = LogConfiguration>,
        trap: impl Trap,
    ) -> LogReceptacle {
        let configurations: Vec<_> = configurations
            .into_iter()
            .flat_map(LogConfiguration::flatten)
            .map(Arc::new)
            .collect();

        // with nothing to record into, only the most severe entries pass the fast path
        let minimum_severity = configurations
            .iter()
            .map(|config| config.minimum_severity())
            .min()
            .unwrap_or(Severity::Error);

        LogReceptacle {
            configurations,
            minimum_severity,
            accept_queue: Queue::with_trap("logwell-accept", trap),
        }
    }

    /// The flattened configurations.
    pub fn configurations(&self) -> &[Arc<LogConfiguration>] {
        &self.configurations
    }

    /// The least minimum severity over all configurations.
    pub fn minimum_severity(&self) -> Severity {
        self.minimum_severity
    }

    /// Whether an entry of `severity` could be recorded by any configuration.
    pub fn accepts(&self, severity: Severity) -> bool {
        severity >= self.minimum_severity
    }

    /// Dispatch an entry.
    ///
    /// An entry that no configuration accepts is silently dropped.
    pub fn log(&self, entry: LogEntry) {
        if !self.accepts(entry.severity()) {
            return;
        }

        let severity = entry.severity();
        let (synchronous, asynchronous): (Vec<_>, Vec<_>) = self
            .configurations
            .iter()
            .filter(|config| config.accepts(severity))
            .partition(|config| config.is_synchronous());
        if synchronous.is_empty() && asynchronous.is_empty() {
            return;
        }

        let entry = Arc::new(entry);
        for config in asynchronous {
            let config = config.clone();
            let entry = entry.clone();
            self.accept_queue
                .exec_async(move || dispatch(&config, &entry, false));
        }
        for config in synchronous {
            let config = config.clone();
            let entry = entry.clone();
            self.accept_queue
                .exec_sync(move || dispatch(&config, &entry, true));
        }
    }

    /// Block until every entry logged before this call is recorded, then flush the recorders.
    pub fn flush(&self) {
        // pending dispatches enqueue their recording tasks before the barrier returns
        self.accept_queue.barrier();

        for config in &self.configurations {
            for recorder in config.recorders() {
                let task_recorder = recorder.clone();
                recorder.queue().exec_sync(move || task_recorder.flush());
            }
        }
    }
}

/// Filter the entry for one configuration and hand it to each of its recorders.
///
/// Runs on the accept queue.
fn dispatch(config: &LogConfiguration, entry: &Arc<LogEntry>, synchronous: bool) {
    if !passes_all(config.filters(), entry) {
        return;
    }

    for recorder in config.recorders() {
        let queue = recorder.queue().clone();
        let recorder = recorder.clone();
        let entry = entry.clone();
        let task = move || format_and_record(recorder.as_ref(), &entry, synchronous);

        if synchronous {
            queue.exec_sync(task);
        } else {
            queue.exec_async(task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::CustomFilter;
    use crate::format::PayloadFormatter;
    use crate::recorder::BufferedRecorder;
    use crate::trap::CollectingTrap;

    fn buffered() -> Arc<BufferedRecorder<String>> {
        Arc::new(
            BufferedRecorder::messages()
                .formatter(PayloadFormatter::default())
                .build(),
        )
    }

    #[test]
    fn test_minimum_severity_of_receptacle() {
        let receptacle = LogReceptacle::new([
            LogConfiguration::builder()
                .minimum_severity(Severity::Warning)
                .shared_recorder(buffered())
                .build(),
            LogConfiguration::builder()
                .minimum_severity(Severity::Debug)
                .shared_recorder(buffered())
                .build(),
        ]);
        assert_eq!(receptacle.minimum_severity(), Severity::Debug);
        assert!(!receptacle.accepts(Severity::Verbose));

        let empty = LogReceptacle::new(std::iter::empty());
        assert_eq!(empty.minimum_severity(), Severity::Error);
        assert!(empty.configurations().is_empty());
        empty.log(LogEntry::message(Severity::Error, "dropped"));
        empty.flush();
    }

    #[test]
    fn test_recorderless_configurations_are_dropped() {
        let receptacle = LogReceptacle::new([LogConfiguration::builder()
            .minimum_severity(Severity::Verbose)
            .configuration(
                LogConfiguration::builder()
                    .shared_recorder(buffered())
                    .build(),
            )
            .build()]);
        assert_eq!(receptacle.configurations().len(), 1);
        // the recorderless parent does not lower the fast-path threshold
        assert_eq!(receptacle.minimum_severity(), Severity::Info);
    }

    #[test]
    fn test_synchronous_recording_is_done_on_return() {
        let recorder = buffered();
        let receptacle = LogReceptacle::new([LogConfiguration::builder()
            .shared_recorder(recorder.clone())
            .synchronous(true)
            .build()]);

        for i in 0..20 {
            receptacle.log(LogEntry::message(Severity::Info, format!("m{i}")));
            assert_eq!(recorder.buffer().len(), i + 1);
        }
    }

    #[test]
    fn test_panicking_filter_does_not_block_caller() {
        let trap = Arc::new(CollectingTrap::default());
        let recorder = buffered();
        let receptacle = LogReceptacle::with_trap(
            [
                LogConfiguration::builder()
                    .filter(CustomFilter::new(|_: &LogEntry| panic!("bad filter")))
                    .shared_recorder(buffered())
                    .synchronous(true)
                    .build(),
                LogConfiguration::builder()
                    .shared_recorder(recorder.clone())
                    .synchronous(true)
                    .build(),
            ],
            trap.clone(),
        );

        receptacle.log(LogEntry::message(Severity::Info, "survives"));
        assert_eq!(recorder.buffer().snapshot(), vec!["survives"]);

        let trapped = trap.messages();
        assert_eq!(trapped.len(), 1);
        assert!(trapped[0].contains("bad filter"), "{}", trapped[0]);
    }
}
