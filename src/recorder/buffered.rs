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

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::LogEntry;
use crate::Queue;
use crate::format::Formatter;
use crate::format::TextFormatter;
use crate::recorder::CallbackHandle;
use crate::recorder::CallbackRegistry;
use crate::recorder::Recorder;

const DEFAULT_BUFFER_LIMIT: usize = 10_000;

/// Callback invoked after an item was recorded, with whether an older item was evicted.
pub type RecordCallback<T> = dyn Fn(&Buffer<T>, &T, bool) + Send + Sync;

/// Callback invoked after the buffer was cleared.
pub type ClearCallback<T> = dyn Fn(&Buffer<T>) + Send + Sync;

/// The in-memory contents of a [`BufferedRecorder`].
///
/// Items are held newest-last, or newest-first when the buffer is reverse chronological. With
/// a positive limit, recording into a full buffer evicts the oldest item first.
pub struct Buffer<T> {
    items: Mutex<VecDeque<T>>,
    limit: usize,
    reverse_chronological: bool,
    did_record: CallbackRegistry<RecordCallback<T>>,
    did_clear: CallbackRegistry<ClearCallback<T>>,
}

impl<T> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.items().len())
            .field("limit", &self.limit)
            .field("reverse_chronological", &self.reverse_chronological)
            .finish_non_exhaustive()
    }
}

impl<T> Buffer<T> {
    fn items(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The maximum number of items held; `0` means unbounded.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Whether new items are inserted at the front.
    pub fn is_reverse_chronological(&self) -> bool {
        self.reverse_chronological
    }

    /// The number of items currently held.
    pub fn len(&self) -> usize {
        self.items().len()
    }

    /// Whether the buffer holds no item.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync + 'static> Buffer<T> {
    fn new(limit: usize, reverse_chronological: bool) -> Self {
        Buffer {
            items: Mutex::new(VecDeque::new()),
            limit,
            reverse_chronological,
            did_record: CallbackRegistry::new(),
            did_clear: CallbackRegistry::new(),
        }
    }

    /// A snapshot of the items, in buffer order.
    pub fn snapshot(&self) -> Vec<T> {
        self.items().iter().cloned().collect()
    }

    /// Register a callback invoked after each recorded item.
    ///
    /// The callback receives the buffer, the new item, and whether an older item was evicted
    /// to make room. It runs on the recorder's queue.
    #[must_use = "the callback is deregistered as soon as the handle is dropped"]
    pub fn on_record(
        &self,
        callback: impl Fn(&Buffer<T>, &T, bool) + Send + Sync + 'static,
    ) -> CallbackHandle {
        self.did_record.add(Arc::new(callback))
    }

    /// Register a callback invoked after the buffer was cleared.
    #[must_use = "the callback is deregistered as soon as the handle is dropped"]
    pub fn on_clear(&self, callback: impl Fn(&Buffer<T>) + Send + Sync + 'static) -> CallbackHandle {
        self.did_clear.add(Arc::new(callback))
    }

    /// Insert an item, evicting the oldest one if the buffer is full.
    ///
    /// Return whether an item was evicted.
    fn push(&self, item: T) -> bool {
        let mut items = self.items();

        let full = self.limit > 0 && items.len() >= self.limit;
        if full {
            if self.reverse_chronological {
                items.pop_back();
            } else {
                items.pop_front();
            }
        }

        if self.reverse_chronological {
            items.push_front(item);
        } else {
            items.push_back(item);
        }
        full
    }

    fn record(&self, item: T) {
        let did_truncate = self.push(item.clone());
        // callbacks are snapshotted so they run without holding any lock
        for callback in self.did_record.callbacks() {
            callback(self, &item, did_truncate);
        }
    }

    fn clear(&self) {
        self.items().clear();
        for callback in self.did_clear.callbacks() {
            callback(self);
        }
    }
}

type MakeItem<T> = dyn Fn(&LogEntry, &str) -> T + Send + Sync;

/// A builder to configure and create a [`BufferedRecorder`].
pub struct BufferedRecorderBuilder<T> {
    make_item: Box<MakeItem<T>>,
    buffer_limit: usize,
    reverse_chronological: bool,
    formatters: Vec<Box<dyn Formatter>>,
    queue: Option<Queue>,
}

impl<T> fmt::Debug for BufferedRecorderBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedRecorderBuilder")
            .field("buffer_limit", &self.buffer_limit)
            .field("reverse_chronological", &self.reverse_chronological)
            .field("formatters", &self.formatters)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + Send + Sync + 'static> BufferedRecorderBuilder<T> {
    fn new(make_item: impl Fn(&LogEntry, &str) -> T + Send + Sync + 'static) -> Self {
        Self {
            make_item: Box::new(make_item),
            buffer_limit: DEFAULT_BUFFER_LIMIT,
            reverse_chronological: false,
            formatters: vec![],
            queue: None,
        }
    }

    /// Set the maximum number of items held; `0` means unbounded.
    ///
    /// Default to 10 000.
    #[must_use]
    pub fn buffer_limit(mut self, limit: usize) -> Self {
        self.buffer_limit = limit;
        self
    }

    /// Insert new items at the front of the buffer instead of the back.
    #[must_use]
    pub fn reverse_chronological(mut self, reverse: bool) -> Self {
        self.reverse_chronological = reverse;
        self
    }

    /// Add a formatter. Formatters are consulted in the order they were added.
    ///
    /// Default to a single [`TextFormatter`] if none is added.
    #[must_use]
    pub fn formatter(mut self, formatter: impl Into<Box<dyn Formatter>>) -> Self {
        self.formatters.push(formatter.into());
        self
    }

    /// Record on the given queue instead of a dedicated one.
    #[must_use]
    pub fn queue(mut self, queue: Queue) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Build the [`BufferedRecorder`].
    pub fn build(self) -> BufferedRecorder<T> {
        let Self {
            make_item,
            buffer_limit,
            reverse_chronological,
            mut formatters,
            queue,
        } = self;

        if formatters.is_empty() {
            formatters.push(Box::new(TextFormatter::default()));
        }

        BufferedRecorder {
            buffer: Arc::new(Buffer::new(buffer_limit, reverse_chronological)),
            formatters,
            queue: queue.unwrap_or_else(|| Queue::new("logwell-buffer")),
            make_item,
        }
    }
}

/// A recorder that keeps recorded items in memory.
///
/// Each recorded `(entry, message)` pair is turned into an item of type `T` by a mapping
/// function, and inserted into a bounded [`Buffer`]. Observers subscribe to changes through
/// [`Buffer::on_record`] and [`Buffer::on_clear`].
///
/// # Examples
///
/// ```
/// use logwell::recorder::BufferedRecorder;
///
/// let recorder = BufferedRecorder::messages().buffer_limit(100).build();
/// let _handle = recorder.buffer().on_record(|_, message, _| println!("recorded {message}"));
/// ```
pub struct BufferedRecorder<T> {
    buffer: Arc<Buffer<T>>,
    formatters: Vec<Box<dyn Formatter>>,
    queue: Queue,
    make_item: Box<MakeItem<T>>,
}

impl<T> fmt::Debug for BufferedRecorder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedRecorder")
            .field("buffer", &self.buffer)
            .field("formatters", &self.formatters)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + Send + Sync + 'static> BufferedRecorder<T> {
    /// Create a builder producing buffer items with `make_item`.
    pub fn builder(
        make_item: impl Fn(&LogEntry, &str) -> T + Send + Sync + 'static,
    ) -> BufferedRecorderBuilder<T> {
        BufferedRecorderBuilder::new(make_item)
    }

    /// The buffer holding the recorded items.
    pub fn buffer(&self) -> &Arc<Buffer<T>> {
        &self.buffer
    }

    /// Empty the buffer and notify the clear callbacks.
    ///
    /// Blocks until the recorder's queue has run the operation, so it is ordered against
    /// entries submitted before the call.
    pub fn clear(&self) {
        let buffer = self.buffer.clone();
        self.queue.exec_sync(move || buffer.clear());
    }
}

impl BufferedRecorder<String> {
    /// A builder whose items are the formatted messages.
    pub fn messages() -> BufferedRecorderBuilder<String> {
        BufferedRecorder::builder(|_, message| message.to_string())
    }
}

impl BufferedRecorder<LogEntry> {
    /// A builder whose items are the log entries.
    pub fn entries() -> BufferedRecorderBuilder<LogEntry> {
        BufferedRecorder::builder(|entry, _| entry.clone())
    }
}

impl BufferedRecorder<(LogEntry, String)> {
    /// A builder whose items pair each entry with its formatted message.
    pub fn entry_messages() -> BufferedRecorderBuilder<(LogEntry, String)> {
        BufferedRecorder::builder(|entry, message| (entry.clone(), message.to_string()))
    }
}

impl<T: Clone + Send + Sync + 'static> Recorder for BufferedRecorder<T> {
    fn formatters(&self) -> &[Box<dyn Formatter>] {
        &self.formatters
    }

    fn queue(&self) -> &Queue {
        &self.queue
    }

    fn record(&self, message: &str, entry: &LogEntry, _: &Queue, _: bool) {
        let item = (self.make_item)(entry, message);
        self.buffer.record(item);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::Severity;

    fn record_all<T: Clone + Send + Sync + 'static>(recorder: &BufferedRecorder<T>, n: usize) {
        for i in 0..n {
            let entry = LogEntry::message(Severity::Info, i.to_string());
            recorder.record(&i.to_string(), &entry, recorder.queue(), true);
        }
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let recorder = BufferedRecorder::messages().buffer_limit(3).build();
        let flags = Arc::new(Mutex::new(vec![]));

        let seen = flags.clone();
        let _handle = recorder
            .buffer()
            .on_record(move |_, _, did_truncate| seen.lock().unwrap().push(did_truncate));

        record_all(&recorder, 5);

        assert_eq!(recorder.buffer().snapshot(), vec!["2", "3", "4"]);
        assert_eq!(
            *flags.lock().unwrap(),
            vec![false, false, false, true, true]
        );
    }

    #[test]
    fn test_reverse_chronological() {
        let recorder = BufferedRecorder::messages()
            .buffer_limit(3)
            .reverse_chronological(true)
            .build();
        record_all(&recorder, 5);
        assert_eq!(recorder.buffer().snapshot(), vec!["4", "3", "2"]);
        assert!(recorder.buffer().is_reverse_chronological());
    }

    #[test]
    fn test_unbounded() {
        let recorder = BufferedRecorder::entries().buffer_limit(0).build();
        record_all(&recorder, 50);
        assert_eq!(recorder.buffer().len(), 50);
        let first = &recorder.buffer().snapshot()[0];
        assert!(matches!(first.payload(), crate::Payload::Message(m) if m == "0"));
    }

    #[test]
    fn test_callback_sees_new_item_and_buffer() {
        let recorder = BufferedRecorder::entry_messages().build();
        let lengths = Arc::new(Mutex::new(vec![]));

        let seen = lengths.clone();
        let _handle = recorder.buffer().on_record(move |buffer, (entry, message), _| {
            assert_eq!(entry.severity(), Severity::Info);
            seen.lock().unwrap().push((buffer.len(), message.clone()));
        });
        record_all(&recorder, 2);

        assert_eq!(
            *lengths.lock().unwrap(),
            vec![(1, "0".to_string()), (2, "1".to_string())]
        );
    }

    #[test]
    fn test_clear_notifies_and_dropped_handles_stop() {
        let recorder = BufferedRecorder::messages().build();
        let cleared = Arc::new(AtomicUsize::new(0));

        let counter = cleared.clone();
        let handle = recorder.buffer().on_clear(move |buffer| {
            assert!(buffer.is_empty());
            counter.fetch_add(1, Ordering::SeqCst);
        });

        record_all(&recorder, 3);
        recorder.clear();
        assert!(recorder.buffer().is_empty());
        assert_eq!(cleared.load(Ordering::SeqCst), 1);

        drop(handle);
        recorder.clear();
        assert_eq!(cleared.load(Ordering::SeqCst), 1);
    }
}
