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

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::Weak;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

/// A registry of callbacks of type `F`, typically `dyn Fn(..) + Send + Sync`.
///
/// Callbacks may be added, removed and snapshotted from any thread. Each registration returns a
/// [`CallbackHandle`]; the callback stays registered until the handle is dropped or
/// [`stop`](CallbackHandle::stop) is called.
pub struct CallbackRegistry<F: ?Sized> {
    inner: Arc<Callbacks<F>>,
}

struct Callbacks<F: ?Sized> {
    callbacks: Mutex<BTreeMap<u64, Arc<F>>>,
}

impl<F: ?Sized> Callbacks<F> {
    fn callbacks(&self) -> MutexGuard<'_, BTreeMap<u64, Arc<F>>> {
        self.callbacks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

trait RemoveCallback: Send + Sync {
    fn remove(&self, id: u64);
}

impl<F: ?Sized + Send + Sync> RemoveCallback for Callbacks<F> {
    fn remove(&self, id: u64) {
        self.callbacks().remove(&id);
    }
}

impl<F: ?Sized> fmt::Debug for CallbackRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("len", &self.inner.callbacks().len())
            .finish()
    }
}

impl<F: ?Sized> Default for CallbackRegistry<F> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Callbacks {
                callbacks: Mutex::new(BTreeMap::new()),
            }),
        }
    }
}

impl<F: ?Sized + Send + Sync + 'static> CallbackRegistry<F> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback.
    ///
    /// Keep the returned handle alive for as long as the callback should be invoked.
    #[must_use = "the callback is deregistered as soon as the handle is dropped"]
    pub fn add(&self, callback: Arc<F>) -> CallbackHandle {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);

        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        self.inner.callbacks().insert(id, callback);

        let weak = Arc::downgrade(&self.inner);
        let registry: Weak<dyn RemoveCallback> = weak;
        CallbackHandle {
            id,
            registry: Some(registry),
        }
    }

    /// A snapshot of the currently registered callbacks, in registration order.
    ///
    /// The lock is released before returning, so callbacks may register or deregister while
    /// being invoked.
    pub fn callbacks(&self) -> Vec<Arc<F>> {
        self.inner.callbacks().values().cloned().collect()
    }

    /// The number of registered callbacks.
    pub fn len(&self) -> usize {
        self.inner.callbacks().len()
    }

    /// Whether no callback is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A registration in a [`CallbackRegistry`].
///
/// Dropping the handle deregisters the callback. Wrap it in an `Arc` to share it; the callback
/// then lives until the last clone is dropped.
pub struct CallbackHandle {
    id: u64,
    registry: Option<Weak<dyn RemoveCallback>>,
}

impl fmt::Debug for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackHandle")
            .field("id", &self.id)
            .field("active", &self.registry.is_some())
            .finish()
    }
}

impl CallbackHandle {
    /// Prevent further invocations of the callback.
    pub fn stop(&mut self) {
        if let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) {
            registry.remove(self.id);
        }
    }
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    type Callback = dyn Fn(usize) + Send + Sync;

    #[test]
    fn test_handle_lifetime_controls_registration() {
        let registry = CallbackRegistry::<Callback>::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        let handle = registry.add(Arc::new(move |n: usize| {
            counter.fetch_add(n, Ordering::SeqCst);
        }));
        assert_eq!(registry.len(), 1);

        for callback in registry.callbacks() {
            callback(2);
        }
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        drop(handle);
        assert!(registry.is_empty());
        for callback in registry.callbacks() {
            callback(2);
        }
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_explicit_stop_and_shared_handle() {
        let registry = CallbackRegistry::<Callback>::new();

        let mut first = registry.add(Arc::new(|_: usize| {}));
        let shared = Arc::new(registry.add(Arc::new(|_: usize| {})));
        assert_eq!(registry.len(), 2);

        first.stop();
        assert_eq!(registry.len(), 1);

        let clone = shared.clone();
        drop(shared);
        assert_eq!(registry.len(), 1);
        drop(clone);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_handle_outliving_registry() {
        let registry = CallbackRegistry::<Callback>::new();
        let mut handle = registry.add(Arc::new(|_: usize| {}));
        drop(registry);
        handle.stop();
    }
}
