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

//! Side channel for errors that occur while recording.

use std::fmt;
use std::io;
use std::io::Write;
use std::sync::Arc;
#[cfg(test)]
use std::sync::Mutex;

use crate::Error;

/// A sink for errors that cannot be returned to the logging caller.
///
/// Recording is fire-and-forget from the caller's perspective, so write failures, pruning
/// failures and panicking tasks end up here instead.
pub trait Trap: fmt::Debug + Send + Sync + 'static {
    /// Handle an error raised while recording.
    fn trap(&self, err: &Error);
}

impl<T: Trap + ?Sized> Trap for Arc<T> {
    fn trap(&self, err: &Error) {
        (**self).trap(err)
    }
}

/// A default trap that sends errors to standard error if possible.
///
/// If standard error is not available, it does nothing.
#[derive(Debug, Default, Clone, Copy)]
#[non_exhaustive]
pub struct DefaultTrap {}

impl Trap for DefaultTrap {
    fn trap(&self, err: &Error) {
        let _ = writeln!(io::stderr(), "{err}");
    }
}

/// A trap keeping every reported error, for assertions.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct CollectingTrap(Mutex<Vec<String>>);

#[cfg(test)]
impl CollectingTrap {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Trap for CollectingTrap {
    fn trap(&self, err: &Error) {
        self.0.lock().unwrap().push(err.to_string());
    }
}
