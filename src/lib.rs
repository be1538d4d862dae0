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

//! Logwell is a logging library that dispatches log entries to recorders through filtered,
//! independently queued configurations.
//!
//! # Overview
//!
//! A [`LogReceptacle`] owns a list of [`LogConfiguration`]s. Each configuration pairs a minimum
//! [`Severity`] and a chain of [`Filter`]s with the [`Recorder`]s that receive the entries that
//! pass. A recorder turns an entry into text with its [`Formatter`]s and writes it out on its
//! own [`Queue`], so a slow recorder never holds up the others.
//!
//! A configuration is either synchronous, in which case a logging call returns only once its
//! recorders are done, or asynchronous, in which case recording may lag behind the caller.
//!
//! Recording failures are never returned to the logging caller. They are reported to a
//! [`Trap`], by default printing to stderr.
//!
//! # Examples
//!
//! ```
//! use logwell::LogConfiguration;
//! use logwell::LogEntry;
//! use logwell::LogReceptacle;
//! use logwell::Severity;
//! use logwell::recorder::Stderr;
//! use logwell::recorder::Stdout;
//!
//! let receptacle = LogReceptacle::new([
//!     LogConfiguration::builder()
//!         .minimum_severity(Severity::Error)
//!         .recorder(Stderr::default())
//!         .synchronous(true)
//!         .build(),
//!     LogConfiguration::builder()
//!         .minimum_severity(Severity::Info)
//!         .recorder(Stdout::default())
//!         .build(),
//! ]);
//!
//! receptacle.log(LogEntry::message(Severity::Error, "Error message."));
//! receptacle.log(LogEntry::message(Severity::Info, "Info message."));
//! receptacle.flush();
//! ```
//!
//! Entries can also come from the `log` crate through [`bridge::LogBridge`].

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod bridge;
pub mod filter;
pub mod format;
pub mod recorder;

mod config;
pub use config::LogConfiguration;
pub use config::LogConfigurationBuilder;

mod entry;
pub use entry::LogEntry;
pub use entry::LogEntryBuilder;
pub use entry::Payload;
pub use entry::PayloadValue;

mod error;
pub use error::Error;

mod queue;
pub use queue::Queue;

mod receptacle;
pub use receptacle::LogReceptacle;

mod severity;
pub use severity::Severity;

mod trap;
pub use trap::DefaultTrap;
pub use trap::Trap;

pub use filter::Filter;
pub use format::Formatter;
pub use recorder::Recorder;
