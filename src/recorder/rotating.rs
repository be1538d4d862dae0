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

use std::collections::HashSet;
use std::fs;
use std::io;
use std::num::NonZeroU64;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;

use crate::DefaultTrap;
use crate::Error;
use crate::LogEntry;
use crate::Queue;
use crate::Trap;
use crate::format::Formatter;
use crate::format::TextFormatter;
use crate::recorder::Recorder;
use crate::recorder::file::LogFile;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A builder to configure and create a [`RotatingFileRecorder`].
#[derive(Debug)]
pub struct RotatingFileRecorderBuilder {
    directory: PathBuf,
    days_to_keep: usize,
    max_file_size: Option<NonZeroU64>,
    formatters: Vec<Box<dyn Formatter>>,
    tz: Option<TimeZone>,
    trap: Arc<dyn Trap>,
}

impl RotatingFileRecorderBuilder {
    fn new(directory: impl Into<PathBuf>, days_to_keep: usize) -> Self {
        Self {
            directory: directory.into(),
            days_to_keep,
            max_file_size: None,
            formatters: vec![],
            tz: None,
            trap: Arc::new(DefaultTrap::default()),
        }
    }

    /// Roll over to a numbered sibling file once the current file reaches `n` bytes.
    #[must_use]
    pub fn max_file_size(mut self, n: NonZeroU64) -> Self {
        self.max_file_size = Some(n);
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

    /// Set the time zone that decides calendar days and filenames.
    ///
    /// Default to the system time zone.
    #[must_use]
    pub fn time_zone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }

    /// Set the trap for write and pruning failures.
    ///
    /// Default to [`DefaultTrap`].
    #[must_use]
    pub fn trap(mut self, trap: impl Trap) -> Self {
        self.trap = Arc::new(trap);
        self
    }

    /// Build the [`RotatingFileRecorder`], creating the log directory if needed.
    ///
    /// # Errors
    ///
    /// Return an error if either:
    ///
    /// * `days_to_keep` is zero.
    /// * The log directory cannot be created.
    pub fn build(self) -> Result<RotatingFileRecorder, Error> {
        let Self {
            directory,
            days_to_keep,
            max_file_size,
            mut formatters,
            tz,
            trap,
        } = self;

        if days_to_keep == 0 {
            return Err(Error::new("days to keep must be positive"));
        }

        fs::create_dir_all(&directory).map_err(|err| {
            Error::new("failed to create log directory")
                .with_context("path", directory.display())
                .with_source(err)
        })?;

        if formatters.is_empty() {
            formatters.push(Box::new(TextFormatter::default()));
        }

        let label = format!("logwell-rotating:{}", directory.display());
        let queue = Queue::with_trap(label, trap.clone());

        Ok(RotatingFileRecorder {
            directory,
            days_to_keep,
            max_file_size,
            tz: tz.unwrap_or_else(TimeZone::system),
            formatters,
            queue,
            trap,
            state: Mutex::new(State {
                most_recent_log_time: None,
                current: None,
                rolled: None,
                #[cfg(test)]
                now: None,
            }),
        })
    }
}

/// A recorder that keeps one log file per calendar day, retained for a number of days.
///
/// Files are named `YYYY-MM-DD.log`. With a [maximum file
/// size](RotatingFileRecorderBuilder::max_file_size), a day whose file is full continues in
/// numbered siblings `YYYY-MM-DD(1).log`, `YYYY-MM-DD(2).log`, and so on.
///
/// # Warning
///
/// The recorder assumes it owns its directory exclusively. Whenever a new day starts, every
/// non-hidden entry of the directory that is not a log file for one of the retained days is
/// deleted, whether or not the recorder created it. Never point it at a directory holding
/// anything else.
///
/// # Examples
///
/// ```no_run
/// use logwell::recorder::RotatingFileRecorder;
///
/// let recorder = RotatingFileRecorder::builder("logs", 7).build().unwrap();
/// ```
#[derive(Debug)]
pub struct RotatingFileRecorder {
    directory: PathBuf,
    days_to_keep: usize,
    max_file_size: Option<NonZeroU64>,
    tz: TimeZone,
    formatters: Vec<Box<dyn Formatter>>,
    queue: Queue,
    trap: Arc<dyn Trap>,
    // only touched from the recorder's queue, or by `prune` to read the time
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    most_recent_log_time: Option<Timestamp>,
    current: Option<LogFile>,
    rolled: Option<Rolled>,
    // pinned "now" for retention decisions
    #[cfg(test)]
    now: Option<Timestamp>,
}

impl State {
    fn now(&self) -> Timestamp {
        #[cfg(test)]
        let pinned = self.now;
        #[cfg(not(test))]
        let pinned: Option<Timestamp> = None;
        pinned.unwrap_or_else(Timestamp::now)
    }
}

#[derive(Debug)]
struct Rolled {
    stem: String,
    count: usize,
}

impl RotatingFileRecorder {
    /// Create a builder for a recorder writing into `directory` and keeping `days_to_keep`
    /// calendar days of logs.
    pub fn builder(
        directory: impl Into<PathBuf>,
        days_to_keep: usize,
    ) -> RotatingFileRecorderBuilder {
        RotatingFileRecorderBuilder::new(directory, days_to_keep)
    }

    /// The filename used for logs recorded on `date`.
    pub fn log_filename(date: Date) -> String {
        format!("{}.log", date.strftime(DATE_FORMAT))
    }

    /// The number of calendar days for which log files are retained.
    pub fn days_to_keep(&self) -> usize {
        self.days_to_keep
    }

    /// The directory holding the log files.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The size at which a day's file rolls over, if any.
    pub fn max_file_size(&self) -> Option<NonZeroU64> {
        self.max_file_size
    }

    /// The path of the file the next entry of the current day goes to, if one is open.
    pub fn current_file_path(&self) -> Option<PathBuf> {
        self.state()
            .current
            .as_ref()
            .map(|file| file.path().to_path_buf())
    }

    /// Delete expired log files, and anything else that is not a retained log file.
    ///
    /// The retained days are the `days_to_keep` calendar days ending today. Hidden entries
    /// (starting with `.`) are left alone. Failures are reported to the trap and do not stop
    /// the pass.
    pub fn prune(&self) {
        let now = self.state().now();
        self.prune_at(now);
    }

    #[cfg(test)]
    fn set_now(&self, now: Timestamp) {
        self.state().now = Some(now);
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn date_stem(&self, timestamp: Timestamp) -> String {
        timestamp
            .to_zoned(self.tz.clone())
            .strftime(DATE_FORMAT)
            .to_string()
    }

    fn retained_stems(&self, now: Timestamp) -> HashSet<String> {
        let mut stems = HashSet::with_capacity(self.days_to_keep);
        let mut date = now.to_zoned(self.tz.clone()).date();
        for _ in 0..self.days_to_keep {
            stems.insert(date.strftime(DATE_FORMAT).to_string());
            match date.yesterday() {
                Ok(yesterday) => date = yesterday,
                Err(_) => break,
            }
        }
        stems
    }

    fn prune_at(&self, now: Timestamp) {
        let retained = self.retained_stems(now);

        let read_dir = match fs::read_dir(&self.directory) {
            Ok(read_dir) => read_dir,
            Err(err) => {
                let err = Error::new("failed to read log directory")
                    .with_context("path", self.directory.display())
                    .with_source(err);
                self.trap.trap(&err);
                return;
            }
        };

        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let err = Error::new("failed to read log directory entry")
                        .with_context("path", self.directory.display())
                        .with_source(err);
                    self.trap.trap(&err);
                    continue;
                }
            };

            let filename = entry.file_name();
            let filename = filename.to_string_lossy();
            if filename.starts_with('.') || is_retained_log(&filename, &retained) {
                continue;
            }

            let path = entry.path();
            let removed = match entry.file_type() {
                Ok(file_type) if file_type.is_dir() => fs::remove_dir_all(&path),
                _ => fs::remove_file(&path),
            };
            if let Err(err) = removed {
                let err = Error::new("failed to delete expired log file")
                    .with_context("path", path.display())
                    .with_source(err);
                self.trap.trap(&err);
            }
        }
    }

    fn rolled_path(&self, stem: &str, count: usize) -> PathBuf {
        self.directory.join(format!("{stem}({count}).log"))
    }

    /// Find the highest rollover number already on disk for the day.
    fn scan_rolled(&self, stem: &str) -> Result<usize, Error> {
        let read_dir = fs::read_dir(&self.directory).map_err(|err| {
            Error::new("failed to read log directory")
                .with_context("path", self.directory.display())
                .with_source(err)
        })?;

        let count = read_dir
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let filename = entry.file_name();
                let filename = filename.to_str()?;
                match parse_log_filename(filename)? {
                    (s, Some(count)) if s == stem => Some(count),
                    _ => None,
                }
            })
            .max()
            .unwrap_or(0);

        Ok(count)
    }

    /// Resolve the file that the next entry of the day `stem` goes to.
    fn open_for_day(&self, state: &mut State, stem: &str) -> Result<LogFile, Error> {
        let primary = self.directory.join(format!("{stem}.log"));
        let Some(max_file_size) = self.max_file_size else {
            return LogFile::open(primary);
        };
        let max_file_size = max_file_size.get();

        match file_len(&primary)? {
            None => return LogFile::open(primary),
            Some(len) if len < max_file_size => return LogFile::open(primary),
            Some(_) => {}
        }

        let mut count = match &state.rolled {
            Some(rolled) if rolled.stem == stem => rolled.count,
            _ => self.scan_rolled(stem)?,
        };
        if count == 0 {
            count = 1;
        } else if file_len(&self.rolled_path(stem, count))?.is_some_and(|len| len >= max_file_size)
        {
            count += 1;
        }

        state.rolled = Some(Rolled {
            stem: stem.to_string(),
            count,
        });
        LogFile::open(self.rolled_path(stem, count))
    }

    fn open_or_trap(&self, state: &mut State, stem: &str) -> Option<LogFile> {
        match self.open_for_day(state, stem) {
            Ok(file) => Some(file),
            Err(err) => {
                self.trap.trap(&err);
                None
            }
        }
    }
}

impl Recorder for RotatingFileRecorder {
    fn formatters(&self) -> &[Box<dyn Formatter>] {
        &self.formatters
    }

    fn queue(&self) -> &Queue {
        &self.queue
    }

    fn record(&self, message: &str, entry: &LogEntry, _: &Queue, _: bool) {
        let mut state = self.state();
        let state = &mut *state;

        let stem = self.date_stem(entry.timestamp());
        let same_day = state
            .most_recent_log_time
            .is_some_and(|time| self.date_stem(time) == stem);

        if !same_day {
            self.prune_at(state.now());
            state.current = None;
        }
        if state.current.is_none() {
            state.current = self.open_or_trap(state, &stem);
        }
        state.most_recent_log_time = Some(entry.timestamp());

        let Some(file) = state.current.as_mut() else {
            return;
        };
        if let Err(err) = file.write_line(message) {
            let err = Error::new("failed to write log file")
                .with_context("path", file.path().display())
                .with_source(err);
            self.trap.trap(&err);
        }

        // roll over eagerly, so the next entry starts on a fresh file
        let Some(max_file_size) = self.max_file_size else {
            return;
        };
        let full = match file.len() {
            Ok(len) => len >= max_file_size.get(),
            Err(err) => {
                let err = Error::new("failed to stat log file")
                    .with_context("path", file.path().display())
                    .with_source(err);
                self.trap.trap(&err);
                false
            }
        };
        if full {
            state.current = self.open_or_trap(state, &stem);
        }
    }
}

fn file_len(path: &Path) -> Result<Option<u64>, Error> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(Some(metadata.len())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Error::new("failed to stat log file")
            .with_context("path", path.display())
            .with_source(err)),
    }
}

/// Split `STEM.log` or `STEM(N).log` into the stem and the rollover number.
fn parse_log_filename(filename: &str) -> Option<(&str, Option<usize>)> {
    let rest = filename.strip_suffix(".log")?;
    let Some(rest) = rest.strip_suffix(')') else {
        return Some((rest, None));
    };

    let (stem, count) = rest.rsplit_once('(')?;
    if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let count = count.parse().ok()?;
    Some((stem, Some(count)))
}

fn is_retained_log(filename: &str, retained: &HashSet<String>) -> bool {
    parse_log_filename(filename).is_some_and(|(stem, _)| retained.contains(stem))
}
