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

use std::collections::BTreeSet;
use std::fs;
use std::num::NonZeroU64;
use std::path::Path;

use jiff::Timestamp;
use jiff::tz::TimeZone;
use logwell::LogConfiguration;
use logwell::LogEntry;
use logwell::LogReceptacle;
use logwell::Severity;
use logwell::format::PayloadFormatter;
use logwell::recorder::RotatingFileRecorder;
use tempfile::TempDir;

fn list_dir(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_size_rollover_through_receptacle() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let dir = temp_dir.path().join("logs");

    let recorder = RotatingFileRecorder::builder(&dir, 2)
        .max_file_size(NonZeroU64::new(64).unwrap())
        .time_zone(TimeZone::UTC)
        .formatter(PayloadFormatter::default())
        .build()
        .unwrap();
    assert!(dir.is_dir());

    // the directory is owned by the recorder: strays go on the first write
    fs::write(dir.join("notes.txt"), "not a log").unwrap();
    fs::write(dir.join("2000-01-01.log"), "expired").unwrap();
    fs::write(dir.join(".keep"), "").unwrap();

    let receptacle = LogReceptacle::new([LogConfiguration::builder()
        .minimum_severity(Severity::Verbose)
        .recorder(recorder)
        .synchronous(true)
        .build()]);

    // pin every entry to one instant so the day cannot change mid-test
    let now = Timestamp::now();
    for i in 0..10 {
        // 31 characters plus the newline: two lines fill a file
        let message = format!("{i:02}{}", "x".repeat(29));
        receptacle.log(
            LogEntry::builder(Severity::Info, message)
                .timestamp(now)
                .build(),
        );
    }

    let today = RotatingFileRecorder::log_filename(now.to_zoned(TimeZone::UTC).date());
    let stem = today.trim_end_matches(".log");

    // the last write filled (4), so an empty (5) is already open for the next entry
    let mut expected = BTreeSet::from([".keep".to_string(), today.clone()]);
    for n in 1..=5 {
        expected.insert(format!("{stem}({n}).log"));
    }
    assert_eq!(list_dir(&dir), expected);

    let first = fs::read_to_string(dir.join(&today)).unwrap();
    assert_eq!(first.lines().count(), 2);
    assert!(first.starts_with("00"));

    let last = fs::read_to_string(dir.join(format!("{stem}(4).log"))).unwrap();
    let lines: Vec<_> = last.lines().map(|line| &line[..2]).collect();
    assert_eq!(lines, vec!["08", "09"]);
}

#[test]
fn test_construction_errors() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");

    let err = RotatingFileRecorder::builder(temp_dir.path(), 0)
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("days to keep"));

    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    assert!(RotatingFileRecorder::builder(blocker.join("logs"), 7)
        .build()
        .is_err());
}
