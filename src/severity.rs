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

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// The severity of a log entry.
///
/// From least to most severe, the severities are:
///
/// - `Verbose`
/// - `Debug`
/// - `Info`
/// - `Warning`
/// - `Error`
///
/// An entry is eligible for a threshold if `entry.severity() >= threshold`.
#[repr(usize)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Severity {
    /// Highly detailed output, usually only useful while tracing a specific problem.
    Verbose = 1,
    /// Information useful while debugging.
    Debug,
    /// Informational messages about normal operation.
    Info,
    /// Something unexpected that the program can recover from.
    Warning,
    /// A failure.
    Error,
}

const SEVERITY_NAMES: [&str; 5] = ["Verbose", "Debug", "Info", "Warning", "Error"];

impl Severity {
    /// All severities, from least to most severe.
    pub const ALL: [Severity; 5] = [
        Severity::Verbose,
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
    ];

    /// Return the capitalized name of the severity, e.g. `"Warning"`.
    pub fn name(&self) -> &'static str {
        SEVERITY_NAMES[*self as usize - 1]
    }

    /// Return the numeric ordinal of the severity, `1` for `Verbose` up to `5` for `Error`.
    pub fn ordinal(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Severity, Self::Err> {
        for severity in Severity::ALL {
            if s.eq_ignore_ascii_case(severity.name()) {
                return Ok(severity);
            }
        }

        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Severity::Verbose),
            "warn" => Ok(Severity::Warning),
            _ => Err(Error::new("unknown severity").with_context("input", s)),
        }
    }
}

impl From<log::Level> for Severity {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Severity::Error,
            log::Level::Warn => Severity::Warning,
            log::Level::Info => Severity::Info,
            log::Level::Debug => Severity::Debug,
            log::Level::Trace => Severity::Verbose,
        }
    }
}

impl From<Severity> for log::Level {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => log::Level::Error,
            Severity::Warning => log::Level::Warn,
            Severity::Info => log::Level::Info,
            Severity::Debug => log::Level::Debug,
            Severity::Verbose => log::Level::Trace,
        }
    }
}

impl From<Severity> for log::LevelFilter {
    fn from(severity: Severity) -> Self {
        log::Level::from(severity).to_level_filter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order() {
        for (i, a) in Severity::ALL.iter().enumerate() {
            for (j, b) in Severity::ALL.iter().enumerate() {
                assert_eq!(a.cmp(b), i.cmp(&j), "{a} vs {b}");
                assert_eq!(a.ordinal().cmp(&b.ordinal()), i.cmp(&j));
            }
        }
        assert!(Severity::Verbose < Severity::Debug);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_parse_and_display() {
        for severity in Severity::ALL {
            assert_eq!(severity.to_string().parse::<Severity>().unwrap(), severity);
        }
        assert_eq!("WARN".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!("trace".parse::<Severity>().unwrap(), Severity::Verbose);
        assert!("loud".parse::<Severity>().is_err());
        assert_eq!(format!("{:<7}|", Severity::Info), "Info   |");
    }

    #[test]
    fn test_log_level_mapping_preserves_order() {
        let levels: Vec<log::Level> = Severity::ALL.iter().map(|s| (*s).into()).collect();
        // log::Level orders the other way around: Error is the smallest.
        for pair in levels.windows(2) {
            assert!(pair[0] > pair[1]);
        }
        for severity in Severity::ALL {
            assert_eq!(Severity::from(log::Level::from(severity)), severity);
        }
    }
}
