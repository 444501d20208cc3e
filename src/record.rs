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

//! Log record and severity levels.

use std::fmt;
use std::str::FromStr;
use std::thread;

use jiff::Timestamp;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;

/// The payload of a log message.
#[derive(Clone, Debug)]
pub struct Record<'a> {
    // the observed time
    now: Timestamp,

    level: Level,
    logger: &'a str,
    thread: String,

    // the payload
    args: fmt::Arguments<'a>,
    error: Option<&'a (dyn std::error::Error + 'static)>,
}

impl<'a> Record<'a> {
    /// The observed time.
    pub fn time(&self) -> Timestamp {
        self.now
    }

    /// The severity of the message.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The dotted name of the logger the record was emitted to. The root logger is `""`.
    pub fn logger(&self) -> &'a str {
        self.logger
    }

    /// The name of the emitting thread, or its id if it is unnamed.
    pub fn thread(&self) -> &str {
        &self.thread
    }

    /// The message body.
    pub fn args(&self) -> &fmt::Arguments<'a> {
        &self.args
    }

    /// The error attached to the record, if any.
    pub fn error(&self) -> Option<&'a (dyn std::error::Error + 'static)> {
        self.error
    }

    /// Returns a new builder.
    pub fn builder() -> RecordBuilder<'a> {
        RecordBuilder::default()
    }
}

/// Builder for [`Record`].
#[derive(Debug)]
pub struct RecordBuilder<'a> {
    record: Record<'a>,
}

impl Default for RecordBuilder<'_> {
    fn default() -> Self {
        RecordBuilder {
            record: Record {
                now: Timestamp::now(),
                level: Level::Info,
                logger: "",
                thread: current_thread_label(),
                args: format_args!(""),
                error: None,
            },
        }
    }
}

impl<'a> RecordBuilder<'a> {
    /// Set [`args`](Record::args).
    pub fn args(mut self, args: fmt::Arguments<'a>) -> Self {
        self.record.args = args;
        self
    }

    /// Set [`level`](Record::level).
    pub fn level(mut self, level: Level) -> Self {
        self.record.level = level;
        self
    }

    /// Set [`logger`](Record::logger).
    pub fn logger(mut self, logger: &'a str) -> Self {
        self.record.logger = logger;
        self
    }

    /// Set [`time`](Record::time).
    pub fn time(mut self, now: Timestamp) -> Self {
        self.record.now = now;
        self
    }

    /// Set [`thread`](Record::thread).
    pub fn thread(mut self, thread: impl Into<String>) -> Self {
        self.record.thread = thread.into();
        self
    }

    /// Set [`error`](Record::error).
    pub fn error(mut self, error: &'a (dyn std::error::Error + 'static)) -> Self {
        self.record.error = Some(error);
        self
    }

    /// Invoke the builder and return a `Record`.
    pub fn build(self) -> Record<'a> {
        self.record
    }
}

fn current_thread_label() -> String {
    let current = thread::current();
    match current.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", current.id()),
    }
}

/// An enum representing the available severity levels.
///
/// More severe levels compare less: `Level::Fatal < Level::Trace`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Designates errors the application cannot recover from.
    Fatal,
    /// Designates very serious errors.
    Error,
    /// Designates hazardous situations.
    Warn,
    /// Designates useful information.
    Info,
    /// Designates lower priority information.
    Debug,
    /// Designates very low priority, often extremely verbose, information.
    Trace,
}

impl Level {
    /// Return the string representation of the `Level`.
    ///
    /// This returns the same string as the `fmt::Display` implementation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Fatal => "FATAL",
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Level, Self::Err> {
        for (name, level) in [
            ("fatal", Level::Fatal),
            ("error", Level::Error),
            ("warn", Level::Warn),
            ("info", Level::Info),
            ("debug", Level::Debug),
            ("trace", Level::Trace),
        ] {
            if s.eq_ignore_ascii_case(name) {
                return Ok(level);
            }
        }

        Err(Error::new(format!("malformed level: {s:?}")))
    }
}

/// The minimum severity a logger node lets through.
///
/// # Examples
///
/// ```
/// use logroute::record::Level;
/// use logroute::record::LevelFilter;
///
/// let filter = LevelFilter::Warn;
/// assert!(filter.test(Level::Error));
/// assert!(filter.test(Level::Warn));
/// assert!(!filter.test(Level::Info));
/// assert!(!LevelFilter::Off.test(Level::Fatal));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LevelFilter {
    /// Rejects every record.
    Off,
    /// Passes `FATAL` only.
    Fatal,
    /// Passes `ERROR` and more severe.
    Error,
    /// Passes `WARN` and more severe.
    Warn,
    /// Passes `INFO` and more severe.
    Info,
    /// Passes `DEBUG` and more severe.
    Debug,
    /// Passes `TRACE` and more severe.
    Trace,
    /// Passes every record.
    All,
}

impl LevelFilter {
    /// Checks whether a record at `level` passes this threshold.
    pub fn test(&self, level: Level) -> bool {
        match self.level() {
            Some(threshold) => level <= threshold,
            None => *self == LevelFilter::All,
        }
    }

    /// The least severe level that passes, `None` for [`Off`](LevelFilter::Off) and
    /// [`All`](LevelFilter::All).
    pub fn level(&self) -> Option<Level> {
        match self {
            LevelFilter::Off | LevelFilter::All => None,
            LevelFilter::Fatal => Some(Level::Fatal),
            LevelFilter::Error => Some(Level::Error),
            LevelFilter::Warn => Some(Level::Warn),
            LevelFilter::Info => Some(Level::Info),
            LevelFilter::Debug => Some(Level::Debug),
            LevelFilter::Trace => Some(Level::Trace),
        }
    }
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Fatal => LevelFilter::Fatal,
            Level::Error => LevelFilter::Error,
            Level::Warn => LevelFilter::Warn,
            Level::Info => LevelFilter::Info,
            Level::Debug => LevelFilter::Debug,
            Level::Trace => LevelFilter::Trace,
        }
    }
}

impl FromStr for LevelFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<LevelFilter, Self::Err> {
        if s.eq_ignore_ascii_case("off") {
            Ok(LevelFilter::Off)
        } else if s.eq_ignore_ascii_case("all") {
            Ok(LevelFilter::All)
        } else {
            Level::from_str(s).map(LevelFilter::from)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVELS: [Level; 6] = [
        Level::Fatal,
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
        Level::Trace,
    ];

    #[test]
    fn test_level_filter_is_a_threshold() {
        for threshold in LEVELS {
            let filter = LevelFilter::from(threshold);
            for level in LEVELS {
                assert_eq!(filter.test(level), level <= threshold, "{filter:?} {level}");
            }
        }
        assert!(LEVELS.iter().all(|l| LevelFilter::All.test(*l)));
        assert!(LEVELS.iter().all(|l| !LevelFilter::Off.test(*l)));
    }

    #[test]
    fn test_parse_level() {
        assert_eq!("warn".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("DEBUG".parse::<LevelFilter>().unwrap(), LevelFilter::Debug);
        assert_eq!("Off".parse::<LevelFilter>().unwrap(), LevelFilter::Off);
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn test_level_pads_like_a_str() {
        assert_eq!(format!("{:<5}|", Level::Info), "INFO |");
        assert_eq!(format!("{:>5}|", Level::Warn), " WARN|");
    }

    #[test]
    fn test_record_defaults_to_current_thread() {
        let record = std::thread::Builder::new()
            .name("worker-1".to_string())
            .spawn(|| Record::builder().build().thread().to_string())
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(record, "worker-1");
    }
}
