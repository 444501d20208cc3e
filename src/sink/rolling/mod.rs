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

//! A sink writing to a file that is rolled over on size or time.
//!
//! # Examples
//!
//! ```
//! use std::num::NonZeroU64;
//!
//! use logroute::layout::PatternLayout;
//! use logroute::sink::RollingFileBuilder;
//!
//! let rolling = RollingFileBuilder::new("logs/app.log", "logs/app-%d{MM-dd-yy-HH-mm-ss}.log")
//!     .layout(PatternLayout::new("%d [%t] %-5level: %msg%n%throwable"))
//!     .rollover_size(NonZeroU64::new(1024).unwrap())
//!     .rollover_daily()
//!     .build();
//! ```

use std::num::NonZeroU64;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::Error;
use crate::Layout;
use crate::Sink;
use crate::config::SinkKind;
use crate::layout::PatternLayout;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

mod clock;
mod file_pattern;
mod rotation;
mod writer;

pub use self::rotation::Rotation;

use self::clock::Clock;
use self::file_pattern::FilePattern;
use self::writer::RollingFileWriter;

/// A builder to configure and create a [`RollingFile`] sink.
#[must_use = "call `build` to construct the sink"]
#[derive(Debug)]
pub struct RollingFileBuilder {
    // required
    path: PathBuf,
    file_pattern: String,

    // has default
    layout: Box<dyn Layout>,
    rotation: Rotation,
    max_size: Option<NonZeroU64>,
    max_archives: Option<NonZeroUsize>,
    trap: Box<dyn Trap>,
}

impl RollingFileBuilder {
    /// Create a new builder.
    ///
    /// `path` is the file currently written to; `file_pattern` is the name a full file is renamed
    /// to. `%d{..}` in the pattern renders the time of the closed period and `%i` a counter.
    pub fn new(path: impl Into<PathBuf>, file_pattern: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file_pattern: file_pattern.into(),
            layout: Box::new(PatternLayout::default()),
            rotation: Rotation::Never,
            max_size: None,
            max_archives: None,
            trap: Box::new(DefaultTrap::default()),
        }
    }

    /// Set the layout for the logs.
    ///
    /// Default to [`PatternLayout::default`].
    pub fn layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Set the trap for errors raised while rolling over.
    ///
    /// Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Set the time-based rotation policy.
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the rotation strategy to roll over log files minutely.
    pub fn rollover_minutely(self) -> Self {
        self.rotation(Rotation::Minutely)
    }

    /// Set the rotation strategy to roll over log files hourly.
    pub fn rollover_hourly(self) -> Self {
        self.rotation(Rotation::Hourly)
    }

    /// Set the rotation strategy to roll over log files daily at 00:00 in the local time zone.
    pub fn rollover_daily(self) -> Self {
        self.rotation(Rotation::Daily)
    }

    /// Roll over once the current file has reached `n` bytes.
    ///
    /// The size is checked before each write, after the time-based check.
    pub fn rollover_size(mut self, n: NonZeroU64) -> Self {
        self.max_size = Some(n);
        self
    }

    /// Keep at most `n` archives created by this sink; older ones are deleted.
    pub fn max_archives(mut self, n: NonZeroUsize) -> Self {
        self.max_archives = Some(n);
        self
    }

    /// Build the [`RollingFile`] sink. No file is touched until the first write.
    pub fn build(self) -> RollingFile {
        self.build_with_clock(Clock::DefaultClock)
    }

    fn build_with_clock(self, clock: Clock) -> RollingFile {
        let RollingFileBuilder {
            path,
            file_pattern,
            layout,
            rotation,
            max_size,
            max_archives,
            trap,
        } = self;

        let writer = RollingFileWriter::new(
            path,
            FilePattern::parse(file_pattern),
            rotation,
            max_size,
            max_archives,
            clock,
            trap,
        );
        RollingFile {
            writer: Mutex::new(writer),
            layout,
        }
    }
}

/// A sink that writes log records to a file rolled over on size or time.
#[derive(Debug)]
pub struct RollingFile {
    writer: Mutex<RollingFileWriter>,
    layout: Box<dyn Layout>,
}

impl RollingFile {
    fn writer(&self) -> MutexGuard<'_, RollingFileWriter> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Sink for RollingFile {
    fn open(&self) -> Result<(), Error> {
        self.writer().open()
    }

    fn write(&self, bytes: &[u8]) -> Result<(), Error> {
        self.writer().write_all(bytes)
    }

    fn flush(&self) -> Result<(), Error> {
        self.writer().flush()
    }

    fn close(&self) -> Result<(), Error> {
        self.writer().close()
    }

    fn layout(&self) -> &dyn Layout {
        self.layout.as_ref()
    }

    fn describe(&self) -> Option<SinkKind> {
        let writer = self.writer();
        Some(SinkKind::RollingFile {
            path: writer.path().to_path_buf(),
            file_pattern: writer.file_pattern().as_str().to_string(),
            max_size: writer.max_size().map(|n| n.to_string()),
            rotation: writer.rotation(),
            max_archives: writer.max_archives().map(NonZeroUsize::get),
        })
    }
}

impl Drop for RollingFile {
    fn drop(&mut self) {
        let writer = self.writer.get_mut().unwrap_or_else(|e| e.into_inner());
        writer.flush_or_trap();
    }
}

/// Parse a human readable size such as `"1KB"`, `"10 MB"` or `"512"` into bytes.
///
/// Units are binary (`1KB` is 1024 bytes) and case-insensitive.
///
/// # Examples
///
/// ```
/// use logroute::sink::rolling::parse_size;
///
/// assert_eq!(parse_size("1KB"), Ok(1024));
/// assert_eq!(parse_size("10 mb"), Ok(10 * 1024 * 1024));
/// assert!(parse_size("ten").is_err());
/// ```
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    if digits.is_empty() {
        return Err(format!("missing number in size {s:?}"));
    }

    let n = digits
        .parse::<u64>()
        .map_err(|err| format!("malformed size {s:?}: {err}"))?;
    let multiplier: u64 = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        unit => return Err(format!("unknown size unit {unit:?} in {s:?}")),
    };

    n.checked_mul(multiplier)
        .ok_or_else(|| format!("size {s:?} is too large"))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::str::FromStr;

    use jiff::Zoned;
    use tempfile::TempDir;

    use super::*;
    use crate::record::Level;
    use crate::record::Record;
    use crate::sink::rolling::clock::ManualClock;
    use crate::trap::CollectingTrap;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1KB"), Ok(1024));
        assert_eq!(parse_size(" 2 M "), Ok(2 * 1024 * 1024));
        assert_eq!(parse_size("512"), Ok(512));
        assert_eq!(parse_size("3gb"), Ok(3 * 1024 * 1024 * 1024));
        assert!(parse_size("KB").is_err());
        assert!(parse_size("1TB").is_err());
        assert!(parse_size("").is_err());
    }

    #[test]
    fn test_append_formats_with_layout() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let pattern = temp_dir.path().join("app-%d{yyyy-MM-dd}.%i.log");
        let start = Zoned::from_str("2024-08-10T12:00:00[UTC]").unwrap();
        let rolling = RollingFileBuilder::new(&path, pattern.to_string_lossy())
            .layout(PatternLayout::new("%-5level %msg%n"))
            .rollover_size(NonZeroU64::new(10).unwrap())
            .build_with_clock(Clock::ManualClock(ManualClock::new(start)));

        assert!(!path.exists());
        for _ in 0..2 {
            let record = Record::builder()
                .level(Level::Info)
                .args(format_args!("started"))
                .build();
            rolling.append(&record).unwrap();
        }

        let archive = temp_dir.path().join("app-2024-08-10.1.log");
        assert_eq!(fs::read_to_string(archive).unwrap(), "INFO  started\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "INFO  started\n");
    }

    #[test]
    fn test_drop_flushes_without_trapping() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let trap = CollectingTrap::default();
        let rolling = RollingFileBuilder::new(&path, "app-%i.log")
            .layout(PatternLayout::new("%msg"))
            .trap(trap.clone())
            .build();
        rolling
            .append(&Record::builder().args(format_args!("kept")).build())
            .unwrap();

        drop(rolling);
        assert_eq!(fs::read_to_string(&path).unwrap(), "kept");
        assert!(trap.messages().is_empty());
    }

    #[test]
    fn test_describe() {
        let rolling = RollingFileBuilder::new("logs/app.log", "logs/app-%i.log")
            .rollover_hourly()
            .rollover_size(NonZeroU64::new(1024).unwrap())
            .max_archives(NonZeroUsize::new(7).unwrap())
            .build();
        let Some(SinkKind::RollingFile {
            path,
            file_pattern,
            max_size,
            rotation,
            max_archives,
        }) = rolling.describe()
        else {
            panic!("unexpected description");
        };
        assert_eq!(path, PathBuf::from("logs/app.log"));
        assert_eq!(file_pattern, "logs/app-%i.log");
        assert_eq!(max_size.as_deref(), Some("1024"));
        assert_eq!(rotation, Rotation::Hourly);
        assert_eq!(max_archives, Some(7));
    }
}
