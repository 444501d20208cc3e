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
use std::ffi::OsString;
use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::num::NonZeroU64;
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;

use jiff::Timestamp;
use jiff::Zoned;

use crate::Error;
use crate::sink::rolling::clock::Clock;
use crate::sink::rolling::file_pattern::FilePattern;
use crate::sink::rolling::rotation::Rotation;
use crate::trap::Trap;

/// A writer for rolling files.
///
/// The current file always lives at `path`. On roll over it is renamed after `file_pattern` and a
/// fresh file is created in its place.
#[derive(Debug)]
pub(crate) struct RollingFileWriter {
    path: PathBuf,
    file_pattern: FilePattern,
    rotation: Rotation,
    max_size: Option<NonZeroU64>,
    max_archives: Option<NonZeroUsize>,
    clock: Clock,
    trap: Box<dyn Trap>,

    state: State,
    // archives created by this writer, oldest first
    archives: VecDeque<PathBuf>,
    // `%i` keeps counting up within one period
    period_key: Option<String>,
    next_index: usize,
}

#[derive(Debug)]
enum State {
    Idle,
    Open(Current),
    Closed,
}

#[derive(Debug)]
struct Current {
    file: File,
    size: u64,
    last_write: Zoned,
    next_rollover: Option<Timestamp>,
}

impl RollingFileWriter {
    pub(crate) fn new(
        path: PathBuf,
        file_pattern: FilePattern,
        rotation: Rotation,
        max_size: Option<NonZeroU64>,
        max_archives: Option<NonZeroUsize>,
        clock: Clock,
        trap: Box<dyn Trap>,
    ) -> Self {
        Self {
            path,
            file_pattern,
            rotation,
            max_size,
            max_archives,
            clock,
            trap,
            state: State::Idle,
            archives: VecDeque::new(),
            period_key: None,
            next_index: 1,
        }
    }

    pub(crate) fn open(&mut self) -> Result<(), Error> {
        match self.state {
            State::Open(_) => return Ok(()),
            State::Closed => return Err(closed_error(&self.path)),
            State::Idle => {}
        }

        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|err| {
                    Error::new("failed to create log directory")
                        .with_context("path", dir.display())
                        .with_source(err)
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| {
                Error::new("failed to open current log")
                    .with_context("path", self.path.display())
                    .with_source(err)
            })?;
        let metadata = file.metadata().map_err(Error::from_io_error)?;

        let now = self.clock.now();
        let mut last_write = now.clone();
        if metadata.len() > 0 {
            // continue the period the existing content was written in
            if let Some(mtime) = metadata
                .modified()
                .ok()
                .and_then(|mtime| Timestamp::try_from(mtime).ok())
            {
                last_write = mtime.to_zoned(now.time_zone().clone());
            }
        }

        self.state = State::Open(Current {
            file,
            size: metadata.len(),
            next_rollover: self.rotation.next_rollover(&last_write),
            last_write,
        });
        Ok(())
    }

    pub(crate) fn write_all(&mut self, buf: &[u8]) -> Result<(), Error> {
        self.open()?;
        let now = self.clock.now();

        let (time_due, size_due, last_write) = match &self.state {
            State::Open(current) => (
                current
                    .next_rollover
                    .is_some_and(|ts| now.timestamp() >= ts),
                self.max_size.is_some_and(|n| current.size >= n.get()),
                current.last_write.clone(),
            ),
            _ => return Err(closed_error(&self.path)),
        };

        if time_due {
            self.roll(&last_write);
        } else if size_due {
            self.roll(&now);
        }
        // a failed roll over may have left no file open
        self.open()?;

        let State::Open(current) = &mut self.state else {
            return Err(closed_error(&self.path));
        };
        if time_due {
            current.next_rollover = self.rotation.next_rollover(&now);
        }
        current.file.write_all(buf).map_err(|err| {
            Error::new("failed to write log file")
                .with_context("path", self.path.display())
                .with_source(err)
        })?;
        current.size += buf.len() as u64;
        current.last_write = now;
        Ok(())
    }

    pub(crate) fn flush(&mut self) -> Result<(), Error> {
        match &mut self.state {
            State::Open(current) => current.file.flush().map_err(Error::from_io_error),
            _ => Ok(()),
        }
    }

    pub(crate) fn flush_or_trap(&mut self) {
        if let Err(err) = self.flush() {
            let err = Error::new("failed to flush rolling file")
                .with_context("path", self.path.display())
                .with_source(err);
            self.trap.trap(&err);
        }
    }

    pub(crate) fn close(&mut self) -> Result<(), Error> {
        let previous = std::mem::replace(&mut self.state, State::Closed);
        if let State::Open(mut current) = previous {
            current.file.flush().map_err(Error::from_io_error)?;
        }
        Ok(())
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn file_pattern(&self) -> &FilePattern {
        &self.file_pattern
    }

    pub(crate) fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub(crate) fn max_size(&self) -> Option<NonZeroU64> {
        self.max_size
    }

    pub(crate) fn max_archives(&self) -> Option<NonZeroUsize> {
        self.max_archives
    }

    fn roll(&mut self, period: &Zoned) {
        if let State::Open(current) = &mut self.state {
            current.size = 0;
        }

        if let Err(err) = self.try_roll(period) {
            let err = Error::new("failed to roll over log file").with_source(err);
            self.trap.trap(&err);
        }
    }

    fn try_roll(&mut self, period: &Zoned) -> Result<(), Error> {
        let State::Open(current) = &mut self.state else {
            return Ok(());
        };
        current.file.flush().map_err(Error::from_io_error)?;

        let archive = self.archive_path(period);
        fs::rename(&self.path, &archive).map_err(|err| {
            Error::new("failed to archive log")
                .with_context("from", self.path.display())
                .with_context("to", archive.display())
                .with_source(err)
        })?;

        let file = match create_file(&self.path) {
            Ok(file) => file,
            Err(err) => {
                self.restore_archive(&archive);
                return Err(err);
            }
        };
        if let State::Open(current) = &mut self.state {
            current.file = file;
        }

        if self.max_archives.is_some() {
            self.archives.push_back(archive);
            self.delete_oldest_archives();
        }
        Ok(())
    }

    // The open handle follows the archived file. Move it back to `path`, or drop the handle so
    // the next write reopens `path`.
    fn restore_archive(&mut self, archive: &Path) {
        if let Err(err) = fs::rename(archive, &self.path) {
            let err = Error::new("failed to restore log file")
                .with_context("from", archive.display())
                .with_context("to", self.path.display())
                .with_source(err);
            self.trap.trap(&err);
            self.state = State::Idle;
        }
    }

    fn archive_path(&mut self, period: &Zoned) -> PathBuf {
        let indexed = self.file_pattern.has_index();
        let key = self.file_pattern.render(period, 0);
        if self.period_key.as_ref() != Some(&key) {
            self.period_key = Some(key);
            self.next_index = 1;
        }

        let mut index = if indexed { self.next_index } else { 1 };
        loop {
            let mut candidate = OsString::from(self.file_pattern.render(period, index));
            if !indexed && index > 1 {
                candidate.push(format!(".{}", index - 1));
            }

            let candidate = PathBuf::from(candidate);
            if !candidate.exists() {
                if indexed {
                    self.next_index = index + 1;
                }
                return candidate;
            }
            index += 1;
        }
    }

    fn delete_oldest_archives(&mut self) {
        let Some(max_archives) = self.max_archives else {
            return;
        };

        while self.archives.len() > max_archives.get() {
            let Some(oldest) = self.archives.pop_front() else {
                break;
            };
            if let Err(err) = fs::remove_file(&oldest) {
                if err.kind() != io::ErrorKind::NotFound {
                    let err = Error::new("failed to remove old log")
                        .with_context("path", oldest.display())
                        .with_source(err);
                    self.trap.trap(&err);
                }
            }
        }
    }
}

fn create_file(path: &Path) -> Result<File, Error> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|err| {
            Error::new("failed to create log file")
                .with_context("path", path.display())
                .with_source(err)
        })
}

fn closed_error(path: &Path) -> Error {
    Error::new("rolling file is closed").with_context("path", path.display())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use jiff::Span;
    use rand::Rng;
    use rand::distr::Alphanumeric;
    use tempfile::TempDir;

    use super::*;
    use crate::sink::rolling::clock::ManualClock;
    use crate::trap::CollectingTrap;

    fn writer(
        dir: &Path,
        pattern: &str,
        rotation: Rotation,
        max_size: Option<u64>,
        max_archives: Option<usize>,
        clock: Clock,
    ) -> RollingFileWriter {
        RollingFileWriter::new(
            dir.join("app.log"),
            FilePattern::parse(dir.join(pattern).to_string_lossy()),
            rotation,
            max_size.and_then(NonZeroU64::new),
            max_archives.and_then(NonZeroUsize::new),
            clock,
            Box::new(CollectingTrap::default()),
        )
    }

    fn count_files(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    fn generate_random_string() -> String {
        let mut rng = rand::rng();
        let len = rng.random_range(50..=100);
        std::iter::repeat(())
            .map(|()| rng.sample(Alphanumeric))
            .map(char::from)
            .take(len)
            .collect()
    }

    #[test]
    fn test_file_rolling_via_file_size() {
        let temp_dir = TempDir::new().unwrap();
        let max_size = 1000;
        let mut writer = writer(
            temp_dir.path(),
            "app.%i.log",
            Rotation::Never,
            Some(max_size),
            None,
            Clock::DefaultClock,
        );

        for i in 1..=5 {
            let mut expected = 0;
            while expected < max_size {
                let payload = generate_random_string();
                expected += payload.len() as u64;
                writer.write_all(payload.as_bytes()).unwrap();
            }
            // the rollover happens on the next write
            assert_eq!(count_files(temp_dir.path()), i);
        }

        writer.write_all(b"tail").unwrap();
        assert_eq!(count_files(temp_dir.path()), 6);
        for i in 1..=5 {
            let archive = temp_dir.path().join(format!("app.{i}.log"));
            let len = fs::metadata(&archive).unwrap().len();
            assert!(len >= max_size, "{} is {len} bytes", archive.display());
        }
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("app.log")).unwrap(),
            "tail"
        );
        // nothing to prune, so nothing is remembered
        assert!(writer.archives.is_empty());
    }

    #[test]
    fn test_file_rolling_via_time_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let start = Zoned::from_str("2024-08-10T00:00:00[UTC]").unwrap();
        let mut writer = writer(
            temp_dir.path(),
            "app-%d{yyyy-MM-dd-HH-mm}.log",
            Rotation::Minutely,
            None,
            None,
            Clock::ManualClock(ManualClock::new(start)),
        );

        for _ in 0..3 * 6 {
            writer.write_all(b"entry\n").unwrap();
            writer.clock.advance(Span::new().seconds(10));
        }
        writer.write_all(b"last\n").unwrap();

        for minute in ["00-00", "00-01", "00-02"] {
            let archive = temp_dir.path().join(format!("app-2024-08-10-{minute}.log"));
            assert_eq!(fs::read_to_string(&archive).unwrap(), "entry\n".repeat(6));
        }
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("app.log")).unwrap(),
            "last\n"
        );
    }

    #[test]
    fn test_name_collisions_get_a_suffix() {
        let temp_dir = TempDir::new().unwrap();
        let start = Zoned::from_str("2024-08-10T00:00:00[UTC]").unwrap();
        let mut writer = writer(
            temp_dir.path(),
            "app-%d{yyyy-MM-dd}.log",
            Rotation::Never,
            Some(4),
            None,
            Clock::ManualClock(ManualClock::new(start)),
        );

        for payload in ["aaaa", "bbbb", "cccc", "dddd"] {
            writer.write_all(payload.as_bytes()).unwrap();
        }

        let dir = temp_dir.path();
        assert_eq!(fs::read_to_string(dir.join("app-2024-08-10.log")).unwrap(), "aaaa");
        assert_eq!(fs::read_to_string(dir.join("app-2024-08-10.log.1")).unwrap(), "bbbb");
        assert_eq!(fs::read_to_string(dir.join("app-2024-08-10.log.2")).unwrap(), "cccc");
        assert_eq!(fs::read_to_string(dir.join("app.log")).unwrap(), "dddd");
    }

    #[test]
    fn test_max_archives() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = writer(
            temp_dir.path(),
            "app.%i.log",
            Rotation::Never,
            Some(10),
            Some(2),
            Clock::DefaultClock,
        );

        for _ in 0..6 {
            writer.write_all(b"0123456789").unwrap();
        }

        let dir = temp_dir.path();
        assert_eq!(count_files(dir), 3);
        assert!(!dir.join("app.1.log").exists());
        assert!(!dir.join("app.2.log").exists());
        assert!(!dir.join("app.3.log").exists());
        assert!(dir.join("app.4.log").exists());
        assert!(dir.join("app.5.log").exists());
        assert_eq!(writer.archives.len(), 2);
    }

    #[test]
    fn test_existing_file_size_counts() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("app.log"), "0123456789").unwrap();
        let mut writer = writer(
            temp_dir.path(),
            "app.%i.log",
            Rotation::Never,
            Some(10),
            None,
            Clock::DefaultClock,
        );

        writer.write_all(b"new").unwrap();
        let dir = temp_dir.path();
        assert_eq!(fs::read_to_string(dir.join("app.1.log")).unwrap(), "0123456789");
        assert_eq!(fs::read_to_string(dir.join("app.log")).unwrap(), "new");
    }

    #[test]
    fn test_failed_rollover_keeps_writing() {
        let temp_dir = TempDir::new().unwrap();
        let trap = CollectingTrap::default();
        let mut writer = RollingFileWriter::new(
            temp_dir.path().join("app.log"),
            // the archive directory does not exist, so the rename fails
            FilePattern::parse(temp_dir.path().join("missing/app.%i.log").to_string_lossy()),
            Rotation::Never,
            NonZeroU64::new(4),
            None,
            Clock::DefaultClock,
            Box::new(trap.clone()),
        );

        writer.write_all(b"aaaa").unwrap();
        writer.write_all(b"bbbb").unwrap();

        assert_eq!(
            fs::read_to_string(temp_dir.path().join("app.log")).unwrap(),
            "aaaabbbb"
        );
        let messages = trap.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("failed to roll over log file"));
    }

    fn trapped_writer(dir: &Path, trap: &CollectingTrap) -> RollingFileWriter {
        RollingFileWriter::new(
            dir.join("app.log"),
            FilePattern::parse(dir.join("app.%i.log").to_string_lossy()),
            Rotation::Never,
            None,
            None,
            Clock::DefaultClock,
            Box::new(trap.clone()),
        )
    }

    #[test]
    fn test_failed_reopen_moves_the_archive_back() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let trap = CollectingTrap::default();
        let mut writer = trapped_writer(dir, &trap);
        writer.write_all(b"aaaa").unwrap();

        // the current file was archived but no new file could be created
        let archive = dir.join("app.1.log");
        fs::rename(dir.join("app.log"), &archive).unwrap();
        writer.restore_archive(&archive);

        writer.write_all(b"bbbb").unwrap();
        assert_eq!(fs::read_to_string(dir.join("app.log")).unwrap(), "aaaabbbb");
        assert!(!archive.exists());
        assert!(trap.messages().is_empty());
    }

    #[test]
    fn test_failed_restore_reopens_the_current_file() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let trap = CollectingTrap::default();
        let mut writer = trapped_writer(dir, &trap);
        writer.write_all(b"aaaa").unwrap();

        let archive = dir.join("app.1.log");
        fs::rename(dir.join("app.log"), &archive).unwrap();
        fs::remove_file(&archive).unwrap();
        writer.restore_archive(&archive);

        writer.write_all(b"bbbb").unwrap();
        assert_eq!(fs::read_to_string(dir.join("app.log")).unwrap(), "bbbb");
        let messages = trap.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("failed to restore log file"));
    }

    #[test]
    fn test_closed_writer_rejects_writes() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = writer(
            temp_dir.path(),
            "app.%i.log",
            Rotation::Never,
            None,
            None,
            Clock::DefaultClock,
        );
        writer.write_all(b"x").unwrap();
        writer.close().unwrap();
        assert!(writer.write_all(b"y").is_err());
        assert!(writer.open().is_err());
    }
}
