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

use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::Error;
use crate::Layout;
use crate::Sink;
use crate::config::SinkKind;
use crate::layout::PatternLayout;

#[derive(Debug)]
enum State {
    Idle,
    Open(fs::File),
    Closed,
}

/// A sink that appends log records to a single file.
///
/// The file, and any missing parent directory, is created on first write.
///
/// # Examples
///
/// ```
/// use logroute::layout::PatternLayout;
/// use logroute::sink::File;
///
/// let file = File::new("target/logging.log").with_layout(PatternLayout::new("%d %msg%n"));
/// ```
#[derive(Debug)]
pub struct File {
    path: PathBuf,
    append: bool,
    layout: Box<dyn Layout>,
    state: Mutex<State>,
}

impl File {
    /// Create a file sink writing to `path` with the default [`PatternLayout`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append: true,
            layout: Box::new(PatternLayout::default()),
            state: Mutex::new(State::Idle),
        }
    }

    /// Whether to keep the existing content of the file when it is opened.
    ///
    /// Default to `true`. With `false`, the file is truncated once when the sink opens it.
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Set the layout.
    ///
    /// Default to [`PatternLayout::default`].
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// The path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn open_file(&self) -> Result<fs::File, Error> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|err| {
                    Error::new("failed to create log directory")
                        .with_context("path", dir.display())
                        .with_source(err)
                })?;
            }
        }

        let mut options = OpenOptions::new();
        if self.append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        options.create(true).open(&self.path).map_err(|err| {
            Error::new("failed to open log file")
                .with_context("path", self.path.display())
                .with_source(err)
        })
    }

    fn with_file<F>(&self, state: &mut State, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut fs::File) -> std::io::Result<()>,
    {
        if let State::Idle = state {
            *state = State::Open(self.open_file()?);
        }

        match state {
            State::Open(file) => f(file).map_err(|err| {
                Error::new("failed to write log file")
                    .with_context("path", self.path.display())
                    .with_source(err)
            }),
            _ => Err(Error::new("log file is closed").with_context("path", self.path.display())),
        }
    }
}

impl Sink for File {
    fn open(&self) -> Result<(), Error> {
        let mut state = self.state();
        self.with_file(&mut state, |_| Ok(()))
    }

    fn write(&self, bytes: &[u8]) -> Result<(), Error> {
        let mut state = self.state();
        self.with_file(&mut state, |file| file.write_all(bytes))
    }

    fn flush(&self) -> Result<(), Error> {
        match &mut *self.state() {
            State::Open(file) => file.flush().map_err(Error::from_io_error),
            _ => Ok(()),
        }
    }

    fn close(&self) -> Result<(), Error> {
        let mut state = self.state();
        let previous = std::mem::replace(&mut *state, State::Closed);
        if let State::Open(mut file) = previous {
            file.flush().map_err(Error::from_io_error)?;
        }
        Ok(())
    }

    fn layout(&self) -> &dyn Layout {
        self.layout.as_ref()
    }

    fn describe(&self) -> Option<SinkKind> {
        Some(SinkKind::File {
            path: self.path.clone(),
            append: self.append,
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_file_is_created_on_first_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("app.log");
        let file = File::new(&path);
        assert!(!path.exists());

        file.write(b"first\n").unwrap();
        file.write(b"second\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_truncate_on_open_only() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        fs::write(&path, "stale\n").unwrap();

        let file = File::new(&path).append(false);
        file.open().unwrap();
        file.open().unwrap();
        file.write(b"fresh\n").unwrap();
        file.write(b"more\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\nmore\n");
    }

    #[test]
    fn test_write_after_close_fails() {
        let temp_dir = TempDir::new().unwrap();
        let file = File::new(temp_dir.path().join("app.log"));
        file.write(b"line\n").unwrap();
        file.close().unwrap();
        file.close().unwrap();

        let err = file.write(b"late\n").unwrap_err();
        assert_eq!(err.message(), "log file is closed");
    }

    #[test]
    fn test_open_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        // a directory cannot be opened as a log file
        let file = File::new(temp_dir.path());
        let err = file.write(b"line\n").unwrap_err();
        assert_eq!(err.message(), "failed to open log file");
    }
}
