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

use std::io;
use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Layout;
use crate::Sink;
use crate::config::SinkKind;
use crate::layout::PatternLayout;

/// The standard stream a [`Console`] sink writes to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleTarget {
    /// Standard output.
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
}

/// A sink that writes log records to standard output or standard error.
///
/// # Examples
///
/// ```
/// use logroute::layout::PatternLayout;
/// use logroute::sink::Console;
///
/// let console = Console::stderr().with_layout(PatternLayout::new("%-5level %msg%n"));
/// ```
#[derive(Debug)]
pub struct Console {
    target: ConsoleTarget,
    layout: Box<dyn Layout>,
    closed: AtomicBool,
}

impl Console {
    /// Create a console sink for the given stream with the default [`PatternLayout`].
    pub fn new(target: ConsoleTarget) -> Self {
        Self {
            target,
            layout: Box::new(PatternLayout::default()),
            closed: AtomicBool::new(false),
        }
    }

    /// A console sink writing to standard output.
    pub fn stdout() -> Self {
        Self::new(ConsoleTarget::Stdout)
    }

    /// A console sink writing to standard error.
    pub fn stderr() -> Self {
        Self::new(ConsoleTarget::Stderr)
    }

    /// Set the layout.
    ///
    /// Default to [`PatternLayout::default`].
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// The stream this sink writes to.
    pub fn target(&self) -> ConsoleTarget {
        self.target
    }
}

impl Sink for Console {
    fn write(&self, bytes: &[u8]) -> Result<(), Error> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::new("console sink is closed")
                .with_context("target", format!("{:?}", self.target)));
        }
        let result = match self.target {
            ConsoleTarget::Stdout => io::stdout().lock().write_all(bytes),
            ConsoleTarget::Stderr => io::stderr().lock().write_all(bytes),
        };
        result.map_err(Error::from_io_error)
    }

    fn flush(&self) -> Result<(), Error> {
        let result = match self.target {
            ConsoleTarget::Stdout => io::stdout().flush(),
            ConsoleTarget::Stderr => io::stderr().flush(),
        };
        result.map_err(Error::from_io_error)
    }

    // the standard streams stay open for the rest of the process
    fn close(&self) -> Result<(), Error> {
        self.closed.store(true, Ordering::Release);
        self.flush()
    }

    fn layout(&self) -> &dyn Layout {
        self.layout.as_ref()
    }

    fn describe(&self) -> Option<SinkKind> {
        Some(SinkKind::Console {
            target: self.target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_after_close_fails() {
        let console = Console::stderr().with_layout(PatternLayout::new("%msg"));
        console.write(b"").unwrap();
        console.close().unwrap();

        let err = console.write(b"late\n").unwrap_err();
        assert_eq!(err.message(), "console sink is closed");
        // closing twice is harmless
        console.close().unwrap();
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            Console::stderr().describe(),
            Some(SinkKind::Console {
                target: ConsoleTarget::Stderr
            })
        );
    }
}
