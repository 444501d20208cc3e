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

//! Output destinations for formatted log records.
//!
//! A sink owns its layout and its underlying resource. Every sink serializes its own writers, so
//! a slow sink only delays the records routed through it.

use std::fmt;

use crate::Error;
use crate::Layout;
use crate::config::SinkKind;
use crate::record::Record;

mod capture;
mod console;
mod file;
pub mod rolling;

pub use self::capture::Capture;
pub use self::console::Console;
pub use self::console::ConsoleTarget;
pub use self::file::File;
pub use self::rolling::RollingFile;
pub use self::rolling::RollingFileBuilder;
pub use self::rolling::Rotation;

/// An output destination for formatted log records.
pub trait Sink: fmt::Debug + Send + Sync + 'static {
    /// Acquire the underlying resource.
    ///
    /// Idempotent. Sinks open themselves on first write, so calling this is only needed to
    /// surface open errors early.
    fn open(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Write already formatted bytes.
    fn write(&self, bytes: &[u8]) -> Result<(), Error>;

    /// Flush any buffered bytes.
    ///
    /// Default to a no-op.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Release the underlying resource. Writes after close fail.
    ///
    /// Default to [`flush`](Sink::flush).
    fn close(&self) -> Result<(), Error> {
        self.flush()
    }

    /// The layout records are formatted with before being written.
    fn layout(&self) -> &dyn Layout;

    /// Describe this sink's kind and attributes, if it is one of the built-in kinds.
    fn describe(&self) -> Option<SinkKind> {
        None
    }

    /// Format a record with this sink's layout and write it.
    fn append(&self, record: &Record) -> Result<(), Error> {
        let bytes = self.layout().format(record);
        self.write(&bytes)
    }
}

impl<T: Sink> From<T> for Box<dyn Sink> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}
