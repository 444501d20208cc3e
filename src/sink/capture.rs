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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::Error;
use crate::Layout;
use crate::Sink;
use crate::layout::PatternLayout;

#[derive(Debug, Default)]
struct Buffer {
    entries: Vec<String>,
    closed: bool,
}

/// A sink that keeps formatted records in memory.
///
/// Clones share the same buffer, so a clone kept outside a configuration observes everything
/// written through it.
///
/// # Examples
///
/// ```
/// use logroute::Sink;
/// use logroute::layout::PatternLayout;
/// use logroute::sink::Capture;
///
/// let capture = Capture::default().with_layout(PatternLayout::new("%msg"));
/// capture.write(b"hello").unwrap();
/// assert_eq!(capture.entries(), vec!["hello".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct Capture {
    layout: Arc<dyn Layout>,
    buffer: Arc<Mutex<Buffer>>,
}

impl Default for Capture {
    fn default() -> Self {
        Self {
            layout: Arc::new(PatternLayout::new("%-5level %logger: %msg")),
            buffer: Arc::default(),
        }
    }
}

impl Capture {
    /// Set the layout.
    ///
    /// Default to `%-5level %logger: %msg`.
    pub fn with_layout(mut self, layout: impl Layout) -> Self {
        self.layout = Arc::new(layout);
        self
    }

    /// Every entry written so far, one per write.
    pub fn entries(&self) -> Vec<String> {
        self.buffer().entries.clone()
    }

    /// Drain every entry written so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut self.buffer().entries)
    }

    /// Whether [`close`](Sink::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.buffer().closed
    }

    fn buffer(&self) -> MutexGuard<'_, Buffer> {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Sink for Capture {
    fn write(&self, bytes: &[u8]) -> Result<(), Error> {
        let mut buffer = self.buffer();
        if buffer.closed {
            return Err(Error::new("capture sink is closed"));
        }
        buffer
            .entries
            .push(String::from_utf8_lossy(bytes).into_owned());
        Ok(())
    }

    fn close(&self) -> Result<(), Error> {
        self.buffer().closed = true;
        Ok(())
    }

    fn layout(&self) -> &dyn Layout {
        self.layout.as_ref()
    }
}
