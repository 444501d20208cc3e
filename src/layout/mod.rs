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

//! Layouts for formatting log records.

use std::fmt;

use jiff::tz::TimeZone;

use crate::record::Record;

pub(crate) mod date;
mod pattern;

pub use self::pattern::DEFAULT_PATTERN;
pub use self::pattern::PatternLayout;

/// A layout for formatting log records.
///
/// Formatting is infallible and side-effect-free.
pub trait Layout: fmt::Debug + Send + Sync + 'static {
    /// Formats a log record.
    fn format(&self, record: &Record) -> Vec<u8>;

    /// The conversion pattern behind this layout, if it has one.
    ///
    /// Only layouts with a pattern can be described by a [`ConfigSpec`](crate::config::ConfigSpec).
    fn pattern(&self) -> Option<&str> {
        None
    }

    /// The time zone timestamps are rendered in, if one was set. `None` means the system zone.
    fn timezone(&self) -> Option<&TimeZone> {
        None
    }
}

impl<T: Layout> From<T> for Box<dyn Layout> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}
