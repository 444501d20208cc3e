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

//! Traps for errors that have no caller to be returned to.
//!
//! Rotation failures inside a rolling file, failures while closing a replaced configuration and
//! failures of records forwarded from the `log` crate all end up here.

use std::fmt;
use std::io;
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;

use crate::Error;

/// A handler for errors raised outside a caller-visible operation.
pub trait Trap: fmt::Debug + Send + Sync + 'static {
    /// Handle an error.
    fn trap(&self, err: &Error);
}

impl<T: Trap> From<T> for Box<dyn Trap> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// A default trap that sends errors to standard error if possible.
///
/// If standard error is not available, it does nothing.
#[derive(Debug, Default, Clone, Copy)]
#[non_exhaustive]
pub struct DefaultTrap {}

impl Trap for DefaultTrap {
    fn trap(&self, err: &Error) {
        let _ = writeln!(io::stderr(), "{err}");
    }
}

/// A trap that keeps the messages of trapped errors in memory.
///
/// Clones share the same storage.
///
/// # Examples
///
/// ```
/// use logroute::Error;
/// use logroute::trap::CollectingTrap;
/// use logroute::trap::Trap;
///
/// let trap = CollectingTrap::default();
/// trap.trap(&Error::new("disk full"));
/// assert_eq!(trap.messages(), vec!["disk full".to_string()]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct CollectingTrap {
    errors: Arc<Mutex<Vec<String>>>,
}

impl CollectingTrap {
    /// The rendered errors trapped so far.
    pub fn messages(&self) -> Vec<String> {
        self.errors.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Trap for CollectingTrap {
    fn trap(&self, err: &Error) {
        let mut errors = self.errors.lock().unwrap_or_else(|e| e.into_inner());
        errors.push(err.to_string());
    }
}
