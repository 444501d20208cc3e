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
use std::sync::Arc;
use std::sync::LazyLock;

use arc_swap::ArcSwapOption;

use crate::config::Configuration;
use crate::error::LogError;
use crate::record::Level;
use crate::record::Record;

/// Holds the active [`Configuration`] and swaps it atomically.
///
/// Every dispatch observes exactly one configuration from start to end. A replaced
/// configuration is dropped, and its sinks closed, once the last dispatch still using it and
/// every [`Arc`] returned by [`reconfigure`](LoggerContext::reconfigure) or
/// [`active`](LoggerContext::active) is gone.
///
/// # Examples
///
/// ```
/// use logroute::LoggerContext;
/// use logroute::config::Configuration;
/// use logroute::logger::LoggerConfig;
/// use logroute::record::Level;
/// use logroute::record::LevelFilter;
/// use logroute::sink::Capture;
///
/// let context = LoggerContext::new();
/// assert!(context.log("app", Level::Info, format_args!("dropped")).is_err());
///
/// let capture = Capture::default();
/// let config = Configuration::builder()
///     .sink("capture", capture.clone())
///     .logger(LoggerConfig::root(LevelFilter::Info).sink("capture"))
///     .build()
///     .unwrap();
/// context.reconfigure(config);
///
/// context.log("app", Level::Info, format_args!("started")).unwrap();
/// assert_eq!(capture.entries(), vec!["INFO  app: started"]);
/// ```
#[derive(Default)]
pub struct LoggerContext {
    active: ArcSwapOption<Configuration>,
}

impl fmt::Debug for LoggerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerContext")
            .field("active", &self.active.load())
            .finish()
    }
}

impl LoggerContext {
    /// Create an unconfigured context.
    pub fn new() -> Self {
        LoggerContext {
            active: ArcSwapOption::empty(),
        }
    }

    /// Create a context with `config` active.
    pub fn with_configuration(config: Configuration) -> Self {
        LoggerContext {
            active: ArcSwapOption::new(Some(Arc::new(config))),
        }
    }

    /// Make `config` the active configuration and return the one it replaces.
    ///
    /// Dispatches already running finish against the configuration they started with.
    pub fn reconfigure(&self, config: Configuration) -> Option<Arc<Configuration>> {
        self.active.swap(Some(Arc::new(config)))
    }

    /// Deactivate the current configuration and return it. Later logs fail as unresolved.
    pub fn shutdown(&self) -> Option<Arc<Configuration>> {
        self.active.swap(None)
    }

    /// The active configuration, if any.
    pub fn active(&self) -> Option<Arc<Configuration>> {
        self.active.load_full()
    }

    pub fn is_configured(&self) -> bool {
        self.active.load().is_some()
    }

    /// Whether a record at `level` emitted to `logger` would pass its resolved node.
    pub fn enabled(&self, logger: &str, level: Level) -> bool {
        match self.active.load().as_deref() {
            Some(config) => config.enabled(logger, level),
            None => false,
        }
    }

    /// Emit a message to the logger named `logger`.
    pub fn log(&self, logger: &str, level: Level, args: fmt::Arguments) -> Result<(), LogError> {
        let record = Record::builder()
            .logger(logger)
            .level(level)
            .args(args)
            .build();
        self.dispatch(&record)
    }

    /// Emit a message with an attached error to the logger named `logger`.
    pub fn log_with_error(
        &self,
        logger: &str,
        level: Level,
        error: &(dyn std::error::Error + 'static),
        args: fmt::Arguments,
    ) -> Result<(), LogError> {
        let record = Record::builder()
            .logger(logger)
            .level(level)
            .error(error)
            .args(args)
            .build();
        self.dispatch(&record)
    }

    /// Route `record` through the active configuration.
    pub fn dispatch(&self, record: &Record) -> Result<(), LogError> {
        match self.active.load().as_deref() {
            Some(config) => config.dispatch(record),
            None => Err(LogError::Unresolved {
                logger: record.logger().to_string(),
            }),
        }
    }

    /// Flush every sink of the active configuration.
    pub fn flush(&self) -> Result<(), LogError> {
        match self.active.load().as_deref() {
            Some(config) => config.flush(),
            None => Ok(()),
        }
    }
}

static CONTEXT: LazyLock<LoggerContext> = LazyLock::new(LoggerContext::new);

/// The process-wide context used by the free functions of this crate and by the `log` bridge.
pub fn global() -> &'static LoggerContext {
    &CONTEXT
}

/// Make `config` the active configuration of the [global](global) context.
///
/// The replaced configuration is returned; its sinks are closed once it is dropped.
pub fn reconfigure(config: Configuration) -> Option<Arc<Configuration>> {
    global().reconfigure(config)
}

/// Deactivate the configuration of the [global](global) context and return it.
pub fn shutdown() -> Option<Arc<Configuration>> {
    global().shutdown()
}

/// The active configuration of the [global](global) context.
pub fn active() -> Option<Arc<Configuration>> {
    global().active()
}

/// Emit a message through the [global](global) context.
pub fn log(logger: &str, level: Level, args: fmt::Arguments) -> Result<(), LogError> {
    global().log(logger, level, args)
}

/// Flush every sink of the [global](global) context.
pub fn flush() -> Result<(), LogError> {
    global().flush()
}
