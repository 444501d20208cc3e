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

use std::borrow::Cow;

use crate::Error;
use crate::context::global;
use crate::error::LogError;
use crate::record::Level;
use crate::record::Record;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

#[derive(Debug)]
struct LogCrateLogger {
    trap: DefaultTrap,
}

impl log::Log for LogCrateLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        global().enabled(&logger_name(metadata.target()), level(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        let logger = logger_name(record.target());
        let record = Record::builder()
            .logger(&logger)
            .level(level(record.level()))
            .args(*record.args())
            .build();

        // records emitted before the first configuration are dropped
        if let Err(LogError::Sinks(errors)) = global().dispatch(&record) {
            for err in errors {
                let err = Error::new("failed to write log record")
                    .with_context("sink", err.sink)
                    .with_source(err.error);
                self.trap.trap(&err);
            }
        }
    }

    fn flush(&self) {
        if let Err(LogError::Sinks(errors)) = global().flush() {
            for err in errors {
                let err = Error::new("failed to flush sink")
                    .with_context("sink", err.sink)
                    .with_source(err.error);
                self.trap.trap(&err);
            }
        }
    }
}

// `log` targets are module paths; logger names are dotted.
fn logger_name(target: &str) -> Cow<'_, str> {
    if target.contains("::") {
        Cow::Owned(target.replace("::", "."))
    } else {
        Cow::Borrowed(target)
    }
}

fn level(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::Error,
        log::Level::Warn => Level::Warn,
        log::Level::Info => Level::Info,
        log::Level::Debug => Level::Debug,
        log::Level::Trace => Level::Trace,
    }
}

/// Set up the log crate global logger.
///
/// This function calls [`log::set_logger`] so that every record of the log crate is routed
/// through the [global](crate::global) context. The target `my_app::db` is mapped to the
/// logger name `my_app.db`.
///
/// Records emitted while no configuration is active are dropped. Sink failures are sent to a
/// [`DefaultTrap`].
///
/// This function will set the global maximum log level to `Trace`; thresholds are applied by
/// the active configuration. To override this, call [`log::set_max_level`] after this function.
///
/// # Errors
///
/// Return an error if the log crate global logger has already been set.
pub fn try_setup_log_crate() -> Result<(), log::SetLoggerError> {
    static LOGGER: LogCrateLogger = LogCrateLogger { trap: DefaultTrap {} };
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

/// Set up the log crate global logger.
///
/// See [`try_setup_log_crate`] for the details.
///
/// # Panics
///
/// Panic if the log crate global logger has already been set.
///
/// # Examples
///
/// ```
/// use logroute::config::Configuration;
/// use logroute::logger::LoggerConfig;
/// use logroute::record::LevelFilter;
/// use logroute::sink::Console;
///
/// logroute::bridge::setup_log_crate();
/// let config = Configuration::builder()
///     .sink("stderr", Console::stderr())
///     .logger(LoggerConfig::root(LevelFilter::Info).sink("stderr"))
///     .build()
///     .unwrap();
/// logroute::reconfigure(config);
///
/// log::info!(target: "my_app::db", "connected");
/// ```
pub fn setup_log_crate() {
    try_setup_log_crate().expect(
        "logroute::bridge::setup_log_crate must be called before the log crate global logger initialized",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_name() {
        assert_eq!(logger_name("my_app::db::pool"), "my_app.db.pool");
        assert!(matches!(logger_name("my_app"), Cow::Borrowed("my_app")));
    }

    #[test]
    fn test_level() {
        assert_eq!(level(log::Level::Error), Level::Error);
        assert_eq!(level(log::Level::Trace), Level::Trace);
    }
}
