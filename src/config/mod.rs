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

//! Validated, immutable logging configurations.
//!
//! A [`Configuration`] owns its sinks and its logger registry. It is built once by a
//! [`ConfigurationBuilder`] and never changes afterwards; reconfiguring means building a new
//! one and swapping it in through a [`LoggerContext`](crate::LoggerContext). Sinks are closed
//! when the configuration is dropped.

use std::fmt;

use crate::Error;
use crate::Layout;
use crate::Sink;
use crate::error::ConfigError;
use crate::error::LogError;
use crate::error::SinkError;
use crate::layout::date::timezone_name;
use crate::logger::Registry;
use crate::record::Level;
use crate::record::Record;
use crate::trap::Trap;

mod builder;
mod spec;

pub use self::builder::ConfigurationBuilder;
pub use self::spec::ConfigSpec;
pub use self::spec::LoggerSpec;
pub use self::spec::SinkKind;
pub use self::spec::SinkSpec;
pub use crate::logger::LoggerConfig;

#[derive(Debug)]
pub(crate) struct NamedSink {
    pub(crate) name: String,
    pub(crate) sink: Box<dyn Sink>,
}

/// A validated set of sinks and logger nodes.
pub struct Configuration {
    name: Option<String>,
    sinks: Vec<NamedSink>,
    registry: Registry,
    trap: Box<dyn Trap>,
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("name", &self.name)
            .field("sinks", &self.sinks)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Configuration {
    /// Returns a new builder.
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// The name given by [`ConfigurationBuilder::name`].
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The logger nodes of this configuration.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The sink registered under `name`.
    pub fn sink(&self, name: &str) -> Option<&dyn Sink> {
        self.sinks
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.sink.as_ref())
    }

    /// The names of every sink, in registration order.
    pub fn sink_names(&self) -> impl Iterator<Item = &str> {
        self.sinks.iter().map(|s| s.name.as_str())
    }

    /// Whether a record at `level` emitted to `logger` passes its resolved node.
    pub fn enabled(&self, logger: &str, level: Level) -> bool {
        self.registry.resolve(logger).level().test(level)
    }

    /// Route `record` to the sinks of its logger node and of the additive ancestors it passes.
    ///
    /// A node whose threshold rejects the record ends the walk. Every selected sink is tried
    /// even if an earlier one fails; the failures are returned together.
    pub fn dispatch(&self, record: &Record) -> Result<(), LogError> {
        let mut errors = vec![];
        let mut node = Some(self.registry.resolve(record.logger()));
        while let Some(current) = node {
            if !current.level().test(record.level()) {
                break;
            }

            for &index in &current.sink_indices {
                let NamedSink { name, sink } = &self.sinks[index];
                if let Err(error) = sink.append(record) {
                    errors.push(SinkError {
                        sink: name.clone(),
                        error,
                    });
                }
            }

            node = if current.is_additive() {
                self.registry.parent(current)
            } else {
                None
            };
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(LogError::Sinks(errors))
        }
    }

    /// Eagerly acquire the resources of every sink.
    pub fn open(&self) -> Result<(), LogError> {
        self.for_each_sink(|sink| sink.open())
    }

    /// Flush every sink.
    pub fn flush(&self) -> Result<(), LogError> {
        self.for_each_sink(|sink| sink.flush())
    }

    /// Describe this configuration as data.
    ///
    /// Fails with [`ConfigError::NotDescribable`] if a sink is not one of the built-in kinds, its
    /// layout has no pattern, or its time zone has neither an IANA name nor a whole-minute offset.
    pub fn to_spec(&self) -> Result<ConfigSpec, ConfigError> {
        let sinks = self
            .sinks
            .iter()
            .map(|NamedSink { name, sink }| {
                let not_describable = || ConfigError::NotDescribable(name.clone());
                let kind = sink.describe().ok_or_else(not_describable)?;
                let layout = sink.layout();
                let pattern = layout.pattern().ok_or_else(not_describable)?;
                let timezone = match layout.timezone() {
                    Some(tz) => Some(timezone_name(tz).ok_or_else(not_describable)?),
                    None => None,
                };
                Ok(SinkSpec {
                    name: name.clone(),
                    kind,
                    pattern: Some(pattern.to_string()),
                    timezone,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let loggers = self
            .registry
            .iter()
            .map(|node| LoggerSpec {
                name: node.name().to_string(),
                level: node.level(),
                sinks: node.sinks().to_vec(),
                additive: node.additive_flag(),
            })
            .collect();

        Ok(ConfigSpec {
            name: self.name.clone(),
            sinks,
            loggers,
        })
    }

    fn for_each_sink(&self, f: impl Fn(&dyn Sink) -> Result<(), Error>) -> Result<(), LogError> {
        let errors = self
            .sinks
            .iter()
            .filter_map(|NamedSink { name, sink }| {
                f(sink.as_ref()).err().map(|error| SinkError {
                    sink: name.clone(),
                    error,
                })
            })
            .collect::<Vec<_>>();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(LogError::Sinks(errors))
        }
    }
}

impl Drop for Configuration {
    fn drop(&mut self) {
        for NamedSink { name, sink } in &self.sinks {
            if let Err(err) = sink.close() {
                let err = Error::new("failed to close sink")
                    .with_context("sink", name)
                    .with_source(err);
                self.trap.trap(&err);
            }
        }
    }
}
