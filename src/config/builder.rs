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

use std::collections::HashMap;
use std::collections::HashSet;

use crate::Sink;
use crate::config::Configuration;
use crate::config::NamedSink;
use crate::config::SinkSpec;
use crate::error::ConfigError;
use crate::logger::LoggerConfig;
use crate::logger::Registry;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

#[derive(Debug)]
struct PendingSink {
    name: String,
    sink: Result<Box<dyn Sink>, ConfigError>,
}

/// A builder for a [`Configuration`].
///
/// Nothing is validated until [`build`](ConfigurationBuilder::build), which reports the first
/// violated invariant in this order:
///
/// 1. sink names are well-formed and unique, and every sink spec has valid attributes;
/// 2. logger names are well-formed and unique;
/// 3. every sink a logger references is registered;
/// 4. exactly one root logger exists.
///
/// # Examples
///
/// ```
/// use logroute::config::ConfigurationBuilder;
/// use logroute::logger::LoggerConfig;
/// use logroute::record::LevelFilter;
/// use logroute::sink::Capture;
///
/// let config = ConfigurationBuilder::default()
///     .sink("capture", Capture::default())
///     .logger(LoggerConfig::root(LevelFilter::Error).sink("capture"))
///     .logger(LoggerConfig::new("com", LevelFilter::Debug).additive(false))
///     .build()
///     .unwrap();
/// assert_eq!(config.registry().resolve("com.service").name(), "com");
/// ```
#[must_use = "call `build` to validate the configuration"]
#[derive(Debug)]
pub struct ConfigurationBuilder {
    name: Option<String>,
    sinks: Vec<PendingSink>,
    loggers: Vec<LoggerConfig>,
    trap: Box<dyn Trap>,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        ConfigurationBuilder {
            name: None,
            sinks: vec![],
            loggers: vec![],
            trap: Box::new(DefaultTrap::default()),
        }
    }
}

impl ConfigurationBuilder {
    /// Name the configuration. The name is informational and not validated.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Register a sink under `name`.
    pub fn sink(mut self, name: impl Into<String>, sink: impl Into<Box<dyn Sink>>) -> Self {
        self.sinks.push(PendingSink {
            name: name.into(),
            sink: Ok(sink.into()),
        });
        self
    }

    /// Register a sink described by `spec`. Invalid attributes fail the build.
    pub fn sink_spec(mut self, spec: SinkSpec) -> Self {
        let sink = spec.build();
        self.sinks.push(PendingSink {
            name: spec.name,
            sink,
        });
        self
    }

    /// Register a logger node. Use [`LoggerConfig::root`] for the root node.
    pub fn logger(mut self, logger: LoggerConfig) -> Self {
        self.loggers.push(logger);
        self
    }

    /// Set the trap for errors raised while closing the sinks of the built configuration.
    ///
    /// Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Validate and build the configuration. No sink is opened.
    pub fn build(self) -> Result<Configuration, ConfigError> {
        let ConfigurationBuilder {
            name,
            sinks,
            loggers,
            trap,
        } = self;

        let mut sink_index = HashMap::with_capacity(sinks.len());
        let mut named = Vec::with_capacity(sinks.len());
        for PendingSink { name, sink } in sinks {
            if !is_valid_sink_name(&name) {
                return Err(ConfigError::InvalidName { kind: "sink", name });
            }
            if sink_index.contains_key(&name) {
                return Err(ConfigError::DuplicateSink(name));
            }
            let sink = sink?;
            sink_index.insert(name.clone(), named.len());
            named.push(NamedSink { name, sink });
        }

        let mut roots = 0;
        let mut seen = HashSet::with_capacity(loggers.len());
        for logger in &loggers {
            if logger.is_root() {
                roots += 1;
                continue;
            }
            if !is_valid_logger_name(logger.name()) {
                return Err(ConfigError::InvalidName {
                    kind: "logger",
                    name: logger.name().to_string(),
                });
            }
            if !seen.insert(logger.name()) {
                return Err(ConfigError::DuplicateLogger(logger.name().to_string()));
            }
        }

        let mut nodes = Vec::with_capacity(loggers.len());
        for logger in loggers {
            let indices = logger
                .sinks()
                .iter()
                .map(|sink| {
                    sink_index
                        .get(sink)
                        .copied()
                        .ok_or_else(|| ConfigError::UnknownSink {
                            logger: logger.name().to_string(),
                            sink: sink.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            nodes.push(logger.into_node(indices));
        }

        match roots {
            0 => return Err(ConfigError::MissingRoot),
            1 => {}
            _ => return Err(ConfigError::MultipleRoots),
        }

        let registry = Registry::new(nodes)?;
        Ok(Configuration {
            name,
            sinks: named,
            registry,
            trap,
        })
    }
}

fn is_valid_sink_name(name: &str) -> bool {
    !name.is_empty() && name.trim() == name
}

// one or more non-empty dot-separated segments
fn is_valid_logger_name(name: &str) -> bool {
    name.split('.')
        .all(|segment| !segment.is_empty() && !segment.contains(char::is_whitespace))
}
