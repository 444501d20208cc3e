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

//! Declarative descriptions of a configuration.

use std::num::NonZeroU64;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Sink;
use crate::config::Configuration;
use crate::config::ConfigurationBuilder;
use crate::config::LoggerConfig;
use crate::error::ConfigError;
use crate::layout::PatternLayout;
use crate::layout::date::parse_timezone;
use crate::record::LevelFilter;
use crate::sink::Console;
use crate::sink::ConsoleTarget;
use crate::sink::File;
use crate::sink::RollingFileBuilder;
use crate::sink::Rotation;
use crate::sink::rolling::parse_size;

/// A whole configuration as data.
///
/// # Examples
///
/// ```
/// use logroute::config::ConfigSpec;
///
/// let spec = ConfigSpec::from_json(
///     r#"{
///         "name": "DefaultLogger",
///         "sinks": [
///             {
///                 "name": "stdout",
///                 "kind": "console",
///                 "pattern": "%d %-5level %logger: %msg%n",
///                 "timezone": "UTC"
///             }
///         ],
///         "loggers": [
///             { "level": "ERROR", "sinks": ["stdout"] },
///             { "name": "com.service", "level": "DEBUG", "sinks": ["stdout"], "additive": false }
///         ]
///     }"#,
/// )
/// .unwrap();
/// let config = spec.build().unwrap();
/// assert_eq!(config.name(), Some("DefaultLogger"));
/// assert_eq!(config.registry().len(), 2);
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSpec {
    /// An optional name for the configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Every named sink, in registration order.
    #[serde(default)]
    pub sinks: Vec<SinkSpec>,
    /// Every logger node. The root logger has the empty name.
    #[serde(default)]
    pub loggers: Vec<LoggerSpec>,
}

/// A named sink with its kind, attributes and pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: SinkKind,
    /// The conversion pattern, [`DEFAULT_PATTERN`](crate::layout::DEFAULT_PATTERN) if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// The time zone of `%d`: an IANA name such as `Asia/Tokyo`, or an offset such as `+09:00`.
    /// The system time zone if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// The built-in sink kinds and their attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SinkKind {
    /// See [`Console`].
    Console {
        #[serde(default)]
        target: ConsoleTarget,
    },
    /// See [`File`].
    File {
        path: PathBuf,
        #[serde(default = "default_true")]
        append: bool,
    },
    /// See [`RollingFile`](crate::sink::RollingFile).
    RollingFile {
        path: PathBuf,
        file_pattern: String,
        /// A size such as `"10MB"`, see [`parse_size`].
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_size: Option<String>,
        #[serde(default)]
        rotation: Rotation,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_archives: Option<usize>,
    },
}

/// A logger node as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSpec {
    /// The dotted name; empty for the root logger.
    #[serde(default)]
    pub name: String,
    pub level: LevelFilter,
    #[serde(default)]
    pub sinks: Vec<String>,
    #[serde(default = "default_true")]
    pub additive: bool,
}

fn default_true() -> bool {
    true
}

impl SinkSpec {
    /// Instantiate the described sink. No resource is acquired.
    pub fn build(&self) -> Result<Box<dyn Sink>, ConfigError> {
        let mut layout = match &self.pattern {
            Some(pattern) => PatternLayout::new(pattern.as_str()),
            None => PatternLayout::default(),
        };
        if let Some(name) = &self.timezone {
            let tz = parse_timezone(name).map_err(|err| self.invalid("timezone", err))?;
            layout = layout.timezone(tz);
        }

        let sink: Box<dyn Sink> = match &self.kind {
            SinkKind::Console { target } => Console::new(*target).with_layout(layout).into(),
            SinkKind::File { path, append } => File::new(path)
                .append(*append)
                .with_layout(layout)
                .into(),
            SinkKind::RollingFile {
                path,
                file_pattern,
                max_size,
                rotation,
                max_archives,
            } => {
                if file_pattern.is_empty() {
                    return Err(self.invalid("file_pattern", "must not be empty"));
                }

                let mut builder = RollingFileBuilder::new(path, file_pattern.as_str())
                    .layout(layout)
                    .rotation(*rotation);
                if let Some(max_size) = max_size {
                    let bytes = parse_size(max_size).map_err(|err| self.invalid("max_size", err))?;
                    let bytes = NonZeroU64::new(bytes)
                        .ok_or_else(|| self.invalid("max_size", "must be greater than zero"))?;
                    builder = builder.rollover_size(bytes);
                }
                if let Some(max_archives) = max_archives {
                    let n = NonZeroUsize::new(*max_archives)
                        .ok_or_else(|| self.invalid("max_archives", "must be greater than zero"))?;
                    builder = builder.max_archives(n);
                }
                builder.build().into()
            }
        };
        Ok(sink)
    }

    fn invalid(&self, attribute: &'static str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidAttribute {
            sink: self.name.clone(),
            attribute,
            reason: reason.into(),
        }
    }
}

impl From<LoggerSpec> for LoggerConfig {
    fn from(spec: LoggerSpec) -> Self {
        spec.sinks
            .into_iter()
            .fold(LoggerConfig::new(spec.name, spec.level), |logger, sink| {
                logger.sink(sink)
            })
            .additive(spec.additive)
    }
}

impl ConfigSpec {
    /// Parse a spec from JSON.
    pub fn from_json(json: &str) -> Result<ConfigSpec, Error> {
        serde_json::from_str(json)
            .map_err(|err| Error::new("failed to parse configuration").with_source(err))
    }

    /// Render this spec as pretty printed JSON.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self)
            .map_err(|err| Error::new("failed to render configuration").with_source(err))
    }

    /// Build and validate the described configuration.
    pub fn build(self) -> Result<Configuration, ConfigError> {
        ConfigurationBuilder::from(self).build()
    }
}

impl From<ConfigSpec> for ConfigurationBuilder {
    fn from(spec: ConfigSpec) -> Self {
        let mut builder = ConfigurationBuilder::default();
        if let Some(name) = spec.name {
            builder = builder.name(name);
        }
        let builder = spec
            .sinks
            .into_iter()
            .fold(builder, |builder, sink| builder.sink_spec(sink));
        spec.loggers
            .into_iter()
            .fold(builder, |builder, logger| builder.logger(logger.into()))
    }
}
