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

//! Error types.
//!
//! * [`Error`] is the I/O level error returned by sinks.
//! * [`ConfigError`] is returned when a configuration fails to build.
//! * [`LogError`] is returned by a dispatch that could not be completed cleanly.

use std::fmt;
use std::io;

/// The error returned by sink operations.
pub struct Error {
    message: String,
    sources: Vec<anyhow::Error>,
    context: Vec<(&'static str, String)>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if !self.context.is_empty() {
            write!(f, ", context: {{ ")?;
            write!(
                f,
                "{}",
                self.context
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )?;
            write!(f, " }}")?;
        }

        if !self.sources.is_empty() {
            write!(f, ", sources: [")?;
            for (i, source) in self.sources.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{source}")?;
            }
            write!(f, "]")?;
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            let mut de = f.debug_struct("Error");
            de.field("message", &self.message);
            de.field("context", &self.context);
            de.field("sources", &self.sources);
            return de.finish();
        }

        writeln!(f, "{}", self.message)?;
        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "Context:")?;
            for (k, v) in self.context.iter() {
                writeln!(f, "   {k}: {v}")?;
            }
        }
        if !self.sources.is_empty() {
            writeln!(f)?;
            writeln!(f, "Sources:")?;
            for source in self.sources.iter() {
                writeln!(f, "   {source:#}")?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.sources.first().map(|v| v.as_ref())
    }
}

impl Error {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sources: vec![],
            context: vec![],
        }
    }

    /// Add one more context in error.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Add one more source in error.
    pub fn with_source(mut self, src: impl Into<anyhow::Error>) -> Self {
        self.sources.push(src.into());
        self
    }

    /// The message of this error, without context and sources.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Return an iterator over all sources of this error.
    pub fn sources(&self) -> impl ExactSizeIterator<Item = &(dyn std::error::Error + 'static)> {
        self.sources.iter().map(|v| v.as_ref())
    }

    /// Default constructor for [`Error`] from [`io::Error`].
    pub fn from_io_error(err: io::Error) -> Error {
        Error::new("failed to perform io").with_source(err)
    }
}

/// The first invariant violated by a configuration under construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// Two sinks were registered with the same name.
    #[error("duplicate sink name: {0:?}")]
    DuplicateSink(String),
    /// Two loggers were registered with the same name.
    #[error("duplicate logger name: {0:?}")]
    DuplicateLogger(String),
    /// No root logger was registered.
    #[error("a root logger is required")]
    MissingRoot,
    /// More than one root logger was registered.
    #[error("only one root logger may be configured")]
    MultipleRoots,
    /// A logger references a sink that is not part of the configuration.
    #[error("logger {logger:?} references unknown sink {sink:?}")]
    UnknownSink {
        /// The name of the referencing logger.
        logger: String,
        /// The name of the missing sink.
        sink: String,
    },
    /// A sink or logger name is malformed.
    #[error("invalid {kind} name: {name:?}")]
    InvalidName {
        /// Either `"sink"` or `"logger"`.
        kind: &'static str,
        /// The offending name.
        name: String,
    },
    /// A sink attribute could not be interpreted.
    #[error("invalid attribute {attribute:?} on sink {sink:?}: {reason}")]
    InvalidAttribute {
        /// The name of the sink.
        sink: String,
        /// The attribute name.
        attribute: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// A sink cannot be described as a [`SinkSpec`](crate::config::SinkSpec).
    #[error("sink {0:?} cannot be described declaratively")]
    NotDescribable(String),
}

/// A failure of a single sink during a dispatch.
#[derive(Debug)]
pub struct SinkError {
    /// The name of the failing sink.
    pub sink: String,
    /// The underlying error.
    pub error: Error,
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink {:?}: {}", self.sink, self.error)
    }
}

/// The error returned by a dispatch.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// No configuration is active, so no logger can be resolved.
    #[error("cannot resolve logger {logger:?}: no configuration is active")]
    Unresolved {
        /// The requested logger name.
        logger: String,
    },
    /// One or more sinks failed; every other sink still received the record.
    #[error("{} sink(s) failed: {}", .0.len(), DisplayList(.0))]
    Sinks(Vec<SinkError>),
}

impl LogError {
    /// The per-sink failures of this dispatch, empty for [`LogError::Unresolved`].
    pub fn sink_errors(&self) -> &[SinkError] {
        match self {
            LogError::Unresolved { .. } => &[],
            LogError::Sinks(errors) => errors,
        }
    }
}

struct DisplayList<'a>(&'a [SinkError]);

impl fmt::Display for DisplayList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_with_context_and_source() {
        let err = Error::new("failed to open log file")
            .with_context("path", "/var/log/app.log")
            .with_source(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(
            err.to_string(),
            "failed to open log file, context: { path: /var/log/app.log }, sources: [denied]"
        );
        assert_eq!(err.message(), "failed to open log file");
        assert_eq!(err.sources().len(), 1);
    }

    #[test]
    fn test_log_error_lists_every_sink() {
        let err = LogError::Sinks(vec![
            SinkError {
                sink: "a".to_string(),
                error: Error::new("boom"),
            },
            SinkError {
                sink: "b".to_string(),
                error: Error::new("bang"),
            },
        ]);
        assert_eq!(
            err.to_string(),
            r#"2 sink(s) failed: sink "a": boom; sink "b": bang"#
        );
        assert_eq!(err.sink_errors().len(), 2);
    }
}
