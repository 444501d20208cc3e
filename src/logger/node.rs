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

use crate::record::LevelFilter;

/// The name of the root logger.
pub const ROOT_LOGGER: &str = "";

/// A logger node under construction.
///
/// # Examples
///
/// ```
/// use logroute::logger::LoggerConfig;
/// use logroute::record::LevelFilter;
///
/// let root = LoggerConfig::root(LevelFilter::Error).sink("stdout");
/// let com = LoggerConfig::new("com", LevelFilter::Debug)
///     .sink("file")
///     .additive(false);
/// assert!(root.is_root());
/// assert!(!com.is_additive());
/// ```
#[must_use = "register the logger with `ConfigurationBuilder::logger`"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    name: String,
    level: LevelFilter,
    sinks: Vec<String>,
    additive: bool,
}

impl LoggerConfig {
    /// Create a logger node named `name` that passes records at `level` or more severe.
    ///
    /// Additive by default, with no sinks.
    pub fn new(name: impl Into<String>, level: impl Into<LevelFilter>) -> Self {
        LoggerConfig {
            name: name.into(),
            level: level.into(),
            sinks: vec![],
            additive: true,
        }
    }

    /// Create the root logger node.
    pub fn root(level: impl Into<LevelFilter>) -> Self {
        LoggerConfig::new(ROOT_LOGGER, level)
    }

    /// Attach the sink registered under `name`.
    pub fn sink(mut self, name: impl Into<String>) -> Self {
        self.sinks.push(name.into());
        self
    }

    /// Set whether records passing this node also go to its parent. Ignored on the root.
    pub fn additive(mut self, additive: bool) -> Self {
        self.additive = additive;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn sinks(&self) -> &[String] {
        &self.sinks
    }

    pub fn is_root(&self) -> bool {
        self.name == ROOT_LOGGER
    }

    pub fn is_additive(&self) -> bool {
        self.additive && !self.is_root()
    }

    pub(crate) fn into_node(self, sink_indices: Vec<usize>) -> LoggerNode {
        LoggerNode {
            name: self.name,
            level: self.level,
            sinks: self.sinks,
            sink_indices,
            additive: self.additive,
            parent: None,
        }
    }
}

/// A validated logger node of a [`Configuration`](crate::config::Configuration).
#[derive(Debug)]
pub struct LoggerNode {
    name: String,
    level: LevelFilter,
    sinks: Vec<String>,
    pub(crate) sink_indices: Vec<usize>,
    additive: bool,
    pub(crate) parent: Option<usize>,
}

impl LoggerNode {
    /// The dotted name, `""` for the root logger.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The minimum severity this node passes.
    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// The names of the attached sinks, in attachment order.
    pub fn sinks(&self) -> &[String] {
        &self.sinks
    }

    /// Whether records passing this node continue to its parent. Always `false` on the root.
    pub fn is_additive(&self) -> bool {
        self.additive && !self.is_root()
    }

    // as registered, including on the root
    pub(crate) fn additive_flag(&self) -> bool {
        self.additive
    }

    pub fn is_root(&self) -> bool {
        self.name == ROOT_LOGGER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;

    #[test]
    fn test_root_is_never_additive() {
        let root = LoggerConfig::root(Level::Info).additive(true);
        assert!(root.is_root());
        assert!(!root.is_additive());
        assert!(!root.into_node(vec![]).is_additive());

        let node = LoggerConfig::new("com", LevelFilter::Off).into_node(vec![]);
        assert!(node.is_additive());
        assert_eq!(node.level(), LevelFilter::Off);
    }
}
