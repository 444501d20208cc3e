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

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::logger::LoggerNode;
use crate::logger::ROOT_LOGGER;

/// The logger nodes of a configuration, indexed by name.
///
/// A name resolves to the node with the longest name that is a dot-segment prefix of it, or to
/// the root node if there is none: `com.service.db` resolves to `com.service` if that exists,
/// but `common` never resolves to `com`.
#[derive(Debug)]
pub struct Registry {
    nodes: Vec<LoggerNode>,
    by_name: BTreeMap<String, usize>,
    root: usize,
}

impl Registry {
    /// Index `nodes`, which must have unique names.
    pub(crate) fn new(mut nodes: Vec<LoggerNode>) -> Result<Registry, ConfigError> {
        let by_name = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.name().to_string(), i))
            .collect::<BTreeMap<_, _>>();
        let root = *by_name.get(ROOT_LOGGER).ok_or(ConfigError::MissingRoot)?;

        let parents = nodes
            .iter()
            .map(|node| {
                parent_name(node.name()).map(|name| lookup(&by_name, name).unwrap_or(root))
            })
            .collect::<Vec<_>>();
        for (node, parent) in nodes.iter_mut().zip(parents) {
            node.parent = parent;
        }

        Ok(Registry {
            nodes,
            by_name,
            root,
        })
    }

    /// The node responsible for records emitted to `name`.
    pub fn resolve(&self, name: &str) -> &LoggerNode {
        let index = lookup(&self.by_name, name).unwrap_or(self.root);
        &self.nodes[index]
    }

    /// The node configured under exactly `name`.
    pub fn get(&self, name: &str) -> Option<&LoggerNode> {
        self.by_name.get(name).map(|&i| &self.nodes[i])
    }

    /// The nearest configured ancestor of `node`, `None` for the root.
    pub fn parent(&self, node: &LoggerNode) -> Option<&LoggerNode> {
        node.parent.map(|i| &self.nodes[i])
    }

    pub fn root(&self) -> &LoggerNode {
        &self.nodes[self.root]
    }

    /// Every node, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &LoggerNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// Longest configured name that equals `name` or is a dot-segment prefix of it.
fn lookup(by_name: &BTreeMap<String, usize>, name: &str) -> Option<usize> {
    let mut candidate = name;
    loop {
        if let Some(&i) = by_name.get(candidate) {
            return Some(i);
        }
        match candidate.rfind('.') {
            Some(pos) => candidate = &candidate[..pos],
            None => return None,
        }
    }
}

fn parent_name(name: &str) -> Option<&str> {
    if name == ROOT_LOGGER {
        return None;
    }
    match name.rfind('.') {
        Some(pos) => Some(&name[..pos]),
        None => Some(ROOT_LOGGER),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::LoggerConfig;
    use crate::record::LevelFilter;

    fn registry(names: &[&str]) -> Registry {
        let nodes = names
            .iter()
            .map(|name| LoggerConfig::new(*name, LevelFilter::Info).into_node(vec![]))
            .collect();
        Registry::new(nodes).unwrap()
    }

    #[test]
    fn test_resolve_longest_segment_prefix() {
        let registry = registry(&["", "com", "com.service", "org.example"]);

        assert_eq!(registry.resolve("com.service.db").name(), "com.service");
        assert_eq!(registry.resolve("com.service").name(), "com.service");
        assert_eq!(registry.resolve("com.servicex").name(), "com");
        assert_eq!(registry.resolve("com").name(), "com");
        assert_eq!(registry.resolve("common").name(), "");
        assert_eq!(registry.resolve("org").name(), "");
        assert_eq!(registry.resolve("org.example.x.y").name(), "org.example");
        assert_eq!(registry.resolve("").name(), "");
        assert_eq!(registry.resolve("net.other").name(), "");
    }

    #[test]
    fn test_parents_skip_unconfigured_segments() {
        let registry = registry(&["a.b.c", "", "a"]);

        let abc = registry.get("a.b.c").unwrap();
        let a = registry.parent(abc).unwrap();
        assert_eq!(a.name(), "a");
        let root = registry.parent(a).unwrap();
        assert!(root.is_root());
        assert!(registry.parent(root).is_none());
        assert_eq!(registry.root().name(), "");
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_missing_root() {
        let nodes = vec![LoggerConfig::new("com", LevelFilter::Info).into_node(vec![])];
        assert_eq!(Registry::new(nodes).unwrap_err(), ConfigError::MissingRoot);
    }
}
