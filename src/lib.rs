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

//! Logroute routes log records through a hierarchy of named loggers to console, file and
//! rolling-file sinks, and lets the whole routing setup be replaced at runtime without losing or
//! tearing records.
//!
//! # Overview
//!
//! A [`Configuration`](config::Configuration) is an immutable set of named [`Sink`]s and
//! [logger nodes](logger::LoggerNode). A record emitted to `com.service.db` is handled by the
//! node with the longest dotted prefix of that name, falls back to the root node, and climbs to
//! the parent nodes as long as it passes their thresholds and the nodes are additive.
//!
//! A [`LoggerContext`] holds the active configuration. [`reconfigure`] swaps in a new one
//! atomically: every record goes entirely to the old configuration or entirely to the new one,
//! and the old sinks are closed once the last record using them has been written.
//!
//! # Examples
//!
//! ```
//! use logroute::config::Configuration;
//! use logroute::layout::PatternLayout;
//! use logroute::logger::LoggerConfig;
//! use logroute::record::Level;
//! use logroute::record::LevelFilter;
//! use logroute::sink::Console;
//!
//! let config = Configuration::builder()
//!     .sink(
//!         "stdout",
//!         Console::stdout().with_layout(PatternLayout::new("%d [%t] %-5level %logger: %msg%n")),
//!     )
//!     .logger(LoggerConfig::root(LevelFilter::Error).sink("stdout"))
//!     .logger(LoggerConfig::new("com.service", LevelFilter::Debug).sink("stdout"))
//!     .build()
//!     .unwrap();
//! logroute::reconfigure(config);
//!
//! logroute::log("com.service.db", Level::Debug, format_args!("pool ready")).unwrap();
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod bridge;
pub mod config;
pub mod error;
pub mod layout;
pub mod logger;
pub mod record;
pub mod sink;
pub mod trap;

mod context;

pub use self::context::LoggerContext;
pub use self::context::active;
pub use self::context::flush;
pub use self::context::global;
pub use self::context::log;
pub use self::context::reconfigure;
pub use self::context::shutdown;
pub use self::error::Error;
pub use self::layout::Layout;
pub use self::sink::Sink;
