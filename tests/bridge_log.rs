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

#![cfg(feature = "bridge-log")]

use logroute::config::Configuration;
use logroute::layout::PatternLayout;
use logroute::logger::LoggerConfig;
use logroute::record::LevelFilter;
use logroute::sink::Capture;

#[test]
fn test_log_crate_records_are_routed_by_target() {
    logroute::bridge::setup_log_crate();

    // nothing is configured yet: dropped without error
    log::error!(target: "my_app::db", "before configuration");

    let root = Capture::default();
    let db = Capture::default().with_layout(PatternLayout::new("%-5level [%logger] %msg"));
    let config = Configuration::builder()
        .sink("root", root.clone())
        .sink("db", db.clone())
        .logger(LoggerConfig::root(LevelFilter::Warn).sink("root"))
        .logger(
            LoggerConfig::new("my_app.db", LevelFilter::Debug)
                .sink("db")
                .additive(false),
        )
        .build()
        .unwrap();
    assert!(logroute::reconfigure(config).is_none());

    log::debug!(target: "my_app::db::pool", "acquired {} connections", 4);
    log::trace!(target: "my_app::db", "too verbose");
    log::info!(target: "my_app::http", "below root threshold");
    log::warn!(target: "my_app::http", "slow response");

    assert_eq!(
        db.entries(),
        vec!["DEBUG [my_app.db.pool] acquired 4 connections"]
    );
    assert_eq!(root.entries(), vec!["WARN  my_app.http: slow response"]);
    assert!(log::log_enabled!(target: "my_app::db", log::Level::Debug));
    assert!(!log::log_enabled!(target: "my_app::http", log::Level::Info));

    drop(logroute::shutdown());
    assert!(db.is_closed());
    log::warn!(target: "my_app::http", "after shutdown");
    assert_eq!(root.entries().len(), 1);
}
