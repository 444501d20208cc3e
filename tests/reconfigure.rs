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

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Barrier;
use std::thread;

use logroute::LoggerContext;
use logroute::config::Configuration;
use logroute::layout::PatternLayout;
use logroute::logger::LoggerConfig;
use logroute::record::Level;
use logroute::record::LevelFilter;
use logroute::sink::File;
use tempfile::TempDir;

const THREADS: usize = 4;
const RECORDS: usize = 300;
const GENERATIONS: usize = 10;

fn file_config(path: PathBuf) -> Configuration {
    Configuration::builder()
        .sink(
            "file",
            File::new(path).with_layout(PatternLayout::new("%msg|end%n")),
        )
        .logger(LoggerConfig::root(LevelFilter::All).sink("file"))
        .build()
        .unwrap()
}

// records to `app.*` reach both the `app` file and, through additivity, the root file
fn chained_config(dir: &Path, generation: usize) -> Configuration {
    let sink = |name: &str| {
        File::new(dir.join(format!("gen-{generation}-{name}.log")))
            .with_layout(PatternLayout::new("%msg|end%n"))
    };
    Configuration::builder()
        .sink("root", sink("root"))
        .sink("app", sink("app"))
        .logger(LoggerConfig::root(LevelFilter::All).sink("root"))
        .logger(LoggerConfig::new("app", LevelFilter::All).sink("app"))
        .build()
        .unwrap()
}

fn read_messages(path: &Path) -> Vec<String> {
    let Ok(content) = fs::read_to_string(path) else {
        // a generation no record reached is never opened
        return vec![];
    };
    content
        .lines()
        .map(|line| {
            let message = line.strip_suffix("|end").unwrap_or_else(|| {
                panic!("torn line {line:?} in {}", path.display());
            });
            message.to_string()
        })
        .collect()
}

#[test]
fn test_every_record_lands_whole_in_exactly_one_configuration() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let dir = temp_dir.path();

    let context = Arc::new(LoggerContext::with_configuration(chained_config(dir, 0)));
    let barrier = Arc::new(Barrier::new(THREADS + 1));

    let handles = (0..THREADS)
        .map(|t| {
            let context = context.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for i in 0..RECORDS {
                    context
                        .log("app.worker", Level::Info, format_args!("t{t}-r{i}"))
                        .unwrap();
                }
            })
        })
        .collect::<Vec<_>>();

    barrier.wait();
    for generation in 1..GENERATIONS {
        drop(context.reconfigure(chained_config(dir, generation)));
        thread::yield_now();
    }
    for handle in handles {
        handle.join().unwrap();
    }
    drop(context.shutdown());

    let mut seen = BTreeSet::new();
    for generation in 0..GENERATIONS {
        let mut app = read_messages(&dir.join(format!("gen-{generation}-app.log")));
        let mut root = read_messages(&dir.join(format!("gen-{generation}-root.log")));

        // both copies of a record come from the same generation
        app.sort();
        root.sort();
        assert_eq!(app, root, "generation {generation} was split");

        for message in app {
            assert!(seen.insert(message.clone()), "duplicate {message}");
        }
    }

    let expected = (0..THREADS)
        .flat_map(|t| (0..RECORDS).map(move |i| format!("t{t}-r{i}")))
        .collect::<BTreeSet<_>>();
    assert_eq!(seen, expected);
}

#[test]
fn test_log_after_shutdown_is_unresolved() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let path = temp_dir.path().join("app.log");
    let context = LoggerContext::with_configuration(file_config(path.clone()));

    context.log("app", Level::Info, format_args!("one")).unwrap();
    let previous = context.shutdown().unwrap();
    assert!(context.log("app", Level::Info, format_args!("two")).is_err());

    // the caller still holds the old configuration, so its sink is still open
    previous
        .dispatch(
            &logroute::record::Record::builder()
                .args(format_args!("three"))
                .build(),
        )
        .unwrap();
    drop(previous);

    assert_eq!(fs::read_to_string(&path).unwrap(), "one|end\nthree|end\n");
}
