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

use std::fmt::Write;

use jiff::Zoned;

use crate::layout::date::DatePattern;

const DEFAULT_FILE_DATE_PATTERN: &str = "yyyy-MM-dd";

#[derive(Debug, Clone)]
enum Piece {
    Literal(String),
    Date(DatePattern),
    Index,
}

/// The template archived files are renamed to, e.g. `app-%d{MM-dd-yy-HH-mm-ss}.%i.log`.
///
/// `%d{..}` renders the time of the closed period, `%i` a counter starting at 1 and `%%` a
/// percent sign. Everything else is literal.
#[derive(Debug, Clone)]
pub(crate) struct FilePattern {
    source: String,
    pieces: Vec<Piece>,
}

impl FilePattern {
    pub(crate) fn parse(source: impl Into<String>) -> FilePattern {
        let source = source.into();
        let mut pieces = vec![];
        let mut literal = String::new();
        let mut rest = source.as_str();

        while let Some(pos) = rest.find('%') {
            literal.push_str(&rest[..pos]);
            let token = &rest[pos..];

            let (piece, consumed) = if let Some(after) = token.strip_prefix("%d{") {
                match after.find('}') {
                    Some(close) => (
                        Some(Piece::Date(DatePattern::parse(&after[..close]))),
                        3 + close + 1,
                    ),
                    None => (None, token.len()),
                }
            } else if token.starts_with("%d") {
                (
                    Some(Piece::Date(DatePattern::parse(DEFAULT_FILE_DATE_PATTERN))),
                    2,
                )
            } else if token.starts_with("%i") {
                (Some(Piece::Index), 2)
            } else if token.starts_with("%%") {
                literal.push('%');
                (None, 0)
            } else {
                (None, 1)
            };

            match piece {
                Some(piece) => {
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(piece);
                    rest = &token[consumed..];
                }
                None if consumed == 0 => rest = &token[2..],
                None => {
                    literal.push_str(&token[..consumed]);
                    rest = &token[consumed..];
                }
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        FilePattern { source, pieces }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.source
    }

    pub(crate) fn has_index(&self) -> bool {
        self.pieces.iter().any(|p| matches!(p, Piece::Index))
    }

    pub(crate) fn render(&self, time: &Zoned, index: usize) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(lit) => out.push_str(lit),
                Piece::Date(date) => date.render(time, &mut out),
                // SAFETY: write to a string always succeeds
                Piece::Index => write!(&mut out, "{index}").unwrap(),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn time() -> Zoned {
        Zoned::from_str("2022-01-09T19:31:05[UTC]").unwrap()
    }

    #[test]
    fn test_render_date_and_index() {
        let pattern = FilePattern::parse("logs/app-%d{MM-dd-yy-HH-mm-ss}.%i.log");
        assert!(pattern.has_index());
        assert_eq!(
            pattern.render(&time(), 3),
            "logs/app-01-09-22-19-31-05.3.log"
        );
    }

    #[test]
    fn test_render_defaults_and_literals() {
        let pattern = FilePattern::parse("rolling-%d.log.gz");
        assert!(!pattern.has_index());
        assert_eq!(pattern.render(&time(), 1), "rolling-2022-01-09.log.gz");

        let pattern = FilePattern::parse("100%%-%x-%d{yy");
        assert_eq!(pattern.render(&time(), 1), "100%-%x-%d{yy");
        assert_eq!(pattern.as_str(), "100%%-%x-%d{yy");
    }
}
