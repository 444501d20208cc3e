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

use jiff::tz::TimeZone;

use crate::Layout;
use crate::layout::date::DEFAULT_DATE_PATTERN;
use crate::layout::date::DatePattern;
use crate::record::Record;

/// The pattern used by [`PatternLayout::default`].
pub const DEFAULT_PATTERN: &str = "%d [%t] %-5level %logger: %msg%n%throwable";

// wider paddings are clamped
const MAX_PAD_WIDTH: usize = 512;

/// A layout that renders records through a conversion pattern.
///
/// Recognized conversion words:
///
/// | Word | Output |
/// |---|---|
/// | `%d`, `%date`, `%d{yyyy-MM-dd HH:mm:ss,SSS}` | the record time |
/// | `%t`, `%thread` | the thread name |
/// | `%p`, `%level` | the level |
/// | `%c`, `%logger` | the logger name, `root` for the root logger |
/// | `%m`, `%msg`, `%message` | the message |
/// | `%ex`, `%throwable`, `%exception` | the attached error and its sources, one per line |
/// | `%n` | a newline |
/// | `%%` | a percent sign |
///
/// A width may be put between `%` and the word: `%-5level` pads on the right, `%5level` on the
/// left. Widths above 512 are clamped. Anything the parser does not recognize is copied to the
/// output as-is.
///
/// # Examples
///
/// ```
/// use logroute::Layout;
/// use logroute::layout::PatternLayout;
/// use logroute::record::Level;
/// use logroute::record::Record;
///
/// let layout = PatternLayout::new("[%-5level] %logger - %msg");
/// let record = Record::builder()
///     .level(Level::Warn)
///     .logger("com.service")
///     .args(format_args!("disk at 93%"))
///     .build();
/// assert_eq!(layout.format(&record), b"[WARN ] com.service - disk at 93%");
/// ```
#[derive(Debug, Clone)]
pub struct PatternLayout {
    pattern: String,
    pieces: Vec<Piece>,
    timezone: Option<TimeZone>,
}

impl Default for PatternLayout {
    fn default() -> Self {
        PatternLayout::new(DEFAULT_PATTERN)
    }
}

impl PatternLayout {
    /// Parse a conversion pattern. Parsing never fails.
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let pieces = parse(&pattern);
        Self {
            pattern,
            pieces,
            timezone: None,
        }
    }

    /// Set the timezone for timestamps.
    ///
    /// Defaults to the system timezone if not set.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.timezone = Some(tz);
        self
    }

    /// The conversion pattern this layout was created from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Layout for PatternLayout {
    fn format(&self, record: &Record) -> Vec<u8> {
        let mut text = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(lit) => text.push_str(lit),
                Piece::Newline => text.push('\n'),
                Piece::Date(date) => {
                    let tz = self.timezone.clone().unwrap_or_else(TimeZone::system);
                    let time = record.time().to_zoned(tz);
                    date.render(&time, &mut text);
                }
                Piece::Thread(pad) => pad.push(&mut text, record.thread()),
                Piece::Level(pad) => pad.push(&mut text, record.level().as_str()),
                Piece::Logger(pad) => {
                    let logger = match record.logger() {
                        "" => "root",
                        name => name,
                    };
                    pad.push(&mut text, logger);
                }
                Piece::Message(pad) => {
                    if pad.width == 0 {
                        // SAFETY: write to a string always succeeds
                        write!(&mut text, "{}", record.args()).unwrap();
                    } else {
                        pad.push(&mut text, &record.args().to_string());
                    }
                }
                Piece::Exception => {
                    let mut error = record.error();
                    let mut first = true;
                    while let Some(err) = error {
                        if !first {
                            text.push_str("Caused by: ");
                        }
                        // SAFETY: write to a string always succeeds
                        writeln!(&mut text, "{err}").unwrap();
                        first = false;
                        error = err.source();
                    }
                }
            }
        }
        text.into_bytes()
    }

    fn pattern(&self) -> Option<&str> {
        Some(&self.pattern)
    }

    fn timezone(&self) -> Option<&TimeZone> {
        self.timezone.as_ref()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Pad {
    width: usize,
    left_align: bool,
}

impl Pad {
    fn push(&self, out: &mut String, value: &str) {
        let len = value.chars().count();
        let fill = self.width.saturating_sub(len);
        if !self.left_align {
            out.extend(std::iter::repeat_n(' ', fill));
        }
        out.push_str(value);
        if self.left_align {
            out.extend(std::iter::repeat_n(' ', fill));
        }
    }
}

#[derive(Debug, Clone)]
enum Piece {
    Literal(String),
    Newline,
    Date(DatePattern),
    Thread(Pad),
    Level(Pad),
    Logger(Pad),
    Message(Pad),
    Exception,
}

fn parse(pattern: &str) -> Vec<Piece> {
    let mut pieces = vec![];
    let mut literal = String::new();
    let mut rest = pattern;

    while let Some(pos) = rest.find('%') {
        literal.push_str(&rest[..pos]);
        let token = &rest[pos..];

        if let Some(after) = token.strip_prefix("%%") {
            literal.push('%');
            rest = after;
            continue;
        }

        let Some((piece, consumed)) = parse_token(token) else {
            // unterminated option: everything left is literal text
            literal.push_str(token);
            rest = "";
            break;
        };

        match piece {
            Some(piece) => {
                if !literal.is_empty() {
                    pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                }
                pieces.push(piece);
            }
            None => literal.push_str(&token[..consumed]),
        }
        rest = &token[consumed..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }
    pieces
}

/// Parse one token starting at `%`.
///
/// Returns the recognized piece (`None` for an unknown word) and the number of bytes consumed, or
/// `None` if the token has an unterminated `{` option.
fn parse_token(token: &str) -> Option<(Option<Piece>, usize)> {
    let bytes = token.as_bytes();
    let mut i = 1;

    let mut pad = Pad::default();
    if bytes.get(i) == Some(&b'-') {
        pad.left_align = true;
        i += 1;
    }
    let width_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    let digits = &token[width_start..i];
    if !digits.is_empty() {
        pad.width = digits
            .parse::<usize>()
            .map_or(MAX_PAD_WIDTH, |width| width.min(MAX_PAD_WIDTH));
    }

    let word_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_alphabetic) {
        i += 1;
    }
    let word = &token[word_start..i];

    let mut option = None;
    if bytes.get(i) == Some(&b'{') {
        let close = token[i..].find('}')?;
        option = Some(&token[i + 1..i + close]);
        i += close + 1;
    }

    let piece = match word {
        "d" | "date" => Some(Piece::Date(DatePattern::parse(
            option.unwrap_or(DEFAULT_DATE_PATTERN),
        ))),
        "t" | "thread" => Some(Piece::Thread(pad)),
        "p" | "level" => Some(Piece::Level(pad)),
        "c" | "logger" => Some(Piece::Logger(pad)),
        "m" | "msg" | "message" => Some(Piece::Message(pad)),
        "ex" | "throwable" | "exception" => Some(Piece::Exception),
        "n" => Some(Piece::Newline),
        _ => None,
    };

    Some((piece, i))
}
