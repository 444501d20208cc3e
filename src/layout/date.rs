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
use jiff::tz::Offset;
use jiff::tz::TimeZone;

/// The format used by `%d` without an option.
pub(crate) const DEFAULT_DATE_PATTERN: &str = "yyyy-MM-dd HH:mm:ss,SSS";

const ISO8601_DATE_PATTERN: &str = "yyyy-MM-ddTHH:mm:ss,SSS";

#[derive(Debug, Clone, PartialEq, Eq)]
enum DateItem {
    Year,
    ShortYear,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millis,
    Literal(String),
}

/// A date pattern in the `yyyy-MM-dd HH:mm:ss,SSS` style.
///
/// Letters other than the recognized fields, and every other character, are copied verbatim.
/// `DEFAULT` and `ISO8601` are accepted as named patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DatePattern {
    items: Vec<DateItem>,
}

impl DatePattern {
    pub(crate) fn parse(pattern: &str) -> DatePattern {
        let pattern = match pattern {
            "DEFAULT" => DEFAULT_DATE_PATTERN,
            "ISO8601" => ISO8601_DATE_PATTERN,
            pattern => pattern,
        };

        let chars = pattern.chars().collect::<Vec<_>>();
        let mut items: Vec<DateItem> = vec![];
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            let mut run = 1;
            while i + run < chars.len() && chars[i + run] == c {
                run += 1;
            }

            let item = match c {
                'y' if run == 2 => Some(DateItem::ShortYear),
                'y' => Some(DateItem::Year),
                'M' => Some(DateItem::Month),
                'd' => Some(DateItem::Day),
                'H' => Some(DateItem::Hour),
                'm' => Some(DateItem::Minute),
                's' => Some(DateItem::Second),
                'S' => Some(DateItem::Millis),
                _ => None,
            };

            match item {
                Some(item) => {
                    items.push(item);
                    i += run;
                }
                None => {
                    if let Some(DateItem::Literal(lit)) = items.last_mut() {
                        lit.push(c);
                    } else {
                        items.push(DateItem::Literal(c.to_string()));
                    }
                    i += 1;
                }
            }
        }

        DatePattern { items }
    }

    pub(crate) fn render(&self, time: &Zoned, out: &mut String) {
        for item in &self.items {
            // SAFETY: write to a string always succeeds
            match item {
                DateItem::Year => write!(out, "{:04}", time.year()).unwrap(),
                DateItem::ShortYear => write!(out, "{:02}", time.year().rem_euclid(100)).unwrap(),
                DateItem::Month => write!(out, "{:02}", time.month()).unwrap(),
                DateItem::Day => write!(out, "{:02}", time.day()).unwrap(),
                DateItem::Hour => write!(out, "{:02}", time.hour()).unwrap(),
                DateItem::Minute => write!(out, "{:02}", time.minute()).unwrap(),
                DateItem::Second => write!(out, "{:02}", time.second()).unwrap(),
                DateItem::Millis => write!(out, "{:03}", time.millisecond()).unwrap(),
                DateItem::Literal(lit) => out.push_str(lit),
            }
        }
    }

    #[cfg(test)]
    fn format(&self, time: &Zoned) -> String {
        let mut out = String::new();
        self.render(time, &mut out);
        out
    }
}

/// The name `tz` is described by: its IANA name, or a fixed offset such as `+09:00`.
///
/// Returns `None` for zones that have neither, or an offset with seconds.
pub(crate) fn timezone_name(tz: &TimeZone) -> Option<String> {
    if let Some(name) = tz.iana_name() {
        return Some(name.to_string());
    }

    let seconds = tz.to_fixed_offset().ok()?.seconds();
    if seconds % 60 != 0 {
        return None;
    }
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.unsigned_abs() / 60;
    Some(format!("{sign}{:02}:{:02}", minutes / 60, minutes % 60))
}

/// Parse a time zone written by [`timezone_name`]: `+HH:MM`, `-HH:MM` or an IANA name.
pub(crate) fn parse_timezone(name: &str) -> Result<TimeZone, String> {
    let Some(offset) = name.strip_prefix(['+', '-']) else {
        return TimeZone::get(name).map_err(|err| format!("unknown time zone {name:?}: {err}"));
    };

    let malformed = || format!("malformed offset {name:?}, expected +HH:MM");
    let (hours, minutes) = offset.split_once(':').ok_or_else(malformed)?;
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(malformed());
    }
    let hours = hours.parse::<u8>().map_err(|_| malformed())?;
    let minutes = minutes.parse::<u8>().map_err(|_| malformed())?;
    if minutes >= 60 {
        return Err(malformed());
    }

    let mut seconds = i32::from(hours) * 3600 + i32::from(minutes) * 60;
    if name.starts_with('-') {
        seconds = -seconds;
    }
    let offset = Offset::from_seconds(seconds).map_err(|err| format!("{name:?}: {err}"))?;
    Ok(TimeZone::fixed(offset))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn time() -> Zoned {
        Zoned::from_str("2022-01-09T19:31:05.042[UTC]").unwrap()
    }

    #[test]
    fn test_default_pattern() {
        let pattern = DatePattern::parse(DEFAULT_DATE_PATTERN);
        assert_eq!(pattern.format(&time()), "2022-01-09 19:31:05,042");
    }

    #[test]
    fn test_named_and_short_patterns() {
        assert_eq!(
            DatePattern::parse("ISO8601").format(&time()),
            "2022-01-09T19:31:05,042"
        );
        assert_eq!(
            DatePattern::parse("MM-dd-yy-HH-mm-ss").format(&time()),
            "01-09-22-19-31-05"
        );
        assert_eq!(DatePattern::parse("MM-dd-yy").format(&time()), "01-09-22");
    }

    #[test]
    fn test_timezone_names() {
        let tokyo = parse_timezone("+09:00").unwrap();
        assert_eq!(timezone_name(&tokyo).as_deref(), Some("+09:00"));
        let west = parse_timezone("-05:30").unwrap();
        assert_eq!(timezone_name(&west).as_deref(), Some("-05:30"));
        assert_eq!(
            time().timestamp().to_zoned(tokyo).hour(),
            4,
            "19:31Z is 04:31 the next day at +09:00"
        );

        for name in ["+9", "+09", "+09:60", "-0a:00", "+09:00:00"] {
            assert!(parse_timezone(name).is_err(), "{name}");
        }
        assert!(parse_timezone("Nowhere/Atlantis").is_err());
    }

    #[test]
    fn test_unknown_letters_are_literal() {
        assert_eq!(
            DatePattern::parse("yyyy 'at' HH").format(&time()),
            "2022 'at' 19"
        );
    }
}
