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

use jiff::Timestamp;
use jiff::ToSpan;
use jiff::Zoned;
use serde::Deserialize;
use serde::Serialize;

/// The time boundary at which a rolling file rolls over.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    /// Roll over at the start of every minute.
    Minutely,
    /// Roll over at the start of every hour.
    Hourly,
    /// Roll over at midnight.
    Daily,
    /// No time-based roll over.
    #[default]
    Never,
}

impl Rotation {
    /// The first boundary strictly after `current`, `None` for [`Rotation::Never`].
    pub(crate) fn next_rollover(&self, current: &Zoned) -> Option<Timestamp> {
        let next = match *self {
            Rotation::Minutely => current
                .checked_add(1.minute())
                .and_then(|next| next.with().second(0).subsec_nanosecond(0).build()),
            Rotation::Hourly => current.checked_add(1.hour()).and_then(|next| {
                next.with()
                    .minute(0)
                    .second(0)
                    .subsec_nanosecond(0)
                    .build()
            }),
            Rotation::Daily => current.tomorrow().and_then(|next| next.start_of_day()),
            Rotation::Never => return None,
        };

        next.ok().map(|next| next.timestamp())
    }
}
