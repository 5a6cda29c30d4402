/**
 * LatentReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::time::Duration;

pub fn to_millis(duration: Duration) -> u64 {
    (duration.as_secs() * 1_000) + u64::from(duration.subsec_millis())
}

/// Line of a record in its input, or 0 if the reader did not track it.
pub fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map(|position| position.line()).unwrap_or(0)
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn millis_include_seconds() {
        assert_eq!(to_millis(Duration::from_millis(2_345)), 2_345);
        assert_eq!(to_millis(Duration::new(1, 999_999)), 1_000);
    }
}
