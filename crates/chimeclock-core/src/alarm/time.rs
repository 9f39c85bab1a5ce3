use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::AlarmInputError;

/// A time of day at minute resolution.
///
/// Values built with [`AlarmTime::new`] are not range-checked; an alarm set
/// for 25:70 is legal and simply never matches. The string parser is strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlarmTime {
    pub hour: u8,
    pub minute: u8,
}

impl AlarmTime {
    pub const MIDNIGHT: AlarmTime = AlarmTime { hour: 0, minute: 0 };

    pub const fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    /// The hour and minute of a wall-clock timestamp.
    pub fn of(now: NaiveDateTime) -> Self {
        Self {
            hour: now.hour() as u8,
            minute: now.minute() as u8,
        }
    }

    /// Parse `"HH:MM"` (a single-digit hour is accepted).
    ///
    /// # Errors
    ///
    /// [`AlarmInputError::Empty`] for blank input, [`AlarmInputError::Malformed`]
    /// for anything that is not a valid time of day.
    pub fn parse(input: &str) -> Result<Self, AlarmInputError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AlarmInputError::Empty);
        }
        let malformed = || AlarmInputError::Malformed(trimmed.to_string());

        let (h, m) = trimmed.split_once(':').ok_or_else(malformed)?;
        let digits = |s: &str, max_len: usize| {
            !s.is_empty() && s.len() <= max_len && s.bytes().all(|b| b.is_ascii_digit())
        };
        if !digits(h, 2) || !digits(m, 2) || m.len() != 2 {
            return Err(malformed());
        }

        let hour: u8 = h.parse().map_err(|_| malformed())?;
        let minute: u8 = m.parse().map_err(|_| malformed())?;
        if hour > 23 || minute > 59 {
            return Err(malformed());
        }
        Ok(Self { hour, minute })
    }
}

impl FromStr for AlarmTime {
    type Err = AlarmInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_padded_and_short_hours() {
        assert_eq!(AlarmTime::parse("07:30").unwrap(), AlarmTime::new(7, 30));
        assert_eq!(AlarmTime::parse("7:05").unwrap(), AlarmTime::new(7, 5));
        assert_eq!(AlarmTime::parse(" 23:59 ").unwrap(), AlarmTime::new(23, 59));
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(AlarmTime::parse(""), Err(AlarmInputError::Empty));
        assert_eq!(AlarmTime::parse("   "), Err(AlarmInputError::Empty));
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        for bad in ["24:00", "12:60", "7:5", "0730", "ab:cd", "1:2:3", "-1:30", "123:00"] {
            assert!(
                matches!(AlarmTime::parse(bad), Err(AlarmInputError::Malformed(_))),
                "accepted {bad}"
            );
        }
    }

    #[test]
    fn display_is_zero_padded() {
        assert_eq!(AlarmTime::new(7, 5).to_string(), "07:05");
        assert_eq!(AlarmTime::MIDNIGHT.to_string(), "00:00");
    }

    #[test]
    fn of_truncates_to_minute() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(7, 30, 45)
            .unwrap();
        assert_eq!(AlarmTime::of(now), AlarmTime::new(7, 30));
    }
}
