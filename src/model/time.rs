use std::fmt;

use serde::{Deserialize, Serialize};

/// Minutes in a day; `ClockTime` values are always below this.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A wall-clock time of day (`HH:MM`), stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeParseError {
    #[error("expected HH:MM, got {0:?}")]
    Format(String),
    #[error("hour out of range in {0:?}")]
    Hour(String),
    #[error("minute out of range in {0:?}")]
    Minute(String),
}

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);
    /// Last representable minute of the day
    pub const END_OF_DAY: ClockTime = ClockTime(MINUTES_PER_DAY - 1);

    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour >= 24 || minute >= 60 {
            return None;
        }
        Some(ClockTime(hour as u16 * 60 + minute as u16))
    }

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(ClockTime(minutes))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u8 {
        (self.0 / 60) as u8
    }

    pub fn minute(self) -> u8 {
        (self.0 % 60) as u8
    }

    /// Parse `HH:MM` or `H:MM`.
    pub fn parse(s: &str) -> Result<Self, TimeParseError> {
        let s = s.trim();
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| TimeParseError::Format(s.to_string()))?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(TimeParseError::Format(s.to_string()));
        }
        if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(TimeParseError::Format(s.to_string()));
        }
        let hour: u8 = h.parse().map_err(|_| TimeParseError::Format(s.to_string()))?;
        let minute: u8 = m.parse().map_err(|_| TimeParseError::Format(s.to_string()))?;
        if hour >= 24 {
            return Err(TimeParseError::Hour(s.to_string()));
        }
        if minute >= 60 {
            return Err(TimeParseError::Minute(s.to_string()));
        }
        Ok(ClockTime(hour as u16 * 60 + minute as u16))
    }

    /// Add (or subtract) minutes, wrapping around midnight.
    pub fn wrapping_add(self, delta: i32) -> Self {
        let day = MINUTES_PER_DAY as i32;
        let m = (self.0 as i32 + delta).rem_euclid(day);
        ClockTime(m as u16)
    }

    /// Add minutes, clamping at the last minute of the day.
    pub fn saturating_add(self, minutes: u32) -> Self {
        let m = (self.0 as u32 + minutes).min(Self::END_OF_DAY.0 as u32);
        ClockTime(m as u16)
    }

    /// Minutes from `self` to `later`, zero if `later` is earlier.
    pub fn minutes_until(self, later: ClockTime) -> u32 {
        later.0.saturating_sub(self.0) as u32
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.to_string()
    }
}

impl TryFrom<String> for ClockTime {
    type Error = TimeParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        ClockTime::parse(&s)
    }
}

/// Format a minute count as `45m`, `1h`, `1h30m`.
pub fn format_minutes(minutes: u32) -> String {
    let (h, m) = (minutes / 60, minutes % 60);
    match (h, m) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h{}m", h, m),
    }
}
