//! Weekly time-window restrictions.
//!
//! A restriction is a `;`-separated list of entries `D:HHMM-HHMM`, where `D`
//! is an ISO weekday (`1` = Monday .. `7` = Sunday) or `*` for every day.
//! Times are UTC and both ends are inclusive. An end earlier than the start
//! wraps past midnight into the following day.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use tracing::warn;

use crate::error::ParseError;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// One weekly time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyRestriction {
    /// Day the window starts on; `None` means every day.
    day: Option<Weekday>,
    /// Minutes after midnight.
    start: u16,
    end: u16,
}

impl DailyRestriction {
    /// Creates a window from minutes after midnight.
    pub fn new(day: Option<Weekday>, start: u16, end: u16) -> Result<Self, ParseError> {
        if start >= MINUTES_PER_DAY || end >= MINUTES_PER_DAY {
            return Err(ParseError::TimeBounds { start, end });
        }
        Ok(Self { day, start, end })
    }

    pub fn day(&self) -> Option<Weekday> {
        self.day
    }

    /// Whether the window ends on the day after it starts.
    pub fn wraps_midnight(&self) -> bool {
        self.end < self.start
    }

    /// Returns whether the given instant falls inside this window.
    pub fn applies_at(&self, at: DateTime<Utc>) -> bool {
        let weekday = at.weekday();
        let minute = (at.hour() * 60 + at.minute()) as u16;
        let on_day = |day: Weekday| self.day.is_none_or(|d| d == day);

        if !self.wraps_midnight() {
            return on_day(weekday) && (self.start..=self.end).contains(&minute);
        }

        (on_day(weekday) && minute >= self.start) || (on_day(weekday.pred()) && minute <= self.end)
    }
}

impl FromStr for DailyRestriction {
    type Err = ParseError;

    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::TimeEntry(entry.to_string());

        let (day, range) = entry.trim().split_once(':').ok_or_else(invalid)?;
        let (start, end) = range.split_once('-').ok_or_else(invalid)?;

        let day = match day.trim() {
            "*" => None,
            "1" => Some(Weekday::Mon),
            "2" => Some(Weekday::Tue),
            "3" => Some(Weekday::Wed),
            "4" => Some(Weekday::Thu),
            "5" => Some(Weekday::Fri),
            "6" => Some(Weekday::Sat),
            "7" => Some(Weekday::Sun),
            _ => return Err(invalid()),
        };

        let start = parse_hhmm(start.trim()).ok_or_else(invalid)?;
        let end = parse_hhmm(end.trim()).ok_or_else(invalid)?;

        Self::new(day, start, end)
    }
}

impl fmt::Display for DailyRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.day {
            Some(day) => write!(f, "{}", day.number_from_monday())?,
            None => f.write_str("*")?,
        }
        write!(
            f,
            ":{:02}{:02}-{:02}{:02}",
            self.start / 60,
            self.start % 60,
            self.end / 60,
            self.end % 60
        )
    }
}

fn parse_hhmm(text: &str) -> Option<u16> {
    if text.len() != 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: u16 = text[..2].parse().ok()?;
    let minutes: u16 = text[2..].parse().ok()?;
    (hours < 24 && minutes < 60).then_some(hours * 60 + minutes)
}

/// Parses a restriction list, skipping (and logging) malformed entries.
pub fn parse_time_restrictions(text: &str) -> Vec<DailyRestriction> {
    text.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse() {
            Ok(restriction) => Some(restriction),
            Err(err) => {
                warn!(error = %err, "Ignoring malformed time restriction");
                None
            }
        })
        .collect()
}
