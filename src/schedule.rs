use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Weekday};

use crate::error::ScheduleError;

/// A weekly slot at which the batch runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    pub day: Weekday,
    pub at: NaiveTime,
}

impl WeeklySchedule {
    pub fn new(day: Weekday, at: NaiveTime) -> Self {
        Self { day, at }
    }

    /// Parse a day name (`friday`, `fri`) and a `HH:MM` time
    pub fn parse(day: &str, at: &str) -> Result<Self, ScheduleError> {
        let day = day
            .trim()
            .parse::<Weekday>()
            .map_err(|_| ScheduleError::InvalidDay(day.to_string()))?;
        let at = NaiveTime::parse_from_str(at.trim(), "%H:%M").map_err(|source| {
            ScheduleError::InvalidTime {
                value: at.to_string(),
                source,
            }
        })?;
        Ok(Self { day, at })
    }

    /// First slot strictly after `now`
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let days_ahead = (7 + self.day.num_days_from_monday() as i64
            - now.weekday().num_days_from_monday() as i64)
            % 7;
        let candidate = (now.date() + Duration::days(days_ahead)).and_time(self.at);
        if candidate > now {
            candidate
        } else {
            candidate + Duration::days(7)
        }
    }
}

impl Default for WeeklySchedule {
    fn default() -> Self {
        Self {
            day: Weekday::Fri,
            at: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
        }
    }
}
