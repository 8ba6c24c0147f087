use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::CommandError;

// Any leap year; lets 29-02 through parsing so the year check happens at gate time.
const LEAP_PROBE_YEAR: i32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayMonth {
    pub day: u32,
    pub month: u32,
}

impl DayMonth {
    /// Parses a `DD-MM` token.
    pub fn parse(token: &str) -> Result<Self, CommandError> {
        let invalid = || CommandError::InvalidDateTime(token.to_string());

        let (day, month) = token.split_once('-').ok_or_else(invalid)?;
        let day = parse_field(day).ok_or_else(invalid)?;
        let month = parse_field(month).ok_or_else(invalid)?;

        NaiveDate::from_ymd_opt(LEAP_PROBE_YEAR, month, day).ok_or_else(invalid)?;
        Ok(Self { day, month })
    }
}

/// Deferred-until moment as written by the sender: a wall-clock time with an
/// optional day and month. The year is always the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueAt {
    pub date: Option<DayMonth>,
    pub time: NaiveTime,
}

impl DueAt {
    pub fn parse(date: Option<&str>, time: &str) -> Result<Self, CommandError> {
        let date = date.map(DayMonth::parse).transpose()?;
        let time = NaiveTime::parse_from_str(time, "%H:%M")
            .map_err(|_| CommandError::InvalidDateTime(time.to_string()))?;
        Ok(Self { date, time })
    }

    pub fn resolve(&self, now: NaiveDateTime) -> Result<NaiveDateTime, CommandError> {
        let date = match self.date {
            Some(DayMonth { day, month }) => NaiveDate::from_ymd_opt(now.year(), month, day)
                .ok_or_else(|| {
                    CommandError::InvalidDateTime(format!("{day:02}-{month:02}-{}", now.year()))
                })?,
            None => now.date(),
        };
        Ok(date.and_time(self.time))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Due,
    NotYet(NaiveDateTime),
}

pub struct ScheduleGate;

impl ScheduleGate {
    /// A command without a deferred time is always due; otherwise it is due
    /// once the resolved moment is at or before `now`.
    pub fn evaluate(
        due_at: Option<&DueAt>,
        now: NaiveDateTime,
    ) -> Result<Readiness, CommandError> {
        let Some(due_at) = due_at else {
            return Ok(Readiness::Due);
        };

        let start = due_at.resolve(now)?;
        if start > now {
            Ok(Readiness::NotYet(start))
        } else {
            Ok(Readiness::Due)
        }
    }
}

fn parse_field(raw: &str) -> Option<u32> {
    if raw.is_empty() || raw.len() > 2 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
