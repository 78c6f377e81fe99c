//! Weekly window selection

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::{
    error::{AppError, AppResult},
    models::visitor::VisitorRecord,
};

/// Half-open interval `[monday 00:00, next monday 00:00)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl WeekWindow {
    /// The week containing `day`. Fails when the week runs past the
    /// calendar range chrono can represent.
    pub fn containing(day: NaiveDate) -> AppResult<Self> {
        let out_of_range = || AppError::BadRequest(format!("Week out of range: {}", day));

        let monday = day
            .checked_sub_signed(Duration::days(i64::from(
                day.weekday().num_days_from_monday(),
            )))
            .ok_or_else(out_of_range)?;
        let start = monday.and_time(NaiveTime::default());
        let end = start
            .checked_add_signed(Duration::days(7))
            .ok_or_else(out_of_range)?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at < self.end
    }

    /// Keep the records arriving inside the window, oldest first
    pub fn select(&self, records: Vec<VisitorRecord>) -> Vec<VisitorRecord> {
        let mut selected: Vec<_> = records
            .into_iter()
            .filter(|r| self.contains(r.arrival))
            .collect();
        selected.sort_by_key(|r| r.arrival);
        selected
    }

    /// Report title; the end date is the exclusive bound
    pub fn title(&self) -> String {
        format!(
            "Registre de la semaine du {} au {}",
            self.start.date(),
            self.end.date()
        )
    }
}
