//! Month grid shown beside the dashboard cards

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::Serialize;

pub const WEEKDAY_HEADERS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub day: u32,
    /// False for the leading and trailing days of the neighbouring months
    pub in_month: bool,
    pub today: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarWeek {
    /// ISO week number of the row's Monday
    pub number: u32,
    pub days: Vec<CalendarDay>,
}

/// One month laid out in Sunday-first rows of seven days
#[derive(Debug, Clone, Serialize)]
pub struct MonthCalendar {
    /// e.g. "October 2026"
    pub title: String,
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<CalendarWeek>,
}

impl MonthCalendar {
    /// The month of the server's local date, with today marked
    pub fn current() -> Self {
        Self::for_date(Local::now().date_naive())
    }

    pub fn for_date(today: NaiveDate) -> Self {
        let first = today - Duration::days(i64::from(today.day0()));
        let leading = first.weekday().num_days_from_sunday();
        let mut row_start = first - Duration::days(i64::from(leading));

        let mut weeks = Vec::with_capacity(6);
        while row_start <= first || row_start.month() == first.month() {
            let days = (0..7)
                .map(|offset| {
                    let date = row_start + Duration::days(offset);
                    CalendarDay {
                        day: date.day(),
                        in_month: date.month() == first.month(),
                        today: date == today,
                    }
                })
                .collect();
            let monday = row_start + Duration::days(1);
            weeks.push(CalendarWeek {
                number: monday.iso_week().week(),
                days,
            });
            row_start += Duration::days(7);
        }

        Self {
            title: first.format("%B %Y").to_string(),
            year: first.year(),
            month: first.month(),
            weeks,
        }
    }

    pub fn today(&self) -> Option<u32> {
        self.weeks
            .iter()
            .flat_map(|week| week.days.iter())
            .find(|day| day.today)
            .map(|day| day.day)
    }
}
