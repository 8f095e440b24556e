//! The time window a view asks the index for.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{NewsdeskError, NewsdeskResult};
use crate::grid::MAX_COLUMNS;

/// Longest window a view may request, one grid column per day.
pub const MAX_WINDOW_DAYS: u32 = MAX_COLUMNS as u32;

/// Days shown when no end is given.
pub const DEFAULT_WINDOW_DAYS: u32 = MAX_WINDOW_DAYS;

/// Inclusive UTC boundaries of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl Window {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> NewsdeskResult<Self> {
        if end_time <= start_time {
            return Err(NewsdeskError::InvalidWindow(format!(
                "end {} is not after start {}",
                end_time.to_rfc3339(),
                start_time.to_rfc3339()
            )));
        }

        Ok(Window {
            start_time,
            end_time,
        })
    }

    /// `days` whole calendar days starting at `from`, in the display zone.
    ///
    /// Runs from the first instant of `from` to the last millisecond of the
    /// final day.
    pub fn from_days(from: NaiveDate, days: u32, tz: Tz) -> NewsdeskResult<Self> {
        if days == 0 || days > MAX_WINDOW_DAYS {
            return Err(NewsdeskError::InvalidWindow(format!(
                "window must span 1 to {} days, got {}",
                MAX_WINDOW_DAYS, days
            )));
        }

        let last = from
            .checked_add_days(Days::new(u64::from(days - 1)))
            .ok_or_else(|| {
                NewsdeskError::InvalidWindow(format!("{} days from {} is out of range", days, from))
            })?;

        Window::new(start_of_day(from, tz)?, end_of_day(last, tz)?)
    }

    /// Build a window from command-line style arguments.
    /// - `from`: YYYY-MM-DD, defaults to `today`
    /// - `to`: YYYY-MM-DD, inclusive last day
    /// - `days`: number of days when `to` is not given, defaults to DEFAULT_WINDOW_DAYS
    pub fn from_args(
        from: Option<&str>,
        to: Option<&str>,
        days: Option<u32>,
        tz: Tz,
        today: NaiveDate,
    ) -> NewsdeskResult<Self> {
        let from_date = match from {
            Some(s) => parse_date(s)?,
            None => today,
        };

        let days = match to {
            Some(s) => {
                let to_date = parse_date(s)?;
                let span = (to_date - from_date).num_days() + 1;
                if span < 1 {
                    return Err(NewsdeskError::InvalidWindow(format!(
                        "end date {} is before start date {}",
                        to_date, from_date
                    )));
                }
                u32::try_from(span).unwrap_or(u32::MAX)
            }
            None => days.unwrap_or(DEFAULT_WINDOW_DAYS),
        };

        Self::from_days(from_date, days, tz)
    }

    /// Whether `t` lies inside the window, both ends included.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start_time <= t && t <= self.end_time
    }
}

/// Today's date in the display zone.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

fn parse_date(s: &str) -> NewsdeskResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        NewsdeskError::InvalidWindow(format!("Invalid date format '{}'. Expected YYYY-MM-DD", s))
    })
}

fn start_of_day(date: NaiveDate, tz: Tz) -> NewsdeskResult<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            NewsdeskError::InvalidWindow(format!("{} has no midnight in {}", date, tz.name()))
        })
}

fn end_of_day(date: NaiveDate, tz: Tz) -> NewsdeskResult<DateTime<Utc>> {
    let last_ms = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
        .ok_or_else(|| NewsdeskError::InvalidWindow("invalid end of day".into()))?;

    tz.from_local_datetime(&date.and_time(last_ms))
        .latest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            NewsdeskError::InvalidWindow(format!("{} has no end of day in {}", date, tz.name()))
        })
}
