//! Calendar-month windows in UTC.

use chrono::{DateTime, NaiveDate, Utc};

/// Half-open interval `[start, end)` covering one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub year: i32,
    pub month: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MonthWindow {
    /// Window for `year`/`month`, or `None` if the date is not representable.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = if month == 12 {
            NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            year,
            month,
            start: start.and_hms_opt(0, 0, 0)?.and_utc(),
            end: end.and_hms_opt(0, 0, 0)?.and_utc(),
        })
    }

    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// The `before` cursor sent to the search endpoint: the first second of the next month.
    #[must_use]
    pub fn before_cursor(&self) -> i64 {
        self.end.timestamp()
    }

    #[must_use]
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// The twelve month windows of `year`, January first.
///
/// Returns an empty `Vec` for years chrono cannot represent.
#[must_use]
pub fn month_windows(year: i32) -> Vec<MonthWindow> {
    (1..=12)
        .map_while(|month| MonthWindow::new(year, month))
        .collect()
}

/// Convert fractional Unix seconds into a UTC instant.
#[must_use]
pub(crate) fn from_unix_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let nanos = ((seconds - whole) * 1_000_000_000.0) as u32;
    #[allow(clippy::cast_possible_truncation)]
    let secs = whole as i64;
    DateTime::from_timestamp(secs, nanos.min(999_999_999))
}
