//! Calendar arithmetic in the user's chosen timezone.
//!
//! Nothing here holds state: every function takes the instant (`now`) and
//! the [`Zone`] explicitly, so "today" flips exactly at local midnight of
//! the configured zone regardless of the device's own timezone.
//!
//! Dates are carried as [`NaiveDate`] and rendered as `YYYY-MM-DD` keys.

use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// First day of the week used by week views and month grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    /// Days between `date` and the start of its week.
    fn offset_of(self, date: NaiveDate) -> i64 {
        let weekday = date.weekday();
        match self {
            WeekStart::Monday => weekday.num_days_from_monday() as i64,
            WeekStart::Sunday => weekday.num_days_from_sunday() as i64,
        }
    }
}

/// A timezone the civil calendar is computed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// An IANA zone such as `Europe/Berlin`.
    Named(Tz),
    /// Whatever zone the host is configured with.
    System,
}

/// Outcome of resolving a configured timezone name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneResolution {
    pub zone: Zone,
    /// True when the name was not a known zone and the system zone is used instead.
    pub fell_back: bool,
}

/// Resolve a timezone name; unknown names fall back to the system zone.
///
/// An empty name selects the system zone without counting as a fallback.
pub fn resolve_zone(name: &str) -> ZoneResolution {
    let name = name.trim();
    if name.is_empty() {
        return ZoneResolution {
            zone: Zone::System,
            fell_back: false,
        };
    }
    match name.parse::<Tz>() {
        Ok(tz) => ZoneResolution {
            zone: Zone::Named(tz),
            fell_back: false,
        },
        Err(_) => {
            log::warn!("unknown timezone '{name}', using system timezone");
            ZoneResolution {
                zone: Zone::System,
                fell_back: true,
            }
        }
    }
}

impl Zone {
    /// Civil date of `instant` in this zone.
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            Zone::Named(tz) => instant.with_timezone(tz).date_naive(),
            Zone::System => instant.with_timezone(&chrono::Local).date_naive(),
        }
    }

    /// The instant local midnight begins `date` in this zone.
    pub fn day_start(&self, date: NaiveDate) -> DateTime<Utc> {
        match self {
            Zone::Named(tz) => local_midnight(tz, date),
            Zone::System => local_midnight(&chrono::Local, date),
        }
    }

    /// The instant `date` ends, i.e. the start of the following day.
    pub fn day_end(&self, date: NaiveDate) -> DateTime<Utc> {
        match date.succ_opt() {
            Some(next) => self.day_start(next),
            None => DateTime::<Utc>::MAX_UTC,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Zone::Named(tz) => tz.name().to_string(),
            Zone::System => "system".to_string(),
        }
    }
}

fn local_midnight<T: TimeZone>(tz: &T, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // Midnight falls into a DST gap: the day begins at the first valid local time.
        LocalResult::None => (1..=3)
            .find_map(|h| tz.from_local_datetime(&(midnight + Duration::hours(h))).earliest())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight)),
    }
}

/// `YYYY-MM-DD` key for a date.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` key.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d").ok()
}

/// Today's date in `zone`.
pub fn today(now: DateTime<Utc>, zone: Zone) -> NaiveDate {
    zone.date_of(now)
}

/// Longest window [`last_n_days`] returns: one hundred years.
pub const MAX_WINDOW_DAYS: usize = 36_600;

/// `date` moved by `days`, saturating at the representable range.
fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(magnitude).unwrap_or(NaiveDate::MAX)
    } else {
        date.checked_sub_days(magnitude).unwrap_or(NaiveDate::MIN)
    }
}

/// The seven dates of the week containing today shifted by `offset` weeks.
///
/// Offsets past the calendar's range saturate at its first or last week.
pub fn week_days(
    now: DateTime<Utc>,
    zone: Zone,
    offset: i32,
    week_start: WeekStart,
) -> [NaiveDate; 7] {
    let anchor = shift_days(today(now, zone), offset as i64 * 7);
    let start = shift_days(anchor, -week_start.offset_of(anchor));
    std::array::from_fn(|i| shift_days(start, i as i64))
}

/// The `n` dates ending at and including today, oldest first.
///
/// `n` is capped at [`MAX_WINDOW_DAYS`] and the window stops at the first
/// representable date.
pub fn last_n_days(now: DateTime<Utc>, zone: Zone, n: usize) -> Vec<NaiveDate> {
    let end = today(now, zone);
    (0..n.min(MAX_WINDOW_DAYS) as u64)
        .rev()
        .filter_map(|back| end.checked_sub_days(Days::new(back)))
        .collect()
}

/// One cell of a month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub day_of_month: u32,
    pub is_current_month: bool,
}

/// Seven-column grid covering `month` of `year` in whole weeks.
///
/// Leading and trailing cells come from the adjacent months. An invalid
/// month yields an empty grid.
pub fn month_calendar(year: i32, month: u32, week_start: WeekStart) -> Vec<CalendarDay> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let days_in_month = match next_first {
        Some(next) => (next - first).num_days(),
        None => 31,
    };

    let leading = week_start.offset_of(first);
    let cells = (leading + days_in_month + 6) / 7 * 7;
    let grid_start = shift_days(first, -leading);

    (0..cells)
        .filter_map(|i| grid_start.checked_add_days(Days::new(i as u64)))
        .map(|date| {
            CalendarDay {
                date,
                day_of_month: date.day(),
                is_current_month: date.month() == month && date.year() == year,
            }
        })
        .collect()
}
