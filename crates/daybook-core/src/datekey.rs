//! Calendar-day keys and the small amount of date arithmetic the calendar
//! views need. Everything here works on naive local dates; no conversion to
//! UTC ever happens on the way to a key.

use std::sync::OnceLock;

use chrono::{
  DateTime,
  Datelike,
  Duration,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  TimeZone,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;

const DATE_KEY_FORMAT: &str =
  "%Y-%m-%d";
const TIME_KEY_FORMAT: &str = "%H:%M";

fn date_key_re() -> Option<&'static Regex>
{
  static DATE_KEY_RE: OnceLock<
    Option<Regex>
  > = OnceLock::new();
  DATE_KEY_RE
    .get_or_init(|| {
      Regex::new(
        r"^\d{4}-\d{2}-\d{2}$"
      )
      .ok()
    })
    .as_ref()
}

fn time_key_re() -> Option<&'static Regex>
{
  static TIME_KEY_RE: OnceLock<
    Option<Regex>
  > = OnceLock::new();
  TIME_KEY_RE
    .get_or_init(|| {
      Regex::new(r"^\d{2}:\d{2}$").ok()
    })
    .as_ref()
}

#[must_use]
pub fn to_key(date: NaiveDate) -> String {
  date
    .format(DATE_KEY_FORMAT)
    .to_string()
}

/// Keys an instant by its local calendar fields in the instant's own zone.
#[must_use]
pub fn to_key_local<Z: TimeZone>(
  dt: &DateTime<Z>
) -> String {
  to_key(dt.date_naive())
}

/// Parses a `YYYY-MM-DD` key. Anything that is not exactly 4-2-2 ASCII
/// digits, or names a day that does not exist, yields `None`.
pub fn from_key(
  raw: &str
) -> Option<NaiveDate> {
  let raw = raw.trim();
  if !date_key_re()?.is_match(raw) {
    return None;
  }
  NaiveDate::parse_from_str(
    raw,
    DATE_KEY_FORMAT
  )
  .ok()
}

/// Local midnight of the keyed day.
pub fn from_key_midnight(
  raw: &str
) -> Option<NaiveDateTime> {
  from_key(raw)
    .map(|date| date.and_time(NaiveTime::MIN))
}

#[must_use]
pub fn to_time_key(
  time: NaiveTime
) -> String {
  time
    .format(TIME_KEY_FORMAT)
    .to_string()
}

/// Parses a 24-hour `HH:MM` key.
pub fn parse_time_key(
  raw: &str
) -> Option<NaiveTime> {
  let raw = raw.trim();
  if !time_key_re()?.is_match(raw) {
    return None;
  }
  NaiveTime::parse_from_str(
    raw,
    TIME_KEY_FORMAT
  )
  .ok()
}

#[must_use]
pub fn today_in(
  now: DateTime<Utc>,
  timezone: &Tz
) -> NaiveDate {
  now
    .with_timezone(timezone)
    .date_naive()
}

/// `date` moved by `days`, or `None` once the result leaves chrono's range.
#[must_use]
pub fn checked_add_days(
  date: NaiveDate,
  days: i64
) -> Option<NaiveDate> {
  date.checked_add_signed(
    Duration::try_days(days)?
  )
}

/// Small fixed offsets inside the calendar; stays on `date` at the edge of
/// the representable range.
pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  checked_add_days(date, days)
    .unwrap_or(date)
}

/// Sunday-anchored seven-day window containing `date`, inclusive on both
/// ends. Range queries (weekly totals, the week grid) use this one.
#[must_use]
pub fn week_range(
  date: NaiveDate
) -> (NaiveDate, NaiveDate) {
  let offset = date
    .weekday()
    .num_days_from_sunday()
    as i64;
  let start = add_days(date, -offset);
  (start, add_days(start, 6))
}

/// Monday of the week containing `date`; a Sunday maps back six days.
/// Not interchangeable with [`week_range`].
#[must_use]
pub fn start_of_week(
  date: NaiveDate
) -> NaiveDate {
  let offset = date
    .weekday()
    .num_days_from_monday()
    as i64;
  add_days(date, -offset)
}

pub fn first_day_of_month(
  year: i32,
  month: u32
) -> Option<NaiveDate> {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
}

/// Number of days in the month, or 0 when `month` is out of range.
#[must_use]
pub fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  let Some(first) =
    first_day_of_month(year, month)
  else {
    return 0;
  };
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  match first_day_of_month(
    next_year, next_month
  ) {
    | Some(next) => {
      (next - first).num_days() as u32
    }
    | None => 31
  }
}

/// Cells of a Sunday-first month grid: one `None` per weekday before the
/// 1st, then every day of the month.
#[must_use]
pub fn month_grid(
  year: i32,
  month: u32
) -> Vec<Option<NaiveDate>> {
  let Some(first) =
    first_day_of_month(year, month)
  else {
    return vec![];
  };
  let padding = first
    .weekday()
    .num_days_from_sunday()
    as usize;
  let mut cells =
    vec![None; padding];
  cells.extend(
    (1..=days_in_month(year, month))
      .filter_map(|day| {
        NaiveDate::from_ymd_opt(
          year, month, day
        )
      })
      .map(Some)
  );
  cells
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum ViewMode {
  Day,
  Week,
  Month
}

impl ViewMode {
  pub fn from_key(
    raw: &str
  ) -> Option<Self> {
    match raw
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "day" => Some(Self::Day),
      | "week" => Some(Self::Week),
      | "month" => Some(Self::Month),
      | _ => None
    }
  }

  pub fn as_key(&self) -> &'static str {
    match self {
      | Self::Day => "day",
      | Self::Week => "week",
      | Self::Month => "month"
    }
  }
}

/// Moves the calendar focus by `step` views (negative steps go back).
/// `None` when the target falls outside the representable dates.
#[must_use]
pub fn shift_focus(
  current: NaiveDate,
  view: ViewMode,
  step: i64
) -> Option<NaiveDate> {
  match view {
    | ViewMode::Day => {
      checked_add_days(current, step)
    }
    | ViewMode::Week => {
      checked_add_days(
        current,
        step.checked_mul(7)?
      )
    }
    | ViewMode::Month => {
      shift_months(current, step)
    }
  }
}

fn shift_months(
  date: NaiveDate,
  months: i64
) -> Option<NaiveDate> {
  let total = i64::from(date.year())
    .checked_mul(12)?
    .checked_add(i64::from(date.month0()))?
    .checked_add(months)?;
  let year =
    i32::try_from(total.div_euclid(12))
      .ok()?;
  let month =
    total.rem_euclid(12) as u32 + 1;
  let day = date
    .day()
    .min(days_in_month(year, month));
  NaiveDate::from_ymd_opt(
    year, month, day
  )
}

pub fn weekday_label(
  day: Weekday
) -> &'static str {
  match day {
    | Weekday::Sun => "Sun",
    | Weekday::Mon => "Mon",
    | Weekday::Tue => "Tue",
    | Weekday::Wed => "Wed",
    | Weekday::Thu => "Thu",
    | Weekday::Fri => "Fri",
    | Weekday::Sat => "Sat"
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    FixedOffset,
    TimeZone
  };

  use super::*;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn key_roundtrips_for_every_day_of_a_leap_year() {
    let mut day = date(2024, 1, 1);
    while day.year() == 2024 {
      let key = to_key(day);
      assert_eq!(from_key(&key), Some(day));
      assert_eq!(
        from_key(&key).map(to_key),
        Some(key)
      );
      day = add_days(day, 1);
    }
  }

  #[test]
  fn local_key_ignores_utc_offset() {
    let plus_nine =
      FixedOffset::east_opt(9 * 3600)
        .expect("valid offset");
    let early = plus_nine
      .with_ymd_and_hms(
        2024, 1, 5, 0, 30, 0
      )
      .single()
      .expect("valid instant");
    assert_eq!(
      to_key_local(&early),
      "2024-01-05"
    );

    let minus_eight =
      FixedOffset::west_opt(8 * 3600)
        .expect("valid offset");
    let late = minus_eight
      .with_ymd_and_hms(
        2024, 1, 5, 23, 45, 0
      )
      .single()
      .expect("valid instant");
    assert_eq!(
      to_key_local(&late),
      "2024-01-05"
    );
  }

  #[test]
  fn malformed_keys_are_absent() {
    for raw in [
      "",
      "2024-1-05",
      "2024/01/05",
      "20240105",
      "2024-02-30",
      "+2024-01-05",
      "2024-01-05T00:00"
    ] {
      assert_eq!(
        from_key(raw),
        None,
        "{raw}"
      );
    }
    assert_eq!(parse_time_key("9:00"), None);
    assert_eq!(parse_time_key("24:00"), None);
    assert_eq!(
      parse_time_key("09:05"),
      NaiveTime::from_hms_opt(9, 5, 0)
    );
    assert_eq!(
      from_key_midnight("2024-01-05"),
      Some(
        date(2024, 1, 5)
          .and_time(NaiveTime::MIN)
      )
    );
  }

  #[test]
  fn week_conventions_stay_distinct() {
    // Wednesday 2024-06-12.
    let wed = date(2024, 6, 12);
    assert_eq!(
      week_range(wed),
      (date(2024, 6, 9), date(2024, 6, 15))
    );
    assert_eq!(
      start_of_week(wed),
      date(2024, 6, 10)
    );

    let sun = date(2024, 6, 16);
    assert_eq!(week_range(sun).0, sun);
    assert_eq!(
      start_of_week(sun),
      date(2024, 6, 10)
    );
  }

  #[test]
  fn month_helpers() {
    assert_eq!(days_in_month(2024, 2), 29);
    assert_eq!(days_in_month(2023, 2), 28);
    assert_eq!(days_in_month(2024, 12), 31);
    assert_eq!(days_in_month(2024, 13), 0);

    // June 2024 starts on a Saturday.
    let grid = month_grid(2024, 6);
    assert_eq!(grid.len(), 6 + 30);
    assert!(grid[..6].iter().all(Option::is_none));
    assert_eq!(grid[6], Some(date(2024, 6, 1)));
  }

  #[test]
  fn shifting_months_clamps_the_day() {
    assert_eq!(
      shift_focus(
        date(2024, 1, 31),
        ViewMode::Month,
        1
      ),
      Some(date(2024, 2, 29))
    );
    assert_eq!(
      shift_focus(
        date(2024, 1, 15),
        ViewMode::Month,
        -1
      ),
      Some(date(2023, 12, 15))
    );
    assert_eq!(
      shift_focus(
        date(2024, 1, 1),
        ViewMode::Week,
        -1
      ),
      Some(date(2023, 12, 25))
    );
    assert_eq!(
      shift_focus(
        date(2024, 3, 10),
        ViewMode::Month,
        -27
      ),
      Some(date(2021, 12, 10))
    );
  }

  #[test]
  fn huge_steps_leave_the_calendar_instead_of_panicking() {
    let start = date(2024, 1, 1);
    assert_eq!(
      shift_focus(
        start,
        ViewMode::Day,
        200_000_000_000
      ),
      None
    );
    assert_eq!(
      shift_focus(
        start,
        ViewMode::Week,
        i64::MAX
      ),
      None
    );
    assert_eq!(
      shift_focus(
        start,
        ViewMode::Month,
        4_294_967_297
      ),
      None
    );
    assert_eq!(
      shift_focus(
        start,
        ViewMode::Month,
        i64::MIN
      ),
      None
    );
    assert_eq!(
      checked_add_days(start, i64::MAX),
      None
    );
    assert_eq!(
      add_days(start, i64::MIN),
      start
    );
  }
}
