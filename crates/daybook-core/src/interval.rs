use chrono::{
  Duration,
  NaiveDate,
  NaiveDateTime,
  NaiveTime
};

use crate::datekey::to_time_key;
use crate::model::{
  Schedule,
  Task
};

pub const MINUTES_PER_DAY: u32 = 1440;

/// Half-open span `[start, end)` on the local wall clock.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct Interval {
  pub start: NaiveDateTime,
  pub end:   NaiveDateTime
}

/// Minute offsets of an interval clipped to one calendar day.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct DaySegment {
  pub start_minute: u32,
  pub end_minute:   u32
}

impl DaySegment {
  pub fn length_minutes(&self) -> u32 {
    self
      .end_minute
      .saturating_sub(self.start_minute)
  }
}

/// Inclusive bounds of a calendar day: midnight through 23:59:59.999.
#[must_use]
pub fn day_bounds(
  day: NaiveDate
) -> (NaiveDateTime, NaiveDateTime) {
  let end_of_day =
    NaiveTime::from_hms_milli_opt(
      23, 59, 59, 999
    )
    .unwrap_or(NaiveTime::MIN);
  (
    day.and_time(NaiveTime::MIN),
    day.and_time(end_of_day)
  )
}

/// Resolves a schedule to a concrete interval. Without a date there is
/// nothing to resolve. A missing time means midnight, and a zero or
/// negative duration collapses the interval to its start.
pub fn resolve(
  date: Option<NaiveDate>,
  time: Option<NaiveTime>,
  duration_minutes: i64
) -> Option<Interval> {
  let date = date?;
  let start = date.and_time(
    time.unwrap_or(NaiveTime::MIN)
  );
  let length = Duration::try_minutes(
    duration_minutes.max(0)
  )?;
  let end =
    start.checked_add_signed(length)?;
  Some(Interval {
    start,
    end
  })
}

impl Interval {
  pub fn for_task(
    task: &Task
  ) -> Option<Self> {
    let minutes =
      i64::from(task.duration_minutes);
    match task.schedule {
      | Schedule::Unscheduled => None,
      | Schedule::AllDay {
        date
      } => resolve(Some(date), None, minutes),
      | Schedule::Timed {
        date,
        time
      } => {
        resolve(
          Some(date),
          Some(time),
          minutes
        )
      }
    }
  }

  pub fn is_instant(&self) -> bool {
    self.start == self.end
  }

  /// Whether the interval occupies any part of `day`. A zero-length
  /// interval belongs to the day its instant falls on, midnight included.
  pub fn overlaps_day(
    &self,
    day: NaiveDate
  ) -> bool {
    let (day_start, day_end) =
      day_bounds(day);
    if self.is_instant() {
      return self.start >= day_start
        && self.start <= day_end;
    }
    self.start < day_end
      && self.end > day_start
  }

  /// Clips the interval to `day` for placement on a 24-hour grid.
  pub fn day_segment(
    &self,
    day: NaiveDate
  ) -> Option<DaySegment> {
    if !self.overlaps_day(day) {
      return None;
    }
    let (day_start, _) =
      day_bounds(day);
    let clip = |at: NaiveDateTime| {
      (at - day_start)
        .num_minutes()
        .clamp(
          0,
          i64::from(MINUTES_PER_DAY)
        ) as u32
    };
    Some(DaySegment {
      start_minute: clip(self.start),
      end_minute:   clip(self.end)
    })
  }

  pub fn start_time_key(&self) -> String {
    to_time_key(self.start.time())
  }

  pub fn end_time_key(&self) -> String {
    to_time_key(self.end.time())
  }
}
