use chrono::{
  NaiveDate,
  NaiveTime
};
use tracing::trace;

use crate::interval::Interval;
use crate::model::Task;

/// Whether the task occupies any time on `day`. Unscheduled tasks are
/// never visible; tasks running past midnight show on every day they touch.
/// A zero-length task counts as visible on the day holding its instant,
/// even at exactly 00:00 where the plain overlap test would reject it.
pub fn is_visible_on(
  task: &Task,
  day: NaiveDate
) -> bool {
  Interval::for_task(task).is_some_and(
    |interval| interval.overlaps_day(day)
  )
}

/// Tasks visible on `day`, ordered by start time. All-day tasks sort as
/// midnight; ties keep their input order.
#[tracing::instrument(skip(tasks), fields(total = tasks.len()))]
pub fn tasks_on(
  tasks: &[Task],
  day: NaiveDate
) -> Vec<&Task> {
  let mut visible = tasks
    .iter()
    .filter(|task| {
      is_visible_on(task, day)
    })
    .collect::<Vec<_>>();
  visible.sort_by_key(|task| {
    task
      .schedule
      .time()
      .unwrap_or(NaiveTime::MIN)
  });
  trace!(
    visible = visible.len(),
    "resolved tasks for day"
  );
  visible
}

/// Tasks due on `day`, whether or not they are scheduled at all.
pub fn deadlines_on(
  tasks: &[Task],
  day: NaiveDate
) -> Vec<&Task> {
  tasks
    .iter()
    .filter(|task| {
      task
        .deadline
        .is_some_and(|due| due.date == day)
    })
    .collect()
}

/// Splits a day's tasks into the all-day bucket and the timed grid.
pub fn split_all_day<'a>(
  tasks: &[&'a Task]
) -> (Vec<&'a Task>, Vec<&'a Task>) {
  tasks.iter().copied().partition(
    |task| task.schedule.time().is_none()
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{
    Deadline,
    Priority,
    Schedule
  };

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  fn task(
    title: &str,
    schedule: Schedule,
    minutes: u32
  ) -> Task {
    let mut task = Task::new(
      title.to_string(),
      minutes,
      Priority::Medium,
      "#3b82f6".to_string()
    );
    task.schedule = schedule;
    task
  }

  fn timed(
    d: NaiveDate,
    h: u32,
    m: u32
  ) -> Schedule {
    Schedule::Timed {
      date: d,
      time: NaiveTime::from_hms_opt(
        h, m, 0
      )
      .expect("valid time")
    }
  }

  #[test]
  fn overnight_task_shows_on_both_days() {
    let start = date(2024, 6, 10);
    let t = task(
      "late shift",
      timed(start, 23, 30),
      90
    );
    assert!(!is_visible_on(&t, date(2024, 6, 9)));
    assert!(is_visible_on(&t, date(2024, 6, 10)));
    assert!(is_visible_on(&t, date(2024, 6, 11)));
    assert!(!is_visible_on(&t, date(2024, 6, 12)));
  }

  #[test]
  fn zero_duration_task_shows_on_one_day() {
    let day = date(2024, 3, 1);
    let noon =
      task("ping", timed(day, 12, 0), 0);
    assert!(is_visible_on(&noon, day));
    assert!(!is_visible_on(&noon, date(2024, 2, 29)));
    assert!(!is_visible_on(&noon, date(2024, 3, 2)));

    let midnight = task(
      "all day marker",
      Schedule::AllDay {
        date: day
      },
      0
    );
    assert!(is_visible_on(&midnight, day));
    assert!(!is_visible_on(&midnight, date(2024, 2, 29)));
  }

  #[test]
  fn task_ending_at_midnight_stays_on_its_day() {
    let day = date(2024, 3, 1);
    let t =
      task("evening", timed(day, 23, 0), 60);
    assert!(is_visible_on(&t, day));
    assert!(!is_visible_on(&t, date(2024, 3, 2)));
  }

  #[test]
  fn unscheduled_task_is_never_visible() {
    let t = task(
      "someday",
      Schedule::Unscheduled,
      30
    );
    assert!(!is_visible_on(&t, date(2024, 3, 1)));
  }

  #[test]
  fn day_listing_orders_by_start_and_keeps_ties() {
    let day = date(2024, 5, 1);
    let tasks = vec![
      task("b-nine", timed(day, 9, 0), 30),
      task(
        "all-day",
        Schedule::AllDay {
          date: day
        },
        30
      ),
      task("a-seven", timed(day, 7, 0), 30),
      task("c-nine", timed(day, 9, 0), 30),
      task("midnight", timed(day, 0, 0), 30),
    ];
    let titles = tasks_on(&tasks, day)
      .into_iter()
      .map(|t| t.title.as_str())
      .collect::<Vec<_>>();
    assert_eq!(
      titles,
      vec![
        "all-day", "midnight", "a-seven",
        "b-nine", "c-nine"
      ]
    );

    let listed = tasks_on(&tasks, day);
    let (all_day, timed_tasks) =
      split_all_day(&listed);
    assert_eq!(all_day.len(), 1);
    assert_eq!(timed_tasks.len(), 4);
  }

  #[test]
  fn deadlines_ignore_the_schedule() {
    let due = date(2024, 5, 3);
    let mut scheduled_elsewhere = task(
      "report",
      timed(date(2024, 5, 1), 9, 0),
      60
    );
    scheduled_elsewhere.deadline =
      Some(Deadline {
        date: due,
        time: None
      });
    let mut floating = task(
      "taxes",
      Schedule::Unscheduled,
      60
    );
    floating.deadline = Some(Deadline {
      date: due,
      time: NaiveTime::from_hms_opt(
        17, 0, 0
      )
    });
    let tasks =
      vec![scheduled_elsewhere, floating];

    assert_eq!(deadlines_on(&tasks, due).len(), 2);
    assert!(deadlines_on(&tasks, date(2024, 5, 1)).is_empty());
    assert_eq!(tasks_on(&tasks, due).len(), 0);
  }
}
