use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use crate::datekey::{from_key, parse_time_key};
use crate::model::{Schedule, Task};

/// Where a task was dropped: a day cell, optionally an hour slot in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub day: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl DropTarget {
    pub fn all_day(day: NaiveDate) -> Self {
        Self { day, time: None }
    }

    pub fn at(day: NaiveDate, time: NaiveTime) -> Self {
        Self {
            day,
            time: Some(time),
        }
    }

    /// Builds a target from wire keys. An empty time key means all-day; a
    /// malformed key of either kind gives no target.
    pub fn from_keys(day: &str, time: Option<&str>) -> Option<Self> {
        let day = from_key(day)?;
        match time.map(str::trim).filter(|raw| !raw.is_empty()) {
            None => Some(Self::all_day(day)),
            Some(raw) => parse_time_key(raw).map(|time| Self::at(day, time)),
        }
    }

    pub fn schedule(&self) -> Schedule {
        match self.time {
            Some(time) => Schedule::Timed {
                date: self.day,
                time,
            },
            None => Schedule::AllDay { date: self.day },
        }
    }
}

/// Moves a task to `target`. Only the schedule changes; duration, priority,
/// deadline and everything else are carried over as they are. The grid and
/// the unscheduled bucket both go through here.
pub fn apply_drop(task: &Task, target: &DropTarget) -> Task {
    debug!(id = %task.id, day = %target.day, time = ?target.time, "applying drop");
    Task {
        schedule: target.schedule(),
        ..task.clone()
    }
}

/// Sends a task back to the unscheduled bucket.
pub fn clear_schedule(task: &Task) -> Task {
    Task {
        schedule: Schedule::Unscheduled,
        ..task.clone()
    }
}

/// Looks a task up by id and drops it on `target`.
pub fn reschedule(tasks: &[Task], id: &str, target: &DropTarget) -> Option<Task> {
    tasks
        .iter()
        .find(|task| task.id == id)
        .map(|task| apply_drop(task, target))
}
