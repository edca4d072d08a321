//! What a single calendar cell shows: the tasks occupying the day, the
//! deadlines falling on it, and the money spent against the daily tier.

use chrono::{Datelike, NaiveDate};

use crate::aggregate::{expenses_on, is_over_budget, sum_amounts};
use crate::datekey::{add_days, month_grid, week_range};
use crate::model::{Expense, Snapshot, Task};
use crate::visibility::{deadlines_on, tasks_on};

#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary<'a> {
    pub day: NaiveDate,
    pub tasks: Vec<&'a Task>,
    pub deadlines: Vec<&'a Task>,
    pub expenses: Vec<&'a Expense>,
    pub total_spent: f64,
    pub over_budget: bool,
}

pub fn day_summary(snapshot: &Snapshot, day: NaiveDate) -> DaySummary<'_> {
    let expenses = expenses_on(&snapshot.expenses, day);
    let total_spent = sum_amounts(expenses.iter().copied());
    DaySummary {
        day,
        tasks: tasks_on(&snapshot.tasks, day),
        deadlines: deadlines_on(&snapshot.tasks, day),
        expenses,
        total_spent,
        over_budget: is_over_budget(total_spent, snapshot.budget.daily),
    }
}

/// Summaries for the Sunday-anchored week containing `day`.
pub fn week_summaries(snapshot: &Snapshot, day: NaiveDate) -> Vec<DaySummary<'_>> {
    let (start, _) = week_range(day);
    (0..7)
        .map(|offset| day_summary(snapshot, add_days(start, offset)))
        .collect()
}

/// Month grid cells with leading padding, each filled day summarised.
pub fn month_summaries(snapshot: &Snapshot, year: i32, month: u32) -> Vec<Option<DaySummary<'_>>> {
    month_grid(year, month)
        .into_iter()
        .map(|cell| cell.map(|day| day_summary(snapshot, day)))
        .collect()
}

/// Days of the focused month that have anything on them.
pub fn busy_days(snapshot: &Snapshot, focus: NaiveDate) -> Vec<DaySummary<'_>> {
    month_summaries(snapshot, focus.year(), focus.month())
        .into_iter()
        .flatten()
        .filter(|summary| {
            !summary.tasks.is_empty() || !summary.deadlines.is_empty() || !summary.expenses.is_empty()
        })
        .collect()
}
