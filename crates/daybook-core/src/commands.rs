use anyhow::{Context, anyhow};
use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::agenda::{day_summary, month_summaries, week_summaries};
use crate::aggregate::{
    BudgetTier, TierStatus, budget_report, by_category, month_expenses, monthly_total, trend_series,
};
use crate::cli::Invocation;
use crate::config::Config;
use crate::datekey::{ViewMode, add_days, from_key, parse_time_key, shift_focus, today_in};
use crate::model::{Budget, Deadline, EXPENSE_CATEGORIES, Expense, Priority, Schedule, Snapshot, Task, pick_color};
use crate::ordering::{SortKey, TaskFilter, sort_and_filter};
use crate::render::{Renderer, short_id};
use crate::schedule::{DropTarget, apply_drop, clear_schedule};
use crate::store::{Collection, DocumentStore, save_budget};

const DEFAULT_DURATION_MINUTES: u32 = 30;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add",
        "list",
        "day",
        "week",
        "month",
        "schedule",
        "unschedule",
        "done",
        "reopen",
        "delete",
        "spend",
        "expenses",
        "finance",
        "budget",
        "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(store, cfg, renderer, inv))]
pub fn dispatch<S: DocumentStore + ?Sized>(
    store: &mut S,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    let today = today_in(Utc::now(), &cfg.timezone());
    let command = inv.command.as_str();
    let args = inv.args.as_slice();

    debug!(command, args = ?args, today = %today, "dispatching command");

    match command {
        "add" => cmd_add(store, args, today),
        "list" => cmd_list(store, renderer, args, today),
        "day" => cmd_day(store, renderer, args, today),
        "week" => cmd_week(store, renderer, args, today),
        "month" => cmd_month(store, renderer, args, today),
        "schedule" => cmd_schedule(store, args, today),
        "unschedule" => cmd_unschedule(store, args),
        "done" => cmd_set_completed(store, args, true),
        "reopen" => cmd_set_completed(store, args, false),
        "delete" => cmd_delete(store, args),
        "spend" => cmd_spend(store, args, today),
        "expenses" => cmd_expenses(store, renderer, args, today),
        "finance" => cmd_finance(store, renderer, args, today),
        "budget" => cmd_budget(store, renderer, args),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[derive(Debug, Default, PartialEq)]
struct TaskArgs {
    title: String,
    duration: Option<u32>,
    priority: Option<Priority>,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    deadline: Option<NaiveDate>,
    deadline_time: Option<NaiveTime>,
    color: Option<String>,
}

fn parse_task_args(args: &[String], today: NaiveDate) -> anyhow::Result<TaskArgs> {
    let mut parsed = TaskArgs::default();
    let mut words = Vec::new();

    for arg in args {
        let Some((key, value)) = arg.split_once(':') else {
            words.push(arg.as_str());
            continue;
        };
        match key {
            "dur" | "duration" => {
                parsed.duration = Some(
                    value
                        .parse::<u32>()
                        .with_context(|| format!("invalid duration in minutes: {value}"))?,
                )
            }
            "pri" | "priority" => parsed.priority = Some(value.parse()?),
            "date" => parsed.date = Some(parse_day_arg(value, today)?),
            "time" => parsed.time = Some(parse_time_arg(value)?),
            "due" => parsed.deadline = Some(parse_day_arg(value, today)?),
            "duetime" => parsed.deadline_time = Some(parse_time_arg(value)?),
            "color" => parsed.color = Some(value.to_string()),
            _ => words.push(arg.as_str()),
        }
    }

    parsed.title = words.join(" ").trim().to_string();
    Ok(parsed)
}

#[instrument(skip(store, args))]
fn cmd_add<S: DocumentStore + ?Sized>(store: &mut S, args: &[String], today: NaiveDate) -> anyhow::Result<()> {
    info!("command add");

    let parsed = parse_task_args(args, today)?;
    if parsed.title.is_empty() {
        return Err(anyhow!("a task needs a title"));
    }

    let existing = Snapshot::load(store)?.tasks.len();
    let mut task = Task::new(
        parsed.title,
        parsed.duration.unwrap_or(DEFAULT_DURATION_MINUTES),
        parsed.priority.unwrap_or_default(),
        parsed
            .color
            .unwrap_or_else(|| pick_color(existing).to_string()),
    );
    task.schedule = match (parsed.date, parsed.time) {
        (None, None) => Schedule::Unscheduled,
        (None, Some(_)) => return Err(anyhow!("a start time needs a date")),
        (Some(date), None) => Schedule::AllDay { date },
        (Some(date), Some(time)) => Schedule::Timed { date, time },
    };
    task.deadline = match (parsed.deadline, parsed.deadline_time) {
        (None, None) => None,
        (None, Some(_)) => return Err(anyhow!("a deadline time needs a deadline date")),
        (Some(date), time) => Some(Deadline { date, time }),
    };

    let id = store.create(Collection::Tasks, task.to_fields())?;
    println!("Created task {}.", short_id(&id));
    Ok(())
}

#[instrument(skip(store, renderer, args))]
fn cmd_list<S: DocumentStore + ?Sized>(
    store: &mut S,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command list");

    let mut filter = TaskFilter::default();
    let mut sort = SortKey::default();
    for arg in args {
        let (key, value) = arg.split_once(':').unwrap_or(("", arg.as_str()));
        match key {
            "filter" => filter = value.parse()?,
            "sort" => sort = value.parse()?,
            _ => {
                if let Ok(f) = value.parse::<TaskFilter>() {
                    filter = f;
                } else {
                    sort = value
                        .parse()
                        .with_context(|| format!("expected a filter or sort key, got: {arg}"))?;
                }
            }
        }
    }

    let snapshot = Snapshot::load(store)?;
    let view = sort_and_filter(&snapshot.tasks, filter, sort);
    debug!(shown = view.len(), ?filter, ?sort, "listing tasks");
    renderer.print_task_table(&view, today)
}

#[instrument(skip(store, renderer, args))]
fn cmd_day<S: DocumentStore + ?Sized>(
    store: &mut S,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command day");
    let day = parse_focus(args, today, ViewMode::Day)?;
    let snapshot = Snapshot::load(store)?;
    let summary = day_summary(&snapshot, day);
    let report = budget_report(&snapshot.expenses, &snapshot.budget, day);
    renderer.print_day(&summary, &report)
}

#[instrument(skip(store, renderer, args))]
fn cmd_week<S: DocumentStore + ?Sized>(
    store: &mut S,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command week");
    let day = parse_focus(args, today, ViewMode::Week)?;
    let snapshot = Snapshot::load(store)?;
    let days = week_summaries(&snapshot, day);
    let report = budget_report(&snapshot.expenses, &snapshot.budget, day);
    renderer.print_week(&days, &report.weekly)
}

#[instrument(skip(store, renderer, args))]
fn cmd_month<S: DocumentStore + ?Sized>(
    store: &mut S,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command month");
    let focus = parse_focus(args, today, ViewMode::Month)?;
    let (year, month) = (focus.year(), focus.month());
    let snapshot = Snapshot::load(store)?;
    let cells = month_summaries(&snapshot, year, month);
    let monthly = TierStatus::new(
        BudgetTier::Monthly,
        &snapshot.budget,
        monthly_total(&snapshot.expenses, year, month),
    );
    renderer.print_month(&cells, &monthly)
}

#[instrument(skip(store, args))]
fn cmd_schedule<S: DocumentStore + ?Sized>(store: &mut S, args: &[String], today: NaiveDate) -> anyhow::Result<()> {
    info!("command schedule");
    let [prefix, day, rest @ ..] = args else {
        return Err(anyhow!("usage: schedule <id> <date> [HH:MM]"));
    };
    let day = parse_day_arg(day, today)?;
    let target = match rest.first() {
        Some(raw) => DropTarget::at(day, parse_time_arg(raw)?),
        None => DropTarget::all_day(day),
    };

    let snapshot = Snapshot::load(store)?;
    let task = find_by_prefix(&snapshot.tasks, prefix, |t| t.id.as_str())?;
    let moved = apply_drop(task, &target);
    store.update(Collection::Tasks, &moved.id, moved.schedule_fields())?;
    println!("Scheduled task {}.", short_id(&moved.id));
    Ok(())
}

#[instrument(skip(store, args))]
fn cmd_unschedule<S: DocumentStore + ?Sized>(store: &mut S, args: &[String]) -> anyhow::Result<()> {
    info!("command unschedule");
    let prefix = args
        .first()
        .ok_or_else(|| anyhow!("usage: unschedule <id>"))?;
    let snapshot = Snapshot::load(store)?;
    let task = find_by_prefix(&snapshot.tasks, prefix, |t| t.id.as_str())?;
    let cleared = clear_schedule(task);
    store.update(Collection::Tasks, &cleared.id, cleared.schedule_fields())?;
    println!("Unscheduled task {}.", short_id(&cleared.id));
    Ok(())
}

#[instrument(skip(store, args))]
fn cmd_set_completed<S: DocumentStore + ?Sized>(
    store: &mut S,
    args: &[String],
    completed: bool,
) -> anyhow::Result<()> {
    info!("command done/reopen");
    if args.is_empty() {
        return Err(anyhow!("expected one or more task ids"));
    }
    let snapshot = Snapshot::load(store)?;
    let targets = args
        .iter()
        .map(|prefix| find_by_prefix(&snapshot.tasks, prefix, |t| t.id.as_str()))
        .collect::<anyhow::Result<Vec<_>>>()?;
    for task in targets {
        let mut fields = Map::new();
        fields.insert("isCompleted".to_string(), Value::Bool(completed));
        store.update(Collection::Tasks, &task.id, fields)?;
        println!(
            "{} task {}.",
            if completed { "Completed" } else { "Reopened" },
            short_id(&task.id)
        );
    }
    Ok(())
}

#[instrument(skip(store, args))]
fn cmd_delete<S: DocumentStore + ?Sized>(store: &mut S, args: &[String]) -> anyhow::Result<()> {
    info!("command delete");
    let prefix = args.first().ok_or_else(|| anyhow!("usage: delete <id>"))?;
    let snapshot = Snapshot::load(store)?;

    let task = match_prefix(&snapshot.tasks, prefix, |t| t.id.as_str())?;
    let expense = match_prefix(&snapshot.expenses, prefix, |e| e.id.as_str())?;
    match (task, expense) {
        (Some(task), None) => {
            store.delete(Collection::Tasks, &task.id)?;
            println!("Deleted task {}.", short_id(&task.id));
        }
        (None, Some(expense)) => {
            store.delete(Collection::Expenses, &expense.id)?;
            println!("Deleted expense {}.", short_id(&expense.id));
        }
        (Some(_), Some(_)) => {
            return Err(anyhow!("id prefix {prefix} matches both a task and an expense"));
        }
        (None, None) => return Err(anyhow!("no task or expense matches {prefix}")),
    }
    Ok(())
}

#[instrument(skip(store, args))]
fn cmd_spend<S: DocumentStore + ?Sized>(store: &mut S, args: &[String], today: NaiveDate) -> anyhow::Result<()> {
    info!("command spend");
    let [amount, category, rest @ ..] = args else {
        return Err(anyhow!("usage: spend <amount> <category> <title...> [date:YYYY-MM-DD]"));
    };

    let amount = amount
        .trim_start_matches('$')
        .parse::<f64>()
        .with_context(|| format!("invalid amount: {amount}"))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(anyhow!("amount must be a non-negative number"));
    }

    let mut date = today;
    let mut words = Vec::new();
    for arg in rest {
        match arg.strip_prefix("date:") {
            Some(raw) => date = parse_day_arg(raw, today)?,
            None => words.push(arg.as_str()),
        }
    }
    let title = words.join(" ");
    if title.trim().is_empty() {
        return Err(anyhow!("an expense needs a title"));
    }

    let category = canonical_category(category);
    let expense = Expense::new(title, amount, category, date);
    let id = store.create(Collection::Expenses, expense.to_fields())?;
    println!("Logged expense {}.", short_id(&id));
    Ok(())
}

#[instrument(skip(store, renderer, args))]
fn cmd_expenses<S: DocumentStore + ?Sized>(
    store: &mut S,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command expenses");
    let (year, month) = parse_month_arg(args.first().map(String::as_str), today)?;
    let snapshot = Snapshot::load(store)?;
    let mut listed = month_expenses(&snapshot.expenses, year, month);
    listed.sort_by_key(|e| std::cmp::Reverse(e.date));
    renderer.print_expense_table(&listed)
}

#[instrument(skip(store, renderer, args))]
fn cmd_finance<S: DocumentStore + ?Sized>(
    store: &mut S,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command finance");
    let (year, month) = parse_month_arg(args.first().map(String::as_str), today)?;
    let snapshot = Snapshot::load(store)?;
    let monthly = TierStatus::new(
        BudgetTier::Monthly,
        &snapshot.budget,
        monthly_total(&snapshot.expenses, year, month),
    );
    let categories = by_category(month_expenses(&snapshot.expenses, year, month));
    let trend = trend_series(&snapshot.expenses, year, month);
    renderer.print_finance(&monthly, &categories, &trend)
}

#[instrument(skip(store, renderer, args))]
fn cmd_budget<S: DocumentStore + ?Sized>(
    store: &mut S,
    renderer: &mut Renderer,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command budget");
    let snapshot = Snapshot::load(store)?;
    if args.is_empty() {
        return renderer.print_budget(&snapshot.budget);
    }

    let budget = apply_budget_args(snapshot.budget, args)?;
    save_budget(store, &budget)?;
    renderer.print_budget(&budget)
}

fn apply_budget_args(mut budget: Budget, args: &[String]) -> anyhow::Result<Budget> {
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .or_else(|| arg.split_once(':'))
            .ok_or_else(|| anyhow!("expected tier=amount, got: {arg}"))?;
        let amount = value
            .parse::<f64>()
            .with_context(|| format!("invalid amount for {key}: {value}"))?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(anyhow!("budget limits must be non-negative"));
        }
        match key {
            "daily" => budget.daily = amount,
            "weekly" => budget.weekly = amount,
            "monthly" => budget.monthly = amount,
            other => return Err(anyhow!("unknown budget tier: {other}")),
        }
    }
    Ok(budget)
}

fn cmd_help() -> anyhow::Result<()> {
    println!(
        "daybook commands:\n  \
         add <title> [dur:N] [pri:high|medium|low] [date:D] [time:HH:MM] [due:D] [duetime:HH:MM]\n  \
         list [all|scheduled|unscheduled] [default|priority|duration]\n  \
         day [D] [next|prev|+N|-N]             week [D] [step]     month [YYYY-MM] [step]\n  \
         schedule <id> <D> [HH:MM]             unschedule <id>\n  \
         done <id>...       reopen <id>...      delete <id>\n  \
         spend <amount> <category> <title> [date:D]\n  \
         expenses [YYYY-MM] finance [YYYY-MM]   budget [daily=N] [weekly=N] [monthly=N]\n\
         D is YYYY-MM-DD, today, tomorrow or yesterday."
    );
    Ok(())
}

fn parse_day_arg(raw: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "today" => Ok(today),
        "tomorrow" => Ok(add_days(today, 1)),
        "yesterday" => Ok(add_days(today, -1)),
        other => from_key(other).ok_or_else(|| anyhow!("expected YYYY-MM-DD, got: {raw}")),
    }
}

/// Reads an optional focus date (a day key, a month key or a relative word)
/// followed by optional `next`/`prev`/`+N`/`-N` steps in units of `view`.
fn parse_focus(args: &[String], today: NaiveDate, view: ViewMode) -> anyhow::Result<NaiveDate> {
    let mut focus = today;
    for arg in args {
        let step = match arg.as_str() {
            "next" => Some(1),
            "prev" => Some(-1),
            raw if raw.starts_with('+') || raw.starts_with('-') => Some(
                raw.parse::<i64>()
                    .with_context(|| format!("invalid step: {raw}"))?,
            ),
            _ => None,
        };
        focus = match step {
            Some(step) => shift_focus(focus, view, step)
                .ok_or_else(|| anyhow!("step {arg} moves past the supported calendar range"))?,
            None => parse_day_arg(arg, today)
                .or_else(|_| month_start(arg))
                .with_context(|| format!("expected a date, YYYY-MM or a step, got: {arg}"))?,
        };
    }
    debug!(view = view.as_key(), focus = %focus, "resolved calendar focus");
    Ok(focus)
}

fn month_start(raw: &str) -> anyhow::Result<NaiveDate> {
    from_key(&format!("{}-01", raw.trim())).ok_or_else(|| anyhow!("expected YYYY-MM, got: {raw}"))
}

fn parse_time_arg(raw: &str) -> anyhow::Result<NaiveTime> {
    parse_time_key(raw).ok_or_else(|| anyhow!("expected HH:MM, got: {raw}"))
}

fn parse_month_arg(raw: Option<&str>, today: NaiveDate) -> anyhow::Result<(i32, u32)> {
    let Some(raw) = raw else {
        return Ok((today.year(), today.month()));
    };
    let day = month_start(raw)
        .or_else(|_| parse_day_arg(raw, today))
        .with_context(|| format!("expected YYYY-MM, got: {raw}"))?;
    Ok((day.year(), day.month()))
}

fn canonical_category(raw: &str) -> String {
    EXPENSE_CATEGORIES
        .iter()
        .find(|known| known.eq_ignore_ascii_case(raw))
        .map(|known| known.to_string())
        .unwrap_or_else(|| {
            debug!(category = %raw, "category outside the recognised set");
            raw.to_string()
        })
}

/// The record an id prefix names, `None` when nothing matches. A prefix
/// shared by several records is an error, never a guess.
fn match_prefix<'a, T>(
    items: &'a [T],
    prefix: &str,
    id_of: impl Fn(&T) -> &str,
) -> anyhow::Result<Option<&'a T>> {
    if prefix.is_empty() {
        return Err(anyhow!("empty id"));
    }
    if let Some(exact) = items.iter().find(|item| id_of(item) == prefix) {
        return Ok(Some(exact));
    }
    let mut matches = items.iter().filter(|item| id_of(item).starts_with(prefix));
    let Some(first) = matches.next() else {
        return Ok(None);
    };
    if matches.next().is_some() {
        return Err(anyhow!("id prefix {prefix} is ambiguous"));
    }
    Ok(Some(first))
}

fn find_by_prefix<'a, T>(items: &'a [T], prefix: &str, id_of: impl Fn(&T) -> &str) -> anyhow::Result<&'a T> {
    match_prefix(items, prefix, id_of)?.ok_or_else(|| anyhow!("no record with id {prefix}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonlStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn seeded_store(dir: &std::path::Path, task_ids: &[&str], expense_ids: &[&str]) -> JsonlStore {
        let mut store = JsonlStore::open(dir).expect("open store");
        for id in task_ids {
            let task = Task::new(format!("task {id}"), 30, Priority::Medium, "#3b82f6".to_string());
            store
                .upsert(Collection::Tasks, id, task.to_fields())
                .expect("seed task");
        }
        for id in expense_ids {
            let expense = Expense::new(format!("expense {id}"), 4.0, "Food".to_string(), date(2024, 6, 1));
            store
                .upsert(Collection::Expenses, id, expense.to_fields())
                .expect("seed expense");
        }
        store
    }

    #[test]
    fn delete_refuses_a_prefix_shared_by_several_tasks() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut store = seeded_store(temp.path(), &["a1", "a2"], &["a9"]);

        assert!(cmd_delete(&mut store, &strings(&["a"])).is_err());
        let snapshot = Snapshot::load(&store).expect("load");
        assert_eq!(snapshot.tasks.len(), 2);
        assert_eq!(snapshot.expenses.len(), 1);

        cmd_delete(&mut store, &strings(&["a9"])).expect("delete expense");
        cmd_delete(&mut store, &strings(&["a2"])).expect("delete task");
        let snapshot = Snapshot::load(&store).expect("load");
        assert_eq!(snapshot.tasks.len(), 1);
        assert!(snapshot.expenses.is_empty());
        assert!(cmd_delete(&mut store, &strings(&["zz"])).is_err());
    }

    #[test]
    fn delete_refuses_a_prefix_matching_both_collections() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut store = seeded_store(temp.path(), &["b1"], &["b2"]);

        assert!(cmd_delete(&mut store, &strings(&["b"])).is_err());
        let snapshot = Snapshot::load(&store).expect("load");
        assert_eq!((snapshot.tasks.len(), snapshot.expenses.len()), (1, 1));
    }

    #[test]
    fn completion_touches_nothing_when_any_id_is_unknown() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut store = seeded_store(temp.path(), &["c1", "d1"], &[]);

        assert!(cmd_set_completed(&mut store, &strings(&["c1", "zz"]), true).is_err());
        let snapshot = Snapshot::load(&store).expect("load");
        assert!(snapshot.tasks.iter().all(|task| !task.completed));

        cmd_set_completed(&mut store, &strings(&["c1", "d1"]), true).expect("complete both");
        let snapshot = Snapshot::load(&store).expect("load");
        assert!(snapshot.tasks.iter().all(|task| task.completed));
    }

    #[test]
    fn task_args_split_title_from_modifiers() {
        let today = date(2024, 6, 10);
        let parsed = parse_task_args(
            &strings(&["Pay", "rent", "pri:high", "date:tomorrow", "time:08:30", "due:2024-06-15"]),
            today,
        )
        .expect("parse");
        assert_eq!(parsed.title, "Pay rent");
        assert_eq!(parsed.priority, Some(Priority::High));
        assert_eq!(parsed.date, Some(date(2024, 6, 11)));
        assert_eq!(parsed.time, NaiveTime::from_hms_opt(8, 30, 0));
        assert_eq!(parsed.deadline, Some(date(2024, 6, 15)));

        assert!(parse_task_args(&strings(&["x", "time:8am"]), today).is_err());
    }

    #[test]
    fn month_args() {
        let today = date(2024, 6, 10);
        assert_eq!(parse_month_arg(None, today).expect("month"), (2024, 6));
        assert_eq!(parse_month_arg(Some("2024-02"), today).expect("month"), (2024, 2));
        assert_eq!(parse_month_arg(Some("2023-11-20"), today).expect("month"), (2023, 11));
        assert!(parse_month_arg(Some("feb"), today).is_err());
    }

    #[test]
    fn focus_accepts_dates_months_and_steps() {
        let today = date(2024, 1, 31);
        assert_eq!(parse_focus(&[], today, ViewMode::Day).expect("focus"), today);
        assert_eq!(
            parse_focus(&strings(&["next"]), today, ViewMode::Month).expect("focus"),
            date(2024, 2, 29)
        );
        assert_eq!(
            parse_focus(&strings(&["2024-06", "-2"]), today, ViewMode::Week).expect("focus"),
            date(2024, 5, 18)
        );
        assert_eq!(
            parse_focus(&strings(&["yesterday", "+1"]), today, ViewMode::Day).expect("focus"),
            today
        );
        assert!(parse_focus(&strings(&["soon"]), today, ViewMode::Day).is_err());
        assert!(parse_focus(&strings(&["+200000000000"]), today, ViewMode::Day).is_err());
        assert!(parse_focus(&strings(&["+4294967297"]), today, ViewMode::Month).is_err());
    }

    #[test]
    fn budget_args_update_named_tiers() {
        let budget = apply_budget_args(Budget::default(), &strings(&["daily=25", "monthly:900"]))
            .expect("budget");
        assert_eq!(budget.daily, 25.0);
        assert_eq!(budget.weekly, 300.0);
        assert_eq!(budget.monthly, 900.0);
        assert!(apply_budget_args(Budget::default(), &strings(&["yearly=1"])).is_err());
        assert!(apply_budget_args(Budget::default(), &strings(&["daily=-1"])).is_err());
    }

    #[test]
    fn prefixes_must_be_unique() {
        let ids = vec!["abc1".to_string(), "abd2".to_string()];
        assert_eq!(find_by_prefix(&ids, "abc", |s| s.as_str()).expect("match"), "abc1");
        assert!(find_by_prefix(&ids, "ab", |s| s.as_str()).is_err());
        assert!(find_by_prefix(&ids, "zz", |s| s.as_str()).is_err());
    }

    #[test]
    fn categories_are_canonicalised() {
        assert_eq!(canonical_category("food"), "Food");
        assert_eq!(canonical_category("Pets"), "Pets");
    }

    #[test]
    fn abbreviations() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("sp", &known), Some("spend"));
        assert_eq!(expand_command_abbrev("re", &known), Some("reopen"));
        assert_eq!(expand_command_abbrev("s", &known), None);
    }
}
