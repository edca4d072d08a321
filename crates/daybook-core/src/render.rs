use std::io::{self, IsTerminal, Write};

use chrono::{Datelike, NaiveDate};
use unicode_width::UnicodeWidthStr;

use crate::agenda::DaySummary;
use crate::aggregate::{BudgetReport, CategoryTotal, TierStatus, TrendPoint};
use crate::config::Config;
use crate::datekey::{to_key, to_time_key, weekday_label};
use crate::interval::Interval;
use crate::model::{Budget, Expense, Task};
use crate::visibility::split_all_day;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self { color: cfg.color }
    }

    #[tracing::instrument(skip(self, tasks))]
    pub fn print_task_table(&mut self, tasks: &[&Task], today: NaiveDate) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = ["ID", "Done", "Pri", "Dur", "Scheduled", "Due", "Title"]
            .map(str::to_string)
            .to_vec();

        let mut rows = Vec::with_capacity(tasks.len());
        for task in tasks {
            let scheduled = match (task.schedule.date_key(), task.schedule.time_key()) {
                (Some(date), Some(time)) => format!("{date} {time}"),
                (Some(date), None) => date,
                _ => String::new(),
            };

            let due = task
                .deadline
                .map(|d| match d.time {
                    Some(time) => format!("{} {}", to_key(d.date), to_time_key(time)),
                    None => to_key(d.date),
                })
                .unwrap_or_default();
            let overdue = task.deadline.is_some_and(|d| d.date < today) && !task.completed;
            let due = if overdue { self.paint(&due, "31") } else { due };

            rows.push(vec![
                self.paint(short_id(&task.id), "33"),
                if task.completed { "x".to_string() } else { String::new() },
                task.priority.as_key().to_string(),
                format!("{}m", task.duration_minutes),
                scheduled,
                due,
                task.title.clone(),
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, summary, report), fields(day = %summary.day))]
    pub fn print_day(&mut self, summary: &DaySummary<'_>, report: &BudgetReport) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(
            out,
            "{} {}",
            weekday_label(summary.day.weekday()),
            to_key(summary.day)
        )?;

        if !summary.deadlines.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", self.paint("Due", "31"))?;
            for task in &summary.deadlines {
                let at = task
                    .deadline
                    .and_then(|d| d.time)
                    .map(|t| format!(" @ {}", to_time_key(t)))
                    .unwrap_or_default();
                writeln!(out, "  {}{}", task.title, at)?;
            }
        }

        let (all_day, timed) = split_all_day(&summary.tasks);
        writeln!(out)?;
        writeln!(out, "All day")?;
        if all_day.is_empty() {
            writeln!(out, "  (nothing)")?;
        }
        for task in all_day {
            writeln!(out, "  {} {}", short_id(&task.id), task.title)?;
        }

        writeln!(out)?;
        writeln!(out, "Schedule")?;
        if timed.is_empty() {
            writeln!(out, "  (nothing)")?;
        }
        for task in timed {
            let Some(interval) = Interval::for_task(task) else {
                continue;
            };
            let carried = if interval.start.date() < summary.day {
                " (from previous day)"
            } else {
                ""
            };
            writeln!(
                out,
                "  {}-{} {} {}{}",
                interval.start_time_key(),
                interval.end_time_key(),
                short_id(&task.id),
                task.title,
                carried
            )?;
        }

        writeln!(out)?;
        let spent = format!("Spent {}", format_money(summary.total_spent));
        let spent = if summary.over_budget {
            self.paint(&spent, "31")
        } else {
            spent
        };
        writeln!(out, "{spent}")?;
        for expense in &summary.expenses {
            writeln!(
                out,
                "  {:>10} {} [{}]",
                format_money(expense.amount),
                expense.title,
                expense.category
            )?;
        }

        writeln!(out)?;
        drop(out);
        self.print_budget_report(report)
    }

    pub fn print_week(&mut self, days: &[DaySummary<'_>], weekly: &TierStatus) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let headers = ["Day", "Date", "Tasks", "Due", "Spent"].map(str::to_string).to_vec();
        let rows = days
            .iter()
            .map(|summary| {
                let spent = format_money(summary.total_spent);
                vec![
                    weekday_label(summary.day.weekday()).to_string(),
                    to_key(summary.day),
                    summary.tasks.len().to_string(),
                    summary.deadlines.len().to_string(),
                    if summary.over_budget { self.paint(&spent, "31") } else { spent },
                ]
            })
            .collect();
        write_table(&mut out, headers, rows)?;
        writeln!(out)?;
        writeln!(out, "{}", self.tier_line(weekly))?;
        Ok(())
    }

    pub fn print_month(&mut self, cells: &[Option<DaySummary<'_>>], monthly: &TierStatus) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let headers = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]
            .map(str::to_string)
            .to_vec();
        let rows = cells
            .chunks(7)
            .map(|week| {
                let mut row = week
                    .iter()
                    .map(|cell| match cell {
                        Some(summary) => self.month_cell(summary),
                        None => String::new(),
                    })
                    .collect::<Vec<_>>();
                row.resize(7, String::new());
                row
            })
            .collect();
        write_table(&mut out, headers, rows)?;
        writeln!(out)?;
        writeln!(out, "{}", self.tier_line(monthly))?;
        Ok(())
    }

    pub fn print_expense_table(&mut self, expenses: &[&Expense]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let headers = ["ID", "Date", "Amount", "Category", "Title"].map(str::to_string).to_vec();
        let rows = expenses
            .iter()
            .map(|e| {
                vec![
                    self.paint(short_id(&e.id), "33"),
                    to_key(e.date),
                    format_money(e.amount),
                    e.category.clone(),
                    e.title.clone(),
                ]
            })
            .collect();
        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    pub fn print_finance(
        &mut self,
        monthly: &TierStatus,
        categories: &[CategoryTotal],
        trend: &[TrendPoint],
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", self.tier_line(monthly))?;
        writeln!(out, "used      {:.0}%", monthly.percent_used)?;

        writeln!(out)?;
        let headers = ["Category", "Amount"].map(str::to_string).to_vec();
        let rows = categories
            .iter()
            .map(|c| vec![c.category.clone(), format_money(c.amount)])
            .collect();
        write_table(&mut out, headers, rows)?;

        writeln!(out)?;
        let peak = trend.iter().map(|p| p.amount).fold(0.0_f64, f64::max);
        for point in trend {
            let width = if peak > 0.0 {
                (point.amount / peak * 40.0).round() as usize
            } else {
                0
            };
            writeln!(
                out,
                "{:>2} {:>10} {}",
                point.day,
                format_money(point.amount),
                "#".repeat(width)
            )?;
        }
        Ok(())
    }

    pub fn print_budget(&mut self, budget: &Budget) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "daily     {}", format_money(budget.daily))?;
        writeln!(out, "weekly    {}", format_money(budget.weekly))?;
        writeln!(out, "monthly   {}", format_money(budget.monthly))?;
        Ok(())
    }

    pub fn print_budget_report(&mut self, report: &BudgetReport) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        for tier in report.tiers() {
            writeln!(out, "{}", self.tier_line(tier))?;
        }
        Ok(())
    }

    fn tier_line(&self, status: &TierStatus) -> String {
        let state = if status.over_budget {
            self.paint(&format!("over by {}", format_money(-status.remaining)), "31")
        } else {
            self.paint(&format!("{} left", format_money(status.remaining)), "32")
        };
        format!(
            "{:<9} {} of {} ({})",
            status.tier.label(),
            format_money(status.spent),
            format_money(status.limit),
            state
        )
    }

    fn month_cell(&self, summary: &DaySummary<'_>) -> String {
        let mut cell = format!("{:>2}", summary.day.day());
        if !summary.tasks.is_empty() {
            cell.push_str(&format!(" {}t", summary.tasks.len()));
        }
        if !summary.deadlines.is_empty() {
            cell.push('!');
        }
        if summary.total_spent > 0.0 {
            let spent = format!(" {}", format_money(summary.total_spent));
            if summary.over_budget {
                cell.push_str(&self.paint(&spent, "31"));
            } else {
                cell.push_str(&spent);
            }
        }
        cell
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

pub fn format_money(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", -amount)
    } else {
        format!("${amount:.2}")
    }
}

/// First eight characters of an id, enough to tell uuids apart in a table.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
