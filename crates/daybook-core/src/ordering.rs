use std::cmp::Ordering;

use anyhow::anyhow;

use crate::model::Task;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskFilter {
    #[default]
    All,
    Scheduled,
    Unscheduled,
}

impl TaskFilter {
    pub fn keeps(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Scheduled => task.schedule.is_scheduled(),
            TaskFilter::Unscheduled => !task.schedule.is_scheduled(),
        }
    }
}

impl std::str::FromStr for TaskFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TaskFilter::All),
            "scheduled" => Ok(TaskFilter::Scheduled),
            "unscheduled" => Ok(TaskFilter::Unscheduled),
            other => Err(anyhow!("unknown task filter: {other}")),
        }
    }
}

/// `Default` orders exactly like `Priority`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Default,
    Priority,
    Duration,
}

impl std::str::FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(SortKey::Default),
            "priority" => Ok(SortKey::Priority),
            "duration" => Ok(SortKey::Duration),
            other => Err(anyhow!("unknown sort key: {other}")),
        }
    }
}

fn compare_tasks(a: &Task, b: &Task, key: SortKey) -> Ordering {
    a.completed.cmp(&b.completed).then_with(|| match key {
        SortKey::Default | SortKey::Priority => b.priority.cmp(&a.priority),
        SortKey::Duration => b.duration_minutes.cmp(&a.duration_minutes),
    })
}

/// Filtered, ordered view of `tasks` for the list panel. Open tasks always
/// come before completed ones; the sort is stable so equal keys keep their
/// input order. The input slice is left untouched.
#[tracing::instrument(skip(tasks), fields(total = tasks.len()))]
pub fn sort_and_filter(tasks: &[Task], filter: TaskFilter, key: SortKey) -> Vec<&Task> {
    let mut view: Vec<&Task> = tasks.iter().filter(|task| filter.keeps(task)).collect();
    view.sort_by(|a, b| compare_tasks(a, b, key));
    view
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::{Priority, Schedule};

    fn task(title: &str, priority: Priority, minutes: u32) -> Task {
        Task::new(title.to_string(), minutes, priority, "#6366f1".to_string())
    }

    fn titles(view: &[&Task]) -> Vec<String> {
        view.iter().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn completed_tasks_sink_regardless_of_priority() {
        let mut tasks = vec![task("low", Priority::Low, 30), task("high", Priority::High, 30)];

        let view = sort_and_filter(&tasks, TaskFilter::All, SortKey::Priority);
        assert_eq!(titles(&view), vec!["high", "low"]);

        tasks[1].completed = true;
        let view = sort_and_filter(&tasks, TaskFilter::All, SortKey::Priority);
        assert_eq!(titles(&view), vec!["low", "high"]);
    }

    #[test]
    fn default_matches_priority() {
        let tasks = vec![
            task("m1", Priority::Medium, 10),
            task("l1", Priority::Low, 10),
            task("h1", Priority::High, 10),
            task("m2", Priority::Medium, 10),
        ];
        let by_default = sort_and_filter(&tasks, TaskFilter::All, SortKey::Default);
        let by_priority = sort_and_filter(&tasks, TaskFilter::All, SortKey::Priority);
        assert_eq!(titles(&by_default), vec!["h1", "m1", "m2", "l1"]);
        assert_eq!(by_default, by_priority);
    }

    #[test]
    fn duration_sorts_longest_first_and_stable() {
        let tasks = vec![
            task("short", Priority::High, 15),
            task("long-a", Priority::Low, 120),
            task("mid", Priority::Low, 60),
            task("long-b", Priority::High, 120),
        ];
        let view = sort_and_filter(&tasks, TaskFilter::All, SortKey::Duration);
        assert_eq!(titles(&view), vec!["long-a", "long-b", "mid", "short"]);
    }

    #[test]
    fn filters_by_schedule_presence_without_touching_input() {
        let mut scheduled = task("scheduled", Priority::Low, 30);
        scheduled.schedule = Schedule::AllDay {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"),
        };
        let tasks = vec![task("floating", Priority::High, 30), scheduled];
        let before = tasks.clone();

        let only_scheduled = sort_and_filter(&tasks, TaskFilter::Scheduled, SortKey::Default);
        assert_eq!(titles(&only_scheduled), vec!["scheduled"]);
        let only_floating = sort_and_filter(&tasks, TaskFilter::Unscheduled, SortKey::Default);
        assert_eq!(titles(&only_floating), vec!["floating"]);
        assert_eq!(tasks, before);
    }

    #[test]
    fn parses_filter_and_sort_names() {
        assert_eq!("Scheduled".parse::<TaskFilter>().expect("filter"), TaskFilter::Scheduled);
        assert_eq!("duration".parse::<SortKey>().expect("sort"), SortKey::Duration);
        assert!("newest".parse::<SortKey>().is_err());
    }
}
