use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::datekey::{from_key, parse_time_key, to_key, to_time_key};

pub const TASK_COLORS: [&str; 11] = [
    "#ef4444", "#f97316", "#f59e0b", "#84cc16", "#10b981", "#06b6d4", "#3b82f6", "#6366f1",
    "#8b5cf6", "#d946ef", "#f43f5e",
];

pub const EXPENSE_CATEGORIES: [&str; 8] = [
    "Food",
    "Transport",
    "Shopping",
    "Entertainment",
    "Bills",
    "Education",
    "Health",
    "Other",
];

/// Id of the single budget document in the `budgets` collection.
pub const BUDGET_DOCUMENT_ID: &str = "default";

/// Picks a palette colour for a new task. Wraps around the palette.
pub fn pick_color(index: usize) -> &'static str {
    TASK_COLORS[index % TASK_COLORS.len()]
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_key(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "h" => Ok(Priority::High),
            "medium" | "med" | "m" => Ok(Priority::Medium),
            "low" | "l" => Ok(Priority::Low),
            other => Err(anyhow::anyhow!("unknown priority: {other}")),
        }
    }
}

/// Where a task sits on the calendar. A start time only exists alongside a date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Schedule {
    #[default]
    Unscheduled,
    AllDay { date: NaiveDate },
    Timed { date: NaiveDate, time: NaiveTime },
}

impl Schedule {
    /// Builds a schedule from wire keys. Empty strings count as absent. A malformed
    /// date or time leaves the task unscheduled so it drops out of the calendar.
    pub fn from_keys(date: Option<&str>, time: Option<&str>) -> Self {
        let date_key = date.map(str::trim).filter(|raw| !raw.is_empty());
        let time_key = time.map(str::trim).filter(|raw| !raw.is_empty());

        let Some(date_key) = date_key else {
            if let Some(time_key) = time_key {
                warn!(time = %time_key, "start time without a date; treating task as unscheduled");
            }
            return Schedule::Unscheduled;
        };

        let Some(date) = from_key(date_key) else {
            warn!(date = %date_key, "malformed schedule date; treating task as unscheduled");
            return Schedule::Unscheduled;
        };

        match time_key {
            None => Schedule::AllDay { date },
            Some(raw) => match parse_time_key(raw) {
                Some(time) => Schedule::Timed { date, time },
                None => {
                    warn!(time = %raw, "malformed schedule time; treating task as unscheduled");
                    Schedule::Unscheduled
                }
            },
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Schedule::Unscheduled => None,
            Schedule::AllDay { date } | Schedule::Timed { date, .. } => Some(*date),
        }
    }

    pub fn time(&self) -> Option<NaiveTime> {
        match self {
            Schedule::Timed { time, .. } => Some(*time),
            _ => None,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        !matches!(self, Schedule::Unscheduled)
    }

    pub fn date_key(&self) -> Option<String> {
        self.date().map(to_key)
    }

    pub fn time_key(&self) -> Option<String> {
        self.time().map(to_time_key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Deadline {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl Deadline {
    pub fn from_keys(date: Option<&str>, time: Option<&str>) -> Option<Self> {
        let raw = date.map(str::trim).filter(|raw| !raw.is_empty())?;
        let Some(date) = from_key(raw) else {
            warn!(deadline = %raw, "malformed deadline date; ignoring deadline");
            return None;
        };
        let time = time
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| {
                let parsed = parse_time_key(raw);
                if parsed.is_none() {
                    warn!(deadline_time = %raw, "malformed deadline time; keeping date only");
                }
                parsed
            });
        Some(Self { date, time })
    }
}

/// Wire shape of a task document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_time: Option<String>,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord", into = "TaskRecord")]
pub struct Task {
    /// Store-assigned id; empty until the create call returns.
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub priority: Priority,
    pub duration_minutes: u32,
    pub schedule: Schedule,
    pub deadline: Option<Deadline>,
    pub color: String,
}

impl Task {
    pub fn new(title: String, duration_minutes: u32, priority: Priority, color: String) -> Self {
        Self {
            id: String::new(),
            title,
            completed: false,
            priority,
            duration_minutes,
            schedule: Schedule::Unscheduled,
            deadline: None,
            color,
        }
    }

    /// Fields for a create call; the id is left for the store to assign.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = record_fields(TaskRecord::from(self.clone()));
        fields.remove("id");
        fields
    }

    /// Fields for an update that only touches the schedule. Cleared keys are sent
    /// as null so a merge drops them.
    pub fn schedule_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(
            "date".to_string(),
            self.schedule.date_key().map(Value::String).unwrap_or(Value::Null),
        );
        fields.insert(
            "time".to_string(),
            self.schedule.time_key().map(Value::String).unwrap_or(Value::Null),
        );
        fields
    }
}

impl TryFrom<TaskRecord> for Task {
    type Error = anyhow::Error;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        if record.title.trim().is_empty() {
            return Err(anyhow::anyhow!("task {:?} has no title", record.id));
        }
        let schedule = Schedule::from_keys(record.date.as_deref(), record.time.as_deref());
        let deadline =
            Deadline::from_keys(record.deadline.as_deref(), record.deadline_time.as_deref());
        Ok(Self {
            id: record.id,
            title: record.title,
            completed: record.is_completed,
            priority: record.priority,
            duration_minutes: record.duration_minutes,
            schedule,
            deadline,
            color: record.color,
        })
    }
}

impl From<Task> for TaskRecord {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            is_completed: task.completed,
            priority: task.priority,
            duration_minutes: task.duration_minutes,
            date: task.schedule.date_key(),
            time: task.schedule.time_key(),
            deadline: task.deadline.map(|d| to_key(d.date)),
            deadline_time: task.deadline.and_then(|d| d.time).map(to_time_key),
            color: task.color,
        }
    }
}

/// Wire shape of an expense document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExpenseRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExpenseRecord", into = "ExpenseRecord")]
pub struct Expense {
    pub id: String,
    pub title: String,
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
}

impl Expense {
    pub fn new(title: String, amount: f64, category: String, date: NaiveDate) -> Self {
        Self {
            id: String::new(),
            title,
            amount: clamp_amount(amount),
            category,
            date,
        }
    }

    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = record_fields(ExpenseRecord::from(self.clone()));
        fields.remove("id");
        fields
    }
}

impl TryFrom<ExpenseRecord> for Expense {
    type Error = anyhow::Error;

    fn try_from(record: ExpenseRecord) -> Result<Self, Self::Error> {
        let date = from_key(&record.date)
            .ok_or_else(|| anyhow::anyhow!("malformed expense date: {:?}", record.date))?;
        Ok(Self {
            id: record.id,
            title: record.title,
            amount: clamp_amount(record.amount),
            category: record.category,
            date,
        })
    }
}

impl From<Expense> for ExpenseRecord {
    fn from(expense: Expense) -> Self {
        Self {
            id: expense.id,
            title: expense.title,
            amount: expense.amount,
            category: expense.category,
            date: to_key(expense.date),
        }
    }
}

/// Spending limits. Each tier is compared against its own window only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    #[serde(deserialize_with = "lenient_amount")]
    pub daily: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub weekly: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub monthly: f64,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            daily: 50.0,
            weekly: 300.0,
            monthly: 1200.0,
        }
    }
}

impl Budget {
    pub fn to_fields(&self) -> Map<String, Value> {
        record_fields(*self)
    }
}

/// Everything the store currently holds, decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub expenses: Vec<Expense>,
    pub budget: Budget,
}

/// Clamps negative and non-finite amounts to zero.
pub fn clamp_amount(amount: f64) -> f64 {
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

fn record_fields<T: Serialize>(record: T) -> Map<String, Value> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            warn!(value = %other, "record did not serialize to an object");
            Map::new()
        }
        Err(err) => {
            warn!(error = %err, "failed to serialize record");
            Map::new()
        }
    }
}

fn lenient_number(value: Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.map(clamp_amount).unwrap_or(0.0)
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(Value::deserialize(deserializer)?))
}

fn lenient_minutes<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let minutes = lenient_number(Value::deserialize(deserializer)?);
    Ok(minutes.min(u32::MAX as f64) as u32)
}
