//! Expense totals per day, week and month, and their comparison against the
//! three budget tiers.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::datekey::{days_in_month, week_range};
use crate::model::{Budget, Expense, clamp_amount};

/// Compensated running sum (Neumaier), so long columns of cents do not drift.
#[derive(Debug, Clone, Copy, Default)]
pub struct StableSum {
    sum: f64,
    compensation: f64,
}

impl StableSum {
    pub fn add(&mut self, value: f64) {
        let next = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - next) + value;
        } else {
            self.compensation += (value - next) + self.sum;
        }
        self.sum = next;
    }

    pub fn total(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl Extend<f64> for StableSum {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

pub fn sum_amounts<'a, I>(expenses: I) -> f64
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut sum = StableSum::default();
    sum.extend(expenses.into_iter().map(|e| clamp_amount(e.amount)));
    sum.total()
}

pub fn expenses_on(expenses: &[Expense], day: NaiveDate) -> Vec<&Expense> {
    expenses.iter().filter(|e| e.date == day).collect()
}

pub fn month_expenses(expenses: &[Expense], year: i32, month: u32) -> Vec<&Expense> {
    expenses
        .iter()
        .filter(|e| e.date.year() == year && e.date.month() == month)
        .collect()
}

pub fn daily_total(expenses: &[Expense], day: NaiveDate) -> f64 {
    sum_amounts(expenses.iter().filter(|e| e.date == day))
}

/// Total for the Sunday-anchored week containing `day`.
pub fn weekly_total(expenses: &[Expense], day: NaiveDate) -> f64 {
    let (start, end) = week_range(day);
    sum_amounts(expenses.iter().filter(|e| e.date >= start && e.date <= end))
}

pub fn monthly_total(expenses: &[Expense], year: i32, month: u32) -> f64 {
    sum_amounts(month_expenses(expenses, year, month))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub day: u32,
    pub amount: f64,
}

/// One point per day of the month, zero where nothing was spent.
pub fn trend_series(expenses: &[Expense], year: i32, month: u32) -> Vec<TrendPoint> {
    let days = days_in_month(year, month);
    let mut sums = vec![StableSum::default(); days as usize];
    for expense in month_expenses(expenses, year, month) {
        if let Some(slot) = sums.get_mut(expense.date.day0() as usize) {
            slot.add(clamp_amount(expense.amount));
        }
    }
    sums.iter()
        .zip(1..=days)
        .map(|(sum, day)| TrendPoint {
            day,
            amount: sum.total(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: f64,
}

/// Sums per category in order of first appearance.
pub fn by_category<'a, I>(expenses: I) -> Vec<CategoryTotal>
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut order: Vec<(String, StableSum)> = Vec::new();
    for expense in expenses {
        let amount = clamp_amount(expense.amount);
        match order.iter_mut().find(|(name, _)| *name == expense.category) {
            Some((_, sum)) => sum.add(amount),
            None => {
                let mut sum = StableSum::default();
                sum.add(amount);
                order.push((expense.category.clone(), sum));
            }
        }
    }
    order
        .into_iter()
        .map(|(category, sum)| CategoryTotal {
            category,
            amount: sum.total(),
        })
        .collect()
}

/// Strictly over: spending exactly the limit is still within budget.
pub fn is_over_budget(total: f64, limit: f64) -> bool {
    total > limit
}

/// Negative when over budget.
pub fn remaining(limit: f64, total: f64) -> f64 {
    limit - total
}

/// Share of the limit used, capped at 100.
pub fn percent_used(total: f64, limit: f64) -> f64 {
    if limit <= 0.0 {
        return if total > 0.0 { 100.0 } else { 0.0 };
    }
    (total / limit * 100.0).min(100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    Daily,
    Weekly,
    Monthly,
}

impl BudgetTier {
    pub fn limit(&self, budget: &Budget) -> f64 {
        match self {
            BudgetTier::Daily => budget.daily,
            BudgetTier::Weekly => budget.weekly,
            BudgetTier::Monthly => budget.monthly,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BudgetTier::Daily => "daily",
            BudgetTier::Weekly => "weekly",
            BudgetTier::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierStatus {
    pub tier: BudgetTier,
    pub limit: f64,
    pub spent: f64,
    pub remaining: f64,
    pub over_budget: bool,
    pub percent_used: f64,
}

impl TierStatus {
    pub fn new(tier: BudgetTier, budget: &Budget, spent: f64) -> Self {
        let limit = tier.limit(budget);
        Self {
            tier,
            limit,
            spent,
            remaining: remaining(limit, spent),
            over_budget: is_over_budget(spent, limit),
            percent_used: percent_used(spent, limit),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetReport {
    pub daily: TierStatus,
    pub weekly: TierStatus,
    pub monthly: TierStatus,
}

impl BudgetReport {
    pub fn tiers(&self) -> [&TierStatus; 3] {
        [&self.daily, &self.weekly, &self.monthly]
    }
}

/// All three tiers for the windows containing `day`.
#[tracing::instrument(skip(expenses, budget), fields(expenses = expenses.len()))]
pub fn budget_report(expenses: &[Expense], budget: &Budget, day: NaiveDate) -> BudgetReport {
    BudgetReport {
        daily: TierStatus::new(BudgetTier::Daily, budget, daily_total(expenses, day)),
        weekly: TierStatus::new(BudgetTier::Weekly, budget, weekly_total(expenses, day)),
        monthly: TierStatus::new(
            BudgetTier::Monthly,
            budget,
            monthly_total(expenses, day.year(), day.month()),
        ),
    }
}
