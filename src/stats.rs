//! Dashboard figures derived from the mirrored collections.

use std::{collections::BTreeMap, fmt::Display};

use prettytable::{row, Table};
use rust_decimal::Decimal;
use serde::Serialize;
use time::Month;

use schooldesk_core::{Expense, Invoice, Student, Teacher};

pub const DEFAULT_RECENT_ADMISSIONS: usize = 5;
pub const DEFAULT_MONTHLY_WINDOW: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsOptions {
    pub recent_admissions: usize,
    pub monthly_window: usize,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            recent_admissions: DEFAULT_RECENT_ADMISSIONS,
            monthly_window: DEFAULT_MONTHLY_WINDOW,
        }
    }
}

/// Fees collected in one calendar month, labelled like `Mar 2024`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTotal {
    pub label: String,
    pub year: i32,
    pub month: u8,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: usize,
    pub total_teachers: usize,
    pub total_fees_collected: Decimal,
    pub total_expenses: Decimal,
    pub monthly_fees: Vec<MonthlyTotal>,
    pub recent_admissions: Vec<Student>,
}

impl DashboardStats {
    pub fn compute(
        students: &[Student],
        teachers: &[Teacher],
        invoices: &[Invoice],
        expenses: &[Expense],
        options: &StatsOptions,
    ) -> Self {
        Self {
            total_students: students.len(),
            total_teachers: teachers.len(),
            total_fees_collected: total_fees_collected(invoices),
            total_expenses: total_expenses(expenses),
            monthly_fees: monthly_fee_totals(invoices, options.monthly_window),
            recent_admissions: recent_admissions(students, options.recent_admissions),
        }
    }
}

pub fn total_fees_collected(invoices: &[Invoice]) -> Decimal {
    invoices.iter().map(|invoice| invoice.paid_amount).sum()
}

pub fn total_expenses(expenses: &[Expense]) -> Decimal {
    expenses.iter().map(|expense| expense.amount).sum()
}

fn month_label(year: i32, month: Month) -> String {
    let name = month.to_string();
    format!("{} {}", &name[..3], year)
}

/// Paid amounts grouped by invoice month, oldest first, keeping only the most
/// recent `window` months. Invoices without a date are left out.
pub fn monthly_fee_totals(invoices: &[Invoice], window: usize) -> Vec<MonthlyTotal> {
    let mut by_month: BTreeMap<(i32, u8), Decimal> = BTreeMap::new();
    for invoice in invoices {
        let Some(date) = invoice.date else {
            continue;
        };
        *by_month.entry((date.year(), u8::from(date.month()))).or_default() += invoice.paid_amount;
    }

    let skip = by_month.len().saturating_sub(window);
    by_month
        .into_iter()
        .skip(skip)
        .filter_map(|((year, month), total)| {
            let month_enum = Month::try_from(month).ok()?;
            Some(MonthlyTotal {
                label: month_label(year, month_enum),
                year,
                month,
                total,
            })
        })
        .collect()
}

/// The `limit` most recently created students, newest first. Students without
/// a creation time sort as the oldest.
pub fn recent_admissions(students: &[Student], limit: usize) -> Vec<Student> {
    let mut sorted = students.to_vec();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.truncate(limit);
    sorted
}

impl Display for DashboardStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut summary = Table::new();
        summary.add_row(row!["Students", self.total_students]);
        summary.add_row(row!["Teachers", self.total_teachers]);
        summary.add_row(row!["Fees collected", self.total_fees_collected]);
        summary.add_row(row!["Expenses", self.total_expenses]);

        let mut monthly = Table::new();
        monthly.add_row(row!["Month", "Collected"]);
        monthly.add_empty_row();
        for item in &self.monthly_fees {
            monthly.add_row(row![item.label, item.total]);
        }

        let mut admissions = Table::new();
        admissions.add_row(row!["Name", "Class", "Parent", "Admitted"]);
        admissions.add_empty_row();
        for student in &self.recent_admissions {
            let admitted = student
                .created_at
                .map(|t| t.date().to_string())
                .unwrap_or_default();
            admissions.add_row(row![student.name, student.class, student.parent, admitted]);
        }

        write!(f, "\n{}\n{}\n{}\n", summary, monthly, admissions)
    }
}
