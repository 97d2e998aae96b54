//! One-shot sample data loader.
//!
//! Records go through the store's normal add operations, so seeded invoices get
//! display ids and seeded students get creation times exactly like real ones.
//! Running it twice inserts everything twice.

use std::fmt::Display;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use time::{Date, Month};

use schooldesk_core::{NewExpense, NewInvoice, NewStudent, NewTeacher};

use crate::{error::AppError, store::AppStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub students: usize,
    pub teachers: usize,
    pub invoices: usize,
    pub expenses: usize,
}

impl Display for SeedSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} students, {} teachers, {} invoices, {} expenses",
            self.students, self.teachers, self.invoices, self.expenses
        )
    }
}

/// User-facing outcome message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

impl Notification {
    pub fn from_seed(result: &Result<SeedSummary, AppError>) -> Self {
        match result {
            Ok(summary) => Notification::Success(format!("Database seeded: {}", summary)),
            Err(e) => Notification::Error(format!("Seeding failed: {}", e)),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Notification::Success(_))
    }
}

impl Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notification::Success(message) | Notification::Error(message) => f.write_str(message),
        }
    }
}

fn ymd(year: i32, month: Month, day: u8) -> Option<Date> {
    Date::from_calendar_date(year, month, day).ok()
}

fn student(name: &str, class: &str, parent: &str, phone: &str) -> NewStudent {
    NewStudent {
        name: name.to_string(),
        class: class.to_string(),
        parent: parent.to_string(),
        phone: phone.to_string(),
        status: "Active".to_string(),
    }
}

fn teacher(name: &str, subject: &str, email: &str, phone: &str) -> NewTeacher {
    NewTeacher {
        name: name.to_string(),
        subject: subject.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        status: "Active".to_string(),
    }
}

fn invoice(student: &str, class: &str, amount: Decimal, paid: Decimal, date: Option<Date>) -> NewInvoice {
    let status = if paid >= amount {
        "Paid"
    } else if paid > Decimal::ZERO {
        "Partial"
    } else {
        "Pending"
    };
    NewInvoice {
        display_id: None,
        student: student.to_string(),
        amount,
        paid_amount: paid,
        date,
        status: status.to_string(),
        invoice_type: "Tuition Fee".to_string(),
        student_class: class.to_string(),
    }
}

fn expense(title: &str, category: &str, amount: Decimal, date: Option<Date>) -> NewExpense {
    NewExpense {
        title: title.to_string(),
        category: category.to_string(),
        amount,
        date,
    }
}

pub fn sample_students() -> Vec<NewStudent> {
    vec![
        student("Aarav Sharma", "Pre-KG", "Rohit Sharma", "9845012345"),
        student("Diya Patel", "LKG", "Nisha Patel", "9845023456"),
        student("Vihaan Reddy", "UKG", "Suresh Reddy", "9845034567"),
        student("Ananya Iyer", "Class 1", "Lakshmi Iyer", "9845045678"),
        student("Kabir Singh", "Class 2", "Harpreet Singh", "9845056789"),
        student("Meera Nair", "LKG", "Arjun Nair", "9845067890"),
    ]
}

pub fn sample_teachers() -> Vec<NewTeacher> {
    vec![
        teacher("Priya Menon", "English", "priya.menon@school.test", "9900011122"),
        teacher("Rahul Verma", "Mathematics", "rahul.verma@school.test", "9900022233"),
        teacher("Sunita Rao", "Art & Craft", "sunita.rao@school.test", "9900033344"),
    ]
}

pub fn sample_invoices() -> Vec<NewInvoice> {
    vec![
        invoice("Aarav Sharma", "Pre-KG", dec!(4500), dec!(4500), ymd(2024, Month::January, 10)),
        invoice("Diya Patel", "LKG", dec!(5000), dec!(2500), ymd(2024, Month::February, 12)),
        invoice("Vihaan Reddy", "UKG", dec!(5500), dec!(5500), ymd(2024, Month::March, 5)),
        invoice("Ananya Iyer", "Class 1", dec!(6000), dec!(6000), ymd(2024, Month::April, 8)),
        invoice("Kabir Singh", "Class 2", dec!(6500), Decimal::ZERO, ymd(2024, Month::May, 15)),
        invoice("Meera Nair", "LKG", dec!(5000), dec!(5000), ymd(2024, Month::June, 3)),
        invoice("Diya Patel", "LKG", dec!(5000), dec!(5000), ymd(2024, Month::July, 9)),
    ]
}

pub fn sample_expenses() -> Vec<NewExpense> {
    vec![
        expense("Classroom supplies", "Supplies", dec!(3200), ymd(2024, Month::January, 20)),
        expense("Electricity bill", "Utilities", dec!(4100), ymd(2024, Month::February, 28)),
        expense("Bus maintenance", "Transport", dec!(7800), ymd(2024, Month::March, 18)),
        expense("Annual day decorations", "Events", dec!(2600), ymd(2024, Month::April, 22)),
    ]
}

/// Inserts the sample records one by one, stopping at the first failure.
pub async fn seed_database(store: &AppStore) -> Result<SeedSummary, AppError> {
    let mut summary = SeedSummary::default();

    for student in sample_students() {
        store.add_student(student).await?;
        summary.students += 1;
    }
    for teacher in sample_teachers() {
        store.add_teacher(teacher).await?;
        summary.teachers += 1;
    }
    for invoice in sample_invoices() {
        store.add_invoice(invoice).await?;
        summary.invoices += 1;
    }
    for expense in sample_expenses() {
        store.add_expense(expense).await?;
        summary.expenses += 1;
    }

    tracing::info!(%summary, "Sample data seeded");
    Ok(summary)
}

