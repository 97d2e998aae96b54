use rust_decimal::Decimal;
use serde::Serialize;
use time::{Date, OffsetDateTime};

use super::{date, money, text, timestamp, Document, Record};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub class: String,
    pub parent: String,
    pub phone: String,
    pub status: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

impl Record for Student {
    const COLLECTION: &'static str = "students";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_document(id: &str, document: &Document) -> Self {
        Self {
            id: id.to_string(),
            name: text(document, "name"),
            class: text(document, "class"),
            parent: text(document, "parent"),
            phone: text(document, "phone"),
            status: text(document, "status"),
            created_at: timestamp(document, "createdAt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub email: String,
    pub phone: String,
    pub status: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

impl Record for Teacher {
    const COLLECTION: &'static str = "teachers";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_document(id: &str, document: &Document) -> Self {
        Self {
            id: id.to_string(),
            name: text(document, "name"),
            subject: text(document, "subject"),
            email: text(document, "email"),
            phone: text(document, "phone"),
            status: text(document, "status"),
            created_at: timestamp(document, "createdAt"),
        }
    }
}

/// An invoice as mirrored from the backend. Money fields are already coerced,
/// so a paid amount stored as free text reads as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    /// Human-readable sequence code such as `APSPR004`. Empty until assigned.
    #[serde(rename = "invoiceId")]
    pub display_id: String,
    pub student: String,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub date: Option<Date>,
    pub status: String,
    #[serde(rename = "type")]
    pub invoice_type: String,
    pub student_class: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

impl Record for Invoice {
    const COLLECTION: &'static str = "invoices";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_document(id: &str, document: &Document) -> Self {
        let student_class = match document.get("studentClass") {
            None | Some(super::DataValue::Null) => None,
            Some(_) => Some(text(document, "studentClass")),
        };

        Self {
            id: id.to_string(),
            display_id: text(document, "invoiceId"),
            student: text(document, "student"),
            amount: money(document, "amount"),
            paid_amount: money(document, "paidAmount"),
            date: date(document, "date"),
            status: text(document, "status"),
            invoice_type: text(document, "type"),
            student_class,
            created_at: timestamp(document, "createdAt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expense {
    pub id: String,
    pub title: String,
    pub category: String,
    pub amount: Decimal,
    pub date: Option<Date>,
}

impl Record for Expense {
    const COLLECTION: &'static str = "expenses";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_document(id: &str, document: &Document) -> Self {
        Self {
            id: id.to_string(),
            title: text(document, "title"),
            category: text(document, "category"),
            amount: money(document, "amount"),
            date: date(document, "date"),
        }
    }
}
