use rust_decimal::Decimal;
use time::{Date, OffsetDateTime};

use super::{put, put_opt, Document};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewStudent {
    pub name: String,
    pub class: String,
    pub parent: String,
    pub phone: String,
    pub status: String,
}

impl NewStudent {
    pub fn to_document(&self, created_at: OffsetDateTime) -> Document {
        let mut document = Document::new();
        put(&mut document, "name", self.name.as_str());
        put(&mut document, "class", self.class.as_str());
        put(&mut document, "parent", self.parent.as_str());
        put(&mut document, "phone", self.phone.as_str());
        put(&mut document, "status", self.status.as_str());
        put(&mut document, "createdAt", created_at);
        document
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StudentUpdate {
    pub name: Option<String>,
    pub class: Option<String>,
    pub parent: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
}

impl StudentUpdate {
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        put_opt(&mut document, "name", self.name.as_deref());
        put_opt(&mut document, "class", self.class.as_deref());
        put_opt(&mut document, "parent", self.parent.as_deref());
        put_opt(&mut document, "phone", self.phone.as_deref());
        put_opt(&mut document, "status", self.status.as_deref());
        document
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewTeacher {
    pub name: String,
    pub subject: String,
    pub email: String,
    pub phone: String,
    pub status: String,
}

impl NewTeacher {
    pub fn to_document(&self, created_at: OffsetDateTime) -> Document {
        let mut document = Document::new();
        put(&mut document, "name", self.name.as_str());
        put(&mut document, "subject", self.subject.as_str());
        put(&mut document, "email", self.email.as_str());
        put(&mut document, "phone", self.phone.as_str());
        put(&mut document, "status", self.status.as_str());
        put(&mut document, "createdAt", created_at);
        document
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TeacherUpdate {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
}

impl TeacherUpdate {
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        put_opt(&mut document, "name", self.name.as_deref());
        put_opt(&mut document, "subject", self.subject.as_deref());
        put_opt(&mut document, "email", self.email.as_deref());
        put_opt(&mut document, "phone", self.phone.as_deref());
        put_opt(&mut document, "status", self.status.as_deref());
        document
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewInvoice {
    /// Leave empty to have the store assign the next code for the class.
    pub display_id: Option<String>,
    pub student: String,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub date: Option<Date>,
    pub status: String,
    pub invoice_type: String,
    pub student_class: String,
}

impl NewInvoice {
    pub fn to_document(&self, display_id: &str, created_at: OffsetDateTime) -> Document {
        let mut document = Document::new();
        put(&mut document, "invoiceId", display_id);
        put(&mut document, "student", self.student.as_str());
        put(&mut document, "amount", self.amount);
        put(&mut document, "paidAmount", self.paid_amount);
        put_opt(&mut document, "date", self.date);
        put(&mut document, "status", self.status.as_str());
        put(&mut document, "type", self.invoice_type.as_str());
        put(&mut document, "studentClass", self.student_class.as_str());
        put(&mut document, "createdAt", created_at);
        document
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InvoiceUpdate {
    pub display_id: Option<String>,
    pub student: Option<String>,
    pub amount: Option<Decimal>,
    pub paid_amount: Option<Decimal>,
    pub date: Option<Date>,
    pub status: Option<String>,
    pub invoice_type: Option<String>,
    pub student_class: Option<String>,
}

impl InvoiceUpdate {
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        put_opt(&mut document, "invoiceId", self.display_id.as_deref());
        put_opt(&mut document, "student", self.student.as_deref());
        put_opt(&mut document, "amount", self.amount);
        put_opt(&mut document, "paidAmount", self.paid_amount);
        put_opt(&mut document, "date", self.date);
        put_opt(&mut document, "status", self.status.as_deref());
        put_opt(&mut document, "type", self.invoice_type.as_deref());
        put_opt(&mut document, "studentClass", self.student_class.as_deref());
        document
    }

    /// The display identifier carried by this update, if it is non-empty.
    pub fn display_id(&self) -> Option<&str> {
        self.display_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewExpense {
    pub title: String,
    pub category: String,
    pub amount: Decimal,
    pub date: Option<Date>,
}

impl NewExpense {
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        put(&mut document, "title", self.title.as_str());
        put(&mut document, "category", self.category.as_str());
        put(&mut document, "amount", self.amount);
        put_opt(&mut document, "date", self.date);
        document
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpenseUpdate {
    pub title: Option<String>,
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<Date>,
}

impl ExpenseUpdate {
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        put_opt(&mut document, "title", self.title.as_deref());
        put_opt(&mut document, "category", self.category.as_deref());
        put_opt(&mut document, "amount", self.amount);
        put_opt(&mut document, "date", self.date);
        document
    }
}
