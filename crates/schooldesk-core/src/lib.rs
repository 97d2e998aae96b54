//! Core types and traits for SchoolDesk backends.
//!
//! This crate provides the record models, the `DocumentStore` and `AuthProvider`
//! traits and their error types, so the hosted backend can be swapped for an
//! in-process one in separate crates.

pub mod auth;
pub mod models;
pub mod storage;

// Re-export key types at crate root for convenience
pub use auth::{AuthError, AuthProvider, SessionFeed};
pub use models::{DataValue, Document, DocumentId, Record, Session};
pub use models::read::{Expense, Invoice, Student, Teacher};
pub use models::write::{
    ExpenseUpdate, InvoiceUpdate, NewExpense, NewInvoice, NewStudent, NewTeacher,
    StudentUpdate, TeacherUpdate,
};
pub use storage::{DocumentStore, Snapshot, SnapshotFeed, StoreError};
